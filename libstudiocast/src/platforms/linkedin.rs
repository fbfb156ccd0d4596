//! LinkedIn adapter
//!
//! Publishes member shares through the UGC Posts API. The post id comes back
//! in the `x-restli-id` header; older API versions put it in the body instead.

use async_trait::async_trait;
use serde_json::json;

use crate::error::Result;
use crate::platforms::{
    read_json, required_str, transport_error, Endpoints, PlatformAdapter, PublishRequest, PublishedPost,
};
use crate::types::{Platform, SocialAccount};

pub struct LinkedInAdapter {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl LinkedInAdapter {
    pub fn new(http: reqwest::Client, endpoints: Endpoints) -> Self {
        Self { http, endpoints }
    }

    fn share_body(author_id: &str, content: &str) -> serde_json::Value {
        json!({
            "author": format!("urn:li:person:{}", author_id),
            "lifecycleState": "PUBLISHED",
            "specificContent": {
                "com.linkedin.ugc.ShareContent": {
                    "shareCommentary": { "text": content },
                    "shareMediaCategory": "NONE"
                }
            },
            "visibility": {
                "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC"
            }
        })
    }
}

#[async_trait]
impl PlatformAdapter for LinkedInAdapter {
    fn platform(&self) -> Platform {
        Platform::LinkedIn
    }

    async fn send(
        &self,
        account: &SocialAccount,
        content: &str,
        _request: &PublishRequest,
    ) -> Result<PublishedPost> {
        let response = self
            .http
            .post(self.endpoints.api("/v2/ugcPosts"))
            .bearer_auth(&account.access_token)
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&Self::share_body(&account.platform_user_id, content))
            .send()
            .await
            .map_err(|e| transport_error(Platform::LinkedIn, e))?;

        let header_id = response
            .headers()
            .get("x-restli-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // Successful shares often carry an empty body, so only parse it when needed
        let post_id = match header_id {
            Some(id) if response.status().is_success() => id,
            _ => {
                let body = read_json(Platform::LinkedIn, response).await?;
                required_str(Platform::LinkedIn, &body, "/id")?
            }
        };

        tracing::debug!(post_id = %post_id, "LinkedIn share created");

        Ok(PublishedPost {
            url: Some(format!("https://www.linkedin.com/feed/update/{}", post_id)),
            post_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PlatformError, StudioError};
    use crate::platforms::mock::test_account;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer) -> LinkedInAdapter {
        LinkedInAdapter::new(reqwest::Client::new(), Endpoints::single(&server.uri()))
    }

    #[tokio::test]
    async fn test_publish_reads_id_from_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/ugcPosts"))
            .and(header("authorization", "Bearer test-access-token"))
            .and(header("x-restli-protocol-version", "2.0.0"))
            .and(body_partial_json(json!({
                "author": "urn:li:person:linkedin-user",
                "specificContent": {
                    "com.linkedin.ugc.ShareContent": { "shareCommentary": { "text": "Hello LinkedIn" } }
                }
            })))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("x-restli-id", "urn:li:share:42")
                    .set_body_json(json!({})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let published = adapter(&server)
            .publish(&test_account(Platform::LinkedIn), &PublishRequest::text("Hello LinkedIn"))
            .await
            .unwrap();

        assert_eq!(published.post_id, "urn:li:share:42");
        assert_eq!(
            published.url.as_deref(),
            Some("https://www.linkedin.com/feed/update/urn:li:share:42")
        );
    }

    #[tokio::test]
    async fn test_publish_falls_back_to_body_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/ugcPosts"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "urn:li:share:7" })))
            .mount(&server)
            .await;

        let published = adapter(&server)
            .publish(&test_account(Platform::LinkedIn), &PublishRequest::text("Hi"))
            .await
            .unwrap();
        assert_eq!(published.post_id, "urn:li:share:7");
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_reconnect() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/ugcPosts"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "serviceErrorCode": 65600,
                "message": "Invalid access token",
                "status": 401
            })))
            .mount(&server)
            .await;

        let err = adapter(&server)
            .publish(&test_account(Platform::LinkedIn), &PublishRequest::text("Hi"))
            .await
            .unwrap_err();

        match err {
            StudioError::Platform(PlatformError::Authentication(msg)) => {
                assert!(msg.contains("reconnect"))
            }
            other => panic!("Expected Authentication, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_long_content_truncated_to_limit() {
        let server = MockServer::start().await;
        let expected = format!("{}...", "b".repeat(2997));
        Mock::given(method("POST"))
            .and(path("/v2/ugcPosts"))
            .and(body_partial_json(json!({
                "specificContent": {
                    "com.linkedin.ugc.ShareContent": { "shareCommentary": { "text": expected } }
                }
            })))
            .respond_with(ResponseTemplate::new(201).insert_header("x-restli-id", "urn:li:share:1"))
            .expect(1)
            .mount(&server)
            .await;

        adapter(&server)
            .publish(&test_account(Platform::LinkedIn), &PublishRequest::text("b".repeat(3500)))
            .await
            .unwrap();
    }
}
