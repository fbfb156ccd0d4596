//! Twitter/X adapter
//!
//! Posts through the v2 `POST /2/tweets` endpoint with an OAuth 2.0 user
//! token. Content over 280 characters is truncated before sending.

use async_trait::async_trait;
use serde_json::json;

use crate::error::Result;
use crate::platforms::{
    read_json, required_str, transport_error, Endpoints, PlatformAdapter, PublishRequest,
    PublishedPost,
};
use crate::types::{Platform, SocialAccount};

pub struct TwitterAdapter {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl TwitterAdapter {
    pub fn new(http: reqwest::Client, endpoints: Endpoints) -> Self {
        Self { http, endpoints }
    }
}

#[async_trait]
impl PlatformAdapter for TwitterAdapter {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    async fn send(
        &self,
        account: &SocialAccount,
        content: &str,
        _request: &PublishRequest,
    ) -> Result<PublishedPost> {
        let response = self
            .http
            .post(self.endpoints.api("/2/tweets"))
            .bearer_auth(&account.access_token)
            .json(&json!({ "text": content }))
            .send()
            .await
            .map_err(|e| transport_error(Platform::Twitter, e))?;

        let body = read_json(Platform::Twitter, response).await?;
        let post_id = required_str(Platform::Twitter, &body, "/data/id")?;

        Ok(PublishedPost {
            url: Some(format!("https://x.com/i/web/status/{}", post_id)),
            post_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PlatformError, StudioError};
    use crate::platforms::mock::test_account;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer) -> TwitterAdapter {
        TwitterAdapter::new(reqwest::Client::new(), Endpoints::single(&server.uri()))
    }

    #[tokio::test]
    async fn test_publish_tweet() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(header("authorization", "Bearer test-access-token"))
            .and(body_json(json!({ "text": "Hello X" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": { "id": "1790000000000000000", "text": "Hello X" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let published = adapter(&server)
            .publish(&test_account(Platform::Twitter), &PublishRequest::text("Hello X"))
            .await
            .unwrap();

        assert_eq!(published.post_id, "1790000000000000000");
        assert_eq!(
            published.url.as_deref(),
            Some("https://x.com/i/web/status/1790000000000000000")
        );
    }

    #[tokio::test]
    async fn test_400_character_post_sent_as_280() {
        let server = MockServer::start().await;
        let content = "t".repeat(400);
        let expected = format!("{}...", "t".repeat(277));
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(body_json(json!({ "text": expected })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "data": { "id": "1" } })))
            .expect(1)
            .mount(&server)
            .await;

        let published = adapter(&server)
            .publish(&test_account(Platform::Twitter), &PublishRequest::text(content))
            .await
            .unwrap();
        assert_eq!(published.post_id, "1");
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "title": "Too Many Requests",
                "detail": "Too Many Requests",
                "status": 429
            })))
            .mount(&server)
            .await;

        let err = adapter(&server)
            .publish(&test_account(Platform::Twitter), &PublishRequest::text("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Platform(PlatformError::RateLimit(_))));
    }

    #[tokio::test]
    async fn test_missing_id_is_posting_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
            .mount(&server)
            .await;

        let err = adapter(&server)
            .publish(&test_account(Platform::Twitter), &PublishRequest::text("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Platform(PlatformError::Posting(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let adapter = TwitterAdapter::new(
            reqwest::Client::new(),
            Endpoints::single("http://127.0.0.1:9"),
        );
        let err = adapter
            .publish(&test_account(Platform::Twitter), &PublishRequest::text("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Platform(PlatformError::Network(_))));
    }
}
