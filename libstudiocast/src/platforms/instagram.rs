//! Instagram Business adapter
//!
//! Publishing is two Graph API calls: create a media container from an image
//! URL and caption, then publish that container. If the second call fails the
//! container stays on Instagram's side unpublished; the error names it so it
//! can be found, and it is reported as a non-retryable failure so a retry
//! does not pile up more containers.

use async_trait::async_trait;

use crate::error::{PlatformError, Result};
use crate::platforms::{
    read_json, required_str, transport_error, Endpoints, PlatformAdapter, PublishRequest,
    PublishedPost,
};
use crate::types::{Platform, SocialAccount};

pub struct InstagramAdapter {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl InstagramAdapter {
    pub fn new(http: reqwest::Client, endpoints: Endpoints) -> Self {
        Self { http, endpoints }
    }

    async fn create_container(
        &self,
        account: &SocialAccount,
        image_url: &str,
        caption: &str,
    ) -> std::result::Result<String, PlatformError> {
        let response = self
            .http
            .post(
                self.endpoints
                    .graph(&format!("/{}/media", account.platform_user_id)),
            )
            .form(&[
                ("image_url", image_url),
                ("caption", caption),
                ("access_token", account.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport_error(Platform::Instagram, e))?;

        let body = read_json(Platform::Instagram, response).await?;
        required_str(Platform::Instagram, &body, "/id")
    }

    async fn publish_container(
        &self,
        account: &SocialAccount,
        creation_id: &str,
    ) -> std::result::Result<String, PlatformError> {
        let response = self
            .http
            .post(
                self.endpoints
                    .graph(&format!("/{}/media_publish", account.platform_user_id)),
            )
            .form(&[
                ("creation_id", creation_id),
                ("access_token", account.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport_error(Platform::Instagram, e))?;

        let body = read_json(Platform::Instagram, response).await?;
        required_str(Platform::Instagram, &body, "/id")
    }
}

#[async_trait]
impl PlatformAdapter for InstagramAdapter {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    async fn send(
        &self,
        account: &SocialAccount,
        content: &str,
        request: &PublishRequest,
    ) -> Result<PublishedPost> {
        let image_url = request.image().ok_or_else(|| {
            PlatformError::Validation("Instagram requires an image URL".to_string())
        })?;

        let creation_id = self.create_container(account, image_url, content).await?;
        tracing::debug!(creation_id = %creation_id, "Instagram media container created");

        let post_id = self
            .publish_container(account, &creation_id)
            .await
            .map_err(|e| {
                tracing::warn!(
                    creation_id = %creation_id,
                    "Instagram container created but not published: {}",
                    e
                );
                PlatformError::Posting(format!(
                    "Instagram media container {} was created but could not be published: {}",
                    creation_id,
                    e.detail()
                ))
            })?;

        Ok(PublishedPost {
            post_id,
            url: None,
        })
    }
}
