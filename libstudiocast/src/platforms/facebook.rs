//! Facebook Page adapter
//!
//! Posts to the page's feed through the Graph API. The stored account is the
//! Page itself (id and page access token captured at link time); when the
//! user had no Page the user token is used and the post lands on their feed.

use async_trait::async_trait;

use crate::error::Result;
use crate::platforms::{
    read_json, required_str, transport_error, Endpoints, PlatformAdapter, PublishRequest,
    PublishedPost,
};
use crate::types::{Platform, SocialAccount};

pub struct FacebookAdapter {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl FacebookAdapter {
    pub fn new(http: reqwest::Client, endpoints: Endpoints) -> Self {
        Self { http, endpoints }
    }
}

#[async_trait]
impl PlatformAdapter for FacebookAdapter {
    fn platform(&self) -> Platform {
        Platform::Facebook
    }

    async fn send(
        &self,
        account: &SocialAccount,
        content: &str,
        request: &PublishRequest,
    ) -> Result<PublishedPost> {
        let mut params = vec![
            ("message", content.to_string()),
            ("access_token", account.access_token.clone()),
        ];
        if let Some(link) = request.link.as_deref().filter(|l| !l.trim().is_empty()) {
            params.push(("link", link.to_string()));
        }

        let response = self
            .http
            .post(
                self.endpoints
                    .graph(&format!("/{}/feed", account.platform_user_id)),
            )
            .form(&params)
            .send()
            .await
            .map_err(|e| transport_error(Platform::Facebook, e))?;

        let body = read_json(Platform::Facebook, response).await?;
        let post_id = required_str(Platform::Facebook, &body, "/id")?;

        Ok(PublishedPost {
            url: Some(format!("https://www.facebook.com/{}", post_id)),
            post_id,
        })
    }
}
