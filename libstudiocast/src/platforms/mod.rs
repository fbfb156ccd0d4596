//! Platform adapters
//!
//! Each supported network gets one [`PlatformAdapter`] implementation that
//! turns a generic [`PublishRequest`] into that platform's HTTP calls and
//! normalizes the outcome. Content policy (character limits, required media)
//! lives in the trait's default methods so every adapter applies it the same
//! way before any network traffic happens.
//!
//! # Examples
//!
//! ```no_run
//! use libstudiocast::platforms::{AdapterRegistry, PublishRequest};
//! use libstudiocast::config::Config;
//! use libstudiocast::types::{Platform, SocialAccount};
//!
//! # async fn example(account: SocialAccount) -> libstudiocast::error::Result<()> {
//! let registry = AdapterRegistry::from_config(&Config::default_config(), reqwest::Client::new());
//! let adapter = registry.get(Platform::Twitter).expect("twitter adapter");
//!
//! let published = adapter
//!     .publish(&account, &PublishRequest::text("Hello from Studiocast"))
//!     .await?;
//! println!("Posted {}", published.post_id);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{Config, PlatformConfig};
use crate::error::{PlatformError, Result};
use crate::types::{truncate_content, Platform, SocialAccount};

pub mod facebook;
pub mod instagram;
pub mod linkedin;
pub mod twitter;

// Compiled into every build so integration tests can swap it in
pub mod mock;

/// Graph API version used for Facebook and Instagram calls
pub const GRAPH_API_VERSION: &str = "v18.0";

/// What to publish, independent of the target platform
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishRequest {
    pub content: String,
    /// Required by Instagram, ignored elsewhere
    pub image_url: Option<String>,
    /// Attached as a link preview on Facebook
    pub link: Option<String>,
}

impl PublishRequest {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    fn image(&self) -> Option<&str> {
        self.image_url.as_deref().filter(|url| !url.trim().is_empty())
    }
}

/// Identifier and public URL of a post the platform accepted
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedPost {
    pub post_id: String,
    pub url: Option<String>,
}

/// One platform's publish protocol
///
/// Implementors only provide [`send`](PlatformAdapter::send); validation and
/// truncation come from the default methods, and [`publish`](PlatformAdapter::publish)
/// chains them together.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    /// Maximum number of characters sent to the platform
    fn character_limit(&self) -> usize {
        self.platform().character_limit()
    }

    /// Fit content to the character limit, marking any truncation
    fn prepare_content(&self, content: &str) -> String {
        truncate_content(content, self.character_limit())
    }

    /// Reject requests the platform can never accept, without network access
    fn validate(&self, request: &PublishRequest) -> Result<()> {
        let platform = self.platform();
        if platform.requires_image() && request.image().is_none() {
            return Err(PlatformError::Validation(format!(
                "{} requires an image URL",
                platform.display_name()
            ))
            .into());
        }
        if request.content.trim().is_empty() {
            return Err(PlatformError::Validation(format!(
                "{} post content cannot be empty",
                platform.display_name()
            ))
            .into());
        }
        Ok(())
    }

    /// Perform the platform API call(s) with already prepared content
    async fn send(
        &self,
        account: &SocialAccount,
        content: &str,
        request: &PublishRequest,
    ) -> Result<PublishedPost>;

    /// Validate, truncate and send
    async fn publish(
        &self,
        account: &SocialAccount,
        request: &PublishRequest,
    ) -> Result<PublishedPost> {
        self.validate(request)?;
        let content = self.prepare_content(&request.content);
        self.send(account, &content, request).await
    }
}

/// Base URLs for one platform's consent screen and REST API
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    pub auth_base: String,
    pub api_base: String,
}

impl Endpoints {
    pub fn defaults(platform: Platform) -> Self {
        let (auth_base, api_base) = match platform {
            Platform::LinkedIn => ("https://www.linkedin.com", "https://api.linkedin.com"),
            Platform::Twitter => ("https://twitter.com", "https://api.twitter.com"),
            Platform::Facebook | Platform::Instagram => {
                ("https://www.facebook.com", "https://graph.facebook.com")
            }
        };
        Self {
            auth_base: auth_base.to_string(),
            api_base: api_base.to_string(),
        }
    }

    /// Defaults with any overrides from the platform's config section applied
    pub fn resolve(platform: Platform, config: Option<&PlatformConfig>) -> Self {
        let mut endpoints = Self::defaults(platform);
        if let Some(config) = config {
            if let Some(auth_base) = &config.auth_base {
                endpoints.auth_base = auth_base.clone();
            }
            if let Some(api_base) = &config.api_base {
                endpoints.api_base = api_base.clone();
            }
        }
        endpoints
    }

    /// Point both hosts at one server, as tests do with a mock API
    pub fn single(base: &str) -> Self {
        Self {
            auth_base: base.to_string(),
            api_base: base.to_string(),
        }
    }

    pub fn auth(&self, path: &str) -> String {
        format!("{}{}", self.auth_base.trim_end_matches('/'), path)
    }

    pub fn api(&self, path: &str) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), path)
    }

    /// Graph API URL with the pinned version prefix
    pub fn graph(&self, path: &str) -> String {
        self.api(&format!("/{}{}", GRAPH_API_VERSION, path))
    }
}

/// Message shown when a stored token can no longer be used
pub fn reconnect_message(platform: Platform) -> String {
    format!(
        "{} access token is invalid or expired. Please reconnect your account.",
        platform.display_name()
    )
}

/// Normalize a non-success API response into a [`PlatformError`]
///
/// The platform's own error message is extracted from the common JSON error
/// shapes (Graph `error.message`, LinkedIn `message`, Twitter `detail`).
pub fn map_api_error(platform: Platform, status: u16, body: &str) -> PlatformError {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();

    let error_code = parsed
        .as_ref()
        .and_then(|v| v.pointer("/error/code"))
        .and_then(|c| c.as_i64());

    if platform.is_auth_failure(status, error_code) {
        return PlatformError::Authentication(reconnect_message(platform));
    }

    let message = parsed
        .as_ref()
        .and_then(extract_message)
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no response body".to_string()
            } else {
                trimmed.chars().take(200).collect()
            }
        });

    let detail = format!(
        "{} API error ({}): {}",
        platform.display_name(),
        status,
        message
    );

    match status {
        429 => PlatformError::RateLimit(detail),
        500..=599 => PlatformError::Network(detail),
        _ => PlatformError::Posting(detail),
    }
}

fn extract_message(value: &serde_json::Value) -> Option<String> {
    [
        "/error/message",
        "/message",
        "/detail",
        "/error_description",
        "/title",
    ]
    .iter()
    .find_map(|pointer| value.pointer(pointer).and_then(|m| m.as_str()))
    .map(str::to_string)
}

/// Map a transport failure (DNS, TLS, timeout, reset) to a retryable error
pub(crate) fn transport_error(platform: Platform, error: reqwest::Error) -> PlatformError {
    PlatformError::Network(format!(
        "{} request failed: {}",
        platform.display_name(),
        error
    ))
}

/// Read a JSON response body, converting error statuses with [`map_api_error`]
pub(crate) async fn read_json(
    platform: Platform,
    response: reqwest::Response,
) -> std::result::Result<serde_json::Value, PlatformError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(map_api_error(platform, status.as_u16(), &body));
    }

    response.json().await.map_err(|e| {
        PlatformError::Posting(format!(
            "{} returned an unreadable response: {}",
            platform.display_name(),
            e
        ))
    })
}

/// Pull a string field out of a JSON response or fail with a posting error
pub(crate) fn required_str(
    platform: Platform,
    value: &serde_json::Value,
    pointer: &str,
) -> std::result::Result<String, PlatformError> {
    match value.pointer(pointer) {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        _ => Err(PlatformError::Posting(format!(
            "{} response is missing {}",
            platform.display_name(),
            pointer
        ))),
    }
}

/// Adapters keyed by platform
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<Platform, Arc<dyn PlatformAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the HTTP adapters for every platform, sharing one client
    pub fn from_config(config: &Config, http: reqwest::Client) -> Self {
        let endpoints = |platform| Endpoints::resolve(platform, config.platform(platform));

        Self::new()
            .with_adapter(Arc::new(linkedin::LinkedInAdapter::new(
                http.clone(),
                endpoints(Platform::LinkedIn),
            )))
            .with_adapter(Arc::new(twitter::TwitterAdapter::new(
                http.clone(),
                endpoints(Platform::Twitter),
            )))
            .with_adapter(Arc::new(facebook::FacebookAdapter::new(
                http.clone(),
                endpoints(Platform::Facebook),
            )))
            .with_adapter(Arc::new(instagram::InstagramAdapter::new(
                http,
                endpoints(Platform::Instagram),
            )))
    }

    /// Register or replace the adapter for `adapter.platform()`
    pub fn with_adapter(mut self, adapter: Arc<dyn PlatformAdapter>) -> Self {
        self.adapters.insert(adapter.platform(), adapter);
        self
    }

    pub fn get(&self, platform: Platform) -> Option<Arc<dyn PlatformAdapter>> {
        self.adapters.get(&platform).cloned()
    }

    pub fn platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.adapters.contains_key(p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StudioError;
    use crate::platforms::mock::MockAdapter;

    #[test]
    fn test_map_api_error_linkedin_401_is_reconnect() {
        let err = map_api_error(Platform::LinkedIn, 401, r#"{"message":"Expired"}"#);
        match err {
            PlatformError::Authentication(msg) => assert!(msg.contains("reconnect")),
            other => panic!("Expected Authentication, got {:?}", other),
        }
    }

    #[test]
    fn test_map_api_error_graph_code_190() {
        let body = r#"{"error":{"message":"Error validating access token","type":"OAuthException","code":190}}"#;
        let err = map_api_error(Platform::Facebook, 400, body);
        assert!(matches!(err, PlatformError::Authentication(_)));

        let err = map_api_error(Platform::Instagram, 400, body);
        assert!(matches!(err, PlatformError::Authentication(_)));
    }

    #[test]
    fn test_map_api_error_graph_other_code_keeps_message() {
        let body = r#"{"error":{"message":"Invalid link","code":100}}"#;
        let err = map_api_error(Platform::Facebook, 400, body);
        assert_eq!(
            err.to_string(),
            "Posting failed: Facebook API error (400): Invalid link"
        );
    }

    #[test]
    fn test_map_api_error_twitter_detail() {
        let body = r#"{"title":"Forbidden","detail":"You are not allowed to create a Tweet with duplicate content.","status":403}"#;
        let err = map_api_error(Platform::Twitter, 403, body);
        assert!(matches!(err, PlatformError::Posting(_)));
        assert!(err.detail().contains("duplicate content"));
    }

    #[test]
    fn test_map_api_error_rate_limit_and_server_errors_are_transient() {
        assert!(map_api_error(Platform::Twitter, 429, "").is_transient());
        assert!(map_api_error(Platform::LinkedIn, 503, "<html>").is_transient());
        assert!(!map_api_error(Platform::LinkedIn, 422, "").is_transient());
    }

    #[test]
    fn test_map_api_error_non_json_body() {
        let err = map_api_error(Platform::LinkedIn, 400, "bad request");
        assert_eq!(err.detail(), "LinkedIn API error (400): bad request");
    }

    #[test]
    fn test_endpoints_override_and_paths() {
        let mut config = PlatformConfig::new("id", "secret");
        config.api_base = Some("http://127.0.0.1:4000/".to_string());

        let endpoints = Endpoints::resolve(Platform::Facebook, Some(&config));
        assert_eq!(endpoints.auth_base, "https://www.facebook.com");
        assert_eq!(
            endpoints.graph("/me/accounts"),
            "http://127.0.0.1:4000/v18.0/me/accounts"
        );
    }

    #[tokio::test]
    async fn test_default_validate_requires_image_for_instagram() {
        let adapter = MockAdapter::success(Platform::Instagram);
        let err = adapter
            .publish(&mock::test_account(Platform::Instagram), &PublishRequest::text("caption"))
            .await
            .unwrap_err();

        match err {
            StudioError::Platform(PlatformError::Validation(msg)) => {
                assert_eq!(msg, "Instagram requires an image URL")
            }
            other => panic!("Expected Validation, got {:?}", other),
        }
        assert_eq!(adapter.send_count(), 0);
    }

    #[tokio::test]
    async fn test_default_validate_rejects_blank_content() {
        let adapter = MockAdapter::success(Platform::LinkedIn);
        let result = adapter
            .publish(&mock::test_account(Platform::LinkedIn), &PublishRequest::text("  "))
            .await;
        assert!(result.is_err());
        assert_eq!(adapter.send_count(), 0);
    }

    #[tokio::test]
    async fn test_publish_truncates_before_send() {
        let adapter = MockAdapter::success(Platform::Twitter);
        adapter
            .publish(
                &mock::test_account(Platform::Twitter),
                &PublishRequest::text("a".repeat(400)),
            )
            .await
            .unwrap();

        let sent = adapter.sent_content();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chars().count(), 280);
        assert!(sent[0].ends_with("..."));
    }

    #[test]
    fn test_registry_from_config_covers_all_platforms() {
        let registry = AdapterRegistry::from_config(&Config::default_config(), reqwest::Client::new());
        assert_eq!(registry.platforms(), Platform::ALL.to_vec());
    }

    #[test]
    fn test_registry_with_adapter_replaces_entry() {
        let mock = Arc::new(MockAdapter::success(Platform::Twitter));
        let registry = AdapterRegistry::new().with_adapter(mock);
        assert!(registry.get(Platform::Twitter).is_some());
        assert!(registry.get(Platform::LinkedIn).is_none());
    }
}
