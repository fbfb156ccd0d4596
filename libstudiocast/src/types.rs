//! Core types for Studiocast

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::StudioError;

/// Maximum length of a post's default content
pub const MAX_POST_CONTENT: usize = 5000;

/// Marker appended to truncated content
pub const TRUNCATION_MARKER: &str = "...";

/// A supported social platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    LinkedIn,
    Twitter,
    Facebook,
    Instagram,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::LinkedIn,
        Platform::Twitter,
        Platform::Facebook,
        Platform::Instagram,
    ];

    /// Lowercase identifier used in URLs and storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "linkedin",
            Platform::Twitter => "twitter",
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "LinkedIn",
            Platform::Twitter => "Twitter",
            Platform::Facebook => "Facebook",
            Platform::Instagram => "Instagram",
        }
    }

    /// Maximum characters the platform accepts in one post
    pub fn character_limit(&self) -> usize {
        match self {
            Platform::LinkedIn => 3000,
            Platform::Twitter => 280,
            Platform::Facebook => 63_206,
            Platform::Instagram => 2200,
        }
    }

    /// Instagram cannot publish text-only posts
    pub fn requires_image(&self) -> bool {
        matches!(self, Platform::Instagram)
    }

    /// Whether an expired token can be renewed without user interaction
    pub fn supports_refresh(&self) -> bool {
        matches!(self, Platform::Twitter)
    }

    pub fn uses_pkce(&self) -> bool {
        matches!(self, Platform::Twitter)
    }

    /// Recognize the platform's "token invalid or expired" signal
    ///
    /// LinkedIn and Twitter answer 401. The Graph API (Facebook, Instagram)
    /// reports error code 190, usually with a 400 status.
    pub fn is_auth_failure(&self, status: u16, error_code: Option<i64>) -> bool {
        match self {
            Platform::LinkedIn | Platform::Twitter => status == 401,
            Platform::Facebook | Platform::Instagram => status == 401 || error_code == Some(190),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linkedin" => Ok(Platform::LinkedIn),
            "twitter" | "x" => Ok(Platform::Twitter),
            "facebook" => Ok(Platform::Facebook),
            "instagram" => Ok(Platform::Instagram),
            other => Err(StudioError::InvalidInput(format!(
                "Unsupported platform: '{}'. Valid options: linkedin, twitter, facebook, instagram",
                other
            ))),
        }
    }
}

/// Shorten content to fit `limit` characters
///
/// Counts Unicode scalar values, not bytes. Content over the limit keeps its
/// first `limit - 3` characters followed by [`TRUNCATION_MARKER`].
pub fn truncate_content(content: &str, limit: usize) -> String {
    if content.chars().count() <= limit {
        return content.to_string();
    }
    let keep = limit.saturating_sub(TRUNCATION_MARKER.chars().count());
    let mut truncated: String = content.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

/// One user's stored credential for one external platform account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocialAccount {
    pub id: String,
    pub user_id: String,
    pub platform: Platform,
    pub platform_user_id: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_expiry: Option<i64>,
    pub account_name: String,
    pub account_email: Option<String>,
    pub account_image: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl SocialAccount {
    /// A token without a recorded expiry is treated as valid
    pub fn is_token_expired(&self, now: i64) -> bool {
        self.token_expiry.is_some_and(|expiry| expiry <= now)
    }
}

/// Account as exposed over the API, with every token field removed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: String,
    pub user_id: String,
    pub platform: Platform,
    pub platform_user_id: String,
    pub account_name: String,
    pub account_email: Option<String>,
    pub account_image: Option<String>,
    pub token_expiry: Option<i64>,
    pub token_expired: bool,
    pub created_at: i64,
}

impl AccountSummary {
    pub fn from_account(account: &SocialAccount, now: i64) -> Self {
        Self {
            id: account.id.clone(),
            user_id: account.user_id.clone(),
            platform: account.platform,
            platform_user_id: account.platform_user_id.clone(),
            account_name: account.account_name.clone(),
            account_email: account.account_email.clone(),
            account_image: account.account_image.clone(),
            token_expiry: account.token_expiry,
            token_expired: account.is_token_expired(now),
            created_at: account.created_at,
        }
    }
}

/// Junction row linking a social account into a workspace
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkspaceAccount {
    pub id: String,
    pub workspace_id: String,
    pub social_account_id: String,
    pub user_id: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workspace {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub created_at: i64,
}

impl Workspace {
    pub fn new(user_id: &str, name: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Scheduled,
    Publishing,
    Published,
    Failed,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Publishing => "publishing",
            PostStatus::Published => "published",
            PostStatus::Failed => "failed",
        }
    }
}

impl FromStr for PostStatus {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "scheduled" => Ok(PostStatus::Scheduled),
            "publishing" => Ok(PostStatus::Publishing),
            "published" => Ok(PostStatus::Published),
            "failed" => Ok(PostStatus::Failed),
            other => Err(StudioError::InvalidInput(format!(
                "Unknown post status: {}",
                other
            ))),
        }
    }
}

/// Record of a successful publish on one platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublishedPlatform {
    pub platform: Platform,
    pub post_id: String,
    pub published_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Per-platform content overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlatformContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
}

impl PlatformContent {
    pub fn get(&self, platform: Platform) -> Option<&str> {
        let value = match platform {
            Platform::LinkedIn => &self.linkedin,
            Platform::Twitter => &self.twitter,
            Platform::Facebook => &self.facebook,
            Platform::Instagram => &self.instagram,
        };
        value.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn set(&mut self, platform: Platform, content: Option<String>) {
        let slot = match platform {
            Platform::LinkedIn => &mut self.linkedin,
            Platform::Twitter => &mut self.twitter,
            Platform::Facebook => &mut self.facebook,
            Platform::Instagram => &mut self.instagram,
        };
        *slot = content;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub user_id: String,
    pub workspace_id: String,
    pub content: String,
    pub topic: Option<String>,
    pub tone: Option<String>,
    pub status: PostStatus,
    pub scheduled_at: Option<i64>,
    pub published_platforms: Vec<PublishedPlatform>,
    pub error_log: Option<String>,
    pub media_urls: Vec<String>,
    pub retry_count: i64,
    pub last_retry_at: Option<i64>,
    pub platform_content: PlatformContent,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Post {
    pub fn new(user_id: &str, workspace_id: &str, content: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            workspace_id: workspace_id.to_string(),
            content,
            topic: None,
            tone: None,
            status: PostStatus::Draft,
            scheduled_at: None,
            published_platforms: Vec::new(),
            error_log: None,
            media_urls: Vec::new(),
            retry_count: 0,
            last_retry_at: None,
            platform_content: PlatformContent::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Text to send to `platform`: its override if set, else the default content
    pub fn content_for(&self, platform: Platform) -> &str {
        self.platform_content
            .get(platform)
            .unwrap_or(self.content.as_str())
    }

    /// First attached media URL, used as the image for image-only platforms
    pub fn primary_image(&self) -> Option<&str> {
        self.media_urls
            .iter()
            .map(String::as_str)
            .find(|url| !url.trim().is_empty())
    }
}

/// Outcome of one publish attempt on one platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlatformPublishResult {
    pub platform: Platform,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PlatformPublishResult {
    pub fn succeeded(platform: Platform, post_id: String, url: Option<String>) -> Self {
        Self {
            platform,
            success: true,
            post_id: Some(post_id),
            url,
            error: None,
        }
    }

    pub fn failed(platform: Platform, error: String) -> Self {
        Self {
            platform,
            success: false,
            post_id: None,
            url: None,
            error: Some(error),
        }
    }
}
