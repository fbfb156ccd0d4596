//! Configuration management for Studiocast

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::types::Platform;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub oauth: OAuthConfig,
    #[serde(default)]
    pub publishing: PublishingConfig,
    pub linkedin: Option<PlatformConfig>,
    pub twitter: Option<PlatformConfig>,
    pub facebook: Option<PlatformConfig>,
    pub instagram: Option<PlatformConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Externally reachable base URL of this API, used for OAuth redirect URIs
    pub public_url: String,
    /// Base URL of the web frontend that OAuth callbacks redirect back to
    pub frontend_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            public_url: "http://localhost:8080".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// How long a link request stays valid, e.g. "10m"
    pub state_ttl: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            state_ttl: "10m".to_string(),
        }
    }
}

impl OAuthConfig {
    pub fn state_ttl(&self) -> Result<Duration> {
        parse_duration_field("oauth.state_ttl", &self.state_ttl)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishingConfig {
    /// Total attempts per platform, including the first one
    pub max_attempts: u32,
    /// Base delay between attempts, doubled after each retry
    pub retry_backoff: String,
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_backoff: "1s".to_string(),
        }
    }
}

impl PublishingConfig {
    pub fn retry_backoff(&self) -> Result<Duration> {
        parse_duration_field("publishing.retry_backoff", &self.retry_backoff)
    }
}

/// OAuth client registration for one platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Overrides the default scope list requested at link time
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
    /// Overrides the host serving the consent screen (and token endpoint for LinkedIn)
    #[serde(default)]
    pub auth_base: Option<String>,
    /// Overrides the host serving the platform's REST API
    #[serde(default)]
    pub api_base: Option<String>,
}

impl PlatformConfig {
    pub fn new(client_id: &str, client_secret: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            scopes: None,
            auth_base: None,
            api_base: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// A missing file is not an error: the defaults are used instead.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        if !config_path.exists() {
            tracing::warn!(
                "Config file {} not found, using defaults",
                config_path.display()
            );
            return Ok(Self::default_config());
        }
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            database: DatabaseConfig {
                path: "~/.local/share/studiocast/studio.db".to_string(),
            },
            server: ServerConfig::default(),
            oauth: OAuthConfig::default(),
            publishing: PublishingConfig::default(),
            linkedin: None,
            twitter: None,
            facebook: None,
            instagram: None,
        }
    }

    /// Check that every field holds a usable value
    pub fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::MissingField("database.path".to_string()).into());
        }

        for (field, value) in [
            ("server.public_url", &self.server.public_url),
            ("server.frontend_url", &self.server.frontend_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| ConfigError::InvalidValue(field.to_string(), e.to_string()))?;
        }

        self.oauth.state_ttl()?;
        self.publishing.retry_backoff()?;
        if self.publishing.max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "publishing.max_attempts".to_string(),
                "must be at least 1".to_string(),
            )
            .into());
        }

        for platform in Platform::ALL {
            if let Some(platform_config) = self.platform(platform) {
                if platform_config.client_id.trim().is_empty() {
                    return Err(
                        ConfigError::MissingField(format!("{}.client_id", platform)).into()
                    );
                }
                if platform_config.client_secret.trim().is_empty() {
                    return Err(
                        ConfigError::MissingField(format!("{}.client_secret", platform)).into()
                    );
                }
            }
        }

        Ok(())
    }

    /// OAuth client settings for a platform, if that platform is enabled
    pub fn platform(&self, platform: Platform) -> Option<&PlatformConfig> {
        match platform {
            Platform::LinkedIn => self.linkedin.as_ref(),
            Platform::Twitter => self.twitter.as_ref(),
            Platform::Facebook => self.facebook.as_ref(),
            Platform::Instagram => self.instagram.as_ref(),
        }
    }

    /// Redirect URI registered with the platform for account linking
    pub fn redirect_uri(&self, platform: Platform) -> String {
        format!(
            "{}/auth/callback/{}-link",
            self.server.public_url.trim_end_matches('/'),
            platform
        )
    }

    /// Path to the SQLite database with `~` expanded
    pub fn database_path(&self) -> String {
        shellexpand::tilde(&self.database.path).to_string()
    }
}

fn parse_duration_field(field: &str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value)
        .map_err(|e| ConfigError::InvalidValue(field.to_string(), e.to_string()).into())
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("STUDIOCAST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("studiocast").join("config.toml"))
}
