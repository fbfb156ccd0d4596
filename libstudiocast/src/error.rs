//! Error types for Studiocast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StudioError>;

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    #[error("OAuth error: {0}")]
    OAuth(#[from] OAuthError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl StudioError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            StudioError::InvalidInput(_) | StudioError::Conflict(_) | StudioError::OAuth(_) => 400,
            StudioError::Forbidden(_) => 403,
            StudioError::NotFound(_) => 404,
            StudioError::Platform(PlatformError::Authentication(_)) => 401,
            StudioError::Platform(PlatformError::Validation(_)) => 400,
            StudioError::Platform(PlatformError::RateLimit(_)) => 429,
            StudioError::Platform(PlatformError::Posting(_))
            | StudioError::Platform(PlatformError::Network(_)) => 502,
            StudioError::Account(AccountError::NotConnected(_)) => 404,
            StudioError::Account(AccountError::NotOwned(_)) => 403,
            StudioError::Config(_) | StudioError::Database(_) => 500,
        }
    }

    /// Message safe to hand back to API callers
    ///
    /// Infrastructure failures are reported generically; their detail only
    /// goes to the log.
    pub fn public_message(&self) -> String {
        match self {
            StudioError::Config(_) | StudioError::Database(_) => {
                "Internal server error".to_string()
            }
            StudioError::Platform(e) => e.detail().to_string(),
            StudioError::Account(e) => e.to_string(),
            StudioError::InvalidInput(msg)
            | StudioError::NotFound(msg)
            | StudioError::Forbidden(msg)
            | StudioError::Conflict(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Corrupt column {0}: {1}")]
    Corrupt(String, String),
}

#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Content validation failed: {0}")]
    Validation(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),
}

impl PlatformError {
    /// The message without the variant prefix
    pub fn detail(&self) -> &str {
        match self {
            PlatformError::Authentication(msg)
            | PlatformError::Validation(msg)
            | PlatformError::Posting(msg)
            | PlatformError::Network(msg)
            | PlatformError::RateLimit(msg) => msg,
        }
    }

    /// Network hiccups and rate limits may succeed on a later attempt
    pub fn is_transient(&self) -> bool {
        matches!(self, PlatformError::Network(_) | PlatformError::RateLimit(_))
    }
}

#[derive(Error, Debug, Clone)]
pub enum AccountError {
    #[error("No {0} account connected")]
    NotConnected(String),

    #[error("Account {0} does not belong to this user")]
    NotOwned(String),
}

#[derive(Error, Debug, Clone)]
pub enum OAuthError {
    #[error("Invalid or unknown state parameter")]
    InvalidState,

    #[error("State parameter has expired")]
    StateExpired,

    #[error("Provider denied authorization: {0}")]
    ProviderDenied(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Profile fetch failed: {0}")]
    Profile(String),

    #[error("PKCE code verifier missing")]
    MissingVerifier,

    #[error("{0} OAuth client is not configured")]
    NotConfigured(String),
}

impl OAuthError {
    /// Short machine-readable code used in redirect query strings
    pub fn code(&self) -> &'static str {
        match self {
            OAuthError::InvalidState => "invalid_state",
            OAuthError::StateExpired => "state_expired",
            OAuthError::ProviderDenied(_) => "access_denied",
            OAuthError::TokenExchange(_) => "token_exchange_failed",
            OAuthError::Profile(_) => "profile_fetch_failed",
            OAuthError::MissingVerifier => "missing_verifier",
            OAuthError::NotConfigured(_) => "not_configured",
        }
    }
}
