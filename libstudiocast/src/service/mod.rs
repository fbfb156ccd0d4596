//! Service layer for Studiocast
//!
//! `StudioService` is the single entry point used by the HTTP API. It owns
//! the shared resources (database, config, HTTP client, token manager) and
//! hands out the sub-services built on top of them:
//!
//! - `PublishOrchestrator`: fan a post out to several platforms
//! - `PlatformPoster`: publish ad-hoc content to a single platform
//! - `LinkingService`: OAuth account linking
//! - `AccountService`: list and disconnect linked accounts
//! - `DraftService`: post CRUD and scheduling
//!
//! # Example
//!
//! ```no_run
//! use libstudiocast::service::publishing::PublishPostRequest;
//! use libstudiocast::service::StudioService;
//! use libstudiocast::Platform;
//!
//! # async fn example() -> libstudiocast::Result<()> {
//! let service = StudioService::new().await?;
//!
//! let request = PublishPostRequest {
//!     platforms: vec![Platform::LinkedIn, Platform::Twitter],
//!     user_id: "user-1".to_string(),
//!     workspace_id: None,
//! };
//! let response = service.publishing().publish("post-id", &request).await?;
//! println!("Published to {} of {} platforms", response.published, response.total);
//! # Ok(())
//! # }
//! ```

pub mod accounts;
pub mod draft;
pub mod linking;
pub mod publishing;

use std::sync::Arc;
use std::time::Duration;

use self::accounts::AccountService;
use self::draft::DraftService;
use self::linking::LinkingService;
use self::publishing::PublishOrchestrator;
use crate::error::ConfigError;
use crate::oauth::state::OAuthStateStore;
use crate::oauth::TokenManager;
use crate::platforms::AdapterRegistry;
use crate::poster::{PlatformPoster, RetryPolicy};
use crate::{Config, Database, Result};

/// Timeout applied to every outbound platform request
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Main service facade that coordinates all sub-services
///
/// All sub-services share the same `Database` pool and `Arc<Config>`.
pub struct StudioService {
    db: Database,
    config: Arc<Config>,
    states: OAuthStateStore,
    poster: PlatformPoster,
    publishing: PublishOrchestrator,
    linking: LinkingService,
    accounts: AccountService,
    drafts: DraftService,
}

impl StudioService {
    /// Create a service from the default configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration cannot be loaded
    /// - Database cannot be initialized
    /// - Database migrations fail
    pub async fn new() -> Result<Self> {
        let config = Config::load()?;
        Self::from_config(config).await
    }

    /// Create a service with a pre-built configuration
    pub async fn from_config(config: Config) -> Result<Self> {
        let db = Database::new(&config.database_path()).await?;
        Self::with_database(config, db)
    }

    /// Create a service over an already opened database
    ///
    /// Platform adapters are built from the configuration.
    pub fn with_database(config: Config, db: Database) -> Result<Self> {
        let http = build_http_client()?;
        let registry = AdapterRegistry::from_config(&config, http.clone());
        Self::assemble(config, db, http, registry)
    }

    /// Create a service with a caller-supplied adapter registry
    ///
    /// Used by tests to substitute mock adapters.
    pub fn with_registry(config: Config, db: Database, registry: AdapterRegistry) -> Result<Self> {
        let http = build_http_client()?;
        Self::assemble(config, db, http, registry)
    }

    fn assemble(
        config: Config,
        db: Database,
        http: reqwest::Client,
        registry: AdapterRegistry,
    ) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);

        let tokens = Arc::new(TokenManager::from_config(&config, http));
        let states = OAuthStateStore::new(db.clone(), config.oauth.state_ttl()?);
        let retry = RetryPolicy::from_config(&config.publishing)?;

        let poster = PlatformPoster::new(db.clone(), Arc::clone(&tokens), registry, retry);
        let publishing = PublishOrchestrator::new(db.clone(), poster.clone());
        let linking = LinkingService::new(
            db.clone(),
            Arc::clone(&config),
            Arc::clone(&tokens),
            states.clone(),
        );
        let accounts = AccountService::new(db.clone());
        let drafts = DraftService::new(db.clone());

        Ok(Self {
            db,
            config,
            states,
            poster,
            publishing,
            linking,
            accounts,
            drafts,
        })
    }

    /// Access the database directly
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Multi-platform publishing of stored posts
    pub fn publishing(&self) -> &PublishOrchestrator {
        &self.publishing
    }

    /// Single-platform publishing of ad-hoc content
    pub fn poster(&self) -> &PlatformPoster {
        &self.poster
    }

    pub fn linking(&self) -> &LinkingService {
        &self.linking
    }

    pub fn accounts(&self) -> &AccountService {
        &self.accounts
    }

    pub fn drafts(&self) -> &DraftService {
        &self.drafts
    }

    /// Pending OAuth link requests, exposed for periodic purging
    pub fn oauth_states(&self) -> &OAuthStateStore {
        &self.states
    }
}

fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(concat!("studiocast/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ConfigError::InvalidValue("http client".to_string(), e.to_string()).into())
}
