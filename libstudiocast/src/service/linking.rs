//! Account linking through OAuth
//!
//! `begin_link` records who is linking into which workspace and returns the
//! provider consent URL. `complete_link` handles the provider callback:
//! the state token is consumed, the code exchanged, the external profile
//! fetched, and the account upserted and linked into the workspace.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::db::Database;
use crate::error::{OAuthError, Result, StudioError};
use crate::oauth::pkce::PkcePair;
use crate::oauth::state::{OAuthStateStore, PendingLink};
use crate::oauth::{PlatformProfile, TokenManager, TokenSet};
use crate::types::{Platform, SocialAccount, WorkspaceAccount};

/// Query parameters a provider sends back to the callback URL
#[derive(Debug, Clone, Default)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// A completed link
#[derive(Debug, Clone)]
pub struct LinkedAccount {
    pub workspace_id: String,
    pub account: SocialAccount,
    /// False when an existing account was refreshed in place
    pub account_created: bool,
    /// False when the account was already linked to the workspace
    pub link_created: bool,
}

/// A failed link, with the workspace to return to when it is known
#[derive(Debug)]
pub struct LinkFailure {
    pub workspace_id: Option<String>,
    pub error: StudioError,
}

impl LinkFailure {
    fn new(workspace_id: Option<String>, error: impl Into<StudioError>) -> Self {
        Self {
            workspace_id,
            error: error.into(),
        }
    }

    /// Short code placed in the redirect query string
    pub fn code(&self) -> &'static str {
        match &self.error {
            StudioError::OAuth(e) => e.code(),
            StudioError::Forbidden(_) => "account_owned_by_another_user",
            StudioError::NotFound(_) => "workspace_not_found",
            _ => "link_failed",
        }
    }
}

#[derive(Clone)]
pub struct LinkingService {
    db: Database,
    config: Arc<Config>,
    tokens: Arc<TokenManager>,
    states: OAuthStateStore,
}

impl LinkingService {
    pub fn new(
        db: Database,
        config: Arc<Config>,
        tokens: Arc<TokenManager>,
        states: OAuthStateStore,
    ) -> Self {
        Self {
            db,
            config,
            tokens,
            states,
        }
    }

    /// Start linking a `platform` account into `workspace_id`
    ///
    /// Returns the provider consent URL the user should be redirected to.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the user or workspace id is empty
    /// - `OAuth(NotConfigured)` if no client credentials exist for the platform
    /// - `NotFound` if the workspace does not exist
    pub async fn begin_link(
        &self,
        platform: Platform,
        user_id: &str,
        workspace_id: &str,
    ) -> Result<String> {
        if user_id.trim().is_empty() || workspace_id.trim().is_empty() {
            return Err(StudioError::InvalidInput(
                "userId and workspaceId are required".to_string(),
            ));
        }

        if !self.tokens.is_configured(platform) {
            return Err(OAuthError::NotConfigured(platform.display_name().to_string()).into());
        }

        self.require_workspace(workspace_id).await?;

        let pkce = platform.uses_pkce().then(PkcePair::generate);
        let now = chrono::Utc::now().timestamp();
        let link = self
            .states
            .issue(
                platform,
                user_id,
                workspace_id,
                pkce.as_ref().map(|p| p.verifier.clone()),
                now,
            )
            .await?;

        let url = self.tokens.authorize_url(
            platform,
            &link.token,
            &self.config.redirect_uri(platform),
            pkce.as_ref().map(|p| p.challenge.as_str()),
        )?;

        info!(workspace_id = %workspace_id, "Starting {} account link", platform.display_name());
        Ok(url)
    }

    /// Finish a link flow from the provider callback
    pub async fn complete_link(
        &self,
        platform: Platform,
        params: &CallbackParams,
    ) -> std::result::Result<LinkedAccount, LinkFailure> {
        let now = chrono::Utc::now().timestamp();
        let token = params.state.as_deref().unwrap_or_default();
        let link = self
            .states
            .consume(token, platform, now)
            .await
            .map_err(|e| LinkFailure::new(None, e))?;

        let workspace_id = link.workspace_id.clone();
        match self.finish(platform, &link, params, now).await {
            Ok(linked) => Ok(linked),
            Err(e) => {
                warn!(
                    workspace_id = %workspace_id,
                    "{} account link failed: {}",
                    platform.display_name(),
                    e
                );
                Err(LinkFailure::new(Some(workspace_id), e))
            }
        }
    }

    async fn finish(
        &self,
        platform: Platform,
        link: &PendingLink,
        params: &CallbackParams,
        now: i64,
    ) -> Result<LinkedAccount> {
        if let Some(error) = params.error.as_deref() {
            let detail = params.error_description.as_deref().unwrap_or(error);
            return Err(OAuthError::ProviderDenied(detail.to_string()).into());
        }

        let code = params
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| OAuthError::ProviderDenied("no authorization code returned".to_string()))?;

        self.require_workspace(&link.workspace_id).await?;

        let tokens = self
            .tokens
            .exchange_code(
                platform,
                code,
                &self.config.redirect_uri(platform),
                link.code_verifier.as_deref(),
            )
            .await?;

        let profile = self.tokens.fetch_profile(platform, &tokens.access_token).await?;

        let (account, account_created) = self
            .upsert_account(platform, &link.user_id, profile, &tokens, now)
            .await?;

        let link_created = self
            .db
            .link_account_if_absent(&WorkspaceAccount {
                id: Uuid::new_v4().to_string(),
                workspace_id: link.workspace_id.clone(),
                social_account_id: account.id.clone(),
                user_id: link.user_id.clone(),
                created_at: now,
            })
            .await?;

        info!(
            workspace_id = %link.workspace_id,
            account_id = %account.id,
            account_created,
            link_created,
            "Linked {} account",
            platform.display_name()
        );

        Ok(LinkedAccount {
            workspace_id: link.workspace_id.clone(),
            account,
            account_created,
            link_created,
        })
    }

    /// Insert or refresh the account identified by (platform user id, platform)
    async fn upsert_account(
        &self,
        platform: Platform,
        user_id: &str,
        profile: PlatformProfile,
        tokens: &TokenSet,
        now: i64,
    ) -> Result<(SocialAccount, bool)> {
        let access_token = profile
            .access_token
            .clone()
            .unwrap_or_else(|| tokens.access_token.clone());
        let token_expiry = tokens.expiry_from(now);

        match self
            .db
            .find_account_by_platform_user(platform, &profile.platform_user_id)
            .await?
        {
            Some(existing) if existing.user_id != user_id => {
                warn!(
                    account_id = %existing.id,
                    "{} account is already connected by another user",
                    platform.display_name()
                );
                Err(StudioError::Forbidden(format!(
                    "This {} account is already connected to another user",
                    platform.display_name()
                )))
            }
            Some(mut existing) => {
                existing.access_token = access_token;
                if tokens.refresh_token.is_some() {
                    existing.refresh_token = tokens.refresh_token.clone();
                }
                existing.token_expiry = token_expiry;
                existing.account_name = profile.name;
                existing.account_email = profile.email.or(existing.account_email);
                existing.account_image = profile.image.or(existing.account_image);
                existing.updated_at = now;
                self.db.update_social_account(&existing).await?;
                Ok((existing, false))
            }
            None => {
                let account = SocialAccount {
                    id: Uuid::new_v4().to_string(),
                    user_id: user_id.to_string(),
                    platform,
                    platform_user_id: profile.platform_user_id,
                    access_token,
                    refresh_token: tokens.refresh_token.clone(),
                    token_expiry,
                    account_name: profile.name,
                    account_email: profile.email,
                    account_image: profile.image,
                    created_at: now,
                    updated_at: now,
                };
                self.db.insert_social_account(&account).await?;
                Ok((account, true))
            }
        }
    }

    async fn require_workspace(&self, workspace_id: &str) -> Result<()> {
        match self.db.get_workspace(workspace_id).await? {
            Some(_) => Ok(()),
            None => Err(StudioError::NotFound(format!(
                "Workspace not found: {}",
                workspace_id
            ))),
        }
    }

    /// Frontend page to land on after a successful link
    pub fn success_redirect(&self, platform: Platform, linked: &LinkedAccount) -> String {
        format!(
            "{}/workspace/{}/settings?success={}_connected",
            self.frontend_url(),
            linked.workspace_id,
            platform
        )
    }

    /// Frontend page to land on after a failed link
    pub fn failure_redirect(&self, failure: &LinkFailure) -> String {
        match &failure.workspace_id {
            Some(workspace_id) => format!(
                "{}/workspace/{}/settings?error={}",
                self.frontend_url(),
                workspace_id,
                failure.code()
            ),
            None => format!("{}/settings?error={}", self.frontend_url(), failure.code()),
        }
    }

    fn frontend_url(&self) -> &str {
        self.config.server.frontend_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlatformConfig;
    use crate::types::Workspace;
    use std::collections::HashMap;
    use std::time::Duration;

    async fn service(config: Config) -> (Database, LinkingService) {
        let db = Database::in_memory().await.unwrap();
        let config = Arc::new(config);
        let tokens = Arc::new(TokenManager::from_config(&config, reqwest::Client::new()));
        let states = OAuthStateStore::new(db.clone(), Duration::from_secs(600));
        (db.clone(), LinkingService::new(db, config, tokens, states))
    }

    fn twitter_config() -> Config {
        let mut config = Config::default_config();
        config.twitter = Some(PlatformConfig::new("tw-client", "secret"));
        config
    }

    #[tokio::test]
    async fn test_begin_link_issues_opaque_state() {
        let (db, linking) = service(twitter_config()).await;
        let workspace = Workspace::new("user-1", "Main");
        db.create_workspace(&workspace).await.unwrap();

        let url = linking
            .begin_link(Platform::Twitter, "user-1", &workspace.id)
            .await
            .unwrap();
        let parsed = url::Url::parse(&url).unwrap();
        let query: HashMap<_, _> = parsed.query_pairs().into_owned().collect();

        let state = &query["state"];
        assert!(!state.contains(&workspace.id));
        assert!(!state.contains("user-1"));
        assert_eq!(
            query["redirect_uri"],
            "http://localhost:8080/auth/callback/twitter-link"
        );

        let pending = db.take_pending_link(state).await.unwrap().unwrap();
        assert_eq!(pending.workspace_id, workspace.id);
        let verifier = pending.code_verifier.unwrap();
        assert_eq!(
            crate::oauth::pkce::challenge_for(&verifier),
            query["code_challenge"]
        );
    }

    #[tokio::test]
    async fn test_begin_link_unknown_workspace() {
        let (_db, linking) = service(twitter_config()).await;
        let err = linking
            .begin_link(Platform::Twitter, "user-1", "missing")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_begin_link_unconfigured_platform() {
        let (db, linking) = service(Config::default_config()).await;
        let workspace = Workspace::new("user-1", "Main");
        db.create_workspace(&workspace).await.unwrap();

        let err = linking
            .begin_link(Platform::LinkedIn, "user-1", &workspace.id)
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::OAuth(OAuthError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_complete_link_with_unknown_state() {
        let (_db, linking) = service(twitter_config()).await;
        let failure = linking
            .complete_link(
                Platform::Twitter,
                &CallbackParams {
                    code: Some("code".to_string()),
                    state: Some("forged".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(failure.workspace_id.is_none());
        assert_eq!(
            linking.failure_redirect(&failure),
            "http://localhost:3000/settings?error=invalid_state"
        );
    }

    #[tokio::test]
    async fn test_complete_link_provider_denied() {
        let (db, linking) = service(twitter_config()).await;
        let workspace = Workspace::new("user-1", "Main");
        db.create_workspace(&workspace).await.unwrap();

        let url = linking
            .begin_link(Platform::Twitter, "user-1", &workspace.id)
            .await
            .unwrap();
        let state = url::Url::parse(&url)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap();

        let failure = linking
            .complete_link(
                Platform::Twitter,
                &CallbackParams {
                    state: Some(state),
                    error: Some("access_denied".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert_eq!(failure.code(), "access_denied");
        assert_eq!(
            linking.failure_redirect(&failure),
            format!(
                "http://localhost:3000/workspace/{}/settings?error=access_denied",
                workspace.id
            )
        );
    }
}
