//! Server-side OAuth link state
//!
//! The `state` parameter sent to a provider is an opaque random token. The
//! link context (who is linking, into which workspace, the PKCE verifier) is
//! stored under that token and handed back exactly once on callback.

use std::time::Duration;

use crate::db::Database;
use crate::error::{OAuthError, Result};
use crate::oauth::pkce::random_token;
use crate::types::Platform;

/// Bytes of randomness in a state token
const STATE_TOKEN_BYTES: usize = 32;

/// Context captured when a link flow starts
#[derive(Debug, Clone, PartialEq)]
pub struct PendingLink {
    pub token: String,
    pub platform: Platform,
    pub user_id: String,
    pub workspace_id: String,
    pub code_verifier: Option<String>,
    pub created_at: i64,
    pub expires_at: i64,
}

#[derive(Clone)]
pub struct OAuthStateStore {
    db: Database,
    ttl: Duration,
}

impl OAuthStateStore {
    pub fn new(db: Database, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    /// Store a new link request and return it with its fresh token
    pub async fn issue(
        &self,
        platform: Platform,
        user_id: &str,
        workspace_id: &str,
        code_verifier: Option<String>,
        now: i64,
    ) -> Result<PendingLink> {
        let link = PendingLink {
            token: random_token(STATE_TOKEN_BYTES),
            platform,
            user_id: user_id.to_string(),
            workspace_id: workspace_id.to_string(),
            code_verifier,
            created_at: now,
            expires_at: now + self.ttl.as_secs() as i64,
        };
        self.db.insert_pending_link(&link).await?;
        Ok(link)
    }

    /// Resolve and invalidate a state token returned by `platform`
    ///
    /// The token is deleted even when it turns out to be expired or issued
    /// for another platform, so a rejected state cannot be replayed.
    pub async fn consume(&self, token: &str, platform: Platform, now: i64) -> Result<PendingLink> {
        if token.trim().is_empty() {
            return Err(OAuthError::InvalidState.into());
        }

        let link = self
            .db
            .take_pending_link(token)
            .await?
            .ok_or(OAuthError::InvalidState)?;

        if link.platform != platform {
            tracing::warn!(
                expected = %link.platform,
                received = %platform,
                "OAuth state presented on the wrong callback"
            );
            return Err(OAuthError::InvalidState.into());
        }

        if link.expires_at < now {
            return Err(OAuthError::StateExpired.into());
        }

        if link.user_id.is_empty() || link.workspace_id.is_empty() {
            return Err(OAuthError::InvalidState.into());
        }

        if platform.uses_pkce() && link.code_verifier.is_none() {
            return Err(OAuthError::MissingVerifier.into());
        }

        Ok(link)
    }

    /// Drop link requests that expired before `now`
    pub async fn purge_expired(&self, now: i64) -> Result<u64> {
        let purged = self.db.purge_pending_links(now).await?;
        if purged > 0 {
            tracing::debug!("Purged {} expired OAuth link requests", purged);
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StudioError;

    async fn store() -> OAuthStateStore {
        let db = Database::in_memory().await.unwrap();
        OAuthStateStore::new(db, Duration::from_secs(600))
    }

    #[tokio::test]
    async fn test_issue_then_consume_once() {
        let store = store().await;
        let link = store
            .issue(Platform::LinkedIn, "user-1", "ws-1", None, 1_000)
            .await
            .unwrap();
        assert_eq!(link.expires_at, 1_600);

        let consumed = store.consume(&link.token, Platform::LinkedIn, 1_100).await.unwrap();
        assert_eq!(consumed, link);

        let replay = store.consume(&link.token, Platform::LinkedIn, 1_100).await;
        assert!(matches!(
            replay,
            Err(StudioError::OAuth(OAuthError::InvalidState))
        ));
    }

    #[tokio::test]
    async fn test_unknown_token_rejected() {
        let store = store().await;
        let err = store
            .consume("forged", Platform::Facebook, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::OAuth(OAuthError::InvalidState)));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let store = store().await;
        let link = store
            .issue(Platform::Facebook, "user-1", "ws-1", None, 1_000)
            .await
            .unwrap();
        let err = store
            .consume(&link.token, Platform::Facebook, 2_000)
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::OAuth(OAuthError::StateExpired)));
    }

    #[tokio::test]
    async fn test_wrong_platform_rejected_and_burned() {
        let store = store().await;
        let link = store
            .issue(Platform::Facebook, "user-1", "ws-1", None, 1_000)
            .await
            .unwrap();

        assert!(store.consume(&link.token, Platform::Instagram, 1_001).await.is_err());
        assert!(store.consume(&link.token, Platform::Facebook, 1_001).await.is_err());
    }

    #[tokio::test]
    async fn test_twitter_requires_verifier() {
        let store = store().await;
        let link = store
            .issue(Platform::Twitter, "user-1", "ws-1", None, 1_000)
            .await
            .unwrap();
        let err = store
            .consume(&link.token, Platform::Twitter, 1_001)
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::OAuth(OAuthError::MissingVerifier)));
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = store().await;
        store
            .issue(Platform::LinkedIn, "user-1", "ws-1", None, 0)
            .await
            .unwrap();
        let fresh = store
            .issue(Platform::LinkedIn, "user-1", "ws-1", None, 10_000)
            .await
            .unwrap();

        assert_eq!(store.purge_expired(5_000).await.unwrap(), 1);
        assert!(store.consume(&fresh.token, Platform::LinkedIn, 10_001).await.is_ok());
    }
}
