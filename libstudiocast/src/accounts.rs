//! Account resolution for publishing
//!
//! Picks the stored credential a publish call should use. Ownership is
//! checked against the requesting user, not the workspace: a user who
//! belongs to several workspaces may publish with any account they own.

use crate::db::Database;
use crate::error::{AccountError, Result};
use crate::types::{Platform, SocialAccount};

#[derive(Clone)]
pub struct AccountResolver {
    db: Database,
}

impl AccountResolver {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Resolve exactly one account for `user_id` on `platform`
    ///
    /// With an explicit `account_id` that account is used, provided the
    /// user owns it and it belongs to `platform`. Otherwise the user's most
    /// recently connected account on the platform is chosen.
    ///
    /// # Errors
    ///
    /// - `AccountError::NotOwned` if the explicit account belongs to someone else
    /// - `AccountError::NotConnected` if no matching account exists
    pub async fn resolve(
        &self,
        user_id: &str,
        platform: Platform,
        account_id: Option<&str>,
    ) -> Result<SocialAccount> {
        match account_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => {
                let account = self
                    .db
                    .get_social_account(id)
                    .await?
                    .ok_or_else(|| AccountError::NotConnected(platform.to_string()))?;

                if account.user_id != user_id {
                    tracing::warn!(
                        account_id = %id,
                        "User attempted to publish with an account they do not own"
                    );
                    return Err(AccountError::NotOwned(id.to_string()).into());
                }

                if account.platform != platform {
                    return Err(AccountError::NotConnected(platform.to_string()).into());
                }

                Ok(account)
            }
            None => self
                .db
                .latest_account_for(user_id, platform)
                .await?
                .ok_or_else(|| AccountError::NotConnected(platform.to_string()).into()),
        }
    }
}
