//! Connected account listing and disconnect

use tracing::info;

use crate::db::Database;
use crate::error::{Result, StudioError};
use crate::types::{AccountSummary, Platform};

/// Which accounts to list
#[derive(Debug, Clone, Default)]
pub struct AccountQuery {
    pub workspace_id: Option<String>,
    pub user_id: Option<String>,
    /// With `user_id`, list every account the user owns
    pub all: bool,
    pub platform: Option<Platform>,
}

#[derive(Debug, Clone)]
pub struct DisconnectRequest {
    pub account_id: String,
    pub user_id: String,
    pub workspace_id: Option<String>,
    pub delete_completely: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// The workspace link was removed; the account stays for other workspaces
    Unlinked,
    /// The account and all of its links are gone
    Deleted,
}

#[derive(Clone)]
pub struct AccountService {
    db: Database,
}

impl AccountService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// List accounts linked to a workspace, or owned by a user
    ///
    /// Results are newest first, token fields stripped.
    pub async fn list(&self, query: &AccountQuery) -> Result<Vec<AccountSummary>> {
        let workspace_id = query.workspace_id.as_deref().filter(|s| !s.is_empty());
        let user_id = query.user_id.as_deref().filter(|s| !s.is_empty());

        let accounts = match (workspace_id, user_id) {
            (Some(workspace_id), _) => {
                self.db
                    .list_accounts_for_workspace(workspace_id, query.platform)
                    .await?
            }
            (None, Some(user_id)) if query.all => {
                self.db
                    .list_accounts_for_user(user_id, query.platform)
                    .await?
            }
            _ => {
                return Err(StudioError::InvalidInput(
                    "workspaceId, or userId with all=true, is required".to_string(),
                ))
            }
        };

        let now = chrono::Utc::now().timestamp();
        Ok(accounts
            .iter()
            .map(|account| AccountSummary::from_account(account, now))
            .collect())
    }

    /// Remove an account from a workspace, or delete it outright
    ///
    /// Removing the last workspace link deletes the account as well.
    pub async fn disconnect(&self, request: &DisconnectRequest) -> Result<DisconnectOutcome> {
        let account = self
            .db
            .get_social_account(&request.account_id)
            .await?
            .ok_or_else(|| {
                StudioError::NotFound(format!("Account not found: {}", request.account_id))
            })?;

        if account.user_id != request.user_id {
            return Err(StudioError::Forbidden(
                "You do not have permission to disconnect this account".to_string(),
            ));
        }

        if request.delete_completely {
            self.db.delete_social_account(&account.id).await?;
            info!(account_id = %account.id, "Deleted {} account", account.platform.display_name());
            return Ok(DisconnectOutcome::Deleted);
        }

        let workspace_id = request
            .workspace_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                StudioError::InvalidInput(
                    "workspaceId is required unless deleteCompletely is set".to_string(),
                )
            })?;

        if !self.db.delete_workspace_link(workspace_id, &account.id).await? {
            return Err(StudioError::NotFound(
                "Account is not linked to this workspace".to_string(),
            ));
        }

        if self.db.list_links_for_account(&account.id).await?.is_empty() {
            self.db.delete_social_account(&account.id).await?;
            info!(
                account_id = %account.id,
                "Removed last workspace link, deleted {} account",
                account.platform.display_name()
            );
            return Ok(DisconnectOutcome::Deleted);
        }

        info!(
            account_id = %account.id,
            workspace_id = %workspace_id,
            "Unlinked {} account from workspace",
            account.platform.display_name()
        );
        Ok(DisconnectOutcome::Unlinked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::mock::test_account;
    use crate::types::{SocialAccount, WorkspaceAccount};

    async fn setup() -> (Database, AccountService) {
        let db = Database::in_memory().await.unwrap();
        (db.clone(), AccountService::new(db))
    }

    async fn link(db: &Database, workspace_id: &str, account: &SocialAccount) {
        db.link_account_if_absent(&WorkspaceAccount {
            id: format!("{}-{}", workspace_id, account.id),
            workspace_id: workspace_id.to_string(),
            social_account_id: account.id.clone(),
            user_id: account.user_id.clone(),
            created_at: 0,
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_list_requires_scope() {
        let (_db, service) = setup().await;
        let err = service
            .list(&AccountQuery {
                user_id: Some("user-1".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_list_by_workspace_hides_tokens() {
        let (db, service) = setup().await;
        let account = test_account(Platform::LinkedIn);
        db.insert_social_account(&account).await.unwrap();
        link(&db, "ws-1", &account).await;

        let listed = service
            .list(&AccountQuery {
                workspace_id: Some("ws-1".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, account.id);

        let json = serde_json::to_string(&listed).unwrap();
        assert!(!json.contains("test-access-token"));
    }

    #[tokio::test]
    async fn test_list_all_for_user_with_platform_filter() {
        let (db, service) = setup().await;
        db.insert_social_account(&test_account(Platform::LinkedIn))
            .await
            .unwrap();
        db.insert_social_account(&test_account(Platform::Twitter))
            .await
            .unwrap();

        let listed = service
            .list(&AccountQuery {
                user_id: Some("user-1".to_string()),
                all: true,
                platform: Some(Platform::Twitter),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].platform, Platform::Twitter);
    }

    #[tokio::test]
    async fn test_disconnect_keeps_account_linked_elsewhere() {
        let (db, service) = setup().await;
        let account = test_account(Platform::Facebook);
        db.insert_social_account(&account).await.unwrap();
        link(&db, "ws-1", &account).await;
        link(&db, "ws-2", &account).await;

        let request = DisconnectRequest {
            account_id: account.id.clone(),
            user_id: "user-1".to_string(),
            workspace_id: Some("ws-1".to_string()),
            delete_completely: false,
        };
        assert_eq!(
            service.disconnect(&request).await.unwrap(),
            DisconnectOutcome::Unlinked
        );
        assert!(db.get_social_account(&account.id).await.unwrap().is_some());

        let err = service.disconnect(&request).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_disconnect_last_link_deletes_account() {
        let (db, service) = setup().await;
        let account = test_account(Platform::Twitter);
        db.insert_social_account(&account).await.unwrap();
        link(&db, "ws-1", &account).await;

        let outcome = service
            .disconnect(&DisconnectRequest {
                account_id: account.id.clone(),
                user_id: "user-1".to_string(),
                workspace_id: Some("ws-1".to_string()),
                delete_completely: false,
            })
            .await
            .unwrap();
        assert_eq!(outcome, DisconnectOutcome::Deleted);
        assert!(db.get_social_account(&account.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_disconnect_requires_ownership() {
        let (db, service) = setup().await;
        let account = test_account(Platform::Instagram);
        db.insert_social_account(&account).await.unwrap();

        let err = service
            .disconnect(&DisconnectRequest {
                account_id: account.id.clone(),
                user_id: "intruder".to_string(),
                workspace_id: None,
                delete_completely: true,
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(db.get_social_account(&account.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_completely_removes_links() {
        let (db, service) = setup().await;
        let account = test_account(Platform::LinkedIn);
        db.insert_social_account(&account).await.unwrap();
        link(&db, "ws-1", &account).await;
        link(&db, "ws-2", &account).await;

        let outcome = service
            .disconnect(&DisconnectRequest {
                account_id: account.id.clone(),
                user_id: "user-1".to_string(),
                workspace_id: None,
                delete_completely: true,
            })
            .await
            .unwrap();
        assert_eq!(outcome, DisconnectOutcome::Deleted);
        assert!(db.list_links_for_account(&account.id).await.unwrap().is_empty());
    }
}
