//! Database operations for Studiocast
//!
//! SQLite through a shared `sqlx` pool. One `Database` is created per
//! process and cloned into every service that needs storage.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;

use crate::error::{DbError, Result};
use crate::oauth::state::PendingLink;
use crate::types::{
    PlatformContent, Platform, Post, PostStatus, PublishedPlatform, SocialAccount, Workspace,
    WorkspaceAccount,
};

/// Final state written back after a publish attempt
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub status: PostStatus,
    /// Successful results of this attempt, appended to the post's history
    pub published: Vec<PublishedPlatform>,
    pub error_log: Option<String>,
    /// Extra attempts spent on transient failures
    pub retries: i64,
    pub finished_at: i64,
}

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database at `db_path` and run migrations
    pub async fn new(db_path: &str) -> Result<Self> {
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(DbError::IoError)?;
            }
        }

        // Forward slashes keep the URL valid on Windows; mode=rwc creates the file
        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(DbError::SqlxError)?;

        Self::from_pool(pool).await
    }

    /// A private in-memory database, used by tests
    ///
    /// Every SQLite memory connection is its own database, so the pool is
    /// pinned to a single connection that is never recycled.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(DbError::SqlxError)?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .map_err(DbError::SqlxError)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DbError::MigrationError)?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ------------------------------------------------------------------
    // Workspaces
    // ------------------------------------------------------------------

    pub async fn create_workspace(&self, workspace: &Workspace) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO workspaces (id, user_id, name, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&workspace.id)
        .bind(&workspace.user_id)
        .bind(&workspace.name)
        .bind(workspace.created_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    pub async fn get_workspace(&self, workspace_id: &str) -> Result<Option<Workspace>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, name, created_at FROM workspaces WHERE id = ?
            "#,
        )
        .bind(workspace_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        match row {
            Some(r) => Ok(Some(Workspace {
                id: column(&r, "id")?,
                user_id: column(&r, "user_id")?,
                name: column(&r, "name")?,
                created_at: column(&r, "created_at")?,
            })),
            None => Ok(None),
        }
    }

    /// Delete a workspace together with its account links
    pub async fn delete_workspace(&self, workspace_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(DbError::SqlxError)?;

        sqlx::query("DELETE FROM workspace_accounts WHERE workspace_id = ?")
            .bind(workspace_id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::SqlxError)?;

        sqlx::query("DELETE FROM workspaces WHERE id = ?")
            .bind(workspace_id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::SqlxError)?;

        tx.commit().await.map_err(DbError::SqlxError)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Social accounts
    // ------------------------------------------------------------------

    pub async fn insert_social_account(&self, account: &SocialAccount) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO social_accounts (
                id, user_id, platform, platform_user_id, access_token, refresh_token,
                token_expiry, account_name, account_email, account_image, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.id)
        .bind(&account.user_id)
        .bind(account.platform.as_str())
        .bind(&account.platform_user_id)
        .bind(&account.access_token)
        .bind(&account.refresh_token)
        .bind(account.token_expiry)
        .bind(&account.account_name)
        .bind(&account.account_email)
        .bind(&account.account_image)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Replace tokens and profile fields of an existing account
    pub async fn update_social_account(&self, account: &SocialAccount) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE social_accounts
            SET access_token = ?, refresh_token = ?, token_expiry = ?,
                account_name = ?, account_email = ?, account_image = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&account.access_token)
        .bind(&account.refresh_token)
        .bind(account.token_expiry)
        .bind(&account.account_name)
        .bind(&account.account_email)
        .bind(&account.account_image)
        .bind(account.updated_at)
        .bind(&account.id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Store refreshed tokens
    pub async fn update_account_tokens(
        &self,
        account_id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
        token_expiry: Option<i64>,
        updated_at: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE social_accounts
            SET access_token = ?, refresh_token = ?, token_expiry = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(access_token)
        .bind(refresh_token)
        .bind(token_expiry)
        .bind(updated_at)
        .bind(account_id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    pub async fn get_social_account(&self, account_id: &str) -> Result<Option<SocialAccount>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_ACCOUNT))
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        row.as_ref().map(row_to_account).transpose()
    }

    pub async fn find_account_by_platform_user(
        &self,
        platform: Platform,
        platform_user_id: &str,
    ) -> Result<Option<SocialAccount>> {
        let row = sqlx::query(&format!(
            "{} WHERE platform = ? AND platform_user_id = ?",
            SELECT_ACCOUNT
        ))
        .bind(platform.as_str())
        .bind(platform_user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// Most recently created account of `user_id` on `platform`
    ///
    /// Ties on the second-resolution timestamp fall back to insertion order.
    pub async fn latest_account_for(
        &self,
        user_id: &str,
        platform: Platform,
    ) -> Result<Option<SocialAccount>> {
        let row = sqlx::query(&format!(
            "{} WHERE user_id = ? AND platform = ? ORDER BY created_at DESC, rowid DESC LIMIT 1",
            SELECT_ACCOUNT
        ))
        .bind(user_id)
        .bind(platform.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        row.as_ref().map(row_to_account).transpose()
    }

    pub async fn list_accounts_for_user(
        &self,
        user_id: &str,
        platform: Option<Platform>,
    ) -> Result<Vec<SocialAccount>> {
        let mut sql = format!("{} WHERE user_id = ?", SELECT_ACCOUNT);
        if platform.is_some() {
            sql.push_str(" AND platform = ?");
        }
        sql.push_str(" ORDER BY created_at DESC, id ASC");

        let mut query = sqlx::query(&sql).bind(user_id);
        if let Some(p) = platform {
            query = query.bind(p.as_str());
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        rows.iter().map(row_to_account).collect()
    }

    pub async fn list_accounts_for_workspace(
        &self,
        workspace_id: &str,
        platform: Option<Platform>,
    ) -> Result<Vec<SocialAccount>> {
        let mut sql = String::from(
            r#"
            SELECT sa.id, sa.user_id, sa.platform, sa.platform_user_id, sa.access_token,
                   sa.refresh_token, sa.token_expiry, sa.account_name, sa.account_email,
                   sa.account_image, sa.created_at, sa.updated_at
            FROM social_accounts sa
            JOIN workspace_accounts wa ON wa.social_account_id = sa.id
            WHERE wa.workspace_id = ?
            "#,
        );
        if platform.is_some() {
            sql.push_str(" AND sa.platform = ?");
        }
        sql.push_str(" ORDER BY sa.created_at DESC, sa.id ASC");

        let mut query = sqlx::query(&sql).bind(workspace_id);
        if let Some(p) = platform {
            query = query.bind(p.as_str());
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        rows.iter().map(row_to_account).collect()
    }

    /// Delete an account and every workspace link pointing at it
    pub async fn delete_social_account(&self, account_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(DbError::SqlxError)?;

        sqlx::query("DELETE FROM workspace_accounts WHERE social_account_id = ?")
            .bind(account_id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::SqlxError)?;

        sqlx::query("DELETE FROM social_accounts WHERE id = ?")
            .bind(account_id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::SqlxError)?;

        tx.commit().await.map_err(DbError::SqlxError)?;
        Ok(())
    }

    pub async fn count_social_accounts(&self, platform: Platform) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM social_accounts WHERE platform = ?")
            .bind(platform.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;
        Ok(count)
    }

    // ------------------------------------------------------------------
    // Workspace links
    // ------------------------------------------------------------------

    /// Link an account into a workspace unless the link already exists
    ///
    /// Returns `true` when a new link row was written.
    pub async fn link_account_if_absent(&self, link: &WorkspaceAccount) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO workspace_accounts (id, workspace_id, social_account_id, user_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (workspace_id, social_account_id) DO NOTHING
            "#,
        )
        .bind(&link.id)
        .bind(&link.workspace_id)
        .bind(&link.social_account_id)
        .bind(&link.user_id)
        .bind(link.created_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn list_links_for_account(&self, account_id: &str) -> Result<Vec<WorkspaceAccount>> {
        let rows = sqlx::query(
            r#"
            SELECT id, workspace_id, social_account_id, user_id, created_at
            FROM workspace_accounts
            WHERE social_account_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        rows.iter()
            .map(|r| {
                Ok(WorkspaceAccount {
                    id: column(r, "id")?,
                    workspace_id: column(r, "workspace_id")?,
                    social_account_id: column(r, "social_account_id")?,
                    user_id: column(r, "user_id")?,
                    created_at: column(r, "created_at")?,
                })
            })
            .collect()
    }

    /// Remove one workspace link; returns `false` if it did not exist
    pub async fn delete_workspace_link(&self, workspace_id: &str, account_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM workspace_accounts WHERE workspace_id = ? AND social_account_id = ?",
        )
        .bind(workspace_id)
        .bind(account_id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() > 0)
    }

    // ------------------------------------------------------------------
    // Posts
    // ------------------------------------------------------------------

    pub async fn create_post(&self, post: &Post) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (
                id, user_id, workspace_id, content, topic, tone, status, scheduled_at,
                published_platforms, error_log, media_urls, retry_count, last_retry_at,
                platform_content, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.user_id)
        .bind(&post.workspace_id)
        .bind(&post.content)
        .bind(&post.topic)
        .bind(&post.tone)
        .bind(post.status.as_str())
        .bind(post.scheduled_at)
        .bind(to_json(&post.published_platforms)?)
        .bind(&post.error_log)
        .bind(to_json(&post.media_urls)?)
        .bind(post.retry_count)
        .bind(post.last_retry_at)
        .bind(to_json(&post.platform_content)?)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    pub async fn get_post(&self, post_id: &str) -> Result<Option<Post>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_POST))
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        row.as_ref().map(row_to_post).transpose()
    }

    pub async fn list_posts_for_workspace(&self, workspace_id: &str) -> Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "{} WHERE workspace_id = ? ORDER BY created_at DESC, id ASC",
            SELECT_POST
        ))
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        rows.iter().map(row_to_post).collect()
    }

    /// Save editor-owned fields unless a publish is in flight
    ///
    /// Status and schedule are left alone; they only move through
    /// [`schedule_post`](Self::schedule_post) and the publish lock. Returns
    /// `false` when the post is missing or currently publishing.
    pub async fn update_post_fields(&self, post: &Post) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET content = ?, topic = ?, tone = ?,
                media_urls = ?, platform_content = ?, updated_at = ?
            WHERE id = ? AND status != 'publishing'
            "#,
        )
        .bind(&post.content)
        .bind(&post.topic)
        .bind(&post.tone)
        .bind(to_json(&post.media_urls)?)
        .bind(to_json(&post.platform_content)?)
        .bind(post.updated_at)
        .bind(&post.id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() == 1)
    }

    /// Move a post to `scheduled` if its status is still `expected`
    ///
    /// Returns `false` when the post changed status since it was read.
    pub async fn schedule_post(
        &self,
        post_id: &str,
        expected: PostStatus,
        scheduled_at: i64,
        now: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE posts SET status = 'scheduled', scheduled_at = ?, updated_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(scheduled_at)
        .bind(now)
        .bind(post_id)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete a post unless it is publishing; returns whether a row was removed
    pub async fn delete_post(&self, post_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ? AND status != 'publishing'")
            .bind(post_id)
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() == 1)
    }

    /// Atomically move a post into `publishing`
    ///
    /// The status check and write happen in one statement, so of two
    /// concurrent callers exactly one sees `true`.
    pub async fn try_begin_publishing(&self, post_id: &str, now: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE posts SET status = 'publishing', updated_at = ?
            WHERE id = ? AND status != 'publishing'
            "#,
        )
        .bind(now)
        .bind(post_id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() == 1)
    }

    /// Write the final status, published history and error log in one update
    pub async fn finish_publishing(&self, post_id: &str, outcome: &PublishOutcome) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(DbError::SqlxError)?;

        let existing: Option<String> =
            sqlx::query_scalar("SELECT published_platforms FROM posts WHERE id = ?")
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(DbError::SqlxError)?;

        let mut published: Vec<PublishedPlatform> = match existing {
            Some(json) => from_json("published_platforms", &json)?,
            None => return Err(DbError::SqlxError(sqlx::Error::RowNotFound).into()),
        };
        published.extend(outcome.published.iter().cloned());

        let last_retry_at = (outcome.retries > 0).then_some(outcome.finished_at);

        sqlx::query(
            r#"
            UPDATE posts
            SET status = ?, published_platforms = ?, error_log = ?,
                retry_count = retry_count + ?, last_retry_at = COALESCE(?, last_retry_at),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(outcome.status.as_str())
        .bind(to_json(&published)?)
        .bind(&outcome.error_log)
        .bind(outcome.retries)
        .bind(last_retry_at)
        .bind(outcome.finished_at)
        .bind(post_id)
        .execute(&mut *tx)
        .await
        .map_err(DbError::SqlxError)?;

        tx.commit().await.map_err(DbError::SqlxError)?;
        Ok(())
    }

    /// Fallback write after an unexpected failure mid-publish
    pub async fn mark_publish_failed(&self, post_id: &str, message: &str, now: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE posts SET status = 'failed', error_log = ?, updated_at = ? WHERE id = ?
            "#,
        )
        .bind(message)
        .bind(now)
        .bind(post_id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Scheduled posts whose time has come
    pub async fn scheduled_posts_due(&self, now: i64) -> Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "{} WHERE status = 'scheduled' AND scheduled_at IS NOT NULL AND scheduled_at <= ? \
             ORDER BY scheduled_at ASC, id ASC",
            SELECT_POST
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        rows.iter().map(row_to_post).collect()
    }

    // ------------------------------------------------------------------
    // OAuth link state
    // ------------------------------------------------------------------

    pub async fn insert_pending_link(&self, link: &PendingLink) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO oauth_states (token, platform, user_id, workspace_id, code_verifier, created_at, expires_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&link.token)
        .bind(link.platform.as_str())
        .bind(&link.user_id)
        .bind(&link.workspace_id)
        .bind(&link.code_verifier)
        .bind(link.created_at)
        .bind(link.expires_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Fetch and delete a pending link so a state token works only once
    ///
    /// A single `DELETE ... RETURNING` consumes the row, so of two
    /// concurrent callbacks only one gets it back.
    pub async fn take_pending_link(&self, token: &str) -> Result<Option<PendingLink>> {
        let row = sqlx::query(
            r#"
            DELETE FROM oauth_states WHERE token = ?
            RETURNING token, platform, user_id, workspace_id, code_verifier, created_at, expires_at
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        let Some(r) = row else {
            return Ok(None);
        };

        Ok(Some(PendingLink {
            token: column(&r, "token")?,
            platform: parse_platform(&column::<String>(&r, "platform")?)?,
            user_id: column(&r, "user_id")?,
            workspace_id: column(&r, "workspace_id")?,
            code_verifier: column(&r, "code_verifier")?,
            created_at: column(&r, "created_at")?,
            expires_at: column(&r, "expires_at")?,
        }))
    }

    /// Delete link requests that expired before `now`
    pub async fn purge_pending_links(&self, now: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM oauth_states WHERE expires_at < ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected())
    }
}

const SELECT_ACCOUNT: &str = r#"
    SELECT id, user_id, platform, platform_user_id, access_token, refresh_token, token_expiry,
           account_name, account_email, account_image, created_at, updated_at
    FROM social_accounts
"#;

const SELECT_POST: &str = r#"
    SELECT id, user_id, workspace_id, content, topic, tone, status, scheduled_at,
           published_platforms, error_log, media_urls, retry_count, last_retry_at,
           platform_content, created_at, updated_at
    FROM posts
"#;

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name).map_err(|e| DbError::SqlxError(e).into())
}

fn parse_platform(value: &str) -> Result<Platform> {
    value
        .parse()
        .map_err(|_| DbError::Corrupt("platform".to_string(), value.to_string()).into())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| DbError::Corrupt("json".to_string(), e.to_string()).into())
}

fn from_json<T: serde::de::DeserializeOwned>(name: &str, value: &str) -> Result<T> {
    serde_json::from_str(value).map_err(|e| DbError::Corrupt(name.to_string(), e.to_string()).into())
}

fn row_to_account(r: &SqliteRow) -> Result<SocialAccount> {
    Ok(SocialAccount {
        id: column(r, "id")?,
        user_id: column(r, "user_id")?,
        platform: parse_platform(&column::<String>(r, "platform")?)?,
        platform_user_id: column(r, "platform_user_id")?,
        access_token: column(r, "access_token")?,
        refresh_token: column(r, "refresh_token")?,
        token_expiry: column(r, "token_expiry")?,
        account_name: column(r, "account_name")?,
        account_email: column(r, "account_email")?,
        account_image: column(r, "account_image")?,
        created_at: column(r, "created_at")?,
        updated_at: column(r, "updated_at")?,
    })
}

fn row_to_post(r: &SqliteRow) -> Result<Post> {
    let status: String = column(r, "status")?;
    let status: PostStatus = status
        .parse()
        .map_err(|_| DbError::Corrupt("status".to_string(), status.clone()))?;

    let published_platforms: String = column(r, "published_platforms")?;
    let media_urls: String = column(r, "media_urls")?;
    let platform_content: String = column(r, "platform_content")?;

    Ok(Post {
        id: column(r, "id")?,
        user_id: column(r, "user_id")?,
        workspace_id: column(r, "workspace_id")?,
        content: column(r, "content")?,
        topic: column(r, "topic")?,
        tone: column(r, "tone")?,
        status,
        scheduled_at: column(r, "scheduled_at")?,
        published_platforms: from_json("published_platforms", &published_platforms)?,
        error_log: column(r, "error_log")?,
        media_urls: from_json("media_urls", &media_urls)?,
        retry_count: column(r, "retry_count")?,
        last_retry_at: column(r, "last_retry_at")?,
        platform_content: from_json::<PlatformContent>("platform_content", &platform_content)?,
        created_at: column(r, "created_at")?,
        updated_at: column(r, "updated_at")?,
    })
}
