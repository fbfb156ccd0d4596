//! Draft service for managing posts before they are published
//!
//! CRUD and scheduling for posts. Publishing itself lives in
//! [`PublishOrchestrator`](super::publishing::PublishOrchestrator); a
//! scheduled post is only picked up by an external dispatcher through
//! [`DraftService::due_scheduled`].

use chrono::{DateTime, Utc};

use crate::db::Database;
use crate::error::{Result, StudioError};
use crate::scheduling::parse_schedule;
use crate::types::{PlatformContent, Post, PostStatus, MAX_POST_CONTENT};

/// Fields for a new post
#[derive(Debug, Clone, Default)]
pub struct NewDraft {
    pub user_id: String,
    pub workspace_id: String,
    pub content: String,
    pub topic: Option<String>,
    pub tone: Option<String>,
    pub media_urls: Vec<String>,
    pub platform_content: PlatformContent,
}

/// Editable fields; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct DraftUpdate {
    pub content: Option<String>,
    pub topic: Option<String>,
    pub tone: Option<String>,
    pub media_urls: Option<Vec<String>>,
    pub platform_content: Option<PlatformContent>,
}

#[derive(Clone)]
pub struct DraftService {
    db: Database,
}

impl DraftService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a new draft post in an existing workspace
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the content is empty or too long
    /// - `NotFound` if the workspace does not exist
    pub async fn create(&self, draft: NewDraft) -> Result<Post> {
        validate_content(&draft.content)?;

        if self.db.get_workspace(&draft.workspace_id).await?.is_none() {
            return Err(StudioError::NotFound(format!(
                "Workspace not found: {}",
                draft.workspace_id
            )));
        }

        let mut post = Post::new(&draft.user_id, &draft.workspace_id, draft.content);
        post.topic = draft.topic;
        post.tone = draft.tone;
        post.media_urls = draft.media_urls;
        post.platform_content = draft.platform_content;

        self.db.create_post(&post).await?;
        tracing::debug!(post_id = %post.id, "Created draft");
        Ok(post)
    }

    pub async fn get(&self, id: &str) -> Result<Post> {
        self.db
            .get_post(id)
            .await?
            .ok_or_else(|| StudioError::NotFound(format!("Post not found: {}", id)))
    }

    /// Posts in a workspace, newest first
    pub async fn list_for_workspace(&self, workspace_id: &str) -> Result<Vec<Post>> {
        self.db.list_posts_for_workspace(workspace_id).await
    }

    /// Edit a post owned by `user_id`
    ///
    /// # Errors
    ///
    /// Returns `Conflict` while the post is publishing.
    pub async fn update(&self, id: &str, user_id: &str, update: DraftUpdate) -> Result<Post> {
        let mut post = self.owned_post(id, user_id).await?;

        if let Some(content) = update.content {
            validate_content(&content)?;
            post.content = content;
        }
        if let Some(topic) = update.topic {
            post.topic = Some(topic);
        }
        if let Some(tone) = update.tone {
            post.tone = Some(tone);
        }
        if let Some(media_urls) = update.media_urls {
            post.media_urls = media_urls;
        }
        if let Some(platform_content) = update.platform_content {
            post.platform_content = platform_content;
        }

        self.save(post).await
    }

    /// Schedule a post for later publishing
    ///
    /// `when` is an offset ("2h", "in 30m") or an absolute timestamp; see
    /// [`parse_schedule`]. Drafts and failed posts can be scheduled, and a
    /// scheduled post can be moved to a new time.
    pub async fn schedule(
        &self,
        id: &str,
        user_id: &str,
        when: &str,
        now: DateTime<Utc>,
    ) -> Result<Post> {
        let mut post = self.owned_post(id, user_id).await?;

        match post.status {
            PostStatus::Draft | PostStatus::Failed | PostStatus::Scheduled => {}
            other => {
                return Err(StudioError::Conflict(format!(
                    "A {} post cannot be scheduled",
                    other.as_str()
                )))
            }
        }

        let at = parse_schedule(when, now)?;
        let updated_at = Utc::now().timestamp();
        // Only schedule from the status read above; a publish may have finished since
        if !self
            .db
            .schedule_post(&post.id, post.status, at.timestamp(), updated_at)
            .await?
        {
            return Err(StudioError::Conflict(
                "Post changed status and cannot be scheduled".to_string(),
            ));
        }
        post.status = PostStatus::Scheduled;
        post.scheduled_at = Some(at.timestamp());
        post.updated_at = updated_at;

        tracing::info!(post_id = %post.id, "Scheduled post for {}", at.to_rfc3339());
        Ok(post)
    }

    /// Delete a post owned by `user_id`
    pub async fn delete(&self, id: &str, user_id: &str) -> Result<()> {
        self.owned_post(id, user_id).await?;

        if !self.db.delete_post(id).await? {
            return Err(StudioError::Conflict(
                "Post is being published and cannot be deleted".to_string(),
            ));
        }
        Ok(())
    }

    /// Scheduled posts whose time has come
    pub async fn due_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Post>> {
        self.db.scheduled_posts_due(now.timestamp()).await
    }

    async fn owned_post(&self, id: &str, user_id: &str) -> Result<Post> {
        let post = self.get(id).await?;
        if post.user_id != user_id {
            return Err(StudioError::Forbidden(
                "You do not have permission to modify this post".to_string(),
            ));
        }
        if post.status == PostStatus::Publishing {
            return Err(StudioError::Conflict(
                "Post is being published and cannot be modified".to_string(),
            ));
        }
        Ok(post)
    }

    async fn save(&self, mut post: Post) -> Result<Post> {
        post.updated_at = Utc::now().timestamp();
        // The publish lock may have been taken since the post was read
        if !self.db.update_post_fields(&post).await? {
            return Err(StudioError::Conflict(
                "Post is being published and cannot be modified".to_string(),
            ));
        }
        Ok(post)
    }
}

fn validate_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(StudioError::InvalidInput(
            "Content cannot be empty".to_string(),
        ));
    }

    let length = content.chars().count();
    if length > MAX_POST_CONTENT {
        return Err(StudioError::InvalidInput(format!(
            "Content is {} characters, the maximum is {}",
            length, MAX_POST_CONTENT
        )));
    }

    Ok(())
}
