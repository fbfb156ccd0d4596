//! Publish orchestration
//!
//! Fans one post out to the requested platforms, one after another in
//! request order, and folds the per-platform results into the post's final
//! status. A failure on one platform never stops the others; only storage
//! failures abort the run.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::db::{Database, PublishOutcome};
use crate::error::{Result, StudioError};
use crate::platforms::PublishRequest;
use crate::poster::PlatformPoster;
use crate::types::{Platform, PlatformPublishResult, Post, PostStatus, PublishedPlatform};

/// Who asks to publish, and where
#[derive(Debug, Clone)]
pub struct PublishPostRequest {
    pub platforms: Vec<Platform>,
    pub user_id: String,
    /// When given, the post must belong to this workspace
    pub workspace_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    /// True when at least one platform accepted the post
    pub success: bool,
    pub message: String,
    pub results: Vec<PlatformPublishResult>,
    pub published: usize,
    pub failed: usize,
    pub total: usize,
}

#[derive(Clone)]
pub struct PublishOrchestrator {
    db: Database,
    poster: PlatformPoster,
}

impl PublishOrchestrator {
    pub fn new(db: Database, poster: PlatformPoster) -> Self {
        Self { db, poster }
    }

    /// Publish `post_id` to every requested platform
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if no platforms are requested
    /// - `NotFound` if the post does not exist
    /// - `Forbidden` if the requester does not own the post or names another workspace
    /// - `Conflict` if the post is already publishing
    /// - `Database` if the final state cannot be stored (the post is then
    ///   marked failed on a best-effort basis)
    pub async fn publish(&self, post_id: &str, request: &PublishPostRequest) -> Result<PublishResponse> {
        let platforms = dedupe(&request.platforms);
        if platforms.is_empty() {
            return Err(StudioError::InvalidInput(
                "At least one platform is required".to_string(),
            ));
        }

        let post = self
            .db
            .get_post(post_id)
            .await?
            .ok_or_else(|| StudioError::NotFound(format!("Post not found: {}", post_id)))?;

        if post.user_id != request.user_id {
            return Err(StudioError::Forbidden(
                "You do not have permission to publish this post".to_string(),
            ));
        }

        if let Some(workspace_id) = request.workspace_id.as_deref() {
            if workspace_id != post.workspace_id {
                return Err(StudioError::Forbidden(
                    "Post does not belong to this workspace".to_string(),
                ));
            }
        }

        let now = chrono::Utc::now().timestamp();
        if !self.db.try_begin_publishing(post_id, now).await? {
            return Err(StudioError::Conflict(
                "Post is already being published".to_string(),
            ));
        }

        info!(post_id = %post_id, platforms = ?platforms, "Publishing post");

        match self.fan_out(&post, &request.user_id, &platforms).await {
            Ok(response) => Ok(response),
            Err(e) => {
                error!(post_id = %post_id, "Publishing aborted: {}", e);
                let failed_at = chrono::Utc::now().timestamp();
                if let Err(write_err) = self
                    .db
                    .mark_publish_failed(post_id, &e.to_string(), failed_at)
                    .await
                {
                    error!(post_id = %post_id, "Could not record publish failure: {}", write_err);
                }
                Err(e)
            }
        }
    }

    async fn fan_out(
        &self,
        post: &Post,
        user_id: &str,
        platforms: &[Platform],
    ) -> Result<PublishResponse> {
        let mut results = Vec::with_capacity(platforms.len());
        let mut published = Vec::new();
        let mut retries: i64 = 0;

        for &platform in platforms {
            let request = PublishRequest {
                content: post.content_for(platform).to_string(),
                image_url: post.primary_image().map(str::to_string),
                link: None,
            };

            let report = self.poster.deliver(platform, user_id, None, &request).await;
            retries += i64::from(report.attempts.saturating_sub(1));

            match report.result {
                Ok(delivery) => {
                    info!(post_id = %post.id, "Published to {}: {}", platform, delivery.post_id);
                    published.push(PublishedPlatform {
                        platform,
                        post_id: delivery.post_id.clone(),
                        published_at: chrono::Utc::now().timestamp(),
                        url: delivery.url.clone(),
                    });
                    results.push(PlatformPublishResult::succeeded(
                        platform,
                        delivery.post_id,
                        delivery.url,
                    ));
                }
                Err(e) => {
                    let message = e.public_message();
                    warn!(post_id = %post.id, "Publishing to {} failed: {}", platform, message);
                    results.push(PlatformPublishResult::failed(platform, message));
                }
            }
        }

        let total = results.len();
        let succeeded = published.len();
        let failed = total - succeeded;

        let status = if succeeded == 0 {
            PostStatus::Failed
        } else {
            PostStatus::Published
        };

        let error_log = results
            .iter()
            .filter_map(|r| r.error.as_ref().map(|e| format!("{}: {}", r.platform, e)))
            .collect::<Vec<_>>();

        let outcome = PublishOutcome {
            status,
            published,
            error_log: (!error_log.is_empty()).then(|| error_log.join("; ")),
            retries,
            finished_at: chrono::Utc::now().timestamp(),
        };
        self.db.finish_publishing(&post.id, &outcome).await?;

        let message = if failed == 0 {
            format!("Published to {} platform(s)", succeeded)
        } else if succeeded > 0 {
            format!("Published to {} of {} platforms", succeeded, total)
        } else {
            "Failed to publish to any platform".to_string()
        };

        info!(
            post_id = %post.id,
            status = status.as_str(),
            "{}",
            message
        );

        Ok(PublishResponse {
            success: succeeded > 0,
            message,
            results,
            published: succeeded,
            failed,
            total,
        })
    }
}

/// Keep the first occurrence of each platform, preserving order
fn dedupe(platforms: &[Platform]) -> Vec<Platform> {
    let mut seen = Vec::with_capacity(platforms.len());
    for &platform in platforms {
        if !seen.contains(&platform) {
            seen.push(platform);
        }
    }
    seen
}
