//! Multi-platform publish endpoint (/posts/{id}/publish)

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::post,
    Json, Router,
};
use libstudiocast::service::publishing::{PublishPostRequest, PublishResponse};
use libstudiocast::Platform;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/posts/{id}/publish", post(publish_post))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishBody {
    #[serde(default)]
    platforms: Vec<String>,
    user_id: Option<String>,
    workspace_id: Option<String>,
}

/// POST /posts/{id}/publish - Publish a stored post to several platforms
///
/// Responds 200 whenever every platform was attempted; `success` is false
/// when none of them accepted the post.
async fn publish_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
    body: Result<Json<PublishBody>, JsonRejection>,
) -> ApiResult<Json<PublishResponse>> {
    let Json(body) = body?;

    let user_id = body
        .user_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("userId is required"))?;

    let platforms = body
        .platforms
        .iter()
        .map(|p| p.parse::<Platform>())
        .collect::<Result<Vec<_>, _>>()?;

    let request = PublishPostRequest {
        platforms,
        user_id,
        workspace_id: body.workspace_id.filter(|id| !id.is_empty()),
    };

    let response = state.service.publishing().publish(&post_id, &request).await?;
    Ok(Json(response))
}
