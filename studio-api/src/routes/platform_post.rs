//! Direct single-platform posting (/{platform}/post)

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::post,
    Json, Router,
};
use libstudiocast::{Platform, PublishRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/{platform}/post", post(platform_post))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlatformPostBody {
    #[serde(default)]
    content: String,
    user_id: Option<String>,
    account_id: Option<String>,
    image_url: Option<String>,
    link: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlatformPostResponse {
    success: bool,
    message: String,
    post_id: String,
    account_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

/// POST /{platform}/post - Publish ad-hoc content through one account
async fn platform_post(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
    body: Result<Json<PlatformPostBody>, JsonRejection>,
) -> ApiResult<Json<PlatformPostResponse>> {
    let platform: Platform = platform.parse()?;
    let Json(body) = body?;

    let user_id = body
        .user_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("userId is required"))?;

    // Only Instagram takes an image and only Facebook takes a link
    let request = PublishRequest {
        content: body.content,
        image_url: body.image_url.filter(|_| platform == Platform::Instagram),
        link: body.link.filter(|_| platform == Platform::Facebook),
    };

    let delivery = state
        .service
        .poster()
        .publish(platform, &user_id, body.account_id.as_deref(), &request)
        .await?;

    Ok(Json(PlatformPostResponse {
        success: true,
        message: format!("Published to {}", platform.display_name()),
        post_id: delivery.post_id,
        account_name: delivery.account_name,
        url: delivery.url,
    }))
}
