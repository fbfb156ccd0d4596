//! Account linking endpoints (/auth/link/*, /auth/callback/*)

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use libstudiocast::service::linking::CallbackParams;
use libstudiocast::{Platform, StudioError};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/link/{platform}", get(link_account))
        .route("/auth/callback/{provider}", get(link_callback))
}

/// 302 to `location`
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkQuery {
    user_id: Option<String>,
    workspace_id: Option<String>,
}

/// GET /auth/link/{platform} - Redirect to the platform consent screen
async fn link_account(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
    query: Result<Query<LinkQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let platform: Platform = platform.parse()?;
    let Query(query) = query?;

    let (Some(user_id), Some(workspace_id)) = (query.user_id, query.workspace_id) else {
        return Err(ApiError::bad_request("userId and workspaceId are required"));
    };

    let url = state
        .service
        .linking()
        .begin_link(platform, &user_id, &workspace_id)
        .await?;

    Ok(found(&url))
}

#[derive(Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// GET /auth/callback/{platform}-link - Finish linking, then redirect to the frontend
async fn link_callback(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    query: Result<Query<CallbackQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let platform: Platform = provider
        .strip_suffix("-link")
        .ok_or_else(|| StudioError::NotFound(format!("Unknown callback: {}", provider)))?
        .parse()?;
    let Query(query) = query?;

    let params = CallbackParams {
        code: query.code,
        state: query.state,
        error: query.error,
        error_description: query.error_description,
    };

    let linking = state.service.linking();
    let location = match linking.complete_link(platform, &params).await {
        Ok(linked) => linking.success_redirect(platform, &linked),
        Err(failure) => linking.failure_redirect(&failure),
    };

    Ok(found(&location))
}
