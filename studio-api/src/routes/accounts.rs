//! Linked account management (/accounts)

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use libstudiocast::service::accounts::{AccountQuery, DisconnectOutcome, DisconnectRequest};
use libstudiocast::{AccountSummary, Platform};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/accounts", get(list_accounts).delete(disconnect_account))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    workspace_id: Option<String>,
    user_id: Option<String>,
    #[serde(default)]
    all: bool,
    platform: Option<String>,
}

#[derive(Serialize)]
struct AccountsResponse {
    accounts: Vec<AccountSummary>,
}

/// GET /accounts - List accounts for a workspace, or all of a user's accounts
async fn list_accounts(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<AccountsResponse>> {
    let Query(query) = query?;

    let platform = query
        .platform
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(str::parse::<Platform>)
        .transpose()?;

    let accounts = state
        .service
        .accounts()
        .list(&AccountQuery {
            workspace_id: query.workspace_id,
            user_id: query.user_id,
            all: query.all,
            platform,
        })
        .await?;

    Ok(Json(AccountsResponse { accounts }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DisconnectQuery {
    account_id: Option<String>,
    user_id: Option<String>,
    workspace_id: Option<String>,
    #[serde(default)]
    delete_completely: bool,
}

#[derive(Serialize)]
struct DisconnectResponse {
    success: bool,
    message: String,
    deleted: bool,
}

/// DELETE /accounts - Unlink an account from a workspace or delete it
async fn disconnect_account(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DisconnectQuery>, QueryRejection>,
) -> ApiResult<Json<DisconnectResponse>> {
    let Query(query) = query?;

    let (Some(account_id), Some(user_id)) = (query.account_id, query.user_id) else {
        return Err(ApiError::bad_request("accountId and userId are required"));
    };

    let outcome = state
        .service
        .accounts()
        .disconnect(&DisconnectRequest {
            account_id,
            user_id,
            workspace_id: query.workspace_id,
            delete_completely: query.delete_completely,
        })
        .await?;

    let (message, deleted) = match outcome {
        DisconnectOutcome::Unlinked => ("Account unlinked from workspace", false),
        DisconnectOutcome::Deleted => ("Account deleted", true),
    };

    Ok(Json(DisconnectResponse {
        success: true,
        message: message.to_string(),
        deleted,
    }))
}
