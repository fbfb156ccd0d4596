pub mod accounts;
pub mod health;
pub mod oauth;
pub mod platform_post;
pub mod publish;

use axum::Router;
use std::sync::Arc;

use crate::AppState;

/// Build all routes for the API
pub fn build_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(accounts::routes())
        .merge(health::routes())
        .merge(oauth::routes())
        .merge(platform_post::routes())
        .merge(publish::routes())
}
