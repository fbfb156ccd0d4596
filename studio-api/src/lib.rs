//! studio-api - HTTP surface for Studiocast
//!
//! Exposes publishing, single-platform posting, OAuth account linking and
//! account management over JSON. All business logic lives in
//! `libstudiocast`; handlers only translate between HTTP and the service
//! layer.

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use libstudiocast::StudioService;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler
pub struct AppState {
    pub service: StudioService,
}

impl AppState {
    pub fn new(service: StudioService) -> Self {
        Self { service }
    }
}

/// Build the full application router
pub fn router(state: Arc<AppState>) -> Router {
    routes::build_routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
