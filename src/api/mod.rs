//! HTTP surface exposed to the kanban frontend.
//!
//! - /api/board: read/write the persisted board document
//! - /api/logs:  best-effort sink for client-side diagnostics
//! - /health:    liveness + credential-availability probe

pub mod routes;

use crate::SharedState;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::api_router(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
