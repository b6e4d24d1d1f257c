//! Route handlers. All handlers receive `SharedState` via axum state
//! extraction; board failures map to HTTP through `RelayError`.

use axum::{
    extract::State,
    http::{header::IF_MATCH, HeaderMap},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use crate::board::BoardSnapshot;
use crate::error::RelayError;
use crate::SharedState;

pub fn api_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/board", get(board_read))
        .route("/api/board", put(board_write))
        .route("/api/logs", post(client_logs))
        .route("/health", get(health))
        .with_state(state)
}

/// GET /health: liveness plus credential-availability probe.
async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    let config = &state.config;
    Json(json!({
        "status": "ok",
        "service": "kanban-relay",
        "version": env!("CARGO_PKG_VERSION"),
        "time": Utc::now().to_rfc3339(),
        "env": {
            "hasClientId": config.client_id.is_some(),
            "hasClientSecret": config.client_secret.is_some(),
            "hasRefreshToken": config.seed_refresh_token.is_some(),
        },
    }))
}

/// GET /api/board: current document plus its version tag.
async fn board_read(State(state): State<SharedState>) -> Result<Json<BoardSnapshot>, RelayError> {
    let snapshot = state.board.read_board(&state.credentials).await?;
    Ok(Json(snapshot))
}

/// PUT /api/board: the body is the board document itself; an optional
/// `If-Match` header carries the expected version tag. Without it the
/// write is unconditional.
async fn board_write(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(document): Json<Value>,
) -> Result<Json<Value>, RelayError> {
    let expected_etag = headers
        .get(IF_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let etag = state
        .board
        .write_board(&state.credentials, &document, expected_etag.as_deref())
        .await?;

    Ok(Json(json!({ "etag": etag })))
}

/// POST /api/logs: accepts arbitrary diagnostic payloads, never fails.
async fn client_logs(body: String) -> impl IntoResponse {
    info!(target: "client", "{body}");
    Json(json!({ "status": "ok" }))
}
