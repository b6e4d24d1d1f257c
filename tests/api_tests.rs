use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kanban_relay::api;
use kanban_relay::board::BoardStore;
use kanban_relay::credentials::{CredentialManager, OAuthClient, TokenCache, TokenRecord};
use kanban_relay::{AppState, Config, SharedState};

const FILE_PATH: &str = "/drive/root:/kanban/data.json";

fn test_config(server: &MockServer, dir: &TempDir) -> Config {
    Config {
        host: "127.0.0.1".into(),
        port: 0,
        client_id: Some("client-1".into()),
        client_secret: Some("secret-1".into()),
        tenant: "common".into(),
        seed_refresh_token: Some("seed-refresh".into()),
        token_endpoint_override: Some(format!("{}/oauth2/token", server.uri())),
        token_cache_path: dir.path().join("token.json"),
        drive_base_url: server.uri(),
        drive_file_path: FILE_PATH.into(),
    }
}

/// State with a pre-seeded fresh token, so handlers never hit the identity
/// provider during these tests.
fn test_state(server: &MockServer, dir: &TempDir) -> SharedState {
    let config = test_config(server, dir);
    let cache = TokenCache::new(config.token_cache_path.clone());
    cache
        .store(&TokenRecord {
            access_token: "drive-access".into(),
            refresh_token: "drive-refresh".into(),
            expiry: Utc::now().timestamp_millis() + 60 * 60 * 1000,
        })
        .unwrap();
    let credentials = CredentialManager::new(
        OAuthClient::from_config(&config),
        config.seed_refresh_token.clone(),
        cache,
    );
    let board = BoardStore::from_config(&config);
    Arc::new(AppState {
        config,
        credentials,
        board,
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_credential_availability() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let app = api::router(test_state(&server, &dir));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["env"]["hasClientId"], true);
    assert_eq!(body["env"]["hasClientSecret"], true);
    assert_eq!(body["env"]["hasRefreshToken"], true);
    assert!(body["time"].is_string());
}

#[tokio::test]
async fn get_board_returns_etag_and_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "eTag": "\"rev-1\"" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{FILE_PATH}:/content")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "columns": [] })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let app = api::router(test_state(&server, &dir));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/board")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body, json!({ "etag": "\"rev-1\"", "data": { "columns": [] } }));
}

#[tokio::test]
async fn get_board_when_drive_item_is_missing_returns_500() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": "itemNotFound" })),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let app = api::router(test_state(&server, &dir));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/board")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn put_board_returns_the_new_etag() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("{FILE_PATH}:/content")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "eTag": "\"rev-2\"" })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let app = api::router(test_state(&server, &dir));

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/board")
                .header("content-type", "application/json")
                .header("if-match", "\"rev-1\"")
                .body(Body::from(json!({ "columns": [] }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body, json!({ "etag": "\"rev-2\"" }));
}

#[tokio::test]
async fn put_board_with_stale_etag_returns_409_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("{FILE_PATH}:/content")))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let app = api::router(test_state(&server, &dir));

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/board")
                .header("content-type", "application/json")
                .header("if-match", "\"rev-0\"")
                .body(Body::from(json!({ "columns": [] }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Conflict detected");
    assert!(body["hint"].is_string());
}

#[tokio::test]
async fn client_logs_sink_always_responds_ok() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let app = api::router(test_state(&server, &dir));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/logs")
                .body(Body::from("panic at ui/board.tsx:42 {{{"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}
