use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use kanban_relay::board::BoardStore;
use kanban_relay::credentials::{CredentialManager, OAuthClient, TokenCache};
use kanban_relay::{api, AppState, Config, SharedState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kanban_relay=info".into()),
        )
        .init();

    // Load config
    let config = Config::from_env()?;
    info!("kanban-relay v{}", env!("CARGO_PKG_VERSION"));
    info!("Listening on {}:{}", config.host, config.port);

    // Initialize components
    let credentials = CredentialManager::new(
        OAuthClient::from_config(&config),
        config.seed_refresh_token.clone(),
        TokenCache::new(config.token_cache_path.clone()),
    );
    let board = BoardStore::from_config(&config);
    info!("Board document at {}{}", config.drive_base_url, config.drive_file_path);

    // Build shared state
    let state: SharedState = Arc::new(AppState {
        config: config.clone(),
        credentials,
        board,
    });

    // Build router
    let app = api::router(state);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server ready ✓");
    axum::serve(listener, app).await?;

    Ok(())
}
