pub mod api;
pub mod board;
pub mod config;
pub mod credentials;
pub mod error;

pub use config::Config;
pub use error::RelayError;

use std::sync::Arc;

/// Shared application state passed to all API handlers.
pub struct AppState {
    pub config: Config,
    pub credentials: credentials::CredentialManager,
    pub board: board::BoardStore,
}

pub type SharedState = Arc<AppState>;
