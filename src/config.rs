use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // ── Server ──────────────────────────────────────────────────────────
    pub host: String,
    pub port: u16,

    // ── Identity provider (OAuth2 refresh grant) ────────────────────────
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Azure AD tenant; `common` serves personal + work accounts.
    pub tenant: String,
    /// Seed refresh token used to bootstrap when no cache file exists yet.
    pub seed_refresh_token: Option<String>,
    /// Full token endpoint URL; overrides the tenant-derived default.
    pub token_endpoint_override: Option<String>,

    // ── Token cache ─────────────────────────────────────────────────────
    pub token_cache_path: PathBuf,

    // ── Drive ───────────────────────────────────────────────────────────
    pub drive_base_url: String,
    /// Logical path of the board document inside the drive.
    pub drive_file_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".into())
                .parse()
                .context("Invalid PORT")?,

            client_id: std::env::var("CLIENT_ID").ok(),
            client_secret: std::env::var("CLIENT_SECRET").ok(),
            tenant: std::env::var("TENANT").unwrap_or_else(|_| "common".into()),
            seed_refresh_token: std::env::var("SEED_REFRESH_TOKEN").ok(),
            token_endpoint_override: std::env::var("TOKEN_ENDPOINT").ok(),

            token_cache_path: std::env::var("TOKEN_CACHE_PATH")
                .unwrap_or_else(|_| "./token.json".into())
                .into(),

            drive_base_url: std::env::var("DRIVE_BASE_URL")
                .unwrap_or_else(|_| "https://graph.microsoft.com/v1.0".into()),
            drive_file_path: std::env::var("DRIVE_FILE_PATH")
                .unwrap_or_else(|_| "/drive/root:/kanban/data.json".into()),
        })
    }

    /// Token endpoint for the configured tenant, unless explicitly overridden.
    pub fn token_endpoint(&self) -> String {
        self.token_endpoint_override.clone().unwrap_or_else(|| {
            format!(
                "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
                self.tenant
            )
        })
    }
}
