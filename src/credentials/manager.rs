//! Produces a currently-valid access token on demand, refreshing against
//! the identity provider and persisting the updated record transparently.

use chrono::Utc;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::RelayError;

use super::cache::{TokenCache, TokenRecord};

/// OAuth client settings for the refresh grant.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_endpoint: String,
}

impl OAuthClient {
    pub fn from_config(config: &Config) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token_endpoint: config.token_endpoint(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Providers may omit rotation; the prior refresh token is kept then.
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

/// Owns the token record and its persisted copy. The record sits behind a
/// mutex held across the refresh await, so concurrent stale observers
/// coalesce behind a single in-flight refresh and all waiters see the
/// refreshed record.
pub struct CredentialManager {
    oauth: OAuthClient,
    seed_refresh_token: Option<String>,
    cache: TokenCache,
    http: reqwest::Client,
    record: Mutex<Option<TokenRecord>>,
}

impl CredentialManager {
    pub fn new(oauth: OAuthClient, seed_refresh_token: Option<String>, cache: TokenCache) -> Self {
        Self {
            oauth,
            seed_refresh_token,
            cache,
            http: reqwest::Client::new(),
            record: Mutex::new(None),
        }
    }

    /// Return a currently-valid access token, refreshing and persisting
    /// first if the cached one is stale.
    pub async fn access_token(&self) -> Result<String, RelayError> {
        let mut slot = self.record.lock().await;

        if slot.is_none() {
            *slot = Some(self.bootstrap()?);
        }
        let Some(record) = slot.as_mut() else {
            return Err(RelayError::Configuration(
                "credential state unavailable".into(),
            ));
        };

        let now_ms = Utc::now().timestamp_millis();
        if !record.is_stale(now_ms) {
            return Ok(record.access_token.clone());
        }

        info!("Access token stale, refreshing");
        let refreshed = self.refresh(record).await?;
        // Persist before handing the token to anyone, so a crash right after
        // the refresh cannot produce a token that is lost on restart.
        self.cache.store(&refreshed)?;
        *record = refreshed;

        info!("Token refreshed, expiry {}", record.expiry);
        Ok(record.access_token.clone())
    }

    /// Ordered bootstrap sources: persisted cache file, then the configured
    /// seed refresh token.
    fn bootstrap(&self) -> Result<TokenRecord, RelayError> {
        if let Some(record) = self.cache.load()? {
            info!("Loaded token record from {}", self.cache.path().display());
            return Ok(record);
        }
        if let Some(seed) = &self.seed_refresh_token {
            info!("No token cache found, bootstrapping from seed refresh token");
            return Ok(TokenRecord::bootstrap(seed.clone()));
        }
        Err(RelayError::Configuration(
            "no persisted token record and no seed refresh token configured".into(),
        ))
    }

    async fn refresh(&self, current: &TokenRecord) -> Result<TokenRecord, RelayError> {
        let client_id = self
            .oauth
            .client_id
            .as_deref()
            .ok_or_else(|| RelayError::Configuration("CLIENT_ID is not configured".into()))?;
        let client_secret = self
            .oauth
            .client_secret
            .as_deref()
            .ok_or_else(|| RelayError::Configuration("CLIENT_SECRET is not configured".into()))?;

        let resp = self
            .http
            .post(&self.oauth.token_endpoint)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", current.refresh_token.as_str()),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .send()
            .await
            .map_err(|e| RelayError::RefreshFailed(format!("Refresh request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!("Identity provider rejected refresh ({status}): {body}");
            return Err(RelayError::RefreshFailed(format!(
                "Identity provider rejected refresh ({status}): {body}"
            )));
        }

        let token_resp: TokenResponse = resp.json().await.map_err(|e| {
            RelayError::RefreshFailed(format!("Failed to parse refresh response: {e}"))
        })?;

        let now_ms = Utc::now().timestamp_millis();
        Ok(TokenRecord {
            access_token: token_resp.access_token,
            refresh_token: token_resp
                .refresh_token
                .unwrap_or_else(|| current.refresh_token.clone()),
            expiry: now_ms + token_resp.expires_in.unwrap_or(3600) * 1000,
        })
    }
}
