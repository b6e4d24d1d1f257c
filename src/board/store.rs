//! Conditional GET/PUT calls against the drive's versioned-blob endpoints,
//! keyed by a fixed logical path. The drive separates item metadata (which
//! carries the version tag) from content; one logical read composes both.

use reqwest::header::IF_MATCH;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::config::Config;
use crate::credentials::CredentialManager;
use crate::error::RelayError;

/// One logical read of the board: the document plus its revision tag.
#[derive(Debug, Clone, Serialize)]
pub struct BoardSnapshot {
    pub etag: String,
    pub data: Value,
}

/// Gateway to the remote drive item holding the board document.
pub struct BoardStore {
    base_url: String,
    file_path: String,
    http: reqwest::Client,
}

impl BoardStore {
    pub fn new(base_url: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            file_path: file_path.into(),
            http: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.drive_base_url, &config.drive_file_path)
    }

    fn item_url(&self) -> String {
        format!("{}{}", self.base_url, self.file_path)
    }

    fn content_url(&self) -> String {
        format!("{}{}:/content", self.base_url, self.file_path)
    }

    /// Fetch the current version tag, then the document content.
    pub async fn read_board(
        &self,
        credentials: &CredentialManager,
    ) -> Result<BoardSnapshot, RelayError> {
        let token = credentials.access_token().await?;

        let meta_resp = self
            .http
            .get(self.item_url())
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| RelayError::Upstream(format!("Metadata fetch failed: {e}")))?;
        if !meta_resp.status().is_success() {
            return Err(upstream_failure("Metadata fetch", meta_resp).await);
        }

        let item: Value = meta_resp
            .json()
            .await
            .map_err(|e| RelayError::Upstream(format!("Failed to parse item metadata: {e}")))?;
        let etag = extract_etag(&item)
            .ok_or_else(|| RelayError::Upstream("Drive item metadata carried no ETag".into()))?;

        let content_resp = self
            .http
            .get(self.content_url())
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| RelayError::Upstream(format!("Content fetch failed: {e}")))?;
        if !content_resp.status().is_success() {
            return Err(upstream_failure("Content fetch", content_resp).await);
        }

        let data: Value = content_resp
            .json()
            .await
            .map_err(|e| RelayError::Upstream(format!("Board document is not valid JSON: {e}")))?;

        Ok(BoardSnapshot { etag, data })
    }

    /// Replace the document. With an expected tag the write only succeeds
    /// while the drive still holds that revision; without one it is
    /// unconditional (last writer wins). Returns the new version tag.
    pub async fn write_board(
        &self,
        credentials: &CredentialManager,
        document: &Value,
        expected_etag: Option<&str>,
    ) -> Result<String, RelayError> {
        let token = credentials.access_token().await?;

        let mut request = self
            .http
            .put(self.content_url())
            .bearer_auth(&token)
            .json(document);
        if let Some(etag) = expected_etag {
            request = request.header(IF_MATCH, etag);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| RelayError::Upstream(format!("Content replace failed: {e}")))?;

        let status = resp.status();
        if status == StatusCode::CONFLICT || status == StatusCode::PRECONDITION_FAILED {
            warn!("Conditional write rejected, drive holds a newer revision");
            return Err(RelayError::Conflict("version token mismatch".into()));
        }
        if !status.is_success() {
            return Err(upstream_failure("Content replace", resp).await);
        }

        let item: Value = resp.json().await.map_err(|e| {
            RelayError::Upstream(format!("Failed to parse updated item metadata: {e}"))
        })?;
        extract_etag(&item)
            .ok_or_else(|| RelayError::Upstream("Updated drive item carried no ETag".into()))
    }
}

/// The drive reports the version tag both as an `eTag` property and an
/// `@odata.etag` annotation; accept either.
fn extract_etag(item: &Value) -> Option<String> {
    item.get("eTag")
        .or_else(|| item.get("@odata.etag"))
        .and_then(Value::as_str)
        .map(str::to_owned)
}

async fn upstream_failure(what: &str, resp: reqwest::Response) -> RelayError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    warn!("{what} returned {status}: {body}");
    RelayError::Upstream(format!("{what} returned {status}: {body}"))
}
