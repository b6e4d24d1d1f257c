//! File-backed persistence for the OAuth token record.
//!
//! The cache is a single JSON file holding the access/refresh token pair
//! and the access token's expiry. Writes go through a temp file + rename
//! in the same directory, so a crash mid-write can never leave a torn
//! record behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Safety margin subtracted from the expiry when judging freshness, so a
/// token cannot expire mid-flight between check and use.
pub const REFRESH_MARGIN_MS: i64 = 5 * 60 * 1000;

/// The durable access/refresh token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Empty in the bootstrap state, before the first refresh.
    #[serde(default)]
    pub access_token: String,
    pub refresh_token: String,
    /// Epoch milliseconds at which the access token expires.
    #[serde(default)]
    pub expiry: i64,
}

impl TokenRecord {
    /// Bootstrap record from a seed refresh token. `expiry = 0` forces an
    /// immediate refresh on first use.
    pub fn bootstrap(refresh_token: String) -> Self {
        Self {
            access_token: String::new(),
            refresh_token,
            expiry: 0,
        }
    }

    /// A record is stale once `now` is within the refresh margin of its expiry.
    pub fn is_stale(&self, now_ms: i64) -> bool {
        now_ms > self.expiry - REFRESH_MARGIN_MS
    }
}

/// File-backed token cache at a fixed path.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted record, or `None` when no cache file exists yet.
    pub fn load(&self) -> Result<Option<TokenRecord>, RelayError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(RelayError::CacheIo(err)),
        };
        let record: TokenRecord = serde_json::from_str(&raw)?;
        Ok(Some(record))
    }

    /// Persist the record: write a uniquely-named temp file next to the
    /// target, fsync, then rename over it.
    pub fn store(&self, record: &TokenRecord) -> Result<(), RelayError> {
        let serialized = serde_json::to_vec_pretty(record)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file_name = self.path.file_name().ok_or_else(|| {
            RelayError::Configuration(format!(
                "Token cache path {} has no file name",
                self.path.display()
            ))
        })?;
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let temp_name = format!(
            ".{}.tmp-{}-{nonce}",
            file_name.to_string_lossy(),
            std::process::id()
        );
        let temp_path = self.path.with_file_name(temp_name);

        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let write_result = (|| -> std::io::Result<()> {
            let mut temp_file = options.open(&temp_path)?;
            temp_file.write_all(&serialized)?;
            temp_file.sync_all()?;
            Ok(())
        })();

        if let Err(err) = write_result {
            let _ = fs::remove_file(&temp_path);
            return Err(RelayError::CacheIo(err));
        }

        if let Err(err) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(RelayError::CacheIo(err));
        }

        Ok(())
    }
}
