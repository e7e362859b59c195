//! Client configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use barryland_engine::error::Result as StorageResult;

use crate::service::DEFAULT_RETRY_DELAY;
use crate::storage::{ClientStorage, FileStorage, MemoryStorage};

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the API
    pub api_url: String,
    /// Directory for persisted values; memory only when unset
    pub storage_dir: Option<PathBuf>,
    /// Timeout of each HTTP request
    pub http_timeout: Duration,
    /// Wait before a passive sync of new local favorites
    pub retry_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".to_string(),
            storage_dir: None,
            http_timeout: Duration::from_secs(10),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration from a variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_url = var("BARRYLAND_API_URL").unwrap_or(defaults.api_url);
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::InvalidApiUrl(api_url));
        }

        let storage_dir = var("BARRYLAND_STORAGE_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        let http_timeout = seconds(var("BARRYLAND_HTTP_TIMEOUT_SECS"))
            .map_err(|_| ConfigError::InvalidTimeout)?
            .unwrap_or(defaults.http_timeout);

        let retry_delay = seconds(var("BARRYLAND_RETRY_DELAY_SECS"))
            .map_err(|_| ConfigError::InvalidRetryDelay)?
            .unwrap_or(defaults.retry_delay);

        Ok(Self {
            api_url,
            storage_dir,
            http_timeout,
            retry_delay,
        })
    }

    /// Open the configured storage: files under `storage_dir`, memory
    /// otherwise.
    pub fn open_storage(&self) -> StorageResult<ClientStorage> {
        match &self.storage_dir {
            Some(dir) => Ok(ClientStorage::File(FileStorage::open(dir)?)),
            None => Ok(ClientStorage::Memory(MemoryStorage::new())),
        }
    }
}

fn seconds(value: Option<String>) -> Result<Option<Duration>, std::num::ParseIntError> {
    value
        .map(|v| v.trim().parse().map(Duration::from_secs))
        .transpose()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("BARRYLAND_API_URL must be an http(s) URL, got {0:?}")]
    InvalidApiUrl(String),

    #[error("Invalid BARRYLAND_HTTP_TIMEOUT_SECS value")]
    InvalidTimeout,

    #[error("Invalid BARRYLAND_RETRY_DELAY_SECS value")]
    InvalidRetryDelay,
}
