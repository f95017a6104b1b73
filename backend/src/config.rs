//! Runtime configuration read from the environment.
//!
//! | Variable                     | Default  |
//! |------------------------------|----------|
//! | `MAINTDESK_PORT`             | 3000     |
//! | `MAINTDESK_STORE_URL`        | unset    |
//! | `MAINTDESK_STORE_KEY`        | unset    |
//! | `MAINTDESK_MAX_UPLOAD_BYTES` | 50 MiB   |
//!
//! The binary loads `.env` with dotenvy before calling [`Config::from_env`].

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 3000;

/// Largest accepted upload.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

const PORT_VAR: &str = "MAINTDESK_PORT";
const STORE_URL_VAR: &str = "MAINTDESK_STORE_URL";
const STORE_KEY_VAR: &str = "MAINTDESK_STORE_KEY";
const MAX_UPLOAD_VAR: &str = "MAINTDESK_MAX_UPLOAD_BYTES";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub store_url: Option<String>,
    pub store_key: Option<String>,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            store_url: None,
            store_key: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match get(PORT_VAR) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: PORT_VAR,
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let max_upload_bytes = match get(MAX_UPLOAD_VAR) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: MAX_UPLOAD_VAR,
                value: raw,
            })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            port,
            store_url: get(STORE_URL_VAR),
            store_key: get(STORE_KEY_VAR),
            max_upload_bytes,
        })
    }

    /// True when both store settings are present.
    pub fn has_store(&self) -> bool {
        self.store_url.is_some() && self.store_key.is_some()
    }
}
