use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use crate::constants::{
    DEFAULT_DATA_DIR, DEFAULT_HOST, DEFAULT_MAX_UPLOAD_MB, DEFAULT_PORT,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub max_upload_mb: usize,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("HEALTH_EXPORT_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env_or("HEALTH_EXPORT_PORT", DEFAULT_PORT)?,
            data_dir: env::var("HEALTH_EXPORT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR)),
            max_upload_mb: env_or("HEALTH_EXPORT_MAX_UPLOAD_MB", DEFAULT_MAX_UPLOAD_MB)?,
            request_timeout_secs: env_or(
                "HEALTH_EXPORT_REQUEST_TIMEOUT",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
        })
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("Invalid {} format: {}", key, raw))),
        Err(_) => Ok(default),
    }
}
