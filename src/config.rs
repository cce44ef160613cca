//! Application configuration
//!
//! Defaults, then an optional JSON file named by `GESTURE_CHALLENGE_CONFIG`,
//! then individual environment overrides.

use crate::error::{GestureError, GestureResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "GESTURE_CHALLENGE_CONFIG";
pub const SUBMIT_URL_ENV: &str = "GESTURE_SUBMIT_URL";
pub const WALLET_RPC_URL_ENV: &str = "GESTURE_WALLET_RPC_URL";
pub const TARGET_COUNT_ENV: &str = "GESTURE_TARGET_COUNT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GestureConfig {
    /// Endpoint receiving `{"hash": ...}`
    pub submit_url: String,
    pub request_timeout_ms: u64,
    /// How long a wallet connection prompt may stay unanswered
    pub connect_timeout_ms: u64,
    /// Number of targets in sequence mode
    pub target_count: usize,
    /// Target edge length in pixels
    pub target_size: f64,
    /// JSON-RPC signer; when unset the host's wallet bridge is used
    pub wallet_rpc_url: Option<String>,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            submit_url: "http://localhost:5000/submit-gesture".to_string(),
            request_timeout_ms: 10_000,
            connect_timeout_ms: 120_000,
            target_count: 5,
            target_size: 50.0,
            wallet_rpc_url: None,
            log_filter: "gesture_challenge=debug,tauri=info".to_string(),
        }
    }
}

impl GestureConfig {
    /// Load from the process environment
    pub fn load() -> GestureResult<Self> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Load using `env` to look up variables
    pub fn load_from<F>(env: F) -> GestureResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match env(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(url) = env(SUBMIT_URL_ENV) {
            config.submit_url = url;
        }
        if let Some(url) = env(WALLET_RPC_URL_ENV) {
            config.wallet_rpc_url = Some(url).filter(|url| !url.is_empty());
        }
        if let Some(count) = env(TARGET_COUNT_ENV) {
            config.target_count = count.trim().parse().map_err(|_| {
                GestureError::Configuration(format!("{} must be an integer, got {:?}", TARGET_COUNT_ENV, count))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> GestureResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> GestureResult<()> {
        if self.target_count == 0 {
            return Err(GestureError::Configuration(
                "targetCount must be at least 1".to_string(),
            ));
        }
        if !self.target_size.is_finite() || self.target_size <= 0.0 {
            return Err(GestureError::Configuration(format!(
                "targetSize must be positive, got {}",
                self.target_size
            )));
        }
        reqwest::Url::parse(&self.submit_url).map_err(|e| {
            GestureError::Configuration(format!("invalid submitUrl {:?}: {}", self.submit_url, e))
        })?;
        if let Some(url) = &self.wallet_rpc_url {
            reqwest::Url::parse(url).map_err(|e| {
                GestureError::Configuration(format!("invalid walletRpcUrl {:?}: {}", url, e))
            })?;
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
