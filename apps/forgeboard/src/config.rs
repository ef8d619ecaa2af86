use std::env;

use thiserror::Error;

use forgeboard_api::DEFAULT_TIMEOUT_MS;
use forgeboard_api::poll::DEFAULT_POLL_INTERVAL_SECS;
use forgeboard_feed::{DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS};

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub request_timeout_ms: u64,
    pub poll_interval_secs: u64,
    pub connect_timeout_ms: u64,
    pub reconnect_max_attempts: u32,
    pub reconnect_base_delay_ms: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid FORGEBOARD_REQUEST_TIMEOUT_MS: {0}")]
    InvalidRequestTimeoutMs(String),
    #[error("invalid FORGEBOARD_POLL_INTERVAL_SECS: {0}")]
    InvalidPollIntervalSecs(String),
    #[error("invalid FORGEBOARD_CONNECT_TIMEOUT_MS: {0}")]
    InvalidConnectTimeoutMs(String),
    #[error("invalid FORGEBOARD_RECONNECT_MAX_ATTEMPTS: {0}")]
    InvalidReconnectMaxAttempts(String),
    #[error("invalid FORGEBOARD_RECONNECT_BASE_DELAY_MS: {0}")]
    InvalidReconnectBaseDelayMs(String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("FORGEBOARD_BASE_URL")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "http://127.0.0.1:8080".to_string());
        let request_timeout_ms = lookup("FORGEBOARD_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|| DEFAULT_TIMEOUT_MS.to_string())
            .parse::<u64>()
            .map_err(|error| ConfigError::InvalidRequestTimeoutMs(error.to_string()))?;
        let poll_interval_secs = lookup("FORGEBOARD_POLL_INTERVAL_SECS")
            .unwrap_or_else(|| DEFAULT_POLL_INTERVAL_SECS.to_string())
            .parse::<u64>()
            .map_err(|error| ConfigError::InvalidPollIntervalSecs(error.to_string()))?;
        let connect_timeout_ms = lookup("FORGEBOARD_CONNECT_TIMEOUT_MS")
            .unwrap_or_else(|| "10000".to_string())
            .parse::<u64>()
            .map_err(|error| ConfigError::InvalidConnectTimeoutMs(error.to_string()))?;
        let reconnect_max_attempts = lookup("FORGEBOARD_RECONNECT_MAX_ATTEMPTS")
            .unwrap_or_else(|| DEFAULT_MAX_ATTEMPTS.to_string())
            .parse::<u32>()
            .map_err(|error| ConfigError::InvalidReconnectMaxAttempts(error.to_string()))?;
        let reconnect_base_delay_ms = lookup("FORGEBOARD_RECONNECT_BASE_DELAY_MS")
            .unwrap_or_else(|| DEFAULT_BASE_DELAY_MS.to_string())
            .parse::<u64>()
            .map_err(|error| ConfigError::InvalidReconnectBaseDelayMs(error.to_string()))?;

        Ok(Self {
            base_url,
            request_timeout_ms,
            poll_interval_secs,
            connect_timeout_ms,
            reconnect_max_attempts,
            reconnect_base_delay_ms,
        })
    }
}
