//! REST client for the Forgeboard status/config API.
//!
//! Calls are single-attempt on purpose: a failed submission is terminal
//! for that user action and surfaces as a one-shot notice; only the
//! push channel carries an automatic retry policy.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod poll;

pub use poll::{DEFAULT_POLL_INTERVAL_SECS, StatusPoller, status_to_update};

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Form-field payload for settings and command submissions (all text).
pub type FormFields = BTreeMap<String, String>;

#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl ApiClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("api_base_url_missing")]
    BaseUrlMissing,
    #[error("api_invalid_path")]
    InvalidPath,
    #[error("api_request_failed:{message}")]
    Request { message: String },
    #[error("api_read_failed:{message}")]
    Read { message: String },
    #[error("api_http_{status}:{body}")]
    Http { status: StatusCode, body: String },
    #[error("api_json_decode_failed:{message}")]
    Decode { message: String },
}

/// Bot status as served by `GET /api/status` (and pushed over the feed).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BotStatus {
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub uptime: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub commands: Option<u64>,
    #[serde(default)]
    pub modules: Option<u64>,
    #[serde(default)]
    pub stats: BotStats,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct BotStats {
    #[serde(default)]
    pub messages: u64,
    #[serde(default)]
    pub commands_executed: u64,
}

/// Registered command as served by `GET /api/commands`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommandInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub usage: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub cooldown: u32,
}

/// Loaded module as served by `GET /api/modules`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModuleInfo {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub status: String,
}

impl ApiClient {
    pub fn new(config: ApiClientConfig) -> Result<Self, ApiError> {
        let base_url = normalize_base_url(&config.base_url)?;
        Ok(Self {
            base_url,
            timeout: Duration::from_millis(config.timeout_ms.max(250)),
            http: reqwest::Client::new(),
        })
    }

    #[must_use]
    pub fn endpoint(&self, path: &str) -> Option<String> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.starts_with('/') {
            Some(format!("{}{}", self.base_url, trimmed))
        } else {
            Some(format!("{}/{}", self.base_url, trimmed))
        }
    }

    #[must_use]
    pub fn status_path() -> &'static str {
        "/api/status"
    }

    #[must_use]
    pub fn settings_path() -> &'static str {
        "/api/settings"
    }

    #[must_use]
    pub fn commands_path() -> &'static str {
        "/api/commands"
    }

    #[must_use]
    pub fn modules_path() -> &'static str {
        "/api/modules"
    }

    #[must_use]
    pub fn restart_path() -> &'static str {
        "/api/restart"
    }

    #[must_use]
    pub fn stop_path() -> &'static str {
        "/api/stop"
    }

    /// Fetch the current bot status.
    pub async fn status(&self) -> Result<BotStatus, ApiError> {
        self.get_json(Self::status_path()).await
    }

    /// List registered commands.
    pub async fn commands(&self) -> Result<Vec<CommandInfo>, ApiError> {
        self.get_json(Self::commands_path()).await
    }

    /// List loaded modules.
    pub async fn modules(&self) -> Result<Vec<ModuleInfo>, ApiError> {
        self.get_json(Self::modules_path()).await
    }

    /// Submit settings form fields. Success/failure only, no body
    /// contract.
    pub async fn save_settings(&self, fields: &FormFields) -> Result<(), ApiError> {
        self.post_ok(Self::settings_path(), Some(fields)).await
    }

    /// Register a new command from form fields.
    pub async fn add_command(&self, fields: &FormFields) -> Result<(), ApiError> {
        self.post_ok(Self::commands_path(), Some(fields)).await
    }

    /// Ask the bot to restart.
    pub async fn restart(&self) -> Result<(), ApiError> {
        self.post_ok::<FormFields>(Self::restart_path(), None).await
    }

    /// Ask the bot to stop. Callers must confirm with the user first.
    pub async fn stop(&self) -> Result<(), ApiError> {
        self.post_ok::<FormFields>(Self::stop_path(), None).await
    }

    pub async fn get_json<T>(&self, path: &str) -> Result<T, ApiError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let url = self.endpoint(path).ok_or(ApiError::InvalidPath)?;
        let response = self
            .http
            .get(url.as_str())
            .header("x-request-id", request_id())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|error| ApiError::Request {
                message: error.to_string(),
            })?;
        decode_json_response(response).await
    }

    async fn post_ok<B>(&self, path: &str, payload: Option<&B>) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path).ok_or(ApiError::InvalidPath)?;
        let mut request = self
            .http
            .post(url.as_str())
            .header("x-request-id", request_id())
            .timeout(self.timeout);
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = request.send().await.map_err(|error| ApiError::Request {
            message: error.to_string(),
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let bytes = response.bytes().await.map_err(|error| ApiError::Read {
            message: error.to_string(),
        })?;
        Err(format_http_error(status, &bytes))
    }
}

pub fn format_http_error(status: StatusCode, body: &[u8]) -> ApiError {
    let body = non_empty_string(String::from_utf8_lossy(body).to_string())
        .unwrap_or_else(|| "<empty>".to_string());
    ApiError::Http { status, body }
}

fn request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

fn normalize_base_url(base_url: &str) -> Result<String, ApiError> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BaseUrlMissing);
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

async fn decode_json_response<T>(response: reqwest::Response) -> Result<T, ApiError>
where
    T: for<'de> serde::Deserialize<'de>,
{
    let status = response.status();
    let bytes = response.bytes().await.map_err(|error| ApiError::Read {
        message: error.to_string(),
    })?;

    if !status.is_success() {
        return Err(format_http_error(status, &bytes));
    }

    serde_json::from_slice::<T>(&bytes).map_err(|error| ApiError::Decode {
        message: error.to_string(),
    })
}

fn non_empty_string(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
