//! Typed inbound status frames.
//!
//! Every field is independently optional; a single frame may carry any
//! subset. Frames are validated here, at the parse boundary, so the
//! dispatch layer never sees a malformed payload.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{FeedError, Result};

/// A status frame pushed over the feed channel (or synthesized from a
/// poll of the status endpoint).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatusUpdate {
    pub running: Option<bool>,
    pub uptime: Option<String>,
    pub version: Option<String>,
    pub commands: Option<u64>,
    pub modules: Option<u64>,
    pub stats: Option<StatsUpdate>,
    pub activity: Option<ActivityUpdate>,
    pub logs: Option<LogUpdate>,
}

/// Counter block inside a status frame.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatsUpdate {
    pub messages: Option<u64>,
    pub commands_executed: Option<u64>,
}

/// Activity line inside a status frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActivityUpdate {
    pub message: String,
}

/// Log line inside a status frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogUpdate {
    pub level: String,
    pub message: String,
}

impl StatusUpdate {
    /// Whether any bot-status field is present (as opposed to a frame
    /// that only carries activity and/or logs).
    pub fn has_status_fields(&self) -> bool {
        self.running.is_some()
            || self.uptime.is_some()
            || self.version.is_some()
            || self.commands.is_some()
            || self.modules.is_some()
            || self.stats.is_some()
    }

    /// Whether the frame carries nothing at all.
    pub fn is_empty(&self) -> bool {
        !self.has_status_fields() && self.activity.is_none() && self.logs.is_none()
    }
}

/// Parse a text frame into a typed status update.
pub fn parse_update(text: &str) -> Result<StatusUpdate> {
    let value: Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(FeedError::Protocol(
            "expected JSON object status frame".to_string(),
        ));
    }
    serde_json::from_value(value)
        .map_err(|error| FeedError::Protocol(format!("invalid status frame: {error}")))
}
