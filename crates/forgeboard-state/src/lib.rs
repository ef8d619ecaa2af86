//! Dashboard view state.
//!
//! Everything the dashboard displays lives here as plain state: the
//! status panel, the activity feed, the log pane with its filters,
//! one-shot notices, and the connection indicator. The feed client and
//! the status poller both write through [`SharedDashboard`]; whichever
//! writes last wins, there is no conflict resolution.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

use forgeboard_feed::{
    ActivityUpdate, ConnectionState, LogUpdate, StateObserver, StatusUpdate, UpdateHandler,
};

/// The activity feed keeps only the most recent entries.
pub const ACTIVITY_FEED_CAP: usize = 10;

/// Notices auto-dismiss after this long.
pub const NOTICE_TTL: Duration = Duration::from_secs(5);

/// Status panel fields. `running` stays `None` until the first update
/// so the panel can render "Unknown" instead of a guess.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusPanel {
    pub running: Option<bool>,
    pub uptime: Option<String>,
    pub version: Option<String>,
    pub messages: u64,
    pub commands_executed: u64,
    pub last_update: Option<DateTime<Utc>>,
}

impl StatusPanel {
    #[must_use]
    pub fn running_label(&self) -> &'static str {
        match self.running {
            Some(true) => "Running",
            Some(false) => "Stopped",
            None => "Unknown",
        }
    }
}

/// One line in the activity feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEntry {
    pub message: String,
    pub at: DateTime<Utc>,
}

/// One line in the log pane. The level is stored as an uppercased tag.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Search/level filter over the log pane.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogFilter {
    /// Case-insensitive substring match on the message; empty matches
    /// everything.
    pub search: String,
    /// Level tag to keep; `None` keeps all levels.
    pub level: Option<String>,
}

impl LogFilter {
    #[must_use]
    pub fn matches(&self, entry: &LogEntry) -> bool {
        let matches_search = self.search.is_empty()
            || entry
                .message
                .to_lowercase()
                .contains(&self.search.to_lowercase());
        let matches_level = match &self.level {
            Some(level) => entry.level.eq_ignore_ascii_case(level),
            None => true,
        };
        matches_search && matches_level
    }
}

/// Severity of a one-shot notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Warning,
    Danger,
}

/// A one-shot, auto-dismissing user-visible notice.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub posted_at: DateTime<Utc>,
}

impl Notice {
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        match (now - self.posted_at).to_std() {
            Ok(elapsed) => elapsed < NOTICE_TTL,
            // Posted "in the future" relative to `now`; keep it.
            Err(_) => true,
        }
    }
}

/// The whole dashboard surface.
#[derive(Debug)]
pub struct DashboardState {
    pub connection: ConnectionState,
    pub status: StatusPanel,
    pub filter: LogFilter,
    activity: VecDeque<ActivityEntry>,
    logs: Vec<LogEntry>,
    notices: Vec<Notice>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            status: StatusPanel::default(),
            filter: LogFilter::default(),
            activity: VecDeque::new(),
            logs: Vec::new(),
            notices: Vec::new(),
        }
    }
}

impl DashboardState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the status fields present in an update, leaving absent
    /// fields (and the log/activity panes) untouched.
    pub fn apply_status(&mut self, update: &StatusUpdate, now: DateTime<Utc>) {
        if let Some(running) = update.running {
            self.status.running = Some(running);
        }
        if let Some(uptime) = &update.uptime {
            self.status.uptime = Some(uptime.clone());
        }
        if let Some(version) = &update.version {
            self.status.version = Some(version.clone());
        }
        if let Some(stats) = &update.stats {
            if let Some(messages) = stats.messages {
                self.status.messages = messages;
            }
            if let Some(commands_executed) = stats.commands_executed {
                self.status.commands_executed = commands_executed;
            }
        }
        self.status.last_update = Some(now);
    }

    /// Prepend an activity line, dropping the oldest beyond the cap.
    pub fn push_activity(&mut self, activity: &ActivityUpdate, now: DateTime<Utc>) {
        self.activity.push_front(ActivityEntry {
            message: activity.message.clone(),
            at: now,
        });
        while self.activity.len() > ACTIVITY_FEED_CAP {
            self.activity.pop_back();
        }
    }

    /// Append a log line with an uppercased level tag.
    pub fn push_log(&mut self, log: &LogUpdate, now: DateTime<Utc>) {
        self.logs.push(LogEntry {
            level: log.level.to_uppercase(),
            message: log.message.clone(),
            at: now,
        });
    }

    pub fn set_connection(&mut self, state: ConnectionState) {
        self.connection = state;
    }

    pub fn post_notice(&mut self, kind: NoticeKind, message: impl Into<String>, now: DateTime<Utc>) {
        self.notices.push(Notice {
            kind,
            message: message.into(),
            posted_at: now,
        });
    }

    /// Drop notices older than [`NOTICE_TTL`].
    pub fn prune_notices(&mut self, now: DateTime<Utc>) {
        self.notices.retain(|notice| notice.is_live(now));
    }

    /// Live notices as of `now`, oldest first.
    pub fn notices(&self, now: DateTime<Utc>) -> Vec<&Notice> {
        self.notices
            .iter()
            .filter(|notice| notice.is_live(now))
            .collect()
    }

    /// Activity entries, newest first.
    #[must_use]
    pub fn activity(&self) -> &VecDeque<ActivityEntry> {
        &self.activity
    }

    /// All log entries in arrival order.
    #[must_use]
    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    /// Log entries passing the current filter.
    #[must_use]
    pub fn visible_logs(&self) -> Vec<&LogEntry> {
        self.logs
            .iter()
            .filter(|entry| self.filter.matches(entry))
            .collect()
    }

    pub fn clear_logs(&mut self) {
        self.logs.clear();
    }
}

/// Shared handle over the dashboard state. Constructed once at startup
/// and passed to whatever needs it; there is no ambient global.
#[derive(Clone, Default)]
pub struct SharedDashboard(Arc<Mutex<DashboardState>>);

impl SharedDashboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the state, recovering from a poisoned lock. Handlers only
    /// write plain values, so a poisoned guard is still coherent.
    pub fn lock(&self) -> MutexGuard<'_, DashboardState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Observer wiring the connection indicator to this state.
    #[must_use]
    pub fn state_observer(&self) -> StateObserver {
        let shared = self.clone();
        Arc::new(move |state| shared.lock().set_connection(state))
    }
}

impl UpdateHandler for SharedDashboard {
    fn on_status(&self, update: &StatusUpdate) {
        self.lock().apply_status(update, Utc::now());
    }

    fn on_activity(&self, activity: &ActivityUpdate) {
        self.lock().push_activity(activity, Utc::now());
    }

    fn on_log(&self, log: &LogUpdate) {
        self.lock().push_log(log, Utc::now());
    }
}
