//! Plain-text rendering of the dashboard surface.
//!
//! Formatting is split from printing so every view has a string-level
//! test; the binary only ever prints what these functions return.

use chrono::{DateTime, Utc};

use forgeboard_api::{BotStatus, CommandInfo, ModuleInfo};
use forgeboard_feed::ConnectionState;
use forgeboard_state::{DashboardState, NoticeKind};

pub fn connection_label(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Disconnected => "Disconnected",
        ConnectionState::Connecting => "Connecting",
        ConnectionState::Connected => "Connected",
    }
}

pub fn notice_tag(kind: NoticeKind) -> &'static str {
    match kind {
        NoticeKind::Success => "ok",
        NoticeKind::Info => "info",
        NoticeKind::Warning => "warn",
        NoticeKind::Danger => "error",
    }
}

fn clock(at: DateTime<Utc>) -> String {
    at.format("%H:%M:%S").to_string()
}

/// Render the full dashboard frame: connection line, status panel,
/// live notices, activity feed, then the filtered log pane.
pub fn render_dashboard(state: &DashboardState, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    out.push_str("== Forgeboard ==\n");
    out.push_str(&format!(
        "connection: {}\n",
        connection_label(state.connection)
    ));
    out.push_str(&format!("status: {}", state.status.running_label()));
    if let Some(uptime) = &state.status.uptime {
        out.push_str(&format!("  uptime: {uptime}"));
    }
    if let Some(version) = &state.status.version {
        out.push_str(&format!("  version: {version}"));
    }
    out.push('\n');
    out.push_str(&format!(
        "messages: {}  commands executed: {}\n",
        state.status.messages, state.status.commands_executed
    ));
    if let Some(last_update) = state.status.last_update {
        out.push_str(&format!("last update: {}\n", clock(last_update)));
    }

    for notice in state.notices(now) {
        out.push_str(&format!("[{}] {}\n", notice_tag(notice.kind), notice.message));
    }

    out.push_str("activity:\n");
    if state.activity().is_empty() {
        out.push_str("  (none)\n");
    }
    for entry in state.activity() {
        out.push_str(&format!("  {}  {}\n", clock(entry.at), entry.message));
    }

    out.push_str("logs:\n");
    let visible = state.visible_logs();
    if visible.is_empty() {
        out.push_str("  (none)\n");
    }
    for entry in visible {
        out.push_str(&format!(
            "  {}  {:5}  {}\n",
            clock(entry.at),
            entry.level,
            entry.message
        ));
    }
    out
}

pub fn render_status(status: &BotStatus) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "status: {}\n",
        if status.running { "Running" } else { "Stopped" }
    ));
    if let Some(uptime) = &status.uptime {
        out.push_str(&format!("uptime: {uptime}\n"));
    }
    if let Some(version) = &status.version {
        out.push_str(&format!("version: {version}\n"));
    }
    if let Some(commands) = status.commands {
        out.push_str(&format!("commands: {commands}\n"));
    }
    if let Some(modules) = status.modules {
        out.push_str(&format!("modules: {modules}\n"));
    }
    out.push_str(&format!(
        "messages: {}  commands executed: {}\n",
        status.stats.messages, status.stats.commands_executed
    ));
    out
}

pub fn render_commands(commands: &[CommandInfo]) -> String {
    if commands.is_empty() {
        return "no commands registered\n".to_string();
    }
    let mut out = String::new();
    for command in commands {
        out.push_str(&format!(
            "{}  [{}]  cooldown {}s\n  {}\n  usage: {}\n",
            command.name, command.category, command.cooldown, command.description, command.usage
        ));
    }
    out
}

pub fn render_modules(modules: &[ModuleInfo]) -> String {
    if modules.is_empty() {
        return "no modules loaded\n".to_string();
    }
    let mut out = String::new();
    for module in modules {
        out.push_str(&format!(
            "{}  v{}  {}\n",
            module.name, module.version, module.status
        ));
    }
    out
}
