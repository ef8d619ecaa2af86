//! Handler dispatch for parsed status frames.

use tracing::trace;

use crate::message::{ActivityUpdate, LogUpdate, StatusUpdate};

/// Receives the field groups of a status frame. Implementations are
/// invoked independently per group; a frame may trigger zero, one, or
/// several of these callbacks.
pub trait UpdateHandler: Send + Sync {
    /// Bot status changed (running flag, uptime, counters).
    fn on_status(&self, update: &StatusUpdate);
    /// A new activity line arrived.
    fn on_activity(&self, activity: &ActivityUpdate);
    /// A new log line arrived.
    fn on_log(&self, log: &LogUpdate);
}

/// Route each present field group to its handler. Absence of a field
/// is not an error; an empty frame dispatches nothing.
pub fn dispatch(update: &StatusUpdate, handler: &dyn UpdateHandler) {
    if update.has_status_fields() {
        handler.on_status(update);
    }
    if let Some(activity) = &update.activity {
        trace!("dispatching activity line");
        handler.on_activity(activity);
    }
    if let Some(log) = &update.logs {
        trace!("dispatching log line");
        handler.on_log(log);
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::message::{StatsUpdate, parse_update};

    #[derive(Default)]
    struct RecordingHandler {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingHandler {
        fn calls(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone()
        }

        fn record(&self, call: String) {
            self.calls
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(call);
        }
    }

    impl UpdateHandler for RecordingHandler {
        fn on_status(&self, update: &StatusUpdate) {
            self.record(format!("status running={:?}", update.running));
        }

        fn on_activity(&self, activity: &ActivityUpdate) {
            self.record(format!("activity {}", activity.message));
        }

        fn on_log(&self, log: &LogUpdate) {
            self.record(format!("log {} {}", log.level, log.message));
        }
    }

    #[test]
    fn activity_only_frame_triggers_exactly_the_activity_handler() {
        let handler = RecordingHandler::default();
        let update = StatusUpdate {
            activity: Some(ActivityUpdate {
                message: "x".to_string(),
            }),
            ..StatusUpdate::default()
        };

        dispatch(&update, &handler);

        assert_eq!(handler.calls(), vec!["activity x".to_string()]);
    }

    #[test]
    fn status_and_stats_trigger_the_status_handler_once() {
        let handler = RecordingHandler::default();
        let update = StatusUpdate {
            running: Some(true),
            stats: Some(StatsUpdate {
                messages: Some(5),
                commands_executed: None,
            }),
            ..StatusUpdate::default()
        };

        dispatch(&update, &handler);

        assert_eq!(handler.calls(), vec!["status running=Some(true)".to_string()]);
    }

    #[test]
    fn combined_frame_triggers_each_handler_independently() {
        let handler = RecordingHandler::default();
        let update = StatusUpdate {
            running: Some(false),
            activity: Some(ActivityUpdate {
                message: "stopping".to_string(),
            }),
            logs: Some(LogUpdate {
                level: "warn".to_string(),
                message: "shutdown requested".to_string(),
            }),
            ..StatusUpdate::default()
        };

        dispatch(&update, &handler);

        assert_eq!(
            handler.calls(),
            vec![
                "status running=Some(false)".to_string(),
                "activity stopping".to_string(),
                "log warn shutdown requested".to_string(),
            ]
        );
    }

    #[test]
    fn empty_frame_dispatches_nothing() {
        let handler = RecordingHandler::default();
        dispatch(&StatusUpdate::default(), &handler);
        assert!(handler.calls().is_empty());
    }

    #[test]
    fn parsed_frame_round_trips_through_dispatch() {
        let handler = RecordingHandler::default();
        let update = parse_update(r#"{"logs":{"level":"error","message":"boom"}}"#)
            .unwrap_or_else(|error| panic!("frame should parse: {error}"));

        dispatch(&update, &handler);

        assert_eq!(handler.calls(), vec!["log error boom".to_string()]);
    }
}
