//! Notification dispatch
//!
//! Fans a firing event out to the configured channels. Deliveries are
//! independent: one channel's failure never blocks or rolls back another's,
//! and there is no retry at this layer.

use super::config::ChannelConfig;
use crate::error::NotifyError;
use crate::rules::NotificationEvent;
use std::collections::HashMap;

/// Per-channel delivery outcome
#[derive(Debug)]
pub struct ChannelOutcome {
    /// Channel the delivery was attempted on
    pub channel: String,
    /// Delivery result
    pub result: Result<(), NotifyError>,
}

impl ChannelOutcome {
    /// Whether the channel accepted the notification
    pub fn delivered(&self) -> bool {
        self.result.is_ok()
    }
}

/// Fans events out to configured channels
#[derive(Default)]
pub struct Dispatcher {
    channels: Vec<ChannelConfig>,
}

impl Dispatcher {
    /// Dispatcher over the given channel configuration
    pub fn new(channels: Vec<ChannelConfig>) -> Self {
        Self { channels }
    }

    /// Replace the channel configuration
    pub fn set_channels(&mut self, channels: Vec<ChannelConfig>) {
        self.channels = channels;
    }

    /// Number of enabled channels in the current configuration
    pub fn channel_count(&self) -> usize {
        self.channels.iter().filter(|c| c.enabled).count()
    }

    /// Dispatch one event to every enabled channel.
    ///
    /// Adapters are resolved from the current configuration on every call,
    /// never cached from a previous cycle. Returns one outcome per enabled
    /// channel; failures are logged with channel identity and reason.
    pub fn dispatch(&self, event: &NotificationEvent) -> Vec<ChannelOutcome> {
        let metadata = Self::metadata_for(event);
        let title = event.title();
        let mut outcomes = Vec::new();

        for config in self.channels.iter().filter(|c| c.enabled) {
            let result = config.resolve().and_then(|channel| {
                channel.send(event.severity, &title, &event.rendered_message, &metadata)
            });

            if let Err(e) = &result {
                log::error!("notification via '{}' failed: {}", config.name, e);
            } else {
                log::info!("notified '{}' for rule '{}'", config.name, event.rule_name);
            }

            outcomes.push(ChannelOutcome {
                channel: config.name.clone(),
                result,
            });
        }

        outcomes
    }

    fn metadata_for(event: &NotificationEvent) -> HashMap<String, String> {
        let mut metadata = HashMap::new();
        metadata.insert("rule".to_string(), event.rule_name.clone());
        metadata.insert("state".to_string(), event.state.to_string());
        metadata.insert("severity".to_string(), event.severity.to_string());
        for (path, value) in &event.snapshot_excerpt {
            metadata.insert(path.clone(), value.to_string());
        }
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{EventKind, Severity};

    fn event() -> NotificationEvent {
        let mut excerpt = HashMap::new();
        excerpt.insert("cpu.value".to_string(), 95.0);
        NotificationEvent {
            rule_name: "high_cpu".to_string(),
            severity: Severity::Warning,
            state: EventKind::Triggered,
            rendered_message: "CPU at 95%".to_string(),
            snapshot_excerpt: excerpt,
        }
    }

    fn file_channel(name: &str, path: &std::path::Path) -> ChannelConfig {
        ChannelConfig {
            name: name.to_string(),
            kind: "file".to_string(),
            path: Some(path.display().to_string()),
            command: None,
            enabled: true,
        }
    }

    #[test]
    fn test_dispatch_to_file_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let dispatcher = Dispatcher::new(vec![file_channel("events", &path)]);

        let outcomes = dispatcher.dispatch(&event());
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].delivered());

        let contents = std::fs::read_to_string(&path).unwrap();
        let record: serde_json::Value = serde_json::from_str(contents.lines().next().unwrap()).unwrap();
        assert_eq!(record["title"], "high_cpu triggered");
        assert_eq!(record["metadata"]["cpu.value"], "95");
    }

    #[test]
    fn test_failing_channel_does_not_block_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let good_path = dir.path().join("events.jsonl");

        let broken = ChannelConfig {
            name: "broken".to_string(),
            kind: "file".to_string(),
            path: Some("/nonexistent-dir/events.jsonl".to_string()),
            command: None,
            enabled: true,
        };
        let dispatcher = Dispatcher::new(vec![broken, file_channel("events", &good_path)]);

        let outcomes = dispatcher.dispatch(&event());
        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].delivered());
        assert!(outcomes[1].delivered());
        assert!(good_path.exists());
    }

    #[test]
    fn test_unknown_kind_reports_unavailable() {
        let config = ChannelConfig {
            name: "mystery".to_string(),
            kind: "telepathy".to_string(),
            path: None,
            command: None,
            enabled: true,
        };
        let dispatcher = Dispatcher::new(vec![config]);

        let outcomes = dispatcher.dispatch(&event());
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(
            outcomes[0].result,
            Err(NotifyError::ChannelUnavailable(_))
        ));
    }

    #[test]
    fn test_disabled_channels_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = file_channel("events", &dir.path().join("e.jsonl"));
        config.enabled = false;
        let dispatcher = Dispatcher::new(vec![config]);

        assert_eq!(dispatcher.channel_count(), 0);
        assert!(dispatcher.dispatch(&event()).is_empty());
    }

    #[test]
    fn test_set_channels_takes_effect_next_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.jsonl");
        let mut dispatcher = Dispatcher::new(Vec::new());

        assert!(dispatcher.dispatch(&event()).is_empty());

        dispatcher.set_channels(vec![file_channel("late", &path)]);
        let outcomes = dispatcher.dispatch(&event());
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].delivered());
    }
}
