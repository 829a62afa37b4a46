//! Rule domain types
//!
//! Definitions for alert rules, their persisted per-rule state, and the
//! ephemeral notification events the check state machine emits.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Alert severity levels, carried as 0-3 in config and state records
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Severity {
    /// Informational, no action needed
    Info,
    /// Attention recommended
    Warning,
    /// Action required soon
    Error,
    /// Immediate action required
    Critical,
}

impl Severity {
    /// Numeric level (0-3)
    pub fn level(self) -> u8 {
        match self {
            Self::Info => 0,
            Self::Warning => 1,
            Self::Error => 2,
            Self::Critical => 3,
        }
    }

    /// Parse a numeric level; out-of-range levels are rejected
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Self::Info),
            1 => Some(Self::Warning),
            2 => Some(Self::Error),
            3 => Some(Self::Critical),
            _ => None,
        }
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> u8 {
        severity.level()
    }
}

impl TryFrom<u8> for Severity {
    type Error = String;

    fn try_from(level: u8) -> std::result::Result<Self, String> {
        Severity::from_level(level).ok_or_else(|| format!("severity out of range: {}", level))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// An alert rule: a boolean expression over snapshot metrics plus
/// notification policy
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDefinition {
    /// Unique rule name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Boolean expression over dotted metric paths
    pub expression: String,
    /// Severity attached to notifications
    pub severity: Severity,
    /// Minimum seconds between repeated trigger notifications
    pub cooldown_seconds: u64,
    /// Notify when the rule transitions to triggered
    pub notify_on_trigger: bool,
    /// Notify when the rule transitions back to normal
    pub notify_on_recovery: bool,
    /// Notification message template; `{path}` placeholders substitute
    /// resolved snapshot values, `{triggered_conditions}` the evaluator's
    /// explanation
    pub message_template: String,
    /// Whether the rule is evaluated at all
    pub enabled: bool,
}

impl RuleDefinition {
    /// Create an enabled rule with default notification policy
    /// (notify on trigger, not on recovery, no cooldown)
    pub fn new(name: impl Into<String>, expression: impl Into<String>, severity: Severity) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            expression: expression.into(),
            severity,
            cooldown_seconds: 0,
            notify_on_trigger: true,
            notify_on_recovery: false,
            message_template: String::new(),
            enabled: true,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the cooldown window
    pub fn with_cooldown(mut self, seconds: u64) -> Self {
        self.cooldown_seconds = seconds;
        self
    }

    /// Set the notification policy
    pub fn with_notifications(mut self, on_trigger: bool, on_recovery: bool) -> Self {
        self.notify_on_trigger = on_trigger;
        self.notify_on_recovery = on_recovery;
        self
    }

    /// Set the message template
    pub fn with_message(mut self, template: impl Into<String>) -> Self {
        self.message_template = template.into();
        self
    }

    /// Disable the rule
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// The two persisted states of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    /// Condition not met
    #[default]
    Normal,
    /// Condition met
    Triggered,
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Triggered => write!(f, "triggered"),
        }
    }
}

/// Persisted per-rule state record
///
/// Read before evaluation, overwritten on transition, survives restarts.
/// Wire field names follow the state-record contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleState {
    /// Rule this record belongs to
    #[serde(rename = "check_name")]
    pub rule_name: String,
    /// State after the most recent transition
    pub last_state: CheckState,
    /// Epoch seconds of the last notified trigger; anchors the cooldown window
    #[serde(rename = "last_triggered")]
    pub last_triggered_at: Option<u64>,
    /// Epoch seconds of the last recovery transition
    #[serde(rename = "last_recovered")]
    pub last_recovered_at: Option<u64>,
    /// ISO-8601 timestamp of the last record write
    #[serde(rename = "updated")]
    pub updated_at: String,
}

impl RuleState {
    /// Initial state for a rule with no prior record
    pub fn initial(rule_name: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            last_state: CheckState::Normal,
            last_triggered_at: None,
            last_recovered_at: None,
            updated_at: String::new(),
        }
    }

    /// Stamp `updated_at` from epoch seconds as RFC 3339
    pub fn stamp(&mut self, now: u64) {
        self.updated_at = chrono::DateTime::from_timestamp(now as i64, 0)
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
    }
}

/// Notification-worthy transition kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Rule went normal → triggered
    Triggered,
    /// Rule went triggered → normal
    Recovered,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Triggered => write!(f, "triggered"),
            Self::Recovered => write!(f, "recovered"),
        }
    }
}

/// Ephemeral notification event: produced once, consumed once, never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Rule that transitioned
    pub rule_name: String,
    /// Severity from the rule definition
    pub severity: Severity,
    /// Which transition fired
    pub state: EventKind,
    /// Fully rendered message body
    pub rendered_message: String,
    /// Resolved values of the metric paths the rule references
    pub snapshot_excerpt: HashMap<String, f64>,
}

impl NotificationEvent {
    /// One-line title for channel adapters
    pub fn title(&self) -> String {
        format!("{} {}", self.rule_name, self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_levels() {
        assert_eq!(Severity::Info.level(), 0);
        assert_eq!(Severity::Critical.level(), 3);
        assert_eq!(Severity::from_level(1), Some(Severity::Warning));
        assert_eq!(Severity::from_level(4), None);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Error < Severity::Critical);
    }

    #[test]
    fn test_severity_display_matches_channel_contract() {
        assert_eq!(Severity::Info.to_string(), "info");
        assert_eq!(Severity::Warning.to_string(), "warning");
        assert_eq!(Severity::Error.to_string(), "error");
        assert_eq!(Severity::Critical.to_string(), "critical");
    }

    #[test]
    fn test_rule_builder() {
        let rule = RuleDefinition::new("high_cpu", "cpu.value > 90", Severity::Warning)
            .with_description("CPU saturated")
            .with_cooldown(300)
            .with_notifications(true, true)
            .with_message("CPU at {cpu.value}%");

        assert_eq!(rule.name, "high_cpu");
        assert_eq!(rule.cooldown_seconds, 300);
        assert!(rule.notify_on_recovery);
        assert!(rule.enabled);

        let disabled = rule.disabled();
        assert!(!disabled.enabled);
    }

    #[test]
    fn test_initial_state() {
        let state = RuleState::initial("high_cpu");
        assert_eq!(state.last_state, CheckState::Normal);
        assert!(state.last_triggered_at.is_none());
        assert!(state.last_recovered_at.is_none());
    }

    #[test]
    fn test_state_stamp_is_rfc3339() {
        let mut state = RuleState::initial("high_cpu");
        state.stamp(1700000000);
        assert!(state.updated_at.starts_with("2023-11-14T22:13:20"));
    }

    #[test]
    fn test_state_serde_wire_names() {
        let mut state = RuleState::initial("high_cpu");
        state.last_triggered_at = Some(1700000000);
        state.stamp(1700000000);

        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"check_name\""));
        assert!(json.contains("\"last_triggered\""));
        assert!(json.contains("\"last_recovered\""));
        assert!(json.contains("\"updated\""));
    }

    #[test]
    fn test_event_title() {
        let event = NotificationEvent {
            rule_name: "high_cpu".to_string(),
            severity: Severity::Warning,
            state: EventKind::Triggered,
            rendered_message: String::new(),
            snapshot_excerpt: HashMap::new(),
        };
        assert_eq!(event.title(), "high_cpu triggered");
    }
}
