//! Rule registry configuration
//!
//! TOML-backed registry of alert rules. Malformed entries are skipped
//! individually with a logged warning; they never take sibling rules down.

use super::expr::Expr;
use super::types::{RuleDefinition, Severity};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Rule registry file structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RulesConfig {
    /// Rule entries
    #[serde(default)]
    pub rules: Vec<RuleEntry>,
}

impl RulesConfig {
    /// Load the registry from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().display().to_string();
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|_| ConfigError::FileNotFound(path_str))?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save the registry to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::error::Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(format!("failed to serialize: {}", e)))?;
        std::fs::write(path.as_ref(), contents)?;
        Ok(())
    }

    /// Registry shipped when no rules file exists yet
    pub fn default_rules() -> Self {
        Self {
            rules: vec![
                RuleEntry {
                    name: "high_cpu".to_string(),
                    description: "CPU usage sustained above 90%".to_string(),
                    enabled: true,
                    severity: 1,
                    cooldown: 300,
                    rule: "cpu.value > 90".to_string(),
                    notify_on_trigger: true,
                    notify_on_recovery: true,
                    notification_message: "CPU usage at {cpu.value}%".to_string(),
                },
                RuleEntry {
                    name: "high_memory".to_string(),
                    description: "Memory usage above 95%".to_string(),
                    enabled: true,
                    severity: 2,
                    cooldown: 300,
                    rule: "memory.value > 95".to_string(),
                    notify_on_trigger: true,
                    notify_on_recovery: true,
                    notification_message: "Memory usage at {memory.value}%".to_string(),
                },
                RuleEntry {
                    name: "disk_full".to_string(),
                    description: "Root filesystem above 90% used".to_string(),
                    enabled: true,
                    severity: 3,
                    cooldown: 3600,
                    rule: "disk.value > 90".to_string(),
                    notify_on_trigger: true,
                    notify_on_recovery: false,
                    notification_message: "Disk usage at {disk.value}%: {triggered_conditions}"
                        .to_string(),
                },
            ],
        }
    }

    /// Convert entries to rule definitions, skipping malformed ones.
    ///
    /// Returns the valid definitions and the number skipped.
    pub fn to_rule_definitions(&self) -> (Vec<RuleDefinition>, usize) {
        let mut rules = Vec::with_capacity(self.rules.len());
        let mut skipped = 0;

        for entry in &self.rules {
            match entry.to_rule() {
                Ok(rule) => rules.push(rule),
                Err(e) => {
                    log::warn!("skipping malformed rule '{}': {}", entry.name, e);
                    skipped += 1;
                }
            }
        }

        (rules, skipped)
    }
}

fn default_true() -> bool {
    true
}

/// One rule record as persisted in the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleEntry {
    /// Unique rule name
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Whether the rule is evaluated
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Severity level (0-3)
    pub severity: u8,
    /// Cooldown window in seconds
    #[serde(default)]
    pub cooldown: u64,
    /// Boolean expression over snapshot metric paths
    pub rule: String,
    /// Notify when the rule triggers
    #[serde(default = "default_true")]
    pub notify_on_trigger: bool,
    /// Notify when the rule recovers
    #[serde(default)]
    pub notify_on_recovery: bool,
    /// Message template for notifications
    #[serde(default)]
    pub notification_message: String,
}

impl RuleEntry {
    /// Validate and convert to a rule definition
    pub fn to_rule(&self) -> Result<RuleDefinition, ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingField("name".to_string()));
        }

        let severity =
            Severity::from_level(self.severity).ok_or_else(|| ConfigError::InvalidValue {
                key: "severity".to_string(),
                message: format!("must be 0-3, got {}", self.severity),
            })?;

        // Surface syntax errors here so bad rules are caught at load time
        // rather than silently evaluating false forever.
        Expr::parse(&self.rule).map_err(|e| ConfigError::InvalidValue {
            key: "rule".to_string(),
            message: e.to_string(),
        })?;

        let mut rule = RuleDefinition::new(self.name.clone(), self.rule.clone(), severity)
            .with_description(self.description.clone())
            .with_cooldown(self.cooldown)
            .with_notifications(self.notify_on_trigger, self.notify_on_recovery)
            .with_message(self.notification_message.clone());

        if !self.enabled {
            rule = rule.disabled();
        }

        Ok(rule)
    }
}
