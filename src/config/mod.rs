//! Agent configuration
//!
//! One TOML file composes the agent settings, the provider registry, the
//! rule registry, and the notification channel registry.

pub mod file;

pub use file::ConfigFile;

use crate::notify::ChannelConfig;
use crate::rules::RuleEntry;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_true() -> bool {
    true
}

fn default_interval() -> u64 {
    60
}

fn default_state_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("hostwatch").join("state"))
        .unwrap_or_else(|| PathBuf::from("hostwatch-state"))
}

fn default_stats_file() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("hostwatch").join("stats.json"))
        .unwrap_or_else(|| PathBuf::from("hostwatch-stats.json"))
}

/// Global agent settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Seconds between cycles when running the built-in loop
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    /// Directory holding per-rule state records
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    /// Path of the persisted provider statistics registry
    #[serde(default = "default_stats_file")]
    pub stats_file: PathBuf,
    /// Optional performance log path
    #[serde(default)]
    pub perf_log: Option<PathBuf>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            state_dir: default_state_dir(),
            stats_file: default_stats_file(),
            perf_log: None,
        }
    }
}

/// One registered metric provider plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEntry {
    /// Unique provider name
    pub name: String,
    /// Plugin executable to invoke
    pub command: PathBuf,
    /// Whether the provider is registered at startup
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Complete agent configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AgentConfig {
    /// Global settings
    #[serde(default)]
    pub agent: AgentSettings,
    /// Provider plugins, in registration order
    #[serde(default)]
    pub providers: Vec<ProviderEntry>,
    /// Alert rules
    #[serde(default)]
    pub rules: Vec<RuleEntry>,
    /// Notification channels
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

impl AgentConfig {
    /// Default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("hostwatch").join("config.toml")
        } else {
            PathBuf::from("hostwatch.toml")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = AgentSettings::default();
        assert_eq!(settings.interval_secs, 60);
        assert!(settings.perf_log.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let config: AgentConfig = toml::from_str(
            r#"
            [agent]
            interval_secs = 30
            state_dir = "/var/lib/hostwatch/state"
            stats_file = "/var/lib/hostwatch/stats.json"
            perf_log = "/var/log/hostwatch/perf.log"

            [[providers]]
            name = "cpu"
            command = "/usr/lib/hostwatch/plugins/cpu"

            [[providers]]
            name = "memory"
            command = "/usr/lib/hostwatch/plugins/memory"
            enabled = false

            [[rules]]
            name = "high_cpu"
            severity = 1
            rule = "cpu.value > 90"
            cooldown = 300

            [[channels]]
            name = "console"
            kind = "terminal"
            "#,
        )
        .unwrap();

        assert_eq!(config.agent.interval_secs, 30);
        assert_eq!(config.providers.len(), 2);
        assert!(config.providers[0].enabled);
        assert!(!config.providers[1].enabled);
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.channels.len(), 1);
    }

    #[test]
    fn test_parse_empty_config() {
        let config: AgentConfig = toml::from_str("").unwrap();
        assert!(config.providers.is_empty());
        assert!(config.rules.is_empty());
        assert_eq!(config.agent.interval_secs, 60);
    }

    #[test]
    fn test_default_path_not_empty() {
        assert!(!AgentConfig::default_path().as_os_str().is_empty());
    }
}
