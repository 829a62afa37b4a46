//! Notification channel configuration
//!
//! String-form channel records resolved into adapters at dispatch time, so
//! configuration changes take effect on the next cycle without restarts.

use super::channel::{CommandChannel, FileChannel, NotificationChannel, TerminalChannel};
use crate::error::NotifyError;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// One configured notification channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Channel name, used in logs and dispatch outcomes
    pub name: String,
    /// Adapter kind: `terminal`, `file`, or `command`
    pub kind: String,
    /// Target path (file kind)
    #[serde(default)]
    pub path: Option<String>,
    /// Adapter executable (command kind)
    #[serde(default)]
    pub command: Option<String>,
    /// Whether the channel receives events
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl ChannelConfig {
    /// Resolve this record into a channel adapter
    pub fn resolve(&self) -> Result<Box<dyn NotificationChannel>, NotifyError> {
        match self.kind.as_str() {
            "terminal" => Ok(Box::new(TerminalChannel::new(self.name.clone()))),
            "file" => {
                let path = self.path.as_ref().ok_or_else(|| {
                    NotifyError::ChannelUnavailable(format!(
                        "channel '{}' is kind 'file' but has no path",
                        self.name
                    ))
                })?;
                Ok(Box::new(FileChannel::new(self.name.clone(), path)))
            }
            "command" => {
                let command = self.command.as_ref().ok_or_else(|| {
                    NotifyError::ChannelUnavailable(format!(
                        "channel '{}' is kind 'command' but has no command",
                        self.name
                    ))
                })?;
                Ok(Box::new(CommandChannel::new(self.name.clone(), command)))
            }
            other => Err(NotifyError::ChannelUnavailable(format!(
                "channel '{}' has unknown kind '{}'",
                self.name, other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(name: &str, kind: &str) -> ChannelConfig {
        ChannelConfig {
            name: name.to_string(),
            kind: kind.to_string(),
            path: None,
            command: None,
            enabled: true,
        }
    }

    #[test]
    fn test_resolve_terminal() {
        let channel = config("console", "terminal").resolve().unwrap();
        assert_eq!(channel.name(), "console");
    }

    #[test]
    fn test_resolve_file_requires_path() {
        let err = config("events", "file").resolve().unwrap_err();
        assert!(matches!(err, NotifyError::ChannelUnavailable(_)));

        let mut with_path = config("events", "file");
        with_path.path = Some("/tmp/events.jsonl".to_string());
        assert!(with_path.resolve().is_ok());
    }

    #[test]
    fn test_resolve_command_requires_command() {
        let err = config("pager", "command").resolve().unwrap_err();
        assert!(matches!(err, NotifyError::ChannelUnavailable(_)));
    }

    #[test]
    fn test_resolve_unknown_kind() {
        let err = config("x", "carrier-pigeon").resolve().unwrap_err();
        assert!(err.to_string().contains("carrier-pigeon"));
    }

    #[test]
    fn test_toml_shape() {
        let parsed: Vec<ChannelConfig> = toml::from_str::<
            std::collections::HashMap<String, Vec<ChannelConfig>>,
        >(
            r#"
            [[channels]]
            name = "console"
            kind = "terminal"

            [[channels]]
            name = "events"
            kind = "file"
            path = "/var/log/hostwatch/events.jsonl"
            enabled = false
            "#,
        )
        .unwrap()
        .remove("channels")
        .unwrap();

        assert_eq!(parsed.len(), 2);
        assert!(parsed[0].enabled);
        assert!(!parsed[1].enabled);
    }
}
