//! Notification channel adapters
//!
//! Each adapter exposes the generic `send(severity, title, message,
//! metadata)` contract; the channel-specific wire payload stays inside the
//! adapter.

use crate::error::NotifyError;
use crate::rules::Severity;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Notification channel contract
pub trait NotificationChannel: Send + Sync + std::fmt::Debug {
    /// Channel name for identification in logs and outcomes
    fn name(&self) -> &str;

    /// Deliver one notification
    fn send(
        &self,
        severity: Severity,
        title: &str,
        message: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<(), NotifyError>;
}

/// Terminal channel
///
/// Writes alerts to stderr with ANSI severity colors.
#[derive(Debug)]
pub struct TerminalChannel {
    name: String,
    use_colors: bool,
}

impl TerminalChannel {
    /// Terminal channel with color support detected from the environment
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            use_colors: Self::supports_color(),
        }
    }

    /// Terminal channel without colors
    pub fn no_color(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            use_colors: false,
        }
    }

    fn supports_color() -> bool {
        std::env::var("TERM")
            .map(|term| term != "dumb")
            .unwrap_or(false)
    }

    fn format_severity(&self, severity: Severity) -> String {
        if !self.use_colors {
            return severity.to_string().to_uppercase();
        }

        let color_code = match severity {
            Severity::Info => "\x1b[36m",     // Cyan
            Severity::Warning => "\x1b[33m",  // Yellow
            Severity::Error => "\x1b[31m",    // Red
            Severity::Critical => "\x1b[35m\x1b[1m", // Bold Magenta
        };

        format!("{}{}\x1b[0m", color_code, severity.to_string().to_uppercase())
    }
}

impl NotificationChannel for TerminalChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(
        &self,
        severity: Severity,
        title: &str,
        message: &str,
        _metadata: &HashMap<String, String>,
    ) -> Result<(), NotifyError> {
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        writeln!(
            handle,
            "[{}] {}: {}",
            self.format_severity(severity),
            title,
            message
        )
        .map_err(|e| NotifyError::SendFailed {
            channel: self.name.clone(),
            reason: e.to_string(),
        })
    }
}

/// File channel
///
/// Appends one JSON line per notification to a log file.
#[derive(Debug)]
pub struct FileChannel {
    name: String,
    path: PathBuf,
}

impl FileChannel {
    /// File channel appending to the given path
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

impl NotificationChannel for FileChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(
        &self,
        severity: Severity,
        title: &str,
        message: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<(), NotifyError> {
        let record = serde_json::json!({
            "severity": severity.to_string(),
            "title": title,
            "message": message,
            "metadata": metadata,
        });

        let fail = |reason: String| NotifyError::SendFailed {
            channel: self.name.clone(),
            reason,
        };

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| fail(e.to_string()))?;

        writeln!(file, "{}", record).map_err(|e| fail(e.to_string()))
    }
}

/// Command channel
///
/// Spawns an external adapter executable with severity, title, and message
/// as arguments and metadata as JSON on stdin. Exit 0 means accepted, any
/// other exit is a delivery failure.
#[derive(Debug)]
pub struct CommandChannel {
    name: String,
    program: PathBuf,
}

impl CommandChannel {
    /// Command channel running the given adapter executable
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
        }
    }
}

impl NotificationChannel for CommandChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(
        &self,
        severity: Severity,
        title: &str,
        message: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<(), NotifyError> {
        let fail = |reason: String| NotifyError::SendFailed {
            channel: self.name.clone(),
            reason,
        };

        let metadata_json =
            serde_json::to_string(metadata).map_err(|e| fail(e.to_string()))?;

        let mut child = Command::new(&self.program)
            .arg(severity.to_string())
            .arg(title)
            .arg(message)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| fail(format!("failed to spawn {}: {}", self.program.display(), e)))?;

        if let Some(stdin) = child.stdin.take() {
            let mut stdin = stdin;
            stdin
                .write_all(metadata_json.as_bytes())
                .map_err(|e| fail(e.to_string()))?;
        }

        let output = child.wait_with_output().map_err(|e| fail(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(fail(format!(
                "adapter exited with {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_severity_formatting() {
        let channel = TerminalChannel::no_color("console");
        assert_eq!(channel.format_severity(Severity::Info), "INFO");
        assert_eq!(channel.format_severity(Severity::Critical), "CRITICAL");
    }

    #[test]
    fn test_terminal_send() {
        let channel = TerminalChannel::no_color("console");
        let result = channel.send(
            Severity::Warning,
            "high_cpu triggered",
            "CPU at 95%",
            &HashMap::new(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_file_channel_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let channel = FileChannel::new("events", &path);

        let mut metadata = HashMap::new();
        metadata.insert("rule".to_string(), "high_cpu".to_string());

        channel
            .send(Severity::Warning, "high_cpu triggered", "CPU at 95%", &metadata)
            .unwrap();
        channel
            .send(Severity::Info, "high_cpu recovered", "CPU at 20%", &metadata)
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["severity"], "warning");
        assert_eq!(first["metadata"]["rule"], "high_cpu");
    }

    #[test]
    fn test_file_channel_unwritable_path() {
        let channel = FileChannel::new("events", "/nonexistent-dir/events.jsonl");
        let err = channel
            .send(Severity::Info, "t", "m", &HashMap::new())
            .unwrap_err();
        assert!(matches!(err, NotifyError::SendFailed { channel, .. } if channel == "events"));
    }

    #[test]
    fn test_command_channel_missing_adapter() {
        let channel = CommandChannel::new("pager", "/nonexistent/hostwatch-pager");
        let err = channel
            .send(Severity::Critical, "t", "m", &HashMap::new())
            .unwrap_err();
        assert!(matches!(err, NotifyError::SendFailed { .. }));
    }
}
