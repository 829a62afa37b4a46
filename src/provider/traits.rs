//! Trait definitions for metric providers
//!
//! These traits abstract over the plugin invocation mechanism to enable
//! testing with mocks.

use crate::error::ProviderError;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Raw outcome of one provider invocation
///
/// The executor owns interpretation: exit code decides failure, stdout is
/// parsed into a structured result only on clean exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOutput {
    /// Process exit code (0 = success)
    pub exit_code: i32,
    /// Captured standard output
    pub stdout: String,
}

impl RawOutput {
    /// Successful output carrying the given text
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
        }
    }

    /// Whether the invocation exited cleanly
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Trait for metric providers
///
/// A provider produces one reading per invocation. Implementations must
/// confine their output to the returned value; they are invoked with no
/// arguments and must not write to the caller's streams.
pub trait MetricProvider: Send + Sync + std::fmt::Debug {
    /// Unique provider name
    fn name(&self) -> &str;

    /// Invoke the provider once, capturing its textual output.
    ///
    /// An `Err` means the invocation itself could not happen; a clean
    /// return with a non-zero `exit_code` means the provider ran and
    /// reported failure.
    fn invoke(&self) -> Result<RawOutput, ProviderError>;
}

/// Metric provider backed by an external plugin executable
///
/// Stdout and stderr are piped so plugin output cannot corrupt the agent's
/// own streams. Stderr is captured only for diagnostics on failure.
#[derive(Debug)]
pub struct CommandProvider {
    name: String,
    program: PathBuf,
}

impl CommandProvider {
    /// Create a provider that runs the given executable
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
        }
    }

    /// Path to the plugin executable
    pub fn program(&self) -> &PathBuf {
        &self.program
    }
}

impl MetricProvider for CommandProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self) -> Result<RawOutput, ProviderError> {
        let output = Command::new(&self.program)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| ProviderError::ExecutionFailed {
                provider: self.name.clone(),
                message: format!("failed to spawn {}: {}", self.program.display(), e),
            })?;

        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        if !output.stderr.is_empty() {
            log::debug!(
                "provider '{}' wrote {} bytes to stderr",
                self.name,
                output.stderr.len()
            );
        }

        Ok(RawOutput { exit_code, stdout })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_output_success() {
        assert!(RawOutput::ok("{}").success());
        assert!(!RawOutput {
            exit_code: 2,
            stdout: String::new()
        }
        .success());
    }

    #[test]
    fn test_command_provider_name() {
        let provider = CommandProvider::new("cpu", "/usr/lib/hostwatch/cpu");
        assert_eq!(provider.name(), "cpu");
        assert_eq!(provider.program(), &PathBuf::from("/usr/lib/hostwatch/cpu"));
    }

    #[test]
    fn test_command_provider_missing_binary() {
        let provider = CommandProvider::new("ghost", "/nonexistent/hostwatch-plugin");
        let err = provider.invoke().unwrap_err();
        assert!(matches!(
            err,
            ProviderError::ExecutionFailed { .. }
        ));
        assert_eq!(err.provider_name(), "ghost");
    }
}
