//! Performance log
//!
//! Append-only timing log, one line per provider operation:
//! `epoch_timestamp|provider_name|operation|duration_seconds`.

use crate::error::PersistenceError;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Operation kinds recorded in the performance log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerfOperation {
    /// Provider registered
    Load,
    /// Successful invocation
    Check,
    /// Failed invocation
    Error,
}

impl fmt::Display for PerfOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => write!(f, "load"),
            Self::Check => write!(f, "check"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Append-only performance log writer
#[derive(Debug, Clone)]
pub struct PerfLog {
    path: PathBuf,
}

impl PerfLog {
    /// Create a log writing to the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path the log appends to
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Append one timing record.
    ///
    /// Callers treat a failure here as a warning, never fatal.
    pub fn record(
        &self,
        timestamp: u64,
        provider: &str,
        operation: PerfOperation,
        duration_secs: f64,
    ) -> Result<(), PersistenceError> {
        let line = format!("{}|{}|{}|{:.6}\n", timestamp, provider, operation, duration_secs);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| PersistenceError::WriteFailed {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?;

        file.write_all(line.as_bytes())
            .map_err(|e| PersistenceError::WriteFailed {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perf.log");
        let log = PerfLog::new(&path);

        log.record(1700000000, "cpu", PerfOperation::Check, 0.125).unwrap();
        log.record(1700000001, "disk", PerfOperation::Error, 1.5).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "1700000000|cpu|check|0.125000");
        assert_eq!(lines[1], "1700000001|disk|error|1.500000");
    }

    #[test]
    fn test_record_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perf.log");
        let log = PerfLog::new(&path);

        log.record(1, "cpu", PerfOperation::Load, 0.0).unwrap();
        log.record(2, "cpu", PerfOperation::Check, 0.1).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn test_record_unwritable_path() {
        let log = PerfLog::new("/nonexistent-dir/perf.log");
        let err = log.record(1, "cpu", PerfOperation::Check, 0.1).unwrap_err();
        assert!(matches!(err, PersistenceError::WriteFailed { .. }));
    }
}
