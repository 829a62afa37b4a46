//! Per-provider execution statistics
//!
//! Accumulators mutated only by the executor, persisted as a JSON registry
//! so bookkeeping survives re-invocations of the agent process.

use crate::error::PersistenceError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Execution statistics for a single provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderStats {
    /// Epoch seconds when the provider was registered
    pub load_time: u64,
    /// Total invocations
    pub check_count: u64,
    /// Invocations that failed (non-zero exit, spawn failure, malformed output)
    pub error_count: u64,
    /// Epoch seconds of the most recent invocation
    pub last_check_time: u64,
    /// Running average invocation duration in seconds
    pub average_duration: f64,
}

impl ProviderStats {
    /// Stats for a provider loaded at the given time
    pub fn loaded_at(load_time: u64) -> Self {
        Self {
            load_time,
            ..Default::default()
        }
    }

    /// Record one invocation with its measured duration.
    ///
    /// The running average folds in the new duration incrementally:
    /// `new_avg = ((old_avg * (n - 1)) + duration) / n`.
    pub fn record_check(&mut self, duration_secs: f64, now: u64) {
        self.check_count += 1;
        self.last_check_time = now;

        let n = self.check_count as f64;
        self.average_duration = ((self.average_duration * (n - 1.0)) + duration_secs) / n;
    }

    /// Record one failed invocation; failures still count as checks
    pub fn record_error(&mut self, duration_secs: f64, now: u64) {
        self.record_check(duration_secs, now);
        self.error_count += 1;
    }
}

/// Registry of per-provider statistics, keyed by provider name
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsRegistry {
    providers: HashMap<String, ProviderStats>,
}

impl StatsRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Stats entry for a provider, created on first access
    pub fn entry(&mut self, name: &str) -> &mut ProviderStats {
        self.providers.entry(name.to_string()).or_default()
    }

    /// Stats for a provider, if it has ever been seen
    pub fn get(&self, name: &str) -> Option<&ProviderStats> {
        self.providers.get(name)
    }

    /// Mark a provider as loaded at the given time, preserving any
    /// accumulated counters from a previous process run
    pub fn record_load(&mut self, name: &str, now: u64) {
        self.entry(name).load_time = now;
    }

    /// Load the registry from a JSON file; a missing file is an empty registry
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }

        let contents =
            std::fs::read_to_string(path).map_err(|e| PersistenceError::ReadFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        serde_json::from_str(&contents).map_err(|e| PersistenceError::Corrupt {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Persist the registry to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            PersistenceError::WriteFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            }
        })?;

        std::fs::write(path, contents).map_err(|e| PersistenceError::WriteFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}
