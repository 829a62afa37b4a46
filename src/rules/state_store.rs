//! Durable per-rule state records
//!
//! One JSON file per rule under a state directory. Records are read before
//! evaluation and overwritten whole on transition, so each update is a
//! self-contained read-modify-write.

use super::types::RuleState;
use crate::error::PersistenceError;
use std::path::{Path, PathBuf};

/// Directory-backed store of per-rule state records
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    /// Store rooted at the given directory (created on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the state records
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, rule_name: &str) -> PathBuf {
        // Rule names come from validated config; keep the file name tame
        // for anything that slips through.
        let safe: String = rule_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }

    /// Load the state record for a rule; `None` when no record exists
    pub fn load(&self, rule_name: &str) -> Result<Option<RuleState>, PersistenceError> {
        let path = self.record_path(rule_name);
        if !path.exists() {
            return Ok(None);
        }

        let contents =
            std::fs::read_to_string(&path).map_err(|e| PersistenceError::ReadFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        let state = serde_json::from_str(&contents).map_err(|e| PersistenceError::Corrupt {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Ok(Some(state))
    }

    /// Overwrite the state record for a rule
    pub fn save(&self, state: &RuleState) -> Result<(), PersistenceError> {
        let path = self.record_path(&state.rule_name);

        std::fs::create_dir_all(&self.dir).map_err(|e| PersistenceError::WriteFailed {
            path: self.dir.display().to_string(),
            message: e.to_string(),
        })?;

        let contents =
            serde_json::to_string_pretty(state).map_err(|e| PersistenceError::WriteFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        std::fs::write(&path, contents).map_err(|e| PersistenceError::WriteFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::types::CheckState;

    #[test]
    fn test_load_missing_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        assert!(store.load("high_cpu").unwrap().is_none());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());

        let mut state = RuleState::initial("high_cpu");
        state.last_state = CheckState::Triggered;
        state.last_triggered_at = Some(1700000000);
        state.last_recovered_at = Some(1699990000);
        state.stamp(1700000000);

        store.save(&state).unwrap();
        let reloaded = store.load("high_cpu").unwrap().unwrap();

        assert_eq!(reloaded.last_state, CheckState::Triggered);
        assert_eq!(reloaded.last_triggered_at, Some(1700000000));
        assert_eq!(reloaded.last_recovered_at, Some(1699990000));
        assert_eq!(reloaded, state);
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());

        let mut state = RuleState::initial("high_cpu");
        store.save(&state).unwrap();

        state.last_state = CheckState::Triggered;
        state.last_triggered_at = Some(42);
        store.save(&state).unwrap();

        let reloaded = store.load("high_cpu").unwrap().unwrap();
        assert_eq!(reloaded.last_state, CheckState::Triggered);
    }

    #[test]
    fn test_creates_state_dir_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested").join("state"));
        store.save(&RuleState::initial("r1")).unwrap();
        assert!(store.load("r1").unwrap().is_some());
    }

    #[test]
    fn test_corrupt_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        std::fs::write(dir.path().join("bad.json"), "{ nope").unwrap();

        let err = store.load("bad").unwrap_err();
        assert!(matches!(err, PersistenceError::Corrupt { .. }));
    }

    #[test]
    fn test_hostile_rule_name_stays_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());

        let state = RuleState::initial("../escape");
        store.save(&state).unwrap();
        assert!(store.load("../escape").unwrap().is_some());
        // The record landed inside the store directory.
        assert!(dir.path().join("___escape.json").exists());
    }
}
