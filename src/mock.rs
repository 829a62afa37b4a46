//! Mock implementations for testing
//!
//! Provides mock metric providers for unit testing without external
//! plugin executables.

use crate::error::ProviderError;
use crate::provider::{MetricProvider, MetricValue, RawOutput};
use std::collections::HashMap;

#[derive(Debug)]
enum MockBehavior {
    /// Emit a valid structured result
    Healthy,
    /// Exit cleanly with arbitrary raw output
    Emitting(String),
    /// Exit non-zero with the given output
    Exiting(i32, String),
    /// Fail to invoke at all
    Failing(String),
}

/// Mock metric provider for testing
#[derive(Debug)]
pub struct MockProvider {
    name: String,
    behavior: MockBehavior,
    metrics: HashMap<String, MetricValue>,
    timestamp: u64,
}

impl MockProvider {
    /// Provider emitting a valid result with a single `value` metric
    pub fn healthy(name: impl Into<String>, value: f64) -> Self {
        let mut metrics = HashMap::new();
        metrics.insert("value".to_string(), MetricValue::Number(value));
        Self {
            name: name.into(),
            behavior: MockBehavior::Healthy,
            metrics,
            timestamp: 1700000000,
        }
    }

    /// Provider exiting cleanly with arbitrary (possibly malformed) output
    pub fn emitting(name: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behavior: MockBehavior::Emitting(raw.into()),
            metrics: HashMap::new(),
            timestamp: 1700000000,
        }
    }

    /// Provider exiting with a non-zero code and partial output
    pub fn exiting(name: impl Into<String>, code: i32, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behavior: MockBehavior::Exiting(code, output.into()),
            metrics: HashMap::new(),
            timestamp: 1700000000,
        }
    }

    /// Provider whose invocation itself fails
    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behavior: MockBehavior::Failing(message.into()),
            metrics: HashMap::new(),
            timestamp: 1700000000,
        }
    }

    /// Add or replace a numeric metric
    pub fn set_metric(&mut self, key: impl Into<String>, value: f64) {
        self.metrics.insert(key.into(), MetricValue::Number(value));
    }

    /// Add or replace a text metric
    pub fn set_text_metric(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metrics
            .insert(key.into(), MetricValue::Text(value.into()));
    }

    fn render_result(&self) -> String {
        let metrics: serde_json::Map<String, serde_json::Value> = self
            .metrics
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    MetricValue::Number(n) => serde_json::json!(n),
                    MetricValue::Text(s) => serde_json::json!(s),
                };
                (k.clone(), value)
            })
            .collect();

        serde_json::json!({
            "plugin": self.name,
            "status_code": 0,
            "status_message": "ok",
            "metrics": metrics,
            "timestamp": self.timestamp,
        })
        .to_string()
    }
}

impl MetricProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self) -> Result<RawOutput, ProviderError> {
        match &self.behavior {
            MockBehavior::Healthy => Ok(RawOutput::ok(self.render_result())),
            MockBehavior::Emitting(raw) => Ok(RawOutput::ok(raw.clone())),
            MockBehavior::Exiting(code, output) => Ok(RawOutput {
                exit_code: *code,
                stdout: output.clone(),
            }),
            MockBehavior::Failing(message) => Err(ProviderError::ExecutionFailed {
                provider: self.name.clone(),
                message: message.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderResult;

    #[test]
    fn test_healthy_mock_emits_valid_result() {
        let provider = MockProvider::healthy("cpu", 42.0);
        let raw = provider.invoke().unwrap();
        assert!(raw.success());

        let result = ProviderResult::parse("cpu", &raw.stdout).unwrap();
        assert_eq!(result.metric_number("value"), Some(42.0));
    }

    #[test]
    fn test_extra_metrics() {
        let mut provider = MockProvider::healthy("disk", 80.0);
        provider.set_metric("inodes", 12.0);
        provider.set_text_metric("mount", "/data");

        let raw = provider.invoke().unwrap();
        let result = ProviderResult::parse("disk", &raw.stdout).unwrap();
        assert_eq!(result.metric_number("inodes"), Some(12.0));
        assert_eq!(
            result.metrics.get("mount"),
            Some(&MetricValue::Text("/data".to_string()))
        );
    }

    #[test]
    fn test_failing_mock() {
        let provider = MockProvider::failing("cpu", "boom");
        assert!(provider.invoke().is_err());
    }
}
