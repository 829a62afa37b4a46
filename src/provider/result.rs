//! Provider result types
//!
//! Defines the validated structured reading a metric provider emits per
//! invocation, and the wire format it arrives in.

use crate::error::ProviderError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Status code reported by a provider, Nagios-style
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ProviderStatus {
    /// Reading healthy
    Ok,
    /// Reading degraded, attention recommended
    Warning,
    /// Reading failed or critically out of range
    Critical,
    /// Provider could not determine a status
    Unknown,
}

impl ProviderStatus {
    /// Numeric code as carried on the wire (0-3)
    pub fn code(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::Warning => 1,
            Self::Critical => 2,
            Self::Unknown => 3,
        }
    }

    /// Parse a wire status code; out-of-range codes are rejected
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            1 => Some(Self::Warning),
            2 => Some(Self::Critical),
            3 => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl From<ProviderStatus> for u8 {
    fn from(status: ProviderStatus) -> u8 {
        status.code()
    }
}

impl TryFrom<u8> for ProviderStatus {
    type Error = String;

    fn try_from(code: u8) -> std::result::Result<Self, Self::Error> {
        ProviderStatus::from_code(code).ok_or_else(|| format!("status code out of range: {}", code))
    }
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warning => write!(f, "WARNING"),
            Self::Critical => write!(f, "CRITICAL"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// A single metric value: numeric gauge or free-form text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Numeric reading
    Number(f64),
    /// Textual reading (state names, versions, process names)
    Text(String),
}

impl MetricValue {
    /// Numeric view of the value, used by rule comparisons.
    ///
    /// Text parses as a number when it can; anything else resolves to
    /// `None` and callers fall back to the absent-path default.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for MetricValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for MetricValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Validated result of one provider invocation
///
/// Wire field names follow the plugin contract: `plugin`, `status_code`,
/// `status_message`, `metrics`, `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult {
    /// Provider name (unique within a snapshot)
    #[serde(rename = "plugin")]
    pub name: String,
    /// Reading status
    #[serde(rename = "status_code")]
    pub status: ProviderStatus,
    /// Human-readable status message
    #[serde(rename = "status_message")]
    pub message: String,
    /// Metric readings keyed by metric name
    #[serde(default)]
    pub metrics: HashMap<String, MetricValue>,
    /// Epoch seconds when the reading was taken
    pub timestamp: u64,
}

impl ProviderResult {
    /// Parse and validate a provider's raw textual output.
    ///
    /// Anything that fails to deserialize, or that names a different
    /// provider than the one invoked, is a malformed result and never
    /// forwarded as metrics.
    pub fn parse(provider: &str, raw: &str) -> Result<Self, ProviderError> {
        let result: ProviderResult =
            serde_json::from_str(raw).map_err(|e| ProviderError::MalformedResult {
                provider: provider.to_string(),
                reason: e.to_string(),
            })?;

        if result.name != provider {
            return Err(ProviderError::MalformedResult {
                provider: provider.to_string(),
                reason: format!("result names provider '{}'", result.name),
            });
        }

        Ok(result)
    }

    /// Synthetic result for a provider that exited non-zero.
    ///
    /// The partial output becomes the message so the failure stays visible
    /// in the snapshot; no metrics are carried.
    pub fn failed(provider: &str, partial_output: &str, timestamp: u64) -> Self {
        const MAX_MESSAGE: usize = 512;

        let mut message = partial_output.trim().to_string();
        if message.len() > MAX_MESSAGE {
            message.truncate(MAX_MESSAGE);
        }
        if message.is_empty() {
            message = "provider exited with failure and no output".to_string();
        }

        Self {
            name: provider.to_string(),
            status: ProviderStatus::Critical,
            message,
            metrics: HashMap::new(),
            timestamp,
        }
    }

    /// Numeric value of a metric by key, if present and numeric
    pub fn metric_number(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).and_then(MetricValue::as_number)
    }
}
