//! Provider execution harness
//!
//! Turns one provider invocation into a validated result: isolates the
//! provider's textual output, measures duration, interprets the exit code,
//! and updates statistics exactly once per invocation.

use super::perflog::{PerfLog, PerfOperation};
use super::registry::ProviderRegistry;
use super::result::ProviderResult;
use super::stats::StatsRegistry;
use crate::error::ProviderError;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

fn epoch_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Executes providers and maintains their statistics
#[derive(Default)]
pub struct ProviderExecutor {
    perf_log: Option<PerfLog>,
}

impl ProviderExecutor {
    /// Executor without a performance log
    pub fn new() -> Self {
        Self { perf_log: None }
    }

    /// Executor that appends timing records to the given log
    pub fn with_perf_log(perf_log: PerfLog) -> Self {
        Self {
            perf_log: Some(perf_log),
        }
    }

    /// Execute one provider by name.
    ///
    /// Outcomes:
    /// - lookup miss: `NotLoaded`, stats untouched
    /// - invocation failure: `ExecutionFailed`, error stat recorded
    /// - non-zero exit: `Ok` with a synthetic critical result carrying the
    ///   partial output as message, error stat recorded
    /// - clean exit, unparseable output: `MalformedResult`, error stat
    ///   recorded, nothing forwarded as metrics
    /// - clean exit, valid output: the parsed result, check stat recorded
    pub fn execute(
        &self,
        registry: &ProviderRegistry,
        stats: &mut StatsRegistry,
        name: &str,
    ) -> Result<ProviderResult, ProviderError> {
        let provider = registry.get(name)?;

        let now = epoch_now();
        let start = Instant::now();
        let invoked = provider.invoke();
        let duration = start.elapsed().as_secs_f64();

        let raw = match invoked {
            Ok(raw) => raw,
            Err(e) => {
                stats.entry(name).record_error(duration, now);
                self.log_perf(now, name, PerfOperation::Error, duration);
                return Err(e);
            }
        };

        if !raw.success() {
            log::warn!(
                "provider '{}' exited with code {}",
                name,
                raw.exit_code
            );
            stats.entry(name).record_error(duration, now);
            self.log_perf(now, name, PerfOperation::Error, duration);
            return Ok(ProviderResult::failed(name, &raw.stdout, now));
        }

        match ProviderResult::parse(name, &raw.stdout) {
            Ok(result) => {
                stats.entry(name).record_check(duration, now);
                self.log_perf(now, name, PerfOperation::Check, duration);
                Ok(result)
            }
            Err(e) => {
                stats.entry(name).record_error(duration, now);
                self.log_perf(now, name, PerfOperation::Error, duration);
                Err(e)
            }
        }
    }

    /// Record a provider registration in stats and the performance log
    pub fn record_load(&self, stats: &mut StatsRegistry, name: &str) {
        let now = epoch_now();
        stats.record_load(name, now);
        self.log_perf(now, name, PerfOperation::Load, 0.0);
    }

    // A perf log write failure is a warning, never fatal.
    fn log_perf(&self, now: u64, provider: &str, operation: PerfOperation, duration: f64) {
        if let Some(log) = &self.perf_log {
            if let Err(e) = log.record(now, provider, operation, duration) {
                log::warn!("performance log write failed: {}", e);
            }
        }
    }
}
