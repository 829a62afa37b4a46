//! Metric aggregation
//!
//! Runs the executor across every registered provider and assembles the
//! per-cycle snapshot. One bad provider never aborts the cycle.

use crate::provider::{
    MetricValue, ProviderExecutor, ProviderRegistry, ProviderResult, StatsRegistry,
};

/// Aggregated provider results for one cycle
///
/// Results are kept in registration order; lookup is by unique provider
/// name. Snapshots are rebuilt every cycle and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSnapshot {
    results: Vec<ProviderResult>,
}

impl MetricSnapshot {
    /// Build a snapshot from results in registration order
    pub fn from_results(results: Vec<ProviderResult>) -> Self {
        Self { results }
    }

    /// Result for a provider by name
    pub fn get(&self, provider: &str) -> Option<&ProviderResult> {
        self.results.iter().find(|r| r.name == provider)
    }

    /// Resolve a dotted metric path (`provider.metric`) to its numeric value.
    ///
    /// The first segment names the provider; the remainder is the metric
    /// key, which may itself contain dots. Absent providers, absent keys,
    /// and non-numeric values all resolve to `None`.
    pub fn resolve(&self, path: &str) -> Option<f64> {
        let (provider, key) = path.split_once('.')?;
        self.get(provider)?
            .metrics
            .get(key)
            .and_then(MetricValue::as_number)
    }

    /// Results in registration order
    pub fn iter(&self) -> impl Iterator<Item = &ProviderResult> {
        self.results.iter()
    }

    /// Number of provider entries
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the snapshot holds no entries
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Runs the executor across all registered providers
#[derive(Default)]
pub struct MetricAggregator {
    executor: ProviderExecutor,
}

impl MetricAggregator {
    /// Aggregator wrapping the given executor
    pub fn new(executor: ProviderExecutor) -> Self {
        Self { executor }
    }

    /// The wrapped executor, for registration bookkeeping
    pub fn executor(&self) -> &ProviderExecutor {
        &self.executor
    }

    /// Execute every registered provider in order and collect the snapshot.
    ///
    /// Individual failures are logged and counted, never propagated; the
    /// returned count is the number of providers that produced no entry.
    pub fn aggregate(
        &self,
        registry: &ProviderRegistry,
        stats: &mut StatsRegistry,
    ) -> (MetricSnapshot, usize) {
        let mut results = Vec::with_capacity(registry.len());
        let mut failed = 0;

        for name in registry.names() {
            match self.executor.execute(registry, stats, &name) {
                Ok(result) => results.push(result),
                Err(e) => {
                    log::warn!("provider '{}' failed: {}", name, e);
                    failed += 1;
                }
            }
        }

        (MetricSnapshot::from_results(results), failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockProvider;
    use crate::provider::{ProviderExecutor, ProviderStatus};

    fn snapshot_of(providers: Vec<MockProvider>) -> (MetricSnapshot, usize) {
        let mut registry = ProviderRegistry::new();
        for p in providers {
            registry.register(Box::new(p));
        }
        let mut stats = StatsRegistry::new();
        MetricAggregator::new(ProviderExecutor::new()).aggregate(&registry, &mut stats)
    }

    #[test]
    fn test_aggregate_all_healthy() {
        let (snapshot, failed) = snapshot_of(vec![
            MockProvider::healthy("cpu", 85.0),
            MockProvider::healthy("memory", 60.0),
        ]);

        assert_eq!(failed, 0);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.resolve("cpu.value"), Some(85.0));
        assert_eq!(snapshot.resolve("memory.value"), Some(60.0));
    }

    #[test]
    fn test_aggregate_isolates_partial_failure() {
        let (snapshot, failed) = snapshot_of(vec![
            MockProvider::healthy("cpu", 85.0),
            MockProvider::emitting("memory", "not json"),
            MockProvider::healthy("disk", 40.0),
        ]);

        assert_eq!(failed, 1);
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.get("memory").is_none());
        assert_eq!(snapshot.resolve("disk.value"), Some(40.0));
    }

    #[test]
    fn test_aggregate_preserves_registration_order() {
        let (snapshot, _) = snapshot_of(vec![
            MockProvider::healthy("disk", 1.0),
            MockProvider::healthy("cpu", 2.0),
            MockProvider::healthy("memory", 3.0),
        ]);

        let names: Vec<&str> = snapshot.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["disk", "cpu", "memory"]);
    }

    #[test]
    fn test_aggregate_nonzero_exit_is_an_entry_not_a_failure() {
        let (snapshot, failed) =
            snapshot_of(vec![MockProvider::exiting("disk", 2, "mount gone")]);

        assert_eq!(failed, 0);
        let entry = snapshot.get("disk").unwrap();
        assert_eq!(entry.status, ProviderStatus::Critical);
    }

    #[test]
    fn test_resolve_absent_paths() {
        let (snapshot, _) = snapshot_of(vec![MockProvider::healthy("cpu", 85.0)]);

        assert_eq!(snapshot.resolve("disk.value"), None);
        assert_eq!(snapshot.resolve("cpu.missing"), None);
        assert_eq!(snapshot.resolve("bare_identifier"), None);
    }

    #[test]
    fn test_resolve_text_metric() {
        let mut provider = MockProvider::healthy("process", 1.0);
        provider.set_text_metric("state", "running");
        let (snapshot, _) = snapshot_of(vec![provider]);

        // Text that does not parse as a number resolves to nothing.
        assert_eq!(snapshot.resolve("process.state"), None);
        assert_eq!(snapshot.resolve("process.value"), Some(1.0));
    }
}
