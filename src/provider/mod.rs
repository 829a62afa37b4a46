//! Metric provider layer
//!
//! Providers are pluggable units producing one structured reading per
//! invocation. This module holds the provider contract, the registry, the
//! execution harness, and per-provider statistics.

pub mod executor;
pub mod perflog;
pub mod registry;
pub mod result;
pub mod stats;
pub mod traits;

pub use executor::ProviderExecutor;
pub use perflog::{PerfLog, PerfOperation};
pub use registry::ProviderRegistry;
pub use result::{MetricValue, ProviderResult, ProviderStatus};
pub use stats::{ProviderStats, StatsRegistry};
pub use traits::{CommandProvider, MetricProvider, RawOutput};
