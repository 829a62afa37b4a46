//! Monitoring cycle orchestration
//!
//! Runs the full pipeline — aggregate, evaluate, transition, dispatch —
//! strictly sequentially in registration order, and optionally loops at a
//! fixed interval when no external scheduler drives it.

use crate::aggregator::MetricAggregator;
use crate::config::AgentConfig;
use crate::notify::{ChannelConfig, Dispatcher};
use crate::provider::{
    CommandProvider, MetricProvider, PerfLog, ProviderExecutor, ProviderRegistry, StatsRegistry,
};
use crate::rules::{CheckEngine, Expr, RuleDefinition, StateStore};

use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn epoch_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Configuration for the monitor service
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Interval between cycles in loop mode
    pub interval: Duration,
    /// Exit after one cycle (cron-style invocation)
    pub single_cycle: bool,
    /// Directory for per-rule state records
    pub state_dir: PathBuf,
    /// Path of the persisted stats registry
    pub stats_file: PathBuf,
    /// Optional performance log path
    pub perf_log: Option<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            single_cycle: false,
            state_dir: PathBuf::from("hostwatch-state"),
            stats_file: PathBuf::from("hostwatch-stats.json"),
            perf_log: None,
        }
    }
}

/// Summary of one monitoring cycle
///
/// Every failure in the pipeline surfaces here; none terminates the
/// process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Providers that produced no snapshot entry
    pub providers_failed: usize,
    /// Rules evaluated this cycle
    pub rules_evaluated: usize,
    /// Rules skipped (disabled)
    pub rules_skipped: usize,
    /// Notification events emitted
    pub events_emitted: usize,
    /// Channel deliveries that failed
    pub deliveries_failed: usize,
    /// State or stats writes that did not durably land
    pub persistence_warnings: usize,
}

/// The monitoring pipeline service
pub struct MonitorService {
    config: MonitorConfig,
    registry: ProviderRegistry,
    stats: StatsRegistry,
    aggregator: MetricAggregator,
    rules: Vec<(RuleDefinition, Expr)>,
    state_store: StateStore,
    dispatcher: Dispatcher,
}

impl MonitorService {
    /// Create a service, reloading persisted stats for continuity
    pub fn new(config: MonitorConfig) -> Self {
        let stats = match StatsRegistry::load(&config.stats_file) {
            Ok(stats) => stats,
            Err(e) => {
                log::warn!("starting with empty provider stats: {}", e);
                StatsRegistry::new()
            }
        };

        let executor = match &config.perf_log {
            Some(path) => ProviderExecutor::with_perf_log(PerfLog::new(path)),
            None => ProviderExecutor::new(),
        };

        let state_store = StateStore::new(&config.state_dir);

        Self {
            config,
            registry: ProviderRegistry::new(),
            stats,
            aggregator: MetricAggregator::new(executor),
            rules: Vec::new(),
            state_store,
            dispatcher: Dispatcher::new(Vec::new()),
        }
    }

    /// Build a service from a loaded agent configuration
    pub fn from_config(config: &AgentConfig) -> Self {
        let mut service = Self::new(MonitorConfig {
            interval: Duration::from_secs(config.agent.interval_secs),
            single_cycle: false,
            state_dir: config.agent.state_dir.clone(),
            stats_file: config.agent.stats_file.clone(),
            perf_log: config.agent.perf_log.clone(),
        });

        for entry in config.providers.iter().filter(|p| p.enabled) {
            service.register_provider(Box::new(CommandProvider::new(
                entry.name.clone(),
                entry.command.clone(),
            )));
        }

        let (rules, skipped) = crate::rules::RulesConfig {
            rules: config.rules.clone(),
        }
        .to_rule_definitions();
        if skipped > 0 {
            log::warn!("{} malformed rule(s) skipped at load", skipped);
        }
        service.set_rules(rules);
        service.set_channels(config.channels.clone());

        service
    }

    /// Register a provider, recording its load in stats and the perf log
    pub fn register_provider(&mut self, provider: Box<dyn MetricProvider>) {
        let name = provider.name().to_string();
        self.registry.register(provider);
        self.aggregator.executor().record_load(&mut self.stats, &name);
        log::info!("registered provider '{}'", name);
    }

    /// Replace the rule set, compiling expressions up front.
    ///
    /// A rule whose expression no longer parses is dropped with a warning;
    /// siblings are unaffected.
    pub fn set_rules(&mut self, rules: Vec<RuleDefinition>) {
        self.rules = rules
            .into_iter()
            .filter_map(|rule| match Expr::parse(&rule.expression) {
                Ok(expr) => Some((rule, expr)),
                Err(e) => {
                    log::warn!("dropping rule '{}': {}", rule.name, e);
                    None
                }
            })
            .collect();
    }

    /// Replace the notification channel configuration
    pub fn set_channels(&mut self, channels: Vec<ChannelConfig>) {
        self.dispatcher.set_channels(channels);
    }

    /// Accumulated provider statistics
    pub fn stats(&self) -> &StatsRegistry {
        &self.stats
    }

    /// Run one full monitoring cycle
    pub fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();
        let now = epoch_now();

        let (snapshot, failed) = self.aggregator.aggregate(&self.registry, &mut self.stats);
        report.providers_failed = failed;

        if let Err(e) = self.stats.save(&self.config.stats_file) {
            log::warn!("provider stats not persisted: {}", e);
            report.persistence_warnings += 1;
        }

        for (rule, expr) in &self.rules {
            if !rule.enabled {
                report.rules_skipped += 1;
                continue;
            }

            let prior = match self.state_store.load(&rule.name) {
                Ok(prior) => prior,
                Err(e) => {
                    // Re-derive from scratch; history may desynchronize.
                    log::warn!("state for rule '{}' unreadable: {}", rule.name, e);
                    report.persistence_warnings += 1;
                    None
                }
            };

            let outcome = CheckEngine::process(rule, expr, &snapshot, prior, now);
            report.rules_evaluated += 1;

            if outcome.transitioned {
                log::info!(
                    "rule '{}' transitioned to {}",
                    rule.name,
                    outcome.state.last_state
                );
                if let Err(e) = self.state_store.save(&outcome.state) {
                    log::warn!("state for rule '{}' not persisted: {}", rule.name, e);
                    report.persistence_warnings += 1;
                }
            }

            if let Some(event) = outcome.event {
                report.events_emitted += 1;
                let outcomes = self.dispatcher.dispatch(&event);
                report.deliveries_failed += outcomes.iter().filter(|o| !o.delivered()).count();
            }
        }

        report
    }

    /// Run the monitoring loop.
    ///
    /// In single-cycle mode runs exactly one cycle, for invocation from an
    /// external scheduler.
    pub fn run(&mut self) {
        loop {
            let report = self.run_cycle();
            log::info!(
                "cycle complete: {} evaluated, {} events, {} provider failures",
                report.rules_evaluated,
                report.events_emitted,
                report.providers_failed
            );

            if self.config.single_cycle {
                break;
            }

            std::thread::sleep(self.config.interval);
        }
    }

    /// The service configuration
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}
