//! Check state machine
//!
//! Per rule, combines the fresh evaluator result with the persisted prior
//! state to decide transitions, applies cooldown suppression, and renders
//! notification events.

use super::expr::Expr;
use super::types::{CheckState, EventKind, NotificationEvent, RuleDefinition, RuleState};
use crate::aggregator::MetricSnapshot;
use std::collections::HashMap;

/// Outcome of processing one rule for one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    /// Fresh evaluator result for this cycle
    pub evaluated: bool,
    /// Whether the rule changed state (and the record must be persisted)
    pub transitioned: bool,
    /// State after processing; meaningful to persist only on transition
    pub state: RuleState,
    /// Notification to dispatch, if the transition warrants one
    pub event: Option<NotificationEvent>,
    /// A trigger transition occurred but cooldown suppressed its notification
    pub suppressed: bool,
}

/// The per-rule trigger/recovery state machine
pub struct CheckEngine;

impl CheckEngine {
    /// Process one rule against the current snapshot.
    ///
    /// Transitions:
    /// - normal → triggered on a true evaluation: always persisted; the
    ///   trigger notification is emitted only if the rule wants one and the
    ///   cooldown window since the last notified trigger has elapsed.
    ///   `last_triggered_at` advances only when the notification is emitted,
    ///   so the cooldown window does not slide under flapping.
    /// - triggered → normal on a false evaluation: persisted; the recovery
    ///   notification is gated by policy alone, never by cooldown.
    /// - same state: no persisted change, no event.
    pub fn process(
        rule: &RuleDefinition,
        expr: &Expr,
        snapshot: &MetricSnapshot,
        prior: Option<RuleState>,
        now: u64,
    ) -> CheckOutcome {
        let prior = prior.unwrap_or_else(|| RuleState::initial(&rule.name));
        let evaluated = expr.evaluate(snapshot);

        match (evaluated, prior.last_state) {
            (true, CheckState::Normal) => {
                let mut state = prior.clone();
                state.last_state = CheckState::Triggered;

                let cooldown_elapsed = match prior.last_triggered_at {
                    None => true,
                    Some(last) => now.saturating_sub(last) >= rule.cooldown_seconds,
                };

                let mut event = None;
                let mut suppressed = false;
                if rule.notify_on_trigger {
                    if cooldown_elapsed {
                        state.last_triggered_at = Some(now);
                        event = Some(Self::build_event(rule, expr, snapshot, EventKind::Triggered));
                    } else {
                        log::debug!(
                            "rule '{}' triggered within cooldown, notification suppressed",
                            rule.name
                        );
                        suppressed = true;
                    }
                }

                state.stamp(now);
                CheckOutcome {
                    evaluated,
                    transitioned: true,
                    state,
                    event,
                    suppressed,
                }
            }
            (false, CheckState::Triggered) => {
                let mut state = prior.clone();
                state.last_state = CheckState::Normal;
                state.last_recovered_at = Some(now);
                state.stamp(now);

                let event = rule
                    .notify_on_recovery
                    .then(|| Self::build_event(rule, expr, snapshot, EventKind::Recovered));

                CheckOutcome {
                    evaluated,
                    transitioned: true,
                    state,
                    event,
                    suppressed: false,
                }
            }
            _ => CheckOutcome {
                evaluated,
                transitioned: false,
                state: prior,
                event: None,
                suppressed: false,
            },
        }
    }

    fn build_event(
        rule: &RuleDefinition,
        expr: &Expr,
        snapshot: &MetricSnapshot,
        kind: EventKind,
    ) -> NotificationEvent {
        let mut excerpt = HashMap::new();
        for path in expr.paths() {
            let value = snapshot.resolve(&path).unwrap_or(0.0);
            excerpt.insert(path, value);
        }

        NotificationEvent {
            rule_name: rule.name.clone(),
            severity: rule.severity,
            state: kind,
            rendered_message: render_message(rule, expr, snapshot, kind),
            snapshot_excerpt: excerpt,
        }
    }
}

/// Render a rule's notification message for the given transition.
///
/// `{path}` placeholders substitute resolved snapshot values and
/// `{triggered_conditions}` the evaluator's explanation. Unknown
/// placeholders are left as written.
pub fn render_message(
    rule: &RuleDefinition,
    expr: &Expr,
    snapshot: &MetricSnapshot,
    kind: EventKind,
) -> String {
    let template = if rule.message_template.is_empty() {
        match kind {
            EventKind::Triggered => "Rule '{rule_name}' triggered: {triggered_conditions}",
            EventKind::Recovered => "Rule '{rule_name}' recovered",
        }
        .to_string()
    } else {
        rule.message_template.clone()
    };

    let mut rendered = String::with_capacity(template.len());
    let mut rest = template.as_str();

    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let key = &after[..close];
                match key {
                    "triggered_conditions" => rendered.push_str(&expr.explain(snapshot)),
                    "rule_name" => rendered.push_str(&rule.name),
                    path => match snapshot.resolve(path) {
                        Some(value) => rendered.push_str(&value.to_string()),
                        None => {
                            rendered.push('{');
                            rendered.push_str(path);
                            rendered.push('}');
                        }
                    },
                }
                rest = &after[close + 1..];
            }
            None => {
                rendered.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    rendered.push_str(rest);
    rendered
}
