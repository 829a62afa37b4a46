//! Rule layer
//!
//! Rule definitions and their configuration registry, the expression
//! evaluator, the per-rule check state machine, and durable rule state.

pub mod config;
pub mod engine;
pub mod expr;
pub mod state_store;
pub mod types;

pub use config::{RuleEntry, RulesConfig};
pub use engine::{CheckEngine, CheckOutcome};
pub use expr::{evaluate, explain, Expr, ExprError};
pub use state_store::StateStore;
pub use types::{CheckState, EventKind, NotificationEvent, RuleDefinition, RuleState, Severity};
