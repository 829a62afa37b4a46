//! Notification layer
//!
//! Channel adapters behind the generic `send` contract, their
//! configuration records, and the per-event fan-out dispatcher.

pub mod channel;
pub mod config;
pub mod dispatcher;

pub use channel::{CommandChannel, FileChannel, NotificationChannel, TerminalChannel};
pub use config::ChannelConfig;
pub use dispatcher::{ChannelOutcome, Dispatcher};
