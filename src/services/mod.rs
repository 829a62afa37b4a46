//! Business logic services

pub mod monitor;

pub use monitor::{CycleReport, MonitorConfig, MonitorService};
