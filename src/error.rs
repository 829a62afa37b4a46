//! Unified error types for hostwatch
//!
//! This module defines all error types used throughout the agent.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from metric provider execution
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from configuration parsing/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from notification delivery
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    /// Error from durable state access
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from metric provider execution
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Provider is not registered in the registry
    #[error("Provider not loaded: {0}")]
    NotLoaded(String),

    /// Provider could not be invoked at all
    #[error("Provider '{provider}' execution failed: {message}")]
    ExecutionFailed { provider: String, message: String },

    /// Provider exited cleanly but its output is not a valid result
    #[error("Provider '{provider}' returned a malformed result: {reason}")]
    MalformedResult { provider: String, reason: String },
}

impl ProviderError {
    /// Name of the provider this error concerns
    pub fn provider_name(&self) -> &str {
        match self {
            Self::NotLoaded(name) => name,
            Self::ExecutionFailed { provider, .. } => provider,
            Self::MalformedResult { provider, .. } => provider,
        }
    }
}

/// Errors from configuration parsing and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Failed to parse config file
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid config value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required config field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Errors from notification channel delivery
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Channel kind is unknown or its adapter cannot be constructed
    #[error("Notification channel unavailable: {0}")]
    ChannelUnavailable(String),

    /// Adapter accepted the call but delivery failed
    #[error("Channel '{channel}' delivery failed: {reason}")]
    SendFailed { channel: String, reason: String },
}

/// Errors from reading or writing durable state
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Could not read a state record
    #[error("Failed to read state from {path}: {message}")]
    ReadFailed { path: String, message: String },

    /// Could not write a state record
    #[error("Failed to write state to {path}: {message}")]
    WriteFailed { path: String, message: String },

    /// State record exists but does not deserialize
    #[error("Corrupt state record at {path}: {message}")]
    Corrupt { path: String, message: String },
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
