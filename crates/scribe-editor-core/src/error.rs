//! Error types for engine, suggestion source, configuration and plugin operations.

use smol_str::SmolStr;
use thiserror::Error;

use crate::types::MarkKind;

/// Errors reported by a document engine when a transaction cannot be applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineError {
    /// The engine (or the view it projects into) has been torn down.
    #[error("document engine has been destroyed")]
    Destroyed,

    /// The schema has no mark of this kind.
    #[error("mark kind `{0}` is not registered with the document engine")]
    UnknownMarkKind(MarkKind),

    /// A range does not fit inside the current document.
    #[error("range {start}..{end} is outside the document (length {len})")]
    InvalidRange { start: usize, end: usize, len: usize },

    /// The engine refused the transaction for its own reasons.
    #[error("transaction rejected: {0}")]
    Rejected(String),
}

/// Errors produced by a host-supplied suggestion source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SourceError {
    /// The host function failed or its promise rejected.
    #[error("suggestion fetch failed: {0}")]
    Fetch(String),

    /// The request was dropped before it produced a value.
    #[error("suggestion fetch was cancelled")]
    Cancelled,
}

/// Errors from loading or validating editor configuration.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to parse editor config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid editor config: {0}")]
    Invalid(String),
}

/// Errors from the plugin registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PluginError {
    #[error("plugin `{0}` is already registered")]
    Duplicate(SmolStr),

    #[error("no plugin named `{0}`")]
    NotFound(SmolStr),
}
