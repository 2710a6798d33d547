//! Error types for the node upgrade planner.
//!
//! This module provides the error hierarchy for every fallible stage of
//! planning: loading snapshots, assembling a node plan through the external
//! collaborators, and reporting.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by external collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The main error type for the node upgrade planner.
#[derive(Debug, Error)]
pub enum UpgraderError {
    /// Snapshot and configuration errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Node plan assembly errors.
    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Snapshot loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The snapshot file was not found.
    #[error("Snapshot file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The snapshot file could not be parsed.
    #[error("Failed to parse snapshot: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// The snapshot could not be serialized for output.
    #[error("Failed to serialize snapshot: {message}")]
    SerializeError {
        /// Description of the serialization error.
        message: String,
    },

    /// An argument was malformed.
    #[error("Invalid argument '{name}': {message}")]
    InvalidArgument {
        /// Argument name.
        name: String,
        /// Why it was rejected.
        message: String,
    },
}

/// Node plan assembly errors.
///
/// Every variant is surfaced to the caller untouched; retry policy belongs
/// to whoever drives the upgrade loop.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Host facts (or the node configuration needed to find them) are unavailable.
    #[error("Host lookup failed for node {node}: {message}")]
    Lookup {
        /// Node name.
        node: String,
        /// What could not be found.
        message: String,
        /// Underlying cause, when host introspection itself failed.
        #[source]
        source: Option<BoxError>,
    },

    /// The plan generation engine or configuration assembly failed.
    #[error("Plan generation failed: {message}")]
    Generation {
        /// Stage that failed.
        message: String,
        /// Underlying cause.
        #[source]
        source: BoxError,
    },

    /// The cluster token could not be obtained.
    #[error("failed to create or get cluster token for share-mnt (cluster {cluster})")]
    Token {
        /// Cluster name.
        cluster: String,
        /// Underlying cause.
        #[source]
        source: BoxError,
    },

    /// The generated plan has no entry for the node's address.
    #[error("failed to find plan for {address}")]
    NotFound {
        /// Address that was looked up.
        address: String,
    },

    /// Credential augmentation of the generated processes failed.
    #[error("Credential augmentation failed for node {node}")]
    Augmentation {
        /// Node name.
        node: String,
        /// Underlying cause.
        #[source]
        source: BoxError,
    },
}

/// Result type alias for planner operations.
pub type Result<T> = std::result::Result<T, UpgraderError>;

impl UpgraderError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if a later attempt may succeed without any input change.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Plan(PlanError::Lookup { .. } | PlanError::Token { .. })
        )
    }
}

impl ConfigError {
    /// Creates a parse error for a given source.
    #[must_use]
    pub fn parse(message: impl Into<String>, location: Option<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            location,
        }
    }

    /// Creates an invalid-argument error.
    #[must_use]
    pub fn invalid_argument(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl PlanError {
    /// Creates a lookup error for a node.
    #[must_use]
    pub fn lookup(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Lookup {
            node: node.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a lookup error wrapping a host introspection failure.
    #[must_use]
    pub fn lookup_failed(node: impl Into<String>, source: BoxError) -> Self {
        Self::Lookup {
            node: node.into(),
            message: String::from("host introspection failed"),
            source: Some(source),
        }
    }

    /// Creates a generation error wrapping a collaborator failure.
    #[must_use]
    pub fn generation(message: impl Into<String>, source: BoxError) -> Self {
        Self::Generation {
            message: message.into(),
            source,
        }
    }
}
