//! # Error Module
//!
//! Error types for building and running layer pipelines.
//!
//! ## Taxonomy
//! - **ConfigError** - a layer was constructed with an invalid argument
//! - **CompositionError** - a layer cannot be added to the pipeline
//! - **ExecutionError** - something failed while images were flowing
//! - **SnapshotError** - a pipeline could not be persisted or restored
//!
//! Every message carries the offending value, type tag or path.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::ops::OpError;

/// Top-level application error
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Composition error: {0}")]
    Composition(#[from] CompositionError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Raised by layer constructors, never by `transform`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("The value {value} for the argument {argument} is not valid")]
    InvalidArgument {
        argument: &'static str,
        value: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(argument: &'static str, value: impl std::fmt::Debug) -> Self {
        ConfigError::InvalidArgument {
            argument,
            value: format!("{:?}", value),
        }
    }

    /// Name of the rejected argument
    pub fn argument(&self) -> &'static str {
        match self {
            ConfigError::InvalidArgument { argument, .. } => argument,
        }
    }
}

/// Structural violations raised by `Pipeline::add`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompositionError {
    #[error("Pipeline is frozen, layer '{kind}' cannot be added")]
    Frozen { kind: String },

    #[error("The first layer needs to be a source layer, got layer of type '{kind}'")]
    FirstLayerNotSource { kind: String },

    #[error("The layer of type '{kind}' does not support layer of type '{parent}' as parent layer")]
    UnsupportedParent { kind: String, parent: String },
}

/// Failures while images are flowing through the layers
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Pipeline has no layers")]
    EmptyPipeline,

    #[error("The first layer of type '{kind}' cannot produce images")]
    NotASource { kind: String },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode image {path}: {reason}")]
    Encode { path: PathBuf, reason: String },

    #[error("Layer '{layer}' failed: {source}")]
    Operation {
        layer: String,
        #[source]
        source: OpError,
    },
}

/// Failures while persisting or restoring a pipeline
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to access snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Layer '{name}' of type '{kind}' cannot be persisted")]
    NotSerializable { name: String, kind: String },

    #[error("Snapshot contains an invalid layer: {0}")]
    Config(#[from] ConfigError),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, PipelineError>;
