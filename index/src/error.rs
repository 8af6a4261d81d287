//! Error types for index management.

use std::path::PathBuf;
use thiserror::Error;

use ragshelf_llama::LlamaError;

/// Errors that can occur while configuring, building, persisting or loading an index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The model-type label is not in the model table.
    #[error("unsupported model type: {0}")]
    UnsupportedModelType(String),

    /// Embedding operation failed.
    #[error("embedding failed: {0}")]
    Embedding(#[source] anyhow::Error),

    /// Reading or writing a storage artifact failed.
    #[error("persistence error at {path}: {source}")]
    Persistence {
        /// Path where the error occurred.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// IO operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Dimension mismatch between an embedding and the index.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension provided.
        actual: usize,
    },

    /// Chunking operation failed.
    #[error("chunking error: {0}")]
    Chunking(String),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Configuring the language model failed.
    #[error("language model error: {0}")]
    Llm(#[from] LlamaError),
}

impl IndexError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn database(err: impl std::fmt::Display) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;
