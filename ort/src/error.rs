//! Error types for the ONNX Runtime embedding crate.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when fetching, loading, or running a local embedding model.
#[derive(Debug, Error)]
pub enum OrtError {
    /// Failed to load or run the ONNX model.
    #[error("onnx runtime error: {0}")]
    Ort(#[from] ort::Error),

    /// Downloading model files from the Hugging Face hub failed.
    #[error("failed to fetch {file} from {repo}: {source}")]
    Hub {
        /// Hub repository id, e.g. `BAAI/bge-small-en-v1.5`.
        repo: String,
        /// File requested from the repository.
        file: String,
        /// Underlying hub error.
        #[source]
        source: hf_hub::api::sync::ApiError,
    },

    /// Failed to load the tokenizer.
    #[error("failed to load tokenizer from {path}: {message}")]
    Tokenizer {
        /// Path to the tokenizer file.
        path: PathBuf,
        /// Error message from tokenizers crate.
        message: String,
    },

    /// Model path was not specified in the builder.
    #[error("model path not specified")]
    MissingModelPath,

    /// Tokenizer file not found next to the model.
    #[error("tokenizer.json not found in {0}")]
    TokenizerNotFound(PathBuf),

    /// Model file not found in the specified path.
    #[error("model file not found: {0}")]
    ModelNotFound(PathBuf),

    /// The model exposes no output with a usable hidden dimension.
    #[error("cannot determine embedding dimension from model outputs")]
    UnknownDimension,

    /// Output tensor shape mismatch.
    #[error("unexpected output shape: expected 3 dimensions, got {0}")]
    InvalidOutputShape(usize),

    /// Tokenization failed.
    #[error("tokenization failed: {0}")]
    Tokenization(String),

    /// Ndarray shape error.
    #[error("shape error: {0}")]
    Shape(String),
}

impl OrtError {
    /// Creates a tokenizer error from a path and error message.
    pub fn tokenizer(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Tokenizer {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
