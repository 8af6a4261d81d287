//! # Embedding Module
//!
//! Embeddings are dense vector representations of text. Similar texts produce similar vectors,
//! which is what a vector-store index relies on to pull relevant chunks for a query.
//!
//! This module provides the [`EmbeddingModel`] trait that abstracts over embedding backends so
//! an index can be built with a local ONNX model, a remote API, or a test double without
//! changing the indexing code.
//!
//! ```rust
//! use ragshelf_core::EmbeddingModel;
//!
//! async fn example<T: EmbeddingModel>(model: &T) -> ragshelf_core::Result<()> {
//!     let dim = model.dim();
//!     let embedding = model.embed("Hello, world!").await?;
//!     assert_eq!(embedding.len(), dim);
//!     Ok(())
//! }
//! ```

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::future::Future;

/// A type alias for an embedding vector of 32-bit floats.
pub type Embedding = Vec<f32>;

/// Converts text to vector representations.
///
/// # Implementation Requirements
///
/// - The [`embed`](EmbeddingModel::embed) method must return vectors with length equal to [`dim`](EmbeddingModel::dim)
/// - [`dim`](EmbeddingModel::dim) must be known without contacting the model, so callers can
///   validate persisted vectors before the backend is loaded
///
/// # Example
///
/// ```rust
/// use ragshelf_core::EmbeddingModel;
///
/// struct Constant;
///
/// impl EmbeddingModel for Constant {
///     fn dim(&self) -> usize {
///         3
///     }
///
///     async fn embed(&self, _text: &str) -> ragshelf_core::Result<Vec<f32>> {
///         Ok(vec![1.0, 0.0, 0.0])
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let embedding = Constant.embed("The quick brown fox").await.unwrap();
/// assert_eq!(embedding.len(), 3);
/// # });
/// ```
pub trait EmbeddingModel: Send + Sync {
    /// Returns the embedding vector dimension.
    ///
    /// Common dimensions include:
    /// - 384 (`BAAI/bge-small-en-v1.5`)
    /// - 1536 (`OpenAI text-embedding-ada-002`)
    fn dim(&self) -> usize;

    /// Converts text to an embedding vector of length [`Self::dim`](EmbeddingModel::dim).
    fn embed(&self, text: &str) -> impl Future<Output = crate::Result<Embedding>> + Send;

    /// Name recorded next to persisted vectors.
    fn name(&self) -> &str {
        "custom"
    }
}

impl<T: EmbeddingModel> EmbeddingModel for Arc<T> {
    fn dim(&self) -> usize {
        (**self).dim()
    }

    fn embed(&self, text: &str) -> impl Future<Output = crate::Result<Embedding>> + Send {
        (**self).embed(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
