//! Text chunking.
//!
//! Documents are split into chunks before embedding. [`SentenceSplitter`] is the splitter used
//! by every index this crate builds.

mod sentence;

pub use sentence::SentenceSplitter;

use crate::error::Result;
use crate::types::{Chunk, Document};

/// Splits documents into indexable chunks.
pub trait Chunker: Send + Sync {
    /// Splits a document into chunks.
    ///
    /// Chunk ids are derived from the document id; chunk `n` is `{doc_id}#chunk_{n}`.
    ///
    /// # Errors
    /// Returns an error if the document cannot be chunked.
    fn chunk(&self, doc: &Document) -> Result<Vec<Chunk>>;

    /// Returns the name of this chunking strategy.
    fn name(&self) -> &'static str;
}
