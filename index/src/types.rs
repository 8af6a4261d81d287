//! Documents, chunks and search results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::hash::content_id;

/// Key/value metadata attached to documents and chunks.
pub type Metadata = BTreeMap<String, String>;

/// A source document to be indexed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier for the document.
    pub id: String,
    /// Raw text content.
    pub text: String,
    /// Arbitrary metadata carried onto every chunk.
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    /// Creates a document with empty metadata.
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_metadata(id, text, Metadata::new())
    }

    /// Creates a document with metadata.
    #[must_use]
    pub fn with_metadata(
        id: impl Into<String>,
        text: impl Into<String>,
        metadata: Metadata,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata,
        }
    }

    /// Creates a document whose id is derived from its content.
    ///
    /// Identical texts get identical ids, so indexing the same text twice stores it once.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(content_id(&text), text)
    }
}

/// Same as [`Document::from_text`]: duplicate texts merge into one document.
impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

/// Same as [`Document::from_text`].
impl From<String> for Document {
    fn from(text: String) -> Self {
        Self::from_text(text)
    }
}

/// A chunk of text derived from a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier (format: `{doc_id}#chunk_{n}`).
    pub id: String,
    /// Text content of the chunk.
    pub text: String,
    /// Parent document ID.
    pub source_id: String,
    /// Position of this chunk within the document.
    pub index: usize,
    /// Inherited and chunk-specific metadata.
    #[serde(default)]
    pub metadata: Metadata,
    /// Content hash of `text`.
    pub content_hash: u64,
}

impl Chunk {
    /// Creates a chunk with metadata.
    #[must_use]
    pub fn with_metadata(
        id: impl Into<String>,
        text: impl Into<String>,
        source_id: impl Into<String>,
        index: usize,
        content_hash: u64,
        metadata: Metadata,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            source_id: source_id.into(),
            index,
            metadata,
            content_hash,
        }
    }

    /// Builds the id of chunk `index` of document `doc_id`.
    #[must_use]
    pub fn id_for(doc_id: &str, index: usize) -> String {
        format!("{doc_id}#chunk_{index}")
    }
}

/// A retrieved chunk with its cosine similarity to the query.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchResult {
    /// The matching chunk.
    pub chunk: Chunk,
    /// Similarity score, higher is better.
    pub score: f32,
}

/// A chunk and its embedding, as stored in the vector store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// The chunk.
    pub chunk: Chunk,
    /// The embedding vector.
    pub embedding: Vec<f32>,
}

impl IndexEntry {
    /// Creates a new index entry.
    #[must_use]
    pub const fn new(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self { chunk, embedding }
    }
}
