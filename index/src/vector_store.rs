//! In-memory vector store with exact cosine search.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use parking_lot::RwLock;
use rayon::prelude::*;

use crate::error::{IndexError, Result};
use crate::types::{Chunk, IndexEntry, SearchResult};

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (lhs, rhs) in a.iter().zip(b) {
        dot += lhs * rhs;
        norm_a += lhs * lhs;
        norm_b += rhs * rhs;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Chunk embeddings keyed by chunk id.
///
/// Search scores every entry in parallel, so results are exact and deterministic: ties are
/// broken by chunk id.
pub struct SimpleVectorStore {
    dimension: usize,
    entries: RwLock<BTreeMap<String, IndexEntry>>,
}

impl std::fmt::Debug for SimpleVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleVectorStore")
            .field("dimension", &self.dimension)
            .field("len", &self.len())
            .finish()
    }
}

impl SimpleVectorStore {
    /// Creates an empty store for vectors of `dimension` components.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Creates a store holding `entries`.
    ///
    /// # Errors
    /// Returns [`IndexError::DimensionMismatch`] if any entry has the wrong dimension.
    pub fn from_entries(dimension: usize, entries: Vec<IndexEntry>) -> Result<Self> {
        let store = Self::new(dimension);
        {
            let mut map = store.entries.write();
            for entry in entries {
                store.check(&entry.embedding)?;
                map.insert(entry.chunk.id.clone(), entry);
            }
        }
        Ok(store)
    }

    fn check(&self, embedding: &[f32]) -> Result<()> {
        if embedding.len() == self.dimension {
            Ok(())
        } else {
            Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            })
        }
    }

    /// Inserts or replaces a chunk.
    ///
    /// # Errors
    /// Returns [`IndexError::DimensionMismatch`] if the embedding has the wrong dimension.
    pub fn insert(&self, chunk: Chunk, embedding: Vec<f32>) -> Result<()> {
        self.check(&embedding)?;
        self.entries
            .write()
            .insert(chunk.id.clone(), IndexEntry::new(chunk, embedding));
        Ok(())
    }

    /// Removes every chunk that came from document `source_id`; returns how many were removed.
    pub fn remove_source(&self, source_id: &str) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.chunk.source_id != source_id);
        before - entries.len()
    }

    /// Returns the `top_k` chunks most similar to `query`, best first.
    ///
    /// # Errors
    /// Returns [`IndexError::DimensionMismatch`] if the query has the wrong dimension.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        self.check(query)?;
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let entries = self.entries.read();
        let mut scored: Vec<(f32, &IndexEntry)> = entries
            .par_iter()
            .map(|(_, entry)| (cosine_similarity(query, &entry.embedding), entry))
            .collect();
        scored.sort_by(|(a, lhs), (b, rhs)| {
            Reverse(OrderedFloat(*a))
                .cmp(&Reverse(OrderedFloat(*b)))
                .then_with(|| lhs.chunk.id.cmp(&rhs.chunk.id))
        });

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(score, entry)| SearchResult {
                chunk: entry.chunk.clone(),
                score,
            })
            .collect())
    }

    /// Embedding dimension.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all entries in chunk-id order.
    #[must_use]
    pub fn entries(&self) -> Vec<IndexEntry> {
        self.entries.read().values().cloned().collect()
    }
}
