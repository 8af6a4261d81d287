//! Vector-store index over chunked documents.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use ragshelf_core::EmbeddingModel;

use crate::chunking::{Chunker, SentenceSplitter};
use crate::error::{IndexError, Result};
use crate::storage::{IndexStruct, STORAGE_VERSION, StorageContext, StorageFormat};
use crate::types::{Document, SearchResult};
use crate::vector_store::SimpleVectorStore;

/// Results returned by [`VectorStoreIndex::retrieve`] callers that don't pick a count.
pub const DEFAULT_TOP_K: usize = 2;

#[derive(Debug, Default)]
struct DocState {
    docstore: BTreeMap<String, Document>,
    ref_doc_ids: Vec<String>,
}

/// Documents split into chunks, embedded, and held in a [`SimpleVectorStore`].
///
/// The embedder used to build the index is kept for queries, so retrieval embeds the query
/// with the same model as the chunks.
pub struct VectorStoreIndex<E> {
    embedder: Arc<E>,
    splitter: SentenceSplitter,
    store: SimpleVectorStore,
    docs: RwLock<DocState>,
}

impl<E> std::fmt::Debug for VectorStoreIndex<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStoreIndex")
            .field("splitter", &self.splitter)
            .field("store", &self.store)
            .field("documents", &self.docs.read().ref_doc_ids.len())
            .finish_non_exhaustive()
    }
}

impl<E: EmbeddingModel> VectorStoreIndex<E> {
    /// Creates an empty index.
    #[must_use]
    pub fn new(embedder: Arc<E>, splitter: SentenceSplitter) -> Self {
        let dimension = embedder.dim();
        Self {
            embedder,
            splitter,
            store: SimpleVectorStore::new(dimension),
            docs: RwLock::new(DocState::default()),
        }
    }

    /// Builds an index over `documents`.
    ///
    /// With `show_progress`, one info event is logged per document.
    ///
    /// # Errors
    /// Returns the first chunking or embedding error.
    pub async fn from_documents(
        documents: Vec<Document>,
        embedder: Arc<E>,
        splitter: SentenceSplitter,
        show_progress: bool,
    ) -> Result<Self> {
        let index = Self::new(embedder, splitter);
        let total = documents.len();

        for (processed, doc) in documents.into_iter().enumerate() {
            let doc_id = doc.id.clone();
            let chunks = index.insert(doc).await?;
            if show_progress {
                tracing::info!(
                    processed = processed + 1,
                    total,
                    doc_id = %doc_id,
                    chunks,
                    "indexed document"
                );
            }
        }

        tracing::info!(
            documents = total,
            chunks = index.len(),
            embed_model = index.embedder.name(),
            "built vector index"
        );
        Ok(index)
    }

    /// Rebuilds an index from a storage context.
    ///
    /// # Errors
    /// Returns [`IndexError::DimensionMismatch`] if the stored vectors were produced by an
    /// embedder of a different dimension.
    pub fn from_storage(storage: StorageContext, embedder: Arc<E>) -> Result<Self> {
        let StorageContext {
            docstore,
            vector_store,
            index_struct,
        } = storage;

        if index_struct.dimension != embedder.dim() {
            return Err(IndexError::DimensionMismatch {
                expected: embedder.dim(),
                actual: index_struct.dimension,
            });
        }
        if index_struct.embed_model != embedder.name() {
            tracing::warn!(
                stored = %index_struct.embed_model,
                current = embedder.name(),
                "index was built with a different embedding model"
            );
        }

        let splitter = SentenceSplitter::new(index_struct.chunk_size, index_struct.chunk_overlap)?;
        let store = SimpleVectorStore::from_entries(index_struct.dimension, vector_store)?;
        Ok(Self {
            embedder,
            splitter,
            store,
            docs: RwLock::new(DocState {
                docstore,
                ref_doc_ids: index_struct.ref_doc_ids,
            }),
        })
    }

    /// Chunks, embeds and stores a document, replacing any earlier version with the same id.
    ///
    /// Returns the number of chunks stored.
    ///
    /// # Errors
    /// Returns an error if chunking or embedding fails; the index is unchanged in that case.
    pub async fn insert(&self, document: Document) -> Result<usize> {
        let chunks = self.splitter.chunk(&document)?;
        let mut embedded = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let embedding = self
                .embedder
                .embed(&chunk.text)
                .await
                .map_err(IndexError::Embedding)?;
            if embedding.len() != self.store.dimension() {
                return Err(IndexError::DimensionMismatch {
                    expected: self.store.dimension(),
                    actual: embedding.len(),
                });
            }
            embedded.push((chunk, embedding));
        }

        let count = embedded.len();
        self.store.remove_source(&document.id);
        for (chunk, embedding) in embedded {
            self.store.insert(chunk, embedding)?;
        }

        let mut docs = self.docs.write();
        if !docs.docstore.contains_key(&document.id) {
            docs.ref_doc_ids.push(document.id.clone());
        }
        docs.docstore.insert(document.id.clone(), document);
        Ok(count)
    }

    /// Returns the `top_k` chunks most similar to `query`, best first.
    ///
    /// # Errors
    /// Returns an error if the query cannot be embedded.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(IndexError::Embedding)?;
        self.store.search(&embedding, top_k)
    }

    /// Snapshot of everything needed to persist this index.
    #[must_use]
    pub fn storage_context(&self) -> StorageContext {
        let docs = self.docs.read();
        StorageContext {
            docstore: docs.docstore.clone(),
            vector_store: self.store.entries(),
            index_struct: IndexStruct {
                version: STORAGE_VERSION,
                embed_model: self.embedder.name().to_string(),
                dimension: self.store.dimension(),
                chunk_size: self.splitter.chunk_size(),
                chunk_overlap: self.splitter.chunk_overlap(),
                ref_doc_ids: docs.ref_doc_ids.clone(),
            },
        }
    }

    /// Writes the index to `dir`, replacing any index already there.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be written.
    pub fn persist(&self, dir: &Path, format: StorageFormat) -> Result<()> {
        self.storage_context().persist(dir, format)
    }

    /// Ids of the indexed documents, in insertion order.
    #[must_use]
    pub fn ref_doc_ids(&self) -> Vec<String> {
        self.docs.read().ref_doc_ids.clone()
    }

    /// Looks up an indexed document.
    #[must_use]
    pub fn document(&self, id: &str) -> Option<Document> {
        self.docs.read().docstore.get(id).cloned()
    }

    /// Number of stored chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    #[must_use]
    pub const fn splitter(&self) -> &SentenceSplitter {
        &self.splitter
    }

    /// The embedder used for chunks and queries.
    #[must_use]
    pub const fn embedder(&self) -> &Arc<E> {
        &self.embedder
    }
}
