//! Model-type driven vector indexes for retrieval-augmented generation.
//!
//! `ragshelf-index` turns a model-type label into a concrete language-model and embedding
//! configuration, builds a vector index from documents, and persists or loads it.
//!
//! # Model types
//!
//! | Label | Language model | Embedding |
//! |-------|----------------|-----------|
//! | `DEFAULT` | library default | remote (`text-embedding-ada-002`) |
//! | `LLAMA2-7B_Q4`, `LLAMA2-7B_Q5` | Llama 2 7B chat GGUF | local (`BAAI/bge-small-en-v1.5`) |
//! | `LLAMA2-13B_Q4`, `LLAMA2-13B_Q5` | Llama 2 13B chat GGUF | local |
//! | `MIXTRAL-7B_Q4`, `MIXTRAL-7B_Q5` | Mixtral 8x7B instruct GGUF | local |
//!
//! Every index is split into chunks of at most 512 tokens.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ragshelf_index::{DirectoryReader, IndexManager};
//!
//! # fn example() -> ragshelf_index::Result<()> {
//! let documents = DirectoryReader::new("./docs").load()?;
//! let manager = IndexManager::builder()
//!     .storage_dir("./storage")
//!     .documents(documents)
//!     .model_type("MIXTRAL-7B_Q4")
//!     .build()?;
//!
//! let index = match manager.load()? {
//!     Some(index) => index,
//!     None => manager.persist()?.expect("documents and storage dir are set"),
//! };
//! println!("{} chunks indexed", index.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Storage
//!
//! See [`storage`] for the on-disk layouts. A storage directory that exists is treated as a
//! built index; [`IndexManager::load`] only returns `None` when the directory is missing.

pub mod chunking;
mod embedder;
pub mod error;
mod hash;
mod manager;
pub mod model_type;
mod reader;
mod runtime;
pub mod settings;
pub mod storage;
pub mod types;
mod vector_index;
mod vector_store;

pub use embedder::BackendEmbedder;
pub use error::{IndexError, Result};
pub use hash::content_hash;
pub use manager::{IndexManager, IndexManagerBuilder};
pub use model_type::{EmbedBackend, LlmSource, ModelProfile, ModelType};
pub use reader::DirectoryReader;
pub use settings::{
    DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, IndexSettings, IndexSettingsBuilder, LlmSettings,
};
pub use storage::{StorageContext, StorageFormat};
pub use types::{Chunk, Document, IndexEntry, Metadata, SearchResult};
pub use vector_index::{DEFAULT_TOP_K, VectorStoreIndex};
pub use vector_store::SimpleVectorStore;
