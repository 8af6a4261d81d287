//! # ragshelf
//!
//! Façade crate that re-exports [`ragshelf_core`] and, behind features, the index manager and
//! the embedding and language-model backends. Pull this crate into an application to configure,
//! persist and load vector indexes for retrieval-augmented generation.
//!
//! ## Features
//!
//! | Feature | Crate | Default |
//! |---------|-------|---------|
//! | `index` | [`ragshelf_index`] as [`index`] | yes |
//! | `ort` | local ONNX embeddings | no |
//! | `openai` | remote OpenAI-compatible embeddings | no |
//! | `llama` | llama.cpp model handles | no |
//!
//! ## Example
//!
//! ```rust,no_run
//! use ragshelf::index::{Document, IndexManager};
//!
//! fn demo() -> ragshelf::index::Result<()> {
//!     let manager = IndexManager::new(
//!         Some("./storage".into()),
//!         Some(vec![Document::from("a test document")]),
//!         Some("LLAMA2-7B_Q4"),
//!     )?;
//!     match manager.load()? {
//!         Some(index) => println!("loaded {} chunks", index.len()),
//!         None => {
//!             manager.persist()?;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub use ragshelf_core::*;

#[cfg(feature = "index")]
pub use ragshelf_index as index;

#[cfg(feature = "llama")]
pub use ragshelf_llama as llama;

#[cfg(feature = "openai")]
pub use ragshelf_openai as openai;

#[cfg(feature = "ort")]
pub use ragshelf_ort as ort;
