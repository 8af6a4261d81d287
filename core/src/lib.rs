//! # ragshelf-core
//!
//! `ragshelf-core` hosts the no-std trait APIs shared by the rest of the workspace. The index
//! crate is written against [`EmbeddingModel`], and every embedding backend (local ONNX Runtime,
//! remote OpenAI-compatible endpoints, test doubles) simply implements it.
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │  IndexManager   │───▶│  ragshelf-core   │◀───│    Backends     │
//! │                 │    │   (this crate)   │    │                 │
//! │ - persist       │    │                  │    │ - ort (local)   │
//! │ - load          │    │ - EmbeddingModel │    │ - openai        │
//! │ - retrieve      │    │ - Message / Role │    │ - llama.cpp     │
//! └─────────────────┘    └──────────────────┘    └─────────────────┘
//! ```
//!
//! ## Semantic Search with Embeddings
//!
//! ```rust
//! use ragshelf_core::EmbeddingModel;
//!
//! async fn closest(
//!     model: &impl EmbeddingModel,
//!     query: &str,
//!     documents: &[&str],
//! ) -> ragshelf_core::Result<Option<usize>> {
//!     let query = model.embed(query).await?;
//!     let mut best: Option<(usize, f32)> = None;
//!     for (idx, doc) in documents.iter().enumerate() {
//!         let vector = model.embed(doc).await?;
//!         let score: f32 = query.iter().zip(&vector).map(|(a, b)| a * b).sum();
//!         if best.is_none_or(|(_, top)| score > top) {
//!             best = Some((idx, score));
//!         }
//!     }
//!     Ok(best.map(|(idx, _)| idx))
//! }
//! ```
//!
//! ## Modules
//!
//! - [`embedding`] — turn text into dense vectors.
//! - [`message`] — chat messages used when formatting prompts for local language models.

#![no_std]
extern crate alloc;

/// Text embeddings.
pub mod embedding;
pub mod message;

use alloc::string::String;

#[doc(inline)]
pub use embedding::{Embedding, EmbeddingModel};
#[doc(inline)]
pub use message::{Message, Role};

/// Result type used throughout the crate.
///
/// Type alias for [`anyhow::Result<T>`](anyhow::Result) with [`String`] as default success type.
pub type Result<T = String> = anyhow::Result<T>;

pub use anyhow::Error;
