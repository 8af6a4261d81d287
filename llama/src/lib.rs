//! llama.cpp model handle for ragshelf.
//!
//! Quantized model profiles pair a GGUF weights file with local embeddings. This crate
//! describes that model: where the weights live, the context window, and the Llama 2
//! chat template used to build prompts. Weights are only
//! downloaded when [`LlamaCpp::fetch`] is called.
//!
//! ```rust,no_run
//! use ragshelf_llama::LlamaCpp;
//!
//! # fn example() -> Result<(), ragshelf_llama::LlamaError> {
//! let model = LlamaCpp::builder(
//!     "https://huggingface.co/TheBloke/Llama-2-7B-Chat-GGUF/resolve/main/llama-2-7b-chat.Q4_K_M.gguf",
//! )
//! .verbose(true)
//! .build()?;
//! let weights = model.fetch()?;
//! println!("weights at {}", weights.display());
//! # Ok(())
//! # }
//! ```

mod error;
mod hub;
pub mod prompt;

pub use error::LlamaError;
pub use hub::HubFile;
pub use prompt::{completion_to_prompt, messages_to_prompt};

use std::path::PathBuf;

use ragshelf_core::Message;
use url::Url;

/// Context window (in tokens) used when none is configured.
pub const DEFAULT_CONTEXT_WINDOW: u32 = 2048;

/// A GGUF model served by llama.cpp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlamaCpp {
    model_url: Url,
    weights: HubFile,
    context_window: u32,
    verbose: bool,
}

impl LlamaCpp {
    /// Starts configuring a model whose weights are downloaded from `model_url`.
    pub fn builder(model_url: impl Into<String>) -> LlamaCppBuilder {
        LlamaCppBuilder::new(model_url)
    }

    /// URL of the GGUF weights file.
    #[must_use]
    pub const fn model_url(&self) -> &Url {
        &self.model_url
    }

    /// Hub location of the weights.
    #[must_use]
    pub const fn weights(&self) -> &HubFile {
        &self.weights
    }

    #[must_use]
    pub const fn context_window(&self) -> u32 {
        self.context_window
    }

    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    /// Local path of the weights if they are already cached.
    #[must_use]
    pub fn cached_weights(&self) -> Option<PathBuf> {
        self.weights.cached()
    }

    /// Downloads the weights into the hub cache and returns their local path.
    ///
    /// Progress is shown when the model is verbose.
    ///
    /// # Errors
    /// Returns [`LlamaError::Download`] if the download fails.
    pub fn fetch(&self) -> Result<PathBuf, LlamaError> {
        if let Some(path) = self.cached_weights() {
            tracing::debug!(path = %path.display(), "model weights already cached");
            return Ok(path);
        }
        self.weights.fetch(self.verbose)
    }

    /// Renders a conversation with this model's chat template.
    ///
    /// # Errors
    /// See [`messages_to_prompt`].
    pub fn messages_to_prompt(&self, messages: &[Message]) -> Result<String, LlamaError> {
        messages_to_prompt(messages, None)
    }

    /// Wraps a single completion request in this model's chat template.
    #[must_use]
    pub fn completion_to_prompt(&self, completion: &str) -> String {
        completion_to_prompt(completion, None)
    }
}

/// Builder for [`LlamaCpp`].
#[derive(Debug, Clone)]
pub struct LlamaCppBuilder {
    model_url: String,
    context_window: u32,
    verbose: bool,
}

impl LlamaCppBuilder {
    fn new(model_url: impl Into<String>) -> Self {
        Self {
            model_url: model_url.into(),
            context_window: DEFAULT_CONTEXT_WINDOW,
            verbose: false,
        }
    }

    #[must_use]
    pub const fn context_window(mut self, tokens: u32) -> Self {
        self.context_window = tokens;
        self
    }

    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Validates the weights URL and builds the handle. Nothing is downloaded.
    ///
    /// # Errors
    /// Returns [`LlamaError::InvalidUrl`] or [`LlamaError::NotHubUrl`] if the URL cannot
    /// be resolved to a hub file.
    pub fn build(self) -> Result<LlamaCpp, LlamaError> {
        let model_url = Url::parse(&self.model_url).map_err(|source| LlamaError::InvalidUrl {
            url: self.model_url.clone(),
            source,
        })?;
        let weights = HubFile::from_url(&model_url)?;
        tracing::debug!(
            repo = weights.repo(),
            file = weights.filename(),
            context_window = self.context_window,
            "configured llama.cpp model"
        );

        Ok(LlamaCpp {
            model_url,
            weights,
            context_window: self.context_window,
            verbose: self.verbose,
        })
    }
}
