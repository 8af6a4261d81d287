//! Resolved per-manager settings.
//!
//! Every [`IndexManager`](crate::IndexManager) owns an [`IndexSettings`] value. Nothing here is
//! process-wide, so managers configured for different model types never see each other's
//! choices.

use ragshelf_llama::LlamaCpp;

use crate::chunking::SentenceSplitter;
use crate::error::Result;
use crate::model_type::{EmbedBackend, LlmSource, ModelType};
use crate::storage::StorageFormat;

/// Tokens per chunk for every index built by this crate.
pub const DEFAULT_CHUNK_SIZE: usize = 512;
/// Tokens shared between consecutive chunks.
pub const DEFAULT_CHUNK_OVERLAP: usize = 20;

/// The language model an index is paired with.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmSettings {
    /// The host library's default model.
    Default,
    /// A GGUF model run through llama.cpp.
    LlamaCpp(LlamaCpp),
}

impl LlmSettings {
    /// Returns the llama.cpp handle, if this is a quantized local model.
    #[must_use]
    pub const fn llama(&self) -> Option<&LlamaCpp> {
        match self {
            Self::Default => None,
            Self::LlamaCpp(model) => Some(model),
        }
    }
}

/// Language model, embedding backend and chunking choices for one manager.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSettings {
    model_type: ModelType,
    llm: LlmSettings,
    embedding: EmbedBackend,
    chunk_size: usize,
    chunk_overlap: usize,
    verbose: bool,
    storage_format: StorageFormat,
}

impl IndexSettings {
    /// Resolves a model type through the model table.
    ///
    /// No weights are downloaded; quantized models only get a configured handle.
    ///
    /// # Errors
    /// Returns an error if a weights URL in the table cannot be parsed.
    pub fn resolve(model_type: ModelType, verbose: bool) -> Result<Self> {
        Self::builder(model_type).verbose(verbose).build()
    }

    /// Starts building settings for `model_type`.
    #[must_use]
    pub fn builder(model_type: ModelType) -> IndexSettingsBuilder {
        IndexSettingsBuilder::new(model_type)
    }

    #[must_use]
    pub const fn model_type(&self) -> ModelType {
        self.model_type
    }

    /// The resolved language model.
    #[must_use]
    pub const fn llm(&self) -> &LlmSettings {
        &self.llm
    }

    /// The resolved embedding backend.
    #[must_use]
    pub const fn embedding(&self) -> EmbedBackend {
        self.embedding
    }

    /// Tokens per chunk. Always [`DEFAULT_CHUNK_SIZE`].
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[must_use]
    pub const fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Whether index builds report per-document progress.
    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    /// Format used by `persist`.
    #[must_use]
    pub const fn storage_format(&self) -> StorageFormat {
        self.storage_format
    }

    /// The splitter indexes are built with.
    #[must_use]
    pub fn splitter(&self) -> SentenceSplitter {
        SentenceSplitter::default()
    }
}

/// Builder for [`IndexSettings`].
#[derive(Debug, Clone)]
pub struct IndexSettingsBuilder {
    model_type: ModelType,
    verbose: bool,
    storage_format: StorageFormat,
}

impl IndexSettingsBuilder {
    const fn new(model_type: ModelType) -> Self {
        Self {
            model_type,
            verbose: false,
            storage_format: StorageFormat::Json,
        }
    }

    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub const fn storage_format(mut self, format: StorageFormat) -> Self {
        self.storage_format = format;
        self
    }

    /// Resolves the model table row into concrete settings.
    ///
    /// # Errors
    /// Returns an error if a weights URL in the table cannot be parsed.
    pub fn build(self) -> Result<IndexSettings> {
        let profile = self.model_type.profile();
        let llm = match profile.llm {
            LlmSource::Default => LlmSettings::Default,
            LlmSource::Remote { url } => {
                LlmSettings::LlamaCpp(LlamaCpp::builder(url).verbose(self.verbose).build()?)
            }
        };

        tracing::debug!(
            model_type = profile.label,
            embedding = %profile.embedding,
            chunk_size = DEFAULT_CHUNK_SIZE,
            "resolved index settings"
        );

        Ok(IndexSettings {
            model_type: self.model_type,
            llm,
            embedding: profile.embedding,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            verbose: self.verbose,
            storage_format: self.storage_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragshelf_llama::DEFAULT_CONTEXT_WINDOW;

    #[test]
    fn every_model_type_resolves_with_fixed_chunk_size() {
        for model_type in ModelType::ALL {
            let settings = IndexSettings::resolve(model_type, false).unwrap();
            assert_eq!(settings.model_type(), model_type);
            assert_eq!(settings.chunk_size(), 512);
            assert_eq!(settings.splitter().chunk_size(), 512);
        }
    }

    #[test]
    fn default_uses_library_llm() {
        let settings = IndexSettings::resolve(ModelType::Default, false).unwrap();
        assert_eq!(settings.llm(), &LlmSettings::Default);
        assert_eq!(settings.embedding(), EmbedBackend::Default);
    }

    #[test]
    fn quantized_models_get_llama_handles() {
        let settings = IndexSettings::resolve(ModelType::Mixtral7bQ5, true).unwrap();
        let llama = settings.llm().llama().unwrap();
        assert_eq!(
            llama.weights().filename(),
            "mixtral-8x7b-instruct-v0.1.Q5_K_M.gguf"
        );
        assert_eq!(llama.context_window(), DEFAULT_CONTEXT_WINDOW);
        assert!(llama.verbose());
        assert_eq!(settings.embedding(), EmbedBackend::Local);
    }

    #[test]
    fn builder_sets_storage_format() {
        let settings = IndexSettings::builder(ModelType::Default)
            .storage_format(StorageFormat::Redb)
            .build()
            .unwrap();
        assert_eq!(settings.storage_format(), StorageFormat::Redb);
        assert!(!settings.verbose());
    }
}
