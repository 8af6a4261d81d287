//! Model-type labels and the table they resolve through.
//!
//! Each label selects where the language-model weights come from and which embedding backend
//! the index uses. The mapping lives in a single table so adding a model is a one-line change.

use std::fmt;
use std::str::FromStr;

use crate::error::IndexError;

/// A supported model configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelType {
    /// Library default language model with the remote embedding backend.
    #[default]
    Default,
    /// Llama 2 7B chat, 4-bit quantized.
    Llama2_7bQ4,
    /// Llama 2 7B chat, 5-bit quantized.
    Llama2_7bQ5,
    /// Llama 2 13B chat, 4-bit quantized.
    Llama2_13bQ4,
    /// Llama 2 13B chat, 5-bit quantized.
    Llama2_13bQ5,
    /// Mixtral 8x7B instruct, 4-bit quantized.
    Mixtral7bQ4,
    /// Mixtral 8x7B instruct, 5-bit quantized.
    Mixtral7bQ5,
}

/// Where the language-model weights come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmSource {
    /// Whatever the host library considers its default model.
    Default,
    /// GGUF weights downloaded from `url`.
    Remote {
        /// Hugging Face resolve URL of the weights file.
        url: &'static str,
    },
}

/// Which embedding backend encodes chunks and queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedBackend {
    /// Remote OpenAI-compatible embeddings.
    Default,
    /// Local ONNX embeddings.
    Local,
}

impl EmbedBackend {
    /// Name of the embedding model behind this backend.
    #[must_use]
    pub const fn model_name(self) -> &'static str {
        match self {
            Self::Default => "text-embedding-ada-002",
            Self::Local => "BAAI/bge-small-en-v1.5",
        }
    }

    /// Output dimension of [`model_name`](Self::model_name).
    #[must_use]
    pub const fn dimension(self) -> usize {
        match self {
            Self::Default => 1536,
            Self::Local => 384,
        }
    }
}

impl fmt::Display for EmbedBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Default => "default",
            Self::Local => "local",
        })
    }
}

/// One row of the model table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelProfile {
    /// The model type this row describes.
    pub model_type: ModelType,
    /// Label accepted on the command line and by [`ModelType::from_str`].
    pub label: &'static str,
    /// Language-model weights.
    pub llm: LlmSource,
    /// Embedding backend.
    pub embedding: EmbedBackend,
}

const fn remote(
    model_type: ModelType,
    label: &'static str,
    url: &'static str,
) -> ModelProfile {
    ModelProfile {
        model_type,
        label,
        llm: LlmSource::Remote { url },
        embedding: EmbedBackend::Local,
    }
}

/// Rows are ordered like the [`ModelType`] variants.
const MODEL_TABLE: [ModelProfile; 7] = [
    ModelProfile {
        model_type: ModelType::Default,
        label: "DEFAULT",
        llm: LlmSource::Default,
        embedding: EmbedBackend::Default,
    },
    remote(
        ModelType::Llama2_7bQ4,
        "LLAMA2-7B_Q4",
        "https://huggingface.co/TheBloke/Llama-2-7B-Chat-GGUF/resolve/main/llama-2-7b-chat.Q4_K_M.gguf",
    ),
    remote(
        ModelType::Llama2_7bQ5,
        "LLAMA2-7B_Q5",
        "https://huggingface.co/TheBloke/Llama-2-7B-Chat-GGUF/resolve/main/llama-2-7b-chat.Q5_K_M.gguf",
    ),
    remote(
        ModelType::Llama2_13bQ4,
        "LLAMA2-13B_Q4",
        "https://huggingface.co/TheBloke/Llama-2-13B-chat-GGUF/resolve/main/llama-2-13b-chat.Q4_K_M.gguf",
    ),
    remote(
        ModelType::Llama2_13bQ5,
        "LLAMA2-13B_Q5",
        "https://huggingface.co/TheBloke/Llama-2-13B-chat-GGUF/resolve/main/llama-2-13b-chat.Q5_K_M.gguf",
    ),
    remote(
        ModelType::Mixtral7bQ4,
        "MIXTRAL-7B_Q4",
        "https://huggingface.co/TheBloke/Mixtral-8x7B-Instruct-v0.1-GGUF/resolve/main/mixtral-8x7b-instruct-v0.1.Q4_K_M.gguf",
    ),
    remote(
        ModelType::Mixtral7bQ5,
        "MIXTRAL-7B_Q5",
        "https://huggingface.co/TheBloke/Mixtral-8x7B-Instruct-v0.1-GGUF/resolve/main/mixtral-8x7b-instruct-v0.1.Q5_K_M.gguf",
    ),
];

impl ModelType {
    /// Every supported model type, in table order.
    pub const ALL: [Self; 7] = [
        Self::Default,
        Self::Llama2_7bQ4,
        Self::Llama2_7bQ5,
        Self::Llama2_13bQ4,
        Self::Llama2_13bQ5,
        Self::Mixtral7bQ4,
        Self::Mixtral7bQ5,
    ];

    /// The table row for this model type.
    #[must_use]
    pub const fn profile(self) -> &'static ModelProfile {
        &MODEL_TABLE[self as usize]
    }

    /// The label this model type is selected by.
    #[must_use]
    pub const fn label(self) -> &'static str {
        self.profile().label
    }

    /// Resolves an optional label; `None` selects [`ModelType::Default`].
    ///
    /// # Errors
    /// Returns [`IndexError::UnsupportedModelType`] naming any unknown label.
    pub fn resolve(label: Option<&str>) -> Result<Self, IndexError> {
        label.map_or(Ok(Self::Default), str::parse)
    }
}

impl FromStr for ModelType {
    type Err = IndexError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        MODEL_TABLE
            .iter()
            .find(|row| row.label == label)
            .map(|row| row.model_type)
            .ok_or_else(|| IndexError::UnsupportedModelType(label.to_string()))
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rows_match_variants() {
        for model_type in ModelType::ALL {
            assert_eq!(model_type.profile().model_type, model_type);
        }
    }

    #[test]
    fn labels_round_trip() {
        for model_type in ModelType::ALL {
            assert_eq!(model_type.label().parse::<ModelType>().unwrap(), model_type);
            assert_eq!(model_type.to_string(), model_type.label());
        }
    }

    #[test]
    fn unknown_label_is_named_in_error() {
        let err = "GPT-9".parse::<ModelType>().unwrap_err();
        assert!(matches!(&err, IndexError::UnsupportedModelType(label) if label == "GPT-9"));
        assert!(err.to_string().contains("GPT-9"));
    }

    #[test]
    fn labels_are_case_sensitive() {
        assert!("llama2-7b_q4".parse::<ModelType>().is_err());
    }

    #[test]
    fn missing_label_selects_default() {
        assert_eq!(ModelType::resolve(None).unwrap(), ModelType::Default);
    }

    #[test]
    fn quantized_models_use_local_embeddings_and_remote_weights() {
        for model_type in &ModelType::ALL[1..] {
            let profile = model_type.profile();
            assert_eq!(profile.embedding, EmbedBackend::Local);
            let LlmSource::Remote { url } = profile.llm else {
                panic!("{model_type} has no weights url");
            };
            assert!(url.starts_with("https://huggingface.co/TheBloke/"));
            assert!(url.ends_with(".gguf"));
        }
    }

    #[test]
    fn default_profile() {
        let profile = ModelType::Default.profile();
        assert_eq!(profile.llm, LlmSource::Default);
        assert_eq!(profile.embedding, EmbedBackend::Default);
    }
}
