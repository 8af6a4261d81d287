//! Remote embedding backend for ragshelf.
//!
//! [`OpenAIEmbedding`] is the "default" embedding backend: it calls an OpenAI-compatible
//! `/embeddings` endpoint. Credentials and endpoint come from the environment by default:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `OPENAI_API_KEY` | required |
//! | `OPENAI_BASE_URL` | [`OPENAI_BASE_URL`] |
//! | `OPENAI_EMBEDDING_MODEL` | [`DEFAULT_EMBEDDING_MODEL`] |
//!
//! ```rust,no_run
//! use ragshelf_core::EmbeddingModel;
//! use ragshelf_openai::OpenAIEmbedding;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let embedder = OpenAIEmbedding::from_env()?;
//! let vector = embedder.embed("retrieval-augmented generation").await?;
//! assert_eq!(vector.len(), embedder.dim());
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::OpenAIError;

use ragshelf_core::EmbeddingModel;
use serde::{Deserialize, Serialize};

/// `OpenAI`'s public API base URL.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
/// Embedding model used when none is configured.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
/// Output dimension of [`DEFAULT_EMBEDDING_MODEL`].
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// Connection settings for an OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct Config {
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Creates a configuration for the public API with the default model.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIM,
        }
    }

    /// Reads `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `OPENAI_EMBEDDING_MODEL`.
    ///
    /// # Errors
    /// Returns [`OpenAIError::MissingApiKey`] when no key is set.
    pub fn from_env() -> Result<Self, OpenAIError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(OpenAIError::MissingApiKey)?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            config = config.base_url(base_url);
        }
        if let Ok(model) = std::env::var("OPENAI_EMBEDDING_MODEL") {
            config = config.model(model);
        }
        Ok(config)
    }

    /// Overrides the base URL, e.g. for a self-hosted compatible server.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Overrides the embedding model name.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into().trim().to_string();
        self
    }

    /// Overrides the expected embedding dimension.
    #[must_use]
    pub const fn dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    fn request_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Embedding model served by an OpenAI-compatible HTTP API.
#[derive(Debug, Clone)]
pub struct OpenAIEmbedding {
    config: Config,
    client: reqwest::Client,
}

impl OpenAIEmbedding {
    /// Creates an embedder from an explicit configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Creates an embedder configured from the environment.
    ///
    /// # Errors
    /// Returns [`OpenAIError::MissingApiKey`] when `OPENAI_API_KEY` is unset.
    pub fn from_env() -> Result<Self, OpenAIError> {
        Config::from_env().map(Self::new)
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    async fn embed_once(&self, input: &str) -> Result<Vec<f32>, OpenAIError> {
        let request = EmbeddingRequest {
            model: &self.config.model,
            input,
        };
        let response = self
            .client
            .post(self.config.request_url("/embeddings"))
            .bearer_auth(&self.config.api_key)
            .header(reqwest::header::USER_AGENT, "ragshelf-openai/0.1")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "embedding request rejected");
            return Err(OpenAIError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: EmbeddingResponse = response.json().await?;
        let vector = first_vector(body)?;
        if vector.len() != self.config.dimensions {
            return Err(OpenAIError::Dimension {
                expected: self.config.dimensions,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }
}

impl EmbeddingModel for OpenAIEmbedding {
    fn dim(&self) -> usize {
        self.config.dimensions
    }

    async fn embed(&self, text: &str) -> ragshelf_core::Result<Vec<f32>> {
        Ok(self.embed_once(text).await?)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

fn first_vector(response: EmbeddingResponse) -> Result<Vec<f32>, OpenAIError> {
    response
        .data
        .into_iter()
        .next()
        .map(|item| item.embedding)
        .ok_or(OpenAIError::EmptyResponse)
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_url_joins_without_double_slash() {
        let config = Config::new("sk-test").base_url("http://localhost:8080/v1/");
        assert_eq!(
            config.request_url("/embeddings"),
            "http://localhost:8080/v1/embeddings"
        );
    }

    #[test]
    fn defaults_target_ada() {
        let embedder = OpenAIEmbedding::new(Config::new("sk-test"));
        assert_eq!(embedder.dim(), DEFAULT_EMBEDDING_DIM);
        assert_eq!(embedder.name(), DEFAULT_EMBEDDING_MODEL);
    }

    #[test]
    fn debug_hides_api_key() {
        let rendered = format!("{:?}", Config::new("sk-secret"));
        assert!(!rendered.contains("sk-secret"));
    }

    #[test]
    fn parses_first_vector() {
        let body: EmbeddingResponse =
            serde_json::from_str(r#"{"data":[{"embedding":[0.5,-0.25]}],"model":"m"}"#).unwrap();
        assert_eq!(first_vector(body).unwrap(), vec![0.5, -0.25]);
    }

    #[test]
    fn empty_data_is_an_error() {
        let body: EmbeddingResponse = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert!(matches!(
            first_vector(body),
            Err(OpenAIError::EmptyResponse)
        ));
    }
}
