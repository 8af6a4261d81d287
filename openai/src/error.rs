use thiserror::Error;

/// Errors that can arise when calling an OpenAI-compatible embeddings endpoint.
#[derive(Debug, Error)]
pub enum OpenAIError {
    /// No API key was configured and `OPENAI_API_KEY` is unset.
    #[error("missing API key: set OPENAI_API_KEY or configure one explicitly")]
    MissingApiKey,
    /// HTTP transport errors.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The endpoint answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message returned by the server.
        message: String,
    },
    /// The response was well-formed but carried no vector.
    #[error("embedding response missing vector data")]
    EmptyResponse,
    /// The returned vector does not match the configured dimension.
    #[error("embedding has {actual} dimensions, expected {expected}")]
    Dimension {
        /// Configured dimension.
        expected: usize,
        /// Returned dimension.
        actual: usize,
    },
}
