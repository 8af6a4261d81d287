use ragshelf_core::Role;
use thiserror::Error;

/// Errors raised while configuring a llama.cpp model handle.
#[derive(Debug, Error)]
pub enum LlamaError {
    /// The weights URL could not be parsed.
    #[error("invalid model url {url}: {source}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
    /// The URL does not point at a file on the Hugging Face hub.
    #[error("not a Hugging Face resolve url: {0}")]
    NotHubUrl(String),
    /// Downloading the weights failed.
    #[error("failed to download {file} from {repo}: {source}")]
    Download {
        /// Hub repository id.
        repo: String,
        /// File inside the repository.
        file: String,
        /// Underlying hub error.
        #[source]
        source: hf_hub::api::sync::ApiError,
    },
    /// A conversation cannot be rendered with the Llama 2 chat template.
    #[error("message {index} has role {found:?}, expected {expected:?}")]
    PromptOrder {
        /// Position of the offending message (after any leading system message).
        index: usize,
        /// Role the template requires at this position.
        expected: Role,
        /// Role actually found.
        found: Role,
    },
    /// The conversation holds no user message.
    #[error("conversation has no user message")]
    EmptyConversation,
}
