//! The embedder selected by a model type.

use std::sync::OnceLock;

use parking_lot::Mutex;
use ragshelf_core::EmbeddingModel;
use ragshelf_openai::OpenAIEmbedding;
use ragshelf_ort::{BGE_SMALL_EN_V15, OrtEmbedding};

use crate::model_type::EmbedBackend;

enum Backend {
    Local(OrtEmbedding),
    Remote(OpenAIEmbedding),
}

/// Embeds with the backend named by an [`EmbedBackend`], loading it on first use.
///
/// Creating one is free: the local model is only downloaded and the remote credentials only
/// read when the first text is embedded. [`dim`](EmbeddingModel::dim) and
/// [`name`](EmbeddingModel::name) are known up front.
pub struct BackendEmbedder {
    backend: EmbedBackend,
    loaded: OnceLock<Backend>,
    loading: Mutex<()>,
}

impl std::fmt::Debug for BackendEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendEmbedder")
            .field("backend", &self.backend)
            .field("loaded", &self.loaded.get().is_some())
            .finish()
    }
}

impl BackendEmbedder {
    /// Creates an embedder for `backend` without loading it.
    #[must_use]
    pub fn new(backend: EmbedBackend) -> Self {
        Self {
            backend,
            loaded: OnceLock::new(),
            loading: Mutex::new(()),
        }
    }

    /// The backend this embedder uses.
    #[must_use]
    pub const fn backend(&self) -> EmbedBackend {
        self.backend
    }

    fn load(&self) -> ragshelf_core::Result<&Backend> {
        if let Some(backend) = self.loaded.get() {
            return Ok(backend);
        }
        let _guard = self.loading.lock();
        if let Some(backend) = self.loaded.get() {
            return Ok(backend);
        }

        tracing::info!(
            backend = %self.backend,
            model = self.backend.model_name(),
            "loading embedding model"
        );
        let backend = match self.backend {
            EmbedBackend::Local => Backend::Local(OrtEmbedding::from_hub(BGE_SMALL_EN_V15)?),
            EmbedBackend::Default => Backend::Remote(OpenAIEmbedding::from_env()?),
        };
        Ok(self.loaded.get_or_init(|| backend))
    }
}

impl EmbeddingModel for BackendEmbedder {
    fn dim(&self) -> usize {
        self.backend.dimension()
    }

    async fn embed(&self, text: &str) -> ragshelf_core::Result<Vec<f32>> {
        match self.load()? {
            Backend::Local(model) => model.embed(text).await,
            Backend::Remote(model) => model.embed(text).await,
        }
    }

    fn name(&self) -> &str {
        self.backend.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_known_before_loading() {
        let local = BackendEmbedder::new(EmbedBackend::Local);
        assert_eq!(local.dim(), 384);
        assert_eq!(local.name(), BGE_SMALL_EN_V15);

        let remote = BackendEmbedder::new(EmbedBackend::Default);
        assert_eq!(remote.dim(), ragshelf_openai::DEFAULT_EMBEDDING_DIM);
        assert_eq!(remote.name(), ragshelf_openai::DEFAULT_EMBEDDING_MODEL);
        assert!(format!("{remote:?}").contains("loaded: false"));
    }
}
