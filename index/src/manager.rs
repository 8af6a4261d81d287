//! Building, persisting and loading an index for a model type.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ragshelf_core::EmbeddingModel;

use crate::embedder::BackendEmbedder;
use crate::error::Result;
use crate::model_type::ModelType;
use crate::runtime::block_on;
use crate::settings::IndexSettings;
use crate::storage::{StorageContext, StorageFormat};
use crate::types::Document;
use crate::vector_index::VectorStoreIndex;

type EmbedderFactory<E> = Box<dyn FnOnce(&IndexSettings) -> E + Send>;

/// Configures an index for a model type and moves it to and from disk.
///
/// The manager resolves its model type once, at construction, into an [`IndexSettings`] it
/// owns. Two lifecycle operations follow:
///
/// - [`persist`](Self::persist) builds an index from the documents and writes it to the
///   storage directory.
/// - [`load`](Self::load) reads the index back if the storage directory exists.
///
/// Both are blocking. Missing inputs are not errors: either call logs and returns `Ok(None)`.
///
/// ```rust,no_run
/// use ragshelf_index::{Document, IndexManager};
///
/// # fn example() -> ragshelf_index::Result<()> {
/// let manager = IndexManager::new(
///     Some("./storage".into()),
///     Some(vec![Document::from("a test document")]),
///     Some("LLAMA2-7B_Q4"),
/// )?;
/// if let Some(index) = manager.load()? {
///     println!("loaded {} chunks", index.len());
/// } else {
///     manager.persist()?;
/// }
/// # Ok(())
/// # }
/// ```
pub struct IndexManager<E = BackendEmbedder> {
    storage_dir: Option<PathBuf>,
    documents: Option<Vec<Document>>,
    settings: IndexSettings,
    embedder: Arc<E>,
}

impl<E> std::fmt::Debug for IndexManager<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexManager")
            .field("storage_dir", &self.storage_dir)
            .field("documents", &self.documents.as_ref().map(Vec::len))
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl IndexManager {
    /// Creates a manager using the embedding backend of `model_type`.
    ///
    /// `None` selects `DEFAULT`. Nothing is downloaded here.
    ///
    /// # Errors
    /// Returns [`IndexError::UnsupportedModelType`](crate::IndexError::UnsupportedModelType)
    /// naming an unknown label.
    pub fn new(
        storage_dir: Option<PathBuf>,
        documents: Option<Vec<Document>>,
        model_type: Option<&str>,
    ) -> Result<Self> {
        let mut builder = Self::builder();
        builder.storage_dir = storage_dir;
        builder.documents = documents;
        builder.model_type = model_type.map(str::to_string);
        builder.build()
    }

    /// Starts configuring a manager.
    #[must_use]
    pub fn builder() -> IndexManagerBuilder {
        IndexManagerBuilder::new()
    }
}

impl<E: EmbeddingModel> IndexManager<E> {
    /// Builds an index from the documents and writes it to the storage directory.
    ///
    /// Returns `Ok(None)` without touching the disk when there are no documents or no storage
    /// directory. Otherwise any previous index in the directory is replaced.
    ///
    /// # Errors
    /// Chunking, embedding and write failures propagate unchanged.
    pub fn persist(&self) -> Result<Option<VectorStoreIndex<E>>> {
        let (Some(dir), Some(documents)) = (&self.storage_dir, &self.documents) else {
            tracing::info!("no documents or storage directory given; index not built");
            return Ok(None);
        };
        if documents.is_empty() {
            tracing::info!(path = %dir.display(), "no documents given; index not built");
            return Ok(None);
        }

        tracing::info!(
            path = %dir.display(),
            documents = documents.len(),
            model_type = %self.settings.model_type(),
            "building index"
        );
        let index = block_on(VectorStoreIndex::from_documents(
            documents.clone(),
            Arc::clone(&self.embedder),
            self.settings.splitter(),
            self.settings.verbose(),
        ))??;

        let format = self.settings.storage_format();
        index.persist(dir, format)?;
        tracing::info!(path = %dir.display(), %format, chunks = index.len(), "persisted index");
        Ok(Some(index))
    }

    /// Loads the index from the storage directory.
    ///
    /// Returns `Ok(None)` when no storage directory was given or it does not exist.
    ///
    /// # Errors
    /// Returns an error if the directory exists but does not hold a readable index built with
    /// an embedder of this manager's dimension.
    pub fn load(&self) -> Result<Option<VectorStoreIndex<E>>> {
        let Some(dir) = self.storage_dir.as_deref().filter(|dir| dir.exists()) else {
            tracing::info!(
                path = ?self.storage_dir,
                "storage directory does not exist; nothing to load"
            );
            return Ok(None);
        };

        let storage = StorageContext::from_defaults(dir)?;
        let index = VectorStoreIndex::from_storage(storage, Arc::clone(&self.embedder))?;
        tracing::info!(path = %dir.display(), chunks = index.len(), "loaded index");
        Ok(Some(index))
    }

    /// Downloads the language-model weights of a quantized model type.
    ///
    /// Returns `Ok(None)` for model types using the default language model.
    ///
    /// # Errors
    /// Returns an error if the download fails.
    pub fn fetch_llm(&self) -> Result<Option<PathBuf>> {
        match self.settings.llm().llama() {
            Some(model) => Ok(Some(model.fetch()?)),
            None => Ok(None),
        }
    }

    /// The resolved settings.
    #[must_use]
    pub const fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    #[must_use]
    pub fn storage_dir(&self) -> Option<&Path> {
        self.storage_dir.as_deref()
    }

    #[must_use]
    pub fn documents(&self) -> Option<&[Document]> {
        self.documents.as_deref()
    }

    /// The embedder indexes are built and loaded with.
    #[must_use]
    pub const fn embedder(&self) -> &Arc<E> {
        &self.embedder
    }
}

/// Builder for [`IndexManager`].
pub struct IndexManagerBuilder<E = BackendEmbedder> {
    storage_dir: Option<PathBuf>,
    documents: Option<Vec<Document>>,
    model_type: Option<String>,
    storage_format: StorageFormat,
    verbose: Option<bool>,
    embedder: EmbedderFactory<E>,
}

impl<E> std::fmt::Debug for IndexManagerBuilder<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexManagerBuilder")
            .field("storage_dir", &self.storage_dir)
            .field("model_type", &self.model_type)
            .field("storage_format", &self.storage_format)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl IndexManagerBuilder {
    fn new() -> Self {
        Self {
            storage_dir: None,
            documents: None,
            model_type: None,
            storage_format: StorageFormat::default(),
            verbose: None,
            embedder: Box::new(|settings| BackendEmbedder::new(settings.embedding())),
        }
    }
}

impl<E: EmbeddingModel> IndexManagerBuilder<E> {
    /// Directory the index is persisted to and loaded from.
    #[must_use]
    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Documents to build the index from.
    #[must_use]
    pub fn documents<I, D>(mut self, documents: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<Document>,
    {
        self.documents = Some(documents.into_iter().map(Into::into).collect());
        self
    }

    /// Model-type label, e.g. `LLAMA2-13B_Q5`. Defaults to `DEFAULT`.
    #[must_use]
    pub fn model_type(mut self, label: impl Into<String>) -> Self {
        self.model_type = Some(label.into());
        self
    }

    #[must_use]
    pub const fn storage_format(mut self, format: StorageFormat) -> Self {
        self.storage_format = format;
        self
    }

    /// Overrides verbosity. By default it follows whether debug logging is enabled.
    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Uses `embedder` instead of the model type's backend.
    #[must_use]
    pub fn embedder<F: EmbeddingModel + 'static>(self, embedder: F) -> IndexManagerBuilder<F> {
        IndexManagerBuilder {
            storage_dir: self.storage_dir,
            documents: self.documents,
            model_type: self.model_type,
            storage_format: self.storage_format,
            verbose: self.verbose,
            embedder: Box::new(move |_| embedder),
        }
    }

    /// Resolves the model type and creates the manager.
    ///
    /// # Errors
    /// Returns [`IndexError::UnsupportedModelType`](crate::IndexError::UnsupportedModelType)
    /// naming an unknown label.
    pub fn build(self) -> Result<IndexManager<E>> {
        let model_type = ModelType::resolve(self.model_type.as_deref())?;
        let verbose = self
            .verbose
            .unwrap_or_else(|| tracing::enabled!(tracing::Level::DEBUG));
        let settings = IndexSettings::builder(model_type)
            .verbose(verbose)
            .storage_format(self.storage_format)
            .build()?;
        let embedder = Arc::new((self.embedder)(&settings));

        tracing::debug!(
            model_type = %model_type,
            embed_model = embedder.name(),
            storage_dir = ?self.storage_dir,
            "created index manager"
        );
        Ok(IndexManager {
            storage_dir: self.storage_dir,
            documents: self.documents,
            settings,
            embedder,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IndexError;
    use crate::model_type::EmbedBackend;
    use crate::vector_index::tests::HashEmbedder;
    use std::fs;
    use tempfile::tempdir;

    const LABELS: [&str; 7] = [
        "DEFAULT",
        "LLAMA2-7B_Q4",
        "LLAMA2-7B_Q5",
        "LLAMA2-13B_Q4",
        "LLAMA2-13B_Q5",
        "MIXTRAL-7B_Q4",
        "MIXTRAL-7B_Q5",
    ];

    fn manager(
        dir: Option<&Path>,
        docs: Option<Vec<&str>>,
    ) -> IndexManager<HashEmbedder> {
        let mut builder = IndexManager::builder()
            .model_type("LLAMA2-7B_Q4")
            .embedder(HashEmbedder { dim: 32 });
        if let Some(dir) = dir {
            builder = builder.storage_dir(dir);
        }
        if let Some(docs) = docs {
            builder = builder.documents(docs);
        }
        builder.build().unwrap()
    }

    #[test]
    fn every_label_constructs_without_downloading() {
        for label in LABELS {
            let manager = IndexManager::new(None, None, Some(label)).unwrap();
            let settings = manager.settings();
            assert_eq!(settings.model_type().label(), label);
            assert_eq!(settings.chunk_size(), 512);
            assert_eq!(manager.embedder().backend(), settings.embedding());
        }
    }

    #[test]
    fn missing_label_is_default() {
        let manager = IndexManager::new(None, None, None).unwrap();
        assert_eq!(manager.settings().model_type(), ModelType::Default);
        assert_eq!(manager.settings().embedding(), EmbedBackend::Default);
    }

    #[test]
    fn unknown_label_fails_naming_it() {
        let err = IndexManager::new(None, None, Some("LLAMA3-70B")).unwrap_err();
        assert!(matches!(&err, IndexError::UnsupportedModelType(label) if label == "LLAMA3-70B"));
    }

    #[test]
    fn managers_keep_their_own_settings() {
        let a = IndexManager::new(None, None, Some("DEFAULT")).unwrap();
        let b = IndexManager::new(None, None, Some("MIXTRAL-7B_Q4")).unwrap();
        assert_eq!(a.settings().embedding(), EmbedBackend::Default);
        assert_eq!(b.settings().embedding(), EmbedBackend::Local);
        assert!(a.settings().llm().llama().is_none());
        assert!(b.settings().llm().llama().is_some());
    }

    #[test]
    fn persist_without_documents_is_a_no_op() {
        let dir = tempdir().unwrap();
        assert!(manager(Some(dir.path()), None).persist().unwrap().is_none());
        assert!(manager(Some(dir.path()), Some(vec![])).persist().unwrap().is_none());
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn persist_without_storage_dir_is_a_no_op() {
        let manager = manager(None, Some(vec!["a test document"]));
        assert!(manager.persist().unwrap().is_none());
    }

    #[test]
    fn persist_then_load_answers_identically() {
        let dir = tempdir().unwrap();
        let storage = dir.path().join("storage");
        let built = manager(Some(&storage), Some(vec!["a test document"]))
            .persist()
            .unwrap()
            .unwrap();
        assert!(storage.join("index_store.json").is_file());

        let loaded = manager(Some(&storage), None).load().unwrap().unwrap();
        let before = block_on(built.retrieve("test", 1)).unwrap().unwrap();
        let after = block_on(loaded.retrieve("test", 1)).unwrap().unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(before[0].chunk, after[0].chunk);
        assert_eq!(after[0].chunk.text, "a test document");
        assert!((before[0].score - after[0].score).abs() < f32::EPSILON);
    }

    #[test]
    fn load_missing_directory_is_none() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("never-built");
        assert!(manager(Some(&missing), None).load().unwrap().is_none());
        assert!(manager(None, None).load().unwrap().is_none());
        assert!(!missing.exists());
    }

    #[test]
    fn load_empty_directory_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(manager(Some(dir.path()), None).load().is_err());
    }

    #[test]
    fn last_persist_wins() {
        let dir = tempdir().unwrap();
        manager(Some(dir.path()), Some(vec!["the first document"]))
            .persist()
            .unwrap();
        manager(Some(dir.path()), Some(vec!["a replacement"]))
            .persist()
            .unwrap();

        let loaded = manager(Some(dir.path()), None).load().unwrap().unwrap();
        assert_eq!(loaded.ref_doc_ids(), vec![Document::from("a replacement").id]);
        assert_eq!(loaded.len(), 1);
        let hits = block_on(loaded.retrieve("first document", 5)).unwrap().unwrap();
        assert_eq!(hits[0].chunk.text, "a replacement");
    }

    #[test]
    fn redb_format_round_trip() {
        let dir = tempdir().unwrap();
        let build = |docs: Option<Vec<&str>>| {
            let mut builder = IndexManager::builder()
                .storage_dir(dir.path())
                .storage_format(StorageFormat::Redb)
                .embedder(HashEmbedder { dim: 32 });
            if let Some(docs) = docs {
                builder = builder.documents(docs);
            }
            builder.build().unwrap()
        };

        build(Some(vec!["stored in redb"])).persist().unwrap();
        assert!(dir.path().join("index.redb").is_file());
        assert!(!dir.path().join("index_store.json").exists());

        let loaded = build(None).load().unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn load_with_mismatched_embedder_fails() {
        let dir = tempdir().unwrap();
        manager(Some(dir.path()), Some(vec!["a test document"]))
            .persist()
            .unwrap();

        let other = IndexManager::builder()
            .storage_dir(dir.path())
            .embedder(HashEmbedder { dim: 16 })
            .build()
            .unwrap();
        assert!(matches!(
            other.load(),
            Err(IndexError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn default_model_has_no_weights_to_fetch() {
        let manager = IndexManager::new(None, None, None).unwrap();
        assert!(manager.fetch_llm().unwrap().is_none());
    }

    #[test]
    fn verbosity_follows_debug_logging() {
        let build = || IndexManager::new(None, None, Some("LLAMA2-13B_Q4")).unwrap();

        let debug = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let manager = tracing::subscriber::with_default(debug, build);
        assert!(manager.settings().verbose());
        assert!(manager.settings().llm().llama().unwrap().verbose());

        let info = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .finish();
        let manager = tracing::subscriber::with_default(info, build);
        assert!(!manager.settings().verbose());
        assert!(!manager.settings().llm().llama().unwrap().verbose());
    }

    #[test]
    fn duplicate_texts_index_once() {
        let dir = tempdir().unwrap();
        let index = manager(Some(dir.path()), Some(vec!["same", "same"]))
            .persist()
            .unwrap()
            .unwrap();
        assert_eq!(index.ref_doc_ids(), vec![Document::from("same").id]);
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn blocking_api_works_inside_current_thread_runtime() {
        let dir = tempdir().unwrap();
        let index = manager(Some(dir.path()), Some(vec!["single threaded callers"]))
            .persist()
            .unwrap();
        assert!(index.is_some());
        assert_eq!(
            manager(Some(dir.path()), None).load().unwrap().unwrap().len(),
            1
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn blocking_api_works_inside_runtime() {
        let dir = tempdir().unwrap();
        let index = manager(Some(dir.path()), Some(vec!["async callers"]))
            .persist()
            .unwrap();
        assert!(index.is_some());
        assert!(manager(Some(dir.path()), None).load().unwrap().is_some());
    }
}
