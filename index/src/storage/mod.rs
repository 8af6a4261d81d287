//! On-disk storage for built indexes.
//!
//! A [`StorageContext`] is everything needed to rebuild an index: the source documents, every
//! chunk with its embedding, and an [`IndexStruct`] describing how they were produced. It can be
//! written in two formats:
//!
//! | Format | Files in the storage directory |
//! |--------|--------------------------------|
//! | [`StorageFormat::Json`] | `docstore.json`, `vector_store.json`, `index_store.json` |
//! | [`StorageFormat::Redb`] | `index.redb` |
//!
//! Writing one format removes the other's files, so a directory only ever holds one index.

mod json_backend;
mod redb_backend;

pub use json_backend::JsonPersistence;
pub use redb_backend::RedbPersistence;

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};
use crate::types::{Document, IndexEntry};

/// Version written into [`IndexStruct::version`].
pub const STORAGE_VERSION: u32 = 1;

/// Supported storage formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageFormat {
    /// Three JSON files.
    #[default]
    Json,
    /// A single redb database file.
    Redb,
}

impl StorageFormat {
    /// Detects the format of an existing storage directory.
    #[must_use]
    pub fn detect(dir: &Path) -> Self {
        if dir.join(RedbPersistence::FILE_NAME).is_file() {
            Self::Redb
        } else {
            Self::Json
        }
    }

    /// The backend for this format rooted at `dir`.
    #[must_use]
    pub fn backend(self, dir: &Path) -> Box<dyn Persistence> {
        match self {
            Self::Json => Box::new(JsonPersistence::new(dir)),
            Self::Redb => Box::new(RedbPersistence::new(dir)),
        }
    }
}

impl fmt::Display for StorageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Redb => "redb",
        })
    }
}

impl FromStr for StorageFormat {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "redb" => Ok(Self::Redb),
            other => Err(IndexError::Serialization(format!(
                "unknown storage format: {other}"
            ))),
        }
    }
}

/// How an index was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStruct {
    /// Storage layout version.
    pub version: u32,
    /// Name of the embedding model that produced the vectors.
    pub embed_model: String,
    /// Embedding dimension.
    pub dimension: usize,
    /// Tokens per chunk.
    pub chunk_size: usize,
    /// Tokens shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Ids of the indexed documents, in insertion order.
    pub ref_doc_ids: Vec<String>,
}

/// Documents, vectors and index metadata of one index.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageContext {
    /// Source documents by id.
    pub docstore: BTreeMap<String, Document>,
    /// Chunk embeddings.
    pub vector_store: Vec<IndexEntry>,
    /// Index metadata.
    pub index_struct: IndexStruct,
}

impl StorageContext {
    /// Reads the index stored in `dir`, detecting its format.
    ///
    /// # Errors
    /// Returns an error if the directory holds no index or its files cannot be parsed.
    pub fn from_defaults(dir: &Path) -> Result<Self> {
        let format = StorageFormat::detect(dir);
        tracing::debug!(path = %dir.display(), %format, "reading storage context");
        format.backend(dir).load()
    }

    /// Writes this context to `dir` in `format`, replacing whatever was there.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created or written.
    pub fn persist(&self, dir: &Path, format: StorageFormat) -> Result<()> {
        fs::create_dir_all(dir).map_err(|err| IndexError::persistence(dir, err))?;
        format.backend(dir).save(self)?;

        let stale = match format {
            StorageFormat::Json => StorageFormat::Redb,
            StorageFormat::Redb => StorageFormat::Json,
        };
        stale.backend(dir).remove()?;

        tracing::debug!(
            path = %dir.display(),
            %format,
            chunks = self.vector_store.len(),
            "wrote storage context"
        );
        Ok(())
    }
}

/// A storage format backend.
pub trait Persistence: Send + Sync + fmt::Debug {
    /// Writes `storage`, replacing any previous contents of this backend.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn save(&self, storage: &StorageContext) -> Result<()>;

    /// Reads the stored context.
    ///
    /// # Errors
    /// Returns an error if nothing is stored or the stored data is malformed.
    fn load(&self) -> Result<StorageContext>;

    /// Deletes this backend's files. Missing files are not an error.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be deleted.
    fn remove(&self) -> Result<()>;
}

pub(crate) fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(IndexError::persistence(path, err)),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::hash::content_hash;
    use crate::types::{Chunk, Metadata};
    use tempfile::tempdir;

    pub(crate) fn sample_context(text: &str) -> StorageContext {
        let doc = Document::new("doc", text);
        let chunk = Chunk::with_metadata(
            Chunk::id_for("doc", 0),
            text,
            "doc",
            0,
            content_hash(text),
            Metadata::new(),
        );
        StorageContext {
            docstore: BTreeMap::from([(doc.id.clone(), doc)]),
            vector_store: vec![IndexEntry::new(chunk, vec![0.5, 0.5])],
            index_struct: IndexStruct {
                version: STORAGE_VERSION,
                embed_model: "mock".into(),
                dimension: 2,
                chunk_size: 512,
                chunk_overlap: 20,
                ref_doc_ids: vec!["doc".into()],
            },
        }
    }

    #[test]
    fn switching_formats_removes_stale_files() {
        let dir = tempdir().unwrap();
        let context = sample_context("hello");

        context.persist(dir.path(), StorageFormat::Redb).unwrap();
        assert_eq!(StorageFormat::detect(dir.path()), StorageFormat::Redb);

        context.persist(dir.path(), StorageFormat::Json).unwrap();
        assert_eq!(StorageFormat::detect(dir.path()), StorageFormat::Json);
        assert!(!dir.path().join(RedbPersistence::FILE_NAME).exists());
        assert_eq!(StorageContext::from_defaults(dir.path()).unwrap(), context);

        context.persist(dir.path(), StorageFormat::Redb).unwrap();
        assert!(!dir.path().join(JsonPersistence::INDEX_STORE).exists());
        assert_eq!(StorageContext::from_defaults(dir.path()).unwrap(), context);
    }

    #[test]
    fn every_backend_saves_loads_and_removes() {
        for format in [StorageFormat::Json, StorageFormat::Redb] {
            let dir = tempdir().unwrap();
            let backend = format.backend(dir.path());
            let context = sample_context(&format.to_string());

            backend.save(&context).unwrap();
            assert_eq!(StorageFormat::detect(dir.path()), format);
            assert_eq!(backend.load().unwrap(), context);

            backend.remove().unwrap();
            assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
            assert!(backend.load().is_err());
        }
    }

    #[test]
    fn persist_creates_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        sample_context("x")
            .persist(&nested, StorageFormat::Json)
            .unwrap();
        assert!(nested.join(JsonPersistence::INDEX_STORE).is_file());
    }

    #[test]
    fn empty_directory_is_not_an_index() {
        let dir = tempdir().unwrap();
        assert!(StorageContext::from_defaults(dir.path()).is_err());
    }

    #[test]
    fn format_names() {
        assert_eq!("JSON".parse::<StorageFormat>().unwrap(), StorageFormat::Json);
        assert_eq!(StorageFormat::Redb.to_string(), "redb");
        assert!("parquet".parse::<StorageFormat>().is_err());
    }
}
