//! JSON directory persistence.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};
use crate::types::{Document, IndexEntry};

use super::{IndexStruct, Persistence, StorageContext, remove_if_exists};

#[derive(Serialize, Deserialize)]
struct DocStoreFile {
    docs: BTreeMap<String, Document>,
}

#[derive(Serialize, Deserialize)]
struct VectorStoreFile {
    entries: Vec<IndexEntry>,
}

/// Stores an index as three JSON files in a directory.
#[derive(Debug, Clone)]
pub struct JsonPersistence {
    dir: PathBuf,
}

impl JsonPersistence {
    /// Source documents.
    pub const DOC_STORE: &'static str = "docstore.json";
    /// Chunks and embeddings.
    pub const VECTOR_STORE: &'static str = "vector_store.json";
    /// Index metadata.
    pub const INDEX_STORE: &'static str = "index_store.json";

    /// Creates a backend rooted at `dir`. Nothing is touched until save or load.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn write<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let bytes =
            serde_json::to_vec(value).map_err(|e| IndexError::Serialization(e.to_string()))?;
        fs::write(&path, bytes).map_err(|err| IndexError::persistence(&path, err))
    }

    fn read<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let bytes = fs::read(&path).map_err(|err| IndexError::persistence(&path, err))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| IndexError::Serialization(format!("{}: {e}", path.display())))
    }
}

impl Persistence for JsonPersistence {
    fn save(&self, storage: &StorageContext) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|err| IndexError::persistence(&self.dir, err))?;

        self.write(
            Self::DOC_STORE,
            &DocStoreFile {
                docs: storage.docstore.clone(),
            },
        )?;
        self.write(
            Self::VECTOR_STORE,
            &VectorStoreFile {
                entries: storage.vector_store.clone(),
            },
        )?;
        // Written last: its presence marks a complete index.
        self.write(Self::INDEX_STORE, &storage.index_struct)
    }

    fn load(&self) -> Result<StorageContext> {
        let index_struct: IndexStruct = self.read(Self::INDEX_STORE)?;
        let docs: DocStoreFile = self.read(Self::DOC_STORE)?;
        let vectors: VectorStoreFile = self.read(Self::VECTOR_STORE)?;

        Ok(StorageContext {
            docstore: docs.docs,
            vector_store: vectors.entries,
            index_struct,
        })
    }

    fn remove(&self) -> Result<()> {
        for name in [Self::INDEX_STORE, Self::DOC_STORE, Self::VECTOR_STORE] {
            remove_if_exists(&self.dir.join(name))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::sample_context;
    use tempfile::tempdir;

    #[test]
    fn save_and_load() {
        let dir = tempdir().unwrap();
        let backend = JsonPersistence::new(dir.path());
        let context = sample_context("hello world");

        backend.save(&context).unwrap();
        for name in [
            JsonPersistence::DOC_STORE,
            JsonPersistence::VECTOR_STORE,
            JsonPersistence::INDEX_STORE,
        ] {
            assert!(dir.path().join(name).is_file(), "{name} missing");
        }
        assert_eq!(backend.load().unwrap(), context);
    }

    #[test]
    fn overwrite_replaces_everything() {
        let dir = tempdir().unwrap();
        let backend = JsonPersistence::new(dir.path());

        backend.save(&sample_context("first")).unwrap();
        backend.save(&sample_context("second")).unwrap();

        let loaded = backend.load().unwrap();
        assert_eq!(loaded.vector_store.len(), 1);
        assert_eq!(loaded.vector_store[0].chunk.text, "second");
    }

    #[test]
    fn missing_index_store() {
        let dir = tempdir().unwrap();
        let err = JsonPersistence::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, IndexError::Persistence { .. }));
    }

    #[test]
    fn corrupted_file() {
        let dir = tempdir().unwrap();
        let backend = JsonPersistence::new(dir.path());
        backend.save(&sample_context("x")).unwrap();
        fs::write(dir.path().join(JsonPersistence::VECTOR_STORE), b"{not json").unwrap();

        assert!(matches!(
            backend.load(),
            Err(IndexError::Serialization(_))
        ));
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempdir().unwrap();
        let backend = JsonPersistence::new(dir.path());
        backend.save(&sample_context("x")).unwrap();
        backend.remove().unwrap();
        backend.remove().unwrap();
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
