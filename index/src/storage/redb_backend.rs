//! redb single-file persistence.

use std::collections::BTreeMap;
use std::path::PathBuf;

use redb::{Database, ReadableTable, TableDefinition, TableError};

use crate::error::{IndexError, Result};
use crate::types::{Document, IndexEntry};

use super::{IndexStruct, Persistence, StorageContext, remove_if_exists};

const DOCS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("docs");
const ENTRIES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("entries");
const META_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");
const INDEX_STRUCT_KEY: &str = "index_struct";

/// Stores an index in one redb database inside the storage directory.
///
/// The database is opened for each operation and closed afterwards, so no file lock outlives
/// a save or load.
#[derive(Debug, Clone)]
pub struct RedbPersistence {
    dir: PathBuf,
}

impl RedbPersistence {
    /// Database file name inside the storage directory.
    pub const FILE_NAME: &'static str = "index.redb";

    /// Creates a backend rooted at `dir`. Nothing is touched until save or load.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file(&self) -> PathBuf {
        self.dir.join(Self::FILE_NAME)
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| IndexError::Serialization(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| IndexError::Serialization(e.to_string()))
}

impl Persistence for RedbPersistence {
    fn save(&self, storage: &StorageContext) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|err| IndexError::persistence(&self.dir, err))?;
        let db = Database::create(self.file()).map_err(IndexError::database)?;
        let write_txn = db.begin_write().map_err(IndexError::database)?;

        // Dropping the tables first makes a save replace the previous index entirely.
        for table in [DOCS_TABLE, ENTRIES_TABLE, META_TABLE] {
            write_txn.delete_table(table).map_err(IndexError::database)?;
        }

        {
            let mut docs = write_txn
                .open_table(DOCS_TABLE)
                .map_err(IndexError::database)?;
            for (id, doc) in &storage.docstore {
                docs.insert(id.as_str(), encode(doc)?.as_slice())
                    .map_err(IndexError::database)?;
            }

            let mut entries = write_txn
                .open_table(ENTRIES_TABLE)
                .map_err(IndexError::database)?;
            for entry in &storage.vector_store {
                entries
                    .insert(entry.chunk.id.as_str(), encode(entry)?.as_slice())
                    .map_err(IndexError::database)?;
            }

            let mut meta = write_txn
                .open_table(META_TABLE)
                .map_err(IndexError::database)?;
            meta.insert(INDEX_STRUCT_KEY, encode(&storage.index_struct)?.as_slice())
                .map_err(IndexError::database)?;
        }

        write_txn.commit().map_err(IndexError::database)
    }

    fn load(&self) -> Result<StorageContext> {
        let file = self.file();
        if !file.is_file() {
            return Err(IndexError::persistence(
                &file,
                std::io::Error::new(std::io::ErrorKind::NotFound, "index database not found"),
            ));
        }

        let db = Database::open(&file).map_err(IndexError::database)?;
        let read_txn = db.begin_read().map_err(IndexError::database)?;

        let meta = match read_txn.open_table(META_TABLE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => {
                return Err(IndexError::Database("index metadata missing".into()));
            }
            Err(e) => return Err(IndexError::database(e)),
        };
        let index_struct: IndexStruct = match meta
            .get(INDEX_STRUCT_KEY)
            .map_err(IndexError::database)?
        {
            Some(value) => decode(value.value())?,
            None => return Err(IndexError::Database("index metadata missing".into())),
        };

        let mut docstore = BTreeMap::new();
        let docs = read_txn
            .open_table(DOCS_TABLE)
            .map_err(IndexError::database)?;
        for row in docs.iter().map_err(IndexError::database)? {
            let (id, value) = row.map_err(IndexError::database)?;
            let doc: Document = decode(value.value())?;
            docstore.insert(id.value().to_string(), doc);
        }

        let mut vector_store = Vec::new();
        let entries = read_txn
            .open_table(ENTRIES_TABLE)
            .map_err(IndexError::database)?;
        for row in entries.iter().map_err(IndexError::database)? {
            let (_, value) = row.map_err(IndexError::database)?;
            let entry: IndexEntry = decode(value.value())?;
            vector_store.push(entry);
        }

        Ok(StorageContext {
            docstore,
            vector_store,
            index_struct,
        })
    }

    fn remove(&self) -> Result<()> {
        remove_if_exists(&self.file())
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
        let backend = RedbPersistence::new(dir.path());
        let context = sample_context("hello world");

        backend.save(&context).unwrap();
        assert!(dir.path().join(RedbPersistence::FILE_NAME).is_file());
        assert_eq!(backend.load().unwrap(), context);
    }

    #[test]
    fn overwrite_drops_stale_entries() {
        let dir = tempdir().unwrap();
        let backend = RedbPersistence::new(dir.path());

        let mut first = sample_context("first");
        let mut extra = first.vector_store[0].clone();
        extra.chunk.id = "doc#chunk_1".into();
        first.vector_store.push(extra);
        backend.save(&first).unwrap();

        backend.save(&sample_context("second")).unwrap();

        let loaded = backend.load().unwrap();
        assert_eq!(loaded.vector_store.len(), 1);
        assert_eq!(loaded.vector_store[0].chunk.text, "second");
    }

    #[test]
    fn missing_database() {
        let dir = tempdir().unwrap();
        let err = RedbPersistence::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, IndexError::Persistence { .. }));
    }

    #[test]
    fn remove_deletes_file() {
        let dir = tempdir().unwrap();
        let backend = RedbPersistence::new(dir.path());
        backend.save(&sample_context("x")).unwrap();
        backend.remove().unwrap();
        assert!(!dir.path().join(RedbPersistence::FILE_NAME).exists());
        backend.remove().unwrap();
    }
}
