//! redb-based storage engine.
//!
//! This crate provides [`RedbEngine`], an implementation of
//! [`announce_storage::KvEngine`] backed by the redb embedded database.
//! Every [`WriteBatch`] commits as one redb write transaction.

use std::path::{Path, PathBuf};

use announce_storage::{BatchOp, DatabaseError, KvEngine, WriteBatch, WriteDurability};
use redb::backends::InMemoryBackend;
use redb::{Database, Durability, ReadableTable, TableDefinition};
use tracing::debug;

/// Single byte-keyed table holding every namespace. Callers separate their
/// rows with key prefixes.
const KV_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("kv");

/// Options for opening a [`RedbEngine`].
#[derive(Clone, Debug, Default)]
pub struct RedbConfig {
    /// Database file. `None` opens an ephemeral in-memory database.
    pub path: Option<PathBuf>,
    /// Page cache size in bytes. `None` keeps the redb default.
    pub cache_size: Option<usize>,
    /// Durability applied to every committed batch.
    pub durability: WriteDurability,
}

impl RedbConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }
}

/// redb-based engine.
///
/// Uses redb for ACID-compliant storage. Thread-safe for concurrent reads
/// and writes; writers are serialized by redb itself. A database file can be
/// held open by only one handle at a time, so a second open of the same path
/// fails instead of corrupting data.
pub struct RedbEngine {
    db: Database,
    durability: Durability,
    in_memory: bool,
}

impl RedbEngine {
    /// Open or create an engine as described by `config`.
    pub fn open(config: &RedbConfig) -> Result<Self, DatabaseError> {
        let mut builder = Database::builder();
        if let Some(cache_size) = config.cache_size {
            builder.set_cache_size(cache_size);
        }

        let db = match &config.path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)
                        .map_err(|err| DatabaseError::Open(err.to_string()))?;
                }
                builder.create(path)?
            }
            None => builder.create_with_backend(InMemoryBackend::new())?,
        };

        // Ensure the table exists so read transactions never see it missing
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(KV_TABLE)?;
        }
        write_txn.commit()?;

        debug!(path = ?config.path, "Opened redb engine");
        Ok(Self {
            db,
            durability: match config.durability {
                WriteDurability::Immediate => Durability::Immediate,
                WriteDurability::Eventual => Durability::Eventual,
            },
            in_memory: config.path.is_none(),
        })
    }

    /// Open or create a persistent engine at `path`.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        Self::open(&RedbConfig::at_path(path.as_ref()))
    }

    /// Open an ephemeral in-memory engine.
    pub fn in_memory() -> Result<Self, DatabaseError> {
        Self::open(&RedbConfig::in_memory())
    }

    /// Whether this engine discards its contents when dropped.
    pub fn is_in_memory(&self) -> bool {
        self.in_memory
    }
}

impl std::fmt::Debug for RedbEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbEngine")
            .field("durability", &self.durability)
            .field("in_memory", &self.in_memory)
            .finish_non_exhaustive()
    }
}

impl KvEngine for RedbEngine {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, DatabaseError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(KV_TABLE)?;
        match table.get(key)? {
            Some(value) => Ok(Some(value.value().to_vec())),
            None => Ok(None),
        }
    }

    fn for_each_prefix<F, E>(&self, prefix: &[u8], mut visit: F) -> Result<(), E>
    where
        F: FnMut(&[u8], &[u8]) -> Result<(), E>,
        E: From<DatabaseError>,
    {
        let read_txn = self.db.begin_read().map_err(DatabaseError::from)?;
        let table = read_txn.open_table(KV_TABLE).map_err(DatabaseError::from)?;

        for entry in table.range::<&[u8]>(prefix..).map_err(DatabaseError::from)? {
            let (key, value) = entry.map_err(DatabaseError::from)?;
            if !key.value().starts_with(prefix) {
                break;
            }
            visit(key.value(), value.value())?;
        }

        Ok(())
    }

    fn write(&self, batch: WriteBatch) -> Result<(), DatabaseError> {
        let mut write_txn = self.db.begin_write()?;
        write_txn.set_durability(self.durability);
        {
            let mut table = write_txn.open_table(KV_TABLE)?;
            for op in batch {
                match op {
                    BatchOp::Put { key, value } => {
                        table
                            .insert(key.as_slice(), value.as_slice())
                            .map_err(|err| DatabaseError::Write(err.to_string()))?;
                    }
                    BatchOp::Delete { key } => {
                        table
                            .remove(key.as_slice())
                            .map_err(|err| DatabaseError::Write(err.to_string()))?;
                    }
                }
            }
        }
        // Dropping an uncommitted transaction aborts it, so an error above
        // leaves the database untouched.
        write_txn.commit()?;
        Ok(())
    }

    fn flush(&self) -> Result<(), DatabaseError> {
        let mut write_txn = self.db.begin_write()?;
        write_txn.set_durability(Durability::Immediate);
        write_txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn put(engine: &RedbEngine, key: &[u8], value: &[u8]) {
        let mut batch = WriteBatch::new();
        batch.put(key.to_vec(), value.to_vec());
        engine.write(batch).unwrap();
    }

    fn keys_under(engine: &RedbEngine, prefix: &[u8]) -> Vec<Vec<u8>> {
        let mut keys = Vec::new();
        engine
            .for_each_prefix::<_, DatabaseError>(prefix, |key, _| {
                keys.push(key.to_vec());
                Ok(())
            })
            .unwrap();
        keys
    }

    #[test]
    fn test_put_get() {
        let engine = RedbEngine::in_memory().unwrap();
        assert!(engine.is_in_memory());

        put(&engine, b"key", b"hello world");

        assert_eq!(engine.get(b"key").unwrap(), Some(b"hello world".to_vec()));
        assert_eq!(engine.get(b"missing").unwrap(), None);
    }

    #[test]
    fn test_batch_put_and_delete() {
        let engine = RedbEngine::in_memory().unwrap();
        put(&engine, b"a", b"1");

        let mut batch = WriteBatch::new();
        batch.delete(b"a".to_vec());
        batch.delete(b"never-existed".to_vec());
        batch.put(b"b".to_vec(), b"2".to_vec());
        engine.write(batch).unwrap();

        assert_eq!(engine.get(b"a").unwrap(), None);
        assert_eq!(engine.get(b"b").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn test_prefix_scan_excludes_neighbours() {
        let engine = RedbEngine::in_memory().unwrap();
        put(&engine, b"ns:", b"empty-suffix");
        put(&engine, b"ns:b", b"2");
        put(&engine, b"ns:a", b"1");
        put(&engine, b"nr:z", b"before");
        put(&engine, b"nt:a", b"after");

        assert_eq!(
            keys_under(&engine, b"ns:"),
            vec![b"ns:".to_vec(), b"ns:a".to_vec(), b"ns:b".to_vec()]
        );
        assert!(keys_under(&engine, b"zz").is_empty());
    }

    #[test]
    fn test_visitor_error_propagates() {
        let engine = RedbEngine::in_memory().unwrap();
        put(&engine, b"p1", b"1");
        put(&engine, b"p2", b"2");

        let mut visited = 0;
        let result = engine.for_each_prefix(b"p", |_, _| {
            visited += 1;
            Err(DatabaseError::Other("halt".into()))
        });

        assert_matches!(result, Err(DatabaseError::Other(_)));
        assert_eq!(visited, 1);
    }

    #[test]
    fn test_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("test.redb");

        {
            let engine = RedbEngine::open_path(&path).unwrap();
            assert!(!engine.is_in_memory());
            put(&engine, b"durable", b"yes");
            engine.flush().unwrap();
        }

        let engine = RedbEngine::open_path(&path).unwrap();
        assert_eq!(engine.get(b"durable").unwrap(), Some(b"yes".to_vec()));
    }

    #[test]
    fn test_eventual_durability_survives_flush() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("eventual.redb");
        let config = RedbConfig {
            path: Some(path.clone()),
            cache_size: Some(1 << 20),
            durability: WriteDurability::Eventual,
        };

        {
            let engine = RedbEngine::open(&config).unwrap();
            put(&engine, b"k", b"v");
            engine.flush().unwrap();
        }

        let engine = RedbEngine::open(&config).unwrap();
        assert_eq!(engine.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_second_open_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("locked.redb");

        let _first = RedbEngine::open_path(&path).unwrap();
        assert_matches!(RedbEngine::open_path(&path), Err(DatabaseError::Open(_)));
    }
}
