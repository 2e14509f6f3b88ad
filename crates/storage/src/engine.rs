//! Key-value engine trait and atomic write batches.
//!
//! The [`KvEngine`] trait abstracts over ordered byte stores, allowing
//! implementations like redb or in-memory for testing.

use crate::DatabaseError;

/// A single staged mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOp {
    /// Insert or replace the value stored at `key`.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Remove `key`. Removing an absent key is not an error.
    Delete { key: Vec<u8> },
}

impl BatchOp {
    /// Key touched by this operation.
    pub fn key(&self) -> &[u8] {
        match self {
            Self::Put { key, .. } | Self::Delete { key } => key,
        }
    }
}

/// Ordered set of mutations committed as one unit.
///
/// Operations are applied in insertion order, so a later `delete` of a key
/// wins over an earlier `put` of the same key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an insert or replace.
    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Put {
            key: key.into(),
            value: value.into(),
        });
    }

    /// Stage a removal.
    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Delete { key: key.into() });
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BatchOp> {
        self.ops.iter()
    }
}

impl IntoIterator for WriteBatch {
    type Item = BatchOp;
    type IntoIter = std::vec::IntoIter<BatchOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

/// Ordered byte-key/byte-value store.
///
/// # Atomicity
///
/// [`KvEngine::write`] must apply either every operation of the batch or none
/// of them, and a concurrent reader must never observe a partially applied
/// batch.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (Send + Sync). Concurrency control is
/// the engine's own; callers add no locking around reads.
pub trait KvEngine: Send + Sync {
    /// Read the value stored at `key`.
    ///
    /// Returns `None` if the key doesn't exist.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, DatabaseError>;

    /// Visit every `(key, value)` pair whose key starts with `prefix`.
    ///
    /// Keys are visited in ascending byte order over a consistent snapshot.
    /// The first error returned by `visit` stops the scan and is returned
    /// unchanged.
    fn for_each_prefix<F, E>(&self, prefix: &[u8], visit: F) -> Result<(), E>
    where
        F: FnMut(&[u8], &[u8]) -> Result<(), E>,
        E: From<DatabaseError>;

    /// Atomically apply all operations in `batch`.
    fn write(&self, batch: WriteBatch) -> Result<(), DatabaseError>;

    /// Make every previously committed batch durable.
    fn flush(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

impl<T: KvEngine> KvEngine for std::sync::Arc<T> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, DatabaseError> {
        (**self).get(key)
    }

    fn for_each_prefix<F, E>(&self, prefix: &[u8], visit: F) -> Result<(), E>
    where
        F: FnMut(&[u8], &[u8]) -> Result<(), E>,
        E: From<DatabaseError>,
    {
        (**self).for_each_prefix(prefix, visit)
    }

    fn write(&self, batch: WriteBatch) -> Result<(), DatabaseError> {
        (**self).write(batch)
    }

    fn flush(&self) -> Result<(), DatabaseError> {
        (**self).flush()
    }
}
