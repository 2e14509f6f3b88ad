//! Storage abstractions shared by the announce version table and its backends.
//!
//! The engine contract is intentionally small: point reads, prefix-ranged scans
//! and atomic [`WriteBatch`] commits. Backends live in their own crates (see
//! `announce-storage-redb`).

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

mod engine;
pub use engine::{BatchOp, KvEngine, WriteBatch};

#[cfg(feature = "redb")]
mod redb_compat;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

/// Trait that will transform a key to be saved in the DB.
pub trait Encode: Send + Sync + Sized + Debug {
    /// Encoded type.
    type Encoded: AsRef<[u8]> + Into<Vec<u8>> + Send + Sync + Ord + Debug;

    /// Encodes data going into the database.
    fn encode(self) -> Self::Encoded;
}

/// Trait that will transform a key read back from the DB.
pub trait Decode: Send + Sync + Sized + Debug {
    /// Decodes data coming from the database.
    fn decode(value: &[u8]) -> Result<Self, DatabaseError>;

    /// Decodes owned data coming from the database.
    fn decode_owned(value: Vec<u8>) -> Result<Self, DatabaseError> {
        Self::decode(&value)
    }
}

/// Generic trait that enforces the database key to implement [`Encode`] and [`Decode`].
pub trait Key: Encode + Decode + Ord + Clone {}

impl<T> Key for T where T: Encode + Decode + Ord + Clone {}

/// Durability requested for committed batches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteDurability {
    /// Each batch is persisted before the commit returns.
    #[default]
    Immediate,
    /// Batches become durable on a later immediate commit or on flush.
    Eventual,
}

/// Database error type.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DatabaseError {
    /// Failed to open the database.
    #[error("failed to open the database: {_0}")]
    Open(String),
    /// Failed to read a value from a table.
    #[error("failed to read a value from a database table: {_0}")]
    Read(String),
    /// Failed to stage a write into a transaction.
    #[error("failed to write a value into a database table: {_0}")]
    Write(String),
    /// Failed to commit transaction changes into the database.
    #[error("failed to commit transaction changes: {_0}")]
    Commit(String),
    /// Failed to decode a key from a table.
    #[error("failed to decode a key from a table")]
    Decode,
    /// Other unspecified error.
    #[error("{_0}")]
    Other(String),
}
