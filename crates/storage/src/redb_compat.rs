//! Conversions from redb error types.

use crate::DatabaseError;

impl From<redb::DatabaseError> for DatabaseError {
    fn from(err: redb::DatabaseError) -> Self {
        DatabaseError::Open(err.to_string())
    }
}

impl From<redb::TransactionError> for DatabaseError {
    fn from(err: redb::TransactionError) -> Self {
        DatabaseError::Other(err.to_string())
    }
}

impl From<redb::TableError> for DatabaseError {
    fn from(err: redb::TableError) -> Self {
        DatabaseError::Other(err.to_string())
    }
}

impl From<redb::StorageError> for DatabaseError {
    fn from(err: redb::StorageError) -> Self {
        DatabaseError::Read(err.to_string())
    }
}

impl From<redb::CommitError> for DatabaseError {
    fn from(err: redb::CommitError) -> Self {
        DatabaseError::Commit(err.to_string())
    }
}
