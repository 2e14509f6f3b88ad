use alloy_primitives::Address;
use announce_primitives::{RlpError, SignatureError};
use announce_storage::DatabaseError;

/// Errors from announce version database operations.
#[derive(Debug, thiserror::Error)]
pub enum AnnounceDbError {
    /// No row for the address. Expected; callers branch on it.
    #[error("no announce version stored for {0}")]
    NotFound(Address),

    /// The row exists but its bytes are not a valid entry.
    #[error("corrupt announce version entry for {address}: {source}")]
    Decode {
        address: Address,
        #[source]
        source: RlpError,
    },

    /// Signature check failed.
    #[error("invalid announce version signature: {0}")]
    Signature(#[from] SignatureError),

    /// Engine failure, propagated as-is.
    #[error(transparent)]
    Engine(#[from] DatabaseError),

    /// Configuration could not be parsed.
    #[error("invalid announce version db configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Operation issued after [`crate::AnnounceVersionDb::close`].
    #[error("announce version database is closed")]
    Closed,
}

impl AnnounceDbError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether the error reports corrupt bytes under this table's prefix,
    /// either in a value or in a key.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::Engine(DatabaseError::Decode))
    }
}

pub type AnnounceDbResult<T> = Result<T, AnnounceDbError>;
