//! Persistent table of signed announce versions.
//!
//! [`AnnounceVersionDb`] keeps, for every identity address, the entry carrying
//! the highest announce version it has accepted. Updates arrive in batches
//! (typically one gossip round) and are committed atomically; lower or equal
//! versions are ignored, so replays and reordered messages never roll a row
//! back.
//!
//! Opening a database checks a stored row-format marker. Rows written in a
//! different format are discarded instead of failing to decode later.
//!
//! Signatures are **not** checked on the write path. Callers run
//! [`SignedAnnounceVersion::validate_signature`] before handing records to
//! [`AnnounceVersionDb::upsert`].

mod config;
mod db;
mod error;
mod key;
mod metrics;
mod schema;

pub use config::AnnounceDbConfig;
pub use db::AnnounceVersionDb;
pub use error::{AnnounceDbError, AnnounceDbResult};
pub use key::{
    ANNOUNCE_VERSION_PREFIX, ANNOUNCE_VERSION_SCHEMA, ANNOUNCE_VERSION_SCHEMA_KEY,
    AnnounceVersionKey,
};

pub use announce_primitives::{
    AnnounceVersionEntry, AnnounceVersionInfo, SignatureError, SignedAnnounceVersion,
};
pub use announce_storage::WriteDurability;
