use std::path::PathBuf;

use announce_storage::WriteDurability;
use announce_storage_redb::RedbConfig;
use serde::Deserialize;
use tracing::Span;

use crate::AnnounceDbResult;

/// Announce version database configuration.
///
/// Deserializable from TOML:
///
/// ```toml
/// path = "/var/lib/node/announce-versions.redb"
/// cache_size = 4194304
/// durability = "eventual"
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnnounceDbConfig {
    /// Database file. None = ephemeral in-memory table.
    pub path: Option<PathBuf>,
    /// Engine page cache size in bytes.
    pub cache_size: Option<usize>,
    /// Durability of each committed batch.
    pub durability: WriteDurability,
    /// Span every log event of the store is emitted under.
    #[serde(skip)]
    pub span: Option<Span>,
}

impl AnnounceDbConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Parse a TOML document.
    pub fn from_toml_str(input: &str) -> AnnounceDbResult<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Emit the store's logs under `span` instead of the default one.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub(crate) fn redb_config(&self) -> RedbConfig {
        RedbConfig {
            path: self.path.clone(),
            cache_size: self.cache_size,
            durability: self.durability,
        }
    }
}
