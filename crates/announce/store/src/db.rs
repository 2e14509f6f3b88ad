use std::collections::{BTreeMap, HashSet};
use std::fmt::{self, Write as _};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use alloy_primitives::Address;
use announce_primitives::{
    AnnounceVersionEntry, AnnounceVersionInfo, RlpError, SignedAnnounceVersion,
};
use announce_storage::{Decode, Encode, KvEngine, WriteBatch};
use announce_storage_redb::RedbEngine;
use parking_lot::{MappedRwLockReadGuard, Mutex, RwLock, RwLockReadGuard};
use tracing::{Span, debug, error, info_span, trace, warn};

use crate::metrics::AnnounceDbMetrics;
use crate::schema::ensure_schema;
use crate::{
    ANNOUNCE_VERSION_PREFIX, AnnounceDbConfig, AnnounceDbError, AnnounceDbResult,
    AnnounceVersionKey,
};

/// Table of the highest accepted announce version per address.
///
/// Cheap to share behind an `Arc`; every method takes `&self`. Reads run
/// concurrently. Mutations (`upsert`, `remove`, `prune`) are serialized so
/// that the read-compare-write inside `upsert` cannot interleave with another
/// mutation of the same table.
///
/// Visitors passed to [`iterate`](Self::iterate) may call back into the
/// database, with the exception of [`close`](Self::close).
pub struct AnnounceVersionDb<E: KvEngine = RedbEngine> {
    /// `None` once closed.
    engine: RwLock<Option<E>>,
    writer: Mutex<()>,
    span: Span,
    metrics: AnnounceDbMetrics,
}

impl AnnounceVersionDb<RedbEngine> {
    /// Open a persistent database at `path`, or an ephemeral in-memory one.
    pub fn open(path: Option<&Path>) -> AnnounceDbResult<Self> {
        let config = match path {
            Some(path) => AnnounceDbConfig::at_path(path),
            None => AnnounceDbConfig::in_memory(),
        };
        Self::open_with(config)
    }

    /// Open a database described by `config`.
    ///
    /// Fails with [`AnnounceDbError::Engine`] if another handle already holds
    /// the file open.
    pub fn open_with(config: AnnounceDbConfig) -> AnnounceDbResult<Self> {
        let engine = RedbEngine::open(&config.redb_config())?;
        let span = config
            .span
            .unwrap_or_else(|| info_span!("announce_version_db"));
        Self::with_engine(engine, span)
    }
}

impl<E: KvEngine> AnnounceVersionDb<E> {
    /// Wrap an already opened engine. Log events are emitted under `span`.
    ///
    /// Rows stored under a different schema marker are discarded first.
    pub fn with_engine(engine: E, span: Span) -> AnnounceDbResult<Self> {
        let discarded = ensure_schema(&engine, &span)?;
        debug!(parent: &span, discarded, "Opened announce version database");
        Ok(Self {
            engine: RwLock::new(Some(engine)),
            writer: Mutex::new(()),
            span,
            metrics: AnnounceDbMetrics::default(),
        })
    }

    /// Flush and release the engine.
    ///
    /// Waits for in-flight operations. Every later operation fails with
    /// [`AnnounceDbError::Closed`]; closing again is a no-op.
    pub fn close(&self) -> AnnounceDbResult<()> {
        let Some(engine) = self.engine.write().take() else {
            return Ok(());
        };
        engine.flush()?;
        debug!(parent: &self.span, "Closed announce version database");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.engine.read_recursive().is_none()
    }

    /// Stored entry for `address`.
    pub fn get_entry(&self, address: Address) -> AnnounceDbResult<AnnounceVersionEntry> {
        let engine = self.engine()?;
        load_entry(&*engine, address)
    }

    /// Stored version for `address`.
    pub fn get_version(&self, address: Address) -> AnnounceDbResult<u64> {
        self.get_entry(address).map(|entry| entry.version())
    }

    /// Store every record whose version is strictly newer than the one held
    /// for its address.
    ///
    /// Accepted records are committed as one atomic batch stamped with a
    /// single acceptance time. Records that are not newer are ignored, which
    /// includes lower or equal duplicates later in the same slice. Returns
    /// whether anything was written.
    ///
    /// Signatures are not checked here.
    pub fn upsert(&self, records: &[SignedAnnounceVersion]) -> AnnounceDbResult<bool> {
        let _writer = self.writer.lock();
        let engine = self.engine()?;
        let now = self.unix_nanos_now();

        let mut staged: BTreeMap<Address, AnnounceVersionEntry> = BTreeMap::new();
        let mut rejected = 0;
        for record in records {
            let current = match staged.get(&record.address) {
                Some(pending) => Some((pending.version(), pending.timestamp)),
                None => match load_entry(&*engine, record.address) {
                    Ok(stored) => Some((stored.version(), stored.timestamp)),
                    Err(AnnounceDbError::NotFound(_)) => None,
                    Err(err) => return Err(err),
                },
            };

            let timestamp = match current {
                Some((version, _)) if record.version <= version => {
                    trace!(
                        parent: &self.span,
                        address = %record.address,
                        version = record.version,
                        current = version,
                        "Ignoring announce version that is not newer"
                    );
                    rejected += 1;
                    continue;
                }
                // Never stamp a replacement earlier than the row it replaces.
                Some((_, previous)) => now.max(previous),
                None => now,
            };

            trace!(
                parent: &self.span,
                address = %record.address,
                version = record.version,
                previous = current.map(|(version, _)| version),
                "Accepting announce version"
            );
            staged.insert(
                record.address,
                AnnounceVersionEntry::new(record.clone(), timestamp),
            );
        }

        let accepted = staged.len();
        if accepted > 0 {
            let mut batch = WriteBatch::new();
            for (address, entry) in staged {
                batch.put(AnnounceVersionKey(address).encode(), entry.to_bytes());
            }
            self.commit(&*engine, batch)?;
        }

        // Counted only once the call's outcome is final.
        self.metrics.inc_accepted(accepted);
        self.metrics.inc_rejected(rejected);
        Ok(accepted > 0)
    }

    /// Delete the row for `address`. Absent rows are not an error.
    pub fn remove(&self, address: Address) -> AnnounceDbResult<()> {
        let _writer = self.writer.lock();
        let engine = self.engine()?;

        let mut batch = WriteBatch::new();
        batch.delete(AnnounceVersionKey(address).encode());
        self.commit(&*engine, batch)
    }

    /// Delete every row whose address is not in `keep`, atomically.
    ///
    /// Only keys are inspected, so rows with corrupt values are pruned like any
    /// other. Returns the number of rows deleted.
    pub fn prune(&self, keep: &HashSet<Address>) -> AnnounceDbResult<usize> {
        let _writer = self.writer.lock();
        let engine = self.engine()?;

        let mut batch = WriteBatch::new();
        engine.for_each_prefix::<_, AnnounceDbError>(ANNOUNCE_VERSION_PREFIX, |key, _| {
            let AnnounceVersionKey(address) = AnnounceVersionKey::decode(key)?;
            if !keep.contains(&address) {
                trace!(parent: &self.span, %address, "Pruning announce version");
                batch.delete(key.to_vec());
            }
            Ok(())
        })?;

        let removed = batch.len();
        if removed > 0 {
            self.commit(&*engine, batch)?;
            self.metrics.inc_pruned(removed);
        }
        Ok(removed)
    }

    /// Visit every row in key order.
    ///
    /// The first error returned by `visit` stops the scan and is returned. A
    /// row that fails to decode aborts the scan with
    /// [`AnnounceDbError::Decode`].
    pub fn iterate<F>(&self, mut visit: F) -> AnnounceDbResult<()>
    where
        F: FnMut(Address, AnnounceVersionEntry) -> AnnounceDbResult<()>,
    {
        let engine = self.engine()?;
        engine.for_each_prefix(ANNOUNCE_VERSION_PREFIX, |key, value| {
            let AnnounceVersionKey(address) = AnnounceVersionKey::decode(key)?;
            visit(address, decode_entry(address, value)?)
        })
    }

    pub fn get_all_entries(&self) -> AnnounceDbResult<Vec<AnnounceVersionEntry>> {
        let mut entries = Vec::new();
        self.iterate(|_, entry| {
            entries.push(entry);
            Ok(())
        })?;
        Ok(entries)
    }

    pub fn get_all_signed_versions(&self) -> AnnounceDbResult<Vec<SignedAnnounceVersion>> {
        let mut records = Vec::new();
        self.iterate(|_, entry| {
            records.push(entry.record);
            Ok(())
        })?;
        Ok(records)
    }

    /// Public summary of the table, keyed by checksummed address.
    ///
    /// Carries no signatures or timestamps.
    pub fn info(&self) -> AnnounceDbResult<BTreeMap<String, AnnounceVersionInfo>> {
        let mut info = BTreeMap::new();
        self.iterate(|_, entry| {
            let summary = AnnounceVersionInfo::from(&entry);
            info.insert(summary.address.clone(), summary);
            Ok(())
        })?;
        Ok(info)
    }

    /// Debug dump of the whole table. Not a stable format.
    ///
    /// A failed scan is logged and the text gathered so far is returned.
    pub fn describe(&self) -> String {
        let mut out = String::from("AnnounceVersionTable:");
        let result = self.iterate(|address, entry| {
            let _ = write!(out, " [{address} => {entry}]");
            Ok(())
        });
        if let Err(err) = result {
            error!(parent: &self.span, %err, "Failed to describe announce version table");
        }
        out
    }

    /// Number of rows.
    pub fn len(&self) -> AnnounceDbResult<usize> {
        let engine = self.engine()?;
        let mut count = 0;
        engine.for_each_prefix::<_, AnnounceDbError>(ANNOUNCE_VERSION_PREFIX, |_, _| {
            count += 1;
            Ok(())
        })?;
        Ok(count)
    }

    pub fn is_empty(&self) -> AnnounceDbResult<bool> {
        self.len().map(|len| len == 0)
    }

    fn engine(&self) -> AnnounceDbResult<MappedRwLockReadGuard<'_, E>> {
        // Recursive so visitors can re-enter while `close` waits on the lock.
        RwLockReadGuard::try_map(self.engine.read_recursive(), Option::as_ref)
            .map_err(|_| AnnounceDbError::Closed)
    }

    /// Acceptance time for this call. A clock set before the epoch stamps `0`.
    fn unix_nanos_now(&self) -> u64 {
        unix_nanos(SystemTime::now()).unwrap_or_else(|behind| {
            warn!(parent: &self.span, ?behind, "System clock is before the unix epoch, stamping 0");
            0
        })
    }

    fn commit(&self, engine: &E, batch: WriteBatch) -> AnnounceDbResult<()> {
        let ops = batch.len();
        engine.write(batch).inspect_err(|err| {
            self.metrics.inc_commit_failed();
            warn!(parent: &self.span, %err, ops, "Failed to commit announce version batch");
        })?;
        debug!(parent: &self.span, ops, "Committed announce version batch");
        Ok(())
    }
}

impl<E: KvEngine> fmt::Display for AnnounceVersionDb<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl<E: KvEngine> fmt::Debug for AnnounceVersionDb<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnounceVersionDb")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

fn load_entry<E: KvEngine>(
    engine: &E,
    address: Address,
) -> AnnounceDbResult<AnnounceVersionEntry> {
    let key = AnnounceVersionKey(address).encode();
    let value = engine
        .get(&key)?
        .ok_or(AnnounceDbError::NotFound(address))?;
    decode_entry(address, &value)
}

fn decode_entry(address: Address, value: &[u8]) -> AnnounceDbResult<AnnounceVersionEntry> {
    let entry = AnnounceVersionEntry::from_bytes(value)
        .map_err(|source| AnnounceDbError::Decode { address, source })?;
    if entry.address() != address {
        return Err(AnnounceDbError::Decode {
            address,
            source: RlpError::Custom("entry address does not match its key"),
        });
    }
    Ok(entry)
}

/// Nanoseconds since the unix epoch, saturating at both ends.
fn unix_nanos(at: SystemTime) -> Result<u64, Duration> {
    match at.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => Ok(u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX)),
        Err(err) => Err(err.duration()),
    }
}
