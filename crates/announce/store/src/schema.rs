//! Row format marker, checked once when a database is opened.

use announce_storage::{KvEngine, WriteBatch};
use tracing::{Span, debug, warn};

use crate::{
    ANNOUNCE_VERSION_PREFIX, ANNOUNCE_VERSION_SCHEMA, ANNOUNCE_VERSION_SCHEMA_KEY,
    AnnounceDbError, AnnounceDbResult,
};

/// Make the stored marker match [`ANNOUNCE_VERSION_SCHEMA`].
///
/// A missing marker is written and existing rows are kept. A different
/// marker means the rows were written in another format: every row under
/// [`ANNOUNCE_VERSION_PREFIX`] is deleted and the marker is rewritten in the
/// same batch. Keys outside the prefix are never touched.
///
/// Returns the number of rows deleted.
pub(crate) fn ensure_schema<E: KvEngine>(engine: &E, span: &Span) -> AnnounceDbResult<usize> {
    let expected = ANNOUNCE_VERSION_SCHEMA.to_be_bytes();
    let stored = engine.get(ANNOUNCE_VERSION_SCHEMA_KEY)?;

    let mut batch = WriteBatch::new();
    match stored.as_deref() {
        Some(stored) if stored == expected.as_slice() => return Ok(0),
        None => {
            debug!(parent: span, schema = ANNOUNCE_VERSION_SCHEMA, "Writing announce version schema");
        }
        Some(stored) => {
            engine.for_each_prefix::<_, AnnounceDbError>(ANNOUNCE_VERSION_PREFIX, |key, _| {
                batch.delete(key.to_vec());
                Ok(())
            })?;
            warn!(
                parent: span,
                stored = ?stored,
                expected = ANNOUNCE_VERSION_SCHEMA,
                rows = batch.len(),
                "Announce version schema changed, discarding stored rows"
            );
        }
    }

    let wiped = batch.len();
    batch.put(ANNOUNCE_VERSION_SCHEMA_KEY, expected.to_vec());
    engine.write(batch)?;
    Ok(wiped)
}
