//! Announce version database metrics

use metrics::Counter;

/// Announce version database metrics
#[derive(Clone, Debug)]
pub(crate) struct AnnounceDbMetrics {
    /// Rows written by upserts
    pub(crate) accepted_total: Counter,
    /// Records ignored because their version was not newer
    pub(crate) rejected_total: Counter,
    /// Rows deleted by prunes
    pub(crate) pruned_total: Counter,
    /// Batches the engine failed to commit
    pub(crate) commit_failed_total: Counter,
}

impl Default for AnnounceDbMetrics {
    fn default() -> Self {
        Self {
            accepted_total: metrics::counter!("announce_db.upsert.accepted_total"),
            rejected_total: metrics::counter!("announce_db.upsert.rejected_total"),
            pruned_total: metrics::counter!("announce_db.prune.removed_total"),
            commit_failed_total: metrics::counter!("announce_db.commit.failed_total"),
        }
    }
}

impl AnnounceDbMetrics {
    pub(crate) fn inc_accepted(&self, count: usize) {
        self.accepted_total.increment(count as u64);
    }

    pub(crate) fn inc_rejected(&self, count: usize) {
        self.rejected_total.increment(count as u64);
    }

    pub(crate) fn inc_pruned(&self, count: usize) {
        self.pruned_total.increment(count as u64);
    }

    pub(crate) fn inc_commit_failed(&self) {
        self.commit_failed_total.increment(1);
    }
}
