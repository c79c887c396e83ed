//! Execution of invalidation plans.
//!
//! Deletes run concurrently with a fixed upper bound on in-flight requests.
//! A failed delete does not stop the sweep; failures are counted and
//! reported once every key has been attempted.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use futures::{StreamExt, stream};
use metrics::{counter, histogram};
use tracing::{debug, instrument, warn};

use super::error::CacheError;
use super::planner::InvalidationPlan;
use super::store::CacheStore;

const METRIC_INVALIDATION_KEYS: &str = "itemdir_invalidation_keys_total";
const METRIC_INVALIDATION_FAILURES: &str = "itemdir_invalidation_failures_total";
const METRIC_INVALIDATION_MS: &str = "itemdir_invalidation_ms";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepReport {
    pub attempted: usize,
    pub failed: usize,
}

pub struct InvalidationSweep {
    store: Arc<dyn CacheStore>,
    concurrency: NonZeroUsize,
}

impl InvalidationSweep {
    pub fn new(store: Arc<dyn CacheStore>, concurrency: NonZeroUsize) -> Self {
        Self { store, concurrency }
    }

    /// Deletes every key in `plan`.
    ///
    /// Returns [`CacheError::Sweep`] if any delete failed, after all deletes
    /// have been attempted.
    #[instrument(skip(self, plan), fields(plan = %plan))]
    pub async fn run(&self, plan: &InvalidationPlan) -> Result<SweepReport, CacheError> {
        let started_at = Instant::now();
        let store = self.store.as_ref();

        // Owned keys keep the delete futures `Send` for any caller lifetime.
        let failed = stream::iter(plan.iter().map(str::to_owned))
            .map(|key| async move {
                let result = store.delete(&key).await;
                (key, result)
            })
            .buffer_unordered(self.concurrency.get())
            .filter(|(key, result)| {
                let failed = match result {
                    Ok(()) => false,
                    Err(err) => {
                        warn!(
                            target = "itemdir::cache::sweep",
                            key = %key,
                            error = %err,
                            "Failed to purge cache key"
                        );
                        true
                    }
                };
                futures::future::ready(failed)
            })
            .count()
            .await;

        let report = SweepReport {
            attempted: plan.len(),
            failed,
        };

        counter!(METRIC_INVALIDATION_KEYS).increment(report.attempted as u64);
        if report.failed > 0 {
            counter!(METRIC_INVALIDATION_FAILURES).increment(report.failed as u64);
        }
        let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;
        histogram!(
            METRIC_INVALIDATION_MS,
            "outcome" => if report.failed == 0 { "ok" } else { "partial" }
        )
        .record(elapsed_ms);

        debug!(
            attempted = report.attempted,
            failed = report.failed,
            elapsed_ms,
            backend = self.store.backend(),
            "Invalidation sweep complete"
        );

        if report.failed > 0 {
            return Err(CacheError::Sweep {
                failed: report.failed,
                attempted: report.attempted,
            });
        }
        Ok(report)
    }
}
