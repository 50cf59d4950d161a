use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::acquisition::{AcquisitionPipeline, ErrorKind};
use crate::repositories::EntryRepository;
use crate::scheduler::refresher::FeedRefresher;

#[derive(Debug, Clone)]
pub struct BackfillConfig {
    /// Entries fetched at the same time.
    pub concurrency: usize,
    /// Entries picked up per cycle.
    pub batch_size: i64,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            batch_size: 50,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BackfillSummary {
    pub stored: usize,
    pub failed: usize,
    pub cancelled: usize,
}

/// Fills in readable content for entries that lack it, a batch per cycle.
///
/// Batches walk the id space in order and wrap around once exhausted, so
/// entries that keep failing never starve the ones behind them.
pub struct ReadableBackfill {
    repo: Arc<dyn EntryRepository>,
    pipeline: AcquisitionPipeline,
    config: BackfillConfig,
    cursor: AtomicI64,
}

impl ReadableBackfill {
    pub fn new(
        repo: Arc<dyn EntryRepository>,
        pipeline: AcquisitionPipeline,
        config: BackfillConfig,
    ) -> Self {
        Self {
            repo,
            pipeline,
            config,
            cursor: AtomicI64::new(0),
        }
    }

    /// Process one batch. Per-entry failures are counted, not returned.
    pub async fn run(&self, cancel: &CancellationToken) -> anyhow::Result<BackfillSummary> {
        let after = self.cursor.load(Ordering::Acquire);
        let mut ids = self.list_batch(after).await?;
        if ids.is_empty() && after > 0 {
            debug!(after, "reached the end of pending entries, wrapping around");
            ids = self.list_batch(0).await?;
        }

        let mut summary = BackfillSummary::default();
        let Some(&last) = ids.last() else {
            self.cursor.store(0, Ordering::Release);
            debug!("no entries need readable content");
            return Ok(summary);
        };
        self.cursor.store(last, Ordering::Release);
        info!(count = ids.len(), after, "backfilling readable content");

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for id in ids {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                permit = semaphore.clone().acquire_owned() => permit?,
            };
            let pipeline = self.pipeline.clone();
            let cancel = cancel.clone();

            tasks.spawn(
                async move {
                    let _permit = permit; // Held until the entry is done
                    let result = pipeline.fetch_readable_content(id, &cancel).await;
                    (id, result)
                }
                .instrument(info_span!("backfill_entry", entry_id = id)),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(_))) => summary.stored += 1,
                Ok((_, Err(e))) if e.kind() == ErrorKind::Cancelled => summary.cancelled += 1,
                Ok((id, Err(e))) => {
                    warn!(entry_id = id, kind = ?e.kind(), error = %e, "readable backfill failed");
                    summary.failed += 1;
                }
                Err(e) => {
                    error!(error = %e, "readable backfill task aborted");
                    summary.failed += 1;
                }
            }
        }

        info!(
            stored = summary.stored,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "readable backfill finished"
        );
        Ok(summary)
    }

    async fn list_batch(&self, after: i64) -> anyhow::Result<Vec<i64>> {
        self.repo
            .list_missing_readable(after, self.config.batch_size)
            .await
            .context("listing entries without readable content")
    }
}

#[async_trait]
impl FeedRefresher for ReadableBackfill {
    async fn refresh_all(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        let summary = self.run(&cancel).await?;
        if cancel.is_cancelled() {
            anyhow::bail!(
                "readable backfill cancelled after storing {} entries",
                summary.stored
            );
        }
        Ok(())
    }
}
