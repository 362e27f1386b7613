// src/ingest/mod.rs
//! # Ingest pipeline
//! N fetch workers pull strided pages from a [`NewsSource`] and push budget-admitted
//! batches into one bounded channel. A single [`Aggregator`] drains it, persists each
//! batch through a [`PersistenceSink`] and collects everything in memory.
//!
//! Termination: the worker whose reservation drains the budget flips the
//! [`CloseLatch`] (exactly once per run) and then sends its last batch. Every batch that
//! was granted budget is still delivered. Once the aggregator holds `target_count` items
//! it stops receiving and aborts the remaining workers, so a fetch still in flight
//! cannot hold the run open. Otherwise the stream ends when the last worker drops its
//! sender.
//!
//! With `max_empty_pages = None` a source that never yields items keeps the workers
//! polling forever.

pub mod budget;
pub mod latch;
pub mod providers;
pub mod sink;
pub mod types;
pub mod worker;

use std::sync::Arc;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;
use tokio::sync::mpsc;

use crate::news::News;

pub use budget::{RemainingBudget, Reservation};
pub use latch::CloseLatch;
pub use types::{Batch, NewsSource, PersistenceSink};
pub use worker::{FetchWorker, WorkerExit};

/// One-time metrics registration (so series show up in the exposition).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_pages_total", "Page fetches attempted.");
        describe_counter!(
            "ingest_empty_pages_total",
            "Page fetches that yielded no items (including failures)."
        );
        describe_counter!("ingest_fetch_errors_total", "Page fetch/decode errors.");
        describe_counter!(
            "ingest_items_accepted_total",
            "Items admitted by the budget and forwarded."
        );
        describe_counter!(
            "ingest_batches_truncated_total",
            "Batches cut down to the remaining budget."
        );
        describe_counter!("ingest_persist_errors_total", "Batch persistence failures.");
        describe_histogram!("ingest_fetch_ms", "Page fetch time in milliseconds.");
        describe_gauge!("ingest_budget_remaining", "Items still needed by the pipeline.");
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// How many items to collect before stopping.
    pub target_count: usize,
    /// Concurrent fetch workers; also the page stride.
    pub workers: usize,
    /// Consecutive empty pages after which a worker retires. `None` = never.
    pub max_empty_pages: Option<u32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_count: 50,
            workers: 4,
            max_empty_pages: None,
        }
    }
}

/// What a finished run produced.
#[derive(Debug)]
pub struct PipelineReport {
    /// Union of accepted batches, in arrival order.
    pub items: Vec<News>,
    pub batches: usize,
    pub persist_failures: usize,
    /// Worker that closed the pipeline, if the budget was reached.
    pub closed_by: Option<usize>,
    /// Budget left when the stream ended.
    pub remaining: usize,
}

pub struct Aggregator {
    source: Arc<dyn NewsSource>,
    sink: Arc<dyn PersistenceSink>,
    cfg: PipelineConfig,
}

impl Aggregator {
    pub fn new(
        source: Arc<dyn NewsSource>,
        sink: Arc<dyn PersistenceSink>,
        cfg: PipelineConfig,
    ) -> Self {
        Self { source, sink, cfg }
    }

    pub async fn run(&self) -> PipelineReport {
        ensure_metrics_described();

        let workers = self.cfg.workers.max(1);
        let budget = Arc::new(RemainingBudget::new(self.cfg.target_count));
        let latch = Arc::new(CloseLatch::new());

        if self.cfg.target_count == 0 {
            return PipelineReport {
                items: Vec::new(),
                batches: 0,
                persist_failures: 0,
                closed_by: None,
                remaining: 0,
            };
        }

        let (tx, mut rx) = mpsc::channel::<Batch>(workers * 2);
        let handles: Vec<_> = (0..workers)
            .map(|index| {
                let worker = FetchWorker {
                    index,
                    stride: workers,
                    source: Arc::clone(&self.source),
                    budget: Arc::clone(&budget),
                    latch: Arc::clone(&latch),
                    tx: tx.clone(),
                    max_empty_pages: self.cfg.max_empty_pages,
                };
                tokio::spawn(worker.run())
            })
            .collect();
        // Only workers hold senders from here on.
        drop(tx);

        tracing::info!(
            provider = self.source.name(),
            workers,
            target = self.cfg.target_count,
            "ingest started"
        );

        let mut items = Vec::with_capacity(self.cfg.target_count);
        let mut batches = 0usize;
        let mut persist_failures = 0usize;

        while let Some(batch) = rx.recv().await {
            if let Err(e) = self.sink.append(&batch).await {
                tracing::warn!(error = ?e, size = batch.len(), "batch persistence failed");
                counter!("ingest_persist_errors_total").increment(1);
                persist_failures += 1;
            }
            batches += 1;
            items.extend(batch);

            // Every granted item has arrived; nothing a worker still holds can be admitted.
            if items.len() >= self.cfg.target_count {
                break;
            }
        }

        rx.close();
        for handle in &handles {
            handle.abort();
        }
        for (index, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(exit) => tracing::debug!(worker = index, ?exit, "worker finished"),
                Err(e) if e.is_cancelled() => {
                    tracing::debug!(worker = index, "worker cancelled after close")
                }
                Err(e) => tracing::warn!(worker = index, error = ?e, "worker task failed"),
            }
        }

        let report = PipelineReport {
            items,
            batches,
            persist_failures,
            closed_by: latch.closed_by(),
            remaining: budget.read(),
        };

        tracing::info!(
            items = report.items.len(),
            batches = report.batches,
            persist_failures = report.persist_failures,
            closed_by = ?report.closed_by,
            remaining = report.remaining,
            "ingest finished"
        );
        report
    }
}
