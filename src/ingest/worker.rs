// src/ingest/worker.rs
//! One fetch worker: walks pages `w+1, w+1+N, w+1+2N, ...` and forwards
//! budget-admitted batches to the aggregator.

use std::sync::Arc;

use metrics::{counter, gauge, histogram};
use tokio::sync::mpsc;

use crate::ingest::budget::RemainingBudget;
use crate::ingest::latch::CloseLatch;
use crate::ingest::types::{Batch, NewsSource};

/// Why a worker stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// This worker drained the budget and closed the pipeline.
    Closed,
    /// Another worker closed the pipeline first.
    Preempted,
    /// Hit the consecutive empty-page limit.
    Retired,
    /// The aggregator stopped receiving.
    ReceiverGone,
}

pub struct FetchWorker {
    pub index: usize,
    pub stride: usize,
    pub source: Arc<dyn NewsSource>,
    pub budget: Arc<RemainingBudget>,
    pub latch: Arc<CloseLatch>,
    pub tx: mpsc::Sender<Batch>,
    pub max_empty_pages: Option<u32>,
}

impl FetchWorker {
    pub fn first_page(&self) -> u32 {
        self.index as u32 + 1
    }

    pub async fn run(self) -> WorkerExit {
        let stride = self.stride.max(1) as u32;
        let mut page = self.first_page();
        let mut empty_streak = 0u32;

        loop {
            if self.latch.is_closed() {
                return WorkerExit::Preempted;
            }

            let batch = self.fetch(page).await;

            if batch.is_empty() {
                counter!("ingest_empty_pages_total").increment(1);
                empty_streak += 1;
                if self.max_empty_pages.is_some_and(|max| empty_streak >= max) {
                    tracing::debug!(
                        worker = self.index,
                        page,
                        empty_streak,
                        "empty page limit reached"
                    );
                    return WorkerExit::Retired;
                }
                match self.next_page(page, stride) {
                    Some(next) => page = next,
                    None => return WorkerExit::Retired,
                }
                continue;
            }
            empty_streak = 0;

            let fetched = batch.len();
            let reservation = self.budget.try_reserve(fetched);
            gauge!("ingest_budget_remaining").set(self.budget.read() as f64);

            if reservation.granted == 0 {
                return self.close();
            }

            let mut batch = batch;
            if reservation.granted < fetched {
                batch.truncate(reservation.granted);
                counter!("ingest_batches_truncated_total").increment(1);
                tracing::info!(
                    worker = self.index,
                    page,
                    fetched,
                    granted = reservation.granted,
                    "batch truncated to remaining budget"
                );
            }

            // The latch goes up before the final send, so the aggregator never
            // sees the last granted batch ahead of the close.
            let closed = reservation.exhausted.then(|| self.close());

            if self.tx.send(batch).await.is_err() {
                tracing::warn!(worker = self.index, page, "aggregator gone; dropping batch");
                return WorkerExit::ReceiverGone;
            }
            counter!("ingest_items_accepted_total").increment(reservation.granted as u64);
            tracing::debug!(
                worker = self.index,
                page,
                granted = reservation.granted,
                "batch forwarded"
            );

            if let Some(exit) = closed {
                return exit;
            }
            match self.next_page(page, stride) {
                Some(next) => page = next,
                None => return WorkerExit::Retired,
            }
        }
    }

    /// `None` once the page number would leave `u32`.
    fn next_page(&self, page: u32, stride: u32) -> Option<u32> {
        let next = page.checked_add(stride);
        if next.is_none() {
            tracing::warn!(worker = self.index, page, stride, "page counter exhausted");
        }
        next
    }

    async fn fetch(&self, page: u32) -> Batch {
        let t0 = std::time::Instant::now();
        counter!("ingest_pages_total").increment(1);
        let out = match self.source.fetch_page(page).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(
                    error = ?e,
                    provider = self.source.name(),
                    worker = self.index,
                    page,
                    "page fetch failed"
                );
                counter!("ingest_fetch_errors_total").increment(1);
                Vec::new()
            }
        };
        histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        out
    }

    fn close(&self) -> WorkerExit {
        if self.latch.close(self.index) {
            tracing::info!(worker = self.index, "budget exhausted; pipeline closed");
            WorkerExit::Closed
        } else {
            WorkerExit::Preempted
        }
    }
}
