// tests/metrics_ingest.rs
#![cfg(feature = "strict-metrics")]
use anyhow::Result;
use async_trait::async_trait;
use news_digest::ingest::sink::MemorySink;
use news_digest::ingest::{Batch, NewsSource};
use news_digest::telemetry::Metrics;
use news_digest::{Aggregator, News, PipelineConfig};
use std::sync::Arc;

struct TwoPerPage;

#[async_trait]
impl NewsSource for TwoPerPage {
    async fn fetch_page(&self, page: u32) -> Result<Batch> {
        Ok(vec![
            News::new(page as i64 * 10, "a", 0, 0, 0),
            News::new(page as i64 * 10 + 1, "b", 0, 0, 0),
        ])
    }
    fn name(&self) -> &'static str {
        "TwoPerPage"
    }
}

#[tokio::test]
async fn metrics_exposed_after_ingest() {
    let metrics = Metrics::install().expect("recorder");

    let report = Aggregator::new(
        Arc::new(TwoPerPage),
        Arc::new(MemorySink::new()),
        PipelineConfig {
            target_count: 3,
            workers: 1,
            max_empty_pages: None,
        },
    )
    .run()
    .await;
    assert_eq!(report.items.len(), 3);

    let out = metrics.render();
    assert!(out.contains("ingest_pages_total"));
    assert!(out.contains("ingest_items_accepted_total"));
    assert!(out.contains("ingest_batches_truncated_total"));
    assert!(out.contains("ingest_fetch_ms"));

    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("digest.prom");
    metrics.write_textfile(&p).unwrap();
    assert!(std::fs::read_to_string(&p).unwrap().contains("ingest_pages_total"));
}
