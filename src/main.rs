//! News digest: batch entrypoint.
//! Ingests the feed concurrently up to the configured count, persists every batch
//! as it arrives, then writes the most rated items of the date window.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use news_digest::ingest::providers::kudago::KudaGoSource;
use news_digest::ingest::sink::JsonLinesSink;
use news_digest::telemetry::{self, Metrics};
use news_digest::{Aggregator, DigestConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; missing file is fine.
    let _ = dotenvy::dotenv();

    let cfg = DigestConfig::load()?;
    telemetry::init_tracing(cfg.log_json);

    let metrics = match cfg.output.metrics_path {
        Some(_) => Some(Metrics::install()?),
        None => None,
    };

    let source = Arc::new(KudaGoSource::new(&cfg.source)?);
    let sink = Arc::new(JsonLinesSink::new(&cfg.output.all_news_path));

    let started = Instant::now();
    let report = Aggregator::new(source, sink, cfg.pipeline()).run().await;
    tracing::info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        items = report.items.len(),
        path = %cfg.output.all_news_path.display(),
        "all news collected"
    );

    let selector = cfg.selector();
    let top = selector.most_rated(&report.items);
    JsonLinesSink::new(&cfg.output.most_rated_path)
        .write_all(&top)
        .await?;
    tracing::info!(
        top = top.len(),
        from = %selector.window.from(),
        to = %selector.window.to(),
        path = %cfg.output.most_rated_path.display(),
        "most rated news written"
    );

    if let (Some(m), Some(path)) = (metrics.as_ref(), cfg.output.metrics_path.as_deref()) {
        m.write_textfile(path)?;
    }

    Ok(())
}
