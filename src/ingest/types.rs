// src/ingest/types.rs
use anyhow::Result;

use crate::news::News;

/// Ordered items produced by one page fetch. Empty means "nothing on this page".
pub type Batch = Vec<News>;

/// Paginated feed. Pages are 1-indexed.
#[async_trait::async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch_page(&self, page: u32) -> Result<Batch>;
    fn name(&self) -> &'static str;
}

/// Incremental persistence of accepted batches.
///
/// The first `append` of a run may recreate the destination; later calls append.
/// An empty batch is a no-op.
#[async_trait::async_trait]
pub trait PersistenceSink: Send + Sync {
    async fn append(&self, batch: &[News]) -> Result<()>;
}
