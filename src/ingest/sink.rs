// src/ingest/sink.rs
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::ingest::types::PersistenceSink;
use crate::news::News;

/// Writes one JSON object per line. The first non-empty append of a run truncates
/// the file (and creates its parent directory); later appends add lines.
pub struct JsonLinesSink {
    path: PathBuf,
    started: AtomicBool,
    // Serializes writers so lines from concurrent appends never interleave.
    write_lock: Mutex<()>,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            started: AtomicBool::new(false),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn encode(batch: &[News]) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        for n in batch {
            serde_json::to_writer(&mut buf, n).context("encoding news as json")?;
            buf.push(b'\n');
        }
        Ok(buf)
    }

    /// Replace the file with exactly `batch`. An empty batch leaves an empty file,
    /// so output from an earlier run never survives. Later appends add lines.
    pub async fn write_all(&self, batch: &[News]) -> Result<()> {
        let buf = Self::encode(batch)?;
        let _guard = self.write_lock.lock().await;
        self.started.store(true, Ordering::Release);
        self.write(&buf, true).await?;
        tracing::debug!(path = %self.path.display(), items = batch.len(), "file rewritten");
        Ok(())
    }

    async fn write(&self, buf: &[u8], truncate: bool) -> Result<()> {
        if truncate {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(!truncate)
            .truncate(truncate)
            .open(&self.path)
            .await
            .with_context(|| format!("opening {}", self.path.display()))?;
        file.write_all(buf)
            .await
            .with_context(|| format!("writing {}", self.path.display()))?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl PersistenceSink for JsonLinesSink {
    async fn append(&self, batch: &[News]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let buf = Self::encode(batch)?;

        let _guard = self.write_lock.lock().await;
        let first = !self.started.swap(true, Ordering::AcqRel);
        self.write(&buf, first).await?;

        tracing::debug!(path = %self.path.display(), items = batch.len(), first, "batch persisted");
        Ok(())
    }
}

/// In-process sink: keeps every appended batch. Handy for tests and embedding.
#[derive(Default)]
pub struct MemorySink {
    pub calls: std::sync::Mutex<Vec<Vec<News>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<Vec<News>> {
        self.calls.lock().expect("memory sink mutex poisoned").clone()
    }
}

#[async_trait::async_trait]
impl PersistenceSink for MemorySink {
    async fn append(&self, batch: &[News]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.calls
            .lock()
            .expect("memory sink mutex poisoned")
            .push(batch.to_vec());
        Ok(())
    }
}
