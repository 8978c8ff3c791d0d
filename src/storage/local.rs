//! Local CSV file sink.
//!
//! ## Layout
//!
//! ```text
//! {output_dir}/
//! ├── brandA.csv
//! └── brandB.csv
//! ```
//!
//! Rows are written with the `csv` crate, so fields holding commas, quotes
//! or newlines are quoted as usual.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::Cell;
use crate::storage::{SinkKey, TabularSink};
use crate::utils::url::sanitize_file_name;

/// Local filesystem sink, one CSV file per job label.
#[derive(Clone)]
pub struct LocalFileSink {
    root_dir: PathBuf,
}

impl LocalFileSink {
    /// Create a sink writing into the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// File path for a job.
    pub fn path(&self, key: &SinkKey<'_>) -> PathBuf {
        self.root_dir
            .join(format!("{}.csv", sanitize_file_name(key.label)))
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    fn encode(rows: &[Vec<Cell>]) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        for row in rows {
            writer.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
        writer
            .into_inner()
            .map_err(|e| std::io::Error::other(e.to_string()).into())
    }
}

#[async_trait]
impl TabularSink for LocalFileSink {
    fn backend(&self) -> &'static str {
        "local_file"
    }

    fn location(&self, key: &SinkKey<'_>) -> String {
        self.path(key).display().to_string()
    }

    async fn clear(&self, key: &SinkKey<'_>) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;
        tokio::fs::write(&path, b"").await?;
        Ok(())
    }

    async fn append_rows(&self, key: &SinkKey<'_>, rows: &[Vec<Cell>]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let bytes = Self::encode(rows)?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        Ok(())
    }
}
