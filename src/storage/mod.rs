//! Snapshot export to tabular destinations.
//!
//! Every sink driver exposes the same two primitives, `clear` and
//! `append_rows`. [`write_snapshot`] builds the replace-on-write contract on
//! top of them:
//!
//! - no records: nothing is touched, the previous snapshot survives
//! - records: clear, then append the header row followed by one row per record
//!
//! ## Backends
//!
//! ```text
//! local_file    {output_dir}/{label}.csv      one file per job
//! remote_sheet  {spreadsheet}/'{sink}'        one tab per job in a shared sheet
//! ```
//!
//! Clear + append is not transactional. A crash in between leaves a partial
//! sink that the next run of the same job overwrites.

pub mod local;
pub mod sheets;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{Cell, Column, ExportConfig, NormalizedRecord};

// Re-export for convenience
pub use local::LocalFileSink;
pub use sheets::RemoteSheetSink;

/// Addresses one job's destination.
#[derive(Debug, Clone, Copy)]
pub struct SinkKey<'a> {
    /// Job label; names local files
    pub label: &'a str,
    /// Sink identifier; names remote tabs
    pub sink: &'a str,
}

/// A sink driver.
#[async_trait]
pub trait TabularSink: Send + Sync {
    /// Backend name for logs and reports.
    fn backend(&self) -> &'static str;

    /// Human-readable location of a job's destination.
    fn location(&self, key: &SinkKey<'_>) -> String;

    /// Remove all existing content at `key`.
    async fn clear(&self, key: &SinkKey<'_>) -> Result<()>;

    /// Append rows after the existing content at `key`.
    async fn append_rows(&self, key: &SinkKey<'_>, rows: &[Vec<Cell>]) -> Result<()>;
}

/// Records of one target, ready for export.
#[derive(Debug, Clone, Copy)]
pub struct ExportJob<'a> {
    pub label: &'a str,
    pub sink: &'a str,
    pub header: &'a [Column],
    pub records: &'a [NormalizedRecord],
}

impl ExportJob<'_> {
    pub fn key(&self) -> SinkKey<'_> {
        SinkKey {
            label: self.label,
            sink: self.sink,
        }
    }

    /// Header row followed by one row per record, in input order.
    pub fn rows(&self) -> Vec<Vec<Cell>> {
        std::iter::once(Column::header_row(self.header))
            .chain(self.records.iter().map(|r| r.row(self.header)))
            .collect()
    }
}

/// Metadata about a snapshot write.
#[derive(Debug, Clone)]
pub struct WriteMetadata {
    pub backend: &'static str,
    pub location: String,
    /// Data rows written, header excluded
    pub rows_written: usize,
    /// True when the job had no records and the sink was left untouched
    pub skipped: bool,
    pub timestamp: DateTime<Utc>,
}

/// Replace the content of one sink with a job's records.
pub async fn write_snapshot(sink: &dyn TabularSink, job: &ExportJob<'_>) -> Result<WriteMetadata> {
    let key = job.key();
    let location = sink.location(&key);

    if job.records.is_empty() {
        log::info!(
            "{}: no records this run, keeping previous snapshot at {}",
            job.sink,
            location
        );
        return Ok(WriteMetadata {
            backend: sink.backend(),
            location,
            rows_written: 0,
            skipped: true,
            timestamp: Utc::now(),
        });
    }

    sink.clear(&key).await?;
    sink.append_rows(&key, &job.rows()).await?;

    log::info!(
        "{}: wrote {} rows to {}",
        job.sink,
        job.records.len(),
        location
    );
    Ok(WriteMetadata {
        backend: sink.backend(),
        location,
        rows_written: job.records.len(),
        skipped: false,
        timestamp: Utc::now(),
    })
}

/// Result of writing one job to one backend.
#[derive(Debug)]
pub struct SinkWrite {
    pub backend: &'static str,
    pub result: Result<WriteMetadata>,
}

/// The configured set of sink backends.
pub struct ExportSink {
    backends: Vec<Box<dyn TabularSink>>,
}

impl ExportSink {
    pub fn new(backends: Vec<Box<dyn TabularSink>>) -> Self {
        Self { backends }
    }

    /// Build the backends selected by the export mode.
    ///
    /// `access_token` is required when the mode includes the remote sheet.
    pub fn from_config(
        export: &ExportConfig,
        client: reqwest::Client,
        access_token: Option<String>,
    ) -> Result<Self> {
        let mut backends: Vec<Box<dyn TabularSink>> = Vec::new();

        if export.mode.uses_local_file() {
            backends.push(Box::new(LocalFileSink::new(&export.local.output_dir)));
        }
        if export.mode.uses_remote_sheet() {
            let token = access_token.ok_or_else(|| {
                AppError::config(format!(
                    "remote sheet export needs an access token (set {})",
                    export.sheets.access_token_env
                ))
            })?;
            backends.push(Box::new(RemoteSheetSink::new(
                client,
                &export.sheets.api_base,
                &export.sheets.spreadsheet_id,
                token,
            )?));
        }

        Ok(Self::new(backends))
    }

    pub fn backends(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.backends.iter().map(|b| b.backend())
    }

    /// Write a job to every backend. A failing backend does not stop the others.
    pub async fn write(&self, job: &ExportJob<'_>) -> Vec<SinkWrite> {
        let mut writes = Vec::with_capacity(self.backends.len());
        for backend in &self.backends {
            let result = write_snapshot(backend.as_ref(), job).await;
            if let Err(e) = &result {
                log::error!(
                    "{}: {} export failed: {}",
                    job.sink,
                    backend.backend(),
                    e
                );
            }
            writes.push(SinkWrite {
                backend: backend.backend(),
                result,
            });
        }
        writes
    }
}
