// src/pipeline/batch.rs

//! Sequential batch run over configured targets.
//!
//! Each target goes through:
//!
//! ```text
//! Pending → Resolving → Resolved → Normalizing → Exporting → Done
//!                     ↘ ResolutionFailed ────────────────────↗
//! ```
//!
//! Failures are recorded in the outcome log and never stop the loop.
//! Targets run one at a time with a randomized pause between them.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;

use crate::error::{Failure, FailureKind, Result};
use crate::models::{
    Column, Config, MediaMode, NormalizedRecord, OutcomeLog, RunReport, Target, TargetOutcome,
    TargetState,
};
use crate::pipeline::Pacer;
use crate::services::{
    AcquisitionEngine, HttpMediaDownloader, MediaDownloader, Normalizer, PlatformClient, Session,
};
use crate::storage::{ExportJob, ExportSink};
use crate::utils::{http, report};

/// Optional per-record media download.
pub struct MediaStage {
    downloader: Arc<dyn MediaDownloader>,
    destination: PathBuf,
    mode: MediaMode,
}

impl MediaStage {
    pub fn new(
        downloader: Arc<dyn MediaDownloader>,
        destination: impl Into<PathBuf>,
        mode: MediaMode,
    ) -> Self {
        Self {
            downloader,
            destination: destination.into(),
            mode,
        }
    }

    async fn download_all(&self, records: &[NormalizedRecord]) {
        for record in records {
            match self
                .downloader
                .download(record, &self.destination, self.mode)
                .await
            {
                Ok(0) => {}
                Ok(count) => log::debug!("{}: saved {} media files", record.note_id, count),
                Err(e) => log::warn!("{}: media download failed: {}", record.source_url, e),
            }
        }
    }
}

/// Tracks one target through its lifecycle.
struct Lifecycle<'a> {
    label: &'a str,
    state: TargetState,
}

impl<'a> Lifecycle<'a> {
    fn new(label: &'a str) -> Self {
        Self {
            label,
            state: TargetState::Pending,
        }
    }

    fn advance(&mut self, next: TargetState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "{}: illegal transition {:?} -> {:?}",
            self.label,
            self.state,
            next
        );
        log::debug!("{}: {:?} -> {:?}", self.label, self.state, next);
        self.state = next;
    }
}

/// Runs targets through acquisition, normalization and export.
pub struct BatchOrchestrator {
    engine: AcquisitionEngine,
    normalizer: Normalizer,
    sink: ExportSink,
    header: Vec<Column>,
    pacer: Pacer,
    session: Session,
    media: Option<MediaStage>,
}

impl BatchOrchestrator {
    pub fn new(
        engine: AcquisitionEngine,
        normalizer: Normalizer,
        sink: ExportSink,
        header: Vec<Column>,
        pacer: Pacer,
        session: Session,
    ) -> Self {
        Self {
            engine,
            normalizer,
            sink,
            header,
            pacer,
            session,
            media: None,
        }
    }

    /// Download media for every exported record.
    pub fn with_media(mut self, media: MediaStage) -> Self {
        self.media = Some(media);
        self
    }

    /// Wire an orchestrator from configuration.
    ///
    /// Credentials are passed in rather than read here; `sheets_token` is
    /// only needed when the export mode includes the remote sheet.
    pub fn from_config(
        config: &Config,
        client: Arc<dyn PlatformClient>,
        credential: impl Into<String>,
        sheets_token: Option<String>,
    ) -> Result<Self> {
        let engine = AcquisitionEngine::new(client, &config.platform.item_url_base);
        let normalizer = Normalizer::from_config(&config.export);

        let sheets_client = http::create_async_client(&config.platform, None)?;
        let sink = ExportSink::from_config(&config.export, sheets_client, sheets_token)?;

        let pacer = Pacer::from_config(&config.pacing)?;
        let session = Session::new(credential, config.proxy.clone());

        let orchestrator = Self::new(
            engine,
            normalizer,
            sink,
            config.export.header.clone(),
            pacer,
            session,
        );

        if !config.media.enabled {
            return Ok(orchestrator);
        }
        let media_client = http::create_async_client(&config.platform, config.proxy.as_ref())?;
        Ok(orchestrator.with_media(MediaStage::new(
            Arc::new(HttpMediaDownloader::new(media_client)),
            &config.media.output_dir,
            config.media.mode,
        )))
    }

    /// Process every target in order and collect the outcome log.
    pub async fn run(&self, targets: &[Target]) -> RunReport {
        let started_at = Utc::now();
        report::header(&format!("Crawling {} targets", targets.len()));

        let mut outcomes = OutcomeLog::new();
        for (index, target) in targets.iter().enumerate() {
            if index > 0 {
                self.pacer.pause().await;
            }

            report::step(
                index + 1,
                targets.len(),
                &format!("{}: {}", target.label, target.spec.describe()),
            );
            let outcome = self.run_target(target).await;
            report::sub_item(&format!(
                "{} ({} records, {} item failures)",
                if outcome.success { "ok" } else { "failed" },
                outcome.record_count,
                outcome.item_failure_count()
            ));
            outcomes.record(outcome);
        }

        let run = RunReport {
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };

        report::separator();
        report::summary(
            "Batch run",
            &[
                ("targets", run.outcomes.len().to_string()),
                ("succeeded", run.succeeded().to_string()),
                ("failed", run.failed().to_string()),
                ("records", run.total_records().to_string()),
                (
                    "duration",
                    format!(
                        "{}s",
                        (run.finished_at - run.started_at).num_seconds()
                    ),
                ),
            ],
        );
        run
    }

    /// Process one target; never fails.
    pub async fn run_target(&self, target: &Target) -> TargetOutcome {
        let mut lifecycle = Lifecycle::new(&target.label);

        lifecycle.advance(TargetState::Resolving);
        let resolved = self.engine.resolve(&target.spec, &self.session).await;

        let mut failures: Vec<Failure> = resolved
            .failures
            .iter()
            .map(|f| match f.url.as_str() {
                "" => Failure::item_fetch(&f.message),
                url => Failure::item_fetch(format!("{url}: {}", f.message)),
            })
            .collect();

        if !resolved.success {
            lifecycle.advance(TargetState::ResolutionFailed);
            log::warn!("{}: resolution failed: {}", target.label, resolved.message);
            failures.insert(0, Failure::resolution(&resolved.message));
            lifecycle.advance(TargetState::Done);

            return TargetOutcome {
                label: target.label.clone(),
                sink: target.sink.clone(),
                success: false,
                message: resolved.message,
                record_count: 0,
                failures,
                final_state: lifecycle.state,
            };
        }

        lifecycle.advance(TargetState::Resolved);
        lifecycle.advance(TargetState::Normalizing);
        let records: Vec<NormalizedRecord> = resolved
            .items
            .iter()
            .map(|item| self.normalizer.normalize(&item.raw, &item.source_url))
            .collect();

        if let Some(media) = &self.media {
            media.download_all(&records).await;
        }

        lifecycle.advance(TargetState::Exporting);
        let job = ExportJob {
            label: &target.label,
            sink: &target.sink,
            header: &self.header,
            records: &records,
        };
        for write in self.sink.write(&job).await {
            if let Err(e) = write.result {
                failures.push(Failure::export(format!("{}: {}", write.backend, e)));
            }
        }
        lifecycle.advance(TargetState::Done);

        let export_error = failures
            .iter()
            .find(|f| f.kind == FailureKind::Export)
            .map(|f| f.to_string());

        TargetOutcome {
            label: target.label.clone(),
            sink: target.sink.clone(),
            success: export_error.is_none(),
            message: export_error.unwrap_or(resolved.message),
            record_count: records.len(),
            failures,
            final_state: lifecycle.state,
        }
    }
}
