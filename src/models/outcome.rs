//! Results of acquisition calls and of whole batch runs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::{Failure, FailureKind};

/// A raw platform item together with the URL it was fetched from.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedItem {
    pub source_url: String,
    pub raw: Value,
}

/// An item that could not be fetched while resolving a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub url: String,
    pub message: String,
}

/// Result of one acquisition call (single post, search, or profile).
///
/// `success` reflects the seeding call only; `items` is the best-effort
/// subset that could be fetched, in resolution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlOutcome {
    pub success: bool,
    pub message: String,
    pub items: Vec<FetchedItem>,
    pub failures: Vec<ItemFailure>,
}

impl CrawlOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            ..Self::default()
        }
    }
}

/// Lifecycle of one target inside a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetState {
    Pending,
    Resolving,
    Resolved,
    ResolutionFailed,
    Normalizing,
    Exporting,
    Done,
}

impl TargetState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: TargetState) -> bool {
        use TargetState::*;
        matches!(
            (self, next),
            (Pending, Resolving)
                | (Resolving, Resolved)
                | (Resolving, ResolutionFailed)
                | (Resolved, Normalizing)
                | (Normalizing, Exporting)
                | (Exporting, Done)
                | (ResolutionFailed, Done)
        )
    }
}

/// Outcome-log entry for one target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetOutcome {
    pub label: String,
    pub sink: String,
    /// Resolution succeeded and no sink write failed.
    pub success: bool,
    pub message: String,
    /// Records handed to the export sink.
    pub record_count: usize,
    pub failures: Vec<Failure>,
    pub final_state: TargetState,
}

impl TargetOutcome {
    pub fn failures_of(&self, kind: FailureKind) -> impl Iterator<Item = &Failure> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }

    pub fn item_failure_count(&self) -> usize {
        self.failures_of(FailureKind::ItemFetch).count()
    }
}

/// Append-only log of target outcomes, written by the orchestrator only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OutcomeLog {
    entries: Vec<TargetOutcome>,
}

impl OutcomeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: TargetOutcome) {
        self.entries.push(outcome);
    }

    pub fn entries(&self) -> &[TargetOutcome] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything a batch run produced, ready to be printed or saved.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: OutcomeLog,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.entries().iter().filter(|o| o.success).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn total_records(&self) -> usize {
        self.outcomes.entries().iter().map(|o| o.record_count).sum()
    }
}
