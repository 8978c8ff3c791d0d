// src/models/mod.rs

//! Domain models for the crawler application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod outcome;
mod record;
mod target;

// Re-export all public types
pub use config::{
    Config, ExportConfig, ExportMode, LocalExportConfig, MediaConfig, MediaMode, PacingConfig,
    PlatformConfig, ProxySettings, SearchDefaults, SheetsConfig, TargetEntry,
};
pub use outcome::{
    CrawlOutcome, FetchedItem, ItemFailure, OutcomeLog, RunReport, TargetOutcome, TargetState,
};
pub use record::{Cell, Column, NormalizedRecord};
pub use target::{
    DistanceFilter, GeoPoint, NoteTypeFilter, RangeFilter, SearchFilters, SortMode, Target,
    TargetSpec, TimeFilter,
};
