//! Batch pipeline for crawler runs.
//!
//! - `BatchOrchestrator`: resolve, normalize, export each target in order
//! - `Pacer`: randomized delay between targets

mod batch;
mod pacing;

pub use batch::{BatchOrchestrator, MediaStage};
pub use pacing::Pacer;
