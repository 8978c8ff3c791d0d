// src/lib.rs

//! Post crawler library.
//!
//! Resolves configured targets (direct post URLs, keyword searches, profile
//! pages) through a pluggable platform client, flattens each post into a
//! fixed record shape and publishes one snapshot per target to a CSV file
//! or a shared spreadsheet tab.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

pub use error::{AppError, Result};
