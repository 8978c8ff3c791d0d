//! Service layer for the crawler application.
//!
//! This module contains the business logic for:
//! - Talking to the platform (`PlatformClient`, `HttpPlatformClient`)
//! - Resolving targets into raw items (`AcquisitionEngine`)
//! - Flattening raw items (`Normalizer`)
//! - Optional media download (`MediaDownloader`)

mod acquisition;
mod media;
mod normalizer;
mod platform;

pub use acquisition::AcquisitionEngine;
pub use media::{HttpMediaDownloader, MediaDownloader};
pub use normalizer::{Normalizer, parse_count, truncate_with_ellipsis};
pub use platform::{ClientReply, HttpPlatformClient, PlatformClient, Session};
