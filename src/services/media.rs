// src/services/media.rs

//! Optional media download for normalized records.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{MediaMode, NormalizedRecord};
use crate::utils::url::sanitize_file_name;

/// Downloads the media referenced by a record.
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    /// Save the record's media under `destination`; returns the number of files written.
    async fn download(
        &self,
        record: &NormalizedRecord,
        destination: &Path,
        mode: MediaMode,
    ) -> Result<usize>;
}

/// Plain HTTP downloader writing one folder per record.
pub struct HttpMediaDownloader {
    client: reqwest::Client,
}

impl HttpMediaDownloader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Folder for a record: `{author}_{title}_{note_id}`, sanitized.
    pub fn record_dir(destination: &Path, record: &NormalizedRecord) -> PathBuf {
        let name = format!(
            "{}_{}_{}",
            record.author_name, record.title, record.note_id
        );
        destination.join(sanitize_file_name(&name))
    }

    async fn fetch_to(&self, url: &str, path: &Path) -> Result<()> {
        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        tokio::fs::write(path, &bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl MediaDownloader for HttpMediaDownloader {
    async fn download(
        &self,
        record: &NormalizedRecord,
        destination: &Path,
        mode: MediaMode,
    ) -> Result<usize> {
        let mut jobs: Vec<(String, &str)> = Vec::new();
        if mode.wants_images() {
            for (index, url) in record.image_urls.iter().enumerate() {
                jobs.push((format!("image_{index}.jpg"), url.as_str()));
            }
        }
        if mode.wants_video() && !record.video_url.is_empty() {
            jobs.push(("video.mp4".to_string(), record.video_url.as_str()));
        }
        if jobs.is_empty() {
            return Ok(0);
        }

        let dir = Self::record_dir(destination, record);
        tokio::fs::create_dir_all(&dir).await?;

        for (file_name, url) in &jobs {
            self.fetch_to(url, &dir.join(file_name)).await?;
        }
        log::debug!("Saved {} media files to {}", jobs.len(), dir.display());
        Ok(jobs.len())
    }
}
