//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Column, SearchFilters, Target, TargetSpec};
use crate::pipeline::Pacer;
use crate::utils::url::sanitize_file_name;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Platform gateway and HTTP behavior settings
    #[serde(default)]
    pub platform: PlatformConfig,

    /// Optional proxy forwarded with every platform call
    #[serde(default)]
    pub proxy: Option<ProxySettings>,

    /// Delay between targets
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Snapshot destinations and header layout
    #[serde(default)]
    pub export: ExportConfig,

    /// Optional media download
    #[serde(default)]
    pub media: MediaConfig,

    /// Defaults applied to search targets
    #[serde(default)]
    pub search: SearchDefaults,

    /// Ordered crawl targets
    #[serde(default = "defaults::targets")]
    pub targets: Vec<TargetEntry>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Resolve the configured target entries into batch targets.
    pub fn targets(&self) -> Result<Vec<Target>> {
        self.targets
            .iter()
            .map(|entry| entry.to_target(&self.search))
            .collect()
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.platform.user_agent.trim().is_empty() {
            return Err(AppError::validation("platform.user_agent is empty"));
        }
        if self.platform.timeout_secs == 0 {
            return Err(AppError::validation("platform.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.platform.gateway_url)?;
        url::Url::parse(&self.platform.item_url_base)?;

        Pacer::from_config(&self.pacing)?;

        if self.export.header.is_empty() {
            return Err(AppError::validation("export.header is empty"));
        }
        if self.export.compact_preview && self.export.preview_length == 0 {
            return Err(AppError::validation("export.preview_length must be > 0"));
        }
        if self.export.mode.uses_remote_sheet()
            && self.export.sheets.spreadsheet_id.trim().is_empty()
        {
            return Err(AppError::validation(
                "export.sheets.spreadsheet_id is required for remote sheet export",
            ));
        }

        if self.search.count == 0 {
            return Err(AppError::validation("search.count must be > 0"));
        }
        if self.targets.is_empty() {
            return Err(AppError::validation("No targets defined"));
        }

        let local = self.export.mode.uses_local_file();
        let remote = self.export.mode.uses_remote_sheet();
        let mut labels = HashSet::new();
        let mut files = HashSet::new();
        let mut tabs = HashSet::new();
        for target in self.targets()? {
            if !labels.insert(target.label.clone()) {
                return Err(AppError::validation(format!(
                    "Duplicate target label '{}'",
                    target.label
                )));
            }
            let file = sanitize_file_name(&target.label);
            if local && !files.insert(file.clone()) {
                return Err(AppError::validation(format!(
                    "Target label '{}' collides with another target on local file '{}.csv'",
                    target.label, file
                )));
            }
            if remote && !tabs.insert(target.sink.clone()) {
                return Err(AppError::validation(format!(
                    "Target '{}' shares sheet tab '{}' with another target",
                    target.label, target.sink
                )));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            platform: PlatformConfig::default(),
            proxy: None,
            pacing: PacingConfig::default(),
            export: ExportConfig::default(),
            media: MediaConfig::default(),
            search: SearchDefaults::default(),
            targets: defaults::targets(),
        }
    }
}

/// Platform gateway and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Base URL of the signing gateway that performs platform calls
    #[serde(default = "defaults::gateway_url")]
    pub gateway_url: String,

    /// Base of canonical post URLs built from search/profile hits
    #[serde(default = "defaults::item_url_base")]
    pub item_url_base: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Credential (cookie string); read from `credential_env` when absent
    #[serde(default)]
    pub credential: Option<String>,

    /// Environment variable holding the credential
    #[serde(default = "defaults::credential_env")]
    pub credential_env: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            gateway_url: defaults::gateway_url(),
            item_url_base: defaults::item_url_base(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            credential: None,
            credential_env: defaults::credential_env(),
        }
    }
}

/// Proxy endpoints per scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySettings {
    #[serde(default)]
    pub http: Option<String>,
    #[serde(default)]
    pub https: Option<String>,
}

/// Bounds of the random pause between targets, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "defaults::min_delay")]
    pub min_delay_secs: f64,

    #[serde(default = "defaults::max_delay")]
    pub max_delay_secs: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: defaults::min_delay(),
            max_delay_secs: defaults::max_delay(),
        }
    }
}

/// Which sink backends receive snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportMode {
    #[default]
    LocalFile,
    RemoteSheet,
    Both,
    None,
}

impl ExportMode {
    pub fn uses_local_file(self) -> bool {
        matches!(self, ExportMode::LocalFile | ExportMode::Both)
    }

    pub fn uses_remote_sheet(self) -> bool {
        matches!(self, ExportMode::RemoteSheet | ExportMode::Both)
    }
}

/// Snapshot export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub mode: ExportMode,

    /// Declared column order of every snapshot
    #[serde(default = "defaults::header")]
    pub header: Vec<Column>,

    /// Cut long descriptions to `preview_length` characters
    #[serde(default)]
    pub compact_preview: bool,

    #[serde(default = "defaults::preview_length")]
    pub preview_length: usize,

    /// Where to save the JSON run report, if anywhere
    #[serde(default)]
    pub report_path: Option<String>,

    #[serde(default)]
    pub local: LocalExportConfig,

    #[serde(default)]
    pub sheets: SheetsConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            mode: ExportMode::default(),
            header: defaults::header(),
            compact_preview: false,
            preview_length: defaults::preview_length(),
            report_path: None,
            local: LocalExportConfig::default(),
            sheets: SheetsConfig::default(),
        }
    }
}

/// Local spreadsheet file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalExportConfig {
    #[serde(default = "defaults::output_dir")]
    pub output_dir: String,
}

impl Default for LocalExportConfig {
    fn default() -> Self {
        Self {
            output_dir: defaults::output_dir(),
        }
    }
}

/// Remote shared spreadsheet settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    #[serde(default)]
    pub spreadsheet_id: String,

    #[serde(default = "defaults::sheets_api_base")]
    pub api_base: String,

    /// Bearer access token; read from `access_token_env` when absent
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default = "defaults::access_token_env")]
    pub access_token_env: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            api_base: defaults::sheets_api_base(),
            access_token: None,
            access_token_env: defaults::access_token_env(),
        }
    }
}

/// Which media files to download per record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaMode {
    #[default]
    All,
    Images,
    Video,
}

impl MediaMode {
    pub fn wants_images(self) -> bool {
        matches!(self, MediaMode::All | MediaMode::Images)
    }

    pub fn wants_video(self) -> bool {
        matches!(self, MediaMode::All | MediaMode::Video)
    }
}

/// Media download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub mode: MediaMode,

    #[serde(default = "defaults::media_dir")]
    pub output_dir: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: MediaMode::default(),
            output_dir: defaults::media_dir(),
        }
    }
}

/// Defaults for search targets that do not set their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDefaults {
    #[serde(default = "defaults::search_count")]
    pub count: usize,

    #[serde(default)]
    pub filters: SearchFilters,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            count: defaults::search_count(),
            filters: SearchFilters::default(),
        }
    }
}

/// A target as written in the config file. Exactly one of `query`, `url`
/// and `profile` must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetEntry {
    pub label: String,

    /// Sink identifier; defaults to the label
    #[serde(default)]
    pub sink: Option<String>,

    #[serde(default)]
    pub query: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub profile: Option<String>,

    #[serde(default)]
    pub count: Option<usize>,

    #[serde(default)]
    pub filters: Option<SearchFilters>,
}

impl TargetEntry {
    /// Build a batch target, filling search defaults.
    pub fn to_target(&self, search: &SearchDefaults) -> Result<Target> {
        let label = self.label.trim();
        if label.is_empty() {
            return Err(AppError::validation("Target label is empty"));
        }

        let spec = match (&self.query, &self.url, &self.profile) {
            (Some(query), None, None) => TargetSpec::SearchQuery {
                query: query.clone(),
                requested_count: self.count.unwrap_or(search.count),
                filters: self.filters.unwrap_or(search.filters),
            },
            (None, Some(url), None) => TargetSpec::direct(url.clone()),
            (None, None, Some(profile)) => TargetSpec::profile(profile.clone()),
            _ => {
                return Err(AppError::validation(format!(
                    "Target '{label}' must set exactly one of query, url, profile"
                )));
            }
        };

        let sink = self
            .sink
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(label);

        Ok(Target::new(label, sink, spec))
    }
}

mod defaults {
    use super::TargetEntry;
    use crate::models::Column;

    // Platform defaults
    pub fn gateway_url() -> String {
        "http://127.0.0.1:5005".into()
    }
    pub fn item_url_base() -> String {
        "https://www.xiaohongshu.com/explore".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; notecrawler/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn credential_env() -> String {
        "COOKIES".into()
    }

    // Pacing defaults
    pub fn min_delay() -> f64 {
        10.0
    }
    pub fn max_delay() -> f64 {
        20.0
    }

    // Export defaults
    pub fn header() -> Vec<Column> {
        Column::DEFAULT_HEADER.to_vec()
    }
    pub fn preview_length() -> usize {
        100
    }
    pub fn output_dir() -> String {
        "output".into()
    }
    pub fn sheets_api_base() -> String {
        "https://sheets.googleapis.com/v4/spreadsheets".into()
    }
    pub fn access_token_env() -> String {
        "GOOGLE_SHEETS_TOKEN".into()
    }

    // Media defaults
    pub fn media_dir() -> String {
        "media".into()
    }

    // Search defaults
    pub fn search_count() -> usize {
        100
    }

    // Target defaults
    pub fn targets() -> Vec<TargetEntry> {
        [
            ("dtcpay", "dtcpay_v2"),
            ("Revolut", "Revolut_v2"),
            ("Wise", "Wise_v2"),
            ("YouTrip", "YouTrip_v2"),
            ("Redotpay", "Redotpay_v2"),
            ("FOMOpay", "FOMOpay_v2"),
        ]
        .into_iter()
        .map(|(keyword, sheet)| TargetEntry {
            label: keyword.to_string(),
            sink: Some(sheet.to_string()),
            query: Some(keyword.to_string()),
            ..TargetEntry::default()
        })
        .collect()
    }
}
