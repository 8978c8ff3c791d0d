//! Crawl targets and search filters.

use serde::{Deserialize, Serialize};

/// What to crawl for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetSpec {
    /// A single post URL.
    DirectUrl { url: String },
    /// A keyword search, capped at `requested_count` posts.
    SearchQuery {
        query: String,
        requested_count: usize,
        #[serde(default)]
        filters: SearchFilters,
    },
    /// Every post listed on a user profile.
    ProfileUrl { url: String },
}

impl TargetSpec {
    pub fn direct(url: impl Into<String>) -> Self {
        Self::DirectUrl { url: url.into() }
    }

    pub fn search(query: impl Into<String>, requested_count: usize) -> Self {
        Self::SearchQuery {
            query: query.into(),
            requested_count,
            filters: SearchFilters::default(),
        }
    }

    pub fn profile(url: impl Into<String>) -> Self {
        Self::ProfileUrl { url: url.into() }
    }

    /// Short human-readable description used in log lines.
    pub fn describe(&self) -> String {
        match self {
            TargetSpec::DirectUrl { url } => format!("post {url}"),
            TargetSpec::SearchQuery {
                query,
                requested_count,
                ..
            } => format!("search '{query}' (up to {requested_count})"),
            TargetSpec::ProfileUrl { url } => format!("profile {url}"),
        }
    }
}

/// One entry of a batch: a label, the sink it exports to, and what to crawl.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// Job label; also names the local export file.
    pub label: String,
    /// Sink identifier; selects the tab of the shared sheet.
    pub sink: String,
    pub spec: TargetSpec,
}

impl Target {
    pub fn new(label: impl Into<String>, sink: impl Into<String>, spec: TargetSpec) -> Self {
        Self {
            label: label.into(),
            sink: sink.into(),
            spec,
        }
    }
}

/// Search result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    General,
    Latest,
    MostLiked,
    MostCommented,
    MostCollected,
}

/// Post media type restriction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteTypeFilter {
    #[default]
    All,
    Video,
    Image,
}

/// Publication time window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFilter {
    #[default]
    All,
    Day,
    Week,
    HalfYear,
}

/// Relationship of the post to the searching account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeFilter {
    #[default]
    All,
    Viewed,
    NotViewed,
    Followed,
}

/// Distance from the searching location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceFilter {
    #[default]
    All,
    SameCity,
    Nearby,
}

/// Coordinates used by distance filtering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Filters forwarded verbatim to the platform search call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    pub sort: SortMode,
    pub note_type: NoteTypeFilter,
    pub time: TimeFilter,
    pub range: RangeFilter,
    pub distance: DistanceFilter,
    pub geo: Option<GeoPoint>,
}

impl SearchFilters {
    /// Platform integer codes in call order: sort, type, time, range, distance.
    pub fn codes(&self) -> [u8; 5] {
        [
            self.sort as u8,
            self.note_type as u8,
            self.time as u8,
            self.range as u8,
            self.distance as u8,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filters_are_all_zero() {
        let filters = SearchFilters::default();
        assert_eq!(filters.codes(), [0, 0, 0, 0, 0]);
        assert!(filters.geo.is_none());
    }

    #[test]
    fn test_filter_codes_follow_declaration_order() {
        let filters = SearchFilters {
            sort: SortMode::MostCollected,
            note_type: NoteTypeFilter::Image,
            time: TimeFilter::HalfYear,
            range: RangeFilter::Followed,
            distance: DistanceFilter::Nearby,
            geo: None,
        };
        assert_eq!(filters.codes(), [4, 2, 3, 3, 2]);
    }

    #[test]
    fn test_filters_parse_from_toml() {
        let filters: SearchFilters = toml::from_str(
            r#"
            sort = "latest"
            distance = "same_city"
            geo = { latitude = 1.29, longitude = 103.85 }
            "#,
        )
        .unwrap();
        assert_eq!(filters.sort, SortMode::Latest);
        assert_eq!(filters.distance, DistanceFilter::SameCity);
        assert_eq!(filters.note_type, NoteTypeFilter::All);
        assert_eq!(filters.geo.unwrap().longitude, 103.85);
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            TargetSpec::search("Wise", 20).describe(),
            "search 'Wise' (up to 20)"
        );
    }
}
