//! Normalized post record and its tabular projection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A crawled post flattened into a fixed schema.
///
/// Every field defaults to empty or zero except `source_url`, which the
/// normalizer always stamps with the URL the item was fetched from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub note_id: String,
    pub note_type: String,
    pub title: String,
    pub description: String,
    pub like_count: u64,
    pub collect_count: u64,
    pub comment_count: u64,
    pub share_count: u64,
    pub author_name: String,
    pub author_id: String,
    pub location: String,
    pub published_at: String,
    pub tags: Vec<String>,
    pub image_urls: Vec<String>,
    pub video_url: String,
    pub source_url: String,
}

impl NormalizedRecord {
    /// Value of one export column for this record.
    pub fn cell(&self, column: Column) -> Cell {
        match column {
            Column::NoteId => Cell::text(&self.note_id),
            Column::NoteType => Cell::text(&self.note_type),
            Column::Title => Cell::text(&self.title),
            Column::Desc => Cell::text(&self.description),
            Column::LikeCount => Cell::Number(self.like_count),
            Column::CollectCount => Cell::Number(self.collect_count),
            Column::CommentCount => Cell::Number(self.comment_count),
            Column::ShareCount => Cell::Number(self.share_count),
            Column::Author => Cell::text(&self.author_name),
            Column::AuthorId => Cell::text(&self.author_id),
            Column::Ip => Cell::text(&self.location),
            Column::PublishedAt => Cell::text(&self.published_at),
            Column::Tags => Cell::Text(self.tags.join(",")),
            Column::ImageUrls => Cell::Text(self.image_urls.join("\n")),
            Column::VideoUrl => Cell::text(&self.video_url),
            Column::Url => Cell::text(&self.source_url),
        }
    }

    /// Project the record onto a declared header.
    pub fn row(&self, header: &[Column]) -> Vec<Cell> {
        header.iter().map(|&column| self.cell(column)).collect()
    }
}

/// An exportable column. The header text is the snake_case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    NoteId,
    NoteType,
    Title,
    #[serde(alias = "description")]
    Desc,
    LikeCount,
    CollectCount,
    CommentCount,
    ShareCount,
    #[serde(alias = "author_name")]
    Author,
    AuthorId,
    #[serde(alias = "location")]
    Ip,
    PublishedAt,
    Tags,
    ImageUrls,
    VideoUrl,
    #[serde(alias = "source_url")]
    Url,
}

impl Column {
    /// The sheet layout used when no header is configured.
    pub const DEFAULT_HEADER: [Column; 10] = [
        Column::Title,
        Column::Desc,
        Column::LikeCount,
        Column::CollectCount,
        Column::CommentCount,
        Column::ShareCount,
        Column::Author,
        Column::AuthorId,
        Column::Ip,
        Column::Url,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Column::NoteId => "note_id",
            Column::NoteType => "note_type",
            Column::Title => "title",
            Column::Desc => "desc",
            Column::LikeCount => "like_count",
            Column::CollectCount => "collect_count",
            Column::CommentCount => "comment_count",
            Column::ShareCount => "share_count",
            Column::Author => "author",
            Column::AuthorId => "author_id",
            Column::Ip => "ip",
            Column::PublishedAt => "published_at",
            Column::Tags => "tags",
            Column::ImageUrls => "image_urls",
            Column::VideoUrl => "video_url",
            Column::Url => "url",
        }
    }

    /// Header row for a list of columns.
    pub fn header_row(columns: &[Column]) -> Vec<Cell> {
        columns.iter().map(|c| Cell::text(c.name())).collect()
    }
}

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(u64),
}

impl Cell {
    pub fn text(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> NormalizedRecord {
        NormalizedRecord {
            title: "Card review".to_string(),
            description: "Cheap FX".to_string(),
            like_count: 12,
            author_name: "amy".to_string(),
            tags: vec!["travel".to_string(), "fx".to_string()],
            source_url: "https://www.xiaohongshu.com/explore/abc".to_string(),
            ..NormalizedRecord::default()
        }
    }

    #[test]
    fn test_row_follows_header_order() {
        let record = sample_record();
        let row = record.row(&[Column::Url, Column::LikeCount, Column::Title]);
        assert_eq!(
            row,
            vec![
                Cell::text("https://www.xiaohongshu.com/explore/abc"),
                Cell::Number(12),
                Cell::text("Card review"),
            ]
        );
    }

    #[test]
    fn test_default_header_names() {
        let names: Vec<String> = Column::header_row(&Column::DEFAULT_HEADER)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            names,
            vec![
                "title",
                "desc",
                "like_count",
                "collect_count",
                "comment_count",
                "share_count",
                "author",
                "author_id",
                "ip",
                "url"
            ]
        );
    }

    #[test]
    fn test_column_aliases() {
        let columns: Vec<Column> =
            serde_json::from_str(r#"["description", "location", "source_url", "tags"]"#).unwrap();
        assert_eq!(
            columns,
            vec![Column::Desc, Column::Ip, Column::Url, Column::Tags]
        );
    }

    #[test]
    fn test_cell_serializes_untagged() {
        let json = serde_json::to_string(&vec![Cell::text("a"), Cell::Number(3)]).unwrap();
        assert_eq!(json, r#"["a",3]"#);
        assert_eq!(sample_record().cell(Column::Tags).to_string(), "travel,fx");
    }
}
