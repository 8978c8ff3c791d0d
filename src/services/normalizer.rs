// src/services/normalizer.rs

//! Maps raw platform items onto [`NormalizedRecord`].
//!
//! Payloads are looked up along several known paths; anything absent or of
//! an unexpected type falls back to "" or 0. Normalization never fails.

use chrono::DateTime;
use serde_json::Value;
use unicode_segmentation::UnicodeSegmentation;

use crate::models::{ExportConfig, NormalizedRecord};
use crate::utils::url::extract_item_id;

/// Appended to descriptions cut by compact preview.
const ELLIPSIS: &str = "...";

/// Host serving videos addressed by `origin_video_key`.
const VIDEO_CDN: &str = "https://sns-video-bd.xhscdn.com";

/// Raw item → normalized record.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    /// Maximum description length in user-perceived characters.
    preview_length: Option<usize>,
}

impl Normalizer {
    /// Normalizer that keeps descriptions verbatim.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizer that cuts descriptions longer than `max_chars`.
    pub fn with_compact_preview(max_chars: usize) -> Self {
        Self {
            preview_length: Some(max_chars),
        }
    }

    pub fn from_config(export: &ExportConfig) -> Self {
        if export.compact_preview {
            Self::with_compact_preview(export.preview_length)
        } else {
            Self::new()
        }
    }

    /// Normalize one raw item. `source_url` always wins over any URL in the payload.
    pub fn normalize(&self, raw: &Value, source_url: &str) -> NormalizedRecord {
        let item = raw.pointer("/data/items/0").unwrap_or(raw);
        let card = item.get("note_card").unwrap_or(item);

        let note_id = first_text(item, &["/id", "/note_id"])
            .or_else(|| first_text(card, &["/note_id", "/id"]))
            .or_else(|| extract_item_id(source_url))
            .unwrap_or_default();

        let description = text(card, &["/desc", "/description"]);

        NormalizedRecord {
            note_id,
            note_type: note_type(card),
            title: text(card, &["/title", "/display_title"]),
            description: self.preview(description),
            like_count: count(card, &["/interact_info/liked_count", "/liked_count"]),
            collect_count: count(card, &["/interact_info/collected_count", "/collected_count"]),
            comment_count: count(card, &["/interact_info/comment_count", "/comment_count"]),
            share_count: count(card, &["/interact_info/share_count", "/share_count"]),
            author_name: text(card, &["/user/nickname", "/user/nick_name", "/nickname"]),
            author_id: text(card, &["/user/user_id", "/user_id"]),
            location: text(card, &["/ip_location"]),
            published_at: published_at(card),
            tags: tags(card),
            image_urls: image_urls(card),
            video_url: video_url(card),
            source_url: source_url.to_string(),
        }
    }

    fn preview(&self, description: String) -> String {
        match self.preview_length {
            Some(max) => truncate_with_ellipsis(&description, max),
            None => description,
        }
    }
}

/// Cut `text` to `max` grapheme clusters, marking the cut with an ellipsis.
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    let mut graphemes = text.graphemes(true);
    let prefix: String = graphemes.by_ref().take(max).collect();
    if graphemes.next().is_some() {
        format!("{prefix}{ELLIPSIS}")
    } else {
        prefix
    }
}

/// Parse a display count: `123`, `"1,024"`, `"1.2万"`, `"3亿"`, `"10+"`, `"2.5k"`.
pub fn parse_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| *c != ',' && *c != '+')
                .collect();
            let (digits, scale) =
                if let Some(rest) = cleaned.strip_suffix(|c: char| matches!(c, '万' | 'w' | 'W')) {
                    (rest, 1e4)
                } else if let Some(rest) = cleaned.strip_suffix('亿') {
                    (rest, 1e8)
                } else if let Some(rest) = cleaned.strip_suffix(|c: char| matches!(c, 'k' | 'K')) {
                    (rest, 1e3)
                } else {
                    (cleaned.as_str(), 1.0)
                };
            let number: f64 = digits.trim().parse().ok()?;
            (number.is_finite() && number >= 0.0).then(|| (number * scale).round() as u64)
        }
        _ => None,
    }
}

fn first_text(value: &Value, paths: &[&str]) -> Option<String> {
    paths.iter().find_map(|path| match value.pointer(path)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn text(value: &Value, paths: &[&str]) -> String {
    first_text(value, paths).unwrap_or_default()
}

fn count(value: &Value, paths: &[&str]) -> u64 {
    paths
        .iter()
        .find_map(|path| value.pointer(path).and_then(parse_count))
        .unwrap_or(0)
}

fn note_type(card: &Value) -> String {
    match card.pointer("/type").and_then(Value::as_str) {
        Some("video") => "video".to_string(),
        Some(_) => "image".to_string(),
        None => card
            .pointer("/note_type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    }
}

fn published_at(card: &Value) -> String {
    let raw = card.pointer("/time").or_else(|| card.pointer("/upload_time"));
    match raw {
        Some(Value::Number(n)) => n.as_i64().and_then(format_timestamp).unwrap_or_default(),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(format_timestamp)
            .unwrap_or_else(|| s.clone()),
        _ => String::new(),
    }
}

/// Format an epoch timestamp (milliseconds or seconds) as UTC.
fn format_timestamp(value: i64) -> Option<String> {
    let datetime = if value.abs() >= 100_000_000_000 {
        DateTime::from_timestamp_millis(value)?
    } else {
        DateTime::from_timestamp(value, 0)?
    };
    Some(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
}

fn tags(card: &Value) -> Vec<String> {
    if let Some(list) = card.pointer("/tag_list").and_then(Value::as_array) {
        return list
            .iter()
            .filter_map(|tag| tag.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect();
    }
    string_list(card.pointer("/tags"))
}

fn image_urls(card: &Value) -> Vec<String> {
    if let Some(list) = card.pointer("/image_list").and_then(Value::as_array) {
        return list
            .iter()
            .filter_map(|image| {
                first_text(
                    image,
                    &["/url_default", "/info_list/1/url", "/info_list/0/url", "/url"],
                )
            })
            .collect();
    }
    string_list(card.pointer("/image_urls"))
}

fn video_url(card: &Value) -> String {
    if let Some(url) = first_text(card, &["/video/media/stream/h264/0/master_url", "/video_addr"]) {
        return url;
    }
    first_text(card, &["/video/consumer/origin_video_key"])
        .map(|key| format!("{VIDEO_CDN}/{key}"))
        .unwrap_or_default()
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://www.xiaohongshu.com/explore/64f0aa?xsec_token=tok";

    fn full_payload() -> Value {
        json!({
            "data": {"items": [{
                "id": "64f0aa",
                "model_type": "note",
                "note_card": {
                    "type": "normal",
                    "title": "Travel card review",
                    "desc": "Best rates in town",
                    "time": 1_700_000_000_000_i64,
                    "ip_location": "Singapore",
                    "user": {"nickname": "amy", "user_id": "u-1"},
                    "interact_info": {
                        "liked_count": "1.2万",
                        "collected_count": "356",
                        "comment_count": 42,
                        "share_count": "10+"
                    },
                    "tag_list": [{"name": "travel"}, {"name": "fintech"}],
                    "image_list": [
                        {"url_default": "https://img/1.jpg"},
                        {"info_list": [{"url": "https://img/2-small.jpg"}, {"url": "https://img/2.jpg"}]}
                    ],
                    "url": "https://evil.example.com/should-not-win"
                }
            }]}
        })
    }

    #[test]
    fn test_normalize_full_payload() {
        let record = Normalizer::new().normalize(&full_payload(), URL);

        assert_eq!(record.note_id, "64f0aa");
        assert_eq!(record.note_type, "image");
        assert_eq!(record.title, "Travel card review");
        assert_eq!(record.description, "Best rates in town");
        assert_eq!(record.like_count, 12_000);
        assert_eq!(record.collect_count, 356);
        assert_eq!(record.comment_count, 42);
        assert_eq!(record.share_count, 10);
        assert_eq!(record.author_name, "amy");
        assert_eq!(record.author_id, "u-1");
        assert_eq!(record.location, "Singapore");
        assert_eq!(record.published_at, "2023-11-14 22:13:20");
        assert_eq!(record.tags, vec!["travel", "fintech"]);
        assert_eq!(record.image_urls, vec!["https://img/1.jpg", "https://img/2.jpg"]);
        assert_eq!(record.video_url, "");
        assert_eq!(record.source_url, URL);
    }

    #[test]
    fn test_missing_fields_default() {
        let record = Normalizer::new().normalize(&json!({}), URL);
        assert_eq!(record.title, "");
        assert_eq!(record.like_count, 0);
        assert!(record.tags.is_empty());
        // id recovered from the fetch URL
        assert_eq!(record.note_id, "64f0aa");
        assert_eq!(record.source_url, URL);
    }

    #[test]
    fn test_unexpected_shapes_never_panic() {
        let odd = json!({
            "note_card": {
                "title": 12,
                "desc": ["not", "a", "string"],
                "interact_info": "hidden",
                "user": null,
                "tag_list": "x",
                "image_list": [null, 3],
                "time": "yesterday"
            }
        });
        let record = Normalizer::new().normalize(&odd, URL);
        assert_eq!(record.title, "12");
        assert_eq!(record.description, "");
        assert_eq!(record.like_count, 0);
        assert_eq!(record.author_name, "");
        assert!(record.tags.is_empty());
        assert!(record.image_urls.is_empty());
        assert_eq!(record.published_at, "yesterday");

        for raw in [Value::Null, json!(7), json!("text"), json!([1, 2])] {
            let record = Normalizer::new().normalize(&raw, URL);
            assert_eq!(record.source_url, URL);
        }
    }

    #[test]
    fn test_source_url_ignores_embedded_url() {
        let flat = json!({"note_url": "https://other/1", "url": "https://other/2", "title": "t"});
        let record = Normalizer::new().normalize(&flat, URL);
        assert_eq!(record.source_url, URL);
    }

    #[test]
    fn test_flat_record_shape() {
        let flat = json!({
            "note_id": "abc",
            "note_type": "video",
            "liked_count": "7",
            "nickname": "bob",
            "user_id": "u-2",
            "upload_time": "2024-01-02 03:04:05",
            "video_addr": "https://v/1.mp4",
            "tags": ["a"]
        });
        let record = Normalizer::new().normalize(&flat, URL);
        assert_eq!(record.note_id, "abc");
        assert_eq!(record.note_type, "video");
        assert_eq!(record.like_count, 7);
        assert_eq!(record.author_name, "bob");
        assert_eq!(record.published_at, "2024-01-02 03:04:05");
        assert_eq!(record.video_url, "https://v/1.mp4");
        assert_eq!(record.tags, vec!["a"]);
    }

    #[test]
    fn test_video_from_origin_key() {
        let raw = json!({"note_card": {"type": "video", "video": {"consumer": {"origin_video_key": "pre/abc"}}}});
        let record = Normalizer::new().normalize(&raw, URL);
        assert_eq!(record.note_type, "video");
        assert_eq!(record.video_url, "https://sns-video-bd.xhscdn.com/pre/abc");
    }

    #[test]
    fn test_compact_preview() {
        let raw = json!({"desc": "abcdefghij"});
        let record = Normalizer::with_compact_preview(4).normalize(&raw, URL);
        assert_eq!(record.description, "abcd...");

        let record = Normalizer::with_compact_preview(10).normalize(&raw, URL);
        assert_eq!(record.description, "abcdefghij");

        let record = Normalizer::new().normalize(&raw, URL);
        assert_eq!(record.description, "abcdefghij");
    }

    #[test]
    fn test_truncate_respects_graphemes() {
        assert_eq!(truncate_with_ellipsis("大家好呀", 2), "大家...");
        assert_eq!(truncate_with_ellipsis("e\u{301}tude", 1), "e\u{301}...");
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(&json!(5)), Some(5));
        assert_eq!(parse_count(&json!(2.6)), Some(3));
        assert_eq!(parse_count(&json!("1,024")), Some(1024));
        assert_eq!(parse_count(&json!("1.2万")), Some(12_000));
        assert_eq!(parse_count(&json!("3亿")), Some(300_000_000));
        assert_eq!(parse_count(&json!("2.5k")), Some(2500));
        assert_eq!(parse_count(&json!("10+")), Some(10));
        assert_eq!(parse_count(&json!("")), None);
        assert_eq!(parse_count(&json!("many")), None);
        assert_eq!(parse_count(&json!(-4)), None);
        assert_eq!(parse_count(&json!(null)), None);
    }
}
