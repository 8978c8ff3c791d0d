// src/utils/url.rs

//! URL and file-name helpers.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::{AppError, Result};

static ITEM_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?:explore|discovery/item|item)/([0-9A-Za-z]+)").expect("valid item id regex")
});

static UNSAFE_FILE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/:*?"<>|\s]+"#).expect("valid file name regex"));

/// Build the canonical post URL for an item id and its access token.
///
/// # Examples
/// ```
/// use notecrawler::utils::url::canonical_item_url;
///
/// assert_eq!(
///     canonical_item_url("https://www.xiaohongshu.com/explore", "64ab", Some("tok")).unwrap(),
///     "https://www.xiaohongshu.com/explore/64ab?xsec_token=tok"
/// );
/// ```
pub fn canonical_item_url(base: &str, id: &str, token: Option<&str>) -> Result<String> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| AppError::validation(format!("Item URL base cannot hold a path: {base}")))?
        .pop_if_empty()
        .push(id);

    if let Some(token) = token.filter(|t| !t.is_empty()) {
        url.query_pairs_mut().append_pair("xsec_token", token);
    }
    Ok(url.to_string())
}

/// Extract the post id from a post URL.
pub fn extract_item_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    ITEM_ID
        .captures(parsed.path())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Turn an arbitrary label into a safe file or directory name.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned = UNSAFE_FILE_CHARS.replace_all(name.trim(), "_");
    let cleaned: String = cleaned.trim_matches(['_', '.']).chars().take(100).collect();
    if cleaned.is_empty() {
        "untitled".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_item_url() {
        assert_eq!(
            canonical_item_url("https://www.xiaohongshu.com/explore/", "abc", Some("x=y")).unwrap(),
            "https://www.xiaohongshu.com/explore/abc?xsec_token=x%3Dy"
        );
        assert_eq!(
            canonical_item_url("https://www.xiaohongshu.com/explore", "abc", None).unwrap(),
            "https://www.xiaohongshu.com/explore/abc"
        );
        assert_eq!(
            canonical_item_url("https://www.xiaohongshu.com/explore", "abc", Some("")).unwrap(),
            "https://www.xiaohongshu.com/explore/abc"
        );
    }

    #[test]
    fn test_canonical_item_url_rejects_bad_base() {
        assert!(canonical_item_url("not a url", "abc", None).is_err());
        assert!(canonical_item_url("mailto:someone@example.com", "abc", None).is_err());
    }

    #[test]
    fn test_extract_item_id() {
        assert_eq!(
            extract_item_id("https://www.xiaohongshu.com/explore/64f0a1?xsec_token=t"),
            Some("64f0a1".to_string())
        );
        assert_eq!(
            extract_item_id("https://www.xiaohongshu.com/discovery/item/77aa"),
            Some("77aa".to_string())
        );
        assert_eq!(extract_item_id("https://example.com/user/profile/1"), None);
        assert_eq!(extract_item_id("garbage"), None);
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Revolut_v2"), "Revolut_v2");
        assert_eq!(sanitize_file_name("a/b: c?"), "a_b_c");
        assert_eq!(sanitize_file_name("  ..  "), "untitled");
    }
}
