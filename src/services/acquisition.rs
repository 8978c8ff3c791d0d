// src/services/acquisition.rs

//! Acquisition engine.
//!
//! Resolves a [`TargetSpec`] into raw items through the platform client.
//! Items are fetched one at a time; a failing item is recorded and skipped,
//! never fatal to the rest of the target.

use std::sync::Arc;

use serde_json::Value;

use crate::models::{CrawlOutcome, FetchedItem, ItemFailure, SearchFilters, TargetSpec};
use crate::services::platform::{PlatformClient, Session};
use crate::utils::url::canonical_item_url;

/// Hit type kept from search results.
const POST_MODEL_TYPE: &str = "note";

/// Turns target specs into fetched raw items.
pub struct AcquisitionEngine {
    client: Arc<dyn PlatformClient>,
    item_url_base: String,
}

impl AcquisitionEngine {
    pub fn new(client: Arc<dyn PlatformClient>, item_url_base: impl Into<String>) -> Self {
        Self {
            client,
            item_url_base: item_url_base.into(),
        }
    }

    /// Run the acquisition operation matching the target kind.
    pub async fn resolve(&self, spec: &TargetSpec, session: &Session) -> CrawlOutcome {
        match spec {
            TargetSpec::DirectUrl { url } => self.fetch_single(url, session).await,
            TargetSpec::SearchQuery {
                query,
                requested_count,
                filters,
            } => {
                self.resolve_search(query, *requested_count, filters, session)
                    .await
            }
            TargetSpec::ProfileUrl { url } => self.resolve_profile(url, session).await,
        }
    }

    /// Fetch one post. Errors and reported failures both become a failed outcome.
    pub async fn fetch_single(&self, url: &str, session: &Session) -> CrawlOutcome {
        let outcome = match self.client.get_item(url, session).await {
            Ok(reply) if reply.success => match reply.payload.map(extract_item) {
                Some(Ok(raw)) => CrawlOutcome {
                    items: vec![FetchedItem {
                        source_url: url.to_string(),
                        raw,
                    }],
                    ..CrawlOutcome::succeeded(reply.message)
                },
                Some(Err(message)) => CrawlOutcome::failed(message),
                None => CrawlOutcome::failed("platform returned no payload"),
            },
            Ok(reply) => CrawlOutcome::failed(reply.message),
            Err(e) => CrawlOutcome::failed(e.to_string()),
        };

        log::info!(
            "Fetched post {}: {}, msg={}",
            url,
            outcome.success,
            outcome.message
        );
        outcome
    }

    /// Search, keep post hits, cap at `requested_count`, then fetch each hit.
    ///
    /// `success` reflects the search call alone.
    pub async fn resolve_search(
        &self,
        query: &str,
        requested_count: usize,
        filters: &SearchFilters,
        session: &Session,
    ) -> CrawlOutcome {
        let reply = match self
            .client
            .search_items(query, requested_count, filters, session)
            .await
        {
            Ok(reply) => reply,
            Err(e) => return CrawlOutcome::failed(e.to_string()),
        };
        if !reply.success {
            return CrawlOutcome::failed(reply.message);
        }

        let posts: Vec<Value> = reply
            .payload
            .unwrap_or_default()
            .into_iter()
            .filter(is_post)
            .collect();
        log::info!("Search '{}' returned {} post hits", query, posts.len());

        let mut outcome = CrawlOutcome::succeeded(reply.message);
        let urls = self.hit_urls(&posts, Some(requested_count), &mut outcome.failures);
        self.fetch_each(urls, session, &mut outcome).await;
        outcome
    }

    /// List a profile's posts, then fetch every listed post.
    pub async fn resolve_profile(&self, profile_url: &str, session: &Session) -> CrawlOutcome {
        let reply = match self.client.list_profile_items(profile_url, session).await {
            Ok(reply) => reply,
            Err(e) => return CrawlOutcome::failed(e.to_string()),
        };
        if !reply.success {
            return CrawlOutcome::failed(reply.message);
        }

        let hits = reply.payload.unwrap_or_default();
        log::info!("Profile {} lists {} posts", profile_url, hits.len());

        let mut outcome = CrawlOutcome::succeeded(reply.message);
        let urls = self.hit_urls(&hits, None, &mut outcome.failures);
        self.fetch_each(urls, session, &mut outcome).await;
        outcome
    }

    /// Canonical URLs for hits, in hit order, up to `cap`.
    fn hit_urls(
        &self,
        hits: &[Value],
        cap: Option<usize>,
        failures: &mut Vec<ItemFailure>,
    ) -> Vec<String> {
        let mut urls = Vec::new();
        for hit in hits {
            if cap.is_some_and(|cap| urls.len() >= cap) {
                break;
            }
            match self.hit_url(hit) {
                Ok(url) => urls.push(url),
                Err(message) => {
                    log::warn!("Skipping hit: {}", message);
                    failures.push(ItemFailure {
                        url: String::new(),
                        message,
                    });
                }
            }
        }
        urls
    }

    fn hit_url(&self, hit: &Value) -> Result<String, String> {
        let id = ["id", "note_id"]
            .iter()
            .find_map(|key| match hit.get(*key)? {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| "hit has no id".to_string())?;
        let token = hit.get("xsec_token").and_then(Value::as_str);
        canonical_item_url(&self.item_url_base, &id, token).map_err(|e| e.to_string())
    }

    async fn fetch_each(&self, urls: Vec<String>, session: &Session, outcome: &mut CrawlOutcome) {
        for url in urls {
            let single = self.fetch_single(&url, session).await;
            if single.success {
                outcome.items.extend(single.items);
            } else {
                outcome.failures.push(ItemFailure {
                    url,
                    message: single.message,
                });
            }
        }
    }
}

fn is_post(hit: &Value) -> bool {
    hit.get("model_type").and_then(Value::as_str) == Some(POST_MODEL_TYPE)
}

/// Unwrap the `data.items[0]` envelope when present.
fn extract_item(payload: Value) -> Result<Value, String> {
    if payload.is_null() {
        return Err("platform returned an empty payload".to_string());
    }
    match payload.pointer("/data/items") {
        Some(Value::Array(items)) => items
            .first()
            .cloned()
            .ok_or_else(|| "item not found".to_string()),
        _ => Ok(payload),
    }
}
