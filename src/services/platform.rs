// src/services/platform.rs

//! Platform client contract and the HTTP gateway adapter.
//!
//! The crawler never talks to the platform directly: signing, cookies and
//! transport belong to an external client. [`PlatformClient`] is the seam;
//! [`HttpPlatformClient`] forwards each call as JSON to a signing gateway.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{PlatformConfig, ProxySettings, SearchFilters};
use crate::utils::http;

/// Credential and proxy passed to every platform call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub credential: String,
    pub proxy: Option<ProxySettings>,
}

impl Session {
    pub fn new(credential: impl Into<String>, proxy: Option<ProxySettings>) -> Self {
        Self {
            credential: credential.into(),
            proxy,
        }
    }
}

/// `(success, message, payload)` as reported by the platform client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientReply<T> {
    pub success: bool,
    pub message: String,
    pub payload: Option<T>,
}

impl<T> ClientReply<T> {
    pub fn ok(payload: T) -> Self {
        Self {
            success: true,
            message: "success".to_string(),
            payload: Some(payload),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            payload: None,
        }
    }
}

/// Operations the crawler needs from the platform.
///
/// Payload shapes are platform-defined and may change between calls.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Fetch one post by URL.
    async fn get_item(&self, url: &str, session: &Session) -> Result<ClientReply<Value>>;

    /// Search posts; returns hit summaries.
    async fn search_items(
        &self,
        query: &str,
        count: usize,
        filters: &SearchFilters,
        session: &Session,
    ) -> Result<ClientReply<Vec<Value>>>;

    /// List every post summary of a profile.
    async fn list_profile_items(
        &self,
        profile_url: &str,
        session: &Session,
    ) -> Result<ClientReply<Vec<Value>>>;
}

/// Reply envelope of the signing gateway.
#[derive(Debug, Deserialize)]
struct GatewayReply<T> {
    success: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

/// Platform client backed by an HTTP signing gateway.
pub struct HttpPlatformClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpPlatformClient {
    pub fn new(client: reqwest::Client, gateway_url: &str) -> Result<Self> {
        let base_url = Url::parse(gateway_url)?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::config(format!(
                "Gateway URL cannot be a base: {gateway_url}"
            )));
        }
        Ok(Self { client, base_url })
    }

    /// Build from configuration. The proxy is forwarded per call rather
    /// than applied to the gateway connection.
    pub fn from_config(config: &PlatformConfig) -> Result<Self> {
        let client = http::create_async_client(config, None)?;
        Self::new(client, &config.gateway_url)
    }

    fn endpoint(&self, name: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(name);
        }
        url
    }

    async fn call<T: DeserializeOwned>(
        &self,
        operation: &str,
        endpoint: &str,
        body: Value,
    ) -> Result<ClientReply<T>> {
        let response = self
            .client
            .post(self.endpoint(endpoint))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, body) = http::error_body(response).await;
            return Err(AppError::platform(
                operation,
                format!("gateway returned {status}: {body}"),
            ));
        }

        let reply: GatewayReply<T> = response.json().await?;
        log::debug!(
            "Gateway {} -> success={}, message={}",
            operation,
            reply.success,
            reply.message
        );
        Ok(ClientReply {
            success: reply.success,
            message: reply.message,
            payload: reply.data,
        })
    }
}

#[async_trait]
impl PlatformClient for HttpPlatformClient {
    async fn get_item(&self, url: &str, session: &Session) -> Result<ClientReply<Value>> {
        let body = json!({
            "url": url,
            "credential": session.credential,
            "proxy": session.proxy,
        });
        self.call("get_item", "item", body).await
    }

    async fn search_items(
        &self,
        query: &str,
        count: usize,
        filters: &SearchFilters,
        session: &Session,
    ) -> Result<ClientReply<Vec<Value>>> {
        let [sort, note_type, time, range, distance] = filters.codes();
        let body = json!({
            "query": query,
            "count": count,
            "sort": sort,
            "note_type": note_type,
            "time": time,
            "range": range,
            "distance": distance,
            "geo": filters.geo,
            "credential": session.credential,
            "proxy": session.proxy,
        });
        self.call("search_items", "search", body).await
    }

    async fn list_profile_items(
        &self,
        profile_url: &str,
        session: &Session,
    ) -> Result<ClientReply<Vec<Value>>> {
        let body = json!({
            "url": profile_url,
            "credential": session.credential,
            "proxy": session.proxy,
        });
        self.call("list_profile_items", "profile", body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SortMode, TimeFilter};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HttpPlatformClient {
        HttpPlatformClient::new(reqwest::Client::new(), &server.uri()).unwrap()
    }

    fn session() -> Session {
        Session::new("a1=cookie", None)
    }

    #[tokio::test]
    async fn test_get_item_forwards_url_and_credential() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/item"))
            .and(body_partial_json(json!({
                "url": "https://www.xiaohongshu.com/explore/1",
                "credential": "a1=cookie",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "ok",
                "data": {"data": {"items": [{"id": "1"}]}},
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client_for(&server)
            .get_item("https://www.xiaohongshu.com/explore/1", &session())
            .await
            .unwrap();
        assert!(reply.success);
        assert_eq!(reply.message, "ok");
        assert_eq!(reply.payload.unwrap()["data"]["items"][0]["id"], "1");
    }

    #[tokio::test]
    async fn test_search_sends_filter_codes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(body_partial_json(json!({
                "query": "Wise",
                "count": 20,
                "sort": 1,
                "time": 2,
                "distance": 0,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"id": "a", "model_type": "note"}],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let filters = SearchFilters {
            sort: SortMode::Latest,
            time: TimeFilter::Week,
            ..SearchFilters::default()
        };
        let reply = client_for(&server)
            .search_items("Wise", 20, &filters, &session())
            .await
            .unwrap();
        assert!(reply.success);
        assert_eq!(reply.payload.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reported_failure_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "message": "account locked",
                "data": null,
            })))
            .mount(&server)
            .await;

        let reply = client_for(&server)
            .list_profile_items("https://www.xiaohongshu.com/user/profile/9", &session())
            .await
            .unwrap();
        assert!(!reply.success);
        assert_eq!(reply.message, "account locked");
        assert!(reply.payload.is_none());
    }

    #[tokio::test]
    async fn test_gateway_error_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/item"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get_item("https://www.xiaohongshu.com/explore/1", &session())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("upstream down"));
    }
}
