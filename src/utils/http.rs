// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::{PlatformConfig, ProxySettings};

/// Create a configured asynchronous HTTP client.
///
/// The proxy, when given, is applied per scheme.
pub fn create_async_client(
    config: &PlatformConfig,
    proxy: Option<&ProxySettings>,
) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs));

    if let Some(proxy) = proxy {
        if let Some(http) = &proxy.http {
            builder = builder.proxy(reqwest::Proxy::http(http)?);
        }
        if let Some(https) = &proxy.https {
            builder = builder.proxy(reqwest::Proxy::https(https)?);
        }
    }

    Ok(builder.build()?)
}

/// Read a non-success response into a message, keeping the body for context.
pub async fn error_body(response: reqwest::Response) -> (u16, String) {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    (status, body)
}
