//! Remote spreadsheet sink over the Google Sheets v4 REST API.
//!
//! Each job maps to one tab of a shared spreadsheet, addressed by the job's
//! sink identifier. The tab must already exist.
//!
//! ```text
//! POST {api_base}/{spreadsheet_id}/values/'{tab}':clear
//! POST {api_base}/{spreadsheet_id}/values/'{tab}':append?valueInputOption=RAW&insertDataOption=INSERT_ROWS
//! ```

use async_trait::async_trait;
use serde_json::json;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::Cell;
use crate::storage::{SinkKey, TabularSink};
use crate::utils::http;

/// Google Sheets sink authenticated with a bearer token.
#[derive(Clone)]
pub struct RemoteSheetSink {
    client: reqwest::Client,
    api_base: Url,
    spreadsheet_id: String,
    access_token: String,
}

impl RemoteSheetSink {
    pub fn new(
        client: reqwest::Client,
        api_base: &str,
        spreadsheet_id: &str,
        access_token: impl Into<String>,
    ) -> Result<Self> {
        let api_base = Url::parse(api_base)?;
        if api_base.cannot_be_a_base() {
            return Err(AppError::config(format!(
                "sheets api base must be a hierarchical URL: {api_base}"
            )));
        }
        if spreadsheet_id.trim().is_empty() {
            return Err(AppError::config("spreadsheet_id must not be empty"));
        }

        Ok(Self {
            client,
            api_base,
            spreadsheet_id: spreadsheet_id.to_string(),
            access_token: access_token.into(),
        })
    }

    /// A1 range naming a whole tab. Quotes inside the name are doubled.
    fn tab_range(tab: &str) -> String {
        format!("'{}'", tab.replace('\'', "''"))
    }

    fn values_url(&self, tab: &str, action: &str) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::config(format!("invalid sheets api base: {}", self.api_base)))?
            .pop_if_empty()
            .push(&self.spreadsheet_id)
            .push("values")
            .push(&format!("{}{action}", Self::tab_range(tab)));
        Ok(url)
    }

    async fn post(&self, url: Url, request: reqwest::RequestBuilder) -> Result<()> {
        let response = request.bearer_auth(&self.access_token).send().await?;
        if !response.status().is_success() {
            let (status, body) = http::error_body(response).await;
            log::warn!("Sheet API rejected {}: {}", url.path(), status);
            return Err(AppError::sheet(status, body));
        }
        Ok(())
    }
}

#[async_trait]
impl TabularSink for RemoteSheetSink {
    fn backend(&self) -> &'static str {
        "remote_sheet"
    }

    fn location(&self, key: &SinkKey<'_>) -> String {
        format!("sheet {} tab {}", self.spreadsheet_id, key.sink)
    }

    async fn clear(&self, key: &SinkKey<'_>) -> Result<()> {
        let url = self.values_url(key.sink, ":clear")?;
        let request = self.client.post(url.clone()).json(&json!({}));
        self.post(url, request).await
    }

    async fn append_rows(&self, key: &SinkKey<'_>, rows: &[Vec<Cell>]) -> Result<()> {
        let url = self.values_url(key.sink, ":append")?;
        let request = self
            .client
            .post(url.clone())
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "values": rows }));
        self.post(url, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, NormalizedRecord};
    use crate::storage::{ExportJob, write_snapshot};
    use serde_json::Value;
    use wiremock::matchers::{body_json, header, method, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sink(server: &MockServer) -> RemoteSheetSink {
        RemoteSheetSink::new(
            reqwest::Client::new(),
            &format!("{}/v4/spreadsheets", server.uri()),
            "sheet-1",
            "tok",
        )
        .unwrap()
    }

    const KEY: SinkKey<'static> = SinkKey {
        label: "brandA",
        sink: "brandA_sheet",
    };

    #[tokio::test]
    async fn test_clear_then_append() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path_regex(r"^/v4/spreadsheets/sheet-1/values/'brandA_sheet':clear$"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path_regex(r"^/v4/spreadsheets/sheet-1/values/'brandA_sheet':append$"))
            .and(query_param("valueInputOption", "RAW"))
            .and(query_param("insertDataOption", "INSERT_ROWS"))
            .and(body_json(json!({
                "values": [["title", "like_count"], ["card", 12]]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let records = vec![NormalizedRecord {
            title: "card".to_string(),
            like_count: 12,
            ..NormalizedRecord::default()
        }];
        let job = ExportJob {
            label: KEY.label,
            sink: KEY.sink,
            header: &[Column::Title, Column::LikeCount],
            records: &records,
        };

        let meta = write_snapshot(&sink(&server), &job).await.unwrap();
        assert_eq!(meta.rows_written, 1);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].url.path().ends_with(":clear"));
        assert!(requests[1].url.path().ends_with(":append"));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let err = sink(&server).clear(&KEY).await.unwrap_err();
        match err {
            AppError::Sheet { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "forbidden");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_failed_clear_skips_append() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let records = vec![NormalizedRecord::default()];
        let job = ExportJob {
            label: KEY.label,
            sink: KEY.sink,
            header: &Column::DEFAULT_HEADER,
            records: &records,
        };
        assert!(write_snapshot(&sink(&server), &job).await.is_err());

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body, json!({}));
    }

    #[test]
    fn test_tab_range_escapes_quotes() {
        assert_eq!(RemoteSheetSink::tab_range("brand's"), "'brand''s'");
    }

    #[test]
    fn test_new_rejects_empty_spreadsheet() {
        assert!(
            RemoteSheetSink::new(
                reqwest::Client::new(),
                "https://sheets.googleapis.com/v4/spreadsheets",
                " ",
                "tok"
            )
            .is_err()
        );
    }
}
