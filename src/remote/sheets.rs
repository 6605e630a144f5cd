//! Google Sheets v4 REST client.
//!
//! # Security Note - Logging
//!
//! The bearer token is only ever exposed while building the `Authorization`
//! header, and that header is wrapped in [`RedactedHeader`] so it prints as
//! `[REDACTED]` if request logging is turned on.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderValue};
use reqwest::{Client, Response};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::AuthProvider;
use crate::config::Config;
use crate::error::{ChantagError, Result};

use super::a1::qualified_range;
use super::error::{ApiError, Direction};
use super::{CellWrite, Grid, RetryPolicy, SheetSource, execute_with_retry};

/// Header value that never prints its content.
struct RedactedHeader {
    value: HeaderValue,
}

impl RedactedHeader {
    fn bearer(token: &str) -> std::result::Result<Self, ApiError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ApiError::permanent("access token contains invalid header characters"))?;
        value.set_sensitive(true);
        Ok(Self { value })
    }
}

impl fmt::Display for RedactedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Debug for RedactedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedactedHeader")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Grid,
}

#[derive(Debug, Serialize)]
struct UpdateBody<'a> {
    range: &'a str,
    #[serde(rename = "majorDimension")]
    major_dimension: &'static str,
    values: &'a [Vec<String>],
}

#[derive(Debug, Serialize)]
struct BatchUpdateBody {
    #[serde(rename = "valueInputOption")]
    value_input_option: &'static str,
    data: Vec<BatchEntry>,
}

#[derive(Debug, Serialize)]
struct BatchEntry {
    range: String,
    values: Vec<Vec<String>>,
}

/// Google Sheets client for one spreadsheet.
pub struct SheetsClient {
    client: Client,
    base_url: Url,
    spreadsheet_id: String,
    auth: Arc<dyn AuthProvider>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl SheetsClient {
    /// Build a client from configuration.
    ///
    /// Configures the HTTP client with a 30s connect timeout; each logical
    /// call, retries included, is bounded by `remote_timeout`.
    pub fn from_config(config: &Config, auth: Arc<dyn AuthProvider>) -> Result<Self> {
        let spreadsheet_id = config.require_spreadsheet_id()?.to_string();
        let base_url = Url::parse(&format!("{}/", config.api_base_url.trim_end_matches('/')))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url,
            spreadsheet_id,
            auth,
            timeout: config.remote_timeout(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// `{base}/spreadsheets/{id}/values/{range}` with every segment encoded.
    fn values_url(&self, range: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ChantagError::Config("api_base_url cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(["spreadsheets", self.spreadsheet_id.as_str(), "values"])
            .push(range);
        Ok(url)
    }

    fn auth_header(&self) -> std::result::Result<RedactedHeader, ApiError> {
        let token = self
            .auth
            .token()
            .ok_or_else(|| ApiError::with_status("not signed in", reqwest::StatusCode::UNAUTHORIZED))?;
        RedactedHeader::bearer(token.expose_secret())
    }

    /// Send once, turning non-2xx responses into [`ApiError`].
    async fn send(&self, request: reqwest::RequestBuilder) -> std::result::Result<Response, ApiError> {
        let auth = self.auth_header()?;
        let response = request
            .header(header::AUTHORIZATION, auth.value.clone())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();
        let message = api_error_message(&body).unwrap_or_else(|| format!("HTTP {status}"));

        let mut err = ApiError::with_status(message, status);
        if let Some(seconds) = retry_after {
            err = err.with_retry_after(seconds);
        }
        Err(err)
    }

    /// Run `call` with retries under the overall timeout.
    async fn call<T, F, Fut>(&self, direction: Direction, what: &str, call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, ApiError>>,
    {
        let attempt = execute_with_retry(self.retry, call);
        match tokio::time::timeout(self.timeout, attempt).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(err.into_chantag_error(direction, what)),
            Err(_) => Err(ApiError::new(format!("timed out after {:?}", self.timeout))
                .into_chantag_error(direction, what)),
        }
    }
}

/// Pull `error.message` out of a Google API error body.
fn api_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

#[async_trait]
impl SheetSource for SheetsClient {
    async fn read_range(&self, sheet: &str, range: &str) -> Result<Grid> {
        let qualified = qualified_range(sheet, range);
        let mut url = self.values_url(&qualified)?;
        url.query_pairs_mut()
            .append_pair("valueRenderOption", "UNFORMATTED_VALUE");

        tracing::debug!("GET {qualified}");
        let body: ValueRange = self
            .call(Direction::Read, sheet, || async {
                let response = self.send(self.client.get(url.clone())).await?;
                Ok(response.json::<ValueRange>().await?)
            })
            .await?;

        Ok(body.values)
    }

    async fn write_range(&self, sheet: &str, cell: &str, values: Vec<Vec<String>>) -> Result<()> {
        let qualified = qualified_range(sheet, cell);
        let mut url = self.values_url(&qualified)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = UpdateBody {
            range: &qualified,
            major_dimension: "ROWS",
            values: &values,
        };

        tracing::debug!("PUT {qualified} ({} rows)", values.len());
        self.call(Direction::Write, sheet, || async {
            self.send(self.client.put(url.clone()).json(&body)).await?;
            Ok(())
        })
        .await
    }

    async fn batch_write(&self, writes: Vec<CellWrite>) -> Result<()> {
        if writes.is_empty() {
            return Ok(());
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ChantagError::Config("api_base_url cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(["spreadsheets", self.spreadsheet_id.as_str(), "values:batchUpdate"]);

        let body = BatchUpdateBody {
            value_input_option: "RAW",
            data: writes
                .into_iter()
                .map(|w| BatchEntry {
                    range: w.range,
                    values: vec![vec![w.value]],
                })
                .collect(),
        };

        tracing::debug!("POST values:batchUpdate ({} cells)", body.data.len());
        self.call(Direction::Write, "channels", || async {
            self.send(self.client.post(url.clone()).json(&body)).await?;
            Ok(())
        })
        .await
    }
}
