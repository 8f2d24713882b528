//! HTTP delivery of batch payloads to the ingest endpoint.
//!
//! Uses the curl crate (libcurl) for the actual POST. Requests run on the
//! blocking pool; [`TransportClient`] is the async seam, so the submitter
//! can be exercised against a scripted transport in tests.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::payload::BatchPayload;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("gitship/", env!("CARGO_PKG_VERSION"));
/// Longest response-body excerpt carried into an error message.
const BODY_EXCERPT_LIMIT: usize = 200;

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    pub success: bool,
    pub error: Option<String>,
}

impl DeliveryResult {
    pub fn ok() -> Self {
        DeliveryResult {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        DeliveryResult {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Body the ingest endpoint returns for an accepted POST. Endpoints that
/// answer 2xx with no body (or a foreign one) count as accepting the batch.
#[derive(Debug, Deserialize)]
struct IngestResponse {
    #[serde(default = "default_true")]
    success: bool,
    error: Option<String>,
}

fn default_true() -> bool {
    true
}

/// One-shot delivery of a batch. Infrastructure failures surface in the
/// result's error text, never as a panic or an `Err`.
#[async_trait::async_trait]
pub trait TransportClient: Send + Sync {
    async fn send(&self, payload: &BatchPayload) -> DeliveryResult;
}

/// Talks to a real ingest endpoint: `POST {endpoint}/batches` with a JSON
/// body and optional bearer auth.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("invalid endpoint URL {endpoint}"))?;
        if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
            bail!("endpoint must be http or https, got {}", endpoint.scheme());
        }
        Ok(HttpTransport { endpoint, api_key })
    }

    fn route(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.as_str().trim_end_matches('/'), path)
    }

    /// `GET {endpoint}/health`; true on any 2xx.
    pub async fn health_check(&self) -> bool {
        let url = self.route("health");
        let outcome = tokio::task::spawn_blocking(move || get_blocking(&url)).await;
        matches!(outcome, Ok(Ok(code)) if (200..300).contains(&code))
    }
}

#[async_trait::async_trait]
impl TransportClient for HttpTransport {
    async fn send(&self, payload: &BatchPayload) -> DeliveryResult {
        let body = match serde_json::to_vec(payload) {
            Ok(body) => body,
            Err(e) => return DeliveryResult::failed(format!("request error: {e}")),
        };
        let url = self.route("batches");
        let api_key = self.api_key.clone();

        let outcome = tokio::task::spawn_blocking(move || {
            post_json_blocking(&url, &body, api_key.as_deref())
        })
        .await;

        match outcome {
            Ok(Ok((code, body))) => interpret_response(code, &body),
            Ok(Err(e)) => DeliveryResult::failed(curl_error_text(&e)),
            Err(e) => DeliveryResult::failed(format!("request error: {e}")),
        }
    }
}

/// POSTs a JSON body and collects the status code plus response bytes.
///
/// Runs in the current thread; call from `spawn_blocking` if used from
/// async code.
fn post_json_blocking(
    url: &str,
    body: &[u8],
    api_key: Option<&str>,
) -> Result<(u32, Vec<u8>), curl::Error> {
    let mut response = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.post(true)?;
    easy.post_fields_copy(body)?;
    easy.connect_timeout(CONNECT_TIMEOUT)?;
    easy.timeout(REQUEST_TIMEOUT)?;
    easy.useragent(USER_AGENT)?;

    let mut list = curl::easy::List::new();
    list.append("Content-Type: application/json")?;
    // libcurl would otherwise add Expect: 100-continue on larger bodies and
    // stall until its continue timeout against servers that never send 100.
    list.append("Expect:")?;
    if let Some(key) = api_key {
        list.append(&format!("Authorization: Bearer {key}"))?;
    }
    easy.http_headers(list)?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            response.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    Ok((code, response))
}

fn get_blocking(url: &str) -> Result<u32, curl::Error> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.connect_timeout(CONNECT_TIMEOUT)?;
    easy.timeout(REQUEST_TIMEOUT)?;
    easy.useragent(USER_AGENT)?;
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| Ok(data.len()))?;
        transfer.perform()?;
    }
    easy.response_code()
}

/// Turn a status code and body into a delivery outcome. Server-side 5xx
/// failures are worded so the retry classifier treats them as transient;
/// every other non-2xx stays terminal.
fn interpret_response(code: u32, body: &[u8]) -> DeliveryResult {
    if (200..300).contains(&code) {
        return match serde_json::from_slice::<IngestResponse>(body) {
            Ok(IngestResponse { success: true, .. }) => DeliveryResult::ok(),
            Ok(IngestResponse {
                success: false,
                error,
            }) => DeliveryResult::failed(
                error.unwrap_or_else(|| format!("endpoint rejected the batch (HTTP {code})")),
            ),
            Err(_) => DeliveryResult::ok(),
        };
    }
    let detail = status_message(code, body);
    if (500..600).contains(&code) {
        DeliveryResult::failed(format!("server error: {detail}"))
    } else {
        DeliveryResult::failed(detail)
    }
}

fn status_message(code: u32, body: &[u8]) -> String {
    let excerpt = body_excerpt(body);
    if excerpt.is_empty() {
        format!("HTTP {code}")
    } else {
        format!("HTTP {code}: {excerpt}")
    }
}

fn body_excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    if trimmed.chars().count() <= BODY_EXCERPT_LIMIT {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(BODY_EXCERPT_LIMIT).collect();
    format!("{cut}...")
}

fn curl_error_text(e: &curl::Error) -> String {
    if e.is_operation_timedout() {
        return format!("timeout: {e}");
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return format!("network error: {e}");
    }
    format!("request error: {e}")
}
