//! Firefly III API client
//!
//! Handles communication with the Firefly III JSON:API (`/api/v1`). Ids and
//! amounts travel as strings; every response is wrapped in
//! `{ "data": ..., "meta": { "pagination": ... } }`.
//!
//! API Documentation: https://api-docs.firefly-iii.org/

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::config::ApiConfig;
use crate::domain::result::{Error, Result};
use crate::domain::transaction::TransactionStore;
use crate::domain::{LedgerEntry, LedgerTransaction, TransactionLink};
use crate::ports::{AboutInfo, Ledger};

/// How much of an error body is kept for the error message
const ERROR_BODY_LIMIT: usize = 1 << 10;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// API Response Models
// =============================================================================

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
    #[serde(default)]
    meta: Option<Meta>,
}

#[derive(Debug, Default, Deserialize)]
struct Meta {
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Default, Deserialize)]
struct Pagination {
    #[serde(default)]
    count: u64,
    #[serde(default)]
    total: u64,
}

// =============================================================================
// Firefly HTTP Client
// =============================================================================

/// Firefly III API client
#[derive(Debug)]
pub struct FireflyClient {
    client: Client,
    base_url: String,
}

impl FireflyClient {
    /// Create a new client for the configured instance
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.api+json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| Error::config("Access token contains invalid characters"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: api_base(config),
        })
    }

    /// Full URL for an API path
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request and decode the `data` member of the response
    fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<JsonValue>,
    ) -> Result<T> {
        let url = self.url(path);
        info!(method = %method, url = %url, "making request");

        let mut request = self.client.request(method, &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(&body)?);
        }

        let response = request.send().map_err(map_request_error)?;
        let text = check_response(response)?;

        let envelope: Envelope<T> = serde_json::from_str(&text)
            .map_err(|e| Error::decode(format!("{}: {}", path, e)))?;
        if let Some(p) = envelope.meta.and_then(|m| m.pagination) {
            debug!(count = p.count, total = p.total, "pagination");
        }
        Ok(envelope.data)
    }
}

/// `<endpoint>/api/v1`, keeping any path prefix the instance lives under
fn api_base(config: &ApiConfig) -> String {
    format!("{}/api/v1", config.endpoint.as_str().trim_end_matches('/'))
}

/// Map request errors to readable messages
fn map_request_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::transport(format!(
            "Connection timed out after {} seconds",
            REQUEST_TIMEOUT.as_secs()
        ))
    } else if error.is_connect() {
        Error::transport("Unable to connect to Firefly III")
    } else {
        Error::transport(format!("Firefly request failed: {}", error))
    }
}

/// Return the body of a successful response, or the ledger error
fn check_response(response: Response) -> Result<String> {
    let status = response.status();
    let text = response
        .text()
        .map_err(|e| Error::transport(format!("Failed to read response: {}", e)))?;
    if !status.is_success() {
        return Err(Error::Ledger {
            status: status.as_u16(),
            body: truncate(&text, ERROR_BODY_LIMIT).to_string(),
        });
    }
    Ok(text)
}

fn truncate(s: &str, limit: usize) -> &str {
    if s.len() <= limit {
        return s;
    }
    let mut end = limit;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn store_body(transaction: &LedgerTransaction) -> Result<JsonValue> {
    Ok(serde_json::to_value(TransactionStore {
        transactions: std::slice::from_ref(transaction),
    })?)
}

impl Ledger for FireflyClient {
    fn search(&self, query: &str, limit: Option<u32>) -> Result<Vec<LedgerEntry>> {
        let limit = limit.map(|l| l.to_string());
        let mut params = vec![("query", query)];
        if let Some(limit) = limit.as_deref() {
            params.push(("limit", limit));
        }
        self.send(Method::GET, "search/transactions", &params, None)
    }

    fn get(&self, id: u64) -> Result<LedgerEntry> {
        self.send(Method::GET, &format!("transactions/{}", id), &[], None)
    }

    fn create(&self, transaction: &LedgerTransaction) -> Result<LedgerEntry> {
        self.send(
            Method::POST,
            "transactions",
            &[],
            Some(store_body(transaction)?),
        )
    }

    fn update(&self, id: u64, transaction: &LedgerTransaction) -> Result<LedgerEntry> {
        self.send(
            Method::PUT,
            &format!("transactions/{}", id),
            &[],
            Some(store_body(transaction)?),
        )
    }

    fn create_link(&self, link: &TransactionLink) -> Result<JsonValue> {
        self.send(
            Method::POST,
            "transaction-links",
            &[],
            Some(serde_json::to_value(link)?),
        )
    }

    fn about(&self) -> Result<AboutInfo> {
        self.send(Method::GET, "about", &[], None)
    }

    fn raw(&self, method: &str, path: &str, query: &[(String, String)]) -> Result<JsonValue> {
        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|_| Error::config(format!("Invalid HTTP method: {}", method)))?;
        let query: Vec<(&str, &str)> = query
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let url = self.url(path);
        info!(method = %method, url = %url, "making request");
        let mut request = self.client.request(method, &url);
        if !query.is_empty() {
            request = request.query(&query);
        }
        let text = check_response(request.send().map_err(map_request_error)?)?;
        if text.trim().is_empty() {
            return Ok(JsonValue::Null);
        }
        let value: JsonValue = serde_json::from_str(&text)
            .map_err(|e| Error::decode(format!("{}: {}", path, e)))?;
        // Unwrap the envelope the way the typed calls do
        Ok(match value {
            JsonValue::Object(mut map) if map.contains_key("data") => {
                map.remove("data").unwrap_or(JsonValue::Null)
            }
            other => other,
        })
    }
}
