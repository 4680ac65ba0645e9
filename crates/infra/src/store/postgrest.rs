//! Supabase REST (PostgREST) record store.
//!
//! Talks to `{url}/rest/v1/{collection}` with the service-role key in both
//! the `apikey` and `Authorization: Bearer` headers.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tracing::debug;

use saga_core::{Collection, Filter, Record};

use super::r#trait::{RecordStore, StoreError};
use crate::config::StoreConfig;

/// Rows requested per page. The server may answer with fewer (`max-rows`),
/// so a short page says nothing about the end of the collection: `select_all`
/// keeps going until a page comes back empty.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

pub struct PostgrestStore {
    client: Client,
    rest_url: String,
    page_size: usize,
    page_order: Option<String>,
}

impl PostgrestStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.service_key)
            .map_err(|_| StoreError::Transport("service key is not a valid header value".to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.service_key))
            .map_err(|_| StoreError::Transport("service key is not a valid header value".to_string()))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            rest_url: format!("{}/rest/v1", config.url),
            page_size: DEFAULT_PAGE_SIZE,
            page_order: Some("id".to_string()),
        })
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Column used to keep pages stable across requests (`None` disables
    /// ordering, for tables without an `id` column).
    pub fn with_page_order(mut self, column: Option<String>) -> Self {
        self.page_order = column;
        self
    }

    fn endpoint(&self, collection: &Collection) -> String {
        format!("{}/{}", self.rest_url, collection)
    }
}

#[async_trait]
impl RecordStore for PostgrestStore {
    async fn select_all(&self, collection: &Collection) -> Result<Vec<Record>, StoreError> {
        let mut all = Vec::new();
        let mut offset = 0usize;

        loop {
            let mut query = vec![("select", "*".to_string())];
            if let Some(order) = &self.page_order {
                query.push(("order", format!("{order}.asc")));
            }
            let last = offset + self.page_size - 1;

            let resp = self
                .client
                .get(self.endpoint(collection))
                .query(&query)
                .header("Range-Unit", "items")
                .header("Range", format!("{offset}-{last}"))
                .send()
                .await
                .map_err(|e| StoreError::Transport(e.to_string()))?;
            // an offset past the end is answered with 416 when the server knows the total
            if offset > 0 && resp.status() == StatusCode::RANGE_NOT_SATISFIABLE {
                break;
            }
            let page = decode_rows(check(resp).await?).await?;

            let fetched = page.len();
            all.extend(page);
            debug!(%collection, offset, fetched, "fetched page");

            if fetched == 0 {
                break;
            }
            offset += fetched;
        }

        Ok(all)
    }

    async fn insert(&self, collection: &Collection, records: Vec<Record>) -> Result<(), StoreError> {
        let resp = self
            .client
            .post(self.endpoint(collection))
            .header("Prefer", "return=minimal")
            .json(&records)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        check(resp).await?;
        Ok(())
    }

    async fn delete_where(&self, collection: &Collection, filter: &Filter) -> Result<usize, StoreError> {
        let (field, expr) = filter.to_query_pair();
        let resp = self
            .client
            .delete(self.endpoint(collection))
            .query(&[(field.as_str(), expr.as_str()), ("select", "id")])
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let deleted = decode_rows(check(resp).await?).await?;
        Ok(deleted.len())
    }
}

/// Pass 2xx responses through; turn anything else into `StoreError::Status`
/// carrying PostgREST's `message` when the body is its JSON error shape.
async fn check(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

async fn decode_rows(resp: Response) -> Result<Vec<Record>, StoreError> {
    let body = resp
        .text()
        .await
        .map_err(|e| StoreError::Transport(e.to_string()))?;
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(&body) {
        Ok(Value::Array(rows)) => Ok(rows),
        Ok(other) => Err(StoreError::Decode(format!(
            "expected a JSON array, got {}",
            kind_of(&other)
        ))),
        Err(e) => Err(StoreError::Decode(e.to_string())),
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
