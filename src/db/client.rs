

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::HeaderMap;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use super::auth::{DOCS_RESOURCE, MasterKeySigner, rfc1123_date};
use super::models::{DocumentId, DocumentRef, PartitionKeyValue};
use super::query::build_query;
use super::store::{Projection, QueryOutput, QueryRequest, StoreClient};
use crate::core::config::CosmosConfig;
use crate::utils::{single_line, truncate_for_log};


const API_VERSION: &str = "2018-12-31";

const QUERY_CONTENT_TYPE: &str = "application/query+json";

const MAX_ERROR_BODY_CHARS: usize = 300;

/// `x-ms-max-item-count` for feeds read to the end.
const FEED_PAGE_SIZE: usize = 1000;

const HEADER_DATE: &str = "x-ms-date";
const HEADER_VERSION: &str = "x-ms-version";
const HEADER_IS_QUERY: &str = "x-ms-documentdb-isquery";
const HEADER_CROSS_PARTITION: &str = "x-ms-documentdb-query-enablecrosspartition";
const HEADER_PARTITION_KEY: &str = "x-ms-documentdb-partitionkey";
const HEADER_MAX_ITEM_COUNT: &str = "x-ms-max-item-count";
const HEADER_CONTINUATION: &str = "x-ms-continuation";
const HEADER_RETRY_AFTER_MS: &str = "x-ms-retry-after-ms";


#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Request throttled after {0} attempts")]
    Throttled(u32),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid account key: {0}")]
    InvalidKey(String),
    #[error("Query failed: {0}")]
    Query(String),
}

impl StoreError {

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}


#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(rename = "Documents", default)]
    documents: Vec<Value>,
}

struct QueryPage {
    rows: Vec<Value>,
    continuation: Option<String>,
}

/// Cosmos DB SQL API over REST, authenticated with the account master key.
pub struct CosmosClient {

    http: reqwest::Client,

    signer: MasterKeySigner,

    config: CosmosConfig,

    docs_url: Url,
}

impl CosmosClient {

    pub fn new(config: CosmosConfig) -> Result<Self, StoreError> {
        config
            .validate()
            .map_err(|e| StoreError::Config(e.to_string()))?;

        let signer = MasterKeySigner::new(config.account_key())?;
        let docs_url = segment_url(
            &config.endpoint,
            &["dbs", &config.database, "colls", &config.collection, "docs"],
        )?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        info!(
            "CosmosClient created for {} (cross_partition={})",
            config.collection_link(),
            config.cross_partition
        );

        Ok(Self {
            http,
            signer,
            config,
            docs_url,
        })
    }

    fn doc_url(&self, id: &DocumentId) -> Url {
        let mut url = self.docs_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(id.as_str());
        }
        url
    }

    /// Sends one request, re-signing and retrying while the store answers 429.
    async fn execute<F>(
        &self,
        method: Method,
        url: &Url,
        resource_link: &str,
        build: F,
    ) -> Result<Response, StoreError>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let max_attempts = self.config.max_throttle_retries + 1;

        for attempt in 1..=max_attempts {
            let date = rfc1123_date(Utc::now());
            let authorization = self
                .signer
                .authorization(&method, DOCS_RESOURCE, resource_link, &date)?;

            let request = self
                .http
                .request(method.clone(), url.clone())
                .header("authorization", authorization)
                .header(HEADER_DATE, &date)
                .header(HEADER_VERSION, API_VERSION);

            debug!("{} {} (attempt {})", method, resource_link, attempt);
            let response = build(request).send().await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt < max_attempts {
                    let wait = retry_after(response.headers()).min(self.config.max_throttle_wait());
                    debug!("{} {} throttled, retrying in {:?}", method, resource_link, wait);
                    tokio::time::sleep(wait).await;
                    continue;
                }
                warn!("{} {} still throttled after {} attempts", method, resource_link, attempt);
                return Err(StoreError::Throttled(attempt));
            }

            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                message: truncate_for_log(&single_line(&body), MAX_ERROR_BODY_CHARS),
            });
        }

        Err(StoreError::Throttled(max_attempts))
    }

    /// One round trip of a query feed.
    async fn query_page(
        &self,
        body: &str,
        max_item_count: usize,
        cross_partition: bool,
        continuation: Option<&str>,
    ) -> Result<QueryPage, StoreError> {
        let resource_link = self.config.collection_link();
        let response = self
            .execute(Method::POST, &self.docs_url, &resource_link, |request| {
                let mut request = request
                    .header(HEADER_IS_QUERY, "True")
                    .header("content-type", QUERY_CONTENT_TYPE)
                    .header(HEADER_MAX_ITEM_COUNT, max_item_count.to_string())
                    .body(body.to_string());
                if cross_partition {
                    request = request.header(HEADER_CROSS_PARTITION, "True");
                }
                if let Some(token) = continuation {
                    request = request.header(HEADER_CONTINUATION, token);
                }
                request
            })
            .await?;

        let continuation = response
            .headers()
            .get(HEADER_CONTINUATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let page: QueryResponse = response.json().await?;

        Ok(QueryPage {
            rows: page.documents,
            continuation,
        })
    }

    /// Follows continuation tokens until `limit` rows are in or the feed ends.
    async fn run_query(
        &self,
        sql: &str,
        limit: Option<usize>,
        cross_partition: bool,
    ) -> Result<Vec<Value>, StoreError> {
        let body = json!({ "query": sql, "parameters": [] }).to_string();
        let max_item_count = limit.unwrap_or(FEED_PAGE_SIZE);
        let mut rows = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let page = self
                .query_page(&body, max_item_count, cross_partition, continuation.as_deref())
                .await?;
            rows.extend(page.rows);
            continuation = page.continuation;

            if let Some(limit) = limit {
                if rows.len() >= limit {
                    rows.truncate(limit);
                    break;
                }
            }
            if continuation.is_none() {
                break;
            }
        }

        Ok(rows)
    }

    /// Counts the rows of a whole feed without keeping them.
    async fn count_rows(&self, sql: &str, cross_partition: bool) -> Result<i64, StoreError> {
        let body = json!({ "query": sql, "parameters": [] }).to_string();
        let mut total = 0i64;
        let mut continuation: Option<String> = None;

        loop {
            let page = self
                .query_page(&body, FEED_PAGE_SIZE, cross_partition, continuation.as_deref())
                .await?;
            total += page.rows.len() as i64;
            continuation = page.continuation;
            if continuation.is_none() {
                return Ok(total);
            }
        }
    }
}

#[async_trait]
impl StoreClient for CosmosClient {
    async fn query(&self, request: QueryRequest<'_>) -> Result<QueryOutput, StoreError> {
        let sql = build_query(&request, &self.config.partition_key_field);
        debug!(
            "Running {} query: {}",
            request.projection.name(),
            truncate_for_log(&sql, 120)
        );

        match request.projection {
            Projection::Count if request.cross_partition => {
                let total = self.count_rows(&sql, true).await?;
                Ok(QueryOutput::Count(total))
            }
            Projection::Count => {
                let rows = self.run_query(&sql, None, false).await?;
                let mut total = 0i64;
                for row in rows {
                    total += row.as_i64().ok_or_else(|| {
                        StoreError::Query(format!("unexpected count value: {}", row))
                    })?;
                }
                Ok(QueryOutput::Count(total))
            }
            Projection::Exists | Projection::Page { .. } => {
                let rows = self
                    .run_query(&sql, request.projection.row_limit(), request.cross_partition)
                    .await?;
                debug!("{} query returned {} rows", request.projection.name(), rows.len());
                let documents = rows
                    .into_iter()
                    .map(serde_json::from_value::<DocumentRef>)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(QueryOutput::Documents(documents))
            }
        }
    }

    async fn delete_one(
        &self,
        id: &DocumentId,
        partition_key: Option<&PartitionKeyValue>,
        cross_partition: bool,
    ) -> Result<(), StoreError> {
        let resource_link = format!("{}/docs/{}", self.config.collection_link(), id);
        let partition_header =
            cross_partition.then(|| PartitionKeyValue::header_value(partition_key));

        let url = self.doc_url(id);
        self.execute(Method::DELETE, &url, &resource_link, |request| match &partition_header {
            Some(value) => request.header(HEADER_PARTITION_KEY, value.as_str()),
            None => request,
        })
        .await?;

        debug!("Deleted document {}", id);
        Ok(())
    }

    fn cross_partition(&self) -> bool {
        self.config.cross_partition
    }
}

fn segment_url(endpoint: &str, segments: &[&str]) -> Result<Url, StoreError> {
    let mut url = Url::parse(endpoint.trim())
        .map_err(|e| StoreError::Config(format!("invalid endpoint {}: {}", endpoint, e)))?;
    url.path_segments_mut()
        .map_err(|_| StoreError::Config(format!("endpoint cannot be a base URL: {}", endpoint)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn retry_after(headers: &HeaderMap) -> Duration {
    headers
        .get(HEADER_RETRY_AFTER_MS)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(1))
}
