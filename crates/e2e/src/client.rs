//! Catalog search API client

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use catalog_probe_common::{ApiHit, ApiResultSet, SearchQuery};

use crate::error::{E2eError, E2eResult};

/// Environment variable overriding the search API base URL
pub const API_URL_ENV: &str = "CATALOG_API_URL";

/// Source of API search results for a query
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> E2eResult<ApiResultSet>;
}

/// Configuration for the search API client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL, without the `/unified-catalog/search` suffix
    pub base_url: String,

    /// Results requested per page
    pub page_size: u32,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Honor `HTTP(S)_PROXY` from the environment
    pub use_system_proxy: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var(API_URL_ENV)
                .unwrap_or_else(|_| "https://api.udacity.com/api".to_string()),
            page_size: 24,
            request_timeout: Duration::from_secs(30),
            use_system_proxy: true,
        }
    }
}

/// HTTP client for the unified catalog search endpoint
pub struct CatalogClient {
    http: reqwest::Client,
    endpoint: String,
    page_size: u32,
}

impl CatalogClient {
    pub fn new(config: ClientConfig) -> E2eResult<Self> {
        let mut builder = reqwest::Client::builder().timeout(config.request_timeout);
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            endpoint: format!(
                "{}/unified-catalog/search",
                config.base_url.trim_end_matches('/')
            ),
            page_size: config.page_size,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SearchBackend for CatalogClient {
    async fn search(&self, query: &SearchQuery) -> E2eResult<ApiResultSet> {
        let body = SearchRequest::from_query(query, self.page_size);
        debug!("POST {} {:?}", self.endpoint, body);

        let response = self.http.post(&self.endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(E2eError::Transport {
                status: status.as_u16(),
                url: self.endpoint.clone(),
                body,
            });
        }

        let parsed: SearchResponse = response.json().await?;
        let results = parsed.into_result_set();

        info!(
            "API returned {} hit(s) for '{}'",
            results.raw_hit_count, query.text
        );
        Ok(results)
    }
}

/// Request body of the unified catalog search endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub search_text: String,
    pub sort_by: &'static str,
    pub page: u32,
    pub page_size: u32,
    pub keys: Vec<String>,
    pub skills: Vec<String>,
    pub schools: Vec<String>,
    pub raw_durations: Vec<String>,
    pub difficulties: Vec<String>,
    pub semantic_types: Vec<String>,
    pub enrolled_only: bool,
}

impl SearchRequest {
    /// First page of results for `query`.
    ///
    /// Facets that are set become singleton filters; unset facets are sent
    /// as empty lists, which the API treats as "any".
    pub fn from_query(query: &SearchQuery, page_size: u32) -> Self {
        Self {
            search_text: query.text.clone(),
            sort_by: query.sort_by.api_key(),
            page: 0,
            page_size,
            keys: Vec::new(),
            skills: query.skill_filter().map(str::to_string).into_iter().collect(),
            schools: Vec::new(),
            raw_durations: Vec::new(),
            difficulties: query.level_filter().map(str::to_string).into_iter().collect(),
            semantic_types: Vec::new(),
            enrolled_only: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    search_result: Option<SearchResult>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResult {
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Debug, Default, Deserialize)]
struct RawHit {
    #[serde(rename = "_highlightResult", default)]
    highlight_result: Option<HighlightResult>,
}

#[derive(Debug, Default, Deserialize)]
struct HighlightResult {
    #[serde(default)]
    title: Option<HighlightField>,
}

#[derive(Debug, Default, Deserialize)]
struct HighlightField {
    #[serde(default)]
    value: Option<String>,
}

impl SearchResponse {
    fn into_result_set(self) -> ApiResultSet {
        let raw_hits = self.search_result.map(|r| r.hits).unwrap_or_default();
        let raw_hit_count = raw_hits.len();

        let hits: Vec<ApiHit> = raw_hits
            .into_iter()
            .filter_map(|hit| hit.highlight_result?.title?.value)
            .map(ApiHit::new)
            .collect();

        if hits.len() < raw_hit_count {
            warn!(
                "{} of {} hit(s) have no highlighted title",
                raw_hit_count - hits.len(),
                raw_hit_count
            );
        }

        ApiResultSet {
            hits,
            raw_hit_count,
        }
    }
}
