//! Text and image search providers.
//!
//! The pipeline only sees the [`TextSearch`] and [`ImageSearch`] traits.
//! [`SearxngClient`] implements both against a SearXNG instance's JSON API.

use ask_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One hit from a text search, in provider order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    /// Provider snippet; may be empty
    pub snippet: String,
}

/// One hit from an image search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResult {
    pub thumbnail_url: String,
    pub title: String,
}

/// Provider of ranked web results.
#[async_trait::async_trait]
pub trait TextSearch: Send + Sync {
    /// Search for `query`, returning at most `max_results` hits.
    async fn search_text(&self, query: &str, max_results: usize) -> AppResult<Vec<SearchResult>>;
}

/// Provider of image thumbnails.
#[async_trait::async_trait]
pub trait ImageSearch: Send + Sync {
    /// Search for `query`, returning at most `max_results` images.
    async fn search_images(&self, query: &str, max_results: usize) -> AppResult<Vec<ImageResult>>;
}

#[derive(Debug, Deserialize)]
struct SearxngResponse {
    #[serde(default)]
    results: Vec<SearxngHit>,
}

#[derive(Debug, Deserialize)]
struct SearxngHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    thumbnail_src: Option<String>,
    #[serde(default)]
    img_src: Option<String>,
}

/// SearXNG search client.
pub struct SearxngClient {
    /// Instance base URL, without a trailing slash
    base_url: String,

    /// Bound on each search round-trip
    timeout: Option<Duration>,

    client: reqwest::Client,
}

impl SearxngClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: None,
            client: reqwest::Client::new(),
        }
    }

    /// Bound every search by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn query(&self, query: &str, category: Option<&str>) -> AppResult<Vec<SearxngHit>> {
        let url = format!("{}/search", self.base_url);

        let mut params = vec![("q", query), ("format", "json")];
        if let Some(category) = category {
            params.push(("categories", category));
        }

        tracing::debug!("Searching {} for {:?} (category: {:?})", url, query, category);

        let pending = async {
            let response = self
                .client
                .get(&url)
                .query(&params)
                .send()
                .await
                .map_err(|e| AppError::Search(format!("Failed to reach {}: {}", url, e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(AppError::Search(format!(
                    "Search API error ({}): {}",
                    status, error_text
                )));
            }

            response
                .json::<SearxngResponse>()
                .await
                .map_err(|e| AppError::Search(format!("Failed to parse search response: {}", e)))
        };

        let body = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, pending).await.map_err(|_| {
                AppError::Search(format!("Search request timed out after {:?}", timeout))
            })??,
            None => pending.await?,
        };

        Ok(body.results)
    }
}

fn to_search_result(hit: SearxngHit) -> Option<SearchResult> {
    if hit.url.is_empty() {
        return None;
    }
    Some(SearchResult {
        title: hit.title,
        url: hit.url,
        snippet: hit.content.unwrap_or_default(),
    })
}

fn to_image_result(hit: SearxngHit) -> Option<ImageResult> {
    let thumbnail_url = hit
        .thumbnail_src
        .filter(|s| !s.is_empty())
        .or(hit.img_src.filter(|s| !s.is_empty()))?;

    // SearXNG reports some thumbnails as protocol-relative URLs
    let thumbnail_url = match thumbnail_url.strip_prefix("//") {
        Some(rest) => format!("https://{}", rest),
        None => thumbnail_url,
    };

    Some(ImageResult {
        thumbnail_url,
        title: hit.title,
    })
}

#[async_trait::async_trait]
impl TextSearch for SearxngClient {
    async fn search_text(&self, query: &str, max_results: usize) -> AppResult<Vec<SearchResult>> {
        let hits = self.query(query, None).await?;
        let results: Vec<SearchResult> = hits
            .into_iter()
            .filter_map(to_search_result)
            .take(max_results)
            .collect();

        tracing::info!("Text search returned {} results", results.len());
        Ok(results)
    }
}

#[async_trait::async_trait]
impl ImageSearch for SearxngClient {
    async fn search_images(&self, query: &str, max_results: usize) -> AppResult<Vec<ImageResult>> {
        let hits = self.query(query, Some("images")).await?;
        let results: Vec<ImageResult> = hits
            .into_iter()
            .filter_map(to_image_result)
            .take(max_results)
            .collect();

        tracing::info!("Image search returned {} results", results.len());
        Ok(results)
    }
}
