//! RAWG catalog API client
//!
//! Every request goes through the response cache first. The network is only
//! touched on a miss, and only successful responses are written back.

use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::cache::{params, Params, ResponseCache};
use crate::config::{Config, DEFAULT_API_BASE_URL};
use crate::user::GameId;

/// Page size used by the search screen
pub const SEARCH_PAGE_SIZE: u32 = 15;

/// Page size used by the trending screen
pub const TRENDING_PAGE_SIZE: u32 = 20;

/// Errors that can occur when fetching catalog data
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("API returned status {status} for {endpoint}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
    },

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Client for the catalog API with a read-through response cache
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    cache: Option<Arc<ResponseCache>>,
}

impl CatalogClient {
    /// Creates a client for `base_url` without a cache
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            cache: None,
        }
    }

    /// Creates a client from configuration
    pub fn from_config(config: &Config) -> Self {
        let client = Self::new(&config.api_base_url);
        match &config.api_key {
            Some(key) => client.with_api_key(key),
            None => client,
        }
    }

    /// Replaces the HTTP client
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Sets the API key sent with every request
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Attaches the response cache
    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Fetches `endpoint` (relative to the base URL) as JSON
    ///
    /// The API key is added to the query string but is not part of the cache
    /// key, so rotating keys does not invalidate cached responses.
    pub async fn fetch(&self, endpoint: &str, params: &Params) -> Result<Value, ApiError> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get::<Value>(endpoint, params) {
                debug!(endpoint, "using cached response");
                return Ok(cached);
            }
        }

        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        let mut request = self.client.get(&url).query(params);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status,
            });
        }

        let text = response.text().await?;
        let data: Value = serde_json::from_str(&text)?;

        if let Some(cache) = &self.cache {
            cache.set(endpoint, params, &data);
        }
        Ok(data)
    }

    /// Lists games matching arbitrary filter parameters
    pub async fn games(&self, params: &Params) -> Result<Value, ApiError> {
        self.fetch("games", params).await
    }

    /// Fetches the full details of one game
    pub async fn game_details(&self, id: GameId) -> Result<Value, ApiError> {
        self.fetch(&format!("games/{}", id), &Params::new()).await
    }

    /// Searches games by name
    pub async fn search_games(&self, query: &str, page_size: u32) -> Result<Value, ApiError> {
        let page_size = page_size.to_string();
        self.games(&params([("search", query), ("page_size", page_size.as_str())]))
            .await
    }

    /// Highest rated games
    pub async fn trending(&self, page_size: u32) -> Result<Value, ApiError> {
        let page_size = page_size.to_string();
        self.games(&params([("ordering", "-rating"), ("page_size", page_size.as_str())]))
            .await
    }
}

impl Default for CatalogClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}
