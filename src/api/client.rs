use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

use super::types::SearchResult;
use crate::config::API_BASE;
use crate::http_client::create_client;

pub const DEFAULT_SEARCH_LIMIT: u32 = 20;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No API key configured. Run 'marktguru login' first.")]
    MissingKey,

    #[error("API key invalid or expired. Run 'marktguru login' to refresh.")]
    Unauthorized,

    #[error("API error: {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected API response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub query: String,
    pub zip_code: String,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub retailer_id: Option<u64>,
}

/// Client for the offers search endpoint.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    api_base: String,
    api_key: String,
}

impl CatalogClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ApiError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ApiError::MissingKey);
        }
        Ok(Self {
            client: create_client(Duration::from_secs(30))?,
            api_base: API_BASE.to_string(),
            api_key,
        })
    }

    pub fn with_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn search_url(&self) -> String {
        format!("{}/offers/search", self.api_base)
    }

    pub async fn search(&self, options: &SearchOptions) -> Result<SearchResult, ApiError> {
        let limit = options.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).to_string();
        let offset = options.offset.unwrap_or(0).to_string();
        let mut params = vec![
            ("as", "web".to_string()),
            ("q", options.query.clone()),
            ("limit", limit),
            ("offset", offset),
            ("zipCode", options.zip_code.clone()),
        ];
        if let Some(id) = options.retailer_id {
            params.push(("retailerIds", id.to_string()));
        }

        tracing::debug!(query = %options.query, zip = %options.zip_code, "searching offers");
        let response = self
            .client
            .get(self.search_url())
            .query(&params)
            .header("x-apikey", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }
        let body = response.text().await?;
        Ok(serde_json::from_str::<SearchResult>(&body)?)
    }
}
