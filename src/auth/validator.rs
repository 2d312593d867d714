use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::DiscoveryConfig;
use crate::http_client::{with_deadline, FetchError};

/// Decides whether a candidate key is accepted by the live API.
#[async_trait]
pub trait KeyValidator: Send + Sync {
    /// Any failure, including a timeout, counts as rejection.
    async fn accepts(&self, candidate: &str) -> bool;
}

/// Validates keys with a one-result offer search.
#[derive(Debug, Clone)]
pub struct ApiKeyValidator {
    client: Client,
    search_url: String,
    zip_code: String,
    timeout: Duration,
}

impl ApiKeyValidator {
    pub fn new(client: Client, config: &DiscoveryConfig) -> Self {
        Self {
            client,
            search_url: format!("{}/offers/search", config.api_base),
            zip_code: config.validation_zip_code.clone(),
            timeout: config.timeout,
        }
    }

    async fn probe(&self, candidate: &str) -> Result<u16, FetchError> {
        let request = async {
            self.client
                .get(&self.search_url)
                .query(&[
                    ("as", "web"),
                    ("q", "test"),
                    ("limit", "1"),
                    ("zipCode", self.zip_code.as_str()),
                ])
                .header("x-apikey", candidate)
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await
                .map(|resp| resp.status().as_u16())
                .map_err(|source| FetchError::Network { url: self.search_url.clone(), source })
        };
        with_deadline(&self.search_url, self.timeout, request).await
    }
}

#[async_trait]
impl KeyValidator for ApiKeyValidator {
    async fn accepts(&self, candidate: &str) -> bool {
        match self.probe(candidate).await {
            Ok(status) => {
                let ok = (200..300).contains(&status);
                tracing::debug!(status, accepted = ok, "validated candidate");
                ok
            }
            Err(e) => {
                tracing::debug!(error = %e, "candidate validation failed");
                false
            }
        }
    }
}
