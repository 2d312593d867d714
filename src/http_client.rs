use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::headers::HeaderProfile;

/// Upper bound on any single request made during discovery.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out after {}s", .after.as_secs())]
    Timeout { url: String, after: Duration },

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("No URLs to fetch.")]
    NoUrls,
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A fetched page or script body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub url: String,
    pub text: String,
}

/// Single bounded GET returning the decoded body. No retries.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str, profile: &HeaderProfile) -> Result<String, FetchError>;
}

/// Client for the discovery run. Browser identity comes from the
/// per-request [`HeaderProfile`], so no default user agent is set here.
pub fn create_client(timeout: Duration) -> reqwest::Result<Client> {
    ClientBuilder::new()
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .tcp_nodelay(true)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .use_rustls_tls()
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
}

/// Runs `fut` under a deadline. Expiry cancels the request and is reported as a
/// [`FetchError::Timeout`], which callers treat like any other failed fetch.
pub async fn with_deadline<T, F>(url: &str, after: Duration, fut: F) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(res) => res,
        Err(_) => Err(FetchError::Timeout { url: url.to_string(), after }),
    }
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn with_timeout(timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self::new(create_client(timeout)?, timeout))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str, profile: &HeaderProfile) -> Result<String, FetchError> {
        let request = async {
            let network = |source| FetchError::Network { url: url.to_string(), source };
            let resp = self
                .client
                .get(url)
                .headers(profile.headers().clone())
                .send()
                .await
                .map_err(network)?;
            let status = resp.status();
            if !status.is_success() {
                return Err(FetchError::Status { status: status.as_u16(), url: url.to_string() });
            }
            resp.text().await.map_err(network)
        };
        let text = with_deadline(url, self.timeout, request).await?;
        tracing::debug!(url, bytes = text.len(), "fetched");
        Ok(text)
    }
}
