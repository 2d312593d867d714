//! End-to-end API key discovery.
//!
//! Fetches an entry page, harvests candidates from it and from up to
//! `max_scripts` of its scripts, then validates candidates in the order they
//! were found. All requests are sequential.

use std::fmt;
use thiserror::Error;

use crate::auth::validator::{ApiKeyValidator, KeyValidator};
use crate::config::DiscoveryConfig;
use crate::fallback::{first_success, Fallback};
use crate::gather::{extract_script_urls, CandidateExtractor, CandidateSet};
use crate::headers::HeaderProfile;
use crate::http_client::{FetchError, FetchResult, HttpFetcher, PageFetcher};

/// Receives human-readable progress lines.
pub type Progress<'a> = Option<&'a (dyn Fn(&str) + Sync)>;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Every entry URL failed; there is no HTML to mine.
    #[error("Could not reach {origin}: {source}")]
    EntryUnreachable {
        origin: String,
        #[source]
        source: FetchError,
    },

    #[error("No scripts found to scan for API keys.")]
    NoScripts,

    /// The site was reachable but none of the candidates validated.
    #[error("Failed to capture a valid API key. The site may have changed.")]
    Exhausted { tried: usize },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid token pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl DiscoveryError {
    /// True for the failures that happen before any candidate could be validated.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DiscoveryError::Exhausted { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchEntry,
    ExtractEntryCandidates,
    DiscoverScripts,
    ScanScripts,
    ValidateCandidates,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::FetchEntry => "fetch_entry",
            Stage::ExtractEntryCandidates => "extract_entry_candidates",
            Stage::DiscoverScripts => "discover_scripts",
            Stage::ScanScripts => "scan_scripts",
            Stage::ValidateCandidates => "validate_candidates",
        };
        f.write_str(name)
    }
}

pub struct KeyDiscovery<F, V> {
    config: DiscoveryConfig,
    fetcher: F,
    validator: V,
    extractor: CandidateExtractor,
}

impl KeyDiscovery<HttpFetcher, ApiKeyValidator> {
    /// Discovery against the real site, sharing one HTTP client between page
    /// fetches and validation.
    pub fn live(config: DiscoveryConfig) -> Result<Self, DiscoveryError> {
        let fetcher = HttpFetcher::with_timeout(config.timeout)?;
        let validator = ApiKeyValidator::new(fetcher.client().clone(), &config);
        Self::new(config, fetcher, validator)
    }
}

impl<F: PageFetcher, V: KeyValidator> KeyDiscovery<F, V> {
    pub fn new(config: DiscoveryConfig, fetcher: F, validator: V) -> Result<Self, DiscoveryError> {
        let extractor = CandidateExtractor::new(config.token_shape.clone())?;
        Ok(Self { config, fetcher, validator, extractor })
    }

    pub fn with_extractor(mut self, extractor: CandidateExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn validator(&self) -> &V {
        &self.validator
    }

    /// Returns the first candidate the live API accepts.
    pub async fn run(&self, progress: Progress<'_>) -> Result<String, DiscoveryError> {
        let say = |msg: &str| {
            if let Some(log) = progress {
                log(msg);
            }
        };
        let profile = HeaderProfile::browser_like();

        tracing::info!(
            stage = %Stage::FetchEntry,
            origin = %self.config.origin,
            "starting key discovery"
        );
        say("→ Fetching entry HTML...");
        let entry = self.fetch_entry(&profile).await?;
        say(&format!("✓ Using entry URL: {}", entry.url));

        let mut candidates = self.extractor.extract(&entry.text);
        tracing::debug!(
            stage = %Stage::ExtractEntryCandidates,
            found = candidates.len(),
            "entry page scanned"
        );

        let mut scripts = extract_script_urls(&entry.text, &self.config.origin);
        tracing::debug!(
            stage = %Stage::DiscoverScripts,
            found = scripts.len(),
            "scripts discovered"
        );
        scripts.truncate(self.config.max_scripts);
        if scripts.is_empty() {
            return Err(DiscoveryError::NoScripts);
        }

        say(&format!("→ Scanning {} script(s)...", scripts.len()));
        self.scan_scripts(&scripts, &profile, &mut candidates).await;

        self.validate(candidates).await
    }

    async fn fetch_entry(&self, profile: &HeaderProfile) -> Result<FetchResult, DiscoveryError> {
        let fetcher = &self.fetcher;
        let outcome = first_success(
            self.config.entry_urls(),
            |url| async move {
                let res = fetcher.fetch_text(&url, profile).await;
                if let Err(e) = &res {
                    tracing::debug!(url = %url, error = %e, "entry URL failed");
                }
                res
            },
            |res| res.is_ok(),
        )
        .await;

        let unreachable = |source| DiscoveryError::EntryUnreachable {
            origin: self.config.origin.clone(),
            source,
        };
        match outcome {
            Fallback::Found { item, output } => output
                .map(|text| FetchResult { url: item, text })
                .map_err(unreachable),
            Fallback::Exhausted { last, .. } => {
                Err(unreachable(last.and_then(Result::err).unwrap_or(FetchError::NoUrls)))
            }
        }
    }

    /// A script that can't be fetched is skipped; it never aborts the run.
    async fn scan_scripts(
        &self,
        scripts: &[String],
        profile: &HeaderProfile,
        candidates: &mut CandidateSet,
    ) {
        for url in scripts {
            match self.fetcher.fetch_text(url, profile).await {
                Ok(body) => {
                    let added = candidates.merge(self.extractor.extract(&body));
                    tracing::debug!(
                        stage = %Stage::ScanScripts,
                        url = %url,
                        added,
                        "script scanned"
                    );
                }
                Err(e) => {
                    tracing::debug!(
                        stage = %Stage::ScanScripts,
                        url = %url,
                        error = %e,
                        "skipping script"
                    );
                }
            }
        }
    }

    async fn validate(&self, candidates: CandidateSet) -> Result<String, DiscoveryError> {
        let tried = candidates.len();
        tracing::info!(
            stage = %Stage::ValidateCandidates,
            candidates = tried,
            "validating candidates"
        );
        let validator = &self.validator;
        let outcome = first_success(
            candidates,
            |candidate| async move { validator.accepts(&candidate).await },
            |accepted| *accepted,
        )
        .await;
        match outcome.found() {
            Some((key, _)) => {
                tracing::info!("found a valid API key");
                Ok(key)
            }
            None => Err(DiscoveryError::Exhausted { tried }),
        }
    }
}

/// Discover a working API key from the live site with the default settings.
pub async fn discover_api_key(progress: Progress<'_>) -> Result<String, DiscoveryError> {
    KeyDiscovery::live(DiscoveryConfig::default())?.run(progress).await
}
