use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};
use std::fmt::Display;

/// Oldest Chrome major version a generated profile will claim.
pub const CHROME_MIN_MAJOR: u32 = 110;
pub const CHROME_MAX_MAJOR: u32 = 131;

/// Used whenever the randomized generator can't produce a profile.
const FALLBACK_HEADERS: [(&str, &str); 4] = [
    (
        "user-agent",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    ),
    ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    ("accept-language", "en-US,en;q=0.9"),
    ("accept-encoding", "gzip, deflate, br"),
];

const NAVIGATION_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";

const ACCEPT_LANGUAGES: &[&str] = &[
    "en-US,en;q=0.9",
    "de-AT,de;q=0.9,en-US;q=0.8,en;q=0.7",
    "de-DE,de;q=0.9,en;q=0.8",
    "en-GB,en-US;q=0.9,en;q=0.8",
];

// Chrome rotates the GREASE brand between releases.
const GREASE_BRANDS: &[&str] = &["Not?A_Brand", "Not_A Brand", "Not/A)Brand", "Not A(Brand"];

/// Browser-like request headers shared by every request of one discovery run.
#[derive(Debug, Clone)]
pub struct HeaderProfile {
    headers: HeaderMap,
}

impl HeaderProfile {
    /// Randomized desktop Chrome on macOS, or the static profile if generation fails.
    pub fn browser_like() -> Self {
        let mut rng = rand::thread_rng();
        Self::with_fallback(Self::randomized(&mut rng))
    }

    /// Accepts a generated profile, falling back to [`HeaderProfile::fallback`] on error
    /// or when the generator produced nothing.
    pub fn with_fallback<E: Display>(generated: Result<Self, E>) -> Self {
        match generated {
            Ok(profile) if !profile.is_empty() => profile,
            Ok(_) => {
                tracing::warn!("header generator returned an empty profile, using static headers");
                Self::fallback()
            }
            Err(e) => {
                tracing::warn!(error = %e, "header generator failed, using static headers");
                Self::fallback()
            }
        }
    }

    pub fn fallback() -> Self {
        let mut headers = HeaderMap::with_capacity(FALLBACK_HEADERS.len());
        for (name, value) in FALLBACK_HEADERS {
            headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        Self { headers }
    }

    /// Builds a Chrome-class desktop profile with a random recent version,
    /// client hints and fetch metadata as sent over HTTP/2.
    pub fn randomized<R: Rng + ?Sized>(rng: &mut R) -> Result<Self, InvalidHeaderValue> {
        let major = rng.gen_range(CHROME_MIN_MAJOR..=CHROME_MAX_MAJOR);
        let grease = GREASE_BRANDS.choose(rng).copied().unwrap_or("Not?A_Brand");
        let language = ACCEPT_LANGUAGES.choose(rng).copied().unwrap_or("en-US,en;q=0.9");

        let user_agent = format!(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{}.0.0.0 Safari/537.36",
            major
        );
        let client_hint = format!(
            "\"Chromium\";v=\"{major}\", \"Google Chrome\";v=\"{major}\", \"{grease}\";v=\"99\""
        );

        let fields: [(&'static str, String); 12] = [
            ("sec-ch-ua", client_hint),
            ("sec-ch-ua-mobile", "?0".to_string()),
            ("sec-ch-ua-platform", "\"macOS\"".to_string()),
            ("upgrade-insecure-requests", "1".to_string()),
            ("user-agent", user_agent),
            ("accept", NAVIGATION_ACCEPT.to_string()),
            ("sec-fetch-site", "none".to_string()),
            ("sec-fetch-mode", "navigate".to_string()),
            ("sec-fetch-user", "?1".to_string()),
            ("sec-fetch-dest", "document".to_string()),
            ("accept-encoding", "gzip, deflate, br".to_string()),
            ("accept-language", language.to_string()),
        ];

        let mut headers = HeaderMap::with_capacity(fields.len());
        for (name, value) in fields {
            headers.insert(HeaderName::from_static(name), HeaderValue::from_str(&value)?);
        }
        Ok(Self { headers })
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}
