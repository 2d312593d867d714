use async_trait::async_trait;
use marktguru::auth::{DiscoveryError, KeyDiscovery, KeyValidator};
use marktguru::config::DiscoveryConfig;
use marktguru::gather::{CandidateExtractor, KeyPattern};
use marktguru::headers::HeaderProfile;
use marktguru::http_client::{FetchError, PageFetcher};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

const ORIGIN: &str = "https://shop.test";

/// In-memory site: each URL either serves a body or fails with a status.
#[derive(Default)]
struct FakeSite {
    pages: HashMap<String, Result<String, u16>>,
    calls: Mutex<Vec<String>>,
}

impl FakeSite {
    fn page(mut self, path: &str, body: &str) -> Self {
        self.pages.insert(format!("{}{}", ORIGIN, path), Ok(body.to_string()));
        self
    }

    fn failing(mut self, path: &str, status: u16) -> Self {
        self.pages.insert(format!("{}{}", ORIGIN, path), Err(status));
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn was_fetched(&self, path: &str) -> bool {
        self.calls().contains(&format!("{}{}", ORIGIN, path))
    }
}

#[async_trait]
impl PageFetcher for FakeSite {
    async fn fetch_text(&self, url: &str, profile: &HeaderProfile) -> Result<String, FetchError> {
        assert!(profile.get("user-agent").is_some());
        self.calls.lock().push(url.to_string());
        match self.pages.get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(status)) => Err(FetchError::Status { status: *status, url: url.to_string() }),
            None => Err(FetchError::Status { status: 404, url: url.to_string() }),
        }
    }
}

#[derive(Default)]
struct FakeApi {
    valid: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    fn accepting(keys: &[&str]) -> Self {
        Self { valid: keys.iter().map(|k| k.to_string()).collect(), ..Default::default() }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl KeyValidator for FakeApi {
    async fn accepts(&self, candidate: &str) -> bool {
        self.calls.lock().push(candidate.to_string());
        self.valid.contains(candidate)
    }
}

fn config(entry_paths: &[&str]) -> DiscoveryConfig {
    DiscoveryConfig {
        origin: ORIGIN.to_string(),
        entry_paths: entry_paths.iter().map(|p| p.to_string()).collect(),
        ..DiscoveryConfig::default()
    }
}

fn discovery(paths: &[&str], site: FakeSite, api: FakeApi) -> KeyDiscovery<FakeSite, FakeApi> {
    KeyDiscovery::new(config(paths), site, api).unwrap()
}

#[tokio::test]
async fn entry_fallback_stops_at_first_success() {
    let site = FakeSite::default()
        .failing("/a", 503)
        .page("/b", r#"<script src="/app.js"></script>"#)
        .page("/c", r#"<script src="/other.js"></script>"#)
        .page("/app.js", r#"const c={apiKey:"key-from-app-js"};"#);
    let d = discovery(&["/a", "/b", "/c"], site, FakeApi::accepting(&["key-from-app-js"]));

    let key = d.run(None).await.unwrap();

    assert_eq!(key, "key-from-app-js");
    assert!(d.fetcher().was_fetched("/a"));
    assert!(d.fetcher().was_fetched("/b"));
    assert!(!d.fetcher().was_fetched("/c"));
}

#[tokio::test]
async fn no_scripts_is_fatal_even_with_inline_candidates() {
    let site = FakeSite::default()
        .page("/", r#"<script>var cfg={apiKey:"abcdef0123456789"};</script>"#);
    let d = discovery(&["/"], site, FakeApi::accepting(&["abcdef0123456789"]));

    let err = d.run(None).await.unwrap_err();

    assert!(matches!(err, DiscoveryError::NoScripts));
    assert!(err.is_fatal());
    assert_eq!(err.to_string(), "No scripts found to scan for API keys.");
    assert!(d.validator().calls().is_empty());
}

#[tokio::test]
async fn validation_follows_insertion_order_and_stops() {
    let site = FakeSite::default()
        .page("/", r#"<script>apiKey: "XXXXXXXXXXXX"</script><script src="/main.js"></script>"#)
        .page("/main.js", r#"a={apiKey:"YYYYYYYYYYYY"};b={apiKey:"ZZZZZZZZZZZZ"};"#);
    let d = discovery(&["/"], site, FakeApi::accepting(&["YYYYYYYYYYYY", "ZZZZZZZZZZZZ"]));

    let key = d.run(None).await.unwrap();

    assert_eq!(key, "YYYYYYYYYYYY");
    assert_eq!(d.validator().calls(), vec!["XXXXXXXXXXXX", "YYYYYYYYYYYY"]);
}

#[tokio::test]
async fn inline_key_survives_failing_scripts() {
    let site = FakeSite::default()
        .page(
            "/",
            r#"<html><head>
                <script src="/broken.js"></script>
                <script src="//cdn.shop.test/missing.js"></script>
            </head><body><script>window.cfg = { apiKey: "abcdef0123456789" };</script></body></html>"#,
        )
        .failing("/broken.js", 500);
    let d = discovery(&["/"], site, FakeApi::accepting(&["abcdef0123456789"]));

    let key = d.run(None).await.unwrap();

    assert_eq!(key, "abcdef0123456789");
    let calls = d.fetcher().calls();
    assert!(calls.contains(&"https://shop.test/broken.js".to_string()));
    assert!(calls.contains(&"https://cdn.shop.test/missing.js".to_string()));
}

#[tokio::test]
async fn unreachable_site_reports_last_error() {
    let site = FakeSite::default().failing("/a", 503).failing("/b", 403);
    let d = discovery(&["/a", "/b"], site, FakeApi::default());

    let err = d.run(None).await.unwrap_err();

    match &err {
        DiscoveryError::EntryUnreachable { source, .. } => assert_eq!(source.status(), Some(403)),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.is_fatal());
    assert!(err.to_string().contains("https://shop.test/b"));
}

#[tokio::test]
async fn empty_entry_list_is_unreachable() {
    let d = discovery(&[], FakeSite::default(), FakeApi::default());

    let err = d.run(None).await.unwrap_err();

    assert!(matches!(err, DiscoveryError::EntryUnreachable { source: FetchError::NoUrls, .. }));
}

#[tokio::test]
async fn exhausted_candidates_suggest_site_change() {
    let site = FakeSite::default()
        .page("/", r#"<script src="/a.js"></script>"#)
        .page("/a.js", r#"h={"x-apikey":"stale-key-0001"};"#);
    let d = discovery(&["/"], site, FakeApi::default());

    let err = d.run(None).await.unwrap_err();

    assert!(matches!(err, DiscoveryError::Exhausted { tried: 1 }));
    assert!(!err.is_fatal());
    assert!(err.to_string().contains("The site may have changed"));
}

#[tokio::test]
async fn script_scan_is_capped() {
    let html: String = (0..25).map(|i| format!(r#"<script src="/s{}.js"></script>"#, i)).collect();
    let site = FakeSite::default().page("/", &html);
    let d = discovery(&["/"], site, FakeApi::default());

    let _ = d.run(None).await;

    let script_calls = d.fetcher().calls().iter().filter(|u| u.ends_with(".js")).count();
    assert_eq!(script_calls, 20);
    assert!(!d.fetcher().was_fetched("/s20.js"));
}

#[tokio::test]
async fn progress_lines_are_reported() {
    let site = FakeSite::default()
        .page("/", r#"<script src="/a.js"></script>"#)
        .page("/a.js", r#"apiKey="progress-key-1""#);
    let d = discovery(&["/"], site, FakeApi::accepting(&["progress-key-1"]));
    let lines = Mutex::new(Vec::new());
    let log = |msg: &str| lines.lock().push(msg.to_string());

    d.run(Some(&log)).await.unwrap();

    let lines = lines.into_inner();
    assert_eq!(lines[0], "→ Fetching entry HTML...");
    assert_eq!(lines[1], "✓ Using entry URL: https://shop.test/");
    assert!(lines.contains(&"→ Scanning 1 script(s)...".to_string()));
}

struct DataAttrPattern;

impl KeyPattern for DataAttrPattern {
    fn name(&self) -> &'static str {
        "data-api-key attribute"
    }

    fn scan(&self, text: &str) -> Vec<String> {
        text.split("data-api-key=\"")
            .skip(1)
            .filter_map(|rest| rest.split('"').next())
            .map(String::from)
            .collect()
    }
}

#[tokio::test]
async fn custom_extractor_replaces_stock_patterns() {
    let site = FakeSite::default()
        .page("/", r#"<div data-api-key="attr-key-42"></div><script src="/a.js"></script>"#)
        .page("/a.js", r#"cfg={apiKey:"stock-pattern-key"};"#);
    let api = FakeApi::accepting(&["attr-key-42", "stock-pattern-key"]);
    let extractor = CandidateExtractor::with_patterns(vec![Box::new(DataAttrPattern)]);
    let d = discovery(&["/"], site, api).with_extractor(extractor);

    let key = d.run(None).await.unwrap();

    assert_eq!(key, "attr-key-42");
    assert_eq!(d.validator().calls(), vec!["attr-key-42"]);
}
