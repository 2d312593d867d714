use ahash::AHashSet;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static SCRIPT_SRC: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script[src]").expect("static selector"));

/// Extract the external script URLs of an HTML page, absolute and in
/// first-occurrence order.
///
/// `//host/x` becomes `https://host/x`, `/x` is resolved against `origin`,
/// `http(s)://` URLs are kept and everything else (relative paths, data URIs)
/// is dropped.
pub fn extract_script_urls(html: &str, origin: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let origin = origin.trim_end_matches('/');
    let mut seen = AHashSet::new();
    let mut out = Vec::new();

    for element in document.select(&SCRIPT_SRC) {
        let Some(src) = element.value().attr("src") else { continue };
        let Some(url) = normalize_script_src(src.trim(), origin) else {
            tracing::trace!(src, "skipping non-absolute script src");
            continue;
        };
        if seen.insert(url.clone()) {
            out.push(url);
        }
    }
    out
}

fn normalize_script_src(src: &str, origin: &str) -> Option<String> {
    let url = if src.starts_with("//") {
        format!("https:{}", src)
    } else if src.starts_with('/') {
        format!("{}{}", origin, src)
    } else {
        src.to_string()
    };
    url.starts_with("http").then_some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://www.marktguru.at";

    #[test]
    fn test_normalizes_script_sources() {
        let html = r#"<html><head>
            <script src="//cdn.example.com/vendor.js"></script>
            <script src="/_next/static/chunks/main.js"></script>
            <script src='https://static.marktguru.at/app.js' defer></script>
            <script src="relative/path.js"></script>
            <script>window.inline = true;</script>
        </head></html>"#;
        assert_eq!(
            extract_script_urls(html, ORIGIN),
            vec![
                "https://cdn.example.com/vendor.js",
                "https://www.marktguru.at/_next/static/chunks/main.js",
                "https://static.marktguru.at/app.js",
            ]
        );
    }

    #[test]
    fn test_duplicates_collapse_to_first_occurrence() {
        let html = concat!(
            r#"<script src="/a.js"></script>"#,
            r#"<script src="/b.js"></script>"#,
            r#"<script src="/a.js"></script>"#,
        );
        assert_eq!(
            extract_script_urls(html, ORIGIN),
            vec!["https://www.marktguru.at/a.js", "https://www.marktguru.at/b.js"]
        );
    }

    #[test]
    fn test_trailing_slash_origin() {
        let html = r#"<script src="/a.js"></script>"#;
        assert_eq!(
            extract_script_urls(html, "https://www.marktguru.at/"),
            vec!["https://www.marktguru.at/a.js"]
        );
    }

    #[test]
    fn test_no_scripts() {
        assert!(extract_script_urls("<html><body>hi</body></html>", ORIGIN).is_empty());
    }
}
