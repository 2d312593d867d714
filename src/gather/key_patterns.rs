//! Heuristics that pull API-key-looking strings out of HTML and minified JS.
//!
//! Each [`KeyPattern`] runs independently; [`CandidateExtractor`] unions their
//! hits into a [`CandidateSet`]. None of them is trusted on its own, every
//! candidate still has to pass live validation.

use ahash::AHashSet;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::TokenShape;

static HEADER_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)x-apikey\s*['"]?\s*[:=]\s*['"]([^'"]{10,})['"]"#).expect("static regex")
});

static NAMED_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)apiKey\s*[:=]\s*['"]([^'"]{10,})['"]"#).expect("static regex")
});

/// Insertion-ordered set of unvalidated key candidates.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    order: Vec<String>,
    seen: AHashSet<String>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the candidate was already present.
    pub fn insert(&mut self, candidate: impl Into<String>) -> bool {
        let candidate = candidate.into();
        if self.seen.contains(&candidate) {
            return false;
        }
        self.seen.insert(candidate.clone());
        self.order.push(candidate);
        true
    }

    /// Adds every candidate of `other`, returning how many were new.
    pub fn merge(&mut self, other: CandidateSet) -> usize {
        other.into_iter().filter(|c| self.insert(c.clone())).count()
    }

    pub fn contains(&self, candidate: &str) -> bool {
        self.seen.contains(candidate)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.order.clone()
    }
}

impl IntoIterator for CandidateSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.into_iter()
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.iter()
    }
}

impl<S: Into<String>> FromIterator<S> for CandidateSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut set = CandidateSet::new();
        for candidate in iter {
            set.insert(candidate);
        }
        set
    }
}

/// One independent extraction heuristic.
pub trait KeyPattern: Send + Sync {
    fn name(&self) -> &'static str;

    /// All matches in `text`, in order of appearance. May contain duplicates.
    fn scan(&self, text: &str) -> Vec<String>;
}

/// Quoted literal captured by group 1 of a regex.
pub struct LiteralPattern {
    name: &'static str,
    regex: Regex,
}

impl LiteralPattern {
    pub fn new(name: &'static str, regex: Regex) -> Self {
        Self { name, regex }
    }

    /// `x-apikey: "..."` style header defaults.
    pub fn header_literal() -> Self {
        Self::new("x-apikey header literal", HEADER_LITERAL.clone())
    }

    /// `apiKey: "..."` / `apiKey = "..."` config fields.
    pub fn named_field() -> Self {
        Self::new("apiKey field", NAMED_FIELD.clone())
    }
}

impl KeyPattern for LiteralPattern {
    fn name(&self) -> &'static str {
        self.name
    }

    fn scan(&self, text: &str) -> Vec<String> {
        self.regex
            .captures_iter(text)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
            .collect()
    }
}

/// Padded base64 runs of a typical key length. Unpadded runs are skipped, which
/// filters out hashes and long minified identifiers.
pub struct OpaqueTokenPattern {
    shape: TokenShape,
    regex: Regex,
}

impl OpaqueTokenPattern {
    pub fn new(shape: TokenShape) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!(
            "[A-Za-z0-9+/]{{{},{}}}={{0,2}}",
            shape.scan_min, shape.scan_max
        ))?;
        Ok(Self { shape, regex })
    }

    fn keeps(&self, value: &str) -> bool {
        (self.shape.keep_min..=self.shape.keep_max).contains(&value.len())
            && (!self.shape.require_padding || value.contains('='))
    }
}

impl KeyPattern for OpaqueTokenPattern {
    fn name(&self) -> &'static str {
        "opaque token"
    }

    fn scan(&self, text: &str) -> Vec<String> {
        self.regex
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|value| self.keeps(value))
            .map(String::from)
            .collect()
    }
}

/// Ordered list of heuristics. New patterns can be pushed without touching the
/// discovery pipeline.
pub struct CandidateExtractor {
    patterns: Vec<Box<dyn KeyPattern>>,
}

impl CandidateExtractor {
    /// The three stock heuristics: header literal, `apiKey` field, opaque token.
    pub fn new(shape: TokenShape) -> Result<Self, regex::Error> {
        Ok(Self::with_patterns(vec![
            Box::new(LiteralPattern::header_literal()),
            Box::new(LiteralPattern::named_field()),
            Box::new(OpaqueTokenPattern::new(shape)?),
        ]))
    }

    pub fn with_patterns(patterns: Vec<Box<dyn KeyPattern>>) -> Self {
        Self { patterns }
    }

    pub fn push(&mut self, pattern: Box<dyn KeyPattern>) {
        self.patterns.push(pattern);
    }

    pub fn pattern_names(&self) -> Vec<&'static str> {
        self.patterns.iter().map(|p| p.name()).collect()
    }

    pub fn extract(&self, text: &str) -> CandidateSet {
        let mut set = CandidateSet::new();
        for pattern in &self.patterns {
            let hits = pattern.scan(text);
            if !hits.is_empty() {
                tracing::trace!(pattern = pattern.name(), hits = hits.len(), "pattern matched");
            }
            for hit in hits {
                set.insert(hit);
            }
        }
        set
    }
}

impl Default for CandidateExtractor {
    fn default() -> Self {
        Self::new(TokenShape::default()).expect("default token shape compiles")
    }
}
