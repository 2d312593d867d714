//! Builds marktguru search query strings from structured parts.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

pub const QUERY_SYNTAX_HELP: &str = "\
Query syntax (observed):
- OR : boolean OR
- * : wildcard, e.g. kell*
- \"...\" : exact phrase
- ( ... ) : grouping
- NOT supported: AND, NOT, ~, ^

Build mode flags:
- --term <value> : add a term
- --phrase <value> : add an exact phrase
- --wildcard <value> : add a wildcard term (e.g. kell*)
- --or <value> : add a term to an OR group
- --group <value> : add a raw group (wrapped in parentheses)";

static QUOTE_ESCAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"["\\]"#).expect("static regex"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("No query parts provided. Use --term, --phrase, --wildcard, --or, or --group.")]
    Empty,
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuildInput {
    pub terms: Vec<String>,
    pub phrases: Vec<String>,
    pub wildcards: Vec<String>,
    pub ors: Vec<String>,
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryBuildResult {
    pub query: String,
    pub warnings: Vec<String>,
}

fn quote(value: &str) -> String {
    format!("\"{}\"", QUOTE_ESCAPE.replace_all(value, r"\$0"))
}

fn has_whitespace(value: &str) -> bool {
    value.chars().any(char::is_whitespace)
}

fn normalize_term(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if has_whitespace(trimmed) {
        Some(quote(trimmed))
    } else {
        Some(trimmed.to_string())
    }
}

fn normalize_phrase(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| quote(trimmed))
}

fn normalize_group(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| format!("({})", trimmed))
}

/// Joins terms, phrases, wildcards, the OR group and raw groups, in that order.
pub fn build_query(input: &QueryBuildInput) -> Result<QueryBuildResult, QueryError> {
    let mut parts = Vec::new();
    let mut warnings = Vec::new();

    parts.extend(input.terms.iter().filter_map(|t| normalize_term(t)));
    parts.extend(input.phrases.iter().filter_map(|p| normalize_phrase(p)));

    for wildcard in &input.wildcards {
        let trimmed = wildcard.trim();
        if trimmed.is_empty() {
            continue;
        }
        if has_whitespace(trimmed) {
            warnings.push("Wildcard contained whitespace and was quoted as a phrase.".to_string());
            parts.push(quote(trimmed));
        } else {
            parts.push(trimmed.to_string());
        }
    }

    let ors: Vec<String> = input.ors.iter().filter_map(|t| normalize_term(t)).collect();
    if !ors.is_empty() {
        parts.push(format!("({})", ors.join(" OR ")));
    }

    parts.extend(input.groups.iter().filter_map(|g| normalize_group(g)));

    let query = parts.join(" ").trim().to_string();
    if query.is_empty() {
        return Err(QueryError::Empty);
    }
    Ok(QueryBuildResult { query, warnings })
}
