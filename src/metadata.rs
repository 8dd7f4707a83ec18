//! Typed field resolution from front matter.
//!
//! [`crate::frontmatter`] hands back an untyped mapping. This module picks the
//! fields a post page needs out of it, each resolved independently. The first
//! non-empty value wins:
//!
//! - **Title**: `title` → humanized filename stem
//! - **Author**: `author` → configured default author
//! - **Description**: `description` → empty
//! - **Created**: `date` → filesystem creation time
//! - **Tags**: `tags` → none
//!
//! Front matter is hand-written, so the readers are forgiving: a number or
//! boolean where a string was expected is stringified, a single tag may be
//! written without a list, and a blank string counts as absent.
//!
//! ## Dates
//!
//! `date` accepts `2024-03-01`, `2024-03-01 14:30`, `2024-03-01 14:30:05`,
//! the same with a `T` separator, and full RFC 3339. Values without an offset
//! are taken as UTC. A date that matches none of these is reported and the
//! filesystem time is used instead.

use crate::frontmatter::FrontMatter;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::warn;

/// Resolve a metadata field from multiple sources.
///
/// Takes a list of optional values in priority order and returns the first
/// one that is not blank, exactly as written.
///
/// ```text
/// title:  resolve(&[front_matter_title, filename_title])
/// author: resolve(&[front_matter_author, default_author])
/// ```
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.filter(|s| !s.trim().is_empty())
                .map(String::from)
        })
        .next()
}

/// Read a scalar field as text. Lists, mappings and null are absent.
pub fn scalar(meta: &FrontMatter, key: &str) -> Option<String> {
    meta.get(key).and_then(scalar_text)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Read the `tags` field.
///
/// A list keeps its authored order, casing and spacing; blank and non-scalar
/// entries are dropped. A lone scalar is a single tag.
pub fn tags(meta: &FrontMatter) -> Vec<String> {
    let items: Vec<String> = match meta.get("tags") {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(other) => scalar_text(other).into_iter().collect(),
        None => Vec::new(),
    };
    items.into_iter().filter(|t| !t.trim().is_empty()).collect()
}

/// Parse a front matter date. Returns `None` when no accepted form matches.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Resolve the creation time: a parseable `date` wins over `fallback`.
///
/// `origin` names the post in the warning logged for an unparseable date.
pub fn created_at(meta: &FrontMatter, fallback: DateTime<Utc>, origin: &str) -> DateTime<Utc> {
    let Some(raw) = scalar(meta, "date").filter(|s| !s.trim().is_empty()) else {
        return fallback;
    };
    match parse_date(&raw) {
        Some(date) => date,
        None => {
            warn!(post = origin, date = %raw, "unrecognized date, using file creation time");
            fallback
        }
    }
}
