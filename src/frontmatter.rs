//! Front matter splitting.
//!
//! A post may open with a metadata block fenced by delimiter lines:
//!
//! ```text
//! ---                          +++
//! title: Hello                 title = "Hello"
//! tags: [rust, web]            tags = ["rust", "web"]
//! ---                          +++
//! Body markdown...             Body markdown...
//! ```
//!
//! `---` fences YAML, `+++` fences TOML. Both are decoded into the same
//! untyped [`FrontMatter`] mapping; typed fields are picked out later by
//! [`crate::metadata`]. Keys nobody asks for stay in the mapping untouched.
//!
//! A post without an opening fence has no metadata and its whole text is the
//! body. An opening fence without a closing one is an error rather than a
//! silent "everything is metadata".

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Untyped front matter, keyed by field name.
pub type FrontMatter = BTreeMap<String, Value>;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("front matter opened with `{0}` on line 1 is never closed")]
    Unterminated(&'static str),
    #[error("front matter must be a mapping of keys to values, found {0}")]
    NotAMapping(&'static str),
    #[error("YAML front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("TOML front matter: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Format {
    Yaml,
    Toml,
}

impl Format {
    fn fence(self) -> &'static str {
        match self {
            Format::Yaml => "---",
            Format::Toml => "+++",
        }
    }
}

/// Split raw post text into its front matter and body.
///
/// The body is everything after the closing fence line, verbatim.
pub fn parse(raw: &str) -> Result<(FrontMatter, String), FrontmatterError> {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let (first_line, rest) = split_line(text);
    let format = match first_line.trim_end() {
        "---" => Format::Yaml,
        "+++" => Format::Toml,
        _ => return Ok((FrontMatter::new(), raw.to_string())),
    };

    let mut block_len = 0;
    let mut remaining = rest;
    loop {
        if remaining.is_empty() {
            return Err(FrontmatterError::Unterminated(format.fence()));
        }
        let (line, after) = split_line(remaining);
        if line.trim_end() == format.fence() {
            let block = &rest[..block_len];
            let metadata = decode(format, block)?;
            return Ok((metadata, after.to_string()));
        }
        block_len += remaining.len() - after.len();
        remaining = after;
    }
}

/// Split off the first line. The returned line excludes its terminator; the
/// remainder starts right after it.
fn split_line(text: &str) -> (&str, &str) {
    match text.find('\n') {
        Some(pos) => (text[..pos].trim_end_matches('\r'), &text[pos + 1..]),
        None => (text, ""),
    }
}

fn decode(format: Format, block: &str) -> Result<FrontMatter, FrontmatterError> {
    if block.trim().is_empty() {
        return Ok(FrontMatter::new());
    }
    let value = match format {
        Format::Yaml => serde_yaml::from_str::<Value>(block)?,
        Format::Toml => toml_to_json(toml::from_str::<toml::Value>(block)?),
    };
    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        Value::Null => Ok(FrontMatter::new()),
        Value::Array(_) => Err(FrontmatterError::NotAMapping("a list")),
        _ => Err(FrontmatterError::NotAMapping("a scalar")),
    }
}

/// TOML datetimes have no JSON counterpart; they become their RFC 3339 text
/// so a TOML `date = 2024-03-01` reads the same as a YAML `date: 2024-03-01`.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Value::from(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}
