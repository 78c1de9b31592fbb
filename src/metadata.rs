//! Metadata maps, front-matter extraction, and date parsing.
//!
//! Entities and documents carry free-form string metadata collected from two
//! kinds of sources:
//!
//! - **Standalone `.yml` files** in an entity's directory. Every file in a
//!   directory contributes to the same entity; later files win on key
//!   conflicts (files are visited in sorted name order, so the merge is
//!   deterministic).
//! - **Front matter** between `---` fences at the top of a markdown file.
//!   Front matter belongs to the document it heads, not to the directory.
//!
//! Both sources use the same flat `key: value` format. Nested structures are
//! not supported — only scalars and simple lists:
//!
//! ```text
//! title: Launch Week
//! date: 2024-05-01
//! topics:
//!   - rockets
//!   - press
//! ```
//!
//! A list with a single item is stored under the plain key; longer lists are
//! stored under indexed keys (`topics[0]`, `topics[1]`, …) so that the map
//! stays string-to-string.
//!
//! ## Dates
//!
//! The `date` key is parsed with a small set of accepted formats. An
//! unparseable date is a recoverable problem: the caller logs it and falls
//! back to the file timestamp.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("cannot parse date {0:?}")]
pub struct DateParseError(String);

/// String-to-string metadata with last-write-wins merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(flatten)]
    entries: BTreeMap<String, String>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Merge `other` into this map. Keys present in both take the value
    /// from `other`.
    pub fn merge(&mut self, other: Metadata) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Parse flat `key: value` metadata (the subset of YAML used by metadata
/// files and front matter).
///
/// Supports scalar values and simple `- item` lists. Blank lines and `#`
/// comments are skipped. Anything more deeply structured is ignored rather
/// than rejected — metadata is advisory, not schema-checked.
pub fn parse_flat_yaml(source: &str) -> Metadata {
    let mut metadata = Metadata::new();
    let mut pending_list: Option<(String, Vec<String>)> = None;

    for raw_line in source.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(item) = line.strip_prefix("- ") {
            if let Some((_, items)) = pending_list.as_mut() {
                items.push(item.trim().to_string());
            }
            continue;
        }

        flush_list(&mut metadata, pending_list.take());

        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            let value = value.trim();
            if key.is_empty() {
                continue;
            }
            if value.is_empty() {
                pending_list = Some((key.to_string(), Vec::new()));
            } else {
                metadata.insert(key, value);
            }
        }
    }
    flush_list(&mut metadata, pending_list.take());

    metadata
}

/// Store a completed list: single-item lists collapse to the plain key,
/// longer lists become indexed keys (`key[0]`, `key[1]`, …).
fn flush_list(metadata: &mut Metadata, list: Option<(String, Vec<String>)>) {
    let Some((key, items)) = list else { return };
    match items.len() {
        0 => {}
        1 => metadata.insert(key, items.into_iter().next().unwrap_or_default()),
        _ => {
            for (idx, item) in items.into_iter().enumerate() {
                metadata.insert(format!("{key}[{idx}]"), item);
            }
        }
    }
}

/// Split front matter off a markdown source.
///
/// Front matter is delimited by a `---` line at the very start of the file
/// and a closing `---` line. Returns the parsed metadata and the remaining
/// body. A document without front matter yields empty metadata and the
/// full source.
pub fn extract_front_matter(source: &str) -> (Metadata, &str) {
    let Some(rest) = source.strip_prefix("---") else {
        return (Metadata::new(), source);
    };
    let Some(rest) = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n")) else {
        return (Metadata::new(), source);
    };

    for (offset, line) in line_spans(rest) {
        if line.trim_end() == "---" {
            let block = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (parse_flat_yaml(block), body);
        }
    }
    // Unclosed fence: treat the whole file as body.
    (Metadata::new(), source)
}

/// Iterate `(byte offset, line incl. terminator)` pairs.
fn line_spans(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    std::iter::from_fn(move || {
        if offset >= text.len() {
            return None;
        }
        let rest = &text[offset..];
        let end = rest.find('\n').map(|i| i + 1).unwrap_or(rest.len());
        let span = (offset, &rest[..end]);
        offset += end;
        Some(span)
    })
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y", "%d %B %Y"];

/// Human-readable date form used on pages and in listings.
pub fn readable_date(date: &NaiveDateTime) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Parse a metadata date value.
///
/// Accepts ISO date-times and a few common date-only spellings
/// (`2024-05-01`, `05/01/2024`, `May 1, 2024`, `1 May 2024`). Date-only
/// values resolve to midnight.
pub fn parse_date(input: &str) -> Result<NaiveDateTime, DateParseError> {
    let input = input.trim();
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(input, format) {
            return Ok(date.and_hms_opt(0, 0, 0).unwrap_or_default());
        }
    }
    Err(DateParseError(input.to_string()))
}
