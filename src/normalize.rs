//! Normalization of provider records into [`SearchResult`].
//!
//! DuckDuckGo returns differently shaped records per category: text results
//! carry `href`, images carry `image`, videos carry `content` and
//! `description`. Each category has an ordered list of field aliases per output
//! field; the first alias that holds a usable value wins, otherwise a fixed
//! placeholder is used so every output field is always populated.

use crate::types::{Category, RawResult, SearchResult};
use serde_json::Value;

/// Placeholder for a missing title
pub const NO_TITLE: &str = "No title";

/// Placeholder for a missing URL
pub const NO_URL: &str = "No URL";

/// Placeholder for a missing body
pub const NO_BODY: &str = "No body";

/// Ordered field lookups for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldAliases {
    /// Keys tried for the title
    pub title: &'static [&'static str],
    /// Keys tried for the URL
    pub url: &'static [&'static str],
    /// Keys tried for the body
    pub body: &'static [&'static str],
}

const TEXT_ALIASES: FieldAliases = FieldAliases {
    title: &["title"],
    url: &["href", "url"],
    body: &["body"],
};

const IMAGE_ALIASES: FieldAliases = FieldAliases {
    title: &["title"],
    url: &["href", "url", "image"],
    body: &["body"],
};

const VIDEO_ALIASES: FieldAliases = FieldAliases {
    title: &["title"],
    url: &["href", "url", "content"],
    body: &["body", "description"],
};

impl Category {
    /// The alias table used to normalize records of this category
    pub fn aliases(&self) -> &'static FieldAliases {
        match self {
            Category::Text | Category::News => &TEXT_ALIASES,
            Category::Images => &IMAGE_ALIASES,
            Category::Videos => &VIDEO_ALIASES,
        }
    }
}

/// Normalize one provider record.
///
/// Never fails: missing fields resolve to [`NO_TITLE`], [`NO_URL`] and
/// [`NO_BODY`].
pub fn normalize(raw: &RawResult, category: Category) -> SearchResult {
    let aliases = category.aliases();

    SearchResult {
        title: first_non_null(raw, aliases.title).unwrap_or_else(|| NO_TITLE.to_string()),
        url: first_present(raw, aliases.url).unwrap_or_else(|| NO_URL.to_string()),
        body: first_present(raw, aliases.body).unwrap_or_else(|| NO_BODY.to_string()),
    }
}

/// Normalize a whole result set, keeping provider order
pub fn normalize_all(raw: &[RawResult], category: Category) -> Vec<SearchResult> {
    raw.iter().map(|r| normalize(r, category)).collect()
}

/// Value of the first key that is present, non-null and non-empty
fn first_present(raw: &RawResult, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find_map(value_as_text)
}

/// Value of the first key that is present and non-null; `""` is kept
fn first_non_null(raw: &RawResult, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find_map(|value| match value {
            Value::String(s) => Some(s.clone()),
            other => value_as_text(other),
        })
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        // null, empty strings, arrays and objects
        _ => None,
    }
}
