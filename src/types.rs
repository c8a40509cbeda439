//! Common types and data structures used throughout Mallard.
//!
//! This module contains all the shared types including:
//! - Search requests and normalized results
//! - Category, safe search and time limit enums
//! - Error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for Mallard operations
pub type MallardResult<T> = Result<T, MallardError>;

/// A loosely-shaped result record as returned by the search provider.
///
/// The available keys depend on the [`Category`] that was searched; none of
/// them are guaranteed to be present.
pub type RawResult = serde_json::Map<String, serde_json::Value>;

/// Smallest accepted `max_results`
pub const MIN_RESULTS: usize = 1;

/// Largest accepted `max_results`
pub const MAX_RESULTS: usize = 50;

/// Default number of results per search
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Errors that can occur during Mallard operations
#[derive(Error, Debug)]
pub enum MallardError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParseError(#[from] url::ParseError),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Search operation failed
    #[error("Search failed: {0}")]
    SearchError(String),

    /// Invalid arguments provided
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Server error
    #[error("Server error: {0}")]
    ServerError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Rate limit exceeded
    #[error("Rate limit exceeded, please try again later")]
    RateLimitExceeded,

    /// DuckDuckGo answered with a bot challenge instead of results
    #[error("Bot protection detected, DuckDuckGo refused the request")]
    BotProtectionDetected,
}

/// The kind of content a search targets.
///
/// Parsing is lenient: singular spellings are accepted and anything
/// unrecognized falls back to [`Category::Text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Category {
    /// Web pages
    #[default]
    Text,
    /// Images
    Images,
    /// Videos
    Videos,
    /// News articles
    News,
}

impl Category {
    /// All categories, in dispatch order
    pub const ALL: [Category; 4] = [
        Category::Text,
        Category::Images,
        Category::Videos,
        Category::News,
    ];

    /// Parse a category token, falling back to text for unknown values
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_lowercase().as_str() {
            "images" | "image" => Category::Images,
            "videos" | "video" => Category::Videos,
            "news" => Category::News,
            _ => Category::Text,
        }
    }

    /// Lowercase name as used on the tool surface
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Text => "text",
            Category::Images => "images",
            Category::Videos => "videos",
            Category::News => "news",
        }
    }
}

impl From<String> for Category {
    fn from(token: String) -> Self {
        Category::from_token(&token)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Safe search filtering levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum SafeSearch {
    /// Strict filtering
    On,
    /// Moderate filtering
    Moderate,
    /// No filtering (default)
    #[default]
    Off,
}

impl SafeSearch {
    /// Lowercase name as used on the tool surface
    pub fn as_str(&self) -> &'static str {
        match self {
            SafeSearch::On => "on",
            SafeSearch::Moderate => "moderate",
            SafeSearch::Off => "off",
        }
    }

    /// `kp` value for the HTML endpoint and `p` value for the news endpoint
    pub fn to_ddg_value(&self) -> &'static str {
        match self {
            SafeSearch::On => "1",
            SafeSearch::Moderate => "-1",
            SafeSearch::Off => "-2",
        }
    }

    /// `p` value for the image and video endpoints, which only know on and off
    pub fn to_ddg_media_value(&self) -> &'static str {
        match self {
            SafeSearch::On | SafeSearch::Moderate => "1",
            SafeSearch::Off => "-1",
        }
    }
}

impl From<String> for SafeSearch {
    fn from(token: String) -> Self {
        token.parse().unwrap_or_default()
    }
}

impl std::fmt::Display for SafeSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SafeSearch {
    type Err = MallardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "on" | "strict" => Ok(SafeSearch::On),
            "moderate" => Ok(SafeSearch::Moderate),
            "off" => Ok(SafeSearch::Off),
            _ => Err(MallardError::InvalidArguments(format!(
                "Invalid safe search level: {}",
                s
            ))),
        }
    }
}

/// Time window for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeLimit {
    /// Past day
    Day,
    /// Past week
    Week,
    /// Past month
    Month,
    /// Past year
    Year,
}

impl TimeLimit {
    /// Look up a human-facing token such as `" Week "`.
    ///
    /// Returns `None` for anything that is not one of day, week, month or year.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_lowercase().as_str() {
            "day" => Some(TimeLimit::Day),
            "week" => Some(TimeLimit::Week),
            "month" => Some(TimeLimit::Month),
            "year" => Some(TimeLimit::Year),
            _ => None,
        }
    }

    /// Single-letter DuckDuckGo code
    pub fn code(&self) -> &'static str {
        match self {
            TimeLimit::Day => "d",
            TimeLimit::Week => "w",
            TimeLimit::Month => "m",
            TimeLimit::Year => "y",
        }
    }
}

/// Arguments for the search tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// The search query string
    pub query: String,

    /// Maximum number of results to return (1-50)
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Result type to search
    #[serde(default, alias = "category")]
    pub categories: Category,

    /// Region code (e.g. "us-en"); `None` lets the provider choose
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Safe search level
    #[serde(default)]
    pub safesearch: SafeSearch,

    /// Time limit token (day, week, month, year)
    #[serde(default, alias = "time_limit", skip_serializing_if = "Option::is_none")]
    pub timelimit: Option<String>,
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

impl SearchRequest {
    /// Create a text search request with default options
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: DEFAULT_MAX_RESULTS,
            categories: Category::default(),
            region: None,
            safesearch: SafeSearch::default(),
            timelimit: None,
        }
    }

    /// Check the preconditions the provider relies on
    pub fn validate(&self) -> MallardResult<()> {
        if self.query.trim().is_empty() {
            return Err(MallardError::InvalidArguments(
                "Search query is required".to_string(),
            ));
        }

        if !(MIN_RESULTS..=MAX_RESULTS).contains(&self.max_results) {
            return Err(MallardError::InvalidArguments(format!(
                "max_results must be between {} and {}, got {}",
                MIN_RESULTS, MAX_RESULTS, self.max_results
            )));
        }

        Ok(())
    }
}

/// A single normalized search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The title of the search result
    pub title: String,

    /// The URL of the search result
    pub url: String,

    /// The body/snippet of the search result
    pub body: String,
}

/// Response containing search results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The search query that was executed
    pub query: String,

    /// List of search results
    pub results: Vec<SearchResult>,

    /// Total number of results returned
    pub total_results: usize,
}

impl SearchResponse {
    /// Create a new search response; the total is always the result count
    pub fn new(query: String, results: Vec<SearchResult>) -> Self {
        let total_results = results.len();
        Self {
            query,
            results,
            total_results,
        }
    }
}

/// JSON Schema for the search tool arguments (used for MCP tool definition)
pub fn search_request_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "The search query string"
            },
            "max_results": {
                "type": "integer",
                "description": "Maximum number of results to return (1-50)",
                "default": DEFAULT_MAX_RESULTS,
                "minimum": MIN_RESULTS,
                "maximum": MAX_RESULTS
            },
            "categories": {
                "type": "string",
                "enum": ["text", "images", "videos", "news"],
                "description": "Result type to search: text (default), images, videos, or news",
                "default": "text"
            },
            "region": {
                "type": ["string", "null"],
                "description": "Region code (e.g., 'us-en', 'uk-en', 'de-de')",
                "default": null
            },
            "safesearch": {
                "type": "string",
                "enum": ["on", "moderate", "off"],
                "description": "Safe search level",
                "default": "off"
            },
            "timelimit": {
                "type": ["string", "null"],
                "enum": ["day", "week", "month", "year", null],
                "description": "Time limit for results",
                "default": null
            }
        },
        "required": ["query"]
    })
}

/// JSON Schema for the search tool output
pub fn search_response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "query": { "type": "string" },
            "results": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "url": { "type": "string" },
                        "body": { "type": "string" }
                    },
                    "required": ["title", "url", "body"]
                }
            },
            "total_results": { "type": "integer" }
        },
        "required": ["query", "results", "total_results"]
    })
}
