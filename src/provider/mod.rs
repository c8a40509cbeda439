//! Search provider abstraction.
//!
//! Mallard does no retrieval of its own. A [`SearchProvider`] exposes the
//! four DuckDuckGo verticals and hands back raw records which the
//! [`normalize`](crate::normalize) module turns into uniform results.

pub mod duckduckgo;

pub use duckduckgo::{DuckDuckGoClient, ProviderConfig};

use crate::types::{Category, MallardResult, RawResult, SafeSearch, TimeLimit};
use async_trait::async_trait;

/// Parameters shared by every provider operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderQuery {
    /// Search query
    pub query: String,
    /// Upper bound on returned records
    pub max_results: usize,
    /// Region code; `None` lets the provider choose
    pub region: Option<String>,
    /// Safe search level
    pub safesearch: SafeSearch,
    /// Time window, `None` for no restriction
    pub timelimit: Option<TimeLimit>,
}

impl ProviderQuery {
    /// Query with default options
    pub fn new(query: impl Into<String>, max_results: usize) -> Self {
        Self {
            query: query.into(),
            max_results,
            region: None,
            safesearch: SafeSearch::default(),
            timelimit: None,
        }
    }
}

/// A web search backend with one operation per category
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Web results, records shaped `{title, href, body}`
    async fn text(&self, query: &ProviderQuery) -> MallardResult<Vec<RawResult>>;

    /// Image results, records carry `image`, `url`, `thumbnail`, ...
    async fn images(&self, query: &ProviderQuery) -> MallardResult<Vec<RawResult>>;

    /// Video results, records carry `content`, `description`, ...
    async fn videos(&self, query: &ProviderQuery) -> MallardResult<Vec<RawResult>>;

    /// News results, records carry `url`, `body`, `date`, ...
    async fn news(&self, query: &ProviderQuery) -> MallardResult<Vec<RawResult>>;

    /// Dispatch to the operation matching `category`
    async fn search(
        &self,
        category: Category,
        query: &ProviderQuery,
    ) -> MallardResult<Vec<RawResult>> {
        match category {
            Category::Text => self.text(query).await,
            Category::Images => self.images(query).await,
            Category::Videos => self.videos(query).await,
            Category::News => self.news(query).await,
        }
    }
}
