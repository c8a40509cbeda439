//! The `search` tool.
//!
//! Validates a [`SearchRequest`], maps its parameters, dispatches to the
//! provider operation for the requested category and normalizes whatever
//! comes back.

use crate::normalize::normalize_all;
use crate::params::provider_query;
use crate::provider::{DuckDuckGoClient, ProviderQuery, SearchProvider};
use crate::types::{MallardResult, RawResult, SearchRequest, SearchResponse};
use tracing::{info, instrument};

/// Run a search request against `provider`.
///
/// `default_region` is only used when the request carries no region of its
/// own; pass `None` to let the provider pick.
///
/// # Example
///
/// ```rust,no_run
/// use mallard::provider::DuckDuckGoClient;
/// use mallard::tools::search::search_tool;
/// use mallard::types::SearchRequest;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let client = DuckDuckGoClient::new()?;
///     let response = search_tool(&client, &SearchRequest::new("rust"), None).await?;
///     println!("Found {} results", response.total_results);
///     Ok(())
/// }
/// ```
#[instrument(skip(provider, request), fields(query = %request.query, category = %request.categories))]
pub async fn search_tool(
    provider: &dyn SearchProvider,
    request: &SearchRequest,
    default_region: Option<&str>,
) -> MallardResult<SearchResponse> {
    request.validate()?;

    let query = provider_query(request, default_region);
    let raw = provider.search(request.categories, &query).await?;
    let results = normalize_all(&raw, request.categories);

    info!(
        query = %request.query,
        result_count = results.len(),
        "Search tool completed"
    );

    Ok(SearchResponse::new(request.query.clone(), results))
}

/// Run a search request against DuckDuckGo with default settings
pub async fn perform_search(request: &SearchRequest) -> MallardResult<SearchResponse> {
    let client = DuckDuckGoClient::new()?;
    search_tool(&client, request, None).await
}

/// Text search returning DuckDuckGo's raw records.
///
/// Each record has `title`, `href` and `body` keys.
///
/// # Example
///
/// ```rust,no_run
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let results = mallard::tools::search::search("python", 1).await?;
///     if let Some(first) = results.first() {
///         println!("{}", first["title"]);
///     }
///     Ok(())
/// }
/// ```
pub async fn search(query: &str, max_results: usize) -> MallardResult<Vec<RawResult>> {
    search_with_options(&ProviderQuery::new(query, max_results)).await
}

/// Text search with region, safe search and time limit options
pub async fn search_with_options(query: &ProviderQuery) -> MallardResult<Vec<RawResult>> {
    let client = DuckDuckGoClient::new()?;
    client.text(query).await
}
