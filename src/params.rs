//! Translation of tool-facing parameters into provider parameters.

use crate::provider::ProviderQuery;
use crate::regions;
use crate::types::{SearchRequest, TimeLimit};
use tracing::{debug, warn};

/// Map a human-facing time limit token to DuckDuckGo's single-letter code.
///
/// The token is trimmed and lower-cased first. Absent or unrecognized tokens
/// mean "no time restriction" and yield `None`.
pub fn map_time_limit(token: Option<&str>) -> Option<&'static str> {
    parse_time_limit(token).map(|t| t.code())
}

/// Like [`map_time_limit`] but keeps the typed value
pub fn parse_time_limit(token: Option<&str>) -> Option<TimeLimit> {
    let token = token?;
    let parsed = TimeLimit::from_token(token);
    if parsed.is_none() {
        debug!(timelimit = %token, "Ignoring unrecognized time limit");
    }
    parsed
}

/// Pick the region to send: the request's own, else the configured default.
///
/// With neither set the region stays `None` and the provider chooses.
pub fn resolve_region(requested: Option<&str>, default_region: Option<&str>) -> Option<String> {
    let region = requested
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .or(default_region)?;

    if !regions::is_known_region(region) {
        warn!(region = %region, "Region is not in the known region table, passing it through");
    }

    Some(region.to_string())
}

/// Build the provider query for a validated request
pub fn provider_query(request: &SearchRequest, default_region: Option<&str>) -> ProviderQuery {
    ProviderQuery {
        query: request.query.clone(),
        max_results: request.max_results,
        region: resolve_region(request.region.as_deref(), default_region),
        safesearch: request.safesearch,
        timelimit: parse_time_limit(request.timelimit.as_deref()),
    }
}
