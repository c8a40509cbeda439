//! Plain-text rendering of search results for the CLI.

use crate::types::SearchResult;
use std::borrow::Cow;

/// Maximum number of characters shown from a result body
pub const BODY_PREVIEW_LENGTH: usize = 200;

/// Message printed when a search comes back empty
pub const NO_RESULTS: &str = "No results found.";

/// First [`BODY_PREVIEW_LENGTH`] characters of `body`, with `...` appended
/// when anything was cut.
pub fn body_preview(body: &str) -> Cow<'_, str> {
    match body.char_indices().nth(BODY_PREVIEW_LENGTH) {
        Some((cut, _)) => Cow::Owned(format!("{}...", &body[..cut])),
        None => Cow::Borrowed(body),
    }
}

/// Render results as a numbered list: title, URL and body preview per entry
pub fn render_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!("{}\n", NO_RESULTS);
    }

    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, result.title));
        out.push_str(&format!("   URL: {}\n", result.url));
        out.push_str(&format!("   {}\n\n", body_preview(&result.body)));
    }
    out
}
