//! DuckDuckGo search provider.
//!
//! Web results come from DuckDuckGo's HTML interface. Images, videos and
//! news come from the JSON endpoints behind duckduckgo.com, which need a
//! per-query `vqd` token scraped from the landing page first.

use super::{ProviderQuery, SearchProvider};
use crate::regions::NO_REGION;
use crate::types::{MallardError, MallardResult, RawResult, TimeLimit};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::{Client, Response};
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Default user agent for requests
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// DuckDuckGo HTML search URL
pub const DDG_HTML_URL: &str = "https://html.duckduckgo.com/html/";

/// Base URL of the token page and the JSON endpoints
pub const DDG_BASE_URL: &str = "https://duckduckgo.com";

/// Most HTML result pages followed for one text search
pub const MAX_TEXT_PAGES: usize = 5;

/// Request timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

lazy_static! {
    /// Selector for search results
    static ref RESULT_SELECTOR: Selector = Selector::parse("div.result").unwrap();

    /// Selector for result title
    static ref TITLE_SELECTOR: Selector = Selector::parse("a.result__a").unwrap();

    /// Selector for result snippet
    static ref SNIPPET_SELECTOR: Selector = Selector::parse(".result__snippet").unwrap();

    /// Selector for the pagination forms at the bottom of the page
    static ref NAV_FORM_SELECTOR: Selector = Selector::parse("div.nav-link form").unwrap();

    /// Selector for the fields of a pagination form
    static ref INPUT_SELECTOR: Selector = Selector::parse("input").unwrap();

    /// Regex for cleaning HTML entities
    static ref HTML_ENTITY_REGEX: Regex = Regex::new(r"&#x([0-9a-fA-F]+);").unwrap();

    /// Regex for the vqd token embedded in the landing page
    static ref VQD_REGEX: Regex = Regex::new(r#"vqd=["']?([0-9-]+)["']?"#).unwrap();
}

/// Endpoints and HTTP settings for [`DuckDuckGoClient`]
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// HTML endpoint used for text search
    pub html_url: String,

    /// Base URL for the vqd token page and the `i.js`/`v.js`/`news.js` endpoints
    pub base_url: String,

    /// User agent sent with every request
    pub user_agent: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            html_url: DDG_HTML_URL.to_string(),
            base_url: DDG_BASE_URL.to_string(),
            user_agent: USER_AGENT.to_string(),
            timeout: REQUEST_TIMEOUT,
        }
    }
}

/// Body of the JSON vertical endpoints
#[derive(Debug, Deserialize)]
struct VerticalResponse {
    #[serde(default)]
    results: Vec<RawResult>,
}

/// The JSON verticals served under [`ProviderConfig::base_url`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vertical {
    Images,
    Videos,
    News,
}

impl Vertical {
    fn path(&self) -> &'static str {
        match self {
            Vertical::Images => "i.js",
            Vertical::Videos => "v.js",
            Vertical::News => "news.js",
        }
    }
}

/// HTTP client for DuckDuckGo
#[derive(Clone)]
pub struct DuckDuckGoClient {
    client: Client,
    html_url: Url,
    base_url: Url,
}

impl DuckDuckGoClient {
    /// Create a client against the public DuckDuckGo endpoints
    pub fn new() -> MallardResult<Self> {
        Self::with_config(ProviderConfig::default())
    }

    /// Create a client from an explicit configuration
    pub fn with_config(config: ProviderConfig) -> MallardResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(MallardError::HttpError)?;

        Ok(Self {
            client,
            html_url: Url::parse(&config.html_url)?,
            base_url: Url::parse(&config.base_url)?,
        })
    }

    /// Build form parameters for the HTML endpoint
    fn build_text_params(&self, query: &ProviderQuery) -> Vec<(String, String)> {
        let mut params = vec![
            ("q".to_string(), query.query.clone()),
            ("kp".to_string(), query.safesearch.to_ddg_value().to_string()),
        ];

        if let Some(ref region) = query.region {
            params.push(("kl".to_string(), region.clone()));
        }

        if let Some(timelimit) = query.timelimit {
            params.push(("df".to_string(), timelimit.code().to_string()));
        }

        params
    }

    /// Form fields of the page's "Next" button, with our own filters kept.
    ///
    /// `None` on the last page.
    fn next_page_params(
        &self,
        html: &str,
        base: &[(String, String)],
    ) -> Option<Vec<(String, String)>> {
        let document = Html::parse_document(html);

        let form = document.select(&NAV_FORM_SELECTOR).find(|form| {
            form.select(&INPUT_SELECTOR).any(|input| {
                input.value().attr("type") == Some("submit")
                    && input.value().attr("value").is_some_and(|v| v.contains("Next"))
            })
        })?;

        let mut params: Vec<(String, String)> = form
            .select(&INPUT_SELECTOR)
            .filter(|input| input.value().attr("type") != Some("submit"))
            .filter_map(|input| {
                let name = input.value().attr("name")?;
                let value = input.value().attr("value").unwrap_or_default();
                Some((name.to_string(), value.to_string()))
            })
            .collect();

        for (key, value) in base {
            if !params.iter().any(|(k, _)| k == key) {
                params.push((key.clone(), value.clone()));
            }
        }

        Some(params)
    }

    /// Build query parameters for one of the JSON verticals
    fn build_vertical_params(
        &self,
        vertical: Vertical,
        query: &ProviderQuery,
        vqd: &str,
    ) -> Vec<(&'static str, String)> {
        let region = query.region.clone().unwrap_or_else(|| NO_REGION.to_string());

        let mut params = vec![
            ("l", region),
            ("o", "json".to_string()),
            ("q", query.query.clone()),
            ("vqd", vqd.to_string()),
        ];

        match vertical {
            Vertical::Images => {
                let time = query.timelimit.map(image_time_filter).unwrap_or_default();
                params.push(("f", format!("{},,,,,", time)));
                params.push(("p", query.safesearch.to_ddg_media_value().to_string()));
            },
            Vertical::Videos => {
                let time = match query.timelimit {
                    Some(TimeLimit::Year) => {
                        debug!("Video search has no yearly filter, ignoring time limit");
                        String::new()
                    },
                    Some(t) => format!("publishedAfter:{}", t.code()),
                    None => String::new(),
                };
                params.push(("f", format!("{},,,", time)));
                params.push(("p", query.safesearch.to_ddg_media_value().to_string()));
            },
            Vertical::News => {
                params.push(("noamp", "1".to_string()));
                params.push(("p", query.safesearch.to_ddg_value().to_string()));
                if let Some(timelimit) = query.timelimit {
                    params.push(("df", timelimit.code().to_string()));
                }
            },
        }

        params
    }

    fn endpoint(&self, path: &str) -> MallardResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Fetch the vqd token DuckDuckGo requires for the JSON verticals
    #[instrument(skip(self))]
    async fn fetch_vqd(&self, query: &str) -> MallardResult<String> {
        let response = self
            .client
            .get(self.base_url.clone())
            .query(&[("q", query)])
            .send()
            .await?;

        let html = check_status(response).await?.text().await?;

        extract_vqd(&html).ok_or_else(|| {
            warn!(query = %query, "No vqd token in DuckDuckGo response");
            MallardError::SearchError(format!("Could not obtain a search token for '{}'", query))
        })
    }

    /// Search one of the JSON verticals
    async fn search_vertical(
        &self,
        vertical: Vertical,
        query: &ProviderQuery,
    ) -> MallardResult<Vec<RawResult>> {
        let vqd = self.fetch_vqd(&query.query).await?;
        let params = self.build_vertical_params(vertical, query, &vqd);

        let response = self
            .client
            .get(self.endpoint(vertical.path())?)
            .header("Referer", self.base_url.as_str())
            .query(&params)
            .send()
            .await?;

        let body: VerticalResponse = check_status(response).await?.json().await?;

        let mut results = body.results;
        results.truncate(query.max_results);
        if vertical == Vertical::News {
            results.iter_mut().for_each(excerpt_to_body);
        }

        info!(
            query = %query.query,
            vertical = vertical.path(),
            result_count = results.len(),
            "Search completed"
        );

        Ok(results)
    }

    /// Parse records from the HTML results page
    fn parse_text_results(&self, html: &str, max_results: usize) -> MallardResult<Vec<RawResult>> {
        if html.contains("anomaly-modal") {
            return Err(MallardError::BotProtectionDetected);
        }

        let document = Html::parse_document(html);
        let mut results = Vec::new();

        for element in document.select(&RESULT_SELECTOR) {
            if results.len() >= max_results {
                break;
            }

            let title_element = match element.select(&TITLE_SELECTOR).next() {
                Some(el) => el,
                None => continue,
            };

            let title = clean_text(&title_element.text().collect::<String>());
            let href = match title_element.value().attr("href") {
                Some(href) => extract_actual_url(href),
                None => continue,
            };

            // Ads and internal links
            if href.is_empty() || !href.starts_with("http") || href.contains("duckduckgo.com/y.js")
            {
                continue;
            }

            let body = element
                .select(&SNIPPET_SELECTOR)
                .next()
                .map(|el| clean_text(&el.text().collect::<String>()))
                .unwrap_or_default();

            let mut record = RawResult::new();
            record.insert("title".to_string(), Value::String(title));
            record.insert("href".to_string(), Value::String(href));
            record.insert("body".to_string(), Value::String(body));
            results.push(record);
        }

        if results.is_empty() {
            warn!("No search results found in response");
        }

        Ok(results)
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoClient {
    #[instrument(skip(self, query), fields(query = %query.query))]
    async fn text(&self, query: &ProviderQuery) -> MallardResult<Vec<RawResult>> {
        info!(query = %query.query, region = ?query.region, "Performing text search");

        let base = self.build_text_params(query);
        let mut params = base.clone();
        let mut results: Vec<RawResult> = Vec::new();
        let mut seen = HashSet::new();

        for page in 1..=MAX_TEXT_PAGES {
            let response = self
                .client
                .post(self.html_url.clone())
                .form(&params)
                .send()
                .await?;

            let html = check_status(response).await?.text().await.map_err(|e| {
                error!(error = %e, "Failed to read response body");
                MallardError::HttpError(e)
            })?;

            // Drop records already seen on an earlier page
            for record in self.parse_text_results(&html, query.max_results)? {
                if results.len() >= query.max_results {
                    break;
                }
                let href = record.get("href").and_then(Value::as_str).unwrap_or_default();
                if seen.insert(href.to_string()) {
                    results.push(record);
                }
            }

            if results.len() >= query.max_results {
                break;
            }

            match self.next_page_params(&html, &base) {
                Some(next) => {
                    debug!(page = page + 1, "Following next results page");
                    params = next;
                },
                None => break,
            }
        }

        info!(
            query = %query.query,
            result_count = results.len(),
            "Search completed"
        );

        Ok(results)
    }

    #[instrument(skip(self, query), fields(query = %query.query))]
    async fn images(&self, query: &ProviderQuery) -> MallardResult<Vec<RawResult>> {
        self.search_vertical(Vertical::Images, query).await
    }

    #[instrument(skip(self, query), fields(query = %query.query))]
    async fn videos(&self, query: &ProviderQuery) -> MallardResult<Vec<RawResult>> {
        self.search_vertical(Vertical::Videos, query).await
    }

    #[instrument(skip(self, query), fields(query = %query.query))]
    async fn news(&self, query: &ProviderQuery) -> MallardResult<Vec<RawResult>> {
        self.search_vertical(Vertical::News, query).await
    }
}

/// Map HTTP failures onto the crate's error variants
async fn check_status(response: Response) -> MallardResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    warn!(status = %status, "Search returned non-success status");

    if status.as_u16() == 429 {
        return Err(MallardError::RateLimitExceeded);
    }

    if status.as_u16() == 403 {
        let body = response.text().await.unwrap_or_default();
        if body.contains("anomaly") {
            return Err(MallardError::BotProtectionDetected);
        }
    }

    Err(MallardError::SearchError(format!("HTTP {}", status)))
}

fn image_time_filter(timelimit: TimeLimit) -> String {
    let period = match timelimit {
        TimeLimit::Day => "Day",
        TimeLimit::Week => "Week",
        TimeLimit::Month => "Month",
        TimeLimit::Year => "Year",
    };
    format!("time:{}", period)
}

/// news.js calls the snippet `excerpt`
fn excerpt_to_body(record: &mut RawResult) {
    if !record.contains_key("body")
        && let Some(excerpt) = record.get("excerpt").cloned()
    {
        record.insert("body".to_string(), excerpt);
    }
}

/// Pull the vqd token out of the landing page
fn extract_vqd(html: &str) -> Option<String> {
    VQD_REGEX
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract the actual URL from DuckDuckGo's redirect URL
fn extract_actual_url(href: &str) -> String {
    // Example: //duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=...
    if href.contains("uddg=")
        && let Some(encoded_url) = href.split("uddg=").nth(1)
        && let Some(decoded) = encoded_url.split('&').next()
    {
        return urlencoding::decode(decoded)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| href.to_string());
    }

    if href.starts_with("//") {
        return format!("https:{}", href);
    }

    href.to_string()
}

/// Clean text by removing HTML entities and extra whitespace
fn clean_text(text: &str) -> String {
    let cleaned = text
        .replace("&#x27;", "'")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ");

    let cleaned = HTML_ENTITY_REGEX.replace_all(&cleaned, |caps: &regex::Captures| {
        u32::from_str_radix(&caps[1], 16)
            .ok()
            .and_then(char::from_u32)
            .map(|c| c.to_string())
            .unwrap_or_else(|| caps[0].to_string())
    });

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
