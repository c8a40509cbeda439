//! # Mallard - DuckDuckGo Search for the Command Line and MCP
//!
//! Mallard puts DuckDuckGo's web, image, video and news search behind three
//! front ends: a library API, a CLI, and a Model Context Protocol (MCP)
//! server. Retrieval is delegated to a [`SearchProvider`]; Mallard translates
//! arguments, normalizes the provider's differently shaped records into one
//! [`SearchResult`] shape and formats them.
//!
//! ## Features
//!
//! - **Four categories**: text, images, videos and news
//! - **Uniform results**: every result has a title, URL and body, with
//!   placeholders where DuckDuckGo supplies nothing
//! - **MCP surface**: a `search` tool, a `duckduckgo://regions` resource and
//!   two prompt templates
//! - **Dual Transport**: STDIO and HTTP (SSE)
//!
//! ## Quick Start
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use mallard::{SearchRequest, tools::search};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut request = SearchRequest::new("Rust programming");
//!     request.max_results = 5;
//!     request.timelimit = Some("week".to_string());
//!
//!     let response = search::perform_search(&request).await?;
//!     for result in &response.results {
//!         println!("{} - {}", result.title, result.url);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### As an MCP Server
//!
//! ```rust,no_run
//! use mallard::{MallardServer, ServerConfig, TransportType};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = MallardServer::new(ServerConfig::default())?;
//!     server.run(TransportType::Stdio).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`provider`]: the provider trait and the DuckDuckGo client
//! - [`normalize`]: per-category field aliasing into [`SearchResult`]
//! - [`params`]: time limit, region and query mapping
//! - [`tools`]: the search tool and prompt templates
//! - [`regions`]: the static region table
//! - [`format`]: text rendering for the CLI
//! - [`server`]: MCP server implementation with transport handling
//! - [`types`]: common types and errors

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod format;
pub mod normalize;
pub mod params;
pub mod provider;
pub mod regions;
pub mod server;
pub mod tools;
pub mod types;

// Re-export commonly used items at crate root
pub use normalize::normalize;
pub use params::map_time_limit;
pub use provider::{DuckDuckGoClient, ProviderConfig, ProviderQuery, SearchProvider};
pub use server::{MallardHandler, MallardServer, ServerConfig, TransportType};
pub use types::{
    Category, MallardError, MallardResult, RawResult, SafeSearch, SearchRequest, SearchResponse,
    SearchResult, TimeLimit,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server name for MCP protocol
pub const SERVER_NAME: &str = "DuckDuckGo Search";

/// Instructions sent to MCP clients on initialization
pub const SERVER_INSTRUCTIONS: &str = "A search server that provides access to DuckDuckGo search results. \
     Use the search tools to find information on the web.";
