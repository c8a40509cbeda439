//! Basic library usage for Mallard
//!
//! Run with: cargo run --example basic_usage

use mallard::format::render_results;
use mallard::provider::{DuckDuckGoClient, ProviderQuery, SearchProvider};
use mallard::tools::{prompts, search};
use mallard::{Category, SafeSearch, SearchRequest, normalize};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    println!("Mallard Basic Usage Example\n");

    // Example 1: Text search through the search tool
    println!("=== Example 1: Text Search ===\n");

    let mut request = SearchRequest::new("Rust programming language");
    request.max_results = 5;
    request.safesearch = SafeSearch::Moderate;

    match search::perform_search(&request).await {
        Ok(response) => {
            println!(
                "Found {} results for '{}'\n",
                response.total_results, response.query
            );
            print!("{}", render_results(&response.results));
        },
        Err(e) => eprintln!("Search failed: {}", e),
    }

    // Example 2: News from the past week in one region
    println!("\n=== Example 2: Regional News ===\n");

    let mut request = SearchRequest::new("rust release");
    request.categories = Category::News;
    request.region = Some("uk-en".to_string());
    request.timelimit = Some("week".to_string());
    request.max_results = 3;

    match search::perform_search(&request).await {
        Ok(response) => {
            for result in &response.results {
                println!("- {} ({})", result.title, result.url);
            }
        },
        Err(e) => eprintln!("News search failed: {}", e),
    }

    // Example 3: Talking to the provider directly
    println!("\n=== Example 3: Raw Image Records ===\n");

    let client = DuckDuckGoClient::new()?;
    match client.images(&ProviderQuery::new("ferris crab", 3)).await {
        Ok(records) => {
            for record in &records {
                let keys: Vec<_> = record.keys().map(String::as_str).collect();
                println!("raw keys: {}", keys.join(", "));
                let result = normalize(record, Category::Images);
                println!("  -> {} | {}", result.title, result.url);
            }
        },
        Err(e) => eprintln!("Image search failed: {}", e),
    }

    // Example 4: Prompt templates
    println!("\n=== Example 4: Research Plan Prompt ===\n");
    println!("{}", prompts::research_planner("memory safety", "intermediate"));

    Ok(())
}
