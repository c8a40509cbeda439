//! Mallard CLI - DuckDuckGo search from the terminal and over MCP
//!
//! A command-line interface for searching DuckDuckGo and for running the
//! Mallard MCP server.

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use mallard::{
    MallardError, MallardResult, SERVER_NAME, VERSION,
    format::{self, NO_RESULTS},
    provider::{DuckDuckGoClient, ProviderConfig},
    regions::{REGION_CODES, REGIONS_URI, regions_resource},
    server::{MallardServer, SEARCH_TOOL, ServerConfig, TransportType},
    tools::{prompts, search},
    types::{Category, SafeSearch, SearchRequest, SearchResult},
};
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt};

/// Mallard - DuckDuckGo search CLI and MCP server
#[derive(Parser, Debug)]
#[command(
    name = "mallard",
    version = VERSION,
    about = "DuckDuckGo search from the command line and as an MCP server",
    long_about = "Mallard searches DuckDuckGo for web pages, images, videos and news.\n\n\
                  It can be used as:\n\
                  - A CLI tool for direct searches\n\
                  - An MCP server (STDIO or SSE transport)"
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable all logging output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Override the DuckDuckGo HTML endpoint
    #[arg(long, global = true, env = "MALLARD_HTML_URL", hide = true)]
    html_url: Option<String>,

    /// Override the DuckDuckGo base URL used for images, videos and news
    #[arg(long, global = true, env = "MALLARD_API_URL", hide = true)]
    api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "MALLARD_TIMEOUT", default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Search DuckDuckGo
    Search {
        /// Search query
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Max results
        #[arg(short, long, default_value = "10", value_parser = clap::value_parser!(u16).range(1..=50))]
        max_results: u16,

        /// Region code (e.g., us-en)
        #[arg(short, long)]
        region: Option<String>,

        /// Safe search level
        #[arg(short, long, default_value = "off")]
        safesearch: SafeSearchOption,

        /// Time limit
        #[arg(short = 't', long)]
        timelimit: Option<TimeLimitOption>,

        /// Result type to search
        #[arg(short, long, default_value = "text")]
        category: CategoryOption,

        /// Output results as JSON array
        #[arg(long)]
        json: bool,
    },

    /// Start the MCP server
    Serve {
        /// Transport type to use
        #[arg(short, long, default_value = "stdio")]
        transport: TransportOption,

        /// Port for SSE transport (only used with --transport sse)
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to for SSE transport
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Region used when a search names none (default: let DuckDuckGo choose)
        #[arg(long, env = "MALLARD_DEFAULT_REGION")]
        default_region: Option<String>,
    },

    /// List region codes
    Regions {
        /// Output the regions resource as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show server information
    Info,
}

/// Transport options for the serve command
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum TransportOption {
    /// Standard input/output (for MCP clients)
    #[default]
    Stdio,
    /// Server-Sent Events over HTTP
    Sse,
}

/// Safe search options
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum SafeSearchOption {
    /// Strict filtering
    On,
    /// Moderate filtering
    Moderate,
    /// No filtering
    #[default]
    Off,
}

impl From<SafeSearchOption> for SafeSearch {
    fn from(opt: SafeSearchOption) -> Self {
        match opt {
            SafeSearchOption::On => SafeSearch::On,
            SafeSearchOption::Moderate => SafeSearch::Moderate,
            SafeSearchOption::Off => SafeSearch::Off,
        }
    }
}

/// Time limit options
#[derive(Debug, Clone, Copy, ValueEnum)]
enum TimeLimitOption {
    /// Past day
    #[value(alias = "d")]
    Day,
    /// Past week
    #[value(alias = "w")]
    Week,
    /// Past month
    #[value(alias = "m")]
    Month,
    /// Past year
    #[value(alias = "y")]
    Year,
}

impl TimeLimitOption {
    fn token(&self) -> &'static str {
        match self {
            TimeLimitOption::Day => "day",
            TimeLimitOption::Week => "week",
            TimeLimitOption::Month => "month",
            TimeLimitOption::Year => "year",
        }
    }
}

/// Category options
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum CategoryOption {
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

impl From<CategoryOption> for Category {
    fn from(opt: CategoryOption) -> Self {
        match opt {
            CategoryOption::Text => Category::Text,
            CategoryOption::Images => Category::Images,
            CategoryOption::Videos => Category::Videos,
            CategoryOption::News => Category::News,
        }
    }
}

/// Set up logging on stderr.
///
/// stdout carries search output or the JSON-RPC stream, so logs never go there.
fn setup_logging(verbose: bool, quiet: bool, json: bool, default_level: &str) {
    let filter = if quiet {
        EnvFilter::new("off")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    if json {
        subscriber.json().init();
    } else {
        subscriber.with_ansi(false).init();
    }
}

fn provider_config(cli: &Cli) -> ProviderConfig {
    let defaults = ProviderConfig::default();
    ProviderConfig {
        html_url: cli.html_url.clone().unwrap_or(defaults.html_url),
        base_url: cli.api_url.clone().unwrap_or(defaults.base_url),
        timeout: Duration::from_secs(cli.timeout),
        ..defaults
    }
}

fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

fn print_info(label: &str, value: &str) {
    println!("  {} {}", format!("{}:", label).bright_blue(), value);
}

fn print_section(title: &str) {
    println!("\n{}", title.yellow().bold());
    println!("{}", "─".repeat(40).bright_black());
}

fn print_results(results: &[SearchResult], no_color: bool) {
    if no_color {
        print!("{}", format::render_results(results));
        return;
    }

    for (i, result) in results.iter().enumerate() {
        println!(
            "{} {}",
            format!("{}.", i + 1).bright_black(),
            result.title.white().bold()
        );
        println!(
            "   {} {}",
            "URL:".bright_black(),
            result.url.bright_blue().underline()
        );
        println!("   {}", format::body_preview(&result.body));
        println!();
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_search(
    config: ProviderConfig,
    query: String,
    max_results: u16,
    region: Option<String>,
    safesearch: SafeSearchOption,
    timelimit: Option<TimeLimitOption>,
    category: CategoryOption,
    json: bool,
    no_color: bool,
) -> MallardResult<()> {
    let request = SearchRequest {
        query,
        max_results: usize::from(max_results),
        categories: category.into(),
        region,
        safesearch: safesearch.into(),
        timelimit: timelimit.map(|t| t.token().to_string()),
    };

    let client = DuckDuckGoClient::with_config(config)?;
    let response = search::search_tool(&client, &request, None).await?;

    if response.results.is_empty() {
        println!("{}", NO_RESULTS);
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&response.results)?);
    } else {
        print_results(&response.results, no_color);
    }

    Ok(())
}

async fn run_serve(
    provider: ProviderConfig,
    transport: TransportOption,
    port: u16,
    host: String,
    default_region: Option<String>,
    verbose: bool,
) -> MallardResult<()> {
    let config = ServerConfig {
        provider,
        default_region,
        verbose,
    };

    let server = MallardServer::new(config)?;

    let transport_type = match transport {
        TransportOption::Stdio => TransportType::Stdio,
        TransportOption::Sse => sse_transport(port, &host)?,
    };

    server.run(transport_type).await
}

#[cfg(feature = "sse")]
fn sse_transport(port: u16, host: &str) -> MallardResult<TransportType> {
    let host_parts: Vec<u8> = host.split('.').filter_map(|s| s.parse().ok()).collect();

    let host: [u8; 4] = host_parts.try_into().map_err(|_| {
        MallardError::InvalidArguments("Invalid host format".to_string())
    })?;

    Ok(TransportType::Sse { port, host })
}

#[cfg(not(feature = "sse"))]
fn sse_transport(_port: u16, _host: &str) -> MallardResult<TransportType> {
    Err(MallardError::InvalidArguments(
        "This build of mallard has no SSE transport".to_string(),
    ))
}

fn run_regions(json: bool, no_color: bool) -> MallardResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&regions_resource())?);
        return Ok(());
    }

    for (code, name) in REGION_CODES {
        if no_color {
            println!("{:<8} {}", code, name);
        } else {
            println!("{:<8} {}", code.cyan(), name);
        }
    }

    Ok(())
}

fn run_info(no_color: bool) {
    let prompt_names: Vec<String> = prompts::prompt_definitions()
        .into_iter()
        .map(|p| p.name)
        .collect();

    if no_color {
        println!("\nMallard Server Information");
        println!("{}", "=".repeat(50));
        println!("  Name: {}", SERVER_NAME);
        println!("  Version: {}", VERSION);
        println!();
        println!("Tools:");
        println!("  - {}: Search the web using DuckDuckGo", SEARCH_TOOL);
        println!("Resources:");
        println!("  - {}: Supported region codes", REGIONS_URI);
        println!("Prompts:");
        for name in &prompt_names {
            println!("  - {}", name);
        }
        println!();
        println!("Supported Transports:");
        println!("  - stdio: Standard I/O for MCP clients");
        println!("  - sse: Server-Sent Events over HTTP");
    } else {
        print_section("Server Information");
        print_info("Name", SERVER_NAME);
        print_info("Version", VERSION);

        print_section("Tools");
        println!(
            "  {} {}",
            SEARCH_TOOL.green(),
            "- Search the web using DuckDuckGo".bright_black()
        );

        print_section("Resources");
        println!(
            "  {} {}",
            REGIONS_URI.green(),
            "- Supported region codes".bright_black()
        );

        print_section("Prompts");
        for name in &prompt_names {
            println!("  {}", name.green());
        }

        print_section("Supported Transports");
        println!(
            "  {} {}",
            "stdio".cyan(),
            "- Standard I/O for MCP clients".bright_black()
        );
        println!(
            "  {} {}",
            "sse".cyan(),
            "- Server-Sent Events over HTTP".bright_black()
        );
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let default_level = match cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    setup_logging(cli.verbose, cli.quiet, cli.log_json, default_level);

    let provider = provider_config(&cli);

    let result = match cli.command {
        Commands::Search {
            query,
            max_results,
            region,
            safesearch,
            timelimit,
            category,
            json,
        } => {
            let query = query.join(" ");
            if query.trim().is_empty() {
                Cli::command()
                    .error(ErrorKind::MissingRequiredArgument, "Search query is required")
                    .exit();
            }

            run_search(
                provider,
                query,
                max_results,
                region,
                safesearch,
                timelimit,
                category,
                json,
                cli.no_color,
            )
            .await
        },

        Commands::Serve {
            transport,
            port,
            host,
            default_region,
        } => run_serve(provider, transport, port, host, default_region, cli.verbose).await,

        Commands::Regions { json } => run_regions(json, cli.no_color),

        Commands::Info => {
            run_info(cli.no_color);
            Ok(())
        },
    };

    if let Err(e) = result {
        if cli.no_color {
            eprintln!("Error: {}", e);
        } else {
            print_error(&e.to_string());
        }
        std::process::exit(1);
    }
}
