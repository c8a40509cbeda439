//! Running Mallard as an MCP server
//!
//! Run with: cargo run --example mcp_server
//! Set USE_SSE=1 to serve over HTTP instead of stdio.

use mallard::server::{MallardServer, ServerConfig, TransportType};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout belongs to the JSON-RPC stream
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = ServerConfig {
        default_region: std::env::var("MALLARD_DEFAULT_REGION").ok(),
        verbose: true,
        ..Default::default()
    };

    let server = MallardServer::new(config)?;

    let transport = if std::env::var("USE_SSE").is_ok() {
        eprintln!("Starting SSE server on http://127.0.0.1:3000");
        TransportType::Sse {
            port: 3000,
            host: [127, 0, 0, 1],
        }
    } else {
        eprintln!("Starting STDIO server (for MCP clients)");
        TransportType::Stdio
    };

    server.run(transport).await?;

    Ok(())
}
