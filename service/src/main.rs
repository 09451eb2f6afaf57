#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::print_stdout,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use congress_mcp::{
    config::Config,
    congress::{HttpCongressClient, LegislativeService, RetryPolicy},
    mcp::{http::serve_http, stdio::serve_stdio, ToolServer},
};
use tracing_subscriber::EnvFilter;

/// Congress.gov legislative data exposed as JSON-RPC tools.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// YAML configuration file. Defaults to ./config.yaml when present.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Serve newline-delimited JSON-RPC on stdin/stdout instead of HTTP.
    #[arg(long)]
    stdio: bool,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Load and validate configuration first (fail-fast)
    let config = match &cli.config {
        Some(path) => Config::load_from(&path.to_string_lossy()),
        None => Config::load(),
    }
    .map_err(|e| anyhow::anyhow!("{e}"))?;

    // Logs go to stderr; stdout belongs to the stdio transport.
    let filter = EnvFilter::try_new(&config.logging.level)
        .map_err(|e| anyhow::anyhow!("invalid logging.level: {e}"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.upstream.base_url,
        transport = if cli.stdio { "stdio" } else { "http" },
        "congress-mcp starting up"
    );

    let client = HttpCongressClient::from_config(&config.upstream, RetryPolicy::from(&config.request))?;
    let service = LegislativeService::new(Arc::new(client), config.request.clone());
    let server = ToolServer::new(service, &config.tools);
    tracing::info!(tools = server.tool_names().count(), "tools registered");

    if cli.stdio {
        serve_stdio(server).await?;
    } else {
        serve_http(server, &config.server.host, config.server.port).await?;
    }
    Ok(())
}
