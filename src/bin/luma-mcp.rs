//! Standalone MCP server binary for Luma Dream Machine.
//!
//! Communicates with AI clients (e.g. Claude Desktop) over stdio JSON-RPC.

use anyhow::{Context, Result};
use clap::Parser;
use rmcp::{transport::stdio, ServiceExt};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use luma_mcp::config::{API_KEY_ENV, BASE_URL_ENV, DEFAULT_BASE_URL};
use luma_mcp::{LumaClient, LumaMcp, Settings};

#[derive(Debug, Parser)]
#[command(name = "luma-mcp", version, about = "Luma Dream Machine tools over MCP (stdio)")]
struct Cli {
    /// Luma API key; can also be set in the environment or a .env file.
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// Dream Machine API base URL.
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env values feed clap's env fallbacks, so load them first
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // Log to stderr so stdout stays clean for MCP JSON-RPC
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("luma_mcp={log_level}")),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    // explicit flags win over the environment
    let settings = Settings::from_env()
        .with_api_key(cli.api_key)
        .with_base_url(Some(cli.base_url));

    if settings.api_key.is_none() {
        warn!("no API key configured; every tool call will report a missing credential");
    }
    info!(base_url = %settings.base_url, "loaded settings");

    let server = LumaMcp::new(LumaClient::new(settings));

    info!("Luma MCP server starting on stdio");

    let service = server
        .serve(stdio())
        .await
        .context("MCP server failed to start")?;

    service.waiting().await?;

    Ok(())
}
