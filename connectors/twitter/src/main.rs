//! Twitter MCP server - main entrypoint
//!
//! Serves read-only Twitter tools over newline-delimited JSON-RPC on
//! stdin/stdout. Logs go to stderr.

#![forbid(unsafe_code)]

use std::io::{BufRead, Write};

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use twitter_mcp::{TwitterConfig, TwitterMcpServer, handle_message};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = TwitterConfig::from_env()?;
    tracing::info!(
        env_file = %config.env_file.display(),
        api_url = %config.api_url,
        "Twitter MCP server starting"
    );

    run_stdio_loop(&TwitterMcpServer::new(config))?;

    tracing::info!("Twitter MCP server stopped");
    Ok(())
}

/// Read requests from stdin until EOF, writing one response line per request.
fn run_stdio_loop(server: &TwitterMcpServer) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let Some(response) = runtime.block_on(handle_message(server, &line)) else {
            continue;
        };

        let response_json = serde_json::to_string(&response)?;
        writeln!(stdout, "{response_json}")?;
        stdout.flush()?;
    }

    Ok(())
}
