//! Sora MCP Video Server
//!
//! MCP server for video generation using the OpenAI Sora API.

use anyhow::Result;
use clap::Parser;
use sora_mcp_common::tracing::init_tracing;
use sora_mcp_common::{Config, McpServerBuilder, TransportArgs};
use sora_mcp_video::SoraServer;

/// Command-line arguments for the video server.
#[derive(Parser, Debug)]
#[command(name = "sora-mcp-video")]
#[command(about = "MCP server for video generation using the OpenAI Sora API")]
struct Args {
    /// Transport configuration
    #[command(flatten)]
    transport: TransportArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    tracing::info!("sora-mcp-video server starting...");

    // Parse command-line arguments
    let args = Args::parse();

    // Load configuration; a missing API key stops the process here
    let config = Config::from_env()?;
    tracing::info!(
        output_dir = %config.output_dir.display(),
        port = config.port,
        "Configuration loaded"
    );

    // --port overrides PORT from the configuration
    let transport = args.transport.into_transport(config.port);
    let server = SoraServer::new(config);

    // Build and run the MCP server
    tracing::info!(transport = %transport, "Starting MCP server");

    McpServerBuilder::new(server)
        .with_transport(transport)
        .run()
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
