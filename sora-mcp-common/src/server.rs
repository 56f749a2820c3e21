//! Server bootstrap: run an MCP handler over the selected transport until the
//! peer goes away or a shutdown is requested.
//!
//! ```ignore
//! use sora_mcp_common::{McpServerBuilder, Transport};
//!
//! McpServerBuilder::new(handler)
//!     .with_transport(Transport::Http { port: 3000 })
//!     .run()
//!     .await?;
//! ```

use crate::transport::Transport;
use rmcp::{ServerHandler, ServiceExt};
use thiserror::Error;
use tokio::sync::oneshot;

/// Path the HTTP transport is mounted on.
pub const MCP_HTTP_PATH: &str = "/mcp";

/// Failures while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The HTTP listener could not be bound
    #[error("Failed to bind to port {port}: {message}")]
    BindFailed { port: u16, message: String },

    /// The MCP session or HTTP server failed
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Runs an MCP handler over stdio or streamable HTTP.
pub struct McpServerBuilder<H> {
    handler: H,
    transport: Transport,
    shutdown_rx: Option<oneshot::Receiver<()>>,
}

impl<H> McpServerBuilder<H>
where
    H: ServerHandler + Clone + Send + Sync + 'static,
{
    /// Start building a server for `handler`, on stdio unless told otherwise.
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            transport: Transport::default(),
            shutdown_rx: None,
        }
    }

    /// Select the transport.
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Stop on this channel instead of on process signals.
    ///
    /// Sending a message or dropping the sender both trigger shutdown.
    pub fn with_shutdown(mut self, shutdown_rx: oneshot::Receiver<()>) -> Self {
        self.shutdown_rx = Some(shutdown_rx);
        self
    }

    /// Serve until shutdown.
    ///
    /// Without an explicit channel, SIGINT and SIGTERM stop the server. The
    /// stdio transport also ends when the client closes stdin.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!(transport = %self.transport, "Starting MCP server");

        let shutdown = shutdown_future(self.shutdown_rx);
        match self.transport {
            Transport::Stdio => serve_stdio(self.handler, shutdown).await,
            Transport::Http { port } => serve_http(self.handler, port, shutdown).await,
        }
    }
}

async fn serve_stdio<H>(handler: H, shutdown: impl Future<Output = ()>) -> Result<(), ServerError>
where
    H: ServerHandler + Clone + Send + Sync + 'static,
{
    let running = handler
        .serve(rmcp::transport::io::stdio())
        .await
        .map_err(|e| ServerError::Transport(e.to_string()))?;

    tokio::select! {
        quit = running.waiting() => {
            quit.map_err(|e| ServerError::Transport(e.to_string()))?;
            tracing::info!("stdio session ended");
        }
        _ = shutdown => tracing::info!("Shutdown requested, closing stdio session"),
    }
    Ok(())
}

/// Serve streamable HTTP at [`MCP_HTTP_PATH`].
///
/// Stateless mode: every POST is answered by a fresh handler clone in its own
/// session, so request ids from different clients never collide.
async fn serve_http<H>(
    handler: H,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError>
where
    H: ServerHandler + Clone + Send + Sync + 'static,
{
    use rmcp::transport::streamable_http_server::{
        StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
    };

    let mcp_service = StreamableHttpService::new(
        move || Ok(handler.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig {
            stateful_mode: false,
            ..Default::default()
        },
    );
    let app = axum::Router::new().nest_service(MCP_HTTP_PATH, mcp_service);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| ServerError::BindFailed {
            port,
            message: e.to_string(),
        })?;
    let local_port = listener.local_addr().map(|addr| addr.port()).unwrap_or(port);
    tracing::info!(port = local_port, path = MCP_HTTP_PATH, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServerError::Transport(e.to_string()))?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_future(shutdown_rx: Option<oneshot::Receiver<()>>) {
    match shutdown_rx {
        Some(rx) => {
            let _ = rx.await;
        }
        None => wait_for_shutdown_signal().await,
    }
}

/// Resolve on SIGTERM or SIGINT; Ctrl+C elsewhere.
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
                    _ = sigint.recv() => tracing::info!("Received SIGINT"),
                }
                return;
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "Signal handlers unavailable, falling back to Ctrl+C");
            }
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C"),
        Err(e) => {
            tracing::warn!(error = %e, "Cannot listen for Ctrl+C, running until the transport closes");
            std::future::pending::<()>().await;
        }
    }
}

/// A sender/receiver pair for [`McpServerBuilder::with_shutdown`].
pub fn shutdown_channel() -> (oneshot::Sender<()>, oneshot::Receiver<()>) {
    oneshot::channel()
}
