//! MCP transport selection.
//!
//! - **Stdio** (default): one session for the lifetime of the process, which
//!   is how desktop MCP clients launch servers.
//! - **HTTP**: streamable HTTP at `/mcp`, one session per inbound request.
//!
//! ```ignore
//! #[derive(clap::Parser)]
//! struct Args {
//!     #[command(flatten)]
//!     transport: sora_mcp_common::TransportArgs,
//! }
//! ```

use clap::{Args, ValueEnum};
use std::fmt;

/// Resolved transport the server runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// JSON-RPC over stdin/stdout
    #[default]
    Stdio,
    /// Streamable HTTP listening on `port`
    Http {
        /// Port to listen on
        port: u16,
    },
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Stdio => f.write_str("stdio"),
            Transport::Http { port } => write!(f, "http (port {})", port),
        }
    }
}

/// Transport flags shared by server binaries.
#[derive(Args, Debug, Clone, PartialEq, Eq, Default)]
pub struct TransportArgs {
    /// Transport mode
    #[arg(long, value_enum, ignore_case = true, default_value_t = TransportMode::Stdio)]
    pub transport: TransportMode,

    /// Port for the HTTP transport; overrides `PORT`
    #[arg(long)]
    pub port: Option<u16>,
}

/// Transport mode as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    #[default]
    Stdio,
    Http,
}

impl TransportArgs {
    /// Resolve the flags into a transport.
    ///
    /// `configured_port` is the port from [`Config`](crate::Config); an
    /// explicit `--port` wins over it. The port only matters for HTTP.
    pub fn into_transport(self, configured_port: u16) -> Transport {
        match self.transport {
            TransportMode::Stdio => Transport::Stdio,
            TransportMode::Http => Transport::Http {
                port: self.port.unwrap_or(configured_port),
            },
        }
    }
}
