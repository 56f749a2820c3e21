//! Log output for the server binaries.
//!
//! Everything is written to stderr: with the stdio transport, stdout is the
//! JSON-RPC channel and any stray line on it breaks the session.
//!
//! Filtering follows `RUST_LOG` and falls back to `info`, e.g.
//! `RUST_LOG=warn,sora_mcp_video=debug`.

use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    prelude::*,
    util::TryInitError,
};

/// Level used when `RUST_LOG` is unset or unparseable.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Install the global subscriber.
///
/// # Panics
///
/// Panics if a global subscriber is already installed; use
/// [`try_init_tracing`] where that can happen.
pub fn init_tracing() {
    subscriber().init();
}

/// Install the global subscriber unless one is already set.
pub fn try_init_tracing() -> Result<(), TryInitError> {
    subscriber().try_init()
}

fn subscriber() -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::registry().with(env_filter(DEFAULT_LOG_LEVEL)).with(stderr_layer())
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn stderr_layer<S>() -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_span_events(FmtSpan::NONE)
}
