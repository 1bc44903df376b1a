//! Logging and tracing configuration
//!
//! Tracing output goes to stderr so it never interleaves with the
//! `[test-mcp]` progress lines on stdout.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set
pub fn default_filter(debug: bool) -> &'static str {
    if debug {
        "lifeup_smoke=debug,warn"
    } else {
        "lifeup_smoke=warn"
    }
}

/// Initialize tracing for the CLI
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Debug mode (`DEBUG=true` or `--debug`) raises this crate to DEBUG so
/// MCP traffic is visible.
pub fn init(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));

    // try_init: a second initialisation (e.g. from tests) is not an error
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(debug)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}
