//! Logging setup.
//!
//! The crate logs through `tracing`: every reconciler operation runs in a
//! `debug` span carrying the resource type and identity, and remote calls are
//! logged at `debug`. Errors are returned, never logged here. These helpers
//! install a subscriber writing to **stderr**, filtered by `RUST_LOG`.
//!
//! # Examples
//!
//! ```bash
//! # Show reconciler and HTTP activity
//! RUST_LOG=ovh_iplb_provider=debug ./my-tool
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn registry_with(
    default_level: &str,
) -> impl tracing_subscriber::util::SubscriberInitExt + Send + Sync {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    )
}

/// Initialize logging at `info` unless `RUST_LOG` says otherwise.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default("info");
}

/// Initialize logging with a custom default level, used when `RUST_LOG` is
/// not set.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    registry_with(default_level).init();
}

/// Try to initialize logging, returning `false` if a subscriber was already
/// set. Safe to call from tests.
pub fn try_init_logging() -> bool {
    registry_with("info").try_init().is_ok()
}
