//! `tracing` subscriber setup for binaries and tests embedding this crate.
//!
//! The library itself only emits events; nothing is printed until a subscriber is installed.

use tracing_subscriber::{fmt, EnvFilter};

/// Install a global fmt subscriber.
///
/// The filter is read from `RUST_LOG` and defaults to `info`, e.g.
/// `RUST_LOG=tabular_ingest=debug` or `RUST_LOG=tabular_ingest::audit=info`.
///
/// ```no_run
/// tabular_ingest::logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// Install a debug-level subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
