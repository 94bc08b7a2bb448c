//! Diagnostic logging setup.
//!
//! User-facing status lines go through [`crate::output`]; this is the
//! `tracing` side, written to stderr and filtered by `-v` count or
//! `RUST_LOG`.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Maps the `-v` count to the most verbose level shown.
pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Installs the global subscriber. Call once, from `main`.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::from_default_env().add_directive(level_for(verbosity).into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .init();
}
