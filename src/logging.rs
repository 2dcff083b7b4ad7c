//! Structured logging for detection events.
//!
//! Packs emit `tracing` events (stack detected, dependency found, advisory
//! raised); this module installs the subscriber that prints them to stderr.
//! `RUST_LOG` takes precedence over the level picked from the CLI flags.

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

pub fn level_for(verbose: bool, quiet: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else if quiet {
        Level::ERROR
    } else {
        Level::INFO
    }
}

/// Install the global subscriber. Calling it again is a no-op.
pub fn init(level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stack_starter={}", level)));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
