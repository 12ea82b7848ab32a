//! Diagnostic logging to stderr.
//!
//! Operator-facing lines go to stdout from the CLI; everything emitted here
//! is diagnostics and never mixes with them.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter directive for a `-v`/`-q` balance. `RUST_LOG` overrides it.
pub fn level_for(verbosity: i8) -> &'static str {
    match verbosity {
        i8::MIN..=-1 => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Safe to call more than once; only the first
/// call takes effect.
pub fn init(verbosity: i8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}
