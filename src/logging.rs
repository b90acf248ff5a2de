//! Diagnostic logging for the `lox` binary
//!
//! Logs go to stderr and are off unless `LOX_LOG` (or `RUST_LOG`) is set, so
//! program output on stdout is never mixed with them.

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Environment variable read for the log filter
pub const LOG_ENV: &str = "LOX_LOG";

/// Filter directives from `LOX_LOG`, falling back to `RUST_LOG`
pub fn filter_directives() -> Option<String> {
    std::env::var(LOG_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .filter(|directives| !directives.trim().is_empty())
}

/// Install the global subscriber. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let Some(directives) = filter_directives() else {
            return;
        };

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(EnvFilter::new(directives))
            .init();
    });
}
