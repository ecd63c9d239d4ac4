//! Logging setup
//!
//! `RUST_LOG` takes precedence when set. Otherwise only warnings are shown,
//! or debug output for `--verbose`. Logs go to stderr so stdout stays
//! usable in pipes.

use tracing_subscriber::{fmt, EnvFilter};

pub fn init(verbose: bool) {
    let default = if verbose { "comply=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (tests, embedding) keeps the first subscriber
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
