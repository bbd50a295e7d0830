//! Tracing initialisation for the `git-promote` binary.
//!
//! Diagnostics go to stderr so they never mix with prompts and status lines.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Default level when `RUST_LOG` is not set
pub fn default_level(verbose: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else {
        Level::WARN
    }
}

/// Initialise the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects debug output for
/// every git operation. Only the first call takes effect.
pub fn init_tracing(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose).as_str()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .ok();
}
