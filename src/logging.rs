//! Logging setup.
//!
//! The crate logs through `tracing`. Applications that already install a
//! subscriber need nothing from here.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "DYNODDL_LOG";

/// Install a formatting subscriber filtered by `DYNODDL_LOG`.
///
/// Defaults to "info" level if DYNODDL_LOG is not set. Does nothing when a
/// global subscriber is already installed.
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
