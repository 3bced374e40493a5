//! Tracing setup for processes embedding the registry.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a global fmt subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter` (e.g. `"named_ops=info"`).
///
/// Returns false if a global subscriber was already installed.
pub fn init_tracing(default_filter: &str) -> bool {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
