//! Console logging setup.

use crate::{PlanError, PlanResult};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber: `info` by default, `RUST_LOG` overrides.
///
/// Fails if a global subscriber is already set.
pub fn try_init() -> PlanResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init()
        .map_err(|e| PlanError::ConfigError(format!("logging already initialised: {}", e)))
}

/// Like [`try_init`], ignoring an already installed subscriber
pub fn init() {
    let _ = try_init();
}
