//! Gatekeeper configuration structures to map the gatekeeper.toml configuration.

#![deny(missing_docs)]

mod loader;
mod rate_limit;
mod server;

use std::path::Path;

pub use rate_limit::RateLimitConfig;
use serde::Deserialize;
pub use server::{HealthConfig, ServerConfig};

/// Main configuration structure for the Gatekeeper application.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration settings.
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from a file path.
    ///
    /// Strings may reference environment variables with `{{ env.NAME }}`.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
        loader::load(path)
    }
}
