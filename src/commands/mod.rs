pub mod cadence;
pub mod poll;
pub mod run;
pub mod tenant;

use anyhow::{Context, Result};
use std::path::Path;

use feedcast::config::Config;

// Re-export command functions for convenience
pub use cadence::cadence;
pub use poll::poll;
pub use run::run;
pub use tenant::{list_tenants, set_destination, set_tag, toggle_feature};

/// Load configuration from a TOML file, or from `FEEDCAST_*` variables when no file is given
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    config.validate().context("Invalid configuration")?;
    Ok(config)
}
