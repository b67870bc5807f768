//! Top-level subcommand orchestration.
pub mod check;
pub mod run;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::Config;
use crate::config::source::{CONFIG_ENV_VAR, ConfigSource};
use crate::logging::Log;

/// Build the config source from `--config`, falling back to the
/// [`CONFIG_ENV_VAR`] environment variable.
#[must_use]
pub fn config_source(global: &GlobalOpts) -> ConfigSource {
    ConfigSource::from_args(global.config.as_deref(), std::env::var_os(CONFIG_ENV_VAR))
}

/// Locate, parse, and validate the configuration.
///
/// # Errors
///
/// Returns an error if the source cannot be resolved, the file cannot be
/// read, or the document fails validation.
pub fn load_config(source: &ConfigSource, log: &dyn Log) -> Result<Config> {
    let path = source.path()?;
    log.debug(&format!("loading config from {}", path.display()));
    let config = Config::load(&path).with_context(|| format!("loading {}", path.display()))?;
    log.debug(&format!(
        "{} presets, {} targets",
        config.presets.len(),
        config.targets.len()
    ));
    Ok(config)
}
