//! Locating the configuration file.
//!
//! The file is named explicitly on the command line or, failing that, by the
//! [`CONFIG_ENV_VAR`] environment variable.  The environment is read by the
//! caller and passed in, so this module holds no global state.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::Config;
use crate::error::ConfigError;

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_ENV_VAR: &str = "FFM_CONFIG";

/// Where the configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A path given explicitly (e.g., `--config`).
    Path(PathBuf),
    /// The value of an environment variable, captured by the caller.
    Env {
        /// Name of the variable, for error messages.
        var: String,
        /// Its value, or `None` if it is unset.
        value: Option<OsString>,
    },
}

impl ConfigSource {
    /// Prefer `explicit`, falling back to the captured value of [`CONFIG_ENV_VAR`].
    #[must_use]
    pub fn from_args(explicit: Option<&Path>, env_value: Option<OsString>) -> Self {
        explicit.map_or_else(
            || Self::Env {
                var: CONFIG_ENV_VAR.to_string(),
                value: env_value,
            },
            |path| Self::Path(path.to_path_buf()),
        )
    }

    /// Resolve the source to a file path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EnvNotSet`] if the source is an unset (or
    /// empty) environment variable.
    pub fn path(&self) -> Result<PathBuf, ConfigError> {
        match self {
            Self::Path(path) => Ok(path.clone()),
            Self::Env { var, value } => value
                .as_ref()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .ok_or_else(|| ConfigError::EnvNotSet { var: var.clone() }),
        }
    }

    /// Resolve the source and load the configuration it designates.
    ///
    /// # Errors
    ///
    /// Returns any error from [`ConfigSource::path`] or [`Config::load`].
    pub fn load(&self) -> Result<Config, ConfigError> {
        Config::load(&self.path()?)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins_over_env() {
        let source = ConfigSource::from_args(
            Some(Path::new("explicit.yaml")),
            Some(OsString::from("env.yaml")),
        );
        assert_eq!(source.path().unwrap(), PathBuf::from("explicit.yaml"));
    }

    #[test]
    fn falls_back_to_env_value() {
        let source = ConfigSource::from_args(None, Some(OsString::from("env.yaml")));
        assert_eq!(source.path().unwrap(), PathBuf::from("env.yaml"));
    }

    #[test]
    fn unset_env_is_an_error() {
        let source = ConfigSource::from_args(None, None);
        let err = source.path().unwrap_err();
        assert!(
            matches!(err, ConfigError::EnvNotSet { ref var } if var == CONFIG_ENV_VAR),
            "got {err:?}"
        );
    }

    #[test]
    fn empty_env_is_an_error() {
        let source = ConfigSource::from_args(None, Some(OsString::new()));
        assert!(matches!(
            source.path().unwrap_err(),
            ConfigError::EnvNotSet { .. }
        ));
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = ConfigSource::Path(dir.path().join("absent.yaml"));
        assert!(matches!(
            source.load().unwrap_err(),
            ConfigError::NotFound { .. }
        ));
    }

    #[test]
    fn load_reads_env_designated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ffm.yaml");
        std::fs::write(&path, "presets:\n  p:\n    command: echo\n").unwrap();
        let source = ConfigSource::from_args(None, Some(path.into_os_string()));
        let config = source.load().unwrap();
        assert!(config.presets.contains_key("p"));
    }
}
