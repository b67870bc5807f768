//! Domain-specific error types for the file automation engine.
//!
//! Library modules return typed errors (e.g., [`ConfigError`],
//! [`TemplateError`]) while command handlers at the CLI boundary convert them
//! to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! AutomationError
//! ├── Config(ConfigError)      config source, YAML schema, preset references
//! ├── Template(TemplateError)  `{name}` placeholder rendering
//! ├── Match(MatchError)        glob expansion and stat calls while matching
//! └── Apply(ApplyError)        applying one preset to one matched file
//! ```
//!
//! A command that exits non-zero is *not* an error: it is logged and recorded
//! in the run summary, and processing continues.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the file automation engine.
#[derive(Error, Debug)]
pub enum AutomationError {
    /// Configuration could not be located, parsed, or validated.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A command or rename template could not be rendered.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// The filesystem could not be scanned for a target.
    #[error("Match error: {0}")]
    Match(#[from] MatchError),

    /// A preset could not be applied to a matched file.
    #[error("Apply error: {0}")]
    Apply(#[from] ApplyError),
}

/// Errors that arise while locating, parsing, or validating configuration.
///
/// All of these are fatal: the run aborts before any file is touched.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No `--config` was given and the fallback environment variable is unset.
    #[error("Environment variable \"{var}\" is not defined")]
    EnvNotSet {
        /// Name of the environment variable that was consulted.
        var: String,
    },

    /// The configuration file does not exist.
    #[error("Config \"{}\" does not exist", .path.display())]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// An I/O error occurred while reading the configuration file.
    #[error("IO error reading config file {}: {source}", .path.display())]
    Io {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The document is not valid YAML or does not match the schema
    /// (unknown key, missing field, wrong type, negative `min_age_s`).
    #[error("Invalid config {source_name}: {message}")]
    Parse {
        /// Where the document came from (file path or `<string>`).
        source_name: String,
        /// Parser message, including the location when known.
        message: String,
    },

    /// A target lists no presets.
    #[error("Target \"{target}\" validation error: at least one preset is required")]
    EmptyPresets {
        /// Name of the offending target.
        target: String,
    },

    /// A target references a preset that is not defined.
    #[error(
        "Target \"{target}\" validation error: Using preset \"{preset}\" but it is not defined in presets: {known:?}"
    )]
    UnknownPreset {
        /// Name of the offending target.
        target: String,
        /// The undefined preset name.
        preset: String,
        /// All defined preset names, in declaration order.
        known: Vec<String>,
    },

    /// A target's `glob` is not a valid pattern.
    #[error("Target \"{target}\" validation error: invalid glob \"{glob}\": {message}")]
    InvalidGlob {
        /// Name of the offending target.
        target: String,
        /// The pattern as written in the config.
        glob: String,
        /// Parser message from the glob engine.
        message: String,
    },

    /// An `exclude_keywords` entry is not a valid pattern.
    #[error("Target \"{target}\" validation error: invalid keyword pattern \"{keyword}\": {message}")]
    InvalidKeyword {
        /// Name of the offending target.
        target: String,
        /// The pattern as written in the config.
        keyword: String,
        /// Compiler message from the regex engine.
        message: String,
    },
}

/// Errors that arise while rendering a `{name}` template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The template references a variable absent from the context.
    #[error("Failed to render: \"{template}\". Unknown variable \"{variable}\". Available context: {available:?}")]
    MissingVariable {
        /// The template text.
        template: String,
        /// The placeholder name that could not be resolved.
        variable: String,
        /// Sorted names of every variable in the context.
        available: Vec<String>,
    },

    /// The template has unbalanced or empty braces.
    #[error("Failed to render: \"{template}\". {reason}")]
    Malformed {
        /// The template text.
        template: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Errors that arise while enumerating the files matched by a target.
#[derive(Error, Debug)]
pub enum MatchError {
    /// The target's glob is not a valid pattern.
    #[error("Target \"{target}\": invalid glob: {message}")]
    Pattern {
        /// Name of the target being matched.
        target: String,
        /// Parser message from the glob engine.
        message: String,
    },

    /// A path could not be read while expanding the glob or stat-ing a candidate.
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        /// Path the operation was performed on.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise while applying one preset to one matched file.
#[derive(Error, Debug)]
pub enum ApplyError {
    /// The rename or command template could not be rendered.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// A filesystem operation on a matched file or output path failed.
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        /// Path the operation was performed on.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The shell could not be spawned at all.
    #[error("failed to execute: {command}: {source}")]
    Spawn {
        /// The rendered command line.
        command: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
