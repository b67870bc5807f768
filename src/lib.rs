//! File automation engine.
//!
//! Scans the filesystem for files matching configured targets (a glob plus
//! extension, keyword and age filters) and, for every match, runs the shell
//! commands of the target's presets, rendered from a small templating
//! context.  A preset's optional rename template names an output path whose
//! existence marks the file as already processed.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: parse and validate the YAML document, resolve targets
//! - **[`template`]**: `{name}` placeholder rendering
//! - **[`pipeline`]**: match files, build templating contexts, apply presets
//! - **[`commands`]**: top-level subcommand orchestration (`run`, `check`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod pipeline;
pub mod template;
