// Shared helpers for integration tests.
//
// Provides a temporary workspace with an `in/` directory for input files and
// a fluent builder for the YAML config, so each integration test can set up
// an isolated environment without repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use file_automation::config::Config;
use file_automation::config::source::ConfigSource;
use file_automation::commands::run::Runner;
use file_automation::exec::SystemExecutor;
use file_automation::logging::Logger;

/// An isolated workspace backed by a [`tempfile::TempDir`].
///
/// Layout:
/// - `ffm.yaml`: the config written by [`WorkspaceBuilder::build`]
/// - `in/`: input files
pub struct Workspace {
    /// Temporary directory holding the config and input files.
    pub root: tempfile::TempDir,
}

impl Workspace {
    /// Path to the workspace root.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Path to the input directory.
    pub fn input_dir(&self) -> PathBuf {
        self.root.path().join("in")
    }

    /// Path to the config file.
    pub fn config_path(&self) -> PathBuf {
        self.root.path().join("ffm.yaml")
    }

    /// Glob-escaped input directory, for use inside `glob:` values.
    pub fn input_glob(&self, suffix: &str) -> String {
        format!(
            "{}/{suffix}",
            glob::Pattern::escape(&self.input_dir().to_string_lossy())
        )
    }

    /// Create `relative` (and its parents) under `in/` with `content`.
    pub fn write_input(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.input_dir().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create input parent");
        }
        std::fs::write(&path, content).expect("write input file");
        path
    }

    /// Parse and validate the written config.
    pub fn load_config(&self) -> Config {
        Config::load(&self.config_path()).expect("load config")
    }

    /// A runner over this workspace using the real shell.
    pub fn runner(&self, dry_run: bool) -> Runner {
        Runner {
            source: ConfigSource::Path(self.config_path()),
            log: Arc::new(Logger::with_log_file(None)),
            executor: Arc::new(SystemExecutor),
            dry_run,
        }
    }

    /// Run a single iteration.
    pub fn run_once(&self) -> anyhow::Result<()> {
        self.runner(false)
            .run(None, &std::sync::atomic::AtomicBool::new(false))
    }
}

/// Fluent builder for [`Workspace`].
///
/// `{in}` in any YAML passed to the builder is replaced by the glob-escaped
/// input directory, and `{root}` by the plain workspace root.
pub struct WorkspaceBuilder {
    ws: Workspace,
    yaml: String,
}

impl WorkspaceBuilder {
    /// Begin building a workspace with an empty `in/` directory.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(root.path().join("in")).expect("create input dir");
        Self {
            ws: Workspace { root },
            yaml: String::new(),
        }
    }

    /// Use `yaml` as the config document.
    pub fn with_config(mut self, yaml: &str) -> Self {
        let input = glob::Pattern::escape(&self.ws.input_dir().to_string_lossy());
        self.yaml = yaml
            .replace("{in}", &input)
            .replace("{root}", &self.ws.root_path().to_string_lossy());
        self
    }

    /// Create an input file before the workspace is returned.
    pub fn with_input(self, relative: &str, content: &str) -> Self {
        self.ws.write_input(relative, content);
        self
    }

    /// Write the config and return the workspace.
    pub fn build(self) -> Workspace {
        std::fs::write(self.ws.config_path(), &self.yaml).expect("write config");
        self.ws
    }
}
