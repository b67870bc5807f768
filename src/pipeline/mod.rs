//! The per-iteration pipeline: resolved targets → matched files → presets.
//!
//! Everything runs sequentially.  Targets are processed in declaration
//! order, files in filesystem enumeration order, and presets for one file in
//! the order the target lists them.
pub mod apply;
pub mod context;
pub mod matcher;

use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::config::rendered::{RenderedPresetConfig, RenderedTargetConfig, resolve};
use crate::error::{ApplyError, AutomationError};
use crate::exec::Executor;
use crate::logging::{ApplyStatus, Log};

pub use apply::{Outcome, apply};

/// Collaborators shared by every step of a run.
pub struct Context {
    /// Logger for output and outcome recording.
    pub log: Arc<dyn Log>,
    /// Command executor (mockable in tests).
    pub executor: Arc<dyn Executor>,
    /// Render and report commands without running them or creating directories.
    pub dry_run: bool,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("log", &"<dyn Log>")
            .field("executor", &"<dyn Executor>")
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Context {
    /// Creates a new pipeline context.
    #[must_use]
    pub fn new(log: Arc<dyn Log>, executor: Arc<dyn Executor>, dry_run: bool) -> Self {
        Self {
            log,
            executor,
            dry_run,
        }
    }
}

/// Process every target of `config` once.
///
/// Template failures are recovered per (file, preset): they are logged,
/// recorded as [`ApplyStatus::Error`] and processing moves on.  Non-zero
/// command exits are recorded as [`ApplyStatus::CommandFailed`].
///
/// # Errors
///
/// Returns an error if a glob is invalid, the filesystem cannot be read
/// while matching, an output directory cannot be created, or the shell
/// cannot be spawned.
pub fn run(config: &Config, ctx: &Context) -> Result<(), AutomationError> {
    for target in resolve(config)? {
        ctx.log.stage(&format!("Target {}", target.name));
        for path in matcher::matches(&target, ctx.log.as_ref())? {
            let path = path?;
            for preset in &target.presets {
                apply_one(&path, &target, preset, ctx)?;
            }
        }
    }
    Ok(())
}

fn apply_one(
    path: &Path,
    target: &RenderedTargetConfig,
    preset: &RenderedPresetConfig,
    ctx: &Context,
) -> Result<(), AutomationError> {
    let label = format!("{}/{}: {}", target.name, preset.name, path.display());
    match apply(path, target, preset, ctx) {
        Ok(Outcome::Applied { .. }) => ctx.log.record(&label, ApplyStatus::Applied, None),
        Ok(Outcome::Skipped { output_path }) => ctx.log.record(
            &label,
            ApplyStatus::Skipped,
            Some(&format!("{} exists", output_path.display())),
        ),
        Ok(Outcome::DryRun { command }) => {
            ctx.log.record(&label, ApplyStatus::DryRun, Some(&command));
        }
        Ok(Outcome::Failed { code, .. }) => {
            let message = code.map_or_else(
                || "terminated by signal".to_string(),
                |c| format!("exit code {c}"),
            );
            ctx.log
                .record(&label, ApplyStatus::CommandFailed, Some(&message));
        }
        Err(ApplyError::Template(e)) => {
            ctx.log.error(&format!("{label}: {e}"));
            ctx.log
                .record(&label, ApplyStatus::Error, Some(&e.to_string()));
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::exec::{ExecResult, MockExecutor};
    use std::fs;
    use std::sync::Mutex;
    use test_support::RecordingLog;

    fn ok_result() -> ExecResult {
        ExecResult {
            stdout: String::new(),
            stderr: String::new(),
            success: true,
            code: Some(0),
        }
    }

    fn config(yaml: &str) -> Config {
        Config::from_yaml_str(yaml, "test").unwrap()
    }

    fn escaped(tmp: &tempfile::TempDir) -> String {
        glob::Pattern::escape(&tmp.path().to_string_lossy())
    }

    #[test]
    fn presets_run_in_listed_order_per_file() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.txt"), "a").unwrap();
        let yaml = format!(
            r#"
presets:
  second: {{ command: "echo second {{name}}" }}
  first: {{ command: "echo first {{name}}" }}
targets:
  t:
    glob: "{}/*.txt"
    presets: [first, second]
    min_age_s: 0
"#,
            escaped(&tmp)
        );

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut executor = MockExecutor::new();
        executor.expect_run_shell().returning(move |cmd| {
            sink.lock().unwrap().push(cmd.to_string());
            Ok(ok_result())
        });

        let log = Arc::new(RecordingLog::default());
        let ctx = Context::new(log.clone(), Arc::new(executor), false);
        run(&config(&yaml), &ctx).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["echo first a.txt".to_string(), "echo second a.txt".to_string()]
        );
        assert_eq!(log.statuses(), vec![ApplyStatus::Applied, ApplyStatus::Applied]);
    }

    #[test]
    fn template_error_is_recorded_and_processing_continues() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.txt"), "a").unwrap();
        let yaml = format!(
            r#"
presets:
  broken: {{ command: "echo {{missing}}" }}
  fine: {{ command: "echo ok" }}
targets:
  t:
    glob: "{}/*.txt"
    presets: [broken, fine]
    min_age_s: 0
"#,
            escaped(&tmp)
        );

        let mut executor = MockExecutor::new();
        executor
            .expect_run_shell()
            .withf(|cmd| cmd == "echo ok")
            .times(1)
            .returning(|_| Ok(ok_result()));

        let log = Arc::new(RecordingLog::default());
        let ctx = Context::new(log.clone(), Arc::new(executor), false);
        run(&config(&yaml), &ctx).unwrap();

        assert_eq!(log.statuses(), vec![ApplyStatus::Error, ApplyStatus::Applied]);
        assert!(log.contains("Unknown variable \"missing\""));
    }

    #[test]
    fn failed_command_does_not_stop_the_run() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.txt"), "a").unwrap();
        fs::write(tmp.path().join("b.txt"), "b").unwrap();
        let yaml = format!(
            r#"
presets:
  p: {{ command: "process {{name}}" }}
targets:
  t:
    glob: "{}/*.txt"
    presets: [p]
    min_age_s: 0
"#,
            escaped(&tmp)
        );

        let mut executor = MockExecutor::new();
        executor.expect_run_shell().times(2).returning(|_| {
            Ok(ExecResult {
                stdout: String::new(),
                stderr: "nope".to_string(),
                success: false,
                code: Some(1),
            })
        });

        let log = Arc::new(RecordingLog::default());
        let ctx = Context::new(log.clone(), Arc::new(executor), false);
        run(&config(&yaml), &ctx).unwrap();

        let records = log.records();
        assert_eq!(records.len(), 2);
        assert!(
            records
                .iter()
                .all(|(_, status, msg)| *status == ApplyStatus::CommandFailed
                    && msg.as_deref() == Some("exit code 1"))
        );
    }

    #[test]
    fn targets_are_staged_in_declaration_order() {
        let tmp = tempfile::tempdir().unwrap();
        let yaml = format!(
            r#"
presets:
  p: {{ command: "true" }}
targets:
  zeta:
    glob: "{0}/*.none"
    presets: [p]
  alpha:
    glob: "{0}/*.none"
    presets: [p]
"#,
            escaped(&tmp)
        );

        let mut executor = MockExecutor::new();
        executor.expect_run_shell().never();
        let log = Arc::new(RecordingLog::default());
        let ctx = Context::new(log.clone(), Arc::new(executor), false);
        run(&config(&yaml), &ctx).unwrap();

        let stages: Vec<String> = log
            .messages()
            .into_iter()
            .filter(|m| m.starts_with("stage: "))
            .collect();
        assert_eq!(stages, vec!["stage: Target zeta", "stage: Target alpha"]);
    }

    #[test]
    fn context_debug_hides_trait_objects() {
        let ctx = Context::new(
            Arc::new(RecordingLog::default()),
            Arc::new(MockExecutor::new()),
            true,
        );
        let debug = format!("{ctx:?}");
        assert!(debug.contains("<dyn Log>"));
        assert!(debug.contains("dry_run: true"));
    }
}
