//! Applying one preset to one matched file.
use std::fs;
use std::path::{Path, PathBuf};

use super::Context;
use super::context::{OUTPUT_PATH, build_context};
use crate::config::rendered::{RenderedPresetConfig, RenderedTargetConfig};
use crate::error::ApplyError;
use crate::template;

/// What happened when a preset was applied to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The command ran and exited successfully.
    Applied {
        /// The rendered command line.
        command: String,
    },
    /// `output_path` already existed; nothing ran.
    Skipped {
        /// The existing output path.
        output_path: PathBuf,
    },
    /// Dry-run mode; the command was rendered but not run.
    DryRun {
        /// The rendered command line.
        command: String,
    },
    /// The command ran and exited non-zero.
    Failed {
        /// The rendered command line.
        command: String,
        /// Exit code, if the process exited normally.
        code: Option<i32>,
    },
}

/// Render `preset` for `path` and run it.
///
/// If the preset has a rename template and the rendered `output_path`
/// exists, nothing runs.  Otherwise the output path's parent directories are
/// created, the command is rendered and run through the shell.  A non-zero
/// exit is logged with the captured output and reported as
/// [`Outcome::Failed`]; it is not an error.
///
/// # Errors
///
/// Returns [`ApplyError::Template`] if a template fails to render,
/// [`ApplyError::Io`] if `path` cannot be stat-ed or the output directory
/// cannot be created, and [`ApplyError::Spawn`] if the shell cannot start.
pub fn apply(
    path: &Path,
    target: &RenderedTargetConfig,
    preset: &RenderedPresetConfig,
    ctx: &Context,
) -> Result<Outcome, ApplyError> {
    let vars = build_context(path, target, preset)?;

    if let Some(output) = vars.get(OUTPUT_PATH) {
        let output_path = PathBuf::from(output);
        if output_path.exists() {
            ctx.log.debug(&format!(
                "Skipping {}, already exists at {}",
                path.display(),
                output_path.display()
            ));
            return Ok(Outcome::Skipped { output_path });
        }
        if !ctx.dry_run {
            create_parent_dirs(&output_path)?;
        }
    }

    let command = template::render(&preset.command, &vars)?;

    if ctx.dry_run {
        ctx.log.dry_run(&format!("would run: {command}"));
        return Ok(Outcome::DryRun { command });
    }

    ctx.log.info(&format!("Running: {command}"));
    let result = ctx
        .executor
        .run_shell(&command)
        .map_err(|source| ApplyError::Spawn {
            command: command.clone(),
            source,
        })?;

    if result.success {
        return Ok(Outcome::Applied { command });
    }

    let code = result
        .code
        .map_or_else(|| "signal".to_string(), |c| c.to_string());
    ctx.log.warn(&format!("command exited with {code}: {command}"));
    if !result.stdout.trim().is_empty() {
        ctx.log.warn(&format!("stdout:\n{}", result.stdout.trim_end()));
    }
    if !result.stderr.trim().is_empty() {
        ctx.log.warn(&format!("stderr:\n{}", result.stderr.trim_end()));
    }
    Ok(Outcome::Failed {
        command,
        code: result.code,
    })
}

fn create_parent_dirs(output_path: &Path) -> Result<(), ApplyError> {
    match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| ApplyError::Io {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::error::TemplateError;
    use crate::exec::{ExecResult, MockExecutor};
    use crate::pipeline::test_support::RecordingLog;
    use std::sync::Arc;

    fn ok_result() -> ExecResult {
        ExecResult {
            stdout: String::new(),
            stderr: String::new(),
            success: true,
            code: Some(0),
        }
    }

    fn context(executor: MockExecutor, dry_run: bool) -> (Context, Arc<RecordingLog>) {
        let log = Arc::new(RecordingLog::default());
        let ctx = Context::new(log.clone(), Arc::new(executor), dry_run);
        (ctx, log)
    }

    fn input(tmp: &tempfile::TempDir) -> PathBuf {
        let path = tmp.path().join("test.howdy");
        fs::write(&path, "howdy").unwrap();
        path
    }

    #[test]
    fn runs_rendered_command() {
        let tmp = tempfile::tempdir().unwrap();
        let path = input(&tmp);
        let expected = format!("cat {}", path.display());

        let mut executor = MockExecutor::new();
        let want = expected.clone();
        executor
            .expect_run_shell()
            .withf(move |cmd| cmd == want)
            .times(1)
            .returning(|_| Ok(ok_result()));
        let (ctx, _log) = context(executor, false);

        let preset = RenderedPresetConfig::new("p", "cat {input_path}");
        let target = RenderedTargetConfig::new("t", "*", vec![preset.clone()]);
        let outcome = apply(&path, &target, &preset, &ctx).unwrap();
        assert_eq!(outcome, Outcome::Applied { command: expected });
    }

    #[test]
    fn existing_output_path_skips_without_running() {
        let tmp = tempfile::tempdir().unwrap();
        let path = input(&tmp);
        fs::write(tmp.path().join("p.howdy"), "done").unwrap();

        let mut executor = MockExecutor::new();
        executor.expect_run_shell().never();
        let (ctx, _log) = context(executor, false);

        let preset = RenderedPresetConfig::new("p", "cp {input_path} {output_path}")
            .with_rename("{parent}/{preset}{ext}");
        let target = RenderedTargetConfig::new("t", "*", vec![preset.clone()]);
        let outcome = apply(&path, &target, &preset, &ctx).unwrap();
        assert!(matches!(outcome, Outcome::Skipped { .. }), "got {outcome:?}");
    }

    #[test]
    fn creates_missing_output_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let path = input(&tmp);

        let mut executor = MockExecutor::new();
        executor
            .expect_run_shell()
            .times(1)
            .returning(|_| Ok(ok_result()));
        let (ctx, _log) = context(executor, false);

        let preset = RenderedPresetConfig::new("p", "true {output_path}")
            .with_rename("{parent}/out/nested/{stem}.bak");
        let target = RenderedTargetConfig::new("t", "*", vec![preset.clone()]);
        apply(&path, &target, &preset, &ctx).unwrap();
        assert!(tmp.path().join("out").join("nested").is_dir());
    }

    #[test]
    fn dry_run_renders_but_never_executes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = input(&tmp);

        let mut executor = MockExecutor::new();
        executor.expect_run_shell().never();
        let (ctx, log) = context(executor, true);

        let preset = RenderedPresetConfig::new("p", "echo {name}")
            .with_rename("{parent}/out/{stem}.bak");
        let target = RenderedTargetConfig::new("t", "*", vec![preset.clone()]);
        let outcome = apply(&path, &target, &preset, &ctx).unwrap();
        assert_eq!(
            outcome,
            Outcome::DryRun {
                command: "echo test.howdy".to_string()
            }
        );
        assert!(!tmp.path().join("out").exists(), "dry run must not create dirs");
        assert!(log.contains("would run: echo test.howdy"));
    }

    #[test]
    fn non_zero_exit_surfaces_output() {
        let tmp = tempfile::tempdir().unwrap();
        let path = input(&tmp);

        let mut executor = MockExecutor::new();
        executor.expect_run_shell().returning(|_| {
            Ok(ExecResult {
                stdout: "partial\n".to_string(),
                stderr: "boom\n".to_string(),
                success: false,
                code: Some(2),
            })
        });
        let (ctx, log) = context(executor, false);

        let preset = RenderedPresetConfig::new("p", "false");
        let target = RenderedTargetConfig::new("t", "*", vec![preset.clone()]);
        let outcome = apply(&path, &target, &preset, &ctx).unwrap();
        assert_eq!(
            outcome,
            Outcome::Failed {
                command: "false".to_string(),
                code: Some(2)
            }
        );
        assert!(log.contains("partial"));
        assert!(log.contains("boom"));
    }

    #[test]
    fn unknown_variable_in_command_is_template_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = input(&tmp);

        let mut executor = MockExecutor::new();
        executor.expect_run_shell().never();
        let (ctx, _log) = context(executor, false);

        let preset = RenderedPresetConfig::new("p", "echo {undefined}");
        let target = RenderedTargetConfig::new("t", "*", vec![preset.clone()]);
        let err = apply(&path, &target, &preset, &ctx).unwrap_err();
        let ApplyError::Template(TemplateError::MissingVariable {
            template,
            variable,
            available,
        }) = &err
        else {
            panic!("unexpected error: {err:?}");
        };
        assert_eq!(template, "echo {undefined}");
        assert_eq!(variable, "undefined");
        assert!(available.contains(&"input_path".to_string()));
    }

    #[test]
    fn spawn_failure_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = input(&tmp);

        let mut executor = MockExecutor::new();
        executor
            .expect_run_shell()
            .returning(|_| Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no sh")));
        let (ctx, _log) = context(executor, false);

        let preset = RenderedPresetConfig::new("p", "echo");
        let target = RenderedTargetConfig::new("t", "*", vec![preset.clone()]);
        let err = apply(&path, &target, &preset, &ctx).unwrap_err();
        assert!(matches!(err, ApplyError::Spawn { .. }), "got {err:?}");
    }
}
