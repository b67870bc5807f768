//! The `run` command: process every target once, or on an interval.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context as _, Result};

use crate::cli::{GlobalOpts, RunOpts};
use crate::config::source::ConfigSource;
use crate::exec::{Executor, SystemExecutor};
use crate::logging::Logger;
use crate::pipeline::{self, Context};

/// Granularity at which the loop sleep checks for a stop request.
const STOP_POLL: Duration = Duration::from_millis(250);

/// Run the `run` command.
///
/// With `--loop`, Ctrl-C stops the loop once the current iteration (and any
/// command it is running) has finished.
///
/// # Errors
///
/// In single-shot mode, returns an error if the configuration cannot be
/// loaded, processing hits a fatal error, or any template failed to render.
/// In loop mode only a failure of the first iteration's config load is
/// returned.
pub fn run(global: &GlobalOpts, opts: &RunOpts, log: &Arc<Logger>) -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    if opts.loop_secs.is_some() {
        let flag = Arc::clone(&stop);
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
            .context("installing Ctrl-C handler")?;
    }

    let version = option_env!("FFM_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    log.info(&format!("ffm {version}"));

    let runner = Runner {
        source: super::config_source(global),
        log: Arc::clone(log),
        executor: Arc::new(SystemExecutor),
        dry_run: global.dry_run,
    };
    runner.run(opts.loop_secs, &stop)
}

/// Everything one iteration needs, independent of process-wide state.
pub struct Runner {
    /// Where to load the configuration from on every iteration.
    pub source: ConfigSource,
    /// Logger shared with the pipeline.
    pub log: Arc<Logger>,
    /// Command executor.
    pub executor: Arc<dyn Executor>,
    /// Render commands without running them.
    pub dry_run: bool,
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("source", &self.source)
            .field("log", &self.log)
            .field("executor", &"<dyn Executor>")
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Runner {
    /// Run once, or every `loop_secs` seconds until `stop` is set.
    ///
    /// An interval of zero means a single run.
    ///
    /// # Errors
    ///
    /// See [`run`].
    pub fn run(&self, loop_secs: Option<u64>, stop: &AtomicBool) -> Result<()> {
        let Some(secs) = loop_secs.filter(|&s| s > 0) else {
            return self.iteration();
        };

        let interval = Duration::from_secs(secs);
        let mut first = true;
        while !stop.load(Ordering::SeqCst) {
            if let Err(e) = self.iteration() {
                if first && e.downcast_ref::<crate::error::ConfigError>().is_some() {
                    return Err(e);
                }
                self.log.error(&format!("{e:#}"));
            }
            first = false;
            self.log.debug(&format!("sleeping {secs}s"));
            sleep_unless_stopped(interval, stop);
        }
        self.log.info("stopped");
        Ok(())
    }

    /// Load the configuration, process every target, and print the summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded, a fatal
    /// pipeline error occurs, or one or more templates failed to render.
    pub fn iteration(&self) -> Result<()> {
        let config = super::load_config(&self.source, self.log.as_ref())?;
        let ctx = Context::new(self.log.clone(), Arc::clone(&self.executor), self.dry_run);

        let outcome = pipeline::run(&config, &ctx);
        let summary = self.log.print_summary();
        outcome?;

        if summary.errors > 0 {
            anyhow::bail!("{} application(s) failed to render", summary.errors);
        }
        Ok(())
    }
}

/// Sleep for `duration`, returning early once `stop` is set.
fn sleep_unless_stopped(duration: Duration, stop: &AtomicBool) {
    let deadline = Instant::now() + duration;
    loop {
        if stop.load(Ordering::SeqCst) {
            return;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return;
        }
        thread::sleep(remaining.min(STOP_POLL));
    }
}
