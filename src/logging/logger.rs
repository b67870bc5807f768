//! Structured logger with dry-run awareness and summary collection.
use std::path::PathBuf;
use std::sync::Mutex;

use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET};
use super::types::{ApplyEntry, ApplyStatus, Log, Summary};
use super::utils::log_file_path;

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
///
/// The `record` method is **not** included because its signature differs
/// from the `fn(&self, &str)` pattern shared by the display methods.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger with dry-run awareness and summary collection.
///
/// Every message becomes a [`tracing`] event; the subscriber installed by
/// [`init_subscriber`](super::subscriber::init_subscriber) renders it to the
/// console and appends it to `$XDG_CACHE_HOME/file-automation/<command>.log`.
#[derive(Debug)]
pub struct Logger {
    entries: Mutex<Vec<ApplyEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger.
    ///
    /// Stores the log file path for display in the run summary.  The file
    /// itself is opened by the subscriber; this constructor does not write to it.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self::with_log_file(log_file_path(command))
    }

    /// Create a logger that reports `log_file` in its summary.
    #[must_use]
    pub const fn with_log_file(log_file: Option<PathBuf>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            log_file,
        }
    }

    /// Return the log file path, if available.
    #[must_use]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose; always
    /// written to the log file).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a dry-run action message.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// Record an application result for the summary.
    pub fn record(&self, label: &str, status: ApplyStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.push(ApplyEntry {
                label: label.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Remove and return every recorded entry.
    pub fn take_entries(&self) -> Vec<ApplyEntry> {
        self.entries
            .lock()
            .map_or_else(|_| Vec::new(), |mut guard| std::mem::take(&mut *guard))
    }

    /// Print the summary of the entries recorded since the previous summary
    /// and return their counts.
    ///
    /// Entries are drained so that each loop iteration reports only its own
    /// work.  Skipped applications are counted but not listed individually.
    pub fn print_summary(&self) -> Summary {
        let entries = self.take_entries();
        let summary = Summary::from_entries(&entries);
        if entries.is_empty() {
            self.debug("nothing matched");
            return summary;
        }

        self.stage("Summary");

        for entry in &entries {
            let (icon, color) = match entry.status {
                ApplyStatus::Applied => ("✓", "\x1b[32m"),
                ApplyStatus::Skipped => continue,
                ApplyStatus::DryRun => ("~", "\x1b[37m"),
                ApplyStatus::CommandFailed => ("✗", "\x1b[31m"),
                ApplyStatus::Error => ("!", "\x1b[31m"),
            };

            let suffix = entry
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));

            self.info(&format!("{color}{icon} {}{suffix}\x1b[0m", entry.label));
        }

        self.info(&format!(
            "{} applications: \x1b[32m{} ok\x1b[0m, \x1b[33m{} skipped\x1b[0m, \x1b[37m{} dry-run\x1b[0m, \x1b[31m{} failed\x1b[0m, \x1b[31m{} errors\x1b[0m",
            summary.total(),
            summary.applied,
            summary.skipped,
            summary.dry_run,
            summary.command_failed,
            summary.errors,
        ));

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }

        summary
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, dry_run);

    fn record(&self, label: &str, status: ApplyStatus, message: Option<&str>) {
        self.record(label, status, message);
    }
}
