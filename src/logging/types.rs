//! Core logging types: apply entries, status, and the [`Log`] trait.

/// Outcome of applying one preset to one matched file, for summary reporting.
#[derive(Debug, Clone)]
pub struct ApplyEntry {
    /// Human-readable label, `target/preset: path`.
    pub label: String,
    /// Final status of the application.
    pub status: ApplyStatus,
    /// Optional detail message (e.g., skip reason or error description).
    pub message: Option<String>,
}

/// Status of a completed (file, preset) application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyStatus {
    /// The command ran and exited successfully.
    Applied,
    /// The output path already exists; nothing was run.
    Skipped,
    /// Dry-run mode; the command was rendered but not executed.
    DryRun,
    /// The command ran but exited non-zero.
    CommandFailed,
    /// The command could not be produced (e.g., a template failed to render).
    Error,
}

/// Abstraction over logging backends.
///
/// [`Logger`](super::logger::Logger) is the production implementation;
/// pipeline code only depends on this trait so it can be exercised with an
/// in-memory recorder in tests.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record an application result for the summary.
    fn record(&self, label: &str, status: ApplyStatus, message: Option<&str>);
}

/// Per-status counts of the entries drained by a summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Commands that ran successfully.
    pub applied: usize,
    /// Applications skipped because their output already existed.
    pub skipped: usize,
    /// Commands rendered in dry-run mode.
    pub dry_run: usize,
    /// Commands that exited non-zero.
    pub command_failed: usize,
    /// Applications that could not be rendered.
    pub errors: usize,
}

impl Summary {
    /// Tally a list of entries.
    #[must_use]
    pub fn from_entries(entries: &[ApplyEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut acc, entry| {
            match entry.status {
                ApplyStatus::Applied => acc.applied += 1,
                ApplyStatus::Skipped => acc.skipped += 1,
                ApplyStatus::DryRun => acc.dry_run += 1,
                ApplyStatus::CommandFailed => acc.command_failed += 1,
                ApplyStatus::Error => acc.errors += 1,
            }
            acc
        })
    }

    /// Total number of entries counted.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.applied + self.skipped + self.dry_run + self.command_failed + self.errors
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn entry(status: ApplyStatus) -> ApplyEntry {
        ApplyEntry {
            label: "t/p: a.txt".to_string(),
            status,
            message: None,
        }
    }

    #[test]
    fn summary_counts_each_status() {
        let entries = vec![
            entry(ApplyStatus::Applied),
            entry(ApplyStatus::Applied),
            entry(ApplyStatus::Skipped),
            entry(ApplyStatus::DryRun),
            entry(ApplyStatus::CommandFailed),
            entry(ApplyStatus::Error),
        ];
        let summary = Summary::from_entries(&entries);
        assert_eq!(summary.applied, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.dry_run, 1);
        assert_eq!(summary.command_failed, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.total(), 6);
    }

    #[test]
    fn summary_of_nothing_is_empty() {
        assert_eq!(Summary::from_entries(&[]), Summary::default());
    }
}
