//! File matching: glob expansion plus extension, keyword, and age filters.
//!
//! Every call re-scans the filesystem; nothing is cached between runs.
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::config::rendered::RenderedTargetConfig;
use crate::error::MatchError;
use crate::logging::Log;

/// Wildcards never match a leading `.`, so hidden files and directories are
/// only reached when the pattern names them literally.
const MATCH_OPTIONS: glob::MatchOptions = glob::MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: true,
};

/// Why a glob candidate was not yielded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The candidate is a directory or other non-file.
    NotAFile,
    /// `include_ext` is set and does not contain the extension.
    NotIncluded,
    /// `exclude_ext` contains the extension.
    ExcludedExt,
    /// An `exclude_keywords` pattern matched the file name.
    Keyword(String),
    /// Modified less than `min_age_s` seconds ago.
    TooFresh,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAFile => write!(f, "not a regular file"),
            Self::NotIncluded => write!(f, "not in include_ext"),
            Self::ExcludedExt => write!(f, "in exclude_ext"),
            Self::Keyword(keyword) => write!(f, "contains \"{keyword}\" from exclude_keywords"),
            Self::TooFresh => write!(f, "not old enough"),
        }
    }
}

/// Lazily yield every file matched by `target`, judged against the current time.
///
/// Each skipped candidate is logged at debug level with its [`SkipReason`].
///
/// # Errors
///
/// Returns [`MatchError::Pattern`] for an invalid glob.  Items are
/// [`MatchError::Io`] when a directory cannot be read during expansion or a
/// candidate cannot be stat-ed.
pub fn matches<'a>(
    target: &'a RenderedTargetConfig,
    log: &'a dyn Log,
) -> Result<impl Iterator<Item = Result<PathBuf, MatchError>> + 'a, MatchError> {
    matches_at(target, log, SystemTime::now())
}

/// Like [`matches`], with file ages measured against `now`.
///
/// # Errors
///
/// See [`matches`].
pub fn matches_at<'a>(
    target: &'a RenderedTargetConfig,
    log: &'a dyn Log,
    now: SystemTime,
) -> Result<impl Iterator<Item = Result<PathBuf, MatchError>> + 'a, MatchError> {
    let paths = glob::glob_with(&target.glob, MATCH_OPTIONS).map_err(|e| MatchError::Pattern {
        target: target.name.clone(),
        message: e.to_string(),
    })?;

    Ok(paths.filter_map(move |entry| {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                return Some(Err(MatchError::Io {
                    path: e.path().to_path_buf(),
                    source: e.into_error(),
                }));
            }
        };
        match evaluate(&path, target, now) {
            Ok(None) => Some(Ok(path)),
            Ok(Some(reason)) => {
                log.debug(&format!(
                    "{} skipping {}, {reason}",
                    target.name,
                    path.display()
                ));
                None
            }
            Err(e) => Some(Err(e)),
        }
    }))
}

/// Decide whether `path` passes every filter of `target`.
///
/// Returns `None` for a match, or the first filter that rejected it.
///
/// # Errors
///
/// Returns [`MatchError::Io`] if `path` cannot be stat-ed.
pub fn evaluate(
    path: &Path,
    target: &RenderedTargetConfig,
    now: SystemTime,
) -> Result<Option<SkipReason>, MatchError> {
    let io_error = |source| MatchError::Io {
        path: path.to_path_buf(),
        source,
    };
    let metadata = fs::metadata(path).map_err(io_error)?;
    if !metadata.is_file() {
        return Ok(Some(SkipReason::NotAFile));
    }

    let ext = lowercase_ext(path);
    if !target.include_ext.is_empty() && !target.include_ext.contains(&ext) {
        return Ok(Some(SkipReason::NotIncluded));
    }
    if target.exclude_ext.contains(&ext) {
        return Ok(Some(SkipReason::ExcludedExt));
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    if let Some(keyword) = target.exclude_keywords.iter().find(|k| k.is_match(&name)) {
        return Ok(Some(SkipReason::Keyword(keyword.as_str().to_string())));
    }

    if target.min_age_s > 0 {
        let modified = metadata.modified().map_err(io_error)?;
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age < Duration::from_secs(target.min_age_s) {
            return Ok(Some(SkipReason::TooFresh));
        }
    }

    Ok(None)
}

/// Final extension, lower-cased, with its leading dot; empty if none.
fn lowercase_ext(path: &Path) -> String {
    path.extension().map_or_else(String::new, |ext| {
        format!(".{}", ext.to_string_lossy().to_lowercase())
    })
}
