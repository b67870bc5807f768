//! Log file location, escape-code removal and timestamps.
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "file-automation";

/// Remove terminal escape sequences so console output can be written to the
/// log file as plain text.
///
/// A CSI sequence (`ESC [`) runs up to its final byte in `@`..=`~`. Any other
/// escape is two characters long.
pub(super) fn strip_ansi(s: &str) -> String {
    let mut pieces = s.split('\x1b');
    let mut out = String::with_capacity(s.len());
    out.push_str(pieces.next().unwrap_or_default());
    for piece in pieces {
        out.push_str(after_escape(piece));
    }
    out
}

/// The text following the escape sequence that `seq` starts with.
fn after_escape(seq: &str) -> &str {
    let mut chars = seq.char_indices();
    let end = match chars.next() {
        Some((_, '[')) => chars
            .find(|&(_, c)| ('@'..='~').contains(&c))
            .map(|(i, c)| i + c.len_utf8()),
        Some((_, c)) => Some(c.len_utf8()),
        None => None,
    };
    end.and_then(|i| seq.get(i..)).unwrap_or_default()
}

/// Base cache directory: `$XDG_CACHE_HOME`, else `~/.cache`, else `./.cache`.
fn cache_root() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CACHE_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg);
    }
    ["HOME", "USERPROFILE"]
        .into_iter()
        .find_map(std::env::var_os)
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
        .join(".cache")
}

/// The application's cache directory, created on first use.
pub(super) fn cache_dir() -> Option<PathBuf> {
    let dir = cache_root().join(APP_DIR);
    fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

fn log_file_in(dir: &Path, command: &str) -> PathBuf {
    dir.join(command).with_extension("log")
}

/// Log file for `command`, e.g. `~/.cache/file-automation/run.log`.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    Some(log_file_in(&cache_dir()?, command))
}

/// Local wall-clock time for log file lines.
pub(super) fn format_local_datetime() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Local wall-clock time for console lines.
pub(super) fn format_local_time() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, NaiveTime};

    #[test]
    fn status_colours_are_removed() {
        assert_eq!(
            strip_ansi("\x1b[32mapplied\x1b[0m photos/thumb a.jpg"),
            "applied photos/thumb a.jpg"
        );
        assert_eq!(
            strip_ansi("\x1b[1;31mfailed\x1b[0m (exit 4)"),
            "failed (exit 4)"
        );
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(strip_ansi(""), "");
        assert_eq!(strip_ansi("echo {name} > {output_path}"), "echo {name} > {output_path}");
        assert_eq!(strip_ansi("überprüft: ä.txt"), "überprüft: ä.txt");
    }

    #[test]
    fn cursor_and_short_escapes_are_removed() {
        assert_eq!(strip_ansi("\x1b[2K\x1b[1Gscanning"), "scanning");
        assert_eq!(strip_ansi("\x1b7saved\x1b8"), "saved");
    }

    #[test]
    fn truncated_escape_drops_only_the_escape() {
        assert_eq!(strip_ansi("done\x1b"), "done");
        assert_eq!(strip_ansi("done\x1b[31"), "done");
    }

    #[test]
    fn log_file_is_named_after_the_command() {
        let dir = Path::new("/cache/file-automation");
        assert_eq!(
            log_file_in(dir, "run"),
            PathBuf::from("/cache/file-automation/run.log")
        );
        assert_eq!(
            log_file_in(dir, "check"),
            PathBuf::from("/cache/file-automation/check.log")
        );
    }

    #[test]
    fn timestamps_parse_back() {
        NaiveDateTime::parse_from_str(&format_local_datetime(), "%Y-%m-%d %H:%M:%S")
            .expect("datetime layout");
        NaiveTime::parse_from_str(&format_local_time(), "%H:%M:%S").expect("time layout");
    }
}
