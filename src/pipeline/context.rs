//! Templating context: the variables available to command and rename templates.
//!
//! Layers, lowest precedence first:
//!
//! 1. `date`, `time` (wall clock)
//! 2. path variables (`input_path`, `stem`, `ext`, ...)
//! 3. `target`, `preset` names
//! 4. target `vars`, then preset `vars`
//!
//! If the preset has a rename template it is rendered against the result and
//! stored as `output_path`.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};

use crate::config::rendered::{RenderedPresetConfig, RenderedTargetConfig};
use crate::error::ApplyError;
use crate::template;

/// Variable name → value mapping used for rendering.
pub type TemplateContext = BTreeMap<String, String>;

/// Context key holding the rendered rename template.
pub const OUTPUT_PATH: &str = "output_path";

/// Every variable this module defines, before user `vars`.
pub const BUILTIN_VARIABLES: &[&str] = &[
    "date",
    "time",
    "created_at_date",
    "modified_at_date",
    "input_path",
    "stem",
    "suffix",
    "ext",
    "parent",
    "parent_parent",
    "name",
    "target",
    "preset",
];

/// Build the templating context for `path` using the current wall clock.
///
/// # Errors
///
/// Returns [`ApplyError::Io`] if `path` cannot be stat-ed and
/// [`ApplyError::Template`] if the rename template fails to render.
pub fn build_context(
    path: &Path,
    target: &RenderedTargetConfig,
    preset: &RenderedPresetConfig,
) -> Result<TemplateContext, ApplyError> {
    build_context_at(path, target, preset, Local::now())
}

/// Build the templating context for `path` as of `now`.
///
/// # Errors
///
/// See [`build_context`].
pub fn build_context_at(
    path: &Path,
    target: &RenderedTargetConfig,
    preset: &RenderedPresetConfig,
    now: DateTime<Local>,
) -> Result<TemplateContext, ApplyError> {
    let metadata = fs::metadata(path).map_err(|source| ApplyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
    let created = metadata.created().unwrap_or(modified);

    let suffix = suffix_of(path);
    let parent = parent_of(path);
    let parent_parent = parent_of(&parent);

    let mut context = TemplateContext::new();
    let mut set = |key: &str, value: String| {
        context.insert(key.to_string(), value);
    };

    set("date", now.date_naive().to_string());
    set("time", now.format("%H:%M:%S").to_string());

    set("created_at_date", iso_date(created));
    set("modified_at_date", iso_date(modified));
    set("input_path", path.to_string_lossy().into_owned());
    set("stem", lossy(path.file_stem()));
    set("suffix", suffix.clone());
    set("ext", suffix);
    set("parent", parent.to_string_lossy().into_owned());
    set("parent_parent", parent_parent.to_string_lossy().into_owned());
    set("name", lossy(path.file_name()));

    set("target", target.name.clone());
    set("preset", preset.name.clone());

    context.extend(target.vars.clone());
    context.extend(preset.vars.clone());

    if let Some(rename) = &preset.rename {
        let rendered = template::render(rename, &context)?;
        let output_path: PathBuf = Path::new(&rendered).components().collect();
        context.insert(
            OUTPUT_PATH.to_string(),
            output_path.to_string_lossy().into_owned(),
        );
    }

    Ok(context)
}

/// Final extension with its leading dot, case preserved; empty if none.
fn suffix_of(path: &Path) -> String {
    path.extension()
        .map_or_else(String::new, |ext| format!(".{}", ext.to_string_lossy()))
}

/// Containing directory, `.` for a bare file name; the root is its own parent.
fn parent_of(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => PathBuf::from("."),
        Some(parent) => parent.to_path_buf(),
        None if path.as_os_str().is_empty() => PathBuf::from("."),
        None => path.to_path_buf(),
    }
}

fn lossy(part: Option<&std::ffi::OsStr>) -> String {
    part.map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn iso_date(time: SystemTime) -> String {
    DateTime::<Local>::from(time).date_naive().to_string()
}
