#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for the `check` command: config loading, resolution,
//! and template linting.

mod common;

use file_automation::cli::{CheckOpts, GlobalOpts};
use file_automation::commands::check;
use file_automation::config::rendered::resolve;
use file_automation::logging::Logger;

use common::WorkspaceBuilder;

const PHOTOS: &str = r#"
presets:
  thumb:
    command: 'convert "{input_path}" -resize {size} "{output_path}"'
    rename: '{parent}/thumbs/{stem}{ext}'
    vars:
      size: 256x256
  archive:
    command: 'tar czf "{input_path}.tgz" "{input_path}"'
targets:
  photos:
    glob: '{in}/**/*'
    include_ext: [.JPG, png]
    exclude_keywords: [thumb]
    presets: [thumb, archive]
  notes:
    glob: '{in}/*.txt'
    presets: [archive]
    min_age_s: 0
"#;

fn global(ws: &common::Workspace) -> GlobalOpts {
    GlobalOpts {
        config: Some(ws.config_path()),
        dry_run: false,
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Targets and their presets come back in declaration order, denormalised.
#[test]
fn resolves_in_declaration_order() {
    let ws = WorkspaceBuilder::new().with_config(PHOTOS).build();
    let targets = resolve(&ws.load_config()).unwrap();

    let names: Vec<&str> = targets.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["photos", "notes"]);

    let photos = &targets[0];
    let presets: Vec<&str> = photos.presets.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(presets, vec!["thumb", "archive"]);
    assert_eq!(photos.presets[0].vars["size"], "256x256");
    assert!(photos.include_ext.contains(".jpg"));
    assert!(photos.include_ext.contains(".png"));
    assert_eq!(photos.min_age_s, 60);
    assert_eq!(targets[1].min_age_s, 0);
}

// ---------------------------------------------------------------------------
// The command
// ---------------------------------------------------------------------------

/// A valid config passes `check` in both output modes.
#[test]
fn valid_config_passes() {
    let ws = WorkspaceBuilder::new().with_config(PHOTOS).build();
    let log = Logger::with_log_file(None);
    check::run(&global(&ws), &CheckOpts { json: false }, &log).unwrap();
    check::run(&global(&ws), &CheckOpts { json: true }, &log).unwrap();
}

/// A command naming an undefined variable is reported by `check`.
#[test]
fn undefined_variable_fails_check() {
    let ws = WorkspaceBuilder::new()
        .with_config(
            r#"
presets:
  p:
    command: 'echo {colour}'
targets:
  t:
    glob: '{in}/*'
    presets: [p]
"#,
        )
        .build();

    let log = Logger::with_log_file(None);
    let err = check::run(&global(&ws), &CheckOpts { json: false }, &log).unwrap_err();
    assert!(err.to_string().contains("1 template issue(s)"), "got {err:#}");

    let issues = check::lint(&resolve(&ws.load_config()).unwrap());
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].to_string(), "t/p command: unknown variable \"colour\"");
}

/// Unknown top-level keys are rejected.
#[test]
fn unknown_top_level_key_fails_check() {
    let ws = WorkspaceBuilder::new()
        .with_config("presets: {}\ntargets: {}\nextra: 1\n")
        .build();
    let log = Logger::with_log_file(None);
    let err = check::run(&global(&ws), &CheckOpts { json: false }, &log).unwrap_err();
    assert!(format!("{err:#}").contains("extra"), "got {err:#}");
}

/// An empty preset list on a target is rejected.
#[test]
fn empty_preset_list_fails_check() {
    let ws = WorkspaceBuilder::new()
        .with_config("presets: {}\ntargets:\n  t:\n    glob: '*'\n    presets: []\n")
        .build();
    let log = Logger::with_log_file(None);
    assert!(check::run(&global(&ws), &CheckOpts { json: false }, &log).is_err());
}

/// A missing config file is reported with its path.
#[test]
fn missing_config_fails_check() {
    let ws = WorkspaceBuilder::new().build();
    std::fs::remove_file(ws.config_path()).unwrap();
    let log = Logger::with_log_file(None);
    let err = check::run(&global(&ws), &CheckOpts { json: false }, &log).unwrap_err();
    assert!(format!("{err:#}").contains("does not exist"), "got {err:#}");
}
