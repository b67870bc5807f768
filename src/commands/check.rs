//! The `check` command: validate the configuration without touching files.
use std::collections::BTreeSet;
use std::fmt;

use anyhow::{Context as _, Result};
use serde::Serialize;

use crate::cli::{CheckOpts, GlobalOpts};
use crate::config::rendered::{
    KeywordPattern, RenderedPresetConfig, RenderedTargetConfig, resolve,
};
use crate::logging::{Log, Logger};
use crate::pipeline::context::{BUILTIN_VARIABLES, OUTPUT_PATH};
use crate::template;

/// A template that cannot render for any file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateIssue {
    /// Target the preset is attached to.
    pub target: String,
    /// Preset owning the template.
    pub preset: String,
    /// Which template: `command` or `rename`.
    pub field: &'static str,
    /// What is wrong with it.
    pub problem: String,
}

impl fmt::Display for TemplateIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} {}: {}",
            self.target, self.preset, self.field, self.problem
        )
    }
}

#[derive(Serialize)]
struct Report<'a> {
    targets: &'a [RenderedTargetConfig],
    issues: &'a [TemplateIssue],
}

/// Run the `check` command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or validated, or
/// if any template references a variable that will never be defined.
pub fn run(global: &GlobalOpts, opts: &CheckOpts, log: &Logger) -> Result<()> {
    let source = super::config_source(global);
    let config = super::load_config(&source, log)?;
    let targets = resolve(&config)?;
    let issues = lint(&targets);

    if opts.json {
        let report = Report {
            targets: &targets,
            issues: &issues,
        };
        let json = serde_json::to_string_pretty(&report).context("serializing report")?;
        #[allow(clippy::print_stdout)]
        {
            println!("{json}");
        }
    } else {
        describe(&targets, log);
        for issue in &issues {
            log.warn(&issue.to_string());
        }
    }

    if !issues.is_empty() {
        anyhow::bail!("{} template issue(s) found", issues.len());
    }
    if !opts.json {
        log.info("configuration is valid");
    }
    Ok(())
}

/// Find templates that would fail for every file: malformed ones, and ones
/// naming a variable that is neither built in nor defined in `vars`.
#[must_use]
pub fn lint(targets: &[RenderedTargetConfig]) -> Vec<TemplateIssue> {
    let mut issues = Vec::new();
    for target in targets {
        for preset in &target.presets {
            let known = known_variables(target, preset);
            if let Some(rename) = &preset.rename {
                lint_template(target, preset, "rename", rename, &known, &mut issues);
            }
            let mut known = known;
            if preset.rename.is_some() {
                known.insert(OUTPUT_PATH);
            }
            lint_template(target, preset, "command", &preset.command, &known, &mut issues);
        }
    }
    issues
}

fn known_variables<'a>(
    target: &'a RenderedTargetConfig,
    preset: &'a RenderedPresetConfig,
) -> BTreeSet<&'a str> {
    BUILTIN_VARIABLES
        .iter()
        .copied()
        .chain(target.vars.keys().map(String::as_str))
        .chain(preset.vars.keys().map(String::as_str))
        .collect()
}

fn lint_template(
    target: &RenderedTargetConfig,
    preset: &RenderedPresetConfig,
    field: &'static str,
    text: &str,
    known: &BTreeSet<&str>,
    issues: &mut Vec<TemplateIssue>,
) {
    let mut push = |problem: String| {
        issues.push(TemplateIssue {
            target: target.name.clone(),
            preset: preset.name.clone(),
            field,
            problem,
        });
    };
    match template::placeholders(text) {
        Ok(names) => {
            for name in names {
                if !known.contains(name) {
                    push(format!("unknown variable \"{name}\""));
                }
            }
        }
        Err(e) => push(e.to_string()),
    }
}

fn describe(targets: &[RenderedTargetConfig], log: &dyn Log) {
    log.stage("Targets");
    for target in targets {
        let presets: Vec<&str> = target.presets.iter().map(|p| p.name.as_str()).collect();
        log.info(&format!(
            "{}: {} -> {}",
            target.name,
            target.glob,
            presets.join(", ")
        ));
        if !target.include_ext.is_empty() {
            log.debug(&format!("  include_ext: {:?}", target.include_ext));
        }
        if !target.exclude_ext.is_empty() {
            log.debug(&format!("  exclude_ext: {:?}", target.exclude_ext));
        }
        if !target.exclude_keywords.is_empty() {
            let keywords: Vec<&str> = target
                .exclude_keywords
                .iter()
                .map(KeywordPattern::as_str)
                .collect();
            log.debug(&format!("  exclude_keywords: {keywords:?}"));
        }
        log.debug(&format!("  min_age_s: {}", target.min_age_s));
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::pipeline::test_support::RecordingLog;

    fn target(preset: RenderedPresetConfig) -> RenderedTargetConfig {
        RenderedTargetConfig::new("t", "*", vec![preset])
    }

    #[test]
    fn builtins_and_vars_are_known() {
        let preset = RenderedPresetConfig::new("p", "convert {input_path} {quality} {dest}")
            .with_var("quality", "90");
        let target = target(preset).with_var("dest", "/out");
        assert!(lint(&[target]).is_empty());
    }

    #[test]
    fn output_path_needs_rename() {
        let issues = lint(&[target(RenderedPresetConfig::new("p", "cp {input_path} {output_path}"))]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "command");
        assert_eq!(issues[0].problem, "unknown variable \"output_path\"");

        let renamed = RenderedPresetConfig::new("p", "cp {input_path} {output_path}")
            .with_rename("{parent}/{stem}.bak");
        assert!(lint(&[target(renamed)]).is_empty());
    }

    #[test]
    fn rename_cannot_reference_output_path() {
        let preset = RenderedPresetConfig::new("p", "true").with_rename("{output_path}.x");
        let issues = lint(&[target(preset)]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "rename");
    }

    #[test]
    fn malformed_template_is_reported() {
        let issues = lint(&[target(RenderedPresetConfig::new("p", "echo {name"))]);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].problem.contains("unterminated"));
    }

    #[test]
    fn issue_display_names_location() {
        let issue = TemplateIssue {
            target: "photos".to_string(),
            preset: "thumb".to_string(),
            field: "command",
            problem: "unknown variable \"size\"".to_string(),
        };
        insta::assert_snapshot!(issue.to_string(), @r#"photos/thumb command: unknown variable "size""#);
    }

    #[test]
    fn describe_lists_each_target() {
        let log = RecordingLog::default();
        let targets = vec![
            RenderedTargetConfig::new(
                "a",
                "in/*.jpg",
                vec![RenderedPresetConfig::new("x", "true"), RenderedPresetConfig::new("y", "true")],
            ),
            RenderedTargetConfig::new("b", "in/*.png", vec![RenderedPresetConfig::new("x", "true")]),
        ];
        describe(&targets, &log);
        assert!(log.contains("info: a: in/*.jpg -> x, y"));
        assert!(log.contains("info: b: in/*.png -> x"));
    }

    #[test]
    fn report_serializes_targets_and_issues() {
        let targets = vec![target(RenderedPresetConfig::new("p", "echo {nope}"))];
        let issues = lint(&targets);
        let json = serde_json::to_value(Report {
            targets: &targets,
            issues: &issues,
        })
        .unwrap();
        assert_eq!(json["targets"][0]["name"], "t");
        assert_eq!(json["issues"][0]["problem"], "unknown variable \"nope\"");
    }
}
