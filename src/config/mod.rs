//! Human-authored configuration: YAML schema, parsing, and validation.
//!
//! A document has two top-level keys:
//!
//! ```yaml
//! presets:
//!   thumbnail:
//!     command: convert {input_path} -resize 256 {output_path}
//!     rename: "{parent}/thumbs/{stem}.jpg"
//! targets:
//!   photos:
//!     glob: "/srv/photos/**/*"
//!     include_ext: [.jpg, .png]
//!     presets: [thumbnail]
//! ```
//!
//! Unknown keys are rejected at every level.  [`Config::validate`] links each
//! target to its presets; [`rendered::resolve`] turns a validated config into
//! the self-contained form consumed by the pipeline.
pub mod rendered;
pub mod source;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default minimum file age, in seconds, before a file is considered a match.
pub const DEFAULT_MIN_AGE_S: u64 = 60;

const fn default_min_age_s() -> u64 {
    DEFAULT_MIN_AGE_S
}

/// A reusable command template, referenced by name from targets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PresetConfig {
    /// Shell command template rendered against the templating context.
    pub command: String,
    /// Optional destination path template.  Its rendering is exposed as
    /// `output_path`; the command does not run if that path already exists.
    #[serde(default)]
    pub rename: Option<String>,
    /// Extra variables; these override every other variable.
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
}

/// A glob pattern plus filters and the presets to apply to every match.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Glob pattern; `**` matches across directory boundaries.
    pub glob: String,
    /// Only match files with one of these extensions.
    #[serde(default)]
    pub include_ext: BTreeSet<String>,
    /// Never match files with one of these extensions.
    #[serde(default)]
    pub exclude_ext: BTreeSet<String>,
    /// Case-insensitive patterns; a file whose name contains a match is excluded.
    #[serde(default)]
    pub exclude_keywords: BTreeSet<String>,
    /// Names of presets applied to each match, in order.  Must be non-empty.
    pub presets: Vec<String>,
    /// Extra variables; overridden by preset variables.
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
    /// Minimum seconds since last modification for a file to match.
    #[serde(default = "default_min_age_s")]
    pub min_age_s: u64,
}

/// The whole configuration document.
///
/// Both maps keep declaration order so targets are processed in the order
/// they were written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Presets by name.
    #[serde(default)]
    pub presets: IndexMap<String, PresetConfig>,
    /// Targets by name.
    #[serde(default)]
    pub targets: IndexMap<String, TargetConfig>,
}

impl Config {
    /// Parse and validate a YAML document.
    ///
    /// `source_name` identifies the document in error messages.  An empty
    /// document is an empty configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed YAML or schema violations
    /// and any error reported by [`Config::validate`].
    pub fn from_yaml_str(content: &str, source_name: &str) -> Result<Self, ConfigError> {
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })?
        };
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate the YAML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if the file does not exist,
    /// [`ConfigError::Io`] if it cannot be read, and any parse or validation
    /// error from [`Config::from_yaml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content, &path.display().to_string())
    }

    /// Check the cross-references the schema alone cannot express.
    ///
    /// Every target must list at least one preset, every listed preset must
    /// be defined, and its glob and keywords must be valid patterns.
    ///
    /// # Errors
    ///
    /// Returns the first violation found, in target declaration order.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (target_name, target) in &self.targets {
            if target.presets.is_empty() {
                return Err(ConfigError::EmptyPresets {
                    target: target_name.clone(),
                });
            }
            for preset in &target.presets {
                if !self.presets.contains_key(preset) {
                    return Err(ConfigError::UnknownPreset {
                        target: target_name.clone(),
                        preset: preset.clone(),
                        known: self.presets.keys().cloned().collect(),
                    });
                }
            }
            glob::Pattern::new(&target.glob).map_err(|e| ConfigError::InvalidGlob {
                target: target_name.clone(),
                glob: target.glob.clone(),
                message: e.to_string(),
            })?;
            for keyword in &target.exclude_keywords {
                rendered::KeywordPattern::compile(target_name, keyword)?;
            }
        }
        Ok(())
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

    const VALID: &str = r#"
presets:
  thumbnail:
    command: convert {input_path} {output_path}
    rename: "{parent}/thumbs/{stem}.jpg"
    vars:
      size: "256"
  archive:
    command: mv {input_path} /archive
targets:
  photos:
    glob: /srv/photos/**/*
    include_ext: [.jpg, .png]
    presets: [thumbnail, archive]
  scans:
    glob: /srv/scans/*
    exclude_keywords: [draft]
    presets: [archive]
    min_age_s: 0
"#;

    #[test]
    fn parses_valid_document() {
        let config = Config::from_yaml_str(VALID, "<test>").unwrap();
        assert_eq!(config.presets.len(), 2);
        assert_eq!(config.targets.len(), 2);
        let thumbnail = &config.presets["thumbnail"];
        assert_eq!(thumbnail.rename.as_deref(), Some("{parent}/thumbs/{stem}.jpg"));
        assert_eq!(thumbnail.vars["size"], "256");
    }

    #[test]
    fn preserves_declaration_order() {
        let config = Config::from_yaml_str(VALID, "<test>").unwrap();
        let targets: Vec<&str> = config.targets.keys().map(String::as_str).collect();
        assert_eq!(targets, ["photos", "scans"]);
        let presets: Vec<&str> = config.presets.keys().map(String::as_str).collect();
        assert_eq!(presets, ["thumbnail", "archive"]);
    }

    #[test]
    fn applies_defaults() {
        let config = Config::from_yaml_str(VALID, "<test>").unwrap();
        let photos = &config.targets["photos"];
        assert_eq!(photos.min_age_s, DEFAULT_MIN_AGE_S);
        assert!(photos.exclude_ext.is_empty());
        assert!(photos.vars.is_empty());
        assert_eq!(config.targets["scans"].min_age_s, 0);
        assert!(config.presets["archive"].rename.is_none());
    }

    #[test]
    fn empty_document_is_empty_config() {
        let config = Config::from_yaml_str("  \n", "<test>").unwrap();
        assert!(config.presets.is_empty());
        assert!(config.targets.is_empty());
    }

    #[test]
    fn rejects_unknown_top_level_key() {
        let err = Config::from_yaml_str("presets: {}\nextra: 1\n", "cfg.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got {err:?}");
        assert!(err.to_string().contains("extra"), "got {err}");
        assert!(err.to_string().contains("cfg.yaml"), "got {err}");
    }

    #[test]
    fn rejects_unknown_preset_field() {
        let doc = "presets:\n  p:\n    command: x\n    comand: y\n";
        let err = Config::from_yaml_str(doc, "<test>").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got {err:?}");
    }

    #[test]
    fn rejects_unknown_target_field() {
        let doc = "presets:\n  p:\n    command: x\ntargets:\n  t:\n    glob: '*'\n    presets: [p]\n    min_age: 5\n";
        let err = Config::from_yaml_str(doc, "<test>").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got {err:?}");
        assert!(err.to_string().contains("min_age"), "got {err}");
    }

    #[test]
    fn rejects_missing_command() {
        let doc = "presets:\n  p:\n    rename: x\n";
        let err = Config::from_yaml_str(doc, "<test>").unwrap_err();
        assert!(err.to_string().contains("command"), "got {err}");
    }

    #[test]
    fn rejects_missing_presets_list() {
        let doc = "presets:\n  p:\n    command: x\ntargets:\n  t:\n    glob: '*'\n";
        let err = Config::from_yaml_str(doc, "<test>").unwrap_err();
        assert!(err.to_string().contains("presets"), "got {err}");
    }

    #[test]
    fn rejects_negative_min_age() {
        let doc = "presets:\n  p:\n    command: x\ntargets:\n  t:\n    glob: '*'\n    presets: [p]\n    min_age_s: -5\n";
        let err = Config::from_yaml_str(doc, "<test>").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got {err:?}");
    }

    #[test]
    fn rejects_empty_preset_list() {
        let doc = "presets:\n  p:\n    command: x\ntargets:\n  t:\n    glob: '*'\n    presets: []\n";
        let err = Config::from_yaml_str(doc, "<test>").unwrap_err();
        assert!(
            matches!(err, ConfigError::EmptyPresets { ref target } if target == "t"),
            "got {err:?}"
        );
    }

    #[test]
    fn rejects_undefined_preset_naming_target_and_preset() {
        let doc = "presets:\n  p:\n    command: x\ntargets:\n  t:\n    glob: '*'\n    presets: [p, missing]\n";
        let err = Config::from_yaml_str(doc, "<test>").unwrap_err();
        match &err {
            ConfigError::UnknownPreset {
                target,
                preset,
                known,
            } => {
                assert_eq!(target, "t");
                assert_eq!(preset, "missing");
                assert_eq!(known, &vec!["p".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let message = err.to_string();
        assert!(message.contains("\"t\"") && message.contains("\"missing\""));
    }

    #[test]
    fn rejects_invalid_keyword_pattern() {
        let doc = "presets:\n  p:\n    command: x\ntargets:\n  t:\n    glob: '*'\n    presets: [p]\n    exclude_keywords: ['(']\n";
        let err = Config::from_yaml_str(doc, "<test>").unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidKeyword { .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn rejects_invalid_glob() {
        let doc = "presets:\n  p:\n    command: x\ntargets:\n  t:\n    glob: 'a/***'\n    presets: [p]\n";
        let err = Config::from_yaml_str(doc, "<test>").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidGlob { .. }), "got {err:?}");
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }), "got {err:?}");
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ffm.yaml");
        std::fs::write(&path, VALID).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.targets.len(), 2);
    }
}
