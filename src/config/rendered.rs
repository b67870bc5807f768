//! Resolved configuration: each target owns full copies of its presets.
//!
//! [`resolve`] denormalises a validated [`Config`] so later stages never need
//! the presets map.  The resolved values are immutable and rebuilt from
//! scratch on every run.
use std::collections::{BTreeMap, BTreeSet};

use regex::{Regex, RegexBuilder};
use serde::{Serialize, Serializer};

use super::{Config, DEFAULT_MIN_AGE_S};
use crate::error::ConfigError;

/// A preset copied into a target, tagged with its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedPresetConfig {
    /// Name of the preset in the `presets` map.
    pub name: String,
    /// Shell command template.
    pub command: String,
    /// Optional destination path template.
    pub rename: Option<String>,
    /// Preset variables (highest precedence).
    pub vars: BTreeMap<String, String>,
}

impl RenderedPresetConfig {
    /// Create a preset with no rename template and no variables.
    #[must_use]
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            rename: None,
            vars: BTreeMap::new(),
        }
    }

    /// Set the rename template.
    #[must_use]
    pub fn with_rename(mut self, rename: impl Into<String>) -> Self {
        self.rename = Some(rename.into());
        self
    }

    /// Add a variable.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

/// A compiled `exclude_keywords` entry.
///
/// Matching is case-insensitive and unanchored: the keyword excludes a file
/// if it matches anywhere in the file name.
#[derive(Debug, Clone)]
pub struct KeywordPattern {
    regex: Regex,
}

impl KeywordPattern {
    /// Compile `keyword` for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidKeyword`] if `keyword` is not a valid
    /// regular expression.
    pub fn compile(target: &str, keyword: &str) -> Result<Self, ConfigError> {
        RegexBuilder::new(keyword)
            .case_insensitive(true)
            .build()
            .map(|regex| Self { regex })
            .map_err(|e| ConfigError::InvalidKeyword {
                target: target.to_string(),
                keyword: keyword.to_string(),
                message: e.to_string(),
            })
    }

    /// The keyword as written in the configuration.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether the keyword occurs in `file_name`.
    #[must_use]
    pub fn is_match(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name)
    }
}

impl PartialEq for KeywordPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for KeywordPattern {}

impl Serialize for KeywordPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A target with its presets materialised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedTargetConfig {
    /// Name of the target in the `targets` map.
    pub name: String,
    /// Glob pattern.
    pub glob: String,
    /// Normalised (`.lowercase`) extensions a match must have, if any.
    pub include_ext: BTreeSet<String>,
    /// Normalised (`.lowercase`) extensions a match must not have.
    pub exclude_ext: BTreeSet<String>,
    /// Compiled keyword patterns matched against the file name.
    pub exclude_keywords: Vec<KeywordPattern>,
    /// Presets in the order listed on the target.
    pub presets: Vec<RenderedPresetConfig>,
    /// Target variables.
    pub vars: BTreeMap<String, String>,
    /// Minimum seconds since last modification for a file to match.
    pub min_age_s: u64,
}

impl RenderedTargetConfig {
    /// Create a target with no filters and the default minimum age.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        glob: impl Into<String>,
        presets: Vec<RenderedPresetConfig>,
    ) -> Self {
        Self {
            name: name.into(),
            glob: glob.into(),
            include_ext: BTreeSet::new(),
            exclude_ext: BTreeSet::new(),
            exclude_keywords: Vec::new(),
            presets,
            vars: BTreeMap::new(),
            min_age_s: DEFAULT_MIN_AGE_S,
        }
    }

    /// Restrict matches to these extensions.
    #[must_use]
    pub fn with_include_ext<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.include_ext = exts.into_iter().map(|e| normalize_ext(e.as_ref())).collect();
        self
    }

    /// Exclude matches with these extensions.
    #[must_use]
    pub fn with_exclude_ext<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude_ext = exts.into_iter().map(|e| normalize_ext(e.as_ref())).collect();
        self
    }

    /// Exclude matches whose name contains any of these keywords.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidKeyword`] for an invalid pattern.
    pub fn with_exclude_keywords<I, S>(mut self, keywords: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude_keywords = keywords
            .into_iter()
            .map(|k| KeywordPattern::compile(&self.name, k.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    /// Add a variable.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Set the minimum file age in seconds.
    #[must_use]
    pub const fn with_min_age_s(mut self, min_age_s: u64) -> Self {
        self.min_age_s = min_age_s;
        self
    }
}

/// Normalise an extension to lower case with a leading dot.
///
/// `JPEG`, `.JPEG` and `.jpeg` all become `.jpeg`; the empty string stays
/// empty so that it can select files without an extension.
#[must_use]
pub fn normalize_ext(ext: &str) -> String {
    let lower = ext.trim().to_lowercase();
    if lower.is_empty() || lower.starts_with('.') {
        lower
    } else {
        format!(".{lower}")
    }
}

/// Expand `config` into one [`RenderedTargetConfig`] per target.
///
/// Targets keep declaration order and each target's presets keep the order
/// in which the target lists them.
///
/// # Errors
///
/// Fails only if `config` violates an invariant that [`Config::validate`]
/// rejects: an undefined preset name or an invalid keyword.
pub fn resolve(config: &Config) -> Result<Vec<RenderedTargetConfig>, ConfigError> {
    config
        .targets
        .iter()
        .map(|(target_name, target)| {
            let presets = target
                .presets
                .iter()
                .map(|preset_name| {
                    let preset = config.presets.get(preset_name).ok_or_else(|| {
                        ConfigError::UnknownPreset {
                            target: target_name.clone(),
                            preset: preset_name.clone(),
                            known: config.presets.keys().cloned().collect(),
                        }
                    })?;
                    Ok(RenderedPresetConfig {
                        name: preset_name.clone(),
                        command: preset.command.clone(),
                        rename: preset.rename.clone(),
                        vars: preset.vars.clone(),
                    })
                })
                .collect::<Result<Vec<_>, ConfigError>>()?;

            let exclude_keywords = target
                .exclude_keywords
                .iter()
                .map(|k| KeywordPattern::compile(target_name, k))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(RenderedTargetConfig {
                name: target_name.clone(),
                glob: target.glob.clone(),
                include_ext: target.include_ext.iter().map(|e| normalize_ext(e)).collect(),
                exclude_ext: target.exclude_ext.iter().map(|e| normalize_ext(e)).collect(),
                exclude_keywords,
                presets,
                vars: target.vars.clone(),
                min_age_s: target.min_age_s,
            })
        })
        .collect()
}
