use crate::analyzer::Analyzer;
use crate::confirm::DEFAULT_MAX_REFINEMENTS;
use crate::dictionary::{Dictionary, KeywordEntry, UnsupportedConcept};
use crate::error::{IntakeError, Result};
use crate::paths;
use crate::types::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// Refinement limits above this are accepted but flagged.
const UNUSUAL_REFINEMENTS: u32 = 20;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// RefinementConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_REFINEMENTS
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

// ---------------------------------------------------------------------------
// DictionaryConfig / FeasibilityConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DictionaryConfig {
    /// Extra keyword entries keyed by category name (`indicator`, `pattern`,
    /// `strategy_type`, `risk_rule`, `timeframe`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Vec<KeywordEntry>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_concepts: Vec<UnsupportedConcept>,
}

// ---------------------------------------------------------------------------
// OutputConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_analysis_dir")]
    pub analysis_dir: String,
}

fn default_analysis_dir() -> String {
    paths::ANALYSIS_DIR.to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            analysis_dir: default_analysis_dir(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub refinement: RefinementConfig,
    #[serde(default)]
    pub dictionary: DictionaryConfig,
    #[serde(default)]
    pub feasibility: FeasibilityConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            refinement: RefinementConfig::default(),
            dictionary: DictionaryConfig::default(),
            feasibility: FeasibilityConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(IntakeError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Like [`Config::load`], but an uninitialized root yields the defaults.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        match Self::load(root) {
            Err(IntakeError::NotInitialized) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        crate::io::write_yaml(&path, self)
    }

    /// Built-in dictionaries plus the configured extras. Entries under
    /// unknown or non-keyword categories are skipped (see [`Config::validate`]).
    pub fn dictionary(&self) -> Dictionary {
        let mut dictionary = Dictionary::standard();
        for (key, entries) in &self.dictionary.extra {
            let Ok(category) = Category::from_str(key) else {
                continue;
            };
            if category == Category::UnsupportedConcept || !category.is_keyword_category() {
                continue;
            }
            for entry in entries {
                dictionary.extend(category, entry.clone());
            }
        }
        for concept in &self.feasibility.extra_concepts {
            dictionary.add_unsupported(concept.entry.clone(), &concept.workaround);
        }
        dictionary
    }

    pub fn analyzer(&self) -> Result<Analyzer> {
        Analyzer::new(&self.dictionary())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.refinement.max_attempts == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "refinement.max_attempts must be at least 1".to_string(),
            });
        } else if self.refinement.max_attempts > UNUSUAL_REFINEMENTS {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "refinement.max_attempts={} (>{UNUSUAL_REFINEMENTS} is unusual)",
                    self.refinement.max_attempts
                ),
            });
        }

        for (key, entries) in &self.dictionary.extra {
            match Category::from_str(key) {
                Err(_) => warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("unknown category '{key}' in dictionary.extra"),
                }),
                Ok(c) if c == Category::UnsupportedConcept || !c.is_keyword_category() => {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!(
                            "category '{key}' in dictionary.extra is not keyword-driven; \
                             entries are ignored"
                        ),
                    })
                }
                Ok(_) => {}
            }
            for entry in entries {
                if entry.canonical.trim().is_empty() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Error,
                        message: format!("empty canonical keyword in dictionary.extra.{key}"),
                    });
                }
            }
        }

        for concept in &self.feasibility.extra_concepts {
            if concept.entry.canonical.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "empty canonical keyword in feasibility.extra_concepts".to_string(),
                });
            } else if concept.workaround.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "unsupported concept '{}' has no workaround hint",
                        concept.entry.canonical
                    ),
                });
            }
        }

        if self.output.analysis_dir.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "output.analysis_dir must not be empty".to_string(),
            });
        }

        for w in &warnings {
            tracing::warn!(level = ?w.level, "{}", w.message);
        }
        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_from_empty_yaml() {
        let cfg: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.refinement.max_attempts, DEFAULT_MAX_REFINEMENTS);
        assert_eq!(cfg.output.analysis_dir, paths::ANALYSIS_DIR);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn load_requires_init() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(IntakeError::NotInitialized)
        ));
        assert_eq!(Config::load_or_default(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::default();
        cfg.refinement.max_attempts = 3;
        cfg.dictionary.extra.insert(
            "indicator".into(),
            vec![KeywordEntry::new("hull moving average", &["hma"])],
        );
        cfg.save(dir.path()).unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), cfg);
    }

    #[test]
    fn extras_reach_the_analyzer() {
        let yaml = r#"
dictionary:
  extra:
    indicator:
      - canonical: hull moving average
        synonyms: [hma]
feasibility:
  extra_concepts:
    - canonical: dark pool prints
      workaround: approximate with unusual volume spikes
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(cfg.validate().is_empty());
        let analyzer = cfg.analyzer().unwrap();
        let findings = analyzer.analyze("HMA slope filtered by dark pool prints.");
        assert_eq!(
            findings.values(Category::Indicator),
            vec!["hull moving average".to_string()]
        );
        assert_eq!(
            findings.values(Category::UnsupportedConcept),
            vec!["dark pool prints".to_string()]
        );
        assert_eq!(
            analyzer.workaround_for("dark pool prints"),
            Some("approximate with unusual volume spikes")
        );
    }

    #[test]
    fn validate_flags_problems() {
        let yaml = r#"
refinement:
  max_attempts: 0
dictionary:
  extra:
    colour: [{canonical: red}]
    entry_condition: [{canonical: "buy the dip"}]
    pattern: [{canonical: "  "}]
feasibility:
  extra_concepts:
    - canonical: quantum signals
output:
  analysis_dir: ""
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        let warnings = cfg.validate();
        let errors = warnings
            .iter()
            .filter(|w| w.level == WarnLevel::Error)
            .count();
        assert_eq!(errors, 3);
        assert_eq!(warnings.len(), 6);
        assert!(warnings.iter().any(|w| w.message.contains("colour")));
        assert!(warnings.iter().any(|w| w.message.contains("quantum signals")));
    }

    #[test]
    fn ignored_categories_do_not_change_dictionary() {
        let mut cfg = Config::default();
        cfg.dictionary.extra.insert(
            "filter".into(),
            vec![KeywordEntry::new("session filter", &[])],
        );
        assert_eq!(cfg.dictionary(), Dictionary::standard());
    }
}
