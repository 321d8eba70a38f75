//! Project-level configuration support
//!
//! Loads per-project configuration from `archrisk.toml` or `.archriskrc.json`
//! in the directory holding the model.
//!
//! # Configuration Format
//!
//! ```toml
//! # archrisk.toml
//!
//! [rules.missing-hardening]
//! thresholds = { raa_limit = 60, raa_limit_reduced = 45 }
//!
//! [rules.incomplete-model]
//! enabled = false
//!
//! [attractiveness]
//! estimator = "weighted"   # weighted, random, constant
//! seed = 42
//!
//! [tracking]
//! file = "risk-tracking.json"
//!
//! [defaults]
//! format = "text"
//! severity = "medium"
//! workers = 8
//! fail_on = "high"
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name of the tracking overlay when none is configured
pub const DEFAULT_TRACKING_FILE: &str = "archrisk-tracking.json";

/// Project-level configuration loaded from archrisk.toml or similar
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProjectConfig {
    /// Per-rule configuration overrides
    #[serde(default)]
    pub rules: HashMap<String, RuleConfigOverride>,

    /// Attractiveness estimator selection
    #[serde(default)]
    pub attractiveness: AttractivenessConfig,

    /// Risk tracking overlay location
    #[serde(default)]
    pub tracking: TrackingConfig,

    /// Default CLI flags
    #[serde(default)]
    pub defaults: CliDefaults,
}

/// Configuration override for a specific rule
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RuleConfigOverride {
    /// Whether the rule is enabled (default: true)
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Rule-specific threshold overrides
    /// Keys depend on the rule (e.g., raa_limit, min_attractiveness)
    #[serde(default)]
    pub thresholds: HashMap<String, ThresholdValue>,
}

/// A threshold value can be an integer, float, boolean or string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ThresholdValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
}

impl ThresholdValue {
    /// Convert into a JSON value for rule options
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ThresholdValue::Integer(v) => serde_json::json!(v),
            ThresholdValue::Float(v) => serde_json::json!(v),
            ThresholdValue::Boolean(v) => serde_json::json!(v),
            ThresholdValue::String(v) => serde_json::json!(v),
        }
    }
}

/// Which attractiveness estimator to run
#[derive(Debug, Clone, Deserialize)]
pub struct AttractivenessConfig {
    /// weighted (default), random or constant
    #[serde(default = "default_estimator")]
    pub estimator: String,

    /// Seed for the random estimator
    #[serde(default)]
    pub seed: u64,
}

impl Default for AttractivenessConfig {
    fn default() -> Self {
        Self {
            estimator: default_estimator(),
            seed: 0,
        }
    }
}

fn default_estimator() -> String {
    "weighted".to_string()
}

/// Tracking overlay configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TrackingConfig {
    /// Overlay file, relative to the model directory
    #[serde(default)]
    pub file: Option<String>,
}

/// Default CLI flags that can be set in project config
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CliDefaults {
    /// Default output format (text, json)
    #[serde(default)]
    pub format: Option<String>,

    /// Default minimum severity filter
    #[serde(default)]
    pub severity: Option<String>,

    /// Default number of workers
    #[serde(default)]
    pub workers: Option<usize>,

    /// Skip rules by default
    #[serde(default)]
    pub skip_rules: Vec<String>,

    /// Fail-on severity threshold for CI
    #[serde(default)]
    pub fail_on: Option<String>,
}

/// Load project configuration from the model directory.
///
/// Searches for configuration files in this order:
/// 1. `archrisk.toml`
/// 2. `.archriskrc.json`
///
/// Returns default configuration if no config file is found or the file
/// cannot be parsed.
pub fn load_project_config(model_dir: &Path) -> ProjectConfig {
    // Try TOML first (preferred format)
    let toml_path = model_dir.join("archrisk.toml");
    if toml_path.exists() {
        match load_toml_config(&toml_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", toml_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", toml_path.display(), e);
            }
        }
    }

    let json_path = model_dir.join(".archriskrc.json");
    if json_path.exists() {
        match load_json_config(&json_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", json_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", json_path.display(), e);
            }
        }
    }

    debug!("No project config found, using defaults");
    ProjectConfig::default()
}

/// Load configuration from a TOML file
fn load_toml_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Load configuration from a JSON file
fn load_json_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = serde_json::from_str(&content)?;
    Ok(config)
}

impl ProjectConfig {
    fn rule_override(&self, name: &str) -> Option<&RuleConfigOverride> {
        let normalized = normalize_rule_name(name);
        self.rules.get(name).or_else(|| {
            self.rules
                .iter()
                .find(|(key, _)| normalize_rule_name(key) == normalized)
                .map(|(_, config)| config)
        })
    }

    /// Check if a rule is enabled (defaults to true if not specified)
    pub fn is_rule_enabled(&self, name: &str) -> bool {
        let normalized = normalize_rule_name(name);
        if self
            .defaults
            .skip_rules
            .iter()
            .any(|skipped| normalize_rule_name(skipped) == normalized)
        {
            return false;
        }
        self.rule_override(name)
            .and_then(|c| c.enabled)
            .unwrap_or(true)
    }

    /// All thresholds of a rule as JSON options
    pub fn rule_options(&self, rule_name: &str) -> HashMap<String, serde_json::Value> {
        self.rule_override(rule_name)
            .map(|c| {
                c.thresholds
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Tracking overlay path for a model living in `model_dir`
    pub fn tracking_path(&self, model_dir: &Path) -> PathBuf {
        model_dir.join(
            self.tracking
                .file
                .as_deref()
                .unwrap_or(DEFAULT_TRACKING_FILE),
        )
    }
}

/// Normalize rule name for config lookup
/// Converts various formats to kebab-case for matching
pub fn normalize_rule_name(name: &str) -> String {
    // MissingVaultIsolationRule -> missing-vault-isolation
    // WAFRule -> waf
    // missing_vault -> missing-vault
    // missing-vault -> missing-vault

    let mut result = String::new();
    let chars: Vec<char> = name.trim().chars().collect();

    for (i, c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_is_lower = i > 0 && chars[i - 1].is_lowercase();
            let is_acronym_end = i > 0
                && chars[i - 1].is_uppercase()
                && i + 1 < chars.len()
                && chars[i + 1].is_lowercase();

            if prev_is_lower || is_acronym_end {
                result.push('-');
            }
            result.extend(c.to_lowercase());
        } else if *c == '_' {
            result.push('-');
        } else {
            result.push(*c);
        }
    }

    result.trim_end_matches("-rule").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_rule_name() {
        assert_eq!(
            normalize_rule_name("MissingVaultIsolationRule"),
            "missing-vault-isolation"
        );
        assert_eq!(normalize_rule_name("missing_vault"), "missing-vault");
        assert_eq!(normalize_rule_name("missing-vault"), "missing-vault");
        assert_eq!(normalize_rule_name("MissingWAFRule"), "missing-waf");
    }

    #[test]
    fn test_threshold_value() {
        assert_eq!(ThresholdValue::Integer(42).to_json(), serde_json::json!(42));
        assert_eq!(ThresholdValue::Float(2.5).to_json(), serde_json::json!(2.5));
        assert_eq!(ThresholdValue::Boolean(true).to_json(), serde_json::json!(true));
        assert_eq!(
            ThresholdValue::String("strict".into()).to_json(),
            serde_json::json!("strict")
        );
    }

    #[test]
    fn test_default_config() {
        let config = ProjectConfig::default();
        assert!(config.is_rule_enabled("missing-vault"));
        assert!(config.rule_options("missing-hardening").is_empty());
        assert_eq!(config.attractiveness.estimator, "weighted");
        assert_eq!(
            config.tracking_path(Path::new("/models")),
            PathBuf::from("/models").join(DEFAULT_TRACKING_FILE)
        );
    }

    #[test]
    fn test_parse_toml_config() {
        let toml_content = r#"
[rules.missing-hardening]
thresholds = { raa_limit = 60, raa_limit_reduced = 45.5 }

[rules.incomplete_model]
enabled = false

[attractiveness]
estimator = "random"
seed = 9

[tracking]
file = "tracking.json"

[defaults]
format = "json"
workers = 4
skip_rules = ["MissingWafRule"]
fail_on = "high"
"#;

        let config: ProjectConfig = toml::from_str(toml_content).unwrap();

        assert!(config.is_rule_enabled("missing-hardening"));
        assert!(!config.is_rule_enabled("incomplete_model"));
        assert!(!config.is_rule_enabled("missing-waf"));
        let options = config.rule_options("missing-hardening");
        assert_eq!(options.len(), 2);
        assert_eq!(options.get("raa_limit"), Some(&serde_json::json!(60)));
        assert_eq!(
            config.rule_options("MissingHardeningRule").get("raa_limit_reduced"),
            Some(&serde_json::json!(45.5))
        );
        assert_eq!(config.attractiveness.seed, 9);
        assert_eq!(config.defaults.workers, Some(4));
        assert_eq!(config.defaults.fail_on.as_deref(), Some("high"));
    }

    #[test]
    fn test_broken_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("archrisk.toml"), "rules = 3 [").unwrap();
        std::fs::write(
            dir.path().join(".archriskrc.json"),
            r#"{"defaults": {"format": "json"}}"#,
        )
        .unwrap();

        let config = load_project_config(dir.path());
        assert_eq!(config.defaults.format.as_deref(), Some("json"));

        let empty = TempDir::new().unwrap();
        let config = load_project_config(empty.path());
        assert!(config.rules.is_empty());
    }
}
