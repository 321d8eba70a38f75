//! Base rule trait and types
//!
//! This module defines the core abstractions for risk rules:
//! - `RiskRule` trait that every rule implements
//! - `RuleContext` handed to each rule
//! - `RuleResult` for capturing execution results
//! - `RuleConfig` for threshold overrides

use crate::graph::ThreatGraph;
use crate::models::{Risk, RiskCategory};
use crate::scoring::{AttractivenessScores, Severity};
use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Everything a rule may read while generating risks
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub graph: &'a ThreatGraph,
    pub attractiveness: &'a AttractivenessScores,
}

impl<'a> RuleContext<'a> {
    pub fn new(graph: &'a ThreatGraph, attractiveness: &'a AttractivenessScores) -> Self {
        Self {
            graph,
            attractiveness,
        }
    }

    /// Attractiveness of a technical asset (0 for unknown ids)
    pub fn attractiveness_of(&self, asset_id: &str) -> f64 {
        self.attractiveness.get(asset_id)
    }
}

/// Result from running a single rule
#[derive(Debug, Clone)]
pub struct RuleResult {
    /// Category id of the rule that produced these results
    pub rule_id: String,
    /// Risks produced by the rule
    pub risks: Vec<Risk>,
    /// Execution time in milliseconds
    pub duration_ms: u64,
    /// Whether the rule completed successfully
    pub success: bool,
    /// Error message if the rule failed
    pub error: Option<String>,
}

impl RuleResult {
    /// Create a successful result
    pub fn success(rule_id: String, risks: Vec<Risk>, duration_ms: u64) -> Self {
        Self {
            rule_id,
            risks,
            duration_ms,
            success: true,
            error: None,
        }
    }

    /// Create a failed result
    pub fn failure(rule_id: String, error: String, duration_ms: u64) -> Self {
        Self {
            rule_id,
            risks: Vec::new(),
            duration_ms,
            success: false,
            error: Some(error),
        }
    }
}

/// Configuration options for rules
#[derive(Debug, Clone, Default)]
pub struct RuleConfig {
    /// Rule-specific thresholds and options
    pub options: HashMap<String, serde_json::Value>,
}

impl RuleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom option
    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Get a typed option value
    pub fn get_option<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.options
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Get an option with a default value
    pub fn get_option_or<T: serde::de::DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get_option(key).unwrap_or(default)
    }
}

impl From<HashMap<String, serde_json::Value>> for RuleConfig {
    fn from(options: HashMap<String, serde_json::Value>) -> Self {
        Self { options }
    }
}

/// Trait for all risk rules
///
/// A rule scans the model for one kind of weakness and emits zero or more
/// risks. Rules are pure: they never mutate the graph, keep no state between
/// calls, and do not depend on other rules having run.
///
/// # Example Implementation
///
/// ```ignore
/// pub struct MyRule;
///
/// impl RiskRule for MyRule {
///     fn category(&self) -> RiskCategory {
///         MY_CATEGORY
///     }
///
///     fn generate_risks(&self, ctx: &RuleContext) -> Result<Vec<Risk>> {
///         let mut risks = Vec::new();
///         for asset in ctx.graph.technical_assets() {
///             // ...
///         }
///         Ok(risks)
///     }
/// }
/// ```
pub trait RiskRule: Send + Sync {
    /// Static metadata; never touches the graph
    fn category(&self) -> RiskCategory;

    /// Asset or link tags this rule specifically recognizes
    fn supported_tags(&self) -> BTreeSet<&'static str> {
        BTreeSet::new()
    }

    /// Scan the model and return the risks found
    fn generate_risks(&self, ctx: &RuleContext) -> Result<Vec<Risk>>;

    /// Unique identifier: the category id
    fn id(&self) -> &'static str {
        self.category().id
    }

    /// Get the configuration for this rule
    fn config(&self) -> Option<&RuleConfig> {
        None
    }
}

/// Progress callback for rule execution
pub type ProgressCallback = Box<dyn Fn(&str, usize, usize) + Send + Sync>;

/// Summary statistics from running all rules
#[derive(Debug, Clone, Default)]
pub struct EvaluationSummary {
    /// Total number of rules run
    pub rules_run: usize,
    /// Number of rules that succeeded
    pub rules_succeeded: usize,
    /// Number of rules that failed
    pub rules_failed: usize,
    /// Total risks across all rules
    pub total_risks: usize,
    /// Risks by severity
    pub by_severity: BTreeMap<Severity, usize>,
    /// Total execution time in milliseconds
    pub total_duration_ms: u64,
}

impl EvaluationSummary {
    /// Update summary with a rule result
    pub fn add_result(&mut self, result: &RuleResult) {
        self.rules_run += 1;
        self.total_duration_ms += result.duration_ms;

        if result.success {
            self.rules_succeeded += 1;
            self.total_risks += result.risks.len();

            for risk in &result.risks {
                *self.by_severity.entry(risk.severity()).or_insert(0) += 1;
            }
        } else {
            self.rules_failed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::TEST_CATEGORY;
    use crate::scoring::{Impact, Likelihood};

    #[test]
    fn test_rule_config() {
        let config = RuleConfig::new().with_option("raa_limit", serde_json::json!(40));

        assert_eq!(config.get_option::<i32>("raa_limit"), Some(40));
        assert_eq!(config.get_option_or("raa_limit", 10.0), 40.0);
        assert_eq!(config.get_option_or("missing", 5), 5);
    }

    #[test]
    fn test_rule_result_success() {
        let result = RuleResult::success("r".to_string(), vec![], 100);
        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(result.duration_ms, 100);
    }

    #[test]
    fn test_rule_result_failure() {
        let result = RuleResult::failure("r".to_string(), "oops".to_string(), 50);
        assert!(!result.success);
        assert_eq!(result.error, Some("oops".to_string()));
    }

    #[test]
    fn test_evaluation_summary() {
        let mut summary = EvaluationSummary::default();

        let risk = Risk::new(TEST_CATEGORY, Likelihood::Likely, Impact::High, "t");
        let result1 = RuleResult::success("r1".to_string(), vec![risk], 100);
        let result2 = RuleResult::failure("r2".to_string(), "err".to_string(), 50);

        summary.add_result(&result1);
        summary.add_result(&result2);

        assert_eq!(summary.rules_run, 2);
        assert_eq!(summary.rules_succeeded, 1);
        assert_eq!(summary.rules_failed, 1);
        assert_eq!(summary.total_risks, 1);
        assert_eq!(summary.by_severity.get(&Severity::Elevated), Some(&1));
        assert_eq!(summary.total_duration_ms, 150);
    }
}
