//! Core data models for archrisk
//!
//! Risk categories, findings (risks) and the small closed enumerations that
//! classify them.

use crate::scoring::{Impact, Likelihood, Severity};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Build a synthetic id: the category id followed by entity ids, joined by `@`.
///
/// The parts are taken in the order given; each rule fixes its own order so
/// the id is stable across runs.
pub fn synthetic_id(category_id: &str, parts: &[&str]) -> String {
    let mut id = String::with_capacity(
        category_id.len() + parts.iter().map(|p| p.len() + 1).sum::<usize>(),
    );
    id.push_str(category_id);
    for part in parts {
        id.push('@');
        id.push_str(part);
    }
    id
}

/// STRIDE threat class
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stride {
    Spoofing,
    Tampering,
    Repudiation,
    InformationDisclosure,
    DenialOfService,
    ElevationOfPrivilege,
}

impl fmt::Display for Stride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stride::Spoofing => write!(f, "spoofing"),
            Stride::Tampering => write!(f, "tampering"),
            Stride::Repudiation => write!(f, "repudiation"),
            Stride::InformationDisclosure => write!(f, "information-disclosure"),
            Stride::DenialOfService => write!(f, "denial-of-service"),
            Stride::ElevationOfPrivilege => write!(f, "elevation-of-privilege"),
        }
    }
}

/// Function responsible for mitigating a risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskFunction {
    BusinessSide,
    Architecture,
    Development,
    Operations,
}

impl fmt::Display for RiskFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskFunction::BusinessSide => write!(f, "business-side"),
            RiskFunction::Architecture => write!(f, "architecture"),
            RiskFunction::Development => write!(f, "development"),
            RiskFunction::Operations => write!(f, "operations"),
        }
    }
}

/// Probability that exploiting a risk leaks data, lowest first
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum DataBreachProbability {
    #[default]
    Improbable,
    Possible,
    Probable,
}

impl fmt::Display for DataBreachProbability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataBreachProbability::Improbable => write!(f, "improbable"),
            DataBreachProbability::Possible => write!(f, "possible"),
            DataBreachProbability::Probable => write!(f, "probable"),
        }
    }
}

/// Disposition of a risk in the tracking overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RiskStatus {
    #[default]
    Unchecked,
    InDiscussion,
    Accepted,
    InProgress,
    Mitigated,
    FalsePositive,
}

impl RiskStatus {
    pub const ALL: [RiskStatus; 6] = [
        RiskStatus::Unchecked,
        RiskStatus::InDiscussion,
        RiskStatus::Accepted,
        RiskStatus::InProgress,
        RiskStatus::Mitigated,
        RiskStatus::FalsePositive,
    ];

    pub fn is_still_at_risk(self) -> bool {
        !matches!(self, RiskStatus::Mitigated | RiskStatus::FalsePositive)
    }
}

impl fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskStatus::Unchecked => write!(f, "unchecked"),
            RiskStatus::InDiscussion => write!(f, "in-discussion"),
            RiskStatus::Accepted => write!(f, "accepted"),
            RiskStatus::InProgress => write!(f, "in-progress"),
            RiskStatus::Mitigated => write!(f, "mitigated"),
            RiskStatus::FalsePositive => write!(f, "false-positive"),
        }
    }
}

impl std::str::FromStr for RiskStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        RiskStatus::ALL
            .into_iter()
            .find(|status| status.to_string() == normalized)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown status '{}'. Valid values: unchecked, in-discussion, accepted, in-progress, mitigated, false-positive",
                    s
                )
            })
    }
}

/// Static metadata of a risk rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskCategory {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub impact: &'static str,
    pub asvs: &'static str,
    pub cheat_sheet: &'static str,
    pub action: &'static str,
    pub mitigation: &'static str,
    pub check: &'static str,
    pub function: RiskFunction,
    pub stride: Stride,
    pub detection_logic: &'static str,
    pub risk_assessment: &'static str,
    pub false_positives: &'static str,
    /// Findings of this category point at an incomplete model rather than
    /// a weakness of the modeled system
    pub model_failure_possible_reason: bool,
    pub cwe: u32,
}

fn serialize_category_id<S: Serializer>(category: &RiskCategory, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(category.id)
}

/// A risk found by a rule
///
/// Severity is derived from likelihood and impact on construction and cannot
/// be set independently. The synthetic id is set once via
/// [`Risk::identified_by`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Risk {
    #[serde(serialize_with = "serialize_category_id")]
    pub category: RiskCategory,
    severity: Severity,
    exploitation_likelihood: Likelihood,
    exploitation_impact: Impact,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_relevant_data_asset_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_relevant_technical_asset_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_relevant_communication_link_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_relevant_trust_boundary_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_relevant_shared_runtime_id: Option<String>,
    pub data_breach_probability: DataBreachProbability,
    pub data_breach_technical_asset_ids: Vec<String>,
    synthetic_id: String,
}

impl Risk {
    pub fn new(
        category: RiskCategory,
        likelihood: Likelihood,
        impact: Impact,
        title: impl Into<String>,
    ) -> Self {
        Self {
            category,
            severity: Severity::calculate(likelihood, impact),
            exploitation_likelihood: likelihood,
            exploitation_impact: impact,
            title: title.into(),
            most_relevant_data_asset_id: None,
            most_relevant_technical_asset_id: None,
            most_relevant_communication_link_id: None,
            most_relevant_trust_boundary_id: None,
            most_relevant_shared_runtime_id: None,
            data_breach_probability: DataBreachProbability::Improbable,
            data_breach_technical_asset_ids: Vec::new(),
            synthetic_id: category.id.to_string(),
        }
    }

    pub fn for_technical_asset(mut self, id: impl Into<String>) -> Self {
        self.most_relevant_technical_asset_id = Some(id.into());
        self
    }

    pub fn for_communication_link(mut self, id: impl Into<String>) -> Self {
        self.most_relevant_communication_link_id = Some(id.into());
        self
    }

    pub fn for_data_asset(mut self, id: impl Into<String>) -> Self {
        self.most_relevant_data_asset_id = Some(id.into());
        self
    }

    pub fn for_trust_boundary(mut self, id: impl Into<String>) -> Self {
        self.most_relevant_trust_boundary_id = Some(id.into());
        self
    }

    pub fn for_shared_runtime(mut self, id: impl Into<String>) -> Self {
        self.most_relevant_shared_runtime_id = Some(id.into());
        self
    }

    /// Set the breach probability and the assets put at breach risk.
    /// Asset ids are sorted and deduplicated.
    pub fn with_breach<I, S>(mut self, probability: DataBreachProbability, asset_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ids: Vec<String> = asset_ids.into_iter().map(Into::into).collect();
        ids.sort();
        ids.dedup();
        self.data_breach_probability = probability;
        self.data_breach_technical_asset_ids = ids;
        self
    }

    /// Set the synthetic id from the category id and the given entity ids
    pub fn identified_by(mut self, parts: &[&str]) -> Self {
        self.synthetic_id = synthetic_id(self.category.id, parts);
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn exploitation_likelihood(&self) -> Likelihood {
        self.exploitation_likelihood
    }

    pub fn exploitation_impact(&self) -> Impact {
        self.exploitation_impact
    }

    pub fn synthetic_id(&self) -> &str {
        &self.synthetic_id
    }

    pub fn is_model_failure(&self) -> bool {
        self.category.model_failure_possible_reason
    }
}

/// Summary of risks by severity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub critical: usize,
    pub high: usize,
    pub elevated: usize,
    pub medium: usize,
    pub low: usize,
    pub total: usize,
}

impl RiskSummary {
    pub fn from_risks<'a>(risks: impl IntoIterator<Item = &'a Risk>) -> Self {
        let mut summary = Self::default();
        for risk in risks {
            match risk.severity() {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Elevated => summary.elevated += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }
            summary.total += 1;
        }
        summary
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Elevated => self.elevated,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub const TEST_CATEGORY: RiskCategory = RiskCategory {
        id: "test-category",
        title: "Test Category",
        description: "",
        impact: "",
        asvs: "",
        cheat_sheet: "",
        action: "",
        mitigation: "",
        check: "",
        function: RiskFunction::Architecture,
        stride: Stride::Tampering,
        detection_logic: "",
        risk_assessment: "",
        false_positives: "",
        model_failure_possible_reason: false,
        cwe: 0,
    };
}

#[cfg(test)]
mod tests {
    use super::test_support::TEST_CATEGORY;
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_synthetic_id_format() {
        assert_eq!(synthetic_id("cat", &["a", "b"]), "cat@a@b");
        assert_eq!(synthetic_id("cat", &[]), "cat");
    }

    #[test]
    fn test_risk_severity_follows_matrix() {
        let risk = Risk::new(TEST_CATEGORY, Likelihood::Likely, Impact::High, "t")
            .for_technical_asset("a")
            .identified_by(&["a"]);
        assert_eq!(risk.severity(), Severity::Elevated);
        assert_eq!(risk.synthetic_id(), "test-category@a");
        assert!(!risk.is_model_failure());
    }

    #[test]
    fn test_breach_ids_sorted_and_deduplicated() {
        let risk = Risk::new(TEST_CATEGORY, Likelihood::Unlikely, Impact::Low, "t")
            .with_breach(DataBreachProbability::Possible, ["b", "a", "b"]);
        assert_eq!(risk.data_breach_technical_asset_ids, vec!["a", "b"]);
    }

    #[test]
    fn test_status_parsing_and_risk_flag() {
        assert_eq!(RiskStatus::from_str("false_positive").unwrap(), RiskStatus::FalsePositive);
        assert_eq!(RiskStatus::from_str("In-Progress").unwrap(), RiskStatus::InProgress);
        assert!(RiskStatus::from_str("done").is_err());
        assert!(RiskStatus::Accepted.is_still_at_risk());
        assert!(!RiskStatus::Mitigated.is_still_at_risk());
        assert!(!RiskStatus::FalsePositive.is_still_at_risk());
    }

    #[test]
    fn test_summary_counts() {
        let risks = vec![
            Risk::new(TEST_CATEGORY, Likelihood::Frequent, Impact::VeryHigh, "a"),
            Risk::new(TEST_CATEGORY, Likelihood::Unlikely, Impact::Low, "b"),
            Risk::new(TEST_CATEGORY, Likelihood::Unlikely, Impact::Low, "c"),
        ];
        let summary = RiskSummary::from_risks(&risks);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.low, 2);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.count(Severity::Low), 2);
    }

    #[test]
    fn test_risk_serializes_category_id() {
        let risk = Risk::new(TEST_CATEGORY, Likelihood::Likely, Impact::Medium, "t")
            .identified_by(&["x"]);
        let json = serde_json::to_value(&risk).unwrap();
        assert_eq!(json["category"], "test-category");
        assert_eq!(json["severity"], "elevated");
        assert_eq!(json["synthetic_id"], "test-category@x");
        assert!(json.get("most_relevant_data_asset_id").is_none());
    }
}
