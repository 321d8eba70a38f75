//! Missing hardening rule
//!
//! Attractive assets should be hardened. Datastores, application servers,
//! identity providers and ERP systems are held to a lower attractiveness
//! limit than everything else.

use crate::graph::{Confidentiality, Criticality, TechnicalAsset, TechnicalAssetType, Technology, ThreatGraph};
use crate::models::{DataBreachProbability, Risk, RiskCategory, RiskFunction, Stride};
use crate::rules::base::{RiskRule, RuleConfig, RuleContext};
use crate::scoring::{Impact, Likelihood};
use anyhow::Result;
use std::collections::BTreeSet;

const DEFAULT_RAA_LIMIT: f64 = 55.0;
const DEFAULT_RAA_LIMIT_REDUCED: f64 = 40.0;

const CATEGORY: RiskCategory = RiskCategory {
    id: "missing-hardening",
    title: "Missing Hardening",
    description: "Technical assets with a relative attacker attractiveness value of 55 % or higher (40 % for \
        datastores, application servers, identity providers and ERP systems) should be explicitly hardened \
        taking best practices and vendor hardening guides into account.",
    impact: "If this risk remains unmitigated, attackers might be able to easier attack high-value targets.",
    asvs: "V14 - Configuration Verification Requirements",
    cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html",
    action: "System Hardening",
    mitigation: "Try to apply all hardening best practices (like CIS benchmarks, OWASP recommendations, vendor \
        recommendations, DevSec Hardening Framework, DBSAT for Oracle databases, and others).",
    check: "Are recommendations from the linked cheat sheet and referenced ASVS chapter applied?",
    function: RiskFunction::Operations,
    stride: Stride::Tampering,
    detection_logic: "In-scope technical assets with attractiveness of 55 % or higher, or 40 % or higher for \
        datastores, application servers, identity providers and ERP systems.",
    risk_assessment: "The risk rating depends on the sensitivity of the data processed or stored in the \
        technical asset.",
    false_positives: "Usually no false positives.",
    model_failure_possible_reason: false,
    cwe: 16,
};

/// Detects attractive assets that call for explicit hardening
pub struct MissingHardeningRule {
    config: RuleConfig,
    raa_limit: f64,
    raa_limit_reduced: f64,
}

impl MissingHardeningRule {
    pub fn new() -> Self {
        Self::with_config(RuleConfig::new())
    }

    /// Create with custom config (`raa_limit`, `raa_limit_reduced`)
    pub fn with_config(config: RuleConfig) -> Self {
        Self {
            raa_limit: config.get_option_or("raa_limit", DEFAULT_RAA_LIMIT),
            raa_limit_reduced: config.get_option_or("raa_limit_reduced", DEFAULT_RAA_LIMIT_REDUCED),
            config,
        }
    }

    fn has_reduced_limit(asset: &TechnicalAsset) -> bool {
        asset.asset_type == TechnicalAssetType::Datastore
            || matches!(
                asset.technology,
                Technology::ApplicationServer | Technology::IdentityProvider | Technology::Erp
            )
    }

    fn create_risk(graph: &ThreatGraph, asset: &TechnicalAsset) -> Risk {
        let impact = if asset.highest_confidentiality(graph) == Confidentiality::StrictlyConfidential
            || asset.highest_integrity(graph) == Criticality::MissionCritical
        {
            Impact::Medium
        } else {
            Impact::Low
        };
        Risk::new(
            CATEGORY,
            Likelihood::Likely,
            impact,
            format!("Missing Hardening risk at {}", asset.title),
        )
        .for_technical_asset(&asset.id)
        .with_breach(DataBreachProbability::Improbable, [asset.id.as_str()])
        .identified_by(&[&asset.id])
    }
}

impl Default for MissingHardeningRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskRule for MissingHardeningRule {
    fn category(&self) -> RiskCategory {
        CATEGORY
    }

    fn supported_tags(&self) -> BTreeSet<&'static str> {
        BTreeSet::from(["tomcat"])
    }

    fn config(&self) -> Option<&RuleConfig> {
        Some(&self.config)
    }

    fn generate_risks(&self, ctx: &RuleContext) -> Result<Vec<Risk>> {
        let mut risks = Vec::new();
        for asset in ctx.graph.technical_assets().filter(|a| a.is_in_scope()) {
            let score = ctx.attractiveness_of(&asset.id);
            if score >= self.raa_limit
                || (score >= self.raa_limit_reduced && Self::has_reduced_limit(asset))
            {
                risks.push(Self::create_risk(ctx.graph, asset));
            }
        }
        Ok(risks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::scoring::{AttractivenessEstimator, ConstantAttractiveness};

    fn graph() -> ThreatGraph {
        GraphBuilder::new("t")
            .technical_asset(TechnicalAsset::new("app", "App").with_technology(Technology::WebApplication))
            .technical_asset(TechnicalAsset::new("db", "DB").with_type(TechnicalAssetType::Datastore))
            .technical_asset(
                TechnicalAsset::new("vault", "Vault")
                    .with_technology(Technology::Vault)
                    .with_ratings(
                        Confidentiality::StrictlyConfidential,
                        Criticality::Critical,
                        Criticality::Critical,
                    ),
            )
            .build()
            .unwrap()
    }

    fn ids(rule: &MissingHardeningRule, score: f64) -> Vec<String> {
        let graph = graph();
        let scores = ConstantAttractiveness { score }.estimate(&graph);
        rule.generate_risks(&RuleContext::new(&graph, &scores))
            .unwrap()
            .iter()
            .map(|r| r.synthetic_id().to_string())
            .collect()
    }

    #[test]
    fn test_reduced_limit_for_datastores() {
        assert_eq!(
            ids(&MissingHardeningRule::new(), 45.0),
            vec!["missing-hardening@db".to_string()]
        );
        assert_eq!(ids(&MissingHardeningRule::new(), 60.0).len(), 3);
        assert!(ids(&MissingHardeningRule::new(), 30.0).is_empty());
    }

    #[test]
    fn test_impact_follows_data_peaks() {
        let graph = graph();
        let scores = ConstantAttractiveness { score: 90.0 }.estimate(&graph);
        let risks = MissingHardeningRule::new()
            .generate_risks(&RuleContext::new(&graph, &scores))
            .unwrap();
        let vault = risks
            .iter()
            .find(|r| r.most_relevant_technical_asset_id.as_deref() == Some("vault"))
            .unwrap();
        assert_eq!(vault.exploitation_impact(), Impact::Medium);
        assert_eq!(vault.exploitation_likelihood(), Likelihood::Likely);
    }

    #[test]
    fn test_custom_limits_and_tags() {
        let rule = MissingHardeningRule::with_config(
            RuleConfig::new()
                .with_option("raa_limit", serde_json::json!(95))
                .with_option("raa_limit_reduced", serde_json::json!(95)),
        );
        assert!(ids(&rule, 60.0).is_empty());
        assert!(rule.supported_tags().contains("tomcat"));
    }
}
