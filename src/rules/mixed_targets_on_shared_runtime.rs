//! Mixed targets on shared runtime rule
//!
//! A shared runtime hosting assets from different trust boundaries, or
//! mixing purely frontend with purely backend assets, lets an attacker
//! hop from the weakest member to the most valuable one.

use crate::graph::{Confidentiality, Criticality, SharedRuntime, TechnicalAsset, ThreatGraph};
use crate::models::{DataBreachProbability, Risk, RiskCategory, RiskFunction, Stride};
use crate::rules::base::{RiskRule, RuleContext};
use crate::scoring::{Impact, Likelihood};
use anyhow::Result;
use std::collections::BTreeSet;

const CATEGORY: RiskCategory = RiskCategory {
    id: "mixed-targets-on-shared-runtime",
    title: "Mixed Targets on Shared Runtime",
    description: "Different attacker targets (like frontend and backend/datastore components) should not be \
        running on the same shared (underlying) runtime.",
    impact: "If this risk is unmitigated, attackers successfully attacking other components of the system \
        might have an easy path towards more valuable targets, as they are running on the same shared runtime.",
    asvs: "V1 - Architecture, Design and Threat Modeling Requirements",
    cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html",
    action: "Runtime Separation",
    mitigation: "Use separate runtime environments for running different target components or apply similar \
        separation styles to prevent load- or breach-related problems originating from one more \
        attacker-facing asset impacting also the other more critical rated backend/datastore assets.",
    check: "Are recommendations from the linked cheat sheet and referenced ASVS chapter applied?",
    function: RiskFunction::Operations,
    stride: Stride::ElevationOfPrivilege,
    detection_logic: "Shared runtime running technical assets of different trust-boundaries is at risk. Also \
        mixing backend/datastore with frontend components on the same shared runtime is considered a risk.",
    risk_assessment: "The risk rating (low or medium) depends on the confidentiality, integrity, and \
        availability rating of the technical asset running on the shared runtime.",
    false_positives: "When all assets running on the shared runtime are hardened and protected to the same \
        extent as if all were containing/processing highly sensitive data.",
    model_failure_possible_reason: false,
    cwe: 1008,
};

/// Detects shared runtimes hosting targets of different value
pub struct MixedTargetsOnSharedRuntimeRule;

impl MixedTargetsOnSharedRuntimeRule {
    pub fn new() -> Self {
        Self
    }

    fn members<'a>(graph: &'a ThreatGraph, runtime: &SharedRuntime) -> Vec<&'a TechnicalAsset> {
        runtime
            .technical_assets_running
            .iter()
            .filter_map(|id| graph.technical_asset(id))
            .collect()
    }

    fn is_mixed(members: &[&TechnicalAsset]) -> bool {
        let boundaries: BTreeSet<Option<&str>> = members
            .iter()
            .map(|asset| asset.trust_boundary_id.as_deref())
            .collect();
        let has_frontend = members
            .iter()
            .any(|asset| asset.technology.is_exclusively_frontend_related());
        let has_backend = members
            .iter()
            .any(|asset| asset.technology.is_exclusively_backend_related());
        boundaries.len() > 1 || (has_frontend && has_backend)
    }

    fn is_more_risky(members: &[&TechnicalAsset]) -> bool {
        members.iter().any(|asset| {
            asset.confidentiality == Confidentiality::StrictlyConfidential
                || asset.integrity == Criticality::MissionCritical
                || asset.availability == Criticality::MissionCritical
        })
    }
}

impl Default for MixedTargetsOnSharedRuntimeRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskRule for MixedTargetsOnSharedRuntimeRule {
    fn category(&self) -> RiskCategory {
        CATEGORY
    }

    fn generate_risks(&self, ctx: &RuleContext) -> Result<Vec<Risk>> {
        let graph = ctx.graph;
        let mut risks = Vec::new();

        for runtime in graph.shared_runtimes() {
            let members = Self::members(graph, runtime);
            if !Self::is_mixed(&members) {
                continue;
            }
            let impact = if Self::is_more_risky(&members) {
                Impact::Medium
            } else {
                Impact::Low
            };
            let title = format!(
                "Mixed Targets on Shared Runtime named {} might enable attackers moving from one less \
                 valuable target to a more valuable one",
                runtime.title
            );
            risks.push(
                Risk::new(CATEGORY, Likelihood::Unlikely, impact, title)
                    .for_shared_runtime(&runtime.id)
                    .with_breach(
                        DataBreachProbability::Improbable,
                        members.iter().map(|asset| asset.id.as_str()),
                    )
                    .identified_by(&[&runtime.id]),
            );
        }

        Ok(risks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphBuilder, Technology, TrustBoundary, TrustBoundaryType};
    use crate::rules::test_support::run_rule;

    #[test]
    fn test_frontend_and_backend_on_one_runtime() {
        let graph = GraphBuilder::new("t")
            .technical_asset(TechnicalAsset::new("cms", "CMS").with_technology(Technology::Cms))
            .technical_asset(
                TechnicalAsset::new("db", "DB")
                    .with_technology(Technology::Database)
                    .with_ratings(
                        Confidentiality::StrictlyConfidential,
                        Criticality::Important,
                        Criticality::Important,
                    ),
            )
            .shared_runtime(SharedRuntime::new("k8s").running("cms").running("db"))
            .build()
            .unwrap();
        let risks = run_rule(&MixedTargetsOnSharedRuntimeRule::new(), &graph);

        assert_eq!(risks.len(), 1);
        let risk = &risks[0];
        assert_eq!(risk.synthetic_id(), "mixed-targets-on-shared-runtime@k8s");
        assert_eq!(risk.exploitation_impact(), Impact::Medium);
        assert_eq!(risk.most_relevant_shared_runtime_id.as_deref(), Some("k8s"));
        assert_eq!(
            risk.data_breach_technical_asset_ids,
            vec!["cms".to_string(), "db".to_string()]
        );
    }

    #[test]
    fn test_members_from_different_boundaries() {
        let graph = GraphBuilder::new("t")
            .technical_asset(TechnicalAsset::new("a", "A"))
            .technical_asset(TechnicalAsset::new("b", "B"))
            .trust_boundary(TrustBoundary::new("zone", TrustBoundaryType::NetworkOnPrem).containing("a"))
            .shared_runtime(SharedRuntime::new("vm").running("a").running("b"))
            .build()
            .unwrap();
        let risks = run_rule(&MixedTargetsOnSharedRuntimeRule::new(), &graph);

        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].exploitation_impact(), Impact::Low);
    }

    #[test]
    fn test_homogeneous_runtime_is_fine() {
        let graph = GraphBuilder::new("t")
            .technical_asset(TechnicalAsset::new("a", "A").with_technology(Technology::WebServiceRest))
            .technical_asset(TechnicalAsset::new("b", "B").with_technology(Technology::Database))
            .shared_runtime(SharedRuntime::new("vm").running("a").running("b"))
            .build()
            .unwrap();
        assert!(run_rule(&MixedTargetsOnSharedRuntimeRule::new(), &graph).is_empty());
    }
}
