//! Missing vault isolation rule
//!
//! A vault sharing its network segment or execution environment with
//! unrelated assets is exposed to whatever compromises those neighbours.
//! Other vaults and the vault's own backing datastores do not count.

use crate::graph::{TechnicalAsset, TechnicalAssetType, Technology, ThreatGraph};
use crate::models::{DataBreachProbability, Risk, RiskCategory, RiskFunction, Stride};
use crate::rules::base::{RiskRule, RuleContext};
use crate::rules::isolation::{closest_unrelated, has_top_tier_rating, Colocation};
use crate::scoring::{Impact, Likelihood};
use anyhow::Result;

const CATEGORY: RiskCategory = RiskCategory {
    id: "missing-vault-isolation",
    title: "Missing Vault Isolation",
    description: "Highly sensitive vault assets and their datastores should be isolated from other assets \
        by their own network segmentation trust boundary (execution-environment boundaries do not count as \
        network isolation).",
    impact: "If this risk is unmitigated, attackers successfully attacking other components of the system \
        might have an easy path towards highly sensitive vault assets and their datastores, as they are not \
        separated by network segmentation.",
    asvs: "V1 - Architecture, Design and Threat Modeling Requirements",
    cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html",
    action: "Network Segmentation",
    mitigation: "Apply a network segmentation trust boundary around the highly sensitive vault assets and \
        their datastores.",
    check: "Are recommendations from the linked cheat sheet and referenced ASVS chapter applied?",
    function: RiskFunction::Operations,
    stride: Stride::ElevationOfPrivilege,
    detection_logic: "In-scope vault assets when surrounded by other (not vault-related) assets without a \
        network trust boundary in-between. This risk is especially prevalent when other non-vault-related \
        assets are within the same execution environment.",
    risk_assessment: "Default is medium impact. The impact is increased to high when the asset missing \
        the trust boundary protection is rated as strictly-confidential or mission-critical.",
    false_positives: "When all assets within the network segmentation trust boundary are hardened and \
        protected to the same extent as if all were vaults with data of highest sensitivity.",
    model_failure_possible_reason: false,
    cwe: 1008,
};

/// Detects vaults sharing a segment with unrelated assets
pub struct MissingVaultIsolationRule;

impl MissingVaultIsolationRule {
    pub fn new() -> Self {
        Self
    }

    fn is_vault_storage(graph: &ThreatGraph, vault: &TechnicalAsset, other: &TechnicalAsset) -> bool {
        other.asset_type == TechnicalAssetType::Datastore
            && graph.has_direct_connection(&vault.id, &other.id)
    }

    fn create_risk(vault: &TechnicalAsset, colocation: Colocation) -> Risk {
        let impact = if has_top_tier_rating(vault) {
            Impact::High
        } else {
            Impact::Medium
        };
        let likelihood = match colocation {
            Colocation::SameExecutionEnvironment => Likelihood::Likely,
            Colocation::SameNetwork => Likelihood::Unlikely,
        };
        let title = format!(
            "Missing Vault Isolation to further encapsulate and protect vault-related asset {} against \
             unrelated lower protected assets {}, which might be easier to compromise by attackers",
            vault.title,
            colocation.describe()
        );
        Risk::new(CATEGORY, likelihood, impact, title)
            .for_technical_asset(&vault.id)
            .with_breach(DataBreachProbability::Improbable, [vault.id.as_str()])
            .identified_by(&[&vault.id])
    }
}

impl Default for MissingVaultIsolationRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskRule for MissingVaultIsolationRule {
    fn category(&self) -> RiskCategory {
        CATEGORY
    }

    fn generate_risks(&self, ctx: &RuleContext) -> Result<Vec<Risk>> {
        let graph = ctx.graph;
        let mut risks = Vec::new();

        for vault in graph
            .technical_assets()
            .filter(|a| a.is_in_scope() && a.technology == Technology::Vault)
        {
            let colocation = closest_unrelated(graph, vault, |other| {
                other.technology != Technology::Vault && !Self::is_vault_storage(graph, vault, other)
            });
            if let Some(colocation) = colocation {
                risks.push(Self::create_risk(vault, colocation));
            }
        }

        Ok(risks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{
        CommunicationLink, Confidentiality, Criticality, GraphBuilder, Protocol, TrustBoundary,
        TrustBoundaryType,
    };
    use crate::rules::test_support::run_rule;

    fn vault() -> TechnicalAsset {
        TechnicalAsset::new("vault", "Vault").with_technology(Technology::Vault)
    }

    #[test]
    fn test_shared_execution_environment_is_likely() {
        let graph = GraphBuilder::new("t")
            .technical_asset(vault())
            .technical_asset(TechnicalAsset::new("web", "Web").with_technology(Technology::WebServer))
            .trust_boundary(
                TrustBoundary::new("host", TrustBoundaryType::ExecutionEnvironment)
                    .containing("vault")
                    .containing("web"),
            )
            .build()
            .unwrap();
        let risks = run_rule(&MissingVaultIsolationRule::new(), &graph);

        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].exploitation_likelihood(), Likelihood::Likely);
        assert_eq!(risks[0].exploitation_impact(), Impact::Medium);
        assert_eq!(risks[0].synthetic_id(), "missing-vault-isolation@vault");
        assert!(risks[0].title.contains("same execution environment"));
    }

    #[test]
    fn test_shared_network_is_unlikely_and_rating_raises_impact() {
        let strict = vault().with_ratings(
            Confidentiality::StrictlyConfidential,
            Criticality::Important,
            Criticality::Important,
        );
        let graph = GraphBuilder::new("t")
            .technical_asset(strict)
            .technical_asset(TechnicalAsset::new("app", "App"))
            .trust_boundary(
                TrustBoundary::new("lan", TrustBoundaryType::NetworkOnPrem)
                    .containing("vault")
                    .containing("app"),
            )
            .build()
            .unwrap();
        let risks = run_rule(&MissingVaultIsolationRule::new(), &graph);

        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].exploitation_likelihood(), Likelihood::Unlikely);
        assert_eq!(risks[0].exploitation_impact(), Impact::High);
    }

    #[test]
    fn test_vault_storage_does_not_count() {
        let graph = GraphBuilder::new("t")
            .technical_asset(vault())
            .technical_asset(TechnicalAsset::new("db", "DB").with_type(TechnicalAssetType::Datastore))
            .trust_boundary(
                TrustBoundary::new("lan", TrustBoundaryType::NetworkOnPrem)
                    .containing("vault")
                    .containing("db"),
            )
            .communication_link(CommunicationLink::new("persist", "vault", "db", Protocol::Jdbc))
            .build()
            .unwrap();
        assert!(run_rule(&MissingVaultIsolationRule::new(), &graph).is_empty());
    }

    #[test]
    fn test_isolated_vault_is_fine() {
        let graph = GraphBuilder::new("t")
            .technical_asset(vault())
            .technical_asset(TechnicalAsset::new("app", "App"))
            .trust_boundary(TrustBoundary::new("vaults", TrustBoundaryType::NetworkOnPrem).containing("vault"))
            .build()
            .unwrap();
        assert!(run_rule(&MissingVaultIsolationRule::new(), &graph).is_empty());
    }
}
