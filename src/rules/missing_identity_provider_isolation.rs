//! Missing identity provider isolation rule
//!
//! Identity providers and identity stores must not share a network segment
//! or execution environment with unrelated assets. Neighbours that are
//! themselves identity-related, or tolerated next to high-value targets
//! (monitoring, proxies, load balancers), are ignored.

use crate::graph::TechnicalAsset;
use crate::models::{DataBreachProbability, Risk, RiskCategory, RiskFunction, Stride};
use crate::rules::base::{RiskRule, RuleContext};
use crate::rules::isolation::{closest_unrelated, has_top_tier_rating, Colocation};
use crate::scoring::{Impact, Likelihood};
use anyhow::Result;

const CATEGORY: RiskCategory = RiskCategory {
    id: "missing-identity-provider-isolation",
    title: "Missing Identity Provider Isolation",
    description: "Highly sensitive identity provider assets and their identity datastores should be isolated \
        from other assets by their own network segmentation trust boundary (execution-environment boundaries \
        do not count as network isolation).",
    impact: "If this risk is unmitigated, attackers successfully attacking other components of the system \
        might have an easy path towards highly sensitive identity provider assets and their identity \
        datastores, as they are not separated by network segmentation.",
    asvs: "V1 - Architecture, Design and Threat Modeling Requirements",
    cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html",
    action: "Network Segmentation",
    mitigation: "Apply a network segmentation trust boundary around the highly sensitive identity provider \
        assets and their identity datastores.",
    check: "Are recommendations from the linked cheat sheet and referenced ASVS chapter applied?",
    function: RiskFunction::Operations,
    stride: Stride::ElevationOfPrivilege,
    detection_logic: "In-scope identity provider assets and their identity datastores when surrounded by \
        other (not identity-related) assets without a network trust boundary in-between. This risk is \
        especially prevalent when other non-identity-related assets are within the same execution environment.",
    risk_assessment: "Default is high impact. The impact is increased to very-high when the asset missing \
        the trust boundary protection is rated as strictly-confidential or mission-critical.",
    false_positives: "When all assets within the network segmentation trust boundary are hardened and \
        protected to the same extent as if all were identity providers with data of highest sensitivity.",
    model_failure_possible_reason: false,
    cwe: 1008,
};

/// Detects identity-related assets sharing a segment with unrelated assets
pub struct MissingIdentityProviderIsolationRule;

impl MissingIdentityProviderIsolationRule {
    pub fn new() -> Self {
        Self
    }

    fn create_risk(asset: &TechnicalAsset, colocation: Colocation) -> Risk {
        let impact = if has_top_tier_rating(asset) {
            Impact::VeryHigh
        } else {
            Impact::High
        };
        let likelihood = match colocation {
            Colocation::SameExecutionEnvironment => Likelihood::Likely,
            Colocation::SameNetwork => Likelihood::Unlikely,
        };
        let title = format!(
            "Missing Identity Provider Isolation to further encapsulate and protect identity-related asset {} \
             against unrelated lower protected assets {}, which might be easier to compromise by attackers",
            asset.title,
            colocation.describe()
        );
        Risk::new(CATEGORY, likelihood, impact, title)
            .for_technical_asset(&asset.id)
            .with_breach(DataBreachProbability::Improbable, [asset.id.as_str()])
            .identified_by(&[&asset.id])
    }
}

impl Default for MissingIdentityProviderIsolationRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskRule for MissingIdentityProviderIsolationRule {
    fn category(&self) -> RiskCategory {
        CATEGORY
    }

    fn generate_risks(&self, ctx: &RuleContext) -> Result<Vec<Risk>> {
        let graph = ctx.graph;
        let mut risks = Vec::new();

        for asset in graph
            .technical_assets()
            .filter(|a| a.is_in_scope() && a.technology.is_identity_related())
        {
            let colocation = closest_unrelated(graph, asset, |other| {
                !other.technology.is_identity_related()
                    && !other.technology.is_close_to_high_value_targets_tolerated()
            });
            if let Some(colocation) = colocation {
                risks.push(Self::create_risk(asset, colocation));
            }
        }

        Ok(risks)
    }
}
