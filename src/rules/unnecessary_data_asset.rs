//! Unnecessary data asset rule
//!
//! A data asset nobody processes, stores, sends or receives points at an
//! incomplete model (or at data that should not exist).

use crate::models::{Risk, RiskCategory, RiskFunction, Stride};
use crate::rules::base::{RiskRule, RuleContext};
use crate::scoring::{Impact, Likelihood};
use anyhow::Result;

const CATEGORY: RiskCategory = RiskCategory {
    id: "unnecessary-data-asset",
    title: "Unnecessary Data Asset",
    description: "When a data asset is not processed or stored by any technical asset and also not \
        transferred by any communication link, this is an indicator for an unnecessary data asset \
        (or for an incomplete model).",
    impact: "If this risk is unmitigated, attackers might be able to access unnecessary data assets using \
        other vulnerabilities.",
    asvs: "V1 - Architecture, Design and Threat Modeling Requirements",
    cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html",
    action: "Attack Surface Reduction",
    mitigation: "Try to avoid having data assets that are not required/used.",
    check: "Are recommendations from the linked cheat sheet and referenced ASVS chapter applied?",
    function: RiskFunction::Architecture,
    stride: Stride::ElevationOfPrivilege,
    detection_logic: "Modelled data assets not processed or stored by any technical asset and also not \
        transferred by any communication link.",
    risk_assessment: "low",
    false_positives: "Usually no false positives as this looks like an incomplete model.",
    model_failure_possible_reason: true,
    cwe: 1008,
};

/// Flags data assets that no asset or link references
pub struct UnnecessaryDataAssetRule;

impl UnnecessaryDataAssetRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UnnecessaryDataAssetRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskRule for UnnecessaryDataAssetRule {
    fn category(&self) -> RiskCategory {
        CATEGORY
    }

    fn generate_risks(&self, ctx: &RuleContext) -> Result<Vec<Risk>> {
        let graph = ctx.graph;
        let risks = graph
            .data_assets()
            .filter(|data| graph.is_data_asset_unused(&data.id))
            .map(|data| {
                let title = format!("Unnecessary Data Asset named {}", data.title);
                // no technical asset handles it, so nothing is put at breach risk
                Risk::new(CATEGORY, Likelihood::Unlikely, Impact::Low, title)
                    .for_data_asset(&data.id)
                    .identified_by(&[&data.id])
            })
            .collect();
        Ok(risks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CommunicationLink, DataAsset, GraphBuilder, Protocol, TechnicalAsset};
    use crate::rules::test_support::run_rule;
    use crate::scoring::Severity;

    #[test]
    fn test_unused_data_asset_is_flagged_once() {
        let graph = GraphBuilder::new("t")
            .data_asset(DataAsset::new("orphan", "Orphan"))
            .data_asset(DataAsset::new("stored", "Stored"))
            .data_asset(DataAsset::new("sent", "Sent"))
            .technical_asset(TechnicalAsset::new("a", "A").storing("stored"))
            .technical_asset(TechnicalAsset::new("b", "B"))
            .communication_link(CommunicationLink::new("a-b", "a", "b", Protocol::Https).sending("sent"))
            .build()
            .unwrap();
        let risks = run_rule(&UnnecessaryDataAssetRule::new(), &graph);

        assert_eq!(risks.len(), 1);
        let risk = &risks[0];
        assert_eq!(risk.synthetic_id(), "unnecessary-data-asset@orphan");
        assert_eq!(risk.most_relevant_data_asset_id.as_deref(), Some("orphan"));
        assert!(risk.most_relevant_technical_asset_id.is_none());
        assert!(risk.data_breach_technical_asset_ids.is_empty());
        assert_eq!(risk.severity(), Severity::Low);
        assert!(risk.is_model_failure());
    }
}
