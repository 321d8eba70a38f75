//! Unnecessary communication link rule

use crate::models::{DataBreachProbability, Risk, RiskCategory, RiskFunction, Stride};
use crate::rules::base::{RiskRule, RuleContext};
use crate::scoring::{Impact, Likelihood};
use anyhow::Result;

const CATEGORY: RiskCategory = RiskCategory {
    id: "unnecessary-communication-link",
    title: "Unnecessary Communication Link",
    description: "When a technical communication link does not send or receive any data assets, this is an \
        indicator for an unnecessary communication link (or for an incomplete model).",
    impact: "If this risk is unmitigated, attackers might be able to target unnecessary communication links.",
    asvs: "V1 - Architecture, Design and Threat Modeling Requirements",
    cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html",
    action: "Attack Surface Reduction",
    mitigation: "Try to avoid using technical communication links that do not send or receive anything.",
    check: "Are recommendations from the linked cheat sheet and referenced ASVS chapter applied?",
    function: RiskFunction::Architecture,
    stride: Stride::ElevationOfPrivilege,
    detection_logic: "In-scope technical assets' technical communication links not sending or receiving any \
        data assets.",
    risk_assessment: "low",
    false_positives: "Usually no false positives as this looks like an incomplete model.",
    model_failure_possible_reason: true,
    cwe: 1008,
};

/// Flags links that carry no data assets in either direction
pub struct UnnecessaryCommunicationLinkRule;

impl UnnecessaryCommunicationLinkRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UnnecessaryCommunicationLinkRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskRule for UnnecessaryCommunicationLinkRule {
    fn category(&self) -> RiskCategory {
        CATEGORY
    }

    fn generate_risks(&self, ctx: &RuleContext) -> Result<Vec<Risk>> {
        let graph = ctx.graph;
        let mut risks = Vec::new();

        for link in graph.communication_links().filter(|l| l.carries_no_data()) {
            let (Some(source), Some(target)) = (
                graph.technical_asset(&link.source_id),
                graph.technical_asset(&link.target_id),
            ) else {
                continue;
            };
            if !source.is_in_scope() && !target.is_in_scope() {
                continue;
            }
            let title = format!(
                "Unnecessary Communication Link titled {} at technical asset {}",
                link.title, source.title
            );
            risks.push(
                Risk::new(CATEGORY, Likelihood::Unlikely, Impact::Low, title)
                    .for_technical_asset(&source.id)
                    .for_communication_link(&link.id)
                    .with_breach(DataBreachProbability::Improbable, [source.id.as_str()])
                    .identified_by(&[&link.id, &source.id]),
            );
        }

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
    fn test_empty_link_is_a_model_failure() {
        let graph = GraphBuilder::new("t")
            .data_asset(DataAsset::new("d", "D"))
            .technical_asset(TechnicalAsset::new("src", "Source").processing("d"))
            .technical_asset(TechnicalAsset::new("dst", "Target"))
            .communication_link(CommunicationLink::new("empty", "src", "dst", Protocol::Https))
            .communication_link(CommunicationLink::new("used", "dst", "src", Protocol::Https).receiving("d"))
            .build()
            .unwrap();
        let risks = run_rule(&UnnecessaryCommunicationLinkRule::new(), &graph);

        assert_eq!(risks.len(), 1);
        let risk = &risks[0];
        assert_eq!(risk.synthetic_id(), "unnecessary-communication-link@empty@src");
        assert_eq!(risk.severity(), Severity::Low);
        assert!(risk.is_model_failure());
        assert_eq!(risk.most_relevant_communication_link_id.as_deref(), Some("empty"));
    }

    #[test]
    fn test_links_between_out_of_scope_assets_are_ignored() {
        let mut src = TechnicalAsset::new("src", "Source");
        src.out_of_scope = true;
        let mut dst = TechnicalAsset::new("dst", "Target");
        dst.out_of_scope = true;
        let graph = GraphBuilder::new("t")
            .technical_asset(src)
            .technical_asset(dst)
            .communication_link(CommunicationLink::new("empty", "src", "dst", Protocol::Https))
            .build()
            .unwrap();
        assert!(run_rule(&UnnecessaryCommunicationLinkRule::new(), &graph).is_empty());
    }
}
