//! Incomplete model rule
//!
//! Unknown technologies and unknown protocols leave other rules guessing,
//! so each one is reported as a model failure.

use crate::graph::{Protocol, Technology};
use crate::models::{DataBreachProbability, Risk, RiskCategory, RiskFunction, Stride};
use crate::rules::base::{RiskRule, RuleContext};
use crate::scoring::{Impact, Likelihood};
use anyhow::Result;

const CATEGORY: RiskCategory = RiskCategory {
    id: "incomplete-model",
    title: "Incomplete Model",
    description: "When the threat model contains unknown technologies or transfers data over unknown \
        protocols, this is an indicator for an incomplete model.",
    impact: "If this risk is unmitigated, other risks might not be noticed as the model is incomplete.",
    asvs: "V1 - Architecture, Design and Threat Modeling Requirements",
    cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Threat_Modeling_Cheat_Sheet.html",
    action: "Threat Modeling Completeness",
    mitigation: "Try to find out what technology or protocol is used instead of specifying that it is unknown.",
    check: "Are recommendations from the linked cheat sheet and referenced ASVS chapter applied?",
    function: RiskFunction::Architecture,
    stride: Stride::InformationDisclosure,
    detection_logic: "All technical assets and communication links with technology type or protocol type \
        specified as unknown.",
    risk_assessment: "low",
    false_positives: "Usually no false positives as this looks like an incomplete model.",
    model_failure_possible_reason: true,
    cwe: 1008,
};

/// Flags unknown technologies and protocols of in-scope assets
pub struct IncompleteModelRule;

impl IncompleteModelRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for IncompleteModelRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskRule for IncompleteModelRule {
    fn category(&self) -> RiskCategory {
        CATEGORY
    }

    fn generate_risks(&self, ctx: &RuleContext) -> Result<Vec<Risk>> {
        let graph = ctx.graph;
        let mut risks = Vec::new();

        for asset in graph.technical_assets().filter(|a| a.is_in_scope()) {
            if asset.technology == Technology::UnknownTechnology {
                let title = format!("Unknown Technology specified at technical asset {}", asset.title);
                risks.push(
                    Risk::new(CATEGORY, Likelihood::Unlikely, Impact::Low, title)
                        .for_technical_asset(&asset.id)
                        .with_breach(DataBreachProbability::Improbable, [asset.id.as_str()])
                        .identified_by(&[&asset.id]),
                );
            }
            for link in graph
                .outgoing_links(&asset.id)
                .into_iter()
                .filter(|l| l.protocol == Protocol::UnknownProtocol)
            {
                let title = format!(
                    "Unknown Protocol specified for communication link {} at technical asset {}",
                    link.title, asset.title
                );
                risks.push(
                    Risk::new(CATEGORY, Likelihood::Unlikely, Impact::Low, title)
                        .for_technical_asset(&asset.id)
                        .for_communication_link(&link.id)
                        .with_breach(DataBreachProbability::Improbable, [asset.id.as_str()])
                        .identified_by(&[&link.id, &asset.id]),
                );
            }
        }

        Ok(risks)
    }
}
