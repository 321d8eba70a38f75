//! Unencrypted communication rule
//!
//! Flags communication links that move sensitive data over a protocol
//! without transport encryption. Links between assets whose technology
//! tolerates unprotected traffic (monitoring agents and the like) are
//! exempt, as are process-local calls.
//!
//! Impact:
//! - high when any transferred item is strictly-confidential or
//!   mission-critical, or when the link carries authentication data
//! - medium when an item is confidential or critical and the link is not
//!   inside a VPN
//!
//! Likelihood rises from unlikely to likely once the link crosses a network
//! trust boundary.

use crate::graph::{
    Authentication, CommunicationLink, Confidentiality, Criticality, DataAsset, ThreatGraph,
};
use crate::models::{DataBreachProbability, Risk, RiskCategory, RiskFunction, Stride};
use crate::rules::base::{RiskRule, RuleContext};
use crate::scoring::{Impact, Likelihood};
use anyhow::Result;
use tracing::debug;

const CATEGORY: RiskCategory = RiskCategory {
    id: "unencrypted-communication",
    title: "Unencrypted Communication",
    description: "Due to the confidentiality and/or integrity rating of the data assets transferred over the \
        communication link, this connection must be encrypted.",
    impact: "If this risk is unmitigated, network attackers might be able to eavesdrop on unencrypted \
        sensitive data sent between components.",
    asvs: "V9 - Communication Verification Requirements",
    cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Transport_Layer_Protection_Cheat_Sheet.html",
    action: "Encryption of Communication Links",
    mitigation: "Apply transport layer encryption to the communication link.",
    check: "Are recommendations from the linked cheat sheet and referenced ASVS chapter applied?",
    function: RiskFunction::Operations,
    stride: Stride::InformationDisclosure,
    detection_logic: "Unencrypted technical communication links of in-scope technical assets (excluding \
        monitoring traffic as well as local-file-access and in-process-library-call) transferring sensitive data.",
    risk_assessment: "Depending on the confidentiality rating of the transferred data assets either medium or high risk.",
    false_positives: "When all sensitive data sent over the communication link is already fully encrypted on \
        document or data level. Also intra-container/pod communication can be considered false positive when \
        the container orchestration platform handles encryption.",
    model_failure_possible_reason: false,
    cwe: 319,
};

/// Detects sensitive data moving over unencrypted links
pub struct UnencryptedCommunicationRule;

impl UnencryptedCommunicationRule {
    pub fn new() -> Self {
        Self
    }

    /// Impact contributed by one transferred data asset, if any
    fn impact_of(data: &DataAsset, link: &CommunicationLink, transfers_auth_data: bool) -> Option<Impact> {
        let high = data.confidentiality == Confidentiality::StrictlyConfidential
            || data.integrity == Criticality::MissionCritical;
        let medium = data.confidentiality == Confidentiality::Confidential
            || data.integrity == Criticality::Critical;

        if high || transfers_auth_data {
            Some(Impact::High)
        } else if !link.vpn && medium {
            Some(Impact::Medium)
        } else {
            None
        }
    }

    /// First matching item wins: sent data is checked before received data
    fn link_impact(graph: &ThreatGraph, link: &CommunicationLink) -> Option<Impact> {
        let transfers_auth_data = link.authentication != Authentication::None;
        link.data_assets_sent
            .iter()
            .chain(link.data_assets_received.iter())
            .filter_map(|id| graph.data_asset(id))
            .find_map(|data| Self::impact_of(data, link, transfers_auth_data))
    }

    fn create_risk(graph: &ThreatGraph, link: &CommunicationLink, impact: Impact) -> Risk {
        let source_title = graph
            .technical_asset(&link.source_id)
            .map_or(link.source_id.as_str(), |a| a.title.as_str());
        let target_title = graph
            .technical_asset(&link.target_id)
            .map_or(link.target_id.as_str(), |a| a.title.as_str());

        let mut title = format!(
            "Unencrypted Communication named {} between {} and {}",
            link.title, source_title, target_title
        );
        if link.authentication != Authentication::None {
            title.push_str(" transferring authentication data (like credentials, token, session-id, etc.)");
        }
        if link.vpn {
            title.push_str(&format!(
                " (even VPN-protected connections need to encrypt their data in-transit when confidentiality is rated {} or integrity is rated {})",
                Confidentiality::StrictlyConfidential,
                Criticality::MissionCritical
            ));
        }

        let likelihood = if graph.is_across_trust_boundary_network_only(link) {
            Likelihood::Likely
        } else {
            Likelihood::Unlikely
        };

        Risk::new(CATEGORY, likelihood, impact, title)
            .for_technical_asset(&link.source_id)
            .for_communication_link(&link.id)
            .with_breach(DataBreachProbability::Possible, [link.target_id.as_str()])
            .identified_by(&[&link.id, &link.source_id, &link.target_id])
    }
}

impl Default for UnencryptedCommunicationRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskRule for UnencryptedCommunicationRule {
    fn category(&self) -> RiskCategory {
        CATEGORY
    }

    fn generate_risks(&self, ctx: &RuleContext) -> Result<Vec<Risk>> {
        let graph = ctx.graph;
        let mut risks = Vec::new();

        for link in graph.communication_links() {
            let (Some(source), Some(target)) = (
                graph.technical_asset(&link.source_id),
                graph.technical_asset(&link.target_id),
            ) else {
                continue;
            };
            if !source.is_in_scope()
                || link.protocol.is_encrypted()
                || link.protocol.is_process_local()
                || source.technology.is_unprotected_comms_tolerated()
                || target.technology.is_unprotected_comms_tolerated()
            {
                continue;
            }

            if let Some(impact) = Self::link_impact(graph, link) {
                risks.push(Self::create_risk(graph, link, impact));
            }
        }

        debug!("{} found {} unencrypted links", CATEGORY.id, risks.len());
        Ok(risks)
    }
}
