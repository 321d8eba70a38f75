//! Missing authentication rule
//!
//! Every sensitive in-scope asset (or multi-tenant one) must authenticate
//! its callers. Each incoming link without authentication over a
//! non-process-local protocol is a finding. Impact follows the peak rating
//! of the data moving over that link.

use crate::graph::{
    Authentication, CommunicationLink, Confidentiality, Criticality, TechnicalAsset,
    TechnicalAssetType, Technology, ThreatGraph,
};
use crate::models::{DataBreachProbability, Risk, RiskCategory, RiskFunction, Stride};
use crate::rules::base::{RiskRule, RuleContext};
use crate::scoring::{Impact, Likelihood};
use anyhow::Result;

const CATEGORY: RiskCategory = RiskCategory {
    id: "missing-authentication",
    title: "Missing Authentication",
    description: "Technical assets (especially multi-tenant systems) should authenticate incoming requests \
        when the asset processes or stores sensitive data.",
    impact: "If this risk is unmitigated, attackers might be able to access or modify sensitive data in an \
        unauthenticated way.",
    asvs: "V2 - Authentication Verification Requirements",
    cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Authentication_Cheat_Sheet.html",
    action: "Authentication of Incoming Requests",
    mitigation: "Apply an authentication method to the technical asset. To protect highly sensitive data \
        consider the use of two-factor authentication for human users.",
    check: "Are recommendations from the linked cheat sheet and referenced ASVS chapter applied?",
    function: RiskFunction::Architecture,
    stride: Stride::ElevationOfPrivilege,
    detection_logic: "In-scope technical assets (except load-balancer, reverse-proxy, service-registry, waf, \
        ids and ips, and in-process calls) should authenticate incoming requests when the asset processes or \
        stores data rated at least confidential or critical, or is multi-tenant. Callers whose technology \
        tolerates unprotected communication and datastores are exempt.",
    risk_assessment: "The risk rating (medium or high) depends on the sensitivity of the data sent across \
        the communication link. Monitoring callers are exempted from this risk.",
    false_positives: "Technical assets which do not process requests regarding functionality or data linked \
        to end-users (customers) can be considered as false positives after individual review.",
    model_failure_possible_reason: false,
    cwe: 306,
};

/// Technologies that front other assets and never authenticate themselves
const EXEMPT_TARGETS: [Technology; 6] = [
    Technology::LoadBalancer,
    Technology::ReverseProxy,
    Technology::ServiceRegistry,
    Technology::Waf,
    Technology::Ids,
    Technology::Ips,
];

/// Detects sensitive assets reachable without authentication
pub struct MissingAuthenticationRule;

impl MissingAuthenticationRule {
    pub fn new() -> Self {
        Self
    }

    fn requires_authentication(graph: &ThreatGraph, asset: &TechnicalAsset) -> bool {
        asset.highest_confidentiality(graph) >= Confidentiality::Confidential
            || asset.highest_integrity(graph) >= Criticality::Critical
            || asset.highest_availability(graph) >= Criticality::Critical
            || asset.multi_tenant
    }

    fn link_impact(graph: &ThreatGraph, link: &CommunicationLink) -> Impact {
        let confidentiality = link.highest_confidentiality(graph);
        let integrity = link.highest_integrity(graph);
        if confidentiality == Confidentiality::StrictlyConfidential
            || integrity == Criticality::MissionCritical
        {
            Impact::High
        } else if confidentiality <= Confidentiality::Internal && integrity == Criticality::Operational {
            Impact::Low
        } else {
            Impact::Medium
        }
    }

    fn create_risk(
        target: &TechnicalAsset,
        caller: &TechnicalAsset,
        link: &CommunicationLink,
        impact: Impact,
    ) -> Risk {
        let title = format!(
            "Missing Authentication covering communication link {} from {} to {}",
            link.title, caller.title, target.title
        );
        Risk::new(CATEGORY, Likelihood::Likely, impact, title)
            .for_technical_asset(&target.id)
            .for_communication_link(&link.id)
            .with_breach(DataBreachProbability::Possible, [target.id.as_str()])
            .identified_by(&[&link.id, &caller.id, &target.id])
    }
}

impl Default for MissingAuthenticationRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskRule for MissingAuthenticationRule {
    fn category(&self) -> RiskCategory {
        CATEGORY
    }

    fn generate_risks(&self, ctx: &RuleContext) -> Result<Vec<Risk>> {
        let graph = ctx.graph;
        let mut risks = Vec::new();

        for asset in graph.technical_assets() {
            if !asset.is_in_scope() || EXEMPT_TARGETS.contains(&asset.technology) {
                continue;
            }
            if !Self::requires_authentication(graph, asset) {
                continue;
            }

            for link in graph.incoming_links(&asset.id) {
                let Some(caller) = graph.technical_asset(&link.source_id) else {
                    continue;
                };
                if caller.technology.is_unprotected_comms_tolerated()
                    || caller.asset_type == TechnicalAssetType::Datastore
                {
                    continue;
                }
                if link.authentication == Authentication::None && !link.protocol.is_process_local() {
                    let impact = Self::link_impact(graph, link);
                    risks.push(Self::create_risk(asset, caller, link, impact));
                }
            }
        }

        Ok(risks)
    }
}
