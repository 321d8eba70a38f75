//! Denial-of-service risky access across trust boundary rule
//!
//! Assets with critical availability should not be callable from other
//! network segments. When the direct caller only forwards traffic (load
//! balancer, proxy, gateway, WAF), the rule looks one hop further up and
//! checks the forwarder's own callers instead.

use crate::graph::{CommunicationLink, Criticality, TechnicalAsset, Technology, ThreatGraph, Usage};
use crate::models::{DataBreachProbability, Risk, RiskCategory, RiskFunction, Stride};
use crate::rules::base::{RiskRule, RuleContext};
use crate::scoring::{Impact, Likelihood};
use anyhow::Result;
use std::collections::BTreeMap;

const CATEGORY: RiskCategory = RiskCategory {
    id: "dos-risky-access-across-trust-boundary",
    title: "DoS-risky Access Across Trust-Boundary",
    description: "Assets accessed across trust boundaries with critical or mission-critical availability \
        rating are more prone to Denial-of-Service (DoS) risks.",
    impact: "If this risk remains unmitigated, attackers might be able to disturb the availability of \
        important parts of the system.",
    asvs: "V1 - Architecture, Design and Threat Modeling Requirements",
    cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Denial_of_Service_Cheat_Sheet.html",
    action: "Anti-DoS Measures",
    mitigation: "Apply anti-DoS techniques like throttling and/or per-client load blocking with quotas. Also \
        for maintenance access routes consider applying a VPN instead of public reachable interfaces. \
        Generally applying redundancy on the targeted technical asset reduces the risk of DoS.",
    check: "Are recommendations from the linked cheat sheet and referenced ASVS chapter applied?",
    function: RiskFunction::Operations,
    stride: Stride::DenialOfService,
    detection_logic: "In-scope technical assets (excluding load-balancer) with availability rating of \
        critical or higher which have incoming data-flows across a network trust-boundary (excluding devops \
        usage).",
    risk_assessment: "Matching technical assets with availability rating of critical or higher are at low \
        risk. When the availability rating is mission-critical and neither a VPN nor IP filter for the \
        incoming data-flow nor redundancy for the asset is applied, the risk-rating is considered medium.",
    false_positives: "When the accessing link is sufficiently protected against DoS by other means, for \
        example anti-DoS measures of the hosting provider.",
    model_failure_possible_reason: false,
    cwe: 400,
};

/// Detects availability-critical assets reachable from other segments
pub struct DosRiskyAccessAcrossTrustBoundaryRule;

impl DosRiskyAccessAcrossTrustBoundaryRule {
    pub fn new() -> Self {
        Self
    }

    fn check_link(
        graph: &ThreatGraph,
        asset: &TechnicalAsset,
        link: &CommunicationLink,
        forwarded_via: Option<&TechnicalAsset>,
    ) -> Option<Risk> {
        if !graph.is_across_trust_boundary_network_only(link)
            || link.protocol.is_process_local()
            || link.usage == Usage::Devops
        {
            return None;
        }
        let source = graph.technical_asset(&link.source_id)?;

        let more_risky = asset.availability == Criticality::MissionCritical
            && !link.vpn
            && !link.ip_filtered
            && !asset.redundant;
        let impact = if more_risky { Impact::Medium } else { Impact::Low };

        let mut title = format!(
            "Denial-of-Service risky access of {} by {} via {}",
            asset.title, source.title, link.title
        );
        if let Some(hop) = forwarded_via {
            title.push_str(&format!(" forwarded via {}", hop.title));
        }

        Some(
            Risk::new(CATEGORY, Likelihood::Unlikely, impact, title)
                .for_technical_asset(&asset.id)
                .for_communication_link(&link.id)
                .with_breach(DataBreachProbability::Improbable, Vec::<String>::new())
                .identified_by(&[&asset.id, &source.id, &link.id]),
        )
    }
}

impl Default for DosRiskyAccessAcrossTrustBoundaryRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskRule for DosRiskyAccessAcrossTrustBoundaryRule {
    fn category(&self) -> RiskCategory {
        CATEGORY
    }

    fn generate_risks(&self, ctx: &RuleContext) -> Result<Vec<Risk>> {
        let graph = ctx.graph;
        // A forwarder reaching the asset over several links yields the same
        // upstream finding once per link; keep one per synthetic id.
        let mut risks: BTreeMap<String, Risk> = BTreeMap::new();
        let mut keep = |risk: Option<Risk>| {
            if let Some(risk) = risk {
                risks.entry(risk.synthetic_id().to_string()).or_insert(risk);
            }
        };

        for asset in graph.technical_assets().filter(|a| {
            a.is_in_scope()
                && a.technology != Technology::LoadBalancer
                && a.availability >= Criticality::Critical
        }) {
            for link in graph.incoming_links(&asset.id) {
                let Some(source) = graph.technical_asset(&link.source_id) else {
                    continue;
                };
                if source.technology.is_traffic_forwarding() {
                    // one hop up the call chain
                    for upstream in graph.incoming_links(&source.id) {
                        keep(Self::check_link(graph, asset, upstream, Some(source)));
                    }
                } else {
                    keep(Self::check_link(graph, asset, link, None));
                }
            }
        }

        Ok(risks.into_values().collect())
    }
}
