//! Missing web application firewall rule

use crate::graph::{Technology, ThreatGraph, TechnicalAsset};
use crate::models::{DataBreachProbability, Risk, RiskCategory, RiskFunction, Stride};
use crate::rules::base::{RiskRule, RuleContext};
use crate::scoring::{Impact, Likelihood};
use anyhow::Result;

const CATEGORY: RiskCategory = RiskCategory {
    id: "missing-waf",
    title: "Missing Web Application Firewall (WAF)",
    description: "To have a first line of filtering defense, security architectures with web-services or \
        web-applications should include a WAF in front of them. Even though a WAF is not a replacement for \
        security (all components must be secure even without a WAF) it adds another layer of defense to the \
        overall system by delaying some attacks and having easier attack alerting through it.",
    impact: "If this risk is unmitigated, attackers might be able to apply standard attack pattern tests at \
        great speed without any filtering.",
    asvs: "V1 - Architecture, Design and Threat Modeling Requirements",
    cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Virtual_Patching_Cheat_Sheet.html",
    action: "Web Application Firewall (WAF)",
    mitigation: "Consider placing a Web Application Firewall (WAF) in front of the web-services and/or \
        web-applications. For cloud environments many cloud providers offer pre-configured WAFs. Even reverse \
        proxies can be enhanced by a WAF component via ModSecurity plugins.",
    check: "Is a Web Application Firewall (WAF) in place?",
    function: RiskFunction::Operations,
    stride: Stride::Tampering,
    detection_logic: "In-scope web-services and/or web-applications accessed across a network trust \
        boundary not having a Web Application Firewall (WAF) in front of them.",
    risk_assessment: "The risk rating depends on the sensitivity of the technical asset itself and of the \
        data assets processed and stored.",
    false_positives: "Targets only accessible via WAFs or reverse proxies containing a WAF component (like \
        ModSecurity) can be considered as false positives after individual review.",
    model_failure_possible_reason: false,
    cwe: 1008,
};

/// Detects web applications and services reached without a WAF in front
pub struct MissingWafRule;

impl MissingWafRule {
    pub fn new() -> Self {
        Self
    }

    fn has_unfiltered_web_access(graph: &ThreatGraph, asset: &TechnicalAsset) -> bool {
        graph.incoming_links(&asset.id).into_iter().any(|link| {
            graph.is_across_trust_boundary_network_only(link)
                && link.protocol.is_potential_web_access()
                && graph
                    .technical_asset(&link.source_id)
                    .is_some_and(|source| source.technology != Technology::Waf)
        })
    }
}

impl Default for MissingWafRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskRule for MissingWafRule {
    fn category(&self) -> RiskCategory {
        CATEGORY
    }

    fn generate_risks(&self, ctx: &RuleContext) -> Result<Vec<Risk>> {
        let graph = ctx.graph;
        let mut risks = Vec::new();

        for asset in graph.technical_assets().filter(|a| {
            a.is_in_scope() && (a.technology.is_web_application() || a.technology.is_web_service())
        }) {
            if !Self::has_unfiltered_web_access(graph, asset) {
                continue;
            }
            let impact = if asset.is_very_sensitive(graph) {
                Impact::Medium
            } else {
                Impact::Low
            };
            risks.push(
                Risk::new(
                    CATEGORY,
                    Likelihood::Unlikely,
                    impact,
                    format!("Missing Web Application Firewall (WAF) risk at {}", asset.title),
                )
                .for_technical_asset(&asset.id)
                .with_breach(DataBreachProbability::Improbable, [asset.id.as_str()])
                .identified_by(&[&asset.id]),
            );
        }

        Ok(risks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CommunicationLink, GraphBuilder, Protocol, TrustBoundary, TrustBoundaryType};
    use crate::rules::test_support::run_rule;

    fn shop(caller: Technology) -> ThreatGraph {
        GraphBuilder::new("t")
            .technical_asset(TechnicalAsset::new("shop", "Shop").with_technology(Technology::WebApplication))
            .technical_asset(TechnicalAsset::new("edge", "Edge").with_technology(caller))
            .trust_boundary(TrustBoundary::new("app", TrustBoundaryType::NetworkCloudSecurityGroup).containing("shop"))
            .communication_link(CommunicationLink::new("web", "edge", "shop", Protocol::Https))
            .communication_link(CommunicationLink::new("web2", "edge", "shop", Protocol::Http))
            .build()
            .unwrap()
    }

    #[test]
    fn test_web_application_without_waf() {
        let risks = run_rule(&MissingWafRule::new(), &shop(Technology::Browser));

        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].synthetic_id(), "missing-waf@shop");
        assert_eq!(risks[0].exploitation_impact(), Impact::Low);
    }

    #[test]
    fn test_web_application_behind_waf() {
        assert!(run_rule(&MissingWafRule::new(), &shop(Technology::Waf)).is_empty());
    }
}
