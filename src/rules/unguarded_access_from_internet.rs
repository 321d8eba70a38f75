//! Unguarded access from internet rule
//!
//! Sensitive assets called directly by internet-facing assets lack a
//! guarding component (reverse proxy, WAF, gateway) in front of them.
//! Off-the-shelf web servers and gateways reached over their native
//! protocols are expected to face the internet and are not flagged.

use crate::graph::{
    CommunicationLink, Confidentiality, Criticality, Protocol, TechnicalAsset, Technology,
};
use crate::models::{DataBreachProbability, Risk, RiskCategory, RiskFunction, Stride};
use crate::rules::base::{RiskRule, RuleConfig, RuleContext};
use crate::scoring::{Impact, Likelihood};
use anyhow::Result;

const DEFAULT_RAA_LIMIT: f64 = 40.0;

const CATEGORY: RiskCategory = RiskCategory {
    id: "unguarded-access-from-internet",
    title: "Unguarded Access From Internet",
    description: "Internet-exposed assets must be guarded by a protecting service, application, or \
        reverse-proxy.",
    impact: "If this risk is unmitigated, attackers might be able to directly attack sensitive systems \
        without any hardening components in-between due to them being directly exposed on the internet.",
    asvs: "V1 - Architecture, Design and Threat Modeling Requirements",
    cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html",
    action: "Encapsulation of Technical Asset",
    mitigation: "Encapsulate the asset behind a guarding service, application, or reverse-proxy. For admin \
        maintenance a bastion-host should be used as a jump-server. For file transfer a store-and-forward-host \
        should be used as an indirect file exchange platform.",
    check: "Are recommendations from the linked cheat sheet and referenced ASVS chapter applied?",
    function: RiskFunction::Architecture,
    stride: Stride::ElevationOfPrivilege,
    detection_logic: "In-scope technical assets (excluding load-balancer) with confidentiality rating of \
        confidential (or higher) or with integrity rating of critical (or higher) when accessed directly from \
        the internet. All web-server, web-application, reverse-proxy, waf, and gateway assets are exempted \
        from this risk when they do not consist of custom developed code and the data-flow only consists of \
        HTTP or FTP protocols. Access from monitoring systems as well as VPN-protected connections are exempted.",
    risk_assessment: "The matching technical assets are at low risk. When either the confidentiality rating is \
        strictly-confidential or the integrity rating is mission-critical, the risk-rating is considered medium. \
        For assets with attractiveness values above 40 the risk-rating increases to medium.",
    false_positives: "When other means of filtering client requests are applied equivalent of reverse-proxy, \
        waf, or gateway components.",
    model_failure_possible_reason: false,
    cwe: 501,
};

/// Detects sensitive assets called straight from the internet
pub struct UnguardedAccessFromInternetRule {
    config: RuleConfig,
    raa_limit: f64,
}

impl UnguardedAccessFromInternetRule {
    pub fn new() -> Self {
        Self::with_config(RuleConfig::new())
    }

    pub fn with_config(config: RuleConfig) -> Self {
        Self {
            raa_limit: config.get_option_or("raa_limit", DEFAULT_RAA_LIMIT),
            config,
        }
    }

    /// Off-the-shelf edge components reached over the protocol they serve
    fn is_expected_exposure(asset: &TechnicalAsset, link: &CommunicationLink) -> bool {
        if asset.custom_developed_parts {
            return false;
        }
        let web_edge = matches!(
            asset.technology,
            Technology::WebServer
                | Technology::WebApplication
                | Technology::ReverseProxy
                | Technology::Waf
                | Technology::Gateway
        ) && matches!(link.protocol, Protocol::Http | Protocol::Https);
        let file_gateway = asset.technology == Technology::Gateway && link.protocol.is_file_transfer();
        web_edge || file_gateway
    }

    fn create_risk(
        &self,
        asset: &TechnicalAsset,
        source: &TechnicalAsset,
        link: &CommunicationLink,
        attractiveness: f64,
    ) -> Risk {
        let more_risky = asset.confidentiality == Confidentiality::StrictlyConfidential
            || asset.integrity == Criticality::MissionCritical;
        let impact = if more_risky || attractiveness > self.raa_limit {
            Impact::Medium
        } else {
            Impact::Low
        };
        let title = format!(
            "Unguarded Access from Internet of {} by {} via {}",
            asset.title, source.title, link.title
        );
        Risk::new(CATEGORY, Likelihood::VeryLikely, impact, title)
            .for_technical_asset(&asset.id)
            .for_communication_link(&link.id)
            .with_breach(DataBreachProbability::Possible, [asset.id.as_str()])
            .identified_by(&[&asset.id, &source.id, &link.id])
    }
}

impl Default for UnguardedAccessFromInternetRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskRule for UnguardedAccessFromInternetRule {
    fn category(&self) -> RiskCategory {
        CATEGORY
    }

    fn config(&self) -> Option<&RuleConfig> {
        Some(&self.config)
    }

    fn generate_risks(&self, ctx: &RuleContext) -> Result<Vec<Risk>> {
        let graph = ctx.graph;
        let mut risks = Vec::new();

        for asset in graph
            .technical_assets()
            .filter(|a| a.is_in_scope() && a.technology != Technology::LoadBalancer)
        {
            if asset.confidentiality < Confidentiality::Confidential
                && asset.integrity < Criticality::Critical
            {
                continue;
            }
            for link in graph.incoming_links(&asset.id) {
                let Some(source) = graph.technical_asset(&link.source_id) else {
                    continue;
                };
                if Self::is_expected_exposure(asset, link)
                    || source.technology == Technology::Monitoring
                    || link.vpn
                    || !source.internet
                {
                    continue;
                }
                risks.push(self.create_risk(asset, source, link, ctx.attractiveness_of(&asset.id)));
            }
        }

        Ok(risks)
    }
}
