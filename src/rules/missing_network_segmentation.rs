//! Missing network segmentation rule
//!
//! Attractive, sensitive assets should not share a network segment with
//! less protected kinds of assets they never talk to. The attractiveness
//! limit is configurable via the `min_attractiveness` option.

use crate::graph::{Confidentiality, Criticality, TechnicalAsset, TechnicalAssetType, Technology, ThreatGraph};
use crate::models::{DataBreachProbability, Risk, RiskCategory, RiskFunction, Stride};
use crate::rules::base::{RiskRule, RuleConfig, RuleContext};
use crate::rules::isolation::has_top_tier_rating;
use crate::scoring::{Impact, Likelihood};
use anyhow::Result;

/// Default attractiveness an asset needs before segmentation is demanded
const DEFAULT_MIN_ATTRACTIVENESS: f64 = 50.0;

const CATEGORY: RiskCategory = RiskCategory {
    id: "missing-network-segmentation",
    title: "Missing Network Segmentation",
    description: "Highly sensitive assets and/or datastores residing in the same network segment than other \
        lower sensitive assets (like webservers or content management systems etc.) should be better protected \
        by a network segmentation trust boundary.",
    impact: "If this risk is unmitigated, attackers successfully attacking other components of the system \
        might have an easy path towards more valuable targets, as they are not separated by network segmentation.",
    asvs: "V1 - Architecture, Design and Threat Modeling Requirements",
    cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html",
    action: "Network Segmentation",
    mitigation: "Apply a network segmentation trust boundary around the highly sensitive assets and/or datastores.",
    check: "Are recommendations from the linked cheat sheet and referenced ASVS chapter applied?",
    function: RiskFunction::Operations,
    stride: Stride::ElevationOfPrivilege,
    detection_logic: "In-scope technical assets with high sensitivity and attractiveness as well as datastores \
        when surrounded by assets (without a network trust boundary in-between) which are of type client-system, \
        web-server, web-application, cms, web-service-rest, web-service-soap, build-pipeline, \
        sourcecode-repository, monitoring, or similar and there is no direct connection between these \
        (hence no requirement to be so close to each other).",
    risk_assessment: "Default is low risk. The risk is increased to medium when the asset missing the trust \
        boundary protection is rated as strictly-confidential or mission-critical.",
    false_positives: "When all assets within the network segmentation trust boundary are hardened and \
        protected to the same extent as if all were containing/processing highly sensitive data.",
    model_failure_possible_reason: false,
    cwe: 1008,
};

const EXEMPT_TECHNOLOGIES: [Technology; 5] = [
    Technology::ReverseProxy,
    Technology::Waf,
    Technology::Ids,
    Technology::Ips,
    Technology::ServiceRegistry,
];

/// Detects sensitive assets sharing a segment with less protected ones
pub struct MissingNetworkSegmentationRule {
    config: RuleConfig,
    min_attractiveness: f64,
}

impl MissingNetworkSegmentationRule {
    pub fn new() -> Self {
        Self::with_config(RuleConfig::new())
    }

    /// Create with custom config
    pub fn with_config(config: RuleConfig) -> Self {
        let min_attractiveness = config.get_option_or("min_attractiveness", DEFAULT_MIN_ATTRACTIVENESS);
        Self {
            config,
            min_attractiveness,
        }
    }

    fn is_candidate(asset: &TechnicalAsset) -> bool {
        asset.asset_type == TechnicalAssetType::Datastore
            || asset.confidentiality >= Confidentiality::Confidential
            || asset.integrity >= Criticality::Critical
            || asset.availability >= Criticality::Critical
    }

    fn has_unrelated_weak_neighbour(graph: &ThreatGraph, asset: &TechnicalAsset) -> bool {
        graph.technical_assets().any(|other| {
            other.id != asset.id
                && other.technology.is_less_protected_type()
                && !other.technology.is_close_to_high_value_targets_tolerated()
                && graph.is_same_trust_boundary_network_only(&asset.id, &other.id)
                && !graph.has_direct_connection(&asset.id, &other.id)
        })
    }

    fn create_risk(asset: &TechnicalAsset) -> Risk {
        let impact = if has_top_tier_rating(asset) {
            Impact::Medium
        } else {
            Impact::Low
        };
        let title = format!(
            "Missing Network Segmentation to further encapsulate and protect {} against unrelated lower \
             protected assets in the same network segment, which might be easier to compromise by attackers",
            asset.title
        );
        Risk::new(CATEGORY, Likelihood::Unlikely, impact, title)
            .for_technical_asset(&asset.id)
            .with_breach(DataBreachProbability::Improbable, [asset.id.as_str()])
            .identified_by(&[&asset.id])
    }
}

impl Default for MissingNetworkSegmentationRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskRule for MissingNetworkSegmentationRule {
    fn category(&self) -> RiskCategory {
        CATEGORY
    }

    fn config(&self) -> Option<&RuleConfig> {
        Some(&self.config)
    }

    fn generate_risks(&self, ctx: &RuleContext) -> Result<Vec<Risk>> {
        let graph = ctx.graph;
        let mut risks = Vec::new();

        for asset in graph.technical_assets() {
            if !asset.is_in_scope() || EXEMPT_TECHNOLOGIES.contains(&asset.technology) {
                continue;
            }
            if ctx.attractiveness_of(&asset.id) < self.min_attractiveness || !Self::is_candidate(asset) {
                continue;
            }
            if Self::has_unrelated_weak_neighbour(graph, asset) {
                risks.push(Self::create_risk(asset));
            }
        }

        Ok(risks)
    }
}
