//! Missing vault rule
//!
//! A model without any vault most likely keeps its secrets in config
//! files or environment variables. The finding references the most
//! sensitive asset as an example.

use crate::graph::{Confidentiality, Criticality, TechnicalAsset, Technology, ThreatGraph};
use crate::models::{Risk, RiskCategory, RiskFunction, Stride};
use crate::rules::base::{RiskRule, RuleContext};
use crate::scoring::{Impact, Likelihood};
use anyhow::Result;

const CATEGORY: RiskCategory = RiskCategory {
    id: "missing-vault",
    title: "Missing Vault (Secret Storage)",
    description: "In order to avoid the risk of secret leakage via config files (when attacked through \
        vulnerabilities being able to read files like Path-Traversal and others), it is best practice to use \
        a separate hardened process with proper authentication, authorization, and audit logging to access \
        config secrets (like credentials, private keys, client certificates, etc.). This component is usually \
        some kind of Vault.",
    impact: "If this risk is unmitigated, attackers might be able to easier steal config secrets (like \
        credentials, private keys, client certificates, etc.) once a vulnerability to access files is \
        present and exploited.",
    asvs: "V6 - Stored Cryptography Verification Requirements",
    cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Cryptographic_Storage_Cheat_Sheet.html",
    action: "Vault (Secret Storage)",
    mitigation: "Consider using a Vault (Secret Storage) to securely store and access config secrets (like \
        credentials, private keys, client certificates, etc.).",
    check: "Is a Vault (Secret Storage) in place?",
    function: RiskFunction::Architecture,
    stride: Stride::InformationDisclosure,
    detection_logic: "Models without a Vault (Secret Storage).",
    risk_assessment: "The risk rating depends on the sensitivity of the technical asset itself and of the \
        data assets processed and stored.",
    false_positives: "Models where no technical assets have any kind of sensitive config data to protect \
        can be considered as false positives after individual review.",
    model_failure_possible_reason: true,
    cwe: 522,
};

/// Flags models that contain no vault at all
pub struct MissingVaultRule;

impl MissingVaultRule {
    pub fn new() -> Self {
        Self
    }

    fn sensitivity_score(graph: &ThreatGraph, asset: &TechnicalAsset) -> f64 {
        asset.highest_confidentiality(graph).attractiveness_weight()
            + asset.highest_integrity(graph).attractiveness_weight()
            + asset.highest_availability(graph).attractiveness_weight()
    }

    fn is_sensitive(graph: &ThreatGraph, asset: &TechnicalAsset) -> bool {
        asset.highest_confidentiality(graph) >= Confidentiality::Confidential
            || asset.highest_integrity(graph) >= Criticality::Critical
            || asset.highest_availability(graph) >= Criticality::Critical
    }
}

impl Default for MissingVaultRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskRule for MissingVaultRule {
    fn category(&self) -> RiskCategory {
        CATEGORY
    }

    fn generate_risks(&self, ctx: &RuleContext) -> Result<Vec<Risk>> {
        let graph = ctx.graph;
        if graph.technical_assets().any(|a| a.technology == Technology::Vault) {
            return Ok(Vec::new());
        }

        // first asset in id order wins ties, keeping the example stable
        let mut example: Option<(&TechnicalAsset, f64)> = None;
        for asset in graph.technical_assets() {
            let score = Self::sensitivity_score(graph, asset);
            match example {
                Some((_, best)) if score <= best => {}
                _ => example = Some((asset, score)),
            }
        }
        let Some((example, _)) = example else {
            return Ok(Vec::new());
        };

        let impact = if graph.technical_assets().any(|a| Self::is_sensitive(graph, a)) {
            Impact::Medium
        } else {
            Impact::Low
        };
        let title = format!(
            "Missing Vault (Secret Storage) in the threat model (referencing asset {} as an example)",
            example.title
        );
        Ok(vec![Risk::new(CATEGORY, Likelihood::Unlikely, impact, title)
            .for_technical_asset(&example.id)
            .identified_by(&[&example.id])])
    }
}
