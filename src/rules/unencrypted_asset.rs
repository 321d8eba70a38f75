//! Unencrypted technical asset rule
//!
//! Assets handling confidential or critical data must encrypt it at rest.
//! Very sensitive assets that usually store end-user data additionally
//! need per-user keys; transparent or shared-key encryption is not enough
//! for them.

use crate::graph::{Confidentiality, Criticality, EncryptionStyle, TechnicalAsset, Technology, ThreatGraph};
use crate::models::{DataBreachProbability, Risk, RiskCategory, RiskFunction, Stride};
use crate::rules::base::{RiskRule, RuleContext};
use crate::scoring::{Impact, Likelihood};
use anyhow::Result;

const CATEGORY: RiskCategory = RiskCategory {
    id: "unencrypted-asset",
    title: "Unencrypted Technical Assets",
    description: "Due to the confidentiality rating of the technical asset itself and/or the processed data \
        assets this technical asset must be encrypted. The risk rating depends on the sensitivity of the \
        technical asset itself and of the data assets stored.",
    impact: "If this risk is unmitigated, attackers might be able to access unencrypted data when \
        successfully compromising sensitive components.",
    asvs: "V6 - Stored Cryptography Verification Requirements",
    cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Cryptographic_Storage_Cheat_Sheet.html",
    action: "Encryption of Technical Asset",
    mitigation: "Apply encryption to the technical asset.",
    check: "Are recommendations from the linked cheat sheet and referenced ASVS chapter applied?",
    function: RiskFunction::Operations,
    stride: Stride::InformationDisclosure,
    detection_logic: "In-scope unencrypted technical assets (excluding reverse-proxy, load-balancer, waf, \
        ids, ips and embedded components like library) storing data assets rated at least as confidential \
        or critical. For technical assets storing data assets rated as strictly-confidential or \
        mission-critical the encryption must be of type data-with-enduser-individual-key.",
    risk_assessment: "Depending on the confidentiality rating of the stored data assets either medium or high risk.",
    false_positives: "When all sensitive data stored within the asset is already fully encrypted on \
        document or data level.",
    model_failure_possible_reason: false,
    cwe: 311,
};

/// Routing components without storage of their own
fn is_encryption_waived(asset: &TechnicalAsset) -> bool {
    matches!(
        asset.technology,
        Technology::ReverseProxy
            | Technology::LoadBalancer
            | Technology::Waf
            | Technology::Ids
            | Technology::Ips
    ) || asset.technology.is_embedded_component()
}

/// Detects sensitive assets without (sufficient) encryption at rest
pub struct UnencryptedAssetRule;

impl UnencryptedAssetRule {
    pub fn new() -> Self {
        Self
    }

    fn evaluate(graph: &ThreatGraph, asset: &TechnicalAsset) -> Option<Risk> {
        let confidentiality = asset.highest_confidentiality(graph);
        let integrity = asset.highest_integrity(graph);
        if confidentiality < Confidentiality::Confidential && integrity < Criticality::Critical {
            return None;
        }

        let very_sensitive = confidentiality == Confidentiality::StrictlyConfidential
            || integrity == Criticality::MissionCritical;
        let requires_enduser_key = very_sensitive && asset.technology.is_usually_storing_enduser_data();

        let impact = match asset.encryption {
            EncryptionStyle::None if very_sensitive => Impact::High,
            EncryptionStyle::None => Impact::Medium,
            EncryptionStyle::Transparent
            | EncryptionStyle::DataWithSymmetricSharedKey
            | EncryptionStyle::DataWithAsymmetricSharedKey
                if requires_enduser_key =>
            {
                Impact::Medium
            }
            _ => return None,
        };

        let mut title = format!("Unencrypted Technical Asset named {}", asset.title);
        if requires_enduser_key {
            title.push_str(&format!(
                " missing enduser-individual encryption with {}",
                EncryptionStyle::DataWithEnduserIndividualKey
            ));
        }

        Some(
            Risk::new(CATEGORY, Likelihood::Unlikely, impact, title)
                .for_technical_asset(&asset.id)
                .with_breach(DataBreachProbability::Improbable, [asset.id.as_str()])
                .identified_by(&[&asset.id]),
        )
    }
}

impl Default for UnencryptedAssetRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskRule for UnencryptedAssetRule {
    fn category(&self) -> RiskCategory {
        CATEGORY
    }

    fn generate_risks(&self, ctx: &RuleContext) -> Result<Vec<Risk>> {
        Ok(ctx
            .graph
            .technical_assets()
            .filter(|a| a.is_in_scope() && !is_encryption_waived(a))
            .filter_map(|a| Self::evaluate(ctx.graph, a))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DataAsset, GraphBuilder};
    use crate::rules::test_support::run_rule;

    fn store(encryption: EncryptionStyle, c: Confidentiality) -> ThreatGraph {
        let mut db = TechnicalAsset::new("db", "DB")
            .with_technology(Technology::Database)
            .storing("records");
        db.encryption = encryption;
        GraphBuilder::new("t")
            .data_asset(DataAsset::new("records", "Records").with_ratings(
                c,
                Criticality::Operational,
                Criticality::Operational,
            ))
            .technical_asset(db)
            .build()
            .unwrap()
    }

    #[test]
    fn test_unencrypted_confidential_store() {
        let risks = run_rule(
            &UnencryptedAssetRule::new(),
            &store(EncryptionStyle::None, Confidentiality::Confidential),
        );
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].exploitation_impact(), Impact::Medium);
        assert_eq!(risks[0].synthetic_id(), "unencrypted-asset@db");
    }

    #[test]
    fn test_strictly_confidential_store_needs_enduser_keys() {
        let unencrypted = run_rule(
            &UnencryptedAssetRule::new(),
            &store(EncryptionStyle::None, Confidentiality::StrictlyConfidential),
        );
        assert_eq!(unencrypted[0].exploitation_impact(), Impact::High);

        let transparent = run_rule(
            &UnencryptedAssetRule::new(),
            &store(EncryptionStyle::Transparent, Confidentiality::StrictlyConfidential),
        );
        assert_eq!(transparent.len(), 1);
        assert_eq!(transparent[0].exploitation_impact(), Impact::Medium);
        assert!(transparent[0].title.contains("data-with-enduser-individual-key"));

        let enduser = run_rule(
            &UnencryptedAssetRule::new(),
            &store(
                EncryptionStyle::DataWithEnduserIndividualKey,
                Confidentiality::StrictlyConfidential,
            ),
        );
        assert!(enduser.is_empty());
    }

    #[test]
    fn test_public_data_needs_no_encryption() {
        let risks = run_rule(
            &UnencryptedAssetRule::new(),
            &store(EncryptionStyle::None, Confidentiality::Internal),
        );
        assert!(risks.is_empty());
    }
}
