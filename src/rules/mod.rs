//! Risk rules
//!
//! This module provides the rule framework and the built-in rule catalog.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       RuleEngine                            │
//! │  - Validates the graph                                      │
//! │  - Estimates attractiveness once                            │
//! │  - Runs rules in parallel (rayon), isolating failures       │
//! │  - Merges risks into a RiskCollection                       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      RiskRule Trait                         │
//! │  - category(): static metadata, id is the rule id           │
//! │  - supported_tags(): tags the rule recognizes               │
//! │  - generate_risks(ctx): scan the graph, return risks        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Rule Catalog
//!
//! ## Communication
//! - `UnencryptedCommunicationRule` - sensitive data over plaintext protocols
//! - `MissingAuthenticationRule` - callers of sensitive assets without authentication
//! - `UnnecessaryCommunicationLinkRule` - links carrying no data
//!
//! ## Isolation and segmentation
//! - `MissingNetworkSegmentationRule` - sensitive assets next to unrelated ones
//! - `MissingVaultIsolationRule` - vaults sharing a segment with unrelated assets
//! - `MissingIdentityProviderIsolationRule` - identity providers sharing a segment
//! - `MixedTargetsOnSharedRuntimeRule` - runtimes hosting targets of different value
//!
//! ## Exposure
//! - `UnguardedAccessFromInternetRule` - sensitive assets called from the internet
//! - `UnguardedDirectDatastoreAccessRule` - datastores reached across boundaries
//! - `DosRiskyAccessAcrossTrustBoundaryRule` - availability-critical assets reachable from afar
//! - `MissingWafRule` - web endpoints without a WAF
//!
//! ## Protection
//! - `UnencryptedAssetRule` - sensitive assets without encryption at rest
//! - `MissingHardeningRule` - highly attractive assets
//! - `MissingVaultRule` - no secret storage in the model
//!
//! ## Model quality
//! - `UnnecessaryDataAssetRule` - data assets nobody touches
//! - `IncompleteModelRule` - unknown technologies or protocols

mod base;
mod engine;
mod isolation;

// Communication
mod missing_authentication;
mod unencrypted_communication;
mod unnecessary_communication_link;

// Isolation and segmentation
mod missing_identity_provider_isolation;
mod missing_network_segmentation;
mod missing_vault_isolation;
mod mixed_targets_on_shared_runtime;

// Exposure
mod dos_risky_access_across_trust_boundary;
mod missing_waf;
mod unguarded_access_from_internet;
mod unguarded_direct_datastore_access;

// Protection
mod missing_hardening;
mod missing_vault;
mod unencrypted_asset;

// Model quality
mod incomplete_model;
mod unnecessary_data_asset;

pub use base::{EvaluationSummary, ProgressCallback, RiskRule, RuleConfig, RuleContext, RuleResult};
pub use engine::{EvaluationReport, RuleEngine, RuleEngineBuilder};

pub use dos_risky_access_across_trust_boundary::DosRiskyAccessAcrossTrustBoundaryRule;
pub use incomplete_model::IncompleteModelRule;
pub use missing_authentication::MissingAuthenticationRule;
pub use missing_hardening::MissingHardeningRule;
pub use missing_identity_provider_isolation::MissingIdentityProviderIsolationRule;
pub use missing_network_segmentation::MissingNetworkSegmentationRule;
pub use missing_vault::MissingVaultRule;
pub use missing_vault_isolation::MissingVaultIsolationRule;
pub use missing_waf::MissingWafRule;
pub use mixed_targets_on_shared_runtime::MixedTargetsOnSharedRuntimeRule;
pub use unencrypted_asset::UnencryptedAssetRule;
pub use unencrypted_communication::UnencryptedCommunicationRule;
pub use unguarded_access_from_internet::UnguardedAccessFromInternetRule;
pub use unguarded_direct_datastore_access::UnguardedDirectDatastoreAccessRule;
pub use unnecessary_communication_link::UnnecessaryCommunicationLinkRule;
pub use unnecessary_data_asset::UnnecessaryDataAssetRule;

use crate::config::ProjectConfig;
use crate::scoring::estimator_by_name;
use anyhow::Context;
use std::sync::Arc;
use tracing::debug;

/// Every built-in rule with default thresholds
pub fn default_catalog() -> Vec<Arc<dyn RiskRule>> {
    vec![
        // Communication
        Arc::new(UnencryptedCommunicationRule::new()),
        Arc::new(MissingAuthenticationRule::new()),
        Arc::new(UnnecessaryCommunicationLinkRule::new()),
        // Isolation and segmentation
        Arc::new(MissingNetworkSegmentationRule::new()),
        Arc::new(MissingVaultIsolationRule::new()),
        Arc::new(MissingIdentityProviderIsolationRule::new()),
        Arc::new(MixedTargetsOnSharedRuntimeRule::new()),
        // Exposure
        Arc::new(UnguardedAccessFromInternetRule::new()),
        Arc::new(UnguardedDirectDatastoreAccessRule::new()),
        Arc::new(DosRiskyAccessAcrossTrustBoundaryRule::new()),
        Arc::new(MissingWafRule::new()),
        // Protection
        Arc::new(UnencryptedAssetRule::new()),
        Arc::new(MissingHardeningRule::new()),
        Arc::new(MissingVaultRule::new()),
        // Model quality
        Arc::new(UnnecessaryDataAssetRule::new()),
        Arc::new(IncompleteModelRule::new()),
    ]
}

/// The catalog as configured by the project: disabled rules removed and
/// threshold overrides applied
pub fn catalog_from_config(config: &ProjectConfig) -> Vec<Arc<dyn RiskRule>> {
    let options = |id: &str| RuleConfig::from(config.rule_options(id));

    let configured: Vec<Arc<dyn RiskRule>> = default_catalog()
        .into_iter()
        .map(|rule| -> Arc<dyn RiskRule> {
            match rule.id() {
                id @ "missing-network-segmentation" => {
                    Arc::new(MissingNetworkSegmentationRule::with_config(options(id)))
                }
                id @ "missing-hardening" => Arc::new(MissingHardeningRule::with_config(options(id))),
                id @ "unguarded-access-from-internet" => {
                    Arc::new(UnguardedAccessFromInternetRule::with_config(options(id)))
                }
                id @ "unguarded-direct-datastore-access" => {
                    Arc::new(UnguardedDirectDatastoreAccessRule::with_config(options(id)))
                }
                _ => rule,
            }
        })
        .collect();

    configured
        .into_iter()
        .filter(|rule| {
            let enabled = config.is_rule_enabled(rule.id());
            if !enabled {
                debug!("Rule {} disabled by configuration", rule.id());
            }
            enabled
        })
        .collect()
}

/// Build an engine running the configured catalog with the configured
/// attractiveness estimator
pub fn create_engine(workers: usize, config: &ProjectConfig) -> anyhow::Result<RuleEngine> {
    let estimator = estimator_by_name(&config.attractiveness.estimator, config.attractiveness.seed)
        .context("Invalid [attractiveness] configuration")?;
    Ok(RuleEngineBuilder::new()
        .workers(workers)
        .estimator(Arc::from(estimator))
        .rules(catalog_from_config(config))
        .build())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleConfigOverride;
    use std::collections::BTreeSet;

    #[test]
    fn test_catalog_ids_are_unique() {
        let catalog = default_catalog();
        let ids: BTreeSet<&str> = catalog.iter().map(|r| r.id()).collect();
        assert_eq!(ids.len(), catalog.len());
        assert_eq!(catalog.len(), 16);
        assert!(ids.contains("unencrypted-communication"));
        assert!(ids.contains("unnecessary-data-asset"));
    }

    #[test]
    fn test_catalog_categories_are_complete() {
        for rule in default_catalog() {
            let category = rule.category();
            assert!(!category.title.is_empty(), "{} has no title", category.id);
            assert!(!category.mitigation.is_empty(), "{} has no mitigation", category.id);
            assert!(category.cwe > 0, "{} has no CWE", category.id);
        }
    }

    #[test]
    fn test_catalog_from_config_disables_and_configures() {
        let mut config = ProjectConfig::default();
        config.rules.insert(
            "MissingVaultRule".to_string(),
            RuleConfigOverride {
                enabled: Some(false),
                ..Default::default()
            },
        );
        config.defaults.skip_rules.push("missing_waf".to_string());

        let catalog = catalog_from_config(&config);
        let ids: Vec<&str> = catalog.iter().map(|r| r.id()).collect();
        assert_eq!(catalog.len(), 14);
        assert!(!ids.contains(&"missing-vault"));
        assert!(!ids.contains(&"missing-waf"));
        assert!(catalog
            .iter()
            .any(|r| r.id() == "missing-hardening" && r.config().is_some()));
    }

    #[test]
    fn test_create_engine_uses_configured_estimator() {
        let mut config = ProjectConfig::default();
        config.attractiveness.estimator = "constant".to_string();
        let engine = create_engine(2, &config).unwrap();
        assert_eq!(engine.estimator_name(), "constant");
        assert_eq!(engine.workers(), 2);
        assert_eq!(engine.rule_count(), 16);

        config.attractiveness.estimator = "psychic".to_string();
        assert!(create_engine(2, &config).is_err());
    }
}
