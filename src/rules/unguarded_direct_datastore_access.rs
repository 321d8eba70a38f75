//! Unguarded direct datastore access rule
//!
//! Sensitive datastores should only be reached from within their own
//! network trust boundary. Access from another segment that shares no
//! parent boundary with the datastore is flagged, except for devops
//! traffic, file transfers to file servers, and identity providers reading
//! their identity stores.

use crate::graph::{
    CommunicationLink, Confidentiality, Criticality, TechnicalAsset, TechnicalAssetType,
    Technology, Usage,
};
use crate::models::{DataBreachProbability, Risk, RiskCategory, RiskFunction, Stride};
use crate::rules::base::{RiskRule, RuleConfig, RuleContext};
use crate::scoring::{Impact, Likelihood};
use anyhow::Result;

const DEFAULT_RAA_LIMIT: f64 = 40.0;

const CATEGORY: RiskCategory = RiskCategory {
    id: "unguarded-direct-datastore-access",
    title: "Unguarded Direct Datastore Access",
    description: "Datastores accessed across trust boundaries must be guarded by some protecting service or \
        application.",
    impact: "If this risk is unmitigated, attackers might be able to directly attack sensitive datastores \
        without any protecting components in-between.",
    asvs: "V1 - Architecture, Design and Threat Modeling Requirements",
    cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html",
    action: "Encapsulation of Datastore",
    mitigation: "Encapsulate the datastore access behind a guarding service or application.",
    check: "Are recommendations from the linked cheat sheet and referenced ASVS chapter applied?",
    function: RiskFunction::Architecture,
    stride: Stride::ElevationOfPrivilege,
    detection_logic: "In-scope technical assets of type datastore (except identity-store-ldap when accessed \
        from identity-provider and file-server when accessed via file transfer protocols) with confidentiality \
        rating of confidential (or higher) or with integrity rating of critical (or higher) which have incoming \
        data-flows from assets outside across a network trust boundary. DevOps config and deployment access is \
        excluded from this risk.",
    risk_assessment: "The matching technical assets are at low risk. When either the confidentiality rating is \
        strictly-confidential or the integrity rating is mission-critical, the risk-rating is considered medium. \
        For assets with attractiveness values above 40 the risk-rating increases to medium.",
    false_positives: "When the caller is considered fully trusted as if it was part of the datastore itself.",
    model_failure_possible_reason: false,
    cwe: 501,
};

/// Detects sensitive datastores reached directly from other segments
pub struct UnguardedDirectDatastoreAccessRule {
    config: RuleConfig,
    raa_limit: f64,
}

impl UnguardedDirectDatastoreAccessRule {
    pub fn new() -> Self {
        Self::with_config(RuleConfig::new())
    }

    pub fn with_config(config: RuleConfig) -> Self {
        Self {
            raa_limit: config.get_option_or("raa_limit", DEFAULT_RAA_LIMIT),
            config,
        }
    }

    fn is_file_server_access_via_file_transfer(datastore: &TechnicalAsset, link: &CommunicationLink) -> bool {
        datastore.technology == Technology::FileServer && link.protocol.is_file_transfer()
    }

    fn is_identity_store_access(datastore: &TechnicalAsset, source: &TechnicalAsset) -> bool {
        matches!(
            datastore.technology,
            Technology::IdentityStoreLdap | Technology::IdentityStoreDatabase
        ) && source.technology == Technology::IdentityProvider
    }

    fn create_risk(
        &self,
        datastore: &TechnicalAsset,
        source: &TechnicalAsset,
        link: &CommunicationLink,
        attractiveness: f64,
    ) -> Risk {
        let more_risky = datastore.confidentiality == Confidentiality::StrictlyConfidential
            || datastore.integrity == Criticality::MissionCritical;
        let impact = if more_risky || attractiveness > self.raa_limit {
            Impact::Medium
        } else {
            Impact::Low
        };
        let title = format!(
            "Unguarded Direct Datastore Access of {} by {} via {}",
            datastore.title, source.title, link.title
        );
        Risk::new(CATEGORY, Likelihood::Likely, impact, title)
            .for_technical_asset(&datastore.id)
            .for_communication_link(&link.id)
            .with_breach(DataBreachProbability::Improbable, [datastore.id.as_str()])
            .identified_by(&[&link.id, &source.id, &datastore.id])
    }
}

impl Default for UnguardedDirectDatastoreAccessRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskRule for UnguardedDirectDatastoreAccessRule {
    fn category(&self) -> RiskCategory {
        CATEGORY
    }

    fn config(&self) -> Option<&RuleConfig> {
        Some(&self.config)
    }

    fn generate_risks(&self, ctx: &RuleContext) -> Result<Vec<Risk>> {
        let graph = ctx.graph;
        let mut risks = Vec::new();

        for datastore in graph
            .technical_assets()
            .filter(|a| a.is_in_scope() && a.asset_type == TechnicalAssetType::Datastore)
        {
            if datastore.confidentiality < Confidentiality::Confidential
                && datastore.integrity < Criticality::Critical
            {
                continue;
            }
            for link in graph.incoming_links(&datastore.id) {
                let Some(source) = graph.technical_asset(&link.source_id) else {
                    continue;
                };
                if Self::is_identity_store_access(datastore, source)
                    || Self::is_file_server_access_via_file_transfer(datastore, link)
                    || link.usage == Usage::Devops
                    || !graph.is_across_trust_boundary_network_only(link)
                    || graph.is_sharing_same_parent_trust_boundary(&datastore.id, &source.id)
                {
                    continue;
                }
                risks.push(self.create_risk(datastore, source, link, ctx.attractiveness_of(&datastore.id)));
            }
        }

        Ok(risks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphBuilder, Protocol, ThreatGraph, TrustBoundary, TrustBoundaryType};
    use crate::scoring::{AttractivenessEstimator, ConstantAttractiveness};

    fn run(graph: &ThreatGraph, score: f64) -> Vec<Risk> {
        let scores = ConstantAttractiveness { score }.estimate(graph);
        UnguardedDirectDatastoreAccessRule::new()
            .generate_risks(&RuleContext::new(graph, &scores))
            .unwrap()
    }

    fn split(datastore: TechnicalAsset, source: TechnicalAsset, link: CommunicationLink) -> ThreatGraph {
        GraphBuilder::new("t")
            .technical_asset(datastore)
            .technical_asset(source)
            .trust_boundary(TrustBoundary::new("data", TrustBoundaryType::NetworkOnPrem).containing("db"))
            .trust_boundary(TrustBoundary::new("edge", TrustBoundaryType::NetworkCloudProvider).containing("app"))
            .communication_link(link)
            .build()
            .unwrap()
    }

    fn db(technology: Technology) -> TechnicalAsset {
        TechnicalAsset::new("db", "DB")
            .with_type(TechnicalAssetType::Datastore)
            .with_technology(technology)
            .with_ratings(Confidentiality::Confidential, Criticality::Important, Criticality::Important)
    }

    #[test]
    fn test_cross_segment_access_is_flagged() {
        let graph = split(
            db(Technology::Database),
            TechnicalAsset::new("app", "App"),
            CommunicationLink::new("query", "app", "db", Protocol::JdbcEncrypted),
        );
        let risks = run(&graph, 20.0);

        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].exploitation_impact(), Impact::Low);
        assert_eq!(risks[0].exploitation_likelihood(), Likelihood::Likely);
        assert_eq!(risks[0].synthetic_id(), "unguarded-direct-datastore-access@query@app@db");

        assert_eq!(run(&graph, 80.0)[0].exploitation_impact(), Impact::Medium);
    }

    #[test]
    fn test_exemptions() {
        let mut devops = CommunicationLink::new("deploy", "app", "db", Protocol::Ssh);
        devops.usage = Usage::Devops;
        assert!(run(&split(db(Technology::Database), TechnicalAsset::new("app", "App"), devops), 20.0).is_empty());

        let ftp = CommunicationLink::new("upload", "app", "db", Protocol::Sftp);
        assert!(run(&split(db(Technology::FileServer), TechnicalAsset::new("app", "App"), ftp), 20.0).is_empty());

        let idp = TechnicalAsset::new("app", "IdP").with_technology(Technology::IdentityProvider);
        let lookup = CommunicationLink::new("lookup", "app", "db", Protocol::Ldaps);
        assert!(run(&split(db(Technology::IdentityStoreLdap), idp, lookup), 20.0).is_empty());
    }

    #[test]
    fn test_shared_parent_boundary_is_fine() {
        let graph = GraphBuilder::new("t")
            .technical_asset(db(Technology::Database))
            .technical_asset(TechnicalAsset::new("app", "App"))
            .trust_boundary(TrustBoundary::new("data", TrustBoundaryType::NetworkCloudSecurityGroup).containing("db"))
            .trust_boundary(TrustBoundary::new("edge", TrustBoundaryType::NetworkCloudSecurityGroup).containing("app"))
            .trust_boundary(
                TrustBoundary::new("vpc", TrustBoundaryType::NetworkCloudProvider)
                    .nesting("data")
                    .nesting("edge"),
            )
            .communication_link(CommunicationLink::new("query", "app", "db", Protocol::Jdbc))
            .build()
            .unwrap();
        assert!(run(&graph, 20.0).is_empty());
    }
}
