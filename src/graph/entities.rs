//! Model entities: technical assets, data assets, links, boundaries, runtimes
//!
//! Entities are plain data. Relationships are expressed by id, and every
//! id-keyed collection is a `BTreeSet` so iteration order is the id order.
//! Queries that need the rest of the model live on [`super::ThreatGraph`].

use super::classification::{
    Authentication, Authorization, Confidentiality, Criticality, EncryptionStyle, Machine,
    Quantity, TechnicalAssetSize, TechnicalAssetType, TrustBoundaryType, Usage,
};
use super::technology::{Protocol, Technology};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A modeled system component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TechnicalAsset {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub asset_type: TechnicalAssetType,
    pub size: TechnicalAssetSize,
    pub technology: Technology,
    pub machine: Machine,
    pub encryption: EncryptionStyle,
    pub confidentiality: Confidentiality,
    pub integrity: Criticality,
    pub availability: Criticality,
    pub internet: bool,
    pub multi_tenant: bool,
    pub redundant: bool,
    pub custom_developed_parts: bool,
    pub out_of_scope: bool,
    pub used_as_client_by_human: bool,
    /// Directly containing trust boundary. Filled in from boundary membership
    /// when the graph is built.
    pub trust_boundary_id: Option<String>,
    pub data_assets_processed: BTreeSet<String>,
    pub data_assets_stored: BTreeSet<String>,
    pub tags: BTreeSet<String>,
}

impl TechnicalAsset {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_technology(mut self, technology: Technology) -> Self {
        self.technology = technology;
        self
    }

    pub fn with_type(mut self, asset_type: TechnicalAssetType) -> Self {
        self.asset_type = asset_type;
        self
    }

    pub fn with_ratings(
        mut self,
        confidentiality: Confidentiality,
        integrity: Criticality,
        availability: Criticality,
    ) -> Self {
        self.confidentiality = confidentiality;
        self.integrity = integrity;
        self.availability = availability;
        self
    }

    pub fn processing(mut self, data_asset_id: impl Into<String>) -> Self {
        self.data_assets_processed.insert(data_asset_id.into());
        self
    }

    pub fn storing(mut self, data_asset_id: impl Into<String>) -> Self {
        self.data_assets_stored.insert(data_asset_id.into());
        self
    }

    pub fn internet_facing(mut self) -> Self {
        self.internet = true;
        self
    }

    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn is_in_scope(&self) -> bool {
        !self.out_of_scope
    }

    pub fn is_tagged(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Processed or stored data asset ids, deduplicated and sorted
    pub fn data_assets_handled(&self) -> BTreeSet<&str> {
        self.data_assets_processed
            .iter()
            .chain(self.data_assets_stored.iter())
            .map(String::as_str)
            .collect()
    }
}

/// A category of data flowing through or stored by technical assets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DataAsset {
    pub id: String,
    pub title: String,
    pub description: String,
    pub usage: Usage,
    pub origin: String,
    pub owner: String,
    pub quantity: Quantity,
    pub confidentiality: Confidentiality,
    pub integrity: Criticality,
    pub availability: Criticality,
    pub tags: BTreeSet<String>,
}

impl DataAsset {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_ratings(
        mut self,
        confidentiality: Confidentiality,
        integrity: Criticality,
        availability: Criticality,
    ) -> Self {
        self.confidentiality = confidentiality;
        self.integrity = integrity;
        self.availability = availability;
        self
    }
}

/// A directed communication from a source asset to a target asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CommunicationLink {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "source")]
    pub source_id: String,
    #[serde(rename = "target")]
    pub target_id: String,
    pub protocol: Protocol,
    pub authentication: Authentication,
    pub authorization: Authorization,
    pub usage: Usage,
    pub vpn: bool,
    pub ip_filtered: bool,
    pub readonly: bool,
    pub data_assets_sent: BTreeSet<String>,
    pub data_assets_received: BTreeSet<String>,
    pub tags: BTreeSet<String>,
}

impl CommunicationLink {
    pub fn new(
        id: impl Into<String>,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        protocol: Protocol,
    ) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            source_id: source_id.into(),
            target_id: target_id.into(),
            protocol,
            ..Default::default()
        }
    }

    pub fn with_authentication(mut self, authentication: Authentication) -> Self {
        self.authentication = authentication;
        self
    }

    pub fn sending(mut self, data_asset_id: impl Into<String>) -> Self {
        self.data_assets_sent.insert(data_asset_id.into());
        self
    }

    pub fn receiving(mut self, data_asset_id: impl Into<String>) -> Self {
        self.data_assets_received.insert(data_asset_id.into());
        self
    }

    /// Sent and received data asset ids, deduplicated and sorted
    pub fn data_assets_transferred(&self) -> BTreeSet<&str> {
        self.data_assets_sent
            .iter()
            .chain(self.data_assets_received.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn carries_no_data(&self) -> bool {
        self.data_assets_sent.is_empty() && self.data_assets_received.is_empty()
    }
}

/// A network or execution-environment grouping of technical assets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TrustBoundary {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub boundary_type: TrustBoundaryType,
    pub technical_assets_inside: BTreeSet<String>,
    pub trust_boundaries_nested: BTreeSet<String>,
    pub tags: BTreeSet<String>,
}

impl TrustBoundary {
    pub fn new(id: impl Into<String>, boundary_type: TrustBoundaryType) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            boundary_type,
            ..Default::default()
        }
    }

    pub fn containing(mut self, asset_id: impl Into<String>) -> Self {
        self.technical_assets_inside.insert(asset_id.into());
        self
    }

    pub fn nesting(mut self, boundary_id: impl Into<String>) -> Self {
        self.trust_boundaries_nested.insert(boundary_id.into());
        self
    }
}

/// Technical assets co-located on one execution substrate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SharedRuntime {
    pub id: String,
    pub title: String,
    pub description: String,
    pub technical_assets_running: BTreeSet<String>,
    pub tags: BTreeSet<String>,
}

impl SharedRuntime {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            ..Default::default()
        }
    }

    pub fn running(mut self, asset_id: impl Into<String>) -> Self {
        self.technical_assets_running.insert(asset_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_defaults_from_minimal_json() {
        let asset: TechnicalAsset =
            serde_json::from_str(r#"{"id": "web", "title": "Web", "type": "datastore"}"#).unwrap();
        assert_eq!(asset.asset_type, TechnicalAssetType::Datastore);
        assert_eq!(asset.technology, Technology::UnknownTechnology);
        assert!(asset.is_in_scope());
        assert!(asset.trust_boundary_id.is_none());
    }

    #[test]
    fn test_link_source_and_target_names() {
        let link: CommunicationLink = serde_json::from_str(
            r#"{"id": "l1", "source": "a", "target": "b", "protocol": "https",
                "data_assets_sent": ["d2", "d1"]}"#,
        )
        .unwrap();
        assert_eq!(link.source_id, "a");
        assert_eq!(link.target_id, "b");
        let sent: Vec<_> = link.data_assets_sent.iter().cloned().collect();
        assert_eq!(sent, vec!["d1".to_string(), "d2".to_string()]);
        assert!(!link.carries_no_data());
    }

    #[test]
    fn test_handled_data_is_deduplicated() {
        let asset = TechnicalAsset::new("db", "DB")
            .processing("customers")
            .storing("customers")
            .storing("orders");
        let handled: Vec<_> = asset.data_assets_handled().into_iter().collect();
        assert_eq!(handled, vec!["customers", "orders"]);
    }
}
