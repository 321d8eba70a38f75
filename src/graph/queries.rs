//! Read-only traversal queries over a [`ThreatGraph`]
//!
//! Every query is total: unknown ids, isolated assets and self queries give
//! empty collections or `false`. Returned collections are sorted by id.

use super::classification::{Confidentiality, Criticality, TrustBoundaryType};
use super::entities::{CommunicationLink, DataAsset, TechnicalAsset, TrustBoundary};
use super::store::ThreatGraph;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::BTreeSet;

impl ThreatGraph {
    /// Links targeting the asset, sorted by link id
    pub fn incoming_links(&self, asset_id: &str) -> Vec<&CommunicationLink> {
        self.links_in_direction(asset_id, Direction::Incoming)
    }

    /// Links originating at the asset, sorted by link id
    pub fn outgoing_links(&self, asset_id: &str) -> Vec<&CommunicationLink> {
        self.links_in_direction(asset_id, Direction::Outgoing)
    }

    fn links_in_direction(&self, asset_id: &str, direction: Direction) -> Vec<&CommunicationLink> {
        let Some(node) = self.node_of(asset_id) else {
            return Vec::new();
        };
        let mut links: Vec<&CommunicationLink> = self
            .links
            .edges_directed(node, direction)
            .filter_map(|edge| self.communication_link(edge.weight()))
            .collect();
        links.sort_by(|a, b| a.id.cmp(&b.id));
        links
    }

    pub fn direct_boundary_of(&self, asset_id: &str) -> Option<&TrustBoundary> {
        self.technical_asset(asset_id)
            .and_then(|asset| asset.trust_boundary_id.as_deref())
            .and_then(|id| self.trust_boundary(id))
    }

    pub fn parent_boundary_of(&self, boundary_id: &str) -> Option<&TrustBoundary> {
        self.parent_boundary
            .get(boundary_id)
            .and_then(|id| self.trust_boundary(id))
    }

    /// Ancestors of a boundary, nearest first, excluding the boundary itself
    pub fn all_parent_boundaries(&self, boundary_id: &str) -> Vec<&TrustBoundary> {
        let mut parents = Vec::new();
        let mut current = boundary_id;
        // validation guarantees the chain is acyclic
        while let Some(parent) = self.parent_boundary_of(current) {
            parents.push(parent);
            current = &parent.id;
        }
        parents
    }

    /// Assets inside the boundary, following nested boundaries, sorted by id
    pub fn assets_inside_boundary(&self, boundary_id: &str) -> Vec<&TechnicalAsset> {
        let mut ids: BTreeSet<&str> = BTreeSet::new();
        let mut pending: Vec<&str> = vec![boundary_id];
        let mut visited: BTreeSet<&str> = BTreeSet::new();
        while let Some(current) = pending.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(boundary) = self.trust_boundary(current) else {
                continue;
            };
            ids.extend(boundary.technical_assets_inside.iter().map(String::as_str));
            pending.extend(boundary.trust_boundaries_nested.iter().map(String::as_str));
        }
        ids.into_iter()
            .filter_map(|id| self.technical_asset(id))
            .collect()
    }

    /// The network boundary an asset lives in.
    ///
    /// When the asset sits in an execution environment, the nearest
    /// network-kind ancestor is used instead. `None` is the implicit outer
    /// network.
    pub fn network_boundary_of(&self, asset_id: &str) -> Option<&TrustBoundary> {
        let direct = self.direct_boundary_of(asset_id)?;
        if direct.boundary_type.is_network_boundary() {
            return Some(direct);
        }
        self.all_parent_boundaries(&direct.id)
            .into_iter()
            .find(|b| b.boundary_type.is_network_boundary())
    }

    pub fn is_same_trust_boundary_network_only(&self, a: &str, b: &str) -> bool {
        if a == b || self.technical_asset(a).is_none() || self.technical_asset(b).is_none() {
            return false;
        }
        let left = self.network_boundary_of(a).map(|tb| tb.id.as_str());
        let right = self.network_boundary_of(b).map(|tb| tb.id.as_str());
        left == right
    }

    pub fn is_same_execution_environment(&self, a: &str, b: &str) -> bool {
        if a == b {
            return false;
        }
        match (self.direct_boundary_of(a), self.direct_boundary_of(b)) {
            (Some(left), Some(right)) => {
                left.id == right.id
                    && left.boundary_type == TrustBoundaryType::ExecutionEnvironment
            }
            _ => false,
        }
    }

    /// A link exists between both assets in either direction
    pub fn has_direct_connection(&self, a: &str, b: &str) -> bool {
        if a == b {
            return false;
        }
        match (self.node_of(a), self.node_of(b)) {
            (Some(left), Some(right)) => {
                self.links.contains_edge(left, right) || self.links.contains_edge(right, left)
            }
            _ => false,
        }
    }

    /// Source and target resolve to different network boundaries
    pub fn is_across_trust_boundary_network_only(&self, link: &CommunicationLink) -> bool {
        if self.technical_asset(&link.source_id).is_none()
            || self.technical_asset(&link.target_id).is_none()
        {
            return false;
        }
        let source = self.network_boundary_of(&link.source_id).map(|tb| tb.id.as_str());
        let target = self.network_boundary_of(&link.target_id).map(|tb| tb.id.as_str());
        source != target
    }

    /// Both assets are unbounded, share their direct boundary, or share any
    /// ancestor boundary.
    pub fn is_sharing_same_parent_trust_boundary(&self, a: &str, b: &str) -> bool {
        let (Some(left), Some(right)) = (self.technical_asset(a), self.technical_asset(b)) else {
            return false;
        };
        match (&left.trust_boundary_id, &right.trust_boundary_id) {
            (None, None) => true,
            (None, Some(_)) | (Some(_), None) => false,
            (Some(l), Some(r)) if l == r => true,
            (Some(l), Some(r)) => {
                let left_chain = self.boundary_chain(l);
                let right_chain = self.boundary_chain(r);
                left_chain.iter().any(|id| right_chain.contains(id))
            }
        }
    }

    fn boundary_chain<'a>(&'a self, boundary_id: &'a str) -> BTreeSet<&'a str> {
        let mut chain: BTreeSet<&str> = BTreeSet::new();
        chain.insert(boundary_id);
        chain.extend(
            self.all_parent_boundaries(boundary_id)
                .into_iter()
                .map(|tb| tb.id.as_str()),
        );
        chain
    }

    /// Links sending or receiving the data asset, sorted by link id
    pub fn links_carrying(&self, data_asset_id: &str) -> Vec<&CommunicationLink> {
        self.communication_links()
            .filter(|link| {
                link.data_assets_sent.contains(data_asset_id)
                    || link.data_assets_received.contains(data_asset_id)
            })
            .collect()
    }

    /// Assets processing or storing the data asset, plus both ends of every
    /// link carrying it. Sorted by id.
    pub fn assets_handling(&self, data_asset_id: &str) -> Vec<&TechnicalAsset> {
        let mut ids: BTreeSet<&str> = self
            .technical_assets()
            .filter(|asset| {
                asset.data_assets_processed.contains(data_asset_id)
                    || asset.data_assets_stored.contains(data_asset_id)
            })
            .map(|asset| asset.id.as_str())
            .collect();
        for link in self.links_carrying(data_asset_id) {
            ids.insert(link.source_id.as_str());
            ids.insert(link.target_id.as_str());
        }
        ids.into_iter()
            .filter_map(|id| self.technical_asset(id))
            .collect()
    }

    /// Data asset is never processed, stored, sent or received
    pub fn is_data_asset_unused(&self, data_asset_id: &str) -> bool {
        self.data_asset(data_asset_id).is_some()
            && self
                .technical_assets()
                .all(|asset| !asset.data_assets_handled().contains(data_asset_id))
            && self.links_carrying(data_asset_id).is_empty()
    }

    fn resolve_data<'a>(&'a self, ids: impl Iterator<Item = &'a str>) -> impl Iterator<Item = &'a DataAsset> {
        ids.filter_map(move |id| self.data_asset(id))
    }
}

impl TechnicalAsset {
    pub fn highest_confidentiality(&self, graph: &ThreatGraph) -> Confidentiality {
        graph
            .resolve_data(self.data_assets_handled().into_iter())
            .map(|data| data.confidentiality)
            .fold(self.confidentiality, Ord::max)
    }

    pub fn highest_integrity(&self, graph: &ThreatGraph) -> Criticality {
        graph
            .resolve_data(self.data_assets_handled().into_iter())
            .map(|data| data.integrity)
            .fold(self.integrity, Ord::max)
    }

    pub fn highest_availability(&self, graph: &ThreatGraph) -> Criticality {
        graph
            .resolve_data(self.data_assets_handled().into_iter())
            .map(|data| data.availability)
            .fold(self.availability, Ord::max)
    }

    /// Any peak at the top tier
    pub fn is_very_sensitive(&self, graph: &ThreatGraph) -> bool {
        self.highest_confidentiality(graph) == Confidentiality::StrictlyConfidential
            || self.highest_integrity(graph) == Criticality::MissionCritical
            || self.highest_availability(graph) == Criticality::MissionCritical
    }
}

impl CommunicationLink {
    /// Peak confidentiality of the transferred data; `public` without data
    pub fn highest_confidentiality(&self, graph: &ThreatGraph) -> Confidentiality {
        graph
            .resolve_data(self.data_assets_transferred().into_iter())
            .map(|data| data.confidentiality)
            .fold(Confidentiality::Public, Ord::max)
    }

    /// Peak integrity of the transferred data; `archive` without data
    pub fn highest_integrity(&self, graph: &ThreatGraph) -> Criticality {
        graph
            .resolve_data(self.data_assets_transferred().into_iter())
            .map(|data| data.integrity)
            .fold(Criticality::Archive, Ord::max)
    }

    pub fn highest_availability(&self, graph: &ThreatGraph) -> Criticality {
        graph
            .resolve_data(self.data_assets_transferred().into_iter())
            .map(|data| data.availability)
            .fold(Criticality::Archive, Ord::max)
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::classification::{Confidentiality, Criticality, TrustBoundaryType};
    use crate::graph::technology::Protocol;
    use crate::graph::{
        CommunicationLink, DataAsset, GraphBuilder, TechnicalAsset, ThreatGraph, TrustBoundary,
    };

    fn asset(id: &str) -> TechnicalAsset {
        TechnicalAsset::new(id, id)
    }

    /// net
    /// ├── env (execution environment): vault, web
    /// └── db
    /// dmz: proxy
    /// loose (no boundary)
    fn sample() -> ThreatGraph {
        GraphBuilder::new("sample")
            .technical_assets(["vault", "web", "db", "proxy", "loose"].map(asset))
            .data_asset(DataAsset::new("secrets", "Secrets").with_ratings(
                Confidentiality::StrictlyConfidential,
                Criticality::Critical,
                Criticality::Operational,
            ))
            .communication_link(
                CommunicationLink::new("web-db", "web", "db", Protocol::Jdbc).sending("secrets"),
            )
            .communication_link(CommunicationLink::new("proxy-web", "proxy", "web", Protocol::Https))
            .communication_link(CommunicationLink::new("loose-web", "loose", "web", Protocol::Http))
            .trust_boundary(
                TrustBoundary::new("net", TrustBoundaryType::NetworkOnPrem)
                    .containing("db")
                    .nesting("env"),
            )
            .trust_boundary(
                TrustBoundary::new("env", TrustBoundaryType::ExecutionEnvironment)
                    .containing("vault")
                    .containing("web"),
            )
            .trust_boundary(TrustBoundary::new("dmz", TrustBoundaryType::NetworkOnPrem).containing("proxy"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_incoming_links_sorted() {
        let graph = sample();
        let ids: Vec<_> = graph.incoming_links("web").iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["loose-web", "proxy-web"]);
        assert!(graph.incoming_links("vault").is_empty());
        assert!(graph.incoming_links("ghost").is_empty());
        assert_eq!(graph.outgoing_links("web").len(), 1);
    }

    #[test]
    fn test_assets_inside_boundary_is_transitive() {
        let graph = sample();
        let ids: Vec<_> = graph
            .assets_inside_boundary("net")
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(ids, vec!["db", "vault", "web"]);
        assert!(graph.assets_inside_boundary("ghost").is_empty());
    }

    #[test]
    fn test_network_boundary_climbs_out_of_execution_environment() {
        let graph = sample();
        assert_eq!(graph.network_boundary_of("web").unwrap().id, "net");
        assert!(graph.is_same_trust_boundary_network_only("web", "db"));
        assert!(!graph.is_same_trust_boundary_network_only("web", "proxy"));
        assert!(!graph.is_same_trust_boundary_network_only("web", "web"));
    }

    #[test]
    fn test_execution_environment() {
        let graph = sample();
        assert!(graph.is_same_execution_environment("vault", "web"));
        assert!(!graph.is_same_execution_environment("vault", "db"));
        assert!(!graph.is_same_execution_environment("vault", "vault"));
    }

    #[test]
    fn test_direct_connection_either_direction() {
        let graph = sample();
        assert!(graph.has_direct_connection("db", "web"));
        assert!(graph.has_direct_connection("web", "db"));
        assert!(!graph.has_direct_connection("vault", "web"));
        assert!(!graph.has_direct_connection("web", "web"));
    }

    #[test]
    fn test_across_trust_boundary() {
        let graph = sample();
        let proxy_web = graph.communication_link("proxy-web").unwrap();
        let web_db = graph.communication_link("web-db").unwrap();
        let loose_web = graph.communication_link("loose-web").unwrap();
        assert!(graph.is_across_trust_boundary_network_only(proxy_web));
        assert!(!graph.is_across_trust_boundary_network_only(web_db));
        assert!(graph.is_across_trust_boundary_network_only(loose_web));
    }

    #[test]
    fn test_sharing_parent_boundary() {
        let graph = sample();
        assert!(graph.is_sharing_same_parent_trust_boundary("web", "db"));
        assert!(!graph.is_sharing_same_parent_trust_boundary("web", "proxy"));
        assert!(!graph.is_sharing_same_parent_trust_boundary("web", "loose"));
        assert!(graph.is_sharing_same_parent_trust_boundary("loose", "loose"));
    }

    #[test]
    fn test_data_handling_and_peaks() {
        let graph = sample();
        let handlers: Vec<_> = graph
            .assets_handling("secrets")
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(handlers, vec!["db", "web"]);

        let link = graph.communication_link("web-db").unwrap();
        assert_eq!(link.highest_confidentiality(&graph), Confidentiality::StrictlyConfidential);
        let empty = graph.communication_link("proxy-web").unwrap();
        assert_eq!(empty.highest_confidentiality(&graph), Confidentiality::Public);
        assert_eq!(empty.highest_integrity(&graph), Criticality::Archive);
        assert!(!graph.is_data_asset_unused("secrets"));
    }
}
