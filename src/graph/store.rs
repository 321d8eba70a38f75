//! In-memory threat model graph
//!
//! Entities are kept in id-sorted maps. Communication links are additionally
//! indexed in a petgraph `DiGraph` (asset id nodes, link id edges) so that
//! direction-aware lookups and reachability do not scan every link.
//!
//! A `ThreatGraph` is only produced by [`super::GraphBuilder`], which rejects
//! models with dangling references or a malformed boundary forest. It has no
//! mutators; evaluation treats it as read-only.

use super::entities::{CommunicationLink, DataAsset, SharedRuntime, TechnicalAsset, TrustBoundary};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default)]
pub struct ThreatGraph {
    pub(super) title: String,
    pub(super) description: String,
    pub(super) technical_assets: BTreeMap<String, TechnicalAsset>,
    pub(super) data_assets: BTreeMap<String, DataAsset>,
    pub(super) communication_links: BTreeMap<String, CommunicationLink>,
    pub(super) trust_boundaries: BTreeMap<String, TrustBoundary>,
    pub(super) shared_runtimes: BTreeMap<String, SharedRuntime>,

    // Derived indexes, rebuilt by `index()`
    pub(super) links: DiGraph<String, String>,
    pub(super) node_index: HashMap<String, NodeIndex>,
    /// boundary id -> id of the boundary that nests it
    pub(super) parent_boundary: HashMap<String, String>,
}

impl ThreatGraph {
    /// Populate the derived indexes from the entity maps.
    pub(super) fn index(&mut self) {
        let mut links = DiGraph::new();
        let mut node_index = HashMap::with_capacity(self.technical_assets.len());
        for id in self.technical_assets.keys() {
            node_index.insert(id.clone(), links.add_node(id.clone()));
        }
        for link in self.communication_links.values() {
            if let (Some(&from), Some(&to)) =
                (node_index.get(&link.source_id), node_index.get(&link.target_id))
            {
                links.add_edge(from, to, link.id.clone());
            }
        }

        let mut parent_boundary = HashMap::new();
        for boundary in self.trust_boundaries.values() {
            for nested in &boundary.trust_boundaries_nested {
                parent_boundary.insert(nested.clone(), boundary.id.clone());
            }
        }

        self.links = links;
        self.node_index = node_index;
        self.parent_boundary = parent_boundary;
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// All technical assets, sorted by id
    pub fn technical_assets(&self) -> impl Iterator<Item = &TechnicalAsset> {
        self.technical_assets.values()
    }

    pub fn technical_asset(&self, id: &str) -> Option<&TechnicalAsset> {
        self.technical_assets.get(id)
    }

    /// All data assets, sorted by id
    pub fn data_assets(&self) -> impl Iterator<Item = &DataAsset> {
        self.data_assets.values()
    }

    pub fn data_asset(&self, id: &str) -> Option<&DataAsset> {
        self.data_assets.get(id)
    }

    /// All communication links, sorted by id
    pub fn communication_links(&self) -> impl Iterator<Item = &CommunicationLink> {
        self.communication_links.values()
    }

    pub fn communication_link(&self, id: &str) -> Option<&CommunicationLink> {
        self.communication_links.get(id)
    }

    /// All trust boundaries, sorted by id
    pub fn trust_boundaries(&self) -> impl Iterator<Item = &TrustBoundary> {
        self.trust_boundaries.values()
    }

    pub fn trust_boundary(&self, id: &str) -> Option<&TrustBoundary> {
        self.trust_boundaries.get(id)
    }

    /// All shared runtimes, sorted by id
    pub fn shared_runtimes(&self) -> impl Iterator<Item = &SharedRuntime> {
        self.shared_runtimes.values()
    }

    pub fn shared_runtime(&self, id: &str) -> Option<&SharedRuntime> {
        self.shared_runtimes.get(id)
    }

    /// Directed link graph: one node per technical asset, one edge per link
    pub fn link_graph(&self) -> &DiGraph<String, String> {
        &self.links
    }

    pub fn node_of(&self, asset_id: &str) -> Option<NodeIndex> {
        self.node_index.get(asset_id).copied()
    }

    pub fn asset_count(&self) -> usize {
        self.technical_assets.len()
    }

    pub fn link_count(&self) -> usize {
        self.communication_links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.technical_assets.is_empty() && self.data_assets.is_empty()
    }

    /// Counts by entity kind, for logging and reports
    pub fn stats(&self) -> BTreeMap<&'static str, usize> {
        let mut stats = BTreeMap::new();
        stats.insert("technical_assets", self.technical_assets.len());
        stats.insert("data_assets", self.data_assets.len());
        stats.insert("communication_links", self.communication_links.len());
        stats.insert("trust_boundaries", self.trust_boundaries.len());
        stats.insert("shared_runtimes", self.shared_runtimes.len());
        stats
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::technology::Protocol;
    use crate::graph::{CommunicationLink, GraphBuilder, TechnicalAsset};

    #[test]
    fn test_link_graph_mirrors_links() {
        let graph = GraphBuilder::new("t")
            .technical_asset(TechnicalAsset::new("a", "A"))
            .technical_asset(TechnicalAsset::new("b", "B"))
            .communication_link(CommunicationLink::new("a-b", "a", "b", Protocol::Https))
            .build()
            .unwrap();

        assert_eq!(graph.link_graph().node_count(), 2);
        assert_eq!(graph.link_graph().edge_count(), 1);
        let a = graph.node_of("a").unwrap();
        assert_eq!(graph.link_graph()[a], "a");
        assert!(graph.node_of("missing").is_none());
    }

    #[test]
    fn test_iteration_is_sorted_by_id() {
        let graph = GraphBuilder::new("t")
            .technical_asset(TechnicalAsset::new("zeta", "Z"))
            .technical_asset(TechnicalAsset::new("alpha", "A"))
            .technical_asset(TechnicalAsset::new("mid", "M"))
            .build()
            .unwrap();

        let ids: Vec<_> = graph.technical_assets().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
        assert_eq!(graph.stats()["technical_assets"], 3);
    }
}
