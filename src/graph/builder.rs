//! Graph construction and integrity checks
//!
//! ```text
//!  entities ──► GraphBuilder::build()
//!                 1. unique, non-empty ids per kind
//!                 2. reconcile asset.trust_boundary_id with boundary membership
//!                 3. ThreatGraph::validate()  (references, forest, cycles)
//!                 4. index link graph
//! ```

use super::entities::{CommunicationLink, DataAsset, SharedRuntime, TechnicalAsset, TrustBoundary};
use super::store::ThreatGraph;
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

/// Integrity violations found while building or validating a model
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("{kind} with empty id")]
    EmptyId { kind: &'static str },

    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },

    #[error("{kind} '{id}' references unknown {target_kind} '{target}' in {field}")]
    DanglingReference {
        kind: &'static str,
        id: String,
        field: &'static str,
        target_kind: &'static str,
        target: String,
    },

    #[error("{kind} '{id}' is contained by both '{first}' and '{second}'")]
    MultipleParents {
        kind: &'static str,
        id: String,
        first: String,
        second: String,
    },

    #[error("technical asset '{asset}' declares trust boundary '{declared}' but is listed inside '{actual}'")]
    ConflictingBoundary {
        asset: String,
        declared: String,
        actual: String,
    },

    #[error("trust boundary '{id}' is nested inside itself")]
    BoundaryCycle { id: String },
}

fn insert_unique<T>(
    map: &mut BTreeMap<String, T>,
    kind: &'static str,
    id: &str,
    value: T,
) -> Result<(), GraphError> {
    if id.trim().is_empty() {
        return Err(GraphError::EmptyId { kind });
    }
    if map.insert(id.to_string(), value).is_some() {
        return Err(GraphError::DuplicateId {
            kind,
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Collects entities and produces a validated [`ThreatGraph`]
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    title: String,
    description: String,
    technical_assets: Vec<TechnicalAsset>,
    data_assets: Vec<DataAsset>,
    communication_links: Vec<CommunicationLink>,
    trust_boundaries: Vec<TrustBoundary>,
    shared_runtimes: Vec<SharedRuntime>,
}

impl GraphBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn technical_asset(mut self, asset: TechnicalAsset) -> Self {
        self.technical_assets.push(asset);
        self
    }

    pub fn technical_assets(mut self, assets: impl IntoIterator<Item = TechnicalAsset>) -> Self {
        self.technical_assets.extend(assets);
        self
    }

    pub fn data_asset(mut self, asset: DataAsset) -> Self {
        self.data_assets.push(asset);
        self
    }

    pub fn data_assets(mut self, assets: impl IntoIterator<Item = DataAsset>) -> Self {
        self.data_assets.extend(assets);
        self
    }

    pub fn communication_link(mut self, link: CommunicationLink) -> Self {
        self.communication_links.push(link);
        self
    }

    pub fn communication_links(mut self, links: impl IntoIterator<Item = CommunicationLink>) -> Self {
        self.communication_links.extend(links);
        self
    }

    pub fn trust_boundary(mut self, boundary: TrustBoundary) -> Self {
        self.trust_boundaries.push(boundary);
        self
    }

    pub fn trust_boundaries(mut self, boundaries: impl IntoIterator<Item = TrustBoundary>) -> Self {
        self.trust_boundaries.extend(boundaries);
        self
    }

    pub fn shared_runtime(mut self, runtime: SharedRuntime) -> Self {
        self.shared_runtimes.push(runtime);
        self
    }

    pub fn shared_runtimes(mut self, runtimes: impl IntoIterator<Item = SharedRuntime>) -> Self {
        self.shared_runtimes.extend(runtimes);
        self
    }

    /// Build the graph, rejecting any integrity violation
    pub fn build(self) -> Result<ThreatGraph, GraphError> {
        let mut graph = ThreatGraph {
            title: self.title,
            description: self.description,
            ..Default::default()
        };

        for asset in self.technical_assets {
            let id = asset.id.clone();
            insert_unique(&mut graph.technical_assets, "technical asset", &id, asset)?;
        }
        for asset in self.data_assets {
            let id = asset.id.clone();
            insert_unique(&mut graph.data_assets, "data asset", &id, asset)?;
        }
        for link in self.communication_links {
            let id = link.id.clone();
            insert_unique(&mut graph.communication_links, "communication link", &id, link)?;
        }
        for boundary in self.trust_boundaries {
            let id = boundary.id.clone();
            insert_unique(&mut graph.trust_boundaries, "trust boundary", &id, boundary)?;
        }
        for runtime in self.shared_runtimes {
            let id = runtime.id.clone();
            insert_unique(&mut graph.shared_runtimes, "shared runtime", &id, runtime)?;
        }

        reconcile_asset_boundaries(&mut graph)?;
        graph.validate()?;
        graph.index();

        debug!("Built threat graph '{}': {:?}", graph.title, graph.stats());
        Ok(graph)
    }
}

/// Make `TechnicalAsset::trust_boundary_id` and boundary membership agree.
///
/// An asset may name its boundary, be listed by the boundary, or both; both
/// must then name the same boundary.
fn reconcile_asset_boundaries(graph: &mut ThreatGraph) -> Result<(), GraphError> {
    let mut listed_in: HashMap<String, String> = HashMap::new();
    for boundary in graph.trust_boundaries.values() {
        for asset_id in &boundary.technical_assets_inside {
            if let Some(first) = listed_in.insert(asset_id.clone(), boundary.id.clone()) {
                return Err(GraphError::MultipleParents {
                    kind: "technical asset",
                    id: asset_id.clone(),
                    first,
                    second: boundary.id.clone(),
                });
            }
        }
    }

    let mut additions: Vec<(String, String)> = Vec::new();
    for asset in graph.technical_assets.values() {
        let Some(declared) = &asset.trust_boundary_id else {
            continue;
        };
        match listed_in.get(&asset.id) {
            Some(actual) if actual != declared => {
                return Err(GraphError::ConflictingBoundary {
                    asset: asset.id.clone(),
                    declared: declared.clone(),
                    actual: actual.clone(),
                });
            }
            Some(_) => {}
            None => {
                if !graph.trust_boundaries.contains_key(declared) {
                    return Err(GraphError::DanglingReference {
                        kind: "technical asset",
                        id: asset.id.clone(),
                        field: "trust_boundary_id",
                        target_kind: "trust boundary",
                        target: declared.clone(),
                    });
                }
                additions.push((declared.clone(), asset.id.clone()));
            }
        }
    }

    for (boundary_id, asset_id) in additions {
        if let Some(boundary) = graph.trust_boundaries.get_mut(&boundary_id) {
            boundary.technical_assets_inside.insert(asset_id.clone());
        }
        listed_in.insert(asset_id, boundary_id);
    }

    for asset in graph.technical_assets.values_mut() {
        asset.trust_boundary_id = listed_in.get(&asset.id).cloned();
    }
    Ok(())
}

impl ThreatGraph {
    /// Check referential integrity and the trust-boundary forest.
    pub fn validate(&self) -> Result<(), GraphError> {
        for asset in self.technical_assets.values() {
            for data_id in asset.data_assets_processed.iter() {
                self.expect_data_asset("technical asset", &asset.id, "data_assets_processed", data_id)?;
            }
            for data_id in asset.data_assets_stored.iter() {
                self.expect_data_asset("technical asset", &asset.id, "data_assets_stored", data_id)?;
            }
            if let Some(boundary_id) = &asset.trust_boundary_id {
                if !self.trust_boundaries.contains_key(boundary_id) {
                    return Err(dangling(
                        "technical asset",
                        &asset.id,
                        "trust_boundary_id",
                        "trust boundary",
                        boundary_id,
                    ));
                }
            }
        }

        for link in self.communication_links.values() {
            self.expect_asset("communication link", &link.id, "source", &link.source_id)?;
            self.expect_asset("communication link", &link.id, "target", &link.target_id)?;
            for data_id in link.data_assets_sent.iter() {
                self.expect_data_asset("communication link", &link.id, "data_assets_sent", data_id)?;
            }
            for data_id in link.data_assets_received.iter() {
                self.expect_data_asset(
                    "communication link",
                    &link.id,
                    "data_assets_received",
                    data_id,
                )?;
            }
        }

        for runtime in self.shared_runtimes.values() {
            for asset_id in runtime.technical_assets_running.iter() {
                self.expect_asset(
                    "shared runtime",
                    &runtime.id,
                    "technical_assets_running",
                    asset_id,
                )?;
            }
        }

        let mut asset_parent: HashMap<&str, &str> = HashMap::new();
        let mut boundary_parent: HashMap<&str, &str> = HashMap::new();
        for boundary in self.trust_boundaries.values() {
            for asset_id in boundary.technical_assets_inside.iter() {
                self.expect_asset(
                    "trust boundary",
                    &boundary.id,
                    "technical_assets_inside",
                    asset_id,
                )?;
                if let Some(first) = asset_parent.insert(asset_id, &boundary.id) {
                    return Err(GraphError::MultipleParents {
                        kind: "technical asset",
                        id: asset_id.clone(),
                        first: first.to_string(),
                        second: boundary.id.clone(),
                    });
                }
            }
            for nested_id in boundary.trust_boundaries_nested.iter() {
                if !self.trust_boundaries.contains_key(nested_id) {
                    return Err(dangling(
                        "trust boundary",
                        &boundary.id,
                        "trust_boundaries_nested",
                        "trust boundary",
                        nested_id,
                    ));
                }
                if let Some(first) = boundary_parent.insert(nested_id, &boundary.id) {
                    return Err(GraphError::MultipleParents {
                        kind: "trust boundary",
                        id: nested_id.clone(),
                        first: first.to_string(),
                        second: boundary.id.clone(),
                    });
                }
            }
        }

        // Each boundary has at most one parent, so a cycle is a parent chain
        // that revisits a boundary.
        for start in self.trust_boundaries.keys() {
            let mut seen: HashSet<&str> = HashSet::new();
            let mut current = start.as_str();
            seen.insert(current);
            while let Some(&parent) = boundary_parent.get(current) {
                if !seen.insert(parent) {
                    return Err(GraphError::BoundaryCycle {
                        id: parent.to_string(),
                    });
                }
                current = parent;
            }
        }

        Ok(())
    }

    fn expect_asset(
        &self,
        kind: &'static str,
        id: &str,
        field: &'static str,
        target: &str,
    ) -> Result<(), GraphError> {
        if self.technical_assets.contains_key(target) {
            Ok(())
        } else {
            Err(dangling(kind, id, field, "technical asset", target))
        }
    }

    fn expect_data_asset(
        &self,
        kind: &'static str,
        id: &str,
        field: &'static str,
        target: &str,
    ) -> Result<(), GraphError> {
        if self.data_assets.contains_key(target) {
            Ok(())
        } else {
            Err(dangling(kind, id, field, "data asset", target))
        }
    }
}

fn dangling(
    kind: &'static str,
    id: &str,
    field: &'static str,
    target_kind: &'static str,
    target: &str,
) -> GraphError {
    GraphError::DanglingReference {
        kind,
        id: id.to_string(),
        field,
        target_kind,
        target: target.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::classification::TrustBoundaryType;
    use crate::graph::technology::Protocol;

    fn asset(id: &str) -> TechnicalAsset {
        TechnicalAsset::new(id, id.to_uppercase())
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = GraphBuilder::new("t")
            .technical_asset(asset("a"))
            .technical_asset(asset("a"))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::DuplicateId {
                kind: "technical asset",
                id: "a".to_string()
            }
        );
    }

    #[test]
    fn test_empty_id_rejected() {
        let err = GraphBuilder::new("t")
            .data_asset(DataAsset::new("", "nameless"))
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::EmptyId { kind: "data asset" }));
    }

    #[test]
    fn test_dangling_link_target_rejected() {
        let err = GraphBuilder::new("t")
            .technical_asset(asset("a"))
            .communication_link(CommunicationLink::new("l", "a", "ghost", Protocol::Https))
            .build()
            .unwrap_err();
        match err {
            GraphError::DanglingReference { field, target, .. } => {
                assert_eq!(field, "target");
                assert_eq!(target, "ghost");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_dangling_data_reference_rejected() {
        let err = GraphBuilder::new("t")
            .technical_asset(asset("a").storing("nope"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("unknown data asset 'nope'"));
    }

    #[test]
    fn test_asset_in_two_boundaries_rejected() {
        let err = GraphBuilder::new("t")
            .technical_asset(asset("a"))
            .trust_boundary(TrustBoundary::new("n1", TrustBoundaryType::NetworkOnPrem).containing("a"))
            .trust_boundary(TrustBoundary::new("n2", TrustBoundaryType::NetworkOnPrem).containing("a"))
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::MultipleParents { .. }));
    }

    #[test]
    fn test_boundary_cycle_rejected() {
        let err = GraphBuilder::new("t")
            .trust_boundary(TrustBoundary::new("x", TrustBoundaryType::NetworkOnPrem).nesting("y"))
            .trust_boundary(TrustBoundary::new("y", TrustBoundaryType::NetworkOnPrem).nesting("x"))
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::BoundaryCycle { .. }));
    }

    #[test]
    fn test_self_nesting_rejected() {
        let err = GraphBuilder::new("t")
            .trust_boundary(TrustBoundary::new("x", TrustBoundaryType::NetworkOnPrem).nesting("x"))
            .build()
            .unwrap_err();
        assert_eq!(err, GraphError::BoundaryCycle { id: "x".to_string() });
    }

    #[test]
    fn test_declared_boundary_is_added_to_membership() {
        let mut declared = asset("a");
        declared.trust_boundary_id = Some("net".to_string());
        let graph = GraphBuilder::new("t")
            .technical_asset(declared)
            .technical_asset(asset("b"))
            .trust_boundary(TrustBoundary::new("net", TrustBoundaryType::NetworkOnPrem).containing("b"))
            .build()
            .unwrap();

        let net = graph.trust_boundary("net").unwrap();
        assert!(net.technical_assets_inside.contains("a"));
        assert_eq!(
            graph.technical_asset("b").unwrap().trust_boundary_id.as_deref(),
            Some("net")
        );
    }

    #[test]
    fn test_conflicting_declared_boundary_rejected() {
        let mut declared = asset("a");
        declared.trust_boundary_id = Some("other".to_string());
        let err = GraphBuilder::new("t")
            .technical_asset(declared)
            .trust_boundary(TrustBoundary::new("net", TrustBoundaryType::NetworkOnPrem).containing("a"))
            .trust_boundary(TrustBoundary::new("other", TrustBoundaryType::NetworkOnPrem))
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::ConflictingBoundary { .. }));
    }

    #[test]
    fn test_valid_graph_validates_again() {
        let graph = GraphBuilder::new("t")
            .technical_asset(asset("a"))
            .trust_boundary(
                TrustBoundary::new("outer", TrustBoundaryType::NetworkCloudProvider).nesting("inner"),
            )
            .trust_boundary(
                TrustBoundary::new("inner", TrustBoundaryType::ExecutionEnvironment).containing("a"),
            )
            .build()
            .unwrap();
        assert!(graph.validate().is_ok());
    }
}
