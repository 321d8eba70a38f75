//! Relative attacker attractiveness
//!
//! An estimator maps a graph to a side table of per-asset scores on a 0..100
//! scale. Out-of-scope assets always score 0. The graph is never annotated in
//! place; rules read the table through their evaluation context.

use crate::graph::ThreatGraph;
use petgraph::visit::Dfs;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Score given to every in-scope asset when there is nothing to compare against
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Per-asset attractiveness, keyed by technical asset id
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AttractivenessScores {
    scores: BTreeMap<String, f64>,
}

impl AttractivenessScores {
    pub fn new(scores: BTreeMap<String, f64>) -> Self {
        Self { scores }
    }

    /// Score of an asset; unknown ids score 0
    pub fn get(&self, asset_id: &str) -> f64 {
        self.scores.get(asset_id).copied().unwrap_or(0.0)
    }

    /// Scores in asset id order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.scores.iter().map(|(id, score)| (id.as_str(), *score))
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl FromIterator<(String, f64)> for AttractivenessScores {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            scores: iter.into_iter().collect(),
        }
    }
}

/// Pluggable attractiveness policy
///
/// Implementations must be pure functions of the graph.
pub trait AttractivenessEstimator: Send + Sync {
    fn name(&self) -> &'static str;

    fn estimate(&self, graph: &ThreatGraph) -> AttractivenessScores;
}

/// Default estimator: data sensitivity, exposure and fan-in, min/max
/// normalized across in-scope assets
#[derive(Debug, Clone, Copy)]
pub struct WeightedAttractiveness {
    pub stored_data_factor: f64,
    pub multi_tenant_factor: f64,
    pub exposure_factor: f64,
    pub per_incoming_link: f64,
}

impl Default for WeightedAttractiveness {
    fn default() -> Self {
        Self {
            stored_data_factor: 2.0,
            multi_tenant_factor: 1.5,
            exposure_factor: 1.25,
            per_incoming_link: 4.0,
        }
    }
}

impl WeightedAttractiveness {
    /// Assets that are internet-facing or reachable over links from one
    fn internet_exposed(graph: &ThreatGraph) -> HashSet<String> {
        let links = graph.link_graph();
        let mut exposed = HashSet::new();
        for asset in graph.technical_assets().filter(|a| a.internet) {
            let Some(start) = graph.node_of(&asset.id) else {
                continue;
            };
            let mut dfs = Dfs::new(links, start);
            while let Some(node) = dfs.next(links) {
                exposed.insert(links[node].clone());
            }
        }
        exposed
    }

    fn raw_score(&self, graph: &ThreatGraph, asset_id: &str, exposed: &HashSet<String>) -> f64 {
        let Some(asset) = graph.technical_asset(asset_id) else {
            return 0.0;
        };
        let mut score = asset.confidentiality.attractiveness_weight()
            + asset.integrity.attractiveness_weight()
            + asset.availability.attractiveness_weight();

        let data_value = |data_id: &String| {
            graph.data_asset(data_id).map_or(0.0, |data| {
                (data.confidentiality.attractiveness_weight()
                    + data.integrity.attractiveness_weight()
                    + data.availability.attractiveness_weight())
                    * data.quantity.factor()
            })
        };
        score += asset.data_assets_processed.iter().map(data_value).sum::<f64>();
        score += self.stored_data_factor
            * asset.data_assets_stored.iter().map(data_value).sum::<f64>();

        if asset.multi_tenant {
            score *= self.multi_tenant_factor;
        }
        if exposed.contains(asset_id) {
            score *= self.exposure_factor;
        }
        score + self.per_incoming_link * graph.incoming_links(asset_id).len() as f64
    }
}

impl AttractivenessEstimator for WeightedAttractiveness {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn estimate(&self, graph: &ThreatGraph) -> AttractivenessScores {
        let exposed = Self::internet_exposed(graph);
        let raw: Vec<(String, f64)> = graph
            .technical_assets()
            .filter(|a| a.is_in_scope())
            .map(|a| (a.id.clone(), self.raw_score(graph, &a.id, &exposed)))
            .collect();

        let min = raw.iter().map(|(_, s)| *s).fold(f64::INFINITY, f64::min);
        let max = raw.iter().map(|(_, s)| *s).fold(f64::NEG_INFINITY, f64::max);
        let span = max - min;

        let mut scores: BTreeMap<String, f64> = graph
            .technical_assets()
            .filter(|a| !a.is_in_scope())
            .map(|a| (a.id.clone(), 0.0))
            .collect();
        for (id, score) in raw {
            let normalized = if span > f64::EPSILON {
                (score - min) / span * 100.0
            } else {
                NEUTRAL_SCORE
            };
            scores.insert(id, normalized);
        }

        debug!(
            "Estimated attractiveness for {} assets ({} internet-exposed)",
            scores.len(),
            exposed.len()
        );
        AttractivenessScores::new(scores)
    }
}

/// Uniform random scores from a seeded RNG; deterministic per seed
#[derive(Debug, Clone, Copy)]
pub struct RandomAttractiveness {
    pub seed: u64,
}

impl RandomAttractiveness {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl AttractivenessEstimator for RandomAttractiveness {
    fn name(&self) -> &'static str {
        "random"
    }

    fn estimate(&self, graph: &ThreatGraph) -> AttractivenessScores {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        graph
            .technical_assets()
            .map(|asset| {
                let score = if asset.is_in_scope() {
                    rng.random_range(0.0..=100.0)
                } else {
                    0.0
                };
                (asset.id.clone(), score)
            })
            .collect()
    }
}

/// The same score for every in-scope asset
#[derive(Debug, Clone, Copy)]
pub struct ConstantAttractiveness {
    pub score: f64,
}

impl Default for ConstantAttractiveness {
    fn default() -> Self {
        Self {
            score: NEUTRAL_SCORE,
        }
    }
}

impl AttractivenessEstimator for ConstantAttractiveness {
    fn name(&self) -> &'static str {
        "constant"
    }

    fn estimate(&self, graph: &ThreatGraph) -> AttractivenessScores {
        let score = self.score.clamp(0.0, 100.0);
        graph
            .technical_assets()
            .map(|asset| {
                let value = if asset.is_in_scope() { score } else { 0.0 };
                (asset.id.clone(), value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{
        CommunicationLink, Confidentiality, Criticality, DataAsset, GraphBuilder, Protocol,
        Quantity, TechnicalAsset,
    };

    fn model() -> ThreatGraph {
        let mut secrets = DataAsset::new("secrets", "Secrets").with_ratings(
            Confidentiality::StrictlyConfidential,
            Criticality::MissionCritical,
            Criticality::Critical,
        );
        secrets.quantity = Quantity::VeryMany;
        let mut offline = TechnicalAsset::new("offline", "Offline");
        offline.out_of_scope = true;

        GraphBuilder::new("t")
            .data_asset(secrets)
            .technical_asset(TechnicalAsset::new("web", "Web").internet_facing())
            .technical_asset(TechnicalAsset::new("db", "DB").storing("secrets"))
            .technical_asset(TechnicalAsset::new("tool", "Tool"))
            .technical_asset(offline)
            .communication_link(CommunicationLink::new("web-db", "web", "db", Protocol::Jdbc))
            .build()
            .unwrap()
    }

    #[test]
    fn test_weighted_is_normalized() {
        let scores = WeightedAttractiveness::default().estimate(&model());
        assert_eq!(scores.get("db"), 100.0);
        assert_eq!(scores.get("tool"), 0.0);
        assert!(scores.get("web") > 0.0 && scores.get("web") < 100.0);
        assert_eq!(scores.get("offline"), 0.0);
        assert_eq!(scores.get("unknown"), 0.0);
        for (_, score) in scores.iter() {
            assert!((0.0..=100.0).contains(&score));
        }
    }

    #[test]
    fn test_single_asset_scores_neutral() {
        let graph = GraphBuilder::new("t")
            .technical_asset(TechnicalAsset::new("only", "Only"))
            .build()
            .unwrap();
        let scores = WeightedAttractiveness::default().estimate(&graph);
        assert_eq!(scores.get("only"), NEUTRAL_SCORE);
    }

    #[test]
    fn test_random_is_deterministic_per_seed() {
        let graph = model();
        let first = RandomAttractiveness::new(7).estimate(&graph);
        let second = RandomAttractiveness::new(7).estimate(&graph);
        assert_eq!(first, second);
        assert_eq!(first.get("offline"), 0.0);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn test_constant_respects_scope() {
        let scores = ConstantAttractiveness { score: 80.0 }.estimate(&model());
        assert_eq!(scores.get("web"), 80.0);
        assert_eq!(scores.get("offline"), 0.0);
    }
}
