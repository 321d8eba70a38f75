//! Merged risk collection and its query views
//!
//! Every view is computed from the owned risks plus, where dispositions
//! matter, a borrowed [`TrackingOverlay`]. Neither input is ever mutated.
//! Orderings are explicit so the concatenation order of rule outputs never
//! shows through.

use super::tracking::TrackingOverlay;
use crate::graph::{DataAsset, TechnicalAsset, ThreatGraph};
use crate::models::{DataBreachProbability, Risk, RiskFunction, RiskStatus, RiskSummary, Stride};
use crate::scoring::{AttractivenessScores, Severity};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// All risks of one evaluation run, sorted by synthetic id
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct RiskCollection {
    risks: Vec<Risk>,
}

impl RiskCollection {
    /// Sort by synthetic id and keep the first risk of each id
    pub fn new(mut risks: Vec<Risk>) -> Self {
        risks.sort_by(|a, b| a.synthetic_id().cmp(b.synthetic_id()));
        let before = risks.len();
        risks.dedup_by(|later, kept| later.synthetic_id() == kept.synthetic_id());
        if risks.len() < before {
            warn!(
                "Dropped {} risks with duplicate synthetic ids",
                before - risks.len()
            );
        }
        Self { risks }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Risk> {
        self.risks.iter()
    }

    pub fn as_slice(&self) -> &[Risk] {
        &self.risks
    }

    pub fn len(&self) -> usize {
        self.risks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.risks.is_empty()
    }

    pub fn get(&self, synthetic_id: &str) -> Option<&Risk> {
        self.risks
            .binary_search_by(|r| r.synthetic_id().cmp(synthetic_id))
            .ok()
            .map(|i| &self.risks[i])
    }

    pub fn synthetic_ids(&self) -> Vec<&str> {
        self.risks.iter().map(|r| r.synthetic_id()).collect()
    }

    pub fn summary(&self) -> RiskSummary {
        RiskSummary::from_risks(&self.risks)
    }

    // --- filters ---

    pub fn filter_by_severity(&self, severity: Severity) -> Vec<&Risk> {
        self.risks.iter().filter(|r| r.severity() == severity).collect()
    }

    pub fn filter_at_least(&self, severity: Severity) -> Vec<&Risk> {
        self.risks.iter().filter(|r| r.severity() >= severity).collect()
    }

    pub fn filter_by_status(&self, status: RiskStatus, overlay: &TrackingOverlay) -> Vec<&Risk> {
        self.risks
            .iter()
            .filter(|r| overlay.status_of(r.synthetic_id()) == status)
            .collect()
    }

    /// Risks neither mitigated nor marked false positive
    pub fn still_at_risk(&self, overlay: &TrackingOverlay) -> Vec<&Risk> {
        self.risks
            .iter()
            .filter(|r| overlay.is_still_at_risk(r.synthetic_id()))
            .collect()
    }

    /// Risks pointing at an incomplete model
    pub fn model_failures(&self) -> Vec<&Risk> {
        self.risks.iter().filter(|r| r.is_model_failure()).collect()
    }

    // --- groupings ---

    pub fn group_by_category(&self) -> BTreeMap<&'static str, Vec<&Risk>> {
        let mut groups: BTreeMap<&'static str, Vec<&Risk>> = BTreeMap::new();
        for risk in &self.risks {
            groups.entry(risk.category.id).or_default().push(risk);
        }
        groups
    }

    pub fn group_by_stride(&self) -> BTreeMap<Stride, Vec<&Risk>> {
        let mut groups: BTreeMap<Stride, Vec<&Risk>> = BTreeMap::new();
        for risk in &self.risks {
            groups.entry(risk.category.stride).or_default().push(risk);
        }
        groups
    }

    pub fn group_by_function(&self) -> BTreeMap<RiskFunction, Vec<&Risk>> {
        let mut groups: BTreeMap<RiskFunction, Vec<&Risk>> = BTreeMap::new();
        for risk in &self.risks {
            groups.entry(risk.category.function).or_default().push(risk);
        }
        groups
    }

    // --- orderings ---

    /// Most severe first, then by title, then by synthetic id
    pub fn sorted_by_severity_and_title(&self) -> Vec<&Risk> {
        let mut sorted: Vec<&Risk> = self.risks.iter().collect();
        sorted.sort_by(|a, b| {
            b.severity()
                .cmp(&a.severity())
                .then_with(|| a.title.cmp(&b.title))
                .then_with(|| a.synthetic_id().cmp(b.synthetic_id()))
        });
        sorted
    }

    /// Assets by descending attractiveness, ties broken by title then id
    pub fn sorted_assets_by_attractiveness_and_title<'g>(
        graph: &'g ThreatGraph,
        scores: &AttractivenessScores,
    ) -> Vec<&'g TechnicalAsset> {
        let mut assets: Vec<&TechnicalAsset> = graph.technical_assets().collect();
        assets.sort_by(|a, b| {
            scores
                .get(&b.id)
                .total_cmp(&scores.get(&a.id))
                .then_with(|| a.title.cmp(&b.title))
                .then_with(|| a.id.cmp(&b.id))
        });
        assets
    }

    /// Data assets by descending still-at-risk breach probability
    ///
    /// Data assets with no surviving finding come last.
    pub fn sorted_data_assets_by_breach_probability_and_title<'g>(
        &self,
        graph: &'g ThreatGraph,
        overlay: &TrackingOverlay,
    ) -> Vec<&'g DataAsset> {
        let mut keyed: Vec<(Option<DataBreachProbability>, &DataAsset)> = graph
            .data_assets()
            .map(|da| {
                (
                    self.data_breach_probability_still_at_risk(graph, &da.id, overlay),
                    da,
                )
            })
            .collect();
        keyed.sort_by(|(pa, a), (pb, b)| {
            pb.cmp(pa)
                .then_with(|| a.title.cmp(&b.title))
                .then_with(|| a.id.cmp(&b.id))
        });
        keyed.into_iter().map(|(_, da)| da).collect()
    }

    // --- data breach aggregation ---

    /// Findings whose breach targets include an asset handling the data asset
    pub fn data_breach_risks(&self, graph: &ThreatGraph, data_asset_id: &str) -> Vec<&Risk> {
        let handlers: BTreeSet<&str> = graph
            .assets_handling(data_asset_id)
            .into_iter()
            .map(|asset| asset.id.as_str())
            .collect();
        if handlers.is_empty() {
            return Vec::new();
        }
        self.risks
            .iter()
            .filter(|r| {
                r.data_breach_technical_asset_ids
                    .iter()
                    .any(|id| handlers.contains(id.as_str()))
            })
            .collect()
    }

    /// Highest breach probability over all contributing findings
    pub fn data_breach_probability(
        &self,
        graph: &ThreatGraph,
        data_asset_id: &str,
    ) -> Option<DataBreachProbability> {
        self.data_breach_risks(graph, data_asset_id)
            .into_iter()
            .map(|r| r.data_breach_probability)
            .max()
    }

    /// Same as [`Self::data_breach_probability`], ignoring findings that are
    /// mitigated or false positives
    pub fn data_breach_probability_still_at_risk(
        &self,
        graph: &ThreatGraph,
        data_asset_id: &str,
        overlay: &TrackingOverlay,
    ) -> Option<DataBreachProbability> {
        self.data_breach_risks(graph, data_asset_id)
            .into_iter()
            .filter(|r| overlay.is_still_at_risk(r.synthetic_id()))
            .map(|r| r.data_breach_probability)
            .max()
    }
}

/// Highest severity among the risks, `None` for an empty set
pub fn highest_severity<'a>(risks: impl IntoIterator<Item = &'a Risk>) -> Option<Severity> {
    risks.into_iter().map(Risk::severity).max()
}

impl<'a> IntoIterator for &'a RiskCollection {
    type Item = &'a Risk;
    type IntoIter = std::slice::Iter<'a, Risk>;

    fn into_iter(self) -> Self::IntoIter {
        self.risks.iter()
    }
}

impl FromIterator<Risk> for RiskCollection {
    fn from_iter<I: IntoIterator<Item = Risk>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
