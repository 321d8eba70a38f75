//! Co-location checks shared by the isolation rules

use crate::graph::{Confidentiality, Criticality, TechnicalAsset, ThreatGraph};

/// How close the nearest unrelated asset sits to a protected asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Colocation {
    SameNetwork,
    SameExecutionEnvironment,
}

/// Closest co-location of `asset` with any other asset accepted by
/// `is_unrelated`. The execution environment wins over the network segment.
pub(crate) fn closest_unrelated<F>(
    graph: &ThreatGraph,
    asset: &TechnicalAsset,
    is_unrelated: F,
) -> Option<Colocation>
where
    F: Fn(&TechnicalAsset) -> bool,
{
    graph
        .technical_assets()
        .filter(|other| other.id != asset.id && is_unrelated(other))
        .filter_map(|other| {
            if graph.is_same_execution_environment(&asset.id, &other.id) {
                Some(Colocation::SameExecutionEnvironment)
            } else if graph.is_same_trust_boundary_network_only(&asset.id, &other.id) {
                Some(Colocation::SameNetwork)
            } else {
                None
            }
        })
        .max()
}

/// The asset's own rating (not its data) is at the top tier
pub(crate) fn has_top_tier_rating(asset: &TechnicalAsset) -> bool {
    asset.confidentiality == Confidentiality::StrictlyConfidential
        || asset.integrity == Criticality::MissionCritical
        || asset.availability == Criticality::MissionCritical
}

impl Colocation {
    pub(crate) fn describe(self) -> &'static str {
        match self {
            Colocation::SameNetwork => "in the same network segment",
            Colocation::SameExecutionEnvironment => "in the same execution environment",
        }
    }
}
