//! Risk aggregation and tracking
//!
//! [`RiskCollection`] holds the merged output of one evaluation run and
//! answers filter, grouping, ordering and data-breach queries.
//! [`TrackingOverlay`] holds the user's dispositions, keyed by synthetic id.

mod collection;
mod tracking;

pub use collection::{highest_severity, RiskCollection};
pub use tracking::{RiskTracking, TrackingOverlay};
