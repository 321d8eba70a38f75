//! Scoring primitives and attacker attractiveness
//!
//! # Severity
//!
//! ```text
//! severity = bucket(weight(likelihood) × weight(impact))
//!
//!   product  1      → low
//!   product  2..3   → medium
//!   product  4..8   → elevated
//!   product  9..12  → high
//!   product  16     → critical
//! ```
//!
//! # Attractiveness (weighted estimator)
//!
//! ```text
//! raw   = Σ own CIA weights
//!       + Σ processed data (CIA weights × quantity factor)
//!       + Σ stored data    (CIA weights × quantity factor) × 2
//! raw  *= 1.5   if multi-tenant
//! raw  *= 1.25  if internet-facing or reachable from an internet-facing asset
//! raw  += 4     per incoming link
//!
//! score = (raw - min) / (max - min) × 100   over in-scope assets
//! ```
//!
//! Confidentiality weights: 8, 16, 24, 32, 64.
//! Integrity/availability weights: 4, 8, 12, 24, 48.
//! Quantity factors: 1, 2, 3, 5.

mod attractiveness;
mod severity;

pub use attractiveness::{
    AttractivenessEstimator, AttractivenessScores, ConstantAttractiveness, RandomAttractiveness,
    WeightedAttractiveness, NEUTRAL_SCORE,
};
pub use severity::{Impact, Likelihood, Severity};

use anyhow::{bail, Result};

/// Build an estimator by its configured name
pub fn estimator_by_name(name: &str, seed: u64) -> Result<Box<dyn AttractivenessEstimator>> {
    match name.trim().to_lowercase().as_str() {
        "weighted" | "default" => Ok(Box::new(WeightedAttractiveness::default())),
        "random" => Ok(Box::new(RandomAttractiveness::new(seed))),
        "constant" => Ok(Box::new(ConstantAttractiveness::default())),
        other => bail!(
            "Unknown attractiveness estimator '{}'. Valid values: weighted, random, constant",
            other
        ),
    }
}
