//! Likelihood, impact and the severity matrix
//!
//! Every rule rates a finding with an exploitation [`Likelihood`] and an
//! exploitation [`Impact`]. The [`Severity`] is never chosen by a rule directly;
//! it is always derived through [`Severity::calculate`] so that all rules share
//! one matrix.
//!
//! ```text
//!                 Low       Medium    High      VeryHigh
//! Unlikely        low       medium    medium    elevated
//! Likely          medium    elevated  elevated  elevated
//! VeryLikely      medium    elevated  high      high
//! Frequent        elevated  elevated  high      critical
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// How likely an attacker is to exploit a finding
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum Likelihood {
    #[default]
    Unlikely,
    Likely,
    VeryLikely,
    Frequent,
}

impl Likelihood {
    pub const ALL: [Likelihood; 4] = [
        Likelihood::Unlikely,
        Likelihood::Likely,
        Likelihood::VeryLikely,
        Likelihood::Frequent,
    ];

    /// Matrix weight (1-4)
    pub fn weight(self) -> u32 {
        match self {
            Likelihood::Unlikely => 1,
            Likelihood::Likely => 2,
            Likelihood::VeryLikely => 3,
            Likelihood::Frequent => 4,
        }
    }
}

impl fmt::Display for Likelihood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Likelihood::Unlikely => write!(f, "unlikely"),
            Likelihood::Likely => write!(f, "likely"),
            Likelihood::VeryLikely => write!(f, "very-likely"),
            Likelihood::Frequent => write!(f, "frequent"),
        }
    }
}

/// Damage done when a finding is exploited
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum Impact {
    #[default]
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Impact {
    pub const ALL: [Impact; 4] = [Impact::Low, Impact::Medium, Impact::High, Impact::VeryHigh];

    /// Matrix weight (1-4)
    pub fn weight(self) -> u32 {
        match self {
            Impact::Low => 1,
            Impact::Medium => 2,
            Impact::High => 3,
            Impact::VeryHigh => 4,
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Impact::Low => write!(f, "low"),
            Impact::Medium => write!(f, "medium"),
            Impact::High => write!(f, "high"),
            Impact::VeryHigh => write!(f, "very-high"),
        }
    }
}

/// Severity levels for findings
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    Elevated,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Low,
        Severity::Medium,
        Severity::Elevated,
        Severity::High,
        Severity::Critical,
    ];

    /// The severity matrix.
    ///
    /// The product of both weights is bucketed, so raising either input never
    /// lowers the result.
    pub fn calculate(likelihood: Likelihood, impact: Impact) -> Severity {
        match likelihood.weight() * impact.weight() {
            0..=1 => Severity::Low,
            2..=3 => Severity::Medium,
            4..=8 => Severity::Elevated,
            9..=12 => Severity::High,
            _ => Severity::Critical,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::Elevated => write!(f, "elevated"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "elevated" => Ok(Severity::Elevated),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(anyhow::anyhow!(
                "Unknown severity '{}'. Valid values: low, medium, elevated, high, critical",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_matrix_corners() {
        assert_eq!(
            Severity::calculate(Likelihood::Unlikely, Impact::Low),
            Severity::Low
        );
        assert_eq!(
            Severity::calculate(Likelihood::Frequent, Impact::VeryHigh),
            Severity::Critical
        );
        assert_eq!(
            Severity::calculate(Likelihood::Likely, Impact::High),
            Severity::Elevated
        );
        assert_eq!(
            Severity::calculate(Likelihood::VeryLikely, Impact::High),
            Severity::High
        );
        assert_eq!(
            Severity::calculate(Likelihood::Unlikely, Impact::Medium),
            Severity::Medium
        );
    }

    #[test]
    fn test_matrix_is_total_and_monotonic() {
        for (li, likelihood) in Likelihood::ALL.iter().enumerate() {
            for (ii, impact) in Impact::ALL.iter().enumerate() {
                let here = Severity::calculate(*likelihood, *impact);
                if let Some(next) = Likelihood::ALL.get(li + 1) {
                    assert!(Severity::calculate(*next, *impact) >= here);
                }
                if let Some(next) = Impact::ALL.get(ii + 1) {
                    assert!(Severity::calculate(*likelihood, *next) >= here);
                }
            }
        }
    }

    #[test]
    fn test_severity_parsing() {
        assert_eq!(Severity::from_str("HIGH").unwrap(), Severity::High);
        assert_eq!(Severity::from_str("elevated").unwrap(), Severity::Elevated);
        assert!(Severity::from_str("info").is_err());
    }

    #[test]
    fn test_serde_spelling() {
        let json = serde_json::to_string(&Likelihood::VeryLikely).unwrap();
        assert_eq!(json, "\"very-likely\"");
        let impact: Impact = serde_json::from_str("\"very-high\"").unwrap();
        assert_eq!(impact, Impact::VeryHigh);
        assert_eq!(Severity::Elevated.to_string(), "elevated");
    }
}
