//! Output reporters for archrisk evaluation results
//!
//! Supports multiple output formats:
//! - `text` - Terminal output with colors
//! - `json` - Machine-readable JSON

mod json;
mod text;

use crate::graph::ThreatGraph;
use crate::models::{DataBreachProbability, Risk, RiskStatus, RiskSummary};
use crate::risks::{RiskCollection, TrackingOverlay};
use crate::rules::EvaluationReport;
use crate::scoring::Severity;
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format '{}'. Valid formats: text, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// A risk together with its tracked disposition
#[derive(Debug, Clone, Serialize)]
pub struct ReportedRisk {
    pub status: RiskStatus,
    #[serde(flatten)]
    pub risk: Risk,
}

/// Breach exposure of one data asset
#[derive(Debug, Clone, Serialize)]
pub struct DataAssetExposure {
    pub id: String,
    pub title: String,
    /// `None` when no finding touches the data asset
    pub breach_probability: Option<DataBreachProbability>,
    pub breach_probability_still_at_risk: Option<DataBreachProbability>,
}

/// A rule that could not complete
#[derive(Debug, Clone, Serialize)]
pub struct FailedRule {
    pub rule: String,
    pub error: String,
}

/// Everything a reporter renders
#[derive(Debug, Clone, Serialize)]
pub struct RiskReport {
    pub model: String,
    pub technical_assets: usize,
    pub communication_links: usize,
    /// Counts over every risk found, before the severity filter
    pub summary: RiskSummary,
    pub still_at_risk: usize,
    /// Risks at or above the minimum severity, most severe first
    pub risks: Vec<ReportedRisk>,
    pub data_assets: Vec<DataAssetExposure>,
    pub failed_rules: Vec<FailedRule>,
}

impl RiskReport {
    pub fn build(
        graph: &ThreatGraph,
        evaluation: &EvaluationReport,
        overlay: &TrackingOverlay,
        min_severity: Option<Severity>,
    ) -> Self {
        let collection: &RiskCollection = &evaluation.risks;
        let floor = min_severity.unwrap_or(Severity::Low);

        let risks = collection
            .sorted_by_severity_and_title()
            .into_iter()
            .filter(|r| r.severity() >= floor)
            .map(|r| ReportedRisk {
                status: overlay.status_of(r.synthetic_id()),
                risk: r.clone(),
            })
            .collect();

        let data_assets = collection
            .sorted_data_assets_by_breach_probability_and_title(graph, overlay)
            .into_iter()
            .map(|da| DataAssetExposure {
                id: da.id.clone(),
                title: da.title.clone(),
                breach_probability: collection.data_breach_probability(graph, &da.id),
                breach_probability_still_at_risk: collection
                    .data_breach_probability_still_at_risk(graph, &da.id, overlay),
            })
            .collect();

        let failed_rules = evaluation
            .failed_rules()
            .into_iter()
            .map(|(rule, error)| FailedRule {
                rule: rule.to_string(),
                error: error.to_string(),
            })
            .collect();

        Self {
            model: graph.title().to_string(),
            technical_assets: graph.asset_count(),
            communication_links: graph.link_count(),
            summary: collection.summary(),
            still_at_risk: collection.still_at_risk(overlay).len(),
            risks,
            data_assets,
            failed_rules,
        }
    }
}

/// Render a risk report in the specified format
pub fn report(report: &RiskReport, format: &str) -> Result<String> {
    let fmt = OutputFormat::from_str(format)?;
    report_with_format(report, fmt)
}

/// Render a risk report using an OutputFormat enum
pub fn report_with_format(report: &RiskReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render(report),
        OutputFormat::Json => json::render(report),
    }
}
