//! Analyze command: load, evaluate, overlay tracking, report

use crate::config::{load_project_config, ProjectConfig};
use crate::graph::{load_model, ThreatGraph};
use crate::reporters::{self, RiskReport};
use crate::risks::{RiskCollection, TrackingOverlay};
use crate::rules::{create_engine, EvaluationReport};
use crate::scoring::Severity;
use anyhow::{Context, Result};
use console::style;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Flags of the analyze command
#[derive(Debug, Default)]
pub(super) struct AnalyzeOptions {
    pub format: Option<String>,
    pub output: Option<PathBuf>,
    pub severity: Option<String>,
    pub fail_on: Option<String>,
    pub tracking: Option<PathBuf>,
    pub skip_rules: Vec<String>,
    pub workers: Option<usize>,
}

/// A loaded and evaluated model
pub(super) struct Evaluated {
    pub graph: ThreatGraph,
    pub config: ProjectConfig,
    pub model_dir: PathBuf,
    pub report: EvaluationReport,
}

/// Directory a model file lives in, used to find config and tracking files
pub(super) fn model_dir(model: &Path) -> PathBuf {
    model
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Load the model and its project config, then run the configured catalog
pub(super) fn evaluate_model(
    model: &Path,
    workers: Option<usize>,
    skip_rules: &[String],
) -> Result<Evaluated> {
    let model_dir = model_dir(model);
    let mut config = load_project_config(&model_dir);
    config.defaults.skip_rules.extend(skip_rules.iter().cloned());

    let graph = load_model(model)?;

    let engine = create_engine(workers.or(config.defaults.workers).unwrap_or(0), &config)?
        .with_progress_callback(Box::new(|rule_id, done, total| {
            debug!("[{}/{}] {} finished", done, total, rule_id);
        }));
    info!(
        "Running {} rules on {} workers",
        engine.rule_count(),
        engine.workers()
    );

    let report = engine.evaluate(&graph)?;
    Ok(Evaluated {
        graph,
        config,
        model_dir,
        report,
    })
}

/// Run the analyze command
pub(super) fn run(model: &Path, options: AnalyzeOptions) -> Result<()> {
    let evaluated = evaluate_model(model, options.workers, &options.skip_rules)?;
    let defaults = &evaluated.config.defaults;

    let format = options
        .format
        .or_else(|| defaults.format.clone())
        .unwrap_or_else(|| "text".to_string());
    let severity = parse_severity(options.severity.or_else(|| defaults.severity.clone()))?;
    let fail_on = parse_severity(options.fail_on.or_else(|| defaults.fail_on.clone()))?;

    let tracking_path = options
        .tracking
        .unwrap_or_else(|| evaluated.config.tracking_path(&evaluated.model_dir));
    let overlay = TrackingOverlay::load(&tracking_path)?;
    let orphaned = overlay.orphaned(&evaluated.report.risks.synthetic_ids());
    if !orphaned.is_empty() {
        warn!(
            "{} tracking entries in {} match no current risk: {}",
            orphaned.len(),
            tracking_path.display(),
            orphaned.join(", ")
        );
    }

    let report = RiskReport::build(&evaluated.graph, &evaluated.report, &overlay, severity);
    let output = reporters::report(&report, &format)?;

    match options.output {
        Some(path) => {
            std::fs::write(&path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if format != "json" {
                println!(
                    "\nReport written to: {}",
                    style(path.display()).cyan()
                );
            }
        }
        None => println!("{}", output),
    }

    check_fail_threshold(fail_on, &evaluated.report.risks, &overlay);
    Ok(())
}

fn parse_severity(value: Option<String>) -> Result<Option<Severity>> {
    value.map(|s| s.parse::<Severity>()).transpose()
}

/// Risks still at risk at or above the threshold
fn risks_over_threshold(threshold: Severity, risks: &RiskCollection, overlay: &TrackingOverlay) -> usize {
    risks
        .still_at_risk(overlay)
        .into_iter()
        .filter(|r| r.severity() >= threshold)
        .count()
}

/// Exit with code 1 if the fail threshold is met
fn check_fail_threshold(fail_on: Option<Severity>, risks: &RiskCollection, overlay: &TrackingOverlay) {
    if let Some(threshold) = fail_on {
        let open = risks_over_threshold(threshold, risks, overlay);
        if open > 0 {
            eprintln!(
                "Failing due to --fail-on={} threshold ({} open risks)",
                threshold, open
            );
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::TEST_CATEGORY;
    use crate::models::{Risk, RiskStatus};
    use crate::risks::RiskTracking;
    use crate::scoring::{Impact, Likelihood};

    #[test]
    fn test_model_dir() {
        assert_eq!(model_dir(Path::new("model.json")), PathBuf::from("."));
        assert_eq!(model_dir(Path::new("models/shop.toml")), PathBuf::from("models"));
    }

    #[test]
    fn test_parse_severity() {
        assert_eq!(parse_severity(None).unwrap(), None);
        assert_eq!(
            parse_severity(Some("elevated".into())).unwrap(),
            Some(Severity::Elevated)
        );
        assert!(parse_severity(Some("severe".into())).is_err());
    }

    #[test]
    fn test_threshold_ignores_mitigated_risks() {
        let risks = RiskCollection::new(vec![
            Risk::new(TEST_CATEGORY, Likelihood::VeryLikely, Impact::High, "a").identified_by(&["a"]),
            Risk::new(TEST_CATEGORY, Likelihood::Unlikely, Impact::Low, "b").identified_by(&["b"]),
        ]);
        let mut overlay = TrackingOverlay::new();
        assert_eq!(risks_over_threshold(Severity::High, &risks, &overlay), 1);
        assert_eq!(risks_over_threshold(Severity::Low, &risks, &overlay), 2);

        overlay.set("test-category@a", RiskTracking::new(RiskStatus::Mitigated));
        assert_eq!(risks_over_threshold(Severity::High, &risks, &overlay), 0);
    }
}
