//! Track command: record a disposition in the tracking overlay

use super::analyze::{evaluate_model, model_dir};
use crate::config::load_project_config;
use crate::models::RiskStatus;
use crate::risks::{RiskTracking, TrackingOverlay};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use console::style;
use std::path::PathBuf;

/// Flags of the track command
#[derive(Debug, Default)]
pub(super) struct TrackOptions {
    pub synthetic_id: String,
    pub status: Option<String>,
    pub justification: Option<String>,
    pub checked_by: Option<String>,
    pub ticket: Option<String>,
    pub date: Option<String>,
    pub remove: bool,
    pub model: Option<PathBuf>,
    pub tracking: Option<PathBuf>,
    pub dir: PathBuf,
    pub workers: Option<usize>,
}

/// Build the tracking entry from the flags
fn tracking_entry(options: &TrackOptions) -> Result<RiskTracking> {
    let status: RiskStatus = options
        .status
        .as_deref()
        .unwrap_or("unchecked")
        .parse()?;
    let date = match options.date.as_deref() {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", raw))?,
        None => chrono::Local::now().date_naive(),
    };

    let mut entry = RiskTracking::new(status).on(date);
    if let Some(ref justification) = options.justification {
        entry = entry.justified(justification.as_str());
    }
    if let Some(ref who) = options.checked_by {
        entry = entry.checked_by(who.as_str());
    }
    if let Some(ref ticket) = options.ticket {
        entry = entry.with_ticket(ticket.as_str());
    }
    Ok(entry)
}

/// Overlay to update: `--tracking`, else the configured file next to the
/// model when one is given, else the one in `--dir`
fn overlay_path(options: &TrackOptions) -> PathBuf {
    if let Some(ref path) = options.tracking {
        return path.clone();
    }
    let dir = match options.model {
        Some(ref model) => model_dir(model),
        None => options.dir.clone(),
    };
    load_project_config(&dir).tracking_path(&dir)
}

/// Run the track command
pub(super) fn run(options: TrackOptions) -> Result<()> {
    if let Some(ref model) = options.model {
        let evaluated = evaluate_model(model, options.workers, &[])?;
        if evaluated.report.risks.get(&options.synthetic_id).is_none() {
            bail!(
                "No current risk has synthetic id '{}' in {}",
                options.synthetic_id,
                model.display()
            );
        }
    }

    let path = overlay_path(&options);

    let mut overlay = TrackingOverlay::load(&path)?;

    if options.remove {
        if overlay.remove(&options.synthetic_id).is_none() {
            bail!("'{}' is not tracked in {}", options.synthetic_id, path.display());
        }
        overlay.save(&path)?;
        println!(
            "{} Removed {} from {}",
            style("✓").green(),
            style(&options.synthetic_id).cyan(),
            style(path.display()).dim()
        );
        return Ok(());
    }

    let entry = tracking_entry(&options)?;
    let status = entry.status;
    let previous = overlay.set(options.synthetic_id.clone(), entry);
    overlay.save(&path)?;

    let from = previous
        .map(|p| p.status)
        .unwrap_or_default();
    println!(
        "{} {}: {} -> {}  {}",
        style("✓").green(),
        style(&options.synthetic_id).cyan(),
        from,
        style(status).bold(),
        style(path.display()).dim()
    );
    Ok(())
}
