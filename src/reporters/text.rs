//! Text (terminal) reporter with colors and formatting

use super::RiskReport;
use crate::models::{DataBreachProbability, RiskStatus};
use crate::scoring::Severity;
use anyhow::Result;

/// Severity colors (ANSI escape codes)
fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "\x1b[31m", // Red
        Severity::High => "\x1b[91m",     // Light red
        Severity::Elevated => "\x1b[35m", // Magenta
        Severity::Medium => "\x1b[33m",   // Yellow
        Severity::Low => "\x1b[34m",      // Blue
    }
}

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Severity tag
fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "[C]",
        Severity::High => "[H]",
        Severity::Elevated => "[E]",
        Severity::Medium => "[M]",
        Severity::Low => "[L]",
    }
}

fn probability_label(probability: Option<DataBreachProbability>) -> String {
    match probability {
        Some(DataBreachProbability::Probable) => format!("\x1b[31mprobable{RESET}"),
        Some(DataBreachProbability::Possible) => format!("\x1b[33mpossible{RESET}"),
        Some(DataBreachProbability::Improbable) => format!("\x1b[34mimprobable{RESET}"),
        None => format!("{DIM}none{RESET}"),
    }
}

/// Render report as formatted terminal output
pub fn render(report: &RiskReport) -> Result<String> {
    let mut out = String::new();

    // Header
    out.push_str(&format!("\n{BOLD}Architecture Risk Analysis{RESET}: {}\n", report.model));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    out.push_str(&format!(
        "Assets: {}  Links: {}  Still at risk: {BOLD}{}{RESET}\n\n",
        report.technical_assets, report.communication_links, report.still_at_risk
    ));

    // Risk summary
    let rs = &report.summary;
    out.push_str(&format!("{BOLD}RISKS{RESET} ({} total)\n", rs.total));

    let summary_parts: Vec<String> = Severity::ALL
        .iter()
        .rev()
        .filter(|sev| rs.count(**sev) > 0)
        .map(|sev| format!("{}{} {}{RESET}", severity_color(*sev), rs.count(*sev), sev))
        .collect();
    if !summary_parts.is_empty() {
        out.push_str(&format!("  {}\n\n", summary_parts.join(" | ")));
    }

    // Risks as table
    if !report.risks.is_empty() {
        out.push_str(&format!(
            "{DIM}  #   SEV   STATUS          TITLE{RESET}\n"
        ));
        out.push_str(&format!(
            "{DIM}  ─────────────────────────────────────────────────────────────────{RESET}\n"
        ));

        for (i, reported) in report.risks.iter().enumerate() {
            let severity = reported.risk.severity();
            let sev_c = severity_color(severity);
            let status = if reported.status == RiskStatus::Unchecked {
                format!("{DIM}{:<14}{RESET}", reported.status.to_string())
            } else {
                format!("{:<14}", reported.status.to_string())
            };

            out.push_str(&format!(
                "  {DIM}{:>3}{RESET}  {sev_c}{}{RESET}  {}  {}\n",
                i + 1,
                severity_tag(severity),
                status,
                reported.risk.title
            ));
            out.push_str(&format!(
                "  {DIM}                            {}{RESET}\n",
                reported.risk.synthetic_id()
            ));
        }
        out.push('\n');
    }

    // Data breach exposure
    if !report.data_assets.is_empty() {
        out.push_str(&format!("{BOLD}DATA BREACH PROBABILITY{RESET}\n"));
        for exposure in &report.data_assets {
            out.push_str(&format!(
                "  {:<32} {} {DIM}(still at risk:{RESET} {}{DIM}){RESET}\n",
                exposure.title,
                probability_label(exposure.breach_probability),
                probability_label(exposure.breach_probability_still_at_risk)
            ));
        }
        out.push('\n');
    }

    // Rules that did not complete
    if !report.failed_rules.is_empty() {
        out.push_str(&format!(
            "\x1b[31m{BOLD}FAILED RULES{RESET} ({})\n",
            report.failed_rules.len()
        ));
        for failed in &report.failed_rules {
            out.push_str(&format!("  {} {DIM}{}{RESET}\n", failed.rule, failed.error));
        }
        out.push('\n');
    }

    if rs.total == 0 {
        out.push_str(&format!("{DIM}No risks found.{RESET}\n"));
    } else if report.still_at_risk > 0 {
        out.push_str(&format!(
            "{DIM}Record decisions with `archrisk track <synthetic-id> --status <status>`.{RESET}\n"
        ));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_report;

    #[test]
    fn test_text_render_lists_risks() {
        let out = render(&test_report()).unwrap();
        assert!(out.contains("Shop"));
        assert!(out.contains("Open database"));
        assert!(out.contains("test-category@db"));
        assert!(out.contains("[H]"));
        assert!(out.contains("accepted"));
        assert!(out.contains("FAILED RULES"));
        assert!(out.contains("Orders"));
    }

    #[test]
    fn test_text_render_empty() {
        let mut report = test_report();
        report.risks.clear();
        report.summary = Default::default();
        report.failed_rules.clear();
        let out = render(&report).unwrap();
        assert!(out.contains("No risks found."));
        assert!(!out.contains("FAILED RULES"));
    }
}
