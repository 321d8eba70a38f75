//! JSON reporter
//!
//! Outputs the full RiskReport as pretty-printed JSON.
//! Useful for machine consumption, piping to jq, or further processing.

use super::RiskReport;
use anyhow::Result;

/// Render report as JSON
pub fn render(report: &RiskReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_report;

    #[test]
    fn test_json_render_valid() {
        let report = test_report();
        let json_str = render(&report).expect("render JSON");
        let parsed: serde_json::Value = serde_json::from_str(&json_str).expect("parse JSON");
        assert_eq!(parsed["model"], "Shop");
        let risks = parsed["risks"].as_array().expect("risks array");
        assert_eq!(risks.len(), 2);
        assert_eq!(risks[0]["synthetic_id"], "test-category@db");
        assert_eq!(risks[0]["category"], "test-category");
        assert_eq!(risks[1]["status"], "accepted");
        assert_eq!(parsed["failed_rules"][0]["rule"], "broken");
    }

    #[test]
    fn test_json_untouched_data_asset_is_null() {
        let mut report = test_report();
        report.data_assets[0].breach_probability_still_at_risk = None;
        let parsed: serde_json::Value =
            serde_json::from_str(&render(&report).expect("render JSON")).expect("parse JSON");
        assert!(parsed["data_assets"][0]["breach_probability_still_at_risk"].is_null());
    }
}
