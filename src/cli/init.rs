//! Init command - write an example archrisk.toml

use anyhow::{Context, Result};
use console::style;
use std::path::Path;

const EXAMPLE_CONFIG: &str = r#"# archrisk configuration
# Lives next to the model file(s) it applies to.

[attractiveness]
# weighted (default), random or constant
estimator = "weighted"
# Seed for the random estimator
seed = 0

[tracking]
# Tracking overlay, relative to this directory
file = "archrisk-tracking.json"

[defaults]
# Default output format (text, json)
format = "text"
# Minimum severity to report (low, medium, elevated, high, critical)
# severity = "medium"
# Exit code 1 when open risks at this severity or above remain
# fail_on = "high"
# Rules to skip
skip_rules = []

# Per-rule overrides
[rules.missing-hardening]
enabled = true
thresholds = { raa_limit = 55, raa_limit_reduced = 40 }

[rules.missing-network-segmentation]
thresholds = { min_attractiveness = 50 }

# [rules.missing-waf]
# enabled = false
"#;

/// Run the init command
pub fn run(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Path is not a directory: {}", dir.display());
    }

    let config_path = dir.join("archrisk.toml");
    if config_path.exists() {
        println!(
            "{} Already initialized at {}",
            style("✓").green(),
            style(config_path.display()).cyan()
        );
        return Ok(());
    }

    std::fs::write(&config_path, EXAMPLE_CONFIG)
        .with_context(|| format!("Failed to create {}", config_path.display()))?;
    println!(
        "{} Created {}",
        style("✓").green(),
        style(config_path.display()).cyan()
    );

    println!("\nNext steps:");
    println!("  {} Evaluate a model", style("archrisk analyze model.json").cyan());
    println!("  {} List the rules", style("archrisk rules").cyan());
    Ok(())
}
