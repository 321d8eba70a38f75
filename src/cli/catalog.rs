//! Listing commands: the rule catalog and asset attractiveness

use super::analyze::model_dir;
use crate::config::load_project_config;
use crate::graph::load_model;
use crate::risks::RiskCollection;
use crate::rules::{catalog_from_config, default_catalog};
use crate::scoring::estimator_by_name;
use anyhow::Result;
use console::style;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Serialize)]
struct RuleEntry {
    id: &'static str,
    title: &'static str,
    stride: String,
    function: String,
    cwe: u32,
    enabled: bool,
    model_failure_possible_reason: bool,
    supported_tags: BTreeSet<&'static str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    options: BTreeMap<String, serde_json::Value>,
    detection_logic: &'static str,
}

/// List every built-in rule and whether the project config enables it
pub(super) fn list_rules(dir: &Path, format: &str) -> Result<()> {
    let config = load_project_config(dir);
    let configured = catalog_from_config(&config);
    let entries: Vec<RuleEntry> = default_catalog()
        .iter()
        .map(|rule| {
            let category = rule.category();
            let options: BTreeMap<String, serde_json::Value> = configured
                .iter()
                .find(|r| r.id() == category.id)
                .and_then(|r| r.config())
                .map(|c| {
                    c.options
                        .iter()
                        .map(|(key, value)| (key.clone(), value.clone()))
                        .collect()
                })
                .unwrap_or_default();
            RuleEntry {
                id: category.id,
                title: category.title,
                stride: category.stride.to_string(),
                function: category.function.to_string(),
                cwe: category.cwe,
                enabled: config.is_rule_enabled(category.id),
                model_failure_possible_reason: category.model_failure_possible_reason,
                supported_tags: rule.supported_tags(),
                options,
                detection_logic: category.detection_logic,
            }
        })
        .collect();

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("\n{} ({} rules)\n", style("Rule catalog").bold(), entries.len());
    for entry in &entries {
        let marker = if entry.enabled {
            style("on ").green()
        } else {
            style("off").dim()
        };
        println!(
            "  {}  {:<40} {}",
            marker,
            style(entry.id).cyan(),
            style(format!("{} / {} / CWE-{}", entry.stride, entry.function, entry.cwe)).dim()
        );
        println!("       {}", entry.title);
        for (key, value) in &entry.options {
            println!("       {} = {}", style(key).dim(), value);
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct AttractivenessEntry<'a> {
    id: &'a str,
    title: &'a str,
    score: f64,
    in_scope: bool,
}

/// Rank assets by attractiveness, most attractive first
pub(super) fn attractiveness(
    model: &Path,
    estimator: Option<String>,
    seed: Option<u64>,
    format: &str,
) -> Result<()> {
    let config = load_project_config(&model_dir(model));
    let graph = load_model(model)?;

    let name = estimator.unwrap_or(config.attractiveness.estimator);
    let estimator = estimator_by_name(&name, seed.unwrap_or(config.attractiveness.seed))?;
    let scores = estimator.estimate(&graph);

    let entries: Vec<AttractivenessEntry> =
        RiskCollection::sorted_assets_by_attractiveness_and_title(&graph, &scores)
            .into_iter()
            .map(|asset| AttractivenessEntry {
                id: &asset.id,
                title: &asset.title,
                score: scores.get(&asset.id),
                in_scope: asset.is_in_scope(),
            })
            .collect();

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!(
        "\n{} ({} estimator)\n",
        style("Attacker attractiveness").bold(),
        estimator.name()
    );
    for entry in &entries {
        let score = if entry.in_scope {
            style(format!("{:>6.1}", entry.score)).yellow()
        } else {
            style("   n/a".to_string()).dim()
        };
        println!("  {}  {:<32} {}", score, entry.title, style(entry.id).dim());
    }
    Ok(())
}
