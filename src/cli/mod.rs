//! CLI command definitions and handlers

mod analyze;
mod catalog;
mod init;
mod track;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// archrisk - Architecture threat-model risk evaluation
#[derive(Parser, Debug)]
#[command(name = "archrisk")]
#[command(
    version,
    about = "Evaluate architecture threat models against a catalog of risk rules",
    long_about = "archrisk reads an architecture model (technical assets, data assets, \
communication links, trust boundaries, shared runtimes), estimates how attractive each \
asset is to an attacker and runs a catalog of risk rules against it.\n\n\
Findings carry a stable synthetic id so decisions recorded with `archrisk track` survive \
re-runs of the same model.",
    after_help = "\
Examples:
  archrisk analyze model.json                    Evaluate a model
  archrisk analyze model.toml --format json      JSON output for scripting
  archrisk analyze model.json --fail-on high     Exit code 1 on open high+ risks (CI mode)
  archrisk rules                                 List the rule catalog
  archrisk attractiveness model.json             Rank assets by attacker attractiveness
  archrisk track missing-vault@db --status accepted --justification \"platform vault\""
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Number of parallel workers (1-64, default: project config or CPU count)
    #[arg(long, global = true, value_parser = parse_workers)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate a model and report its risks
    #[command(after_help = "\
Examples:
  archrisk analyze model.json                        Text report on stdout
  archrisk analyze model.json --format json -o r.json   JSON report to a file
  archrisk analyze model.json --severity elevated    Only elevated and above
  archrisk analyze model.json --skip-rule missing-waf   Skip a rule for this run
  archrisk analyze model.json --fail-on high         Exit code 1 on open high+ risks")]
    Analyze {
        /// Model file (.json or .toml)
        model: PathBuf,

        /// Output format: text, json
        #[arg(long, short = 'f', value_parser = ["text", "json"])]
        format: Option<String>,

        /// Output file path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Minimum severity to report (critical, high, elevated, medium, low)
        #[arg(long, value_parser = ["critical", "high", "elevated", "medium", "low"])]
        severity: Option<String>,

        /// Exit with code 1 if risks at this severity or higher are still at risk
        #[arg(long, value_parser = ["critical", "high", "elevated", "medium", "low"])]
        fail_on: Option<String>,

        /// Tracking overlay file (default: from project config, next to the model)
        #[arg(long)]
        tracking: Option<PathBuf>,

        /// Skip specific rules
        #[arg(long)]
        skip_rule: Vec<String>,
    },

    /// List the rule catalog
    Rules {
        /// Directory holding archrisk.toml (default: current directory)
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Rank technical assets by attacker attractiveness
    Attractiveness {
        /// Model file (.json or .toml)
        model: PathBuf,

        /// Estimator override: weighted, random, constant
        #[arg(long)]
        estimator: Option<String>,

        /// Seed for the random estimator
        #[arg(long)]
        seed: Option<u64>,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Record a decision about a risk in the tracking overlay
    #[command(after_help = "\
Statuses: unchecked, in-discussion, accepted, in-progress, mitigated, false-positive

Examples:
  archrisk track missing-vault@db --status accepted
  archrisk track unencrypted-asset@db --status mitigated --ticket SEC-42 --checked-by ops
  archrisk track missing-waf@shop --remove")]
    Track {
        /// Synthetic id of the risk (as shown by `analyze`)
        synthetic_id: String,

        /// New status
        #[arg(long, required_unless_present = "remove")]
        status: Option<String>,

        /// Why this status was chosen
        #[arg(long)]
        justification: Option<String>,

        /// Who checked the risk
        #[arg(long)]
        checked_by: Option<String>,

        /// Ticket reference
        #[arg(long)]
        ticket: Option<String>,

        /// Date of the decision (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,

        /// Delete the entry instead of setting it
        #[arg(long, conflicts_with = "status")]
        remove: bool,

        /// Model file; when given, the id must belong to a current risk and
        /// the overlay defaults to the one next to the model
        #[arg(long)]
        model: Option<PathBuf>,

        /// Tracking overlay file (default: from project config next to --model, else in --dir)
        #[arg(long)]
        tracking: Option<PathBuf>,

        /// Directory holding archrisk.toml and the default overlay when no --model is given
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    /// Initialize an archrisk.toml config file with example settings
    Init {
        /// Target directory (default: current directory)
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Analyze {
            model,
            format,
            output,
            severity,
            fail_on,
            tracking,
            skip_rule,
        } => analyze::run(
            &model,
            analyze::AnalyzeOptions {
                format,
                output,
                severity,
                fail_on,
                tracking,
                skip_rules: skip_rule,
                workers: cli.workers,
            },
        ),

        Commands::Rules { dir, format } => catalog::list_rules(&dir, &format),

        Commands::Attractiveness {
            model,
            estimator,
            seed,
            format,
        } => catalog::attractiveness(&model, estimator, seed, &format),

        Commands::Track {
            synthetic_id,
            status,
            justification,
            checked_by,
            ticket,
            date,
            remove,
            model,
            tracking,
            dir,
        } => track::run(track::TrackOptions {
            synthetic_id,
            status,
            justification,
            checked_by,
            ticket,
            date,
            remove,
            model,
            tracking,
            dir,
            workers: cli.workers,
        }),

        Commands::Init { dir } => init::run(&dir),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_workers() {
        assert_eq!(parse_workers("4"), Ok(4));
        assert!(parse_workers("0").is_err());
        assert!(parse_workers("65").is_err());
        assert!(parse_workers("many").is_err());
    }

    #[test]
    fn test_cli_parses_analyze() {
        let cli = Cli::try_parse_from([
            "archrisk",
            "--workers",
            "2",
            "analyze",
            "model.json",
            "--format",
            "json",
            "--skip-rule",
            "missing-waf",
        ])
        .unwrap();
        assert_eq!(cli.workers, Some(2));
        match cli.command {
            Commands::Analyze {
                model,
                format,
                skip_rule,
                ..
            } => {
                assert_eq!(model, PathBuf::from("model.json"));
                assert_eq!(format.as_deref(), Some("json"));
                assert_eq!(skip_rule, vec!["missing-waf".to_string()]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_track_requires_status_or_remove() {
        assert!(Cli::try_parse_from(["archrisk", "track", "cat@a"]).is_err());
        assert!(Cli::try_parse_from(["archrisk", "track", "cat@a", "--remove"]).is_ok());
        assert!(
            Cli::try_parse_from(["archrisk", "track", "cat@a", "--status", "accepted"]).is_ok()
        );
    }
}
