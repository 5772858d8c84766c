//! Command-line interface for prepline

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "prepline")]
#[command(about = "An iterative dataset cleaning pipeline with versioned snapshots")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override workspace location
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize prepline workspace
    Init {
        /// Force initialization even if workspace exists
        #[arg(long)]
        force: bool,
    },

    /// Ingest a CSV file as a new dataset
    Ingest {
        /// Path to the CSV file
        file: PathBuf,
    },

    /// Execute one preprocessing step on a dataset
    Exec {
        /// Dataset identifier
        dataset: String,

        /// Action name (e.g. "median_impute", "drop_feature")
        action: String,

        /// Feature (column) the action applies to
        #[arg(long)]
        feature: String,
    },

    /// Roll a dataset back to an earlier version
    Rollback {
        /// Dataset identifier
        dataset: String,

        /// Target version: a filename ("v2_drop_feature_x.csv"), "v2", or "2"
        #[arg(long)]
        to: String,
    },

    /// Undo the most recent preprocessing step
    Undo {
        /// Dataset identifier
        dataset: String,
    },

    /// List all versions of a dataset
    Versions {
        /// Dataset identifier
        dataset: String,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Show the execution log of a dataset
    Log {
        /// Dataset identifier
        dataset: String,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Compute the quality score of a dataset version
    Score {
        /// Dataset identifier
        dataset: String,

        /// Target column for leakage and imbalance checks
        #[arg(long)]
        target: Option<String>,

        /// Version to score (defaults to latest)
        #[arg(long)]
        version: Option<String>,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Compare quality of the raw snapshot against the latest
    Rescore {
        /// Dataset identifier
        dataset: String,

        /// Target column for leakage and imbalance checks
        #[arg(long)]
        target: Option<String>,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Generate a quality report (JSON + markdown)
    Report {
        /// Dataset identifier
        dataset: String,

        /// Target column for leakage and imbalance checks
        #[arg(long)]
        target: Option<String>,
    },

    /// Show workspace statistics
    Stats,

    /// Run the HTTP API server
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8000")]
        port: u16,
    },
}

/// Parse output format string
#[derive(Debug, Clone)]
pub enum OutputFormat {
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {}. Use 'pretty' or 'json'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert!(matches!(OutputFormat::parse("pretty"), Ok(OutputFormat::Pretty)));
        assert!(matches!(OutputFormat::parse("JSON"), Ok(OutputFormat::Json)));
        assert!(OutputFormat::parse("yaml").is_err());
    }

    #[test]
    fn test_cli_parses_exec() {
        let cli = Cli::parse_from([
            "prepline", "exec", "ds-1", "median_impute", "--feature", "age",
        ]);
        assert!(matches!(
            cli.command,
            Commands::Exec { ref dataset, ref action, ref feature }
                if dataset == "ds-1" && action == "median_impute" && feature == "age"
        ));
    }
}
