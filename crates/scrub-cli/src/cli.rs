//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use scrub::TableFormat;
use std::path::PathBuf;

/// Scrub: rule-driven cleaning for tabular data
#[derive(Parser)]
#[command(name = "scrub")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply cleaning rules to a data file
    Apply {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "CSV")]
        file: PathBuf,

        /// Path to the cleaning rules JSON file
        #[arg(short, long, default_value = "data/processed/cleaning_rules.json")]
        rules: PathBuf,

        /// Directory for the cleaned data and the cleaning log
        #[arg(long, default_value = "data/processed")]
        output_dir: PathBuf,

        /// File name for the cleaned data
        #[arg(long, default_value = "cleaned_data.csv")]
        output_filename: String,

        /// File name for the cleaning log
        #[arg(long, default_value = "cleaning_log.json")]
        log_filename: String,

        /// Output format (default: from the output file extension, else csv)
        #[arg(short, long)]
        format: Option<TableFormat>,

        /// Record every changed cell in the cleaning log
        #[arg(long)]
        with_audit: bool,

        /// Skip rules with a lower confidence
        #[arg(long, value_name = "X")]
        min_confidence: Option<f64>,

        /// Print per-rule results and a summary
        #[arg(long)]
        show_summary: bool,
    },

    /// Check a rules file without applying it
    Validate {
        /// Path to the cleaning rules JSON file
        #[arg(value_name = "RULES")]
        rules: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a profile of a data file
    Inspect {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "CSV")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
