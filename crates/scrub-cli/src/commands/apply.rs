//! Apply command - apply cleaning rules and write cleaned data.

use std::path::PathBuf;

use colored::Colorize;
use scrub::{
    CellValue, CleaningLogDocument, CleaningRun, EngineConfig, RuleStatus, ScrubConfig, Scrubber,
    TableFormat,
};
use tracing::debug;

pub struct ApplyArgs {
    pub file: PathBuf,
    pub rules: PathBuf,
    pub output_dir: PathBuf,
    pub output_filename: String,
    pub log_filename: String,
    pub format: Option<TableFormat>,
    pub with_audit: bool,
    pub min_confidence: Option<f64>,
    pub show_summary: bool,
}

pub fn run(args: ApplyArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.file.exists() {
        return Err(format!("Data file not found: {}", args.file.display()).into());
    }
    if !args.rules.exists() {
        return Err(format!("Rules file not found: {}", args.rules.display()).into());
    }

    println!(
        "{} {} with {}",
        "Cleaning".cyan().bold(),
        args.file.display().to_string().white().bold(),
        args.rules.display().to_string().white()
    );

    let config = ScrubConfig {
        engine: EngineConfig {
            record_changes: args.with_audit,
            ..Default::default()
        },
        min_confidence: args.min_confidence,
        ..Default::default()
    };
    let scrubber = Scrubber::with_config(config);
    let run = scrubber.clean(&args.file, &args.rules)?;

    if !run.rules_skipped.is_empty() {
        println!(
            "{} Skipped {} low-confidence rules: {}",
            "Note:".yellow(),
            run.rules_skipped.len(),
            run.rules_skipped.join(", ")
        );
    }

    let output_path = args.output_dir.join(&args.output_filename);
    let format = args
        .format
        .or_else(|| TableFormat::from_path(&output_path))
        .unwrap_or_default();
    debug!(format = %format, path = %output_path.display(), "writing cleaned table");
    scrub::write_table(&run.table, &output_path, format)?;

    let log_path = args.output_dir.join(&args.log_filename);
    CleaningLogDocument::new(&run, Some(args.rules.as_path())).save(&log_path)?;

    let summary = &run.report.summary;
    println!(
        "{} {} of {} rules ({} no-op, {} failed)",
        "Applied".green().bold(),
        summary.rules_applied.to_string().white().bold(),
        summary.total_rules,
        summary.rules_no_op,
        summary.rules_failed
    );

    if args.show_summary {
        print_rules(&run);
        print_summary(&run);
    } else if summary.rules_failed > 0 {
        println!(
            "{} {} rules failed. Run with {} for details.",
            "Warning:".yellow().bold(),
            summary.rules_failed,
            "--show-summary".cyan()
        );
    }

    print_statistics(&run);

    println!();
    println!("{}", "Results written to:".green().bold());
    println!("  Cleaned data: {}", output_path.display().to_string().cyan());
    println!("  Cleaning log: {}", log_path.display().to_string().cyan());

    Ok(())
}

fn print_rules(run: &CleaningRun) {
    println!();
    println!("{}", "Rule Application Summary:".yellow().bold());
    println!("{}", "=".repeat(50));

    for (i, entry) in run.report.log.iter().enumerate() {
        let status = match entry.status {
            RuleStatus::Applied => entry.status.label().green(),
            RuleStatus::NoOp => entry.status.label().yellow(),
            RuleStatus::Failed => entry.status.label().red(),
        };
        let description = if entry.description.is_empty() {
            "No description"
        } else {
            entry.description.as_str()
        };

        println!(
            "  {}. [{}] {} ({}): {}",
            i + 1,
            status,
            entry.rule_id.white().bold(),
            entry.type_label(),
            description
        );
        println!(
            "     Columns: {}, Rows affected: {}, Errors: {}",
            entry.columns.join(", "),
            entry.rows_affected,
            entry.errors
        );
        if let Some(failure) = &entry.failure {
            println!("     {}", failure.to_string().red());
        }
        for sample in &entry.error_samples {
            println!(
                "     {} row {}, '{}': {}",
                "!".red(),
                sample.row,
                sample.column,
                sample.message.dimmed()
            );
        }
    }
}

fn print_summary(run: &CleaningRun) {
    let summary = &run.report.summary;

    println!();
    println!("{}", "Cleaning Summary:".yellow().bold());
    println!("  Total rules:        {}", summary.total_rules);
    println!("  Applied:            {}", summary.rules_applied.to_string().green());
    println!("  No-op:              {}", summary.rules_no_op.to_string().yellow());
    println!("  Failed:             {}", summary.rules_failed.to_string().red());
    println!("  Rows affected:      {}", summary.total_rows_affected);
    println!("  Cell errors:        {}", summary.total_errors);

    if !summary.by_type.is_empty() {
        println!("  By type:");
        for (rule_type, count) in &summary.by_type {
            println!("    {:<18} {}", rule_type, count);
        }
    }

    if !summary.problems.is_empty() {
        println!();
        println!("{}", "Problems:".yellow().bold());
        for problem in &summary.problems {
            println!(
                "  {} [{}]: {}",
                problem.rule_id.white().bold(),
                problem.status.label(),
                problem.reason
            );
        }
    }
}

fn print_statistics(run: &CleaningRun) {
    let (original_rows, original_columns) = run.original_shape;
    let (rows, columns) = run.table.shape();

    println!();
    println!("{}", "Data Statistics:".yellow().bold());
    println!("  Original rows:    {}", original_rows);
    println!("  Cleaned rows:     {}", rows);
    println!("  Original columns: {}", original_columns);
    println!("  Cleaned columns:  {}", columns);

    let mut new_columns: Vec<&str> = run
        .table
        .column_names()
        .filter(|name| !run.original_columns.iter().any(|c| c == name))
        .collect();
    new_columns.sort_unstable();

    if !new_columns.is_empty() {
        println!("  New flag columns: {}", new_columns.len());
        for name in new_columns {
            let flagged = run
                .table
                .column(name)
                .map(|values| {
                    values
                        .iter()
                        .filter(|v| **v == CellValue::Bool(true))
                        .count()
                })
                .unwrap_or(0);
            println!("    - {}: {} flagged rows", name, flagged);
        }
    }
}
