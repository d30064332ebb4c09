//! Inspect command - profile a data file.

use std::path::PathBuf;

use colored::Colorize;
use scrub::Parser;

pub fn run(
    file: PathBuf,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("Data file not found: {}", file.display()).into());
    }

    let (table, source) = Parser::new().parse_file(&file)?;
    let profile = table.profile();

    if json_output {
        let report = serde_json::json!({
            "source": source,
            "profile": profile,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} {} ({})",
        "Profile of".cyan().bold(),
        source.file.white().bold(),
        source.format
    );
    if verbose {
        println!("  Hash: {}", source.hash.dimmed());
        println!("  Size: {} bytes", source.size_bytes);
    }
    println!();
    println!("  Rows:           {}", profile.rows);
    println!("  Columns:        {}", profile.columns);
    println!("  Duplicate rows: {}", profile.duplicate_rows);
    println!();

    println!("{}", "Columns:".yellow().bold());
    for column in &profile.column_profiles {
        let missing = if column.missing > 0 {
            format!("{} missing ({:.1}%)", column.missing, column.missing_pct).yellow()
        } else {
            "no missing".green()
        };
        println!(
            "  {:<24} {}, {} distinct",
            column.name.white().bold(),
            missing,
            column.distinct
        );
        if let Some(numeric) = &column.numeric {
            let std_dev = numeric
                .std_dev
                .map(|s| format!("{:.3}", s))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {:<24} mean {:.3}, median {:.3}, min {}, max {}, std {}",
                "",
                numeric.mean,
                numeric.median,
                numeric.min,
                numeric.max,
                std_dev
            );
        }
    }

    Ok(())
}
