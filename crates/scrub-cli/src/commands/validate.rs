//! Validate command - check that every rule in a rules file is well-formed.

use std::path::PathBuf;

use colored::Colorize;
use scrub::{Rule, RuleSet};

pub fn run(
    rules_path: PathBuf,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !rules_path.exists() {
        return Err(format!("Rules file not found: {}", rules_path.display()).into());
    }

    let rule_set = RuleSet::load(&rules_path)?;
    let results: Vec<_> = rule_set
        .rules
        .iter()
        .enumerate()
        .map(|(position, record)| (record.display_id(position), Rule::from_record(record, position)))
        .collect();
    let malformed = results.iter().filter(|(_, r)| r.is_err()).count();

    if json_output {
        let rules: Vec<_> = results
            .iter()
            .map(|(id, result)| match result {
                Ok(rule) => serde_json::json!({
                    "rule_id": id,
                    "rule_type": rule.rule_type(),
                    "columns": rule.columns,
                    "valid": true,
                }),
                Err(e) => serde_json::json!({
                    "rule_id": id,
                    "valid": false,
                    "field": e.field,
                    "reason": e.reason,
                }),
            })
            .collect();
        let report = serde_json::json!({
            "file": rules_path.display().to_string(),
            "total_rules": results.len(),
            "malformed": malformed,
            "metadata": rule_set.metadata,
            "rules": rules,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} {} ({} rules)",
            "Validating".cyan().bold(),
            rules_path.display().to_string().white(),
            results.len()
        );
        println!();

        for (id, result) in &results {
            match result {
                Ok(rule) => {
                    println!(
                        "  {} {} ({})",
                        "ok".green(),
                        id.white().bold(),
                        rule.rule_type()
                    );
                    if verbose {
                        println!("       Columns: {}", rule.columns.join(", "));
                        if !rule.description.is_empty() {
                            println!("       {}", rule.description.dimmed());
                        }
                    }
                }
                Err(e) => println!(
                    "  {} {}: {}: {}",
                    "malformed".red(),
                    id.white().bold(),
                    e.field.yellow(),
                    e.reason
                ),
            }
        }

        println!();
        if malformed == 0 {
            println!("{} All rules are well-formed.", "Valid:".green().bold());
        }
    }

    if malformed > 0 {
        return Err(format!("{} of {} rules are malformed", malformed, results.len()).into());
    }

    Ok(())
}
