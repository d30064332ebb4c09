//! Aggregate report over a cleaning log.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::log::{LogEntry, RuleStatus};

/// A rule that failed or changed nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleProblem {
    pub rule_id: String,
    pub status: RuleStatus,
    pub reason: String,
}

/// Summary of one application run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub total_rules: usize,
    pub rules_applied: usize,
    pub rules_no_op: usize,
    pub rules_failed: usize,
    pub total_rows_affected: usize,
    pub total_errors: usize,
    /// Entries per rule type label.
    pub by_type: BTreeMap<String, usize>,
    /// Flag columns added, in creation order.
    pub columns_added: Vec<String>,
    pub problems: Vec<RuleProblem>,
}

impl CleaningSummary {
    /// Aggregate a log. Pure: the same log always yields the same summary.
    pub fn from_log(log: &[LogEntry]) -> Self {
        let mut summary = Self {
            total_rules: log.len(),
            ..Default::default()
        };

        for entry in log {
            match entry.status {
                RuleStatus::Applied => summary.rules_applied += 1,
                RuleStatus::NoOp => summary.rules_no_op += 1,
                RuleStatus::Failed => summary.rules_failed += 1,
            }
            summary.total_rows_affected += entry.rows_affected;
            summary.total_errors += entry.errors;
            *summary
                .by_type
                .entry(entry.type_label().to_string())
                .or_insert(0) += 1;

            for column in &entry.columns_added {
                if !summary.columns_added.contains(column) {
                    summary.columns_added.push(column.clone());
                }
            }

            if let Some(reason) = entry.problem() {
                summary.problems.push(RuleProblem {
                    rule_id: entry.rule_id.clone(),
                    status: entry.status,
                    reason,
                });
            }
        }

        summary
    }

    /// Returns true if every rule applied.
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Log and summary of one application run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub log: Vec<LogEntry>,
    pub summary: CleaningSummary,
}

impl CleaningReport {
    pub fn new(log: Vec<LogEntry>) -> Self {
        let summary = CleaningSummary::from_log(&log);
        Self { log, summary }
    }
}
