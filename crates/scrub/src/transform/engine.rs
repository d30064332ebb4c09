//! Rule application engine that applies cleaning rules to a table.

use std::borrow::Cow;
use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CellError, Result};
use crate::rules::{MalformedRuleError, Rule, RuleKind, RuleRecord};
use crate::table::{CellValue, Table};

use super::log::{CellChange, CellErrorSample, ColumnEffect, FailureReason, LogEntry};
use super::operations::{self, CellOutcome, Outcomes};
use super::summary::CleaningReport;

/// Configuration for the rule engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Record a per-cell audit trail in each log entry.
    pub record_changes: bool,
    /// Maximum audit records per rule.
    pub audit_limit: usize,
    /// Maximum cell error samples per rule.
    pub error_sample_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            record_changes: false,
            audit_limit: 1000,
            error_sample_limit: 10,
        }
    }
}

/// Engine for applying cleaning rules to a table.
///
/// Rules run strictly in order against the same table, so later rules see the
/// effects of earlier ones. A rule that cannot run is logged as failed and the
/// run continues; only a table with ragged columns aborts the run.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    config: EngineConfig,
}

impl RuleEngine {
    /// Create a new engine with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with custom configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate and apply raw rule records.
    ///
    /// Returns one log entry per record, in order. The table is mutated in
    /// place.
    pub fn apply(&self, table: &mut Table, records: &[RuleRecord]) -> Result<CleaningReport> {
        let rules = records.iter().enumerate().map(|(position, record)| {
            Rule::from_record(record, position)
                .map(Cow::Owned)
                .map_err(|e| LogEntry::rejected(record, position, e))
        });
        self.run(table, rules)
    }

    /// Apply already validated rules.
    pub fn apply_rules(&self, table: &mut Table, rules: &[Rule]) -> Result<CleaningReport> {
        self.run(table, rules.iter().map(|rule| Ok(Cow::Borrowed(rule))))
    }

    fn run<'a, I>(&self, table: &mut Table, rules: I) -> Result<CleaningReport>
    where
        I: Iterator<Item = std::result::Result<Cow<'a, Rule>, LogEntry>>,
    {
        let rows = table.check_shape().inspect_err(|e| {
            warn!(error = %e, "refusing to clean a ragged table");
        })?;

        let mut seen = HashSet::new();
        let mut log = Vec::new();

        for prepared in rules {
            let entry = match prepared {
                Err(entry) => {
                    warn!(
                        rule_id = %entry.rule_id,
                        reason = %entry.problem().unwrap_or_default(),
                        "skipping malformed rule"
                    );
                    entry
                }
                Ok(rule) if !seen.insert(rule.id.clone()) => {
                    warn!(rule_id = %rule.id, "skipping rule with duplicate id");
                    let mut entry = LogEntry::for_rule(&rule);
                    entry.fail(FailureReason::Malformed(MalformedRuleError::new(
                        &rule.id,
                        "rule_id",
                        "duplicate rule id",
                    )));
                    entry
                }
                Ok(rule) => self.apply_rule(table, &rule),
            };

            debug!(
                rule_id = %entry.rule_id,
                rule_type = entry.type_label(),
                status = entry.status.label(),
                rows_affected = entry.rows_affected,
                errors = entry.errors,
                "rule finished"
            );
            log.push(entry);
        }

        let report = CleaningReport::new(log);
        info!(
            rules = report.summary.total_rules,
            applied = report.summary.rules_applied,
            failed = report.summary.rules_failed,
            rows,
            rows_affected = report.summary.total_rows_affected,
            "applied cleaning rules"
        );
        Ok(report)
    }

    /// Apply one well-formed rule.
    fn apply_rule(&self, table: &mut Table, rule: &Rule) -> LogEntry {
        let mut entry = LogEntry::for_rule(rule);

        let mut absent: Vec<String> = Vec::new();
        for column in rule.columns.iter().chain(rule.dependencies()) {
            if !table.has_column(column) && !absent.contains(column) {
                absent.push(column.clone());
            }
        }
        if !absent.is_empty() {
            warn!(rule_id = %rule.id, columns = ?absent, "rule references missing columns");
            entry.fail(FailureReason::MissingColumn { columns: absent });
            return entry;
        }

        let mut touched = BTreeSet::new();
        for column in &rule.columns {
            match &rule.kind {
                RuleKind::Transformation {
                    pattern,
                    replacement,
                } => {
                    let outcomes = operations::transform_column(table, column, pattern, replacement);
                    self.commit(table, column, outcomes, &mut entry, &mut touched);
                }
                RuleKind::Imputation { strategy } => {
                    let outcomes = operations::impute_column(table, column, strategy);
                    self.commit(table, column, outcomes, &mut entry, &mut touched);
                }
                RuleKind::FormatString { directive } => {
                    let outcomes = operations::format_column(table, column, directive);
                    self.commit(table, column, outcomes, &mut entry, &mut touched);
                }
                RuleKind::AnomalyFlag { predicate } => {
                    let flags = operations::flag_column(table, column, predicate);
                    self.commit_flags(table, rule, column, flags, &mut entry, &mut touched);
                }
            }
        }

        entry.rows_affected = touched.len();
        entry.settle();
        entry
    }

    /// Write changed cells back into `column` and fold outcomes into the entry.
    fn commit(
        &self,
        table: &mut Table,
        column: &str,
        outcomes: Outcomes,
        entry: &mut LogEntry,
        touched: &mut BTreeSet<usize>,
    ) {
        let mut effect = ColumnEffect {
            column: column.to_string(),
            ..Default::default()
        };
        let Some(cells) = table.column_mut(column) else {
            return;
        };

        for (row, outcome) in outcomes {
            match outcome {
                CellOutcome::Changed(value) => {
                    let Some(cell) = cells.get_mut(row) else {
                        continue;
                    };
                    let before = std::mem::replace(cell, value);
                    if self.config.record_changes && entry.changes.len() < self.config.audit_limit {
                        entry.changes.push(CellChange {
                            row,
                            column: column.to_string(),
                            before,
                            after: cell.clone(),
                        });
                    }
                    effect.rows_affected += 1;
                    touched.insert(row);
                }
                CellOutcome::Unchanged => {}
                CellOutcome::Skipped => effect.skipped += 1,
                CellOutcome::Failed(error) => {
                    effect.errors += 1;
                    self.sample_error(entry, row, column, &error);
                }
            }
        }

        self.close_effect(entry, effect);
    }

    /// Build the flag column for `column` and fold outcomes into the entry.
    fn commit_flags(
        &self,
        table: &mut Table,
        rule: &Rule,
        column: &str,
        flags: Vec<(usize, std::result::Result<bool, CellError>)>,
        entry: &mut LogEntry,
        touched: &mut BTreeSet<usize>,
    ) {
        let flag_name = rule.flag_column(column);
        let mut effect = ColumnEffect {
            column: column.to_string(),
            ..Default::default()
        };
        let mut values = Vec::with_capacity(flags.len());

        for (row, result) in flags {
            let flagged = match result {
                Ok(flagged) => flagged,
                Err(error) => {
                    effect.errors += 1;
                    self.sample_error(entry, row, column, &error);
                    false
                }
            };
            if flagged {
                effect.rows_affected += 1;
                touched.insert(row);
                if self.config.record_changes && entry.changes.len() < self.config.audit_limit {
                    entry.changes.push(CellChange {
                        row,
                        column: flag_name.clone(),
                        before: table.get(row, &flag_name).cloned().unwrap_or_default(),
                        after: CellValue::Bool(true),
                    });
                }
            }
            values.push(CellValue::Bool(flagged));
        }

        if !table.insert_column(flag_name.clone(), values) {
            warn!(rule_id = %rule.id, column = %flag_name, "overwriting existing column with flags");
        }
        if !entry.columns_added.contains(&flag_name) {
            entry.columns_added.push(flag_name);
        }
        self.close_effect(entry, effect);
    }

    fn sample_error(&self, entry: &mut LogEntry, row: usize, column: &str, error: &CellError) {
        if entry.error_samples.len() < self.config.error_sample_limit {
            entry.error_samples.push(CellErrorSample {
                row,
                column: column.to_string(),
                message: error.to_string(),
            });
        }
    }

    fn close_effect(&self, entry: &mut LogEntry, effect: ColumnEffect) {
        if effect.errors > 0 {
            warn!(
                rule_id = %entry.rule_id,
                column = %effect.column,
                errors = effect.errors,
                "cell errors while applying rule"
            );
        }
        entry.errors += effect.errors;
        entry.skipped += effect.skipped;
        entry.effects.push(effect);
    }
}
