//! Per-rule log entries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rules::{MalformedRuleError, Rule, RuleRecord, RuleType};
use crate::table::CellValue;

/// Final state of one rule application attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    /// At least one row was affected.
    Applied,
    /// The rule ran but affected no row.
    NoOp,
    /// The rule could not run at all.
    Failed,
}

impl RuleStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RuleStatus::Applied => "applied",
            RuleStatus::NoOp => "no-op",
            RuleStatus::Failed => "failed",
        }
    }
}

/// Why a rule failed as a whole.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The rule's shape does not satisfy its variant's contract.
    #[error("malformed rule: {}: {}", .0.field, .0.reason)]
    Malformed(MalformedRuleError),

    /// The rule references columns absent from the table.
    #[error("missing column: {}", .columns.join(", "))]
    MissingColumn { columns: Vec<String> },
}

impl FailureReason {
    /// Short label, without details.
    pub fn label(&self) -> &'static str {
        match self {
            FailureReason::Malformed(_) => "malformed rule",
            FailureReason::MissingColumn { .. } => "missing column",
        }
    }
}

/// Counts for one target column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnEffect {
    pub column: String,
    pub rows_affected: usize,
    pub errors: usize,
    pub skipped: usize,
}

/// One recorded cell error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellErrorSample {
    pub row: usize,
    pub column: String,
    pub message: String,
}

/// One changed cell, recorded when auditing is enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellChange {
    /// Row index (0-based).
    pub row: usize,
    pub column: String,
    pub before: CellValue,
    pub after: CellValue,
}

/// Record of one rule application attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub rule_id: String,

    /// Absent when a malformed rule has no recognizable type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<RuleType>,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// Target columns.
    pub columns: Vec<String>,

    /// Flag columns created by this rule.
    #[serde(default)]
    pub columns_added: Vec<String>,

    /// Distinct rows changed (or flagged) by this rule.
    pub rows_affected: usize,

    /// Cells that failed.
    pub errors: usize,

    /// Cells passed over (missing values, unusable inputs).
    pub skipped: usize,

    pub status: RuleStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,

    #[serde(default)]
    pub effects: Vec<ColumnEffect>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error_samples: Vec<CellErrorSample>,

    /// Per-cell audit trail.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<CellChange>,
}

impl LogEntry {
    /// Start an entry for a well-formed rule.
    pub fn for_rule(rule: &Rule) -> Self {
        Self {
            rule_id: rule.id.clone(),
            rule_type: Some(rule.rule_type()),
            description: rule.description.clone(),
            confidence: rule.confidence,
            columns: rule.columns.clone(),
            columns_added: Vec::new(),
            rows_affected: 0,
            errors: 0,
            skipped: 0,
            status: RuleStatus::NoOp,
            failure: None,
            effects: Vec::new(),
            error_samples: Vec::new(),
            changes: Vec::new(),
        }
    }

    /// Entry for a record that failed validation.
    pub fn rejected(record: &RuleRecord, position: usize, error: MalformedRuleError) -> Self {
        let mut entry = Self {
            rule_id: record.display_id(position),
            rule_type: record.rule_type.as_deref().and_then(RuleType::from_label),
            description: record.description.clone(),
            confidence: record.confidence,
            columns: record.columns.clone(),
            columns_added: Vec::new(),
            rows_affected: 0,
            errors: 0,
            skipped: 0,
            status: RuleStatus::Failed,
            failure: None,
            effects: Vec::new(),
            error_samples: Vec::new(),
            changes: Vec::new(),
        };
        entry.fail(FailureReason::Malformed(error));
        entry
    }

    /// Mark the whole rule as failed. Any partial counts are discarded.
    pub fn fail(&mut self, reason: FailureReason) {
        self.rows_affected = 0;
        self.columns_added.clear();
        self.effects.clear();
        self.changes.clear();
        self.status = RuleStatus::Failed;
        self.failure = Some(reason);
    }

    /// Derive the status from the counts.
    pub(crate) fn settle(&mut self) {
        self.status = if self.failure.is_some() {
            RuleStatus::Failed
        } else if self.rows_affected > 0 {
            RuleStatus::Applied
        } else {
            RuleStatus::NoOp
        };
    }

    /// Type label, `unknown` for malformed rules without a recognizable type.
    pub fn type_label(&self) -> &'static str {
        self.rule_type.map(|t| t.label()).unwrap_or("unknown")
    }

    /// Human-readable reason for a failed or no-op entry.
    pub fn problem(&self) -> Option<String> {
        match self.status {
            RuleStatus::Applied => None,
            RuleStatus::Failed => Some(
                self.failure
                    .as_ref()
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "failed".to_string()),
            ),
            RuleStatus::NoOp if self.errors > 0 => Some(format!(
                "no rows changed; {} cell error(s)",
                self.errors
            )),
            RuleStatus::NoOp if self.skipped > 0 => Some(format!(
                "no rows changed; {} cell(s) skipped",
                self.skipped
            )),
            RuleStatus::NoOp => Some("no rows changed".to_string()),
        }
    }
}
