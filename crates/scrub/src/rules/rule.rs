//! Typed, validated rules.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::table::CellValue;

use super::directive::FormatDirective;
use super::fill::FillStrategy;
use super::pattern::{normalize_replacement, Pattern};
use super::predicate::Predicate;
use super::record::RuleRecord;

// Legacy imputation encodings written into `replacement`.
static PRODUCT_TEMPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\[[^\]]+\](?:\s*\*\s*\[[^\]]+\])+\s*$").expect("valid product template pattern")
});
static BRACKETED_COLUMN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]").expect("valid column reference pattern"));

/// The four rule variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Transformation,
    Imputation,
    AnomalyFlag,
    FormatString,
}

impl RuleType {
    /// Snake-case tag as written in rule documents.
    pub fn label(&self) -> &'static str {
        match self {
            RuleType::Transformation => "transformation",
            RuleType::Imputation => "imputation",
            RuleType::AnomalyFlag => "anomaly_flag",
            RuleType::FormatString => "format_string",
        }
    }

    /// Parse a tag, ignoring case and surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "transformation" => Some(RuleType::Transformation),
            "imputation" => Some(RuleType::Imputation),
            "anomaly_flag" => Some(RuleType::AnomalyFlag),
            "format_string" => Some(RuleType::FormatString),
            _ => None,
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A rule whose shape does not satisfy its variant's contract.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("rule '{rule_id}' is malformed: {field}: {reason}")]
pub struct MalformedRuleError {
    pub rule_id: String,
    /// The missing or invalid field.
    pub field: String,
    pub reason: String,
}

impl MalformedRuleError {
    pub(crate) fn new(rule_id: &str, field: &str, reason: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Variant-specific payload of a rule.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    /// Regex replacement over each cell's string form.
    Transformation {
        pattern: Pattern,
        /// Template in regex crate syntax.
        replacement: String,
    },
    /// Fill missing cells.
    Imputation { strategy: FillStrategy },
    /// Add a boolean flag column per target column.
    AnomalyFlag { predicate: Predicate },
    /// Reformat present cells in place.
    FormatString { directive: FormatDirective },
}

impl RuleKind {
    pub fn rule_type(&self) -> RuleType {
        match self {
            RuleKind::Transformation { .. } => RuleType::Transformation,
            RuleKind::Imputation { .. } => RuleType::Imputation,
            RuleKind::AnomalyFlag { .. } => RuleType::AnomalyFlag,
            RuleKind::FormatString { .. } => RuleType::FormatString,
        }
    }
}

/// A well-formed cleaning rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub id: String,
    pub description: String,
    /// Carried to the log; never enforced by the engine.
    pub confidence: Option<f64>,
    /// Target columns, non-empty.
    pub columns: Vec<String>,
    pub reasoning: String,
    pub kind: RuleKind,
}

impl Rule {
    /// Validate a raw record into a typed rule.
    ///
    /// `position` is the record's 0-based index in its rule list, used to
    /// name records that have no `rule_id`.
    pub fn from_record(record: &RuleRecord, position: usize) -> Result<Self, MalformedRuleError> {
        let id = record.display_id(position);
        let malformed = |field: &str, reason: String| MalformedRuleError::new(&id, field, reason);

        if let Some(reason) = &record.unreadable {
            return Err(malformed("record", reason.clone()));
        }

        if record
            .rule_id
            .as_deref()
            .is_none_or(|s| s.trim().is_empty())
        {
            return Err(malformed("rule_id", "missing".to_string()));
        }

        let rule_type = match record.rule_type.as_deref() {
            None => return Err(malformed("rule_type", "missing".to_string())),
            Some(label) => RuleType::from_label(label)
                .ok_or_else(|| malformed("rule_type", format!("unknown rule type '{}'", label)))?,
        };

        if record.columns.is_empty() {
            return Err(malformed("columns", "at least one column is required".to_string()));
        }
        if let Some(blank) = record.columns.iter().find(|c| c.is_empty()) {
            return Err(malformed("columns", format!("empty column name '{}'", blank)));
        }

        let kind = match rule_type {
            RuleType::Transformation => transformation(record, &id)?,
            RuleType::Imputation => imputation(record, &id)?,
            RuleType::AnomalyFlag => anomaly_flag(record, &id)?,
            RuleType::FormatString => format_string(record, &id)?,
        };

        Ok(Self {
            id,
            description: record.description.clone(),
            confidence: record.confidence,
            columns: record.columns.clone(),
            reasoning: record.reasoning.clone(),
            kind,
        })
    }

    pub fn rule_type(&self) -> RuleType {
        self.kind.rule_type()
    }

    /// Columns read besides the targets.
    pub fn dependencies(&self) -> &[String] {
        match &self.kind {
            RuleKind::Imputation { strategy } => strategy.dependencies(),
            RuleKind::AnomalyFlag { predicate } => predicate.dependencies(),
            RuleKind::Transformation { .. } | RuleKind::FormatString { .. } => &[],
        }
    }

    /// Name of the flag column an anomaly rule writes for `column`.
    pub fn flag_column(&self, column: &str) -> String {
        format!("{}_flag_{}", column, self.id)
    }
}

impl TryFrom<&RuleRecord> for Rule {
    type Error = MalformedRuleError;

    fn try_from(record: &RuleRecord) -> Result<Self, Self::Error> {
        Rule::from_record(record, 0)
    }
}

fn compile(id: &str, field: &str, source: &str) -> Result<Pattern, MalformedRuleError> {
    Pattern::new(source).map_err(|e| MalformedRuleError::new(id, field, e.to_string()))
}

fn transformation(record: &RuleRecord, id: &str) -> Result<RuleKind, MalformedRuleError> {
    let pattern = record
        .pattern
        .as_deref()
        .ok_or_else(|| MalformedRuleError::new(id, "pattern", "missing"))?;
    let replacement = record
        .replacement
        .as_deref()
        .ok_or_else(|| MalformedRuleError::new(id, "replacement", "missing"))?;

    Ok(RuleKind::Transformation {
        pattern: compile(id, "pattern", pattern)?,
        replacement: normalize_replacement(replacement),
    })
}

fn imputation(record: &RuleRecord, id: &str) -> Result<RuleKind, MalformedRuleError> {
    let strategy = match record.strategy.as_deref() {
        Some(name) => named_strategy(record, id, name)?,
        None => match record.replacement.as_deref() {
            Some(replacement) => legacy_strategy(record, replacement),
            None => match &record.fill_value {
                Some(value) => FillStrategy::Constant(fill_value(id, value)?),
                None => return Err(MalformedRuleError::new(id, "strategy", "missing")),
            },
        },
    };
    Ok(RuleKind::Imputation { strategy })
}

fn named_strategy(record: &RuleRecord, id: &str, name: &str) -> Result<FillStrategy, MalformedRuleError> {
    match name.trim().to_lowercase().as_str() {
        "mean" => Ok(FillStrategy::Mean),
        "median" => Ok(FillStrategy::Median),
        "mode" | "most_frequent" => Ok(FillStrategy::Mode),
        "constant" => match (&record.fill_value, record.replacement.as_deref()) {
            (Some(value), _) => Ok(FillStrategy::Constant(fill_value(id, value)?)),
            (None, Some(text)) => Ok(FillStrategy::Constant(CellValue::text(text))),
            (None, None) => Err(MalformedRuleError::new(
                id,
                "fill_value",
                "constant strategy needs a fill_value",
            )),
        },
        "product" => {
            if record.factors.is_empty() {
                Err(MalformedRuleError::new(id, "factors", "product strategy needs factors"))
            } else {
                Ok(FillStrategy::Product {
                    factors: record.factors.clone(),
                })
            }
        }
        "group_median" => match &record.group_by {
            Some(group_by) if !group_by.is_empty() => Ok(FillStrategy::GroupMedian {
                group_by: group_by.clone(),
            }),
            _ => Err(MalformedRuleError::new(
                id,
                "group_by",
                "group_median strategy needs group_by",
            )),
        },
        other => Err(MalformedRuleError::new(
            id,
            "strategy",
            format!("unknown strategy '{}'", other),
        )),
    }
}

/// Interpret the `replacement` field of an imputation rule without `strategy`.
fn legacy_strategy(record: &RuleRecord, replacement: &str) -> FillStrategy {
    if PRODUCT_TEMPLATE.is_match(replacement) {
        let factors = BRACKETED_COLUMN
            .captures_iter(replacement)
            .map(|c| c[1].trim().to_string())
            .collect();
        return FillStrategy::Product { factors };
    }

    match replacement.trim() {
        "<MEDIAN_FROM_GROUP_OR_GLOBAL>" => match &record.group_by {
            Some(group_by) if !group_by.is_empty() => FillStrategy::GroupMedian {
                group_by: group_by.clone(),
            },
            _ => FillStrategy::Median,
        },
        "<MEAN>" => FillStrategy::Mean,
        "<MEDIAN>" => FillStrategy::Median,
        "<MODE>" => FillStrategy::Mode,
        _ => FillStrategy::Constant(CellValue::text(replacement)),
    }
}

fn fill_value(id: &str, value: &Value) -> Result<CellValue, MalformedRuleError> {
    match serde_json::from_value::<CellValue>(value.clone()) {
        Ok(CellValue::Missing) => Err(MalformedRuleError::new(id, "fill_value", "null fill value")),
        Ok(cell) => Ok(cell),
        Err(_) => Err(MalformedRuleError::new(
            id,
            "fill_value",
            format!("expected a scalar, got {}", value),
        )),
    }
}

fn anomaly_flag(record: &RuleRecord, id: &str) -> Result<RuleKind, MalformedRuleError> {
    let predicate = match &record.predicate {
        Some(value) => {
            // A bare string names a field-less predicate: "missing".
            let value = match value {
                Value::String(kind) => serde_json::json!({ "kind": kind }),
                other => other.clone(),
            };
            let predicate: Predicate = serde_json::from_value(value)
                .map_err(|e| MalformedRuleError::new(id, "predicate", e.to_string()))?;
            if let Some((field, reason)) = predicate.shape_error() {
                return Err(MalformedRuleError::new(id, field, reason));
            }
            predicate
        }
        None => match record.pattern.as_deref() {
            Some(pattern) => Predicate::from_pattern(
                Pattern::anchored(pattern)
                    .map_err(|e| MalformedRuleError::new(id, "pattern", e.to_string()))?,
                record.flag_on_match.unwrap_or(false),
            ),
            None => return Err(MalformedRuleError::new(id, "predicate", "missing")),
        },
    };
    Ok(RuleKind::AnomalyFlag { predicate })
}

fn format_string(record: &RuleRecord, id: &str) -> Result<RuleKind, MalformedRuleError> {
    let directive = format_directive(record, id)?;
    if let Some((field, reason)) = directive.shape_error() {
        return Err(MalformedRuleError::new(id, field, reason));
    }
    Ok(RuleKind::FormatString { directive })
}

fn format_directive(record: &RuleRecord, id: &str) -> Result<FormatDirective, MalformedRuleError> {
    if let Some(value) = &record.format {
        let value = match value {
            Value::String(kind) => serde_json::json!({ "kind": kind }),
            other => other.clone(),
        };
        let directive: FormatDirective = serde_json::from_value(value)
            .map_err(|e| MalformedRuleError::new(id, "format", e.to_string()))?;
        let directive = match directive {
            FormatDirective::Replace {
                pattern,
                replacement,
            } => FormatDirective::Replace {
                pattern,
                replacement: normalize_replacement(&replacement),
            },
            other => other,
        };
        return Ok(directive);
    }

    match (record.pattern.as_deref(), record.replacement.as_deref()) {
        (_, Some(replacement)) if replacement.contains('%') => FormatDirective::from_printf(replacement)
            .ok_or_else(|| {
                MalformedRuleError::new(
                    id,
                    "replacement",
                    format!("unsupported format directive '{}'", replacement),
                )
            }),
        (Some(pattern), Some(replacement)) => Ok(FormatDirective::Replace {
            pattern: compile(id, "pattern", pattern)?,
            replacement: normalize_replacement(replacement),
        }),
        _ => Err(MalformedRuleError::new(id, "format", "missing")),
    }
}
