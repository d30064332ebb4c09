//! Raw rule records and rule documents, as produced by a rule generator.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, ScrubError};

/// One rule exactly as authored.
///
/// Every field is optional so that a single bad rule never prevents the rest
/// of a document from loading. Shape is checked later by
/// [`Rule::from_record`](super::Rule::from_record).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<String>,

    #[serde(default)]
    pub columns: Vec<String>,

    #[serde(default)]
    pub reasoning: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,

    /// Imputation strategy name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,

    /// Literal for the `constant` imputation strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_value: Option<Value>,

    /// Columns multiplied by the `product` imputation strategy.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub factors: Vec<String>,

    /// Grouping column for the `group_median` imputation strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,

    /// Anomaly predicate, tagged by `kind`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_on_match: Option<bool>,

    /// Format directive, tagged by `kind`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,

    /// Why the record could not be read, when it could not.
    #[serde(skip)]
    pub(crate) unreadable: Option<String>,

    /// Position in the document the record was loaded from.
    #[serde(skip)]
    pub(crate) position: Option<usize>,
}

impl RuleRecord {
    /// Read a record from a JSON value.
    ///
    /// Never fails: a value that does not fit the record shape becomes an
    /// unreadable record (keeping its `rule_id` when one is present), which
    /// later validates as malformed.
    pub fn from_json(value: Value) -> Self {
        let rule_id = value
            .get("rule_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        match serde_json::from_value::<RuleRecord>(value) {
            Ok(record) => record,
            Err(e) => RuleRecord {
                rule_id,
                unreadable: Some(e.to_string()),
                ..Default::default()
            },
        }
    }

    /// Identifier used in logs: the `rule_id`, or `rule_<position>` (1-based).
    ///
    /// A position pinned by [`RuleSet::retain_confident`] wins over `position`.
    pub fn display_id(&self, position: usize) -> String {
        match self.rule_id.as_deref() {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => format!("rule_{}", self.position.unwrap_or(position) + 1),
        }
    }

    /// Returns true if the record could not be read at all.
    pub fn is_unreadable(&self) -> bool {
        self.unreadable.is_some()
    }
}

/// Descriptive block at the top of a rule document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSetMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rules: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Anything else the generator wrote.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// An ordered list of rule records with optional metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RuleSetMetadata>,
    pub rules: Vec<RuleRecord>,
}

impl RuleSet {
    /// Create a rule set from records.
    pub fn new(rules: Vec<RuleRecord>) -> Self {
        Self {
            metadata: None,
            rules,
        }
    }

    /// Load a rule document from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ScrubError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let value: Value = serde_json::from_reader(BufReader::new(file))?;
        let rule_set = Self::from_value(value)?;
        debug!(path = %path.display(), rules = rule_set.len(), "loaded rule document");
        Ok(rule_set)
    }

    /// Parse a rule document from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Build a rule set from a parsed document.
    ///
    /// Accepts `{"metadata": {...}, "rules": [...]}` or a bare array of rules.
    pub fn from_value(value: Value) -> Result<Self> {
        let (metadata, rules) = match value {
            Value::Array(rules) => (None, rules),
            Value::Object(mut doc) => {
                let rules = match doc.remove("rules") {
                    Some(Value::Array(rules)) => rules,
                    Some(_) => {
                        return Err(ScrubError::Config(
                            "'rules' must be an array".to_string(),
                        ))
                    }
                    None => {
                        return Err(ScrubError::Config(
                            "rule document has no 'rules' array".to_string(),
                        ))
                    }
                };
                let metadata = match doc.remove("metadata") {
                    Some(meta) => match serde_json::from_value(meta) {
                        Ok(meta) => Some(meta),
                        Err(e) => {
                            warn!("ignoring unreadable rule metadata: {}", e);
                            None
                        }
                    },
                    None => None,
                };
                (metadata, rules)
            }
            _ => {
                return Err(ScrubError::Config(
                    "rule document must be an object or an array".to_string(),
                ))
            }
        };

        let rules: Vec<RuleRecord> = rules.into_iter().map(RuleRecord::from_json).collect();

        if let Some(declared) = metadata.as_ref().and_then(|m: &RuleSetMetadata| m.total_rules) {
            if declared != rules.len() {
                warn!(
                    declared,
                    found = rules.len(),
                    "rule document metadata disagrees with rule count"
                );
            }
        }

        Ok(Self { metadata, rules })
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Keep only rules whose confidence is at least `min`.
    ///
    /// Rules without a confidence are kept. Returns the ids of dropped rules.
    /// Kept rules without a `rule_id` keep the positional id they had before
    /// filtering.
    pub fn retain_confident(&mut self, min: f64) -> Vec<String> {
        let mut dropped = Vec::new();
        let mut position = 0;
        self.rules.retain_mut(|rule| {
            rule.position.get_or_insert(position);
            position += 1;
            let keep = rule.confidence.is_none_or(|c| c >= min);
            if !keep {
                dropped.push(rule.display_id(position - 1));
            }
            keep
        });
        dropped
    }
}
