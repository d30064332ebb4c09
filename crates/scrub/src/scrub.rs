//! Main Scrub struct and public API.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::input::{Parser, ParserConfig, SourceMetadata};
use crate::rules::RuleSet;
use crate::table::Table;
use crate::transform::{CleaningReport, EngineConfig, RuleEngine};

/// Configuration for a cleaning run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrubConfig {
    /// Parser configuration.
    pub parser: ParserConfig,
    /// Rule engine configuration.
    pub engine: EngineConfig,
    /// Drop rules with a lower confidence before applying.
    ///
    /// Rules without a confidence are always kept.
    pub min_confidence: Option<f64>,
}

/// Result of cleaning a table.
#[derive(Debug, Clone)]
pub struct CleaningRun {
    /// Metadata about the source file, when the table came from one.
    pub source: Option<SourceMetadata>,
    /// (rows, columns) before cleaning.
    pub original_shape: (usize, usize),
    /// Column names before cleaning.
    pub original_columns: Vec<String>,
    /// The cleaned table.
    pub table: Table,
    pub report: CleaningReport,
    /// Ids of rules dropped for low confidence.
    pub rules_skipped: Vec<String>,
}

/// Loads data and rule documents and runs the rule engine over them.
pub struct Scrubber {
    config: ScrubConfig,
    parser: Parser,
    engine: RuleEngine,
}

impl Scrubber {
    /// Create a new Scrubber with default configuration.
    pub fn new() -> Self {
        Self::with_config(ScrubConfig::default())
    }

    /// Create a Scrubber with custom configuration.
    pub fn with_config(config: ScrubConfig) -> Self {
        let parser = Parser::with_config(config.parser.clone());
        let engine = RuleEngine::with_config(config.engine.clone());
        Self {
            config,
            parser,
            engine,
        }
    }

    pub fn config(&self) -> &ScrubConfig {
        &self.config
    }

    /// Load a delimited data file.
    pub fn load_table(&self, path: impl AsRef<Path>) -> Result<(Table, SourceMetadata)> {
        self.parser.parse_file(path)
    }

    /// Load a rule document.
    pub fn load_rules(&self, path: impl AsRef<Path>) -> Result<RuleSet> {
        RuleSet::load(path)
    }

    /// Load a data file and a rule document, and apply the rules.
    pub fn clean(
        &self,
        data_path: impl AsRef<Path>,
        rules_path: impl AsRef<Path>,
    ) -> Result<CleaningRun> {
        let (table, source) = self.load_table(data_path)?;
        let rules = self.load_rules(rules_path)?;
        let mut run = self.clean_table(table, rules)?;
        run.source = Some(source);
        Ok(run)
    }

    /// Apply a rule set to an in-memory table.
    pub fn clean_table(&self, mut table: Table, mut rules: RuleSet) -> Result<CleaningRun> {
        let rules_skipped = match self.config.min_confidence {
            Some(min) => rules.retain_confident(min),
            None => Vec::new(),
        };
        if !rules_skipped.is_empty() {
            warn!(
                skipped = rules_skipped.len(),
                min_confidence = ?self.config.min_confidence,
                "dropped low-confidence rules"
            );
        }

        let original_shape = table.shape();
        let original_columns = table.column_names().map(|s| s.to_string()).collect();

        info!(
            rows = original_shape.0,
            columns = original_shape.1,
            rules = rules.len(),
            "cleaning table"
        );
        let report = self.engine.apply(&mut table, &rules.rules)?;

        Ok(CleaningRun {
            source: None,
            original_shape,
            original_columns,
            table,
            report,
            rules_skipped,
        })
    }
}

impl Default for Scrubber {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;
    use crate::transform::RuleStatus;

    fn rules() -> RuleSet {
        RuleSet::from_json_str(
            r#"{"rules": [
                {"rule_id": "fill", "rule_type": "imputation", "columns": ["Price"],
                 "strategy": "mean", "confidence": 0.9},
                {"rule_id": "shaky", "rule_type": "format_string", "columns": ["Price"],
                 "format": {"kind": "round", "decimals": 0}, "confidence": 0.3}
            ]}"#,
        )
        .unwrap()
    }

    fn table() -> Table {
        Table::from_columns(vec![(
            "Price",
            vec![1.25.into(), CellValue::Missing, 2.25.into()],
        )])
        .unwrap()
    }

    #[test]
    fn test_clean_table() {
        let run = Scrubber::new().clean_table(table(), rules()).unwrap();

        assert_eq!(run.original_shape, (3, 1));
        assert_eq!(run.report.log.len(), 2);
        assert_eq!(run.report.log[0].status, RuleStatus::Applied);
        assert!(run.rules_skipped.is_empty());
        assert_eq!(run.table.get(1, "Price"), Some(&CellValue::Number(2.0)));
    }

    #[test]
    fn test_min_confidence_drops_rules_before_engine() {
        let scrubber = Scrubber::with_config(ScrubConfig {
            min_confidence: Some(0.5),
            ..Default::default()
        });
        let run = scrubber.clean_table(table(), rules()).unwrap();

        assert_eq!(run.rules_skipped, vec!["shaky".to_string()]);
        assert_eq!(run.report.log.len(), 1);
        assert_eq!(run.table.get(0, "Price"), Some(&CellValue::Number(1.25)));
    }
}
