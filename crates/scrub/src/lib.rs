//! Scrub: rule-driven cleaning for tabular datasets.
//!
//! Scrub applies declarative cleaning rules, usually produced by an external
//! rule generator, to a table. Each rule either rewrites values with a regex,
//! fills missing values, flags anomalous rows in a new boolean column, or
//! reformats values. Every rule application is recorded in a log entry, and
//! the log is summarized at the end of the run.
//!
//! # Core Principles
//!
//! - **Sequential**: Rules run in order; later rules see earlier effects
//! - **Isolated failures**: A bad rule or cell never aborts the run
//! - **Auditable**: Every rule yields a log entry, optionally with per-cell changes
//!
//! # Example
//!
//! ```no_run
//! use scrub::{CleaningLogDocument, Scrubber, TableFormat};
//!
//! let scrubber = Scrubber::new();
//! let run = scrubber.clean("sales.csv", "cleaning_rules.json").unwrap();
//!
//! println!("Rules applied: {}", run.report.summary.rules_applied);
//! scrub::write_table(&run.table, "cleaned_data.csv", TableFormat::Csv).unwrap();
//! CleaningLogDocument::new(&run, None).save("cleaning_log.json").unwrap();
//! ```

pub mod error;
pub mod input;
pub mod output;
pub mod rules;
pub mod table;
pub mod transform;

mod scrub;

pub use crate::scrub::{CleaningRun, ScrubConfig, Scrubber};
pub use error::{CellError, Result, ScrubError, TableError};
pub use input::{Parser, ParserConfig, SourceMetadata};
pub use output::{write_table, CleaningLogDocument, TableFormat};
pub use rules::{MalformedRuleError, Rule, RuleKind, RuleRecord, RuleSet, RuleType};
pub use table::{CellValue, Table, TableProfile};
pub use transform::{
    CleaningReport, CleaningSummary, EngineConfig, FailureReason, LogEntry, RuleEngine,
    RuleStatus,
};
