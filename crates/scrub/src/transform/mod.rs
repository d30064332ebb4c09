//! Rule application: applies cleaning rules to a table and logs their effects.

mod engine;
mod log;
mod operations;
mod summary;

pub use engine::{EngineConfig, RuleEngine};
pub use log::{CellChange, CellErrorSample, ColumnEffect, FailureReason, LogEntry, RuleStatus};
pub use summary::{CleaningReport, CleaningSummary, RuleProblem};
