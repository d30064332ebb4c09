//! Rule model: raw records, rule documents and validated rules.
//!
//! A [`RuleRecord`] is whatever the rule generator wrote. [`Rule::from_record`]
//! checks its shape and produces a [`Rule`] whose [`RuleKind`] carries the
//! compiled, variant-specific payload, or a [`MalformedRuleError`] naming the
//! offending field.

mod directive;
pub(crate) mod fill;
mod pattern;
mod predicate;
mod record;
mod rule;

pub use directive::FormatDirective;
pub use fill::FillStrategy;
pub use pattern::{normalize_replacement, Pattern};
pub use predicate::Predicate;
pub use record::{RuleRecord, RuleSet, RuleSetMetadata};
pub use rule::{MalformedRuleError, Rule, RuleKind, RuleType};
