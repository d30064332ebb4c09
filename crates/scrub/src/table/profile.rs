//! Per-column profiling of a table.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::stats::{self, NumericSample};
use super::{CellValue, Table};

/// Overview of a table's contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableProfile {
    pub rows: usize,
    pub columns: usize,
    /// Rows identical to an earlier row.
    pub duplicate_rows: usize,
    pub column_profiles: Vec<ColumnProfile>,
}

/// Profile of a single column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub missing: usize,
    /// Missing cells as a percentage of rows (0-100).
    pub missing_pct: f64,
    /// Distinct present values.
    pub distinct: usize,
    /// Present only when every present value is numeric.
    pub numeric: Option<NumericSummary>,
}

/// Descriptive statistics for a numeric column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericSummary {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: Option<f64>,
}

impl Table {
    /// Profile every column.
    pub fn profile(&self) -> TableProfile {
        let rows = self.row_count();
        let column_profiles = self
            .columns()
            .map(|(name, values)| profile_column(name, values, rows))
            .collect();

        TableProfile {
            rows,
            columns: self.column_count(),
            duplicate_rows: self.duplicate_rows(),
            column_profiles,
        }
    }

    fn duplicate_rows(&self) -> usize {
        let mut seen = HashSet::new();
        let mut duplicates = 0;
        for index in 0..self.row_count() {
            let Some(row) = self.row(index) else { continue };
            let key: Vec<Option<String>> = row.iter().map(|c| c.render()).collect();
            if !seen.insert(key) {
                duplicates += 1;
            }
        }
        duplicates
    }
}

fn profile_column(name: &str, values: &[CellValue], rows: usize) -> ColumnProfile {
    let missing = values.iter().filter(|c| c.is_missing()).count();
    let distinct = values
        .iter()
        .filter_map(|c| c.render())
        .collect::<HashSet<_>>()
        .len();

    let sample = NumericSample::collect(values);
    let numeric = if sample.non_numeric.is_empty() {
        summarize(&sample.values)
    } else {
        None
    };

    ColumnProfile {
        name: name.to_string(),
        missing,
        missing_pct: if rows == 0 {
            0.0
        } else {
            missing as f64 / rows as f64 * 100.0
        },
        distinct,
        numeric,
    }
}

fn summarize(values: &[f64]) -> Option<NumericSummary> {
    let mean = stats::mean(values)?;
    let median = stats::median(values)?;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some(NumericSummary {
        mean,
        median,
        min,
        max,
        std_dev: stats::std_dev(values),
    })
}
