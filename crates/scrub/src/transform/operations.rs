//! Per-column cell operations for each rule type.
//!
//! Each operation reads the table and returns the outcome for every cell it
//! looked at. Nothing here mutates the table; the engine commits outcomes
//! afterwards.

use indexmap::IndexMap;

use crate::error::CellError;
use crate::rules::fill::factor_product;
use crate::rules::{FillStrategy, FormatDirective, Pattern, Predicate};
use crate::table::stats::{self, NumericSample};
use crate::table::{CellValue, Table};

/// What happened to one cell.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CellOutcome {
    /// The cell gets a new value.
    Changed(CellValue),
    /// The cell was examined and keeps its value.
    Unchanged,
    /// The cell was passed over.
    Skipped,
    /// The cell could not be processed.
    Failed(CellError),
}

/// Outcomes for one target column, keyed by row index.
pub(crate) type Outcomes = Vec<(usize, CellOutcome)>;

/// Regex replacement over each present cell's string form.
pub(crate) fn transform_column(
    table: &Table,
    column: &str,
    pattern: &Pattern,
    replacement: &str,
) -> Outcomes {
    let cells = table.column(column).unwrap_or_default();
    cells
        .iter()
        .enumerate()
        .map(|(row, cell)| {
            let Some(text) = cell.render() else {
                return (row, CellOutcome::Skipped);
            };
            let outcome = match pattern.replace_all(&text, replacement) {
                Some(replaced) if replaced != text => CellOutcome::Changed(CellValue::Text(replaced)),
                _ => CellOutcome::Unchanged,
            };
            (row, outcome)
        })
        .collect()
}

/// Fill the missing cells of a column.
///
/// Column statistics are computed once, from the values present before any
/// cell is filled.
pub(crate) fn impute_column(table: &Table, column: &str, strategy: &FillStrategy) -> Outcomes {
    let cells = table.column(column).unwrap_or_default();
    let missing: Vec<usize> = cells
        .iter()
        .enumerate()
        .filter(|(_, cell)| cell.is_missing())
        .map(|(row, _)| row)
        .collect();

    if missing.is_empty() {
        return Vec::new();
    }

    let undefined = |statistic: &str| {
        CellOutcome::Failed(CellError::StatisticUndefined {
            statistic: statistic.to_string(),
            column: column.to_string(),
        })
    };

    match strategy {
        FillStrategy::Constant(value) => fill_all(&missing, CellOutcome::Changed(value.clone())),
        FillStrategy::Mean | FillStrategy::Median => {
            let sample = NumericSample::collect(cells);
            let statistic = match strategy {
                FillStrategy::Mean => stats::mean(&sample.values),
                _ => stats::median(&sample.values),
            };
            let fill = match statistic {
                Some(value) => CellOutcome::Changed(CellValue::Number(value)),
                None => undefined(strategy.name()),
            };
            let mut outcomes = non_numeric_failures(cells, &sample);
            outcomes.extend(fill_all(&missing, fill));
            outcomes
        }
        FillStrategy::Mode => {
            let fill = match stats::mode(cells) {
                Some(value) => CellOutcome::Changed(value),
                None => undefined(strategy.name()),
            };
            fill_all(&missing, fill)
        }
        FillStrategy::Product { factors } => missing
            .iter()
            .map(|&row| {
                let outcome = match factor_product(table.row_ref(row), factors) {
                    Ok(Some(product)) => CellOutcome::Changed(CellValue::Number(product)),
                    Ok(None) => CellOutcome::Skipped,
                    Err(e) => CellOutcome::Failed(e),
                };
                (row, outcome)
            })
            .collect(),
        FillStrategy::GroupMedian { group_by } => {
            group_median(table, column, cells, group_by, &missing, undefined)
        }
    }
}

fn group_median(
    table: &Table,
    column: &str,
    cells: &[CellValue],
    group_by: &str,
    missing: &[usize],
    undefined: impl Fn(&str) -> CellOutcome,
) -> Outcomes {
    let groups_column = table.column(group_by).unwrap_or_default();
    let group_key = |row: usize| groups_column.get(row).and_then(|cell| cell.render());

    let sample = NumericSample::collect(cells);
    let global = stats::median(&sample.values);

    let mut grouped: IndexMap<String, Vec<f64>> = IndexMap::new();
    for (row, cell) in cells.iter().enumerate() {
        if let (Some(value), Some(key)) = (cell.as_number(), group_key(row)) {
            grouped.entry(key).or_default().push(value);
        }
    }
    let group_medians: IndexMap<String, f64> = grouped
        .into_iter()
        .filter_map(|(key, values)| stats::median(&values).map(|m| (key, m)))
        .collect();

    let mut outcomes = non_numeric_failures(cells, &sample);
    for &row in missing {
        let fill = group_key(row)
            .and_then(|key| group_medians.get(&key).copied())
            .or(global);
        let outcome = match fill {
            Some(value) => CellOutcome::Changed(CellValue::Number(value)),
            None => undefined("median"),
        };
        outcomes.push((row, outcome));
    }
    tracing::trace!(column, groups = group_medians.len(), "computed group medians");
    outcomes
}

/// Evaluate a predicate on every cell. `Ok(true)` marks a flagged row.
pub(crate) fn flag_column(
    table: &Table,
    column: &str,
    predicate: &Predicate,
) -> Vec<(usize, Result<bool, CellError>)> {
    let cells = table.column(column).unwrap_or_default();
    cells
        .iter()
        .enumerate()
        .map(|(row, cell)| (row, predicate.test(cell, table.row_ref(row))))
        .collect()
}

/// Reformat every present cell of a column.
pub(crate) fn format_column(table: &Table, column: &str, directive: &FormatDirective) -> Outcomes {
    let cells = table.column(column).unwrap_or_default();
    cells
        .iter()
        .enumerate()
        .map(|(row, cell)| {
            if cell.is_missing() {
                return (row, CellOutcome::Skipped);
            }
            let outcome = match directive.apply(cell) {
                Ok(formatted) if formatted != *cell => CellOutcome::Changed(formatted),
                Ok(_) => CellOutcome::Unchanged,
                Err(e) => CellOutcome::Failed(e),
            };
            (row, outcome)
        })
        .collect()
}

fn fill_all(rows: &[usize], outcome: CellOutcome) -> Outcomes {
    rows.iter().map(|&row| (row, outcome.clone())).collect()
}

fn non_numeric_failures(cells: &[CellValue], sample: &NumericSample) -> Outcomes {
    sample
        .non_numeric
        .iter()
        .map(|&row| {
            let value = cells[row].to_string();
            (row, CellOutcome::Failed(CellError::NotNumeric { value }))
        })
        .collect()
}
