//! Imputation fill strategies.

use crate::error::CellError;
use crate::table::{CellValue, RowRef};

/// How an imputation rule fills missing cells.
#[derive(Debug, Clone, PartialEq)]
pub enum FillStrategy {
    /// A literal value.
    Constant(CellValue),
    /// Mean of the column's numeric values.
    Mean,
    /// Median of the column's numeric values.
    Median,
    /// Most frequent present value.
    Mode,
    /// Row-wise product of other columns.
    Product { factors: Vec<String> },
    /// Median of the target within the row's group, else the global median.
    GroupMedian { group_by: String },
}

impl FillStrategy {
    /// Short name, as written in rule documents.
    pub fn name(&self) -> &'static str {
        match self {
            FillStrategy::Constant(_) => "constant",
            FillStrategy::Mean => "mean",
            FillStrategy::Median => "median",
            FillStrategy::Mode => "mode",
            FillStrategy::Product { .. } => "product",
            FillStrategy::GroupMedian { .. } => "group_median",
        }
    }

    /// Columns read besides the target column.
    pub fn dependencies(&self) -> &[String] {
        match self {
            FillStrategy::Product { factors } => factors,
            FillStrategy::GroupMedian { group_by } => std::slice::from_ref(group_by),
            _ => &[],
        }
    }
}

/// Product of the numeric values of `factors` in `row`.
///
/// `Ok(None)` when any factor is missing; an error when one is present but
/// not numeric.
pub(crate) fn factor_product(row: RowRef<'_>, factors: &[String]) -> Result<Option<f64>, CellError> {
    let mut product = 1.0;
    for factor in factors {
        let cell = row.get(factor).unwrap_or(&CellValue::Missing);
        if cell.is_missing() {
            return Ok(None);
        }
        match cell.as_number() {
            Some(n) => product *= n,
            None => {
                return Err(CellError::NotNumeric {
                    value: cell.to_string(),
                })
            }
        }
    }
    Ok(Some(product))
}
