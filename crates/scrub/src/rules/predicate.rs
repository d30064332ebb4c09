//! Anomaly predicates.

use serde::{Deserialize, Serialize};

use crate::error::CellError;
use crate::table::{CellValue, RowRef};

use super::fill::factor_product;
use super::pattern::Pattern;

fn default_tolerance() -> f64 {
    0.01
}

/// Test evaluated per cell by an anomaly flag rule.
///
/// A `true` result flags the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// The cell is missing.
    Missing,

    /// Numeric value strictly below `threshold`.
    Below { threshold: f64 },

    /// Numeric value strictly above `threshold`.
    Above { threshold: f64 },

    /// Numeric value outside `[min, max]`. At least one bound is required.
    OutsideRange {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },

    /// Present value not among `values` (compared by string form).
    NotInSet { values: Vec<CellValue> },

    /// String form matches the pattern. Missing cells match as "".
    Matches { pattern: Pattern },

    /// String form does not match the pattern. Missing cells match as "".
    NotMatches { pattern: Pattern },

    /// Value differs from the product of `factors` (rounded to cents) by
    /// more than `tolerance`.
    ProductMismatch {
        factors: Vec<String>,
        #[serde(default = "default_tolerance")]
        tolerance: f64,
    },
}

impl Predicate {
    /// Build a predicate from the legacy `pattern` + `flag_on_match` encoding.
    ///
    /// Without `flag_on_match` the rule flags values that do *not* match.
    /// Legacy patterns are compiled with [`Pattern::anchored`].
    pub fn from_pattern(pattern: Pattern, flag_on_match: bool) -> Self {
        if flag_on_match {
            Predicate::Matches { pattern }
        } else {
            Predicate::NotMatches { pattern }
        }
    }

    /// Columns read besides the target column.
    pub fn dependencies(&self) -> &[String] {
        match self {
            Predicate::ProductMismatch { factors, .. } => factors,
            _ => &[],
        }
    }

    /// Shape problem, if any, as `(field, reason)`.
    pub(crate) fn shape_error(&self) -> Option<(&'static str, String)> {
        match self {
            Predicate::OutsideRange {
                min: None,
                max: None,
            } => Some(("predicate", "outside_range needs min or max".to_string())),
            Predicate::OutsideRange {
                min: Some(min),
                max: Some(max),
            } if min > max => Some((
                "predicate",
                format!("outside_range min {} exceeds max {}", min, max),
            )),
            Predicate::ProductMismatch { factors, .. } if factors.is_empty() => {
                Some(("predicate", "product_mismatch needs factors".to_string()))
            }
            _ => None,
        }
    }

    /// Evaluate against one cell of `row`.
    pub fn test(&self, cell: &CellValue, row: RowRef<'_>) -> Result<bool, CellError> {
        match self {
            Predicate::Missing => Ok(cell.is_missing()),
            Predicate::Below { threshold } => Ok(numeric(cell)?.is_some_and(|n| n < *threshold)),
            Predicate::Above { threshold } => Ok(numeric(cell)?.is_some_and(|n| n > *threshold)),
            Predicate::OutsideRange { min, max } => Ok(numeric(cell)?.is_some_and(|n| {
                min.is_some_and(|lo| n < lo) || max.is_some_and(|hi| n > hi)
            })),
            Predicate::NotInSet { values } => Ok(match cell.render() {
                Some(text) => !values.iter().any(|v| v.render().as_deref() == Some(text.as_str())),
                None => false,
            }),
            Predicate::Matches { pattern } => Ok(pattern.is_match(&cell.render().unwrap_or_default())),
            Predicate::NotMatches { pattern } => {
                Ok(!pattern.is_match(&cell.render().unwrap_or_default()))
            }
            Predicate::ProductMismatch { factors, tolerance } => {
                let Some(value) = numeric(cell)? else {
                    return Ok(false);
                };
                let Some(expected) = factor_product(row, factors)? else {
                    return Ok(false);
                };
                let expected = crate::table::stats::round_to(expected, 2);
                Ok((value - expected).abs() > *tolerance)
            }
        }
    }
}

/// Numeric value of a present cell; missing cells yield `None`.
fn numeric(cell: &CellValue) -> Result<Option<f64>, CellError> {
    if cell.is_missing() {
        return Ok(None);
    }
    cell.as_number().map(Some).ok_or_else(|| CellError::NotNumeric {
        value: cell.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    fn table() -> Table {
        Table::from_columns(vec![
            (
                "total",
                vec![CellValue::from(21.0), CellValue::from(99.0), CellValue::Missing],
            ),
            (
                "price",
                vec![CellValue::from(10.5), CellValue::from(20.0), CellValue::from(1.0)],
            ),
            (
                "qty",
                vec![CellValue::from(2.0), CellValue::from(1.0), CellValue::Missing],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_missing() {
        let t = table();
        let p = Predicate::Missing;
        assert!(!p.test(&CellValue::from(5.0), t.row_ref(0)).unwrap());
        assert!(p.test(&CellValue::Missing, t.row_ref(0)).unwrap());
    }

    #[test]
    fn test_numeric_thresholds() {
        let t = table();
        let below = Predicate::Below { threshold: 0.0 };
        assert!(below.test(&CellValue::from(-1.0), t.row_ref(0)).unwrap());
        assert!(!below.test(&CellValue::Missing, t.row_ref(0)).unwrap());
        assert_eq!(
            below.test(&CellValue::from("abc"), t.row_ref(0)),
            Err(CellError::NotNumeric {
                value: "abc".to_string()
            })
        );

        let range = Predicate::OutsideRange {
            min: Some(1.0),
            max: Some(10.0),
        };
        assert!(range.test(&CellValue::from(11.0), t.row_ref(0)).unwrap());
        assert!(!range.test(&CellValue::from("5"), t.row_ref(0)).unwrap());
    }

    #[test]
    fn test_not_in_set() {
        let t = table();
        let p: Predicate = serde_json::from_str(
            r#"{"kind": "not_in_set", "values": ["Cash", "Credit Card", 1]}"#,
        )
        .unwrap();
        assert!(!p.test(&CellValue::from("Cash"), t.row_ref(0)).unwrap());
        assert!(!p.test(&CellValue::from(1.0), t.row_ref(0)).unwrap());
        assert!(p.test(&CellValue::from("Bitcoin"), t.row_ref(0)).unwrap());
        assert!(!p.test(&CellValue::Missing, t.row_ref(0)).unwrap());
    }

    #[test]
    fn test_legacy_pattern_encoding() {
        let t = table();
        let pattern = Pattern::new(r"^(nan|NULL|None|\s*)$").unwrap();
        let on_match = Predicate::from_pattern(pattern.clone(), true);
        assert!(on_match.test(&CellValue::Missing, t.row_ref(0)).unwrap());
        assert!(!on_match.test(&CellValue::from("Item_1"), t.row_ref(0)).unwrap());

        let on_mismatch = Predicate::from_pattern(pattern, false);
        assert!(on_mismatch.test(&CellValue::from("Item_1"), t.row_ref(0)).unwrap());
    }

    #[test]
    fn test_product_mismatch() {
        let t = table();
        let p = Predicate::ProductMismatch {
            factors: vec!["price".to_string(), "qty".to_string()],
            tolerance: 0.01,
        };
        let total = t.column("total").unwrap();
        assert!(!p.test(&total[0], t.row_ref(0)).unwrap());
        assert!(p.test(&total[1], t.row_ref(1)).unwrap());
        assert!(!p.test(&total[2], t.row_ref(2)).unwrap());
    }

    #[test]
    fn test_shape_errors() {
        assert!(Predicate::OutsideRange { min: None, max: None }
            .shape_error()
            .is_some());
        assert!(Predicate::ProductMismatch {
            factors: vec![],
            tolerance: 0.01
        }
        .shape_error()
        .is_some());
        assert!(Predicate::Missing.shape_error().is_none());
    }
}
