//! Column statistics shared by imputation and profiling.

use indexmap::IndexMap;

use super::CellValue;

/// Numeric values of a column, split from the present cells that are not numeric.
#[derive(Debug, Clone, Default)]
pub(crate) struct NumericSample {
    pub values: Vec<f64>,
    /// Row indices of present cells that have no numeric value.
    pub non_numeric: Vec<usize>,
}

impl NumericSample {
    pub fn collect(cells: &[CellValue]) -> Self {
        let mut sample = Self::default();
        for (row, cell) in cells.iter().enumerate() {
            if cell.is_missing() {
                continue;
            }
            match cell.as_number() {
                Some(n) => sample.values.push(n),
                None => sample.non_numeric.push(row),
            }
        }
        sample
    }
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub(crate) fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sample standard deviation (n - 1 denominator).
pub(crate) fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Most frequent present value. Ties go to the value seen first.
pub(crate) fn mode(cells: &[CellValue]) -> Option<CellValue> {
    let mut counts: IndexMap<String, (usize, &CellValue)> = IndexMap::new();
    for cell in cells {
        if let Some(key) = cell.render() {
            counts.entry(key).or_insert((0, cell)).0 += 1;
        }
    }

    let mut best: Option<(usize, &CellValue)> = None;
    for (count, cell) in counts.values() {
        if best.is_none_or(|(c, _)| *count > c) {
            best = Some((*count, cell));
        }
    }
    best.map(|(_, cell)| cell.clone())
}

/// Round to a number of decimal places.
pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let scaled = value * factor;
    // Past f64 precision there is nothing left to round.
    if !scaled.is_finite() || !factor.is_finite() {
        return value;
    }
    scaled.round() / factor
}
