//! Formatting directives for `format_string` rules.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CellError;
use crate::table::CellValue;
use crate::table::stats::round_to;

use super::pattern::Pattern;

/// Largest `decimals` accepted by `round` and `fixed`.
pub const MAX_DECIMALS: u32 = 15;

/// Largest `width` accepted by `zero_pad`.
pub const MAX_WIDTH: usize = 1024;

// printf-style directives as written by rule generators: %.2f, %f, %05d, %d
static PRINTF_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^%(0?)(\d*)(?:\.(\d+))?([df])$").expect("valid printf pattern"));

/// Formatting action applied in place to present cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormatDirective {
    /// Round numbers to `decimals` places; the cell stays numeric.
    Round { decimals: u32 },

    /// Render numbers as text with exactly `decimals` places.
    Fixed { decimals: u32 },

    /// Render integers as text left-padded with zeros to `width`.
    ZeroPad { width: usize },

    Uppercase,
    Lowercase,
    TitleCase,
    Trim,

    /// Regex replacement over the value's string form.
    Replace { pattern: Pattern, replacement: String },
}

impl FormatDirective {
    /// Parse a printf-style directive (`%.2f`, `%05d`, ...).
    ///
    /// `%d` without zero padding rounds to an integer and keeps the cell numeric.
    pub fn from_printf(spec: &str) -> Option<Self> {
        let caps = PRINTF_DIRECTIVE.captures(spec.trim())?;
        let zero = !caps[1].is_empty();
        let width: Option<usize> = caps.get(2).and_then(|m| m.as_str().parse().ok());
        let precision: Option<u32> = caps.get(3).and_then(|m| m.as_str().parse().ok());

        match &caps[4] {
            "f" => Some(FormatDirective::Round {
                decimals: precision.unwrap_or(6),
            }),
            "d" if zero => width.map(|width| FormatDirective::ZeroPad { width }),
            "d" => Some(FormatDirective::Round { decimals: 0 }),
            _ => None,
        }
    }

    /// Shape problem, if any, as `(field, reason)`.
    pub(crate) fn shape_error(&self) -> Option<(&'static str, String)> {
        match self {
            FormatDirective::Round { decimals } | FormatDirective::Fixed { decimals }
                if *decimals > MAX_DECIMALS =>
            {
                Some((
                    "format",
                    format!("decimals {} exceeds {}", decimals, MAX_DECIMALS),
                ))
            }
            FormatDirective::ZeroPad { width } if *width > MAX_WIDTH => {
                Some(("format", format!("width {} exceeds {}", width, MAX_WIDTH)))
            }
            _ => None,
        }
    }

    /// Apply to a present cell, returning the formatted value.
    pub fn apply(&self, cell: &CellValue) -> Result<CellValue, CellError> {
        match self {
            FormatDirective::Round { decimals } => {
                let n = number(cell)?;
                Ok(CellValue::Number(round_to(n, *decimals)))
            }
            FormatDirective::Fixed { decimals } => {
                let n = number(cell)?;
                Ok(CellValue::Text(format!("{:.*}", *decimals as usize, n)))
            }
            FormatDirective::ZeroPad { width } => zero_pad(cell, *width),
            FormatDirective::Uppercase => Ok(map_text(cell, |s| s.to_uppercase())),
            FormatDirective::Lowercase => Ok(map_text(cell, |s| s.to_lowercase())),
            FormatDirective::TitleCase => Ok(map_text(cell, title_case)),
            FormatDirective::Trim => Ok(map_text(cell, |s| s.trim().to_string())),
            FormatDirective::Replace {
                pattern,
                replacement,
            } => Ok(cell
                .render()
                .and_then(|text| pattern.replace_all(&text, replacement))
                .map(CellValue::Text)
                .unwrap_or_else(|| cell.clone())),
        }
    }
}

fn number(cell: &CellValue) -> Result<f64, CellError> {
    cell.as_number().ok_or_else(|| CellError::NotNumeric {
        value: cell.to_string(),
    })
}

fn zero_pad(cell: &CellValue, width: usize) -> Result<CellValue, CellError> {
    if let CellValue::Text(s) = cell {
        let trimmed = s.trim();
        if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(CellValue::Text(format!("{:0>width$}", trimmed, width = width)));
        }
    }
    let n = number(cell)?;
    Ok(CellValue::Text(format!("{:0width$}", n.trunc() as i64, width = width)))
}

/// Casing and trimming only touch text cells.
fn map_text(cell: &CellValue, f: impl Fn(&str) -> String) -> CellValue {
    match cell {
        CellValue::Text(s) => CellValue::Text(f(s)),
        other => other.clone(),
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for ch in s.chars() {
        if ch.is_whitespace() {
            at_word_start = true;
            out.push(ch);
        } else if at_word_start {
            out.extend(ch.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_printf() {
        assert_eq!(
            FormatDirective::from_printf("%.2f"),
            Some(FormatDirective::Round { decimals: 2 })
        );
        assert_eq!(
            FormatDirective::from_printf("%05d"),
            Some(FormatDirective::ZeroPad { width: 5 })
        );
        assert_eq!(
            FormatDirective::from_printf("%d"),
            Some(FormatDirective::Round { decimals: 0 })
        );
        assert_eq!(FormatDirective::from_printf("%s"), None);
        assert_eq!(FormatDirective::from_printf("Unknown"), None);
    }

    #[test]
    fn test_shape_limits() {
        assert_eq!(FormatDirective::Round { decimals: 15 }.shape_error(), None);
        assert_eq!(FormatDirective::ZeroPad { width: 1024 }.shape_error(), None);
        assert!(FormatDirective::Round { decimals: 400 }.shape_error().is_some());
        assert!(FormatDirective::Fixed { decimals: 16 }.shape_error().is_some());
        assert!(FormatDirective::ZeroPad { width: usize::MAX }.shape_error().is_some());
    }

    #[test]
    fn test_round_keeps_huge_values_finite() {
        let d = FormatDirective::Round { decimals: 15 };
        assert_eq!(d.apply(&CellValue::from(1e300)), Ok(CellValue::Number(1e300)));
    }

    #[test]
    fn test_round() {
        let d = FormatDirective::Round { decimals: 2 };
        assert_eq!(d.apply(&CellValue::from(15.753)), Ok(CellValue::Number(15.75)));
        assert_eq!(d.apply(&CellValue::from("2.499")), Ok(CellValue::Number(2.5)));
        assert!(d.apply(&CellValue::from("n/a")).is_err());
    }

    #[test]
    fn test_fixed_and_zero_pad() {
        let fixed = FormatDirective::Fixed { decimals: 2 };
        assert_eq!(fixed.apply(&CellValue::from(3.1)), Ok(CellValue::from("3.10")));

        let pad = FormatDirective::ZeroPad { width: 5 };
        assert_eq!(pad.apply(&CellValue::from(42.0)), Ok(CellValue::from("00042")));
        assert_eq!(pad.apply(&CellValue::from("0042")), Ok(CellValue::from("00042")));
        assert_eq!(pad.apply(&CellValue::from(-42.0)), Ok(CellValue::from("-0042")));
        assert!(pad.apply(&CellValue::from("A1")).is_err());
    }

    #[test]
    fn test_casing() {
        assert_eq!(
            FormatDirective::TitleCase.apply(&CellValue::from("credit CARD")),
            Ok(CellValue::from("Credit Card"))
        );
        assert_eq!(
            FormatDirective::Uppercase.apply(&CellValue::from(3.0)),
            Ok(CellValue::from(3.0))
        );
        assert_eq!(
            FormatDirective::Trim.apply(&CellValue::from("  x ")),
            Ok(CellValue::from("x"))
        );
    }

    #[test]
    fn test_replace() {
        let d = FormatDirective::Replace {
            pattern: Pattern::new(r"^(\d+)\.(\d{2})\d+$").unwrap(),
            replacement: "${1}.${2}".to_string(),
        };
        assert_eq!(d.apply(&CellValue::from(15.753)), Ok(CellValue::from("15.75")));
        assert_eq!(d.apply(&CellValue::from("abc")), Ok(CellValue::from("abc")));
    }
}
