//! Percentage vs fraction encoding of rate columns
//!
//! Source workbooks mix `5`, `5%` and `0.05` for the same quantity. Each rate
//! column carries a declared encoding; `Infer` applies the legacy heuristic
//! (values above 1 are percentages) and is the default for every column.

use std::collections::HashMap;

/// How a rate column's numeric cells are encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RateEncoding {
    /// Cells are already fractions (0.05 = 5%)
    Fraction,
    /// Cells are percentages (5 = 5%)
    Percent,
    /// Any value greater than 1 is treated as a percentage
    #[default]
    Infer,
}

impl RateEncoding {
    /// Convert a parsed cell value to a fraction
    pub fn normalize(self, value: f64) -> f64 {
        match self {
            RateEncoding::Fraction => value,
            RateEncoding::Percent => value / 100.0,
            RateEncoding::Infer => {
                if value > 1.0 {
                    value / 100.0
                } else {
                    value
                }
            }
        }
    }
}

/// Per-column encoding declarations
#[derive(Debug, Clone, Default)]
pub struct RateEncodings {
    columns: HashMap<String, RateEncoding>,
    default: RateEncoding,
}

impl RateEncodings {
    /// Every column uses the inference heuristic
    pub fn inferred() -> Self {
        Self::default()
    }

    /// Pin the encoding of one column
    pub fn with(mut self, column: &str, encoding: RateEncoding) -> Self {
        self.columns.insert(column.trim().to_string(), encoding);
        self
    }

    /// Encoding for columns without an explicit declaration
    pub fn with_default(mut self, encoding: RateEncoding) -> Self {
        self.default = encoding;
        self
    }

    pub fn get(&self, column: &str) -> RateEncoding {
        self.columns.get(column).copied().unwrap_or(self.default)
    }
}

/// Parse a rate cell into a fraction.
///
/// A trailing `%` always marks a percentage regardless of the declared
/// encoding. Returns `None` for empty or non-numeric cells.
pub fn parse_rate(raw: &str, encoding: RateEncoding) -> Option<f64> {
    let trimmed = raw.trim();
    let (digits, explicit_percent) = match trimmed.strip_suffix('%') {
        Some(rest) => (rest.trim(), true),
        None => (trimmed, false),
    };

    let value: f64 = digits.parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    if explicit_percent {
        Some(value / 100.0)
    } else {
        Some(encoding.normalize(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_divides_values_above_one() {
        assert_eq!(parse_rate("5", RateEncoding::Infer), Some(0.05));
        assert_eq!(parse_rate("0.05", RateEncoding::Infer), Some(0.05));
        assert_eq!(parse_rate("1", RateEncoding::Infer), Some(1.0));
    }

    #[test]
    fn test_percent_suffix_is_explicit() {
        assert_eq!(parse_rate("0.5%", RateEncoding::Infer), Some(0.005));
        assert_eq!(parse_rate(" 12 % ", RateEncoding::Fraction), Some(0.12));
    }

    #[test]
    fn test_declared_encodings() {
        assert_eq!(parse_rate("0.5", RateEncoding::Percent), Some(0.005));
        assert_eq!(parse_rate("1.5", RateEncoding::Fraction), Some(1.5));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_rate("", RateEncoding::Infer), None);
        assert_eq!(parse_rate("n/a", RateEncoding::Infer), None);
        assert_eq!(parse_rate("NaN", RateEncoding::Infer), None);
    }

    #[test]
    fn test_column_lookup_falls_back_to_default() {
        let encodings = RateEncodings::inferred().with("Emp Growth %", RateEncoding::Fraction);
        assert_eq!(encodings.get("Emp Growth %"), RateEncoding::Fraction);
        assert_eq!(encodings.get("Attrition %"), RateEncoding::Infer);
    }
}
