//! Base-year workforce records

use crate::error::DataError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Years of service at half-year resolution.
///
/// Stored as a count of half years so it can key joins exactly; `0.5` is the
/// mid-year entrant convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Tenure(u32);

impl Tenure {
    pub const ZERO: Tenure = Tenure(0);

    /// Whole years of service
    pub const fn whole(years: u32) -> Self {
        Tenure(years * 2)
    }

    /// Parse a tenure given in years; must be a non-negative multiple of 0.5
    pub fn from_years(years: f64) -> Result<Self, DataError> {
        let halves = years * 2.0;
        if !years.is_finite() || years < 0.0 || (halves - halves.round()).abs() > 1e-9 {
            return Err(DataError::InvalidTenure { value: years });
        }
        Ok(Tenure(halves.round() as u32))
    }

    pub fn years(self) -> f64 {
        self.0 as f64 / 2.0
    }

    /// Whole years, rounded down
    pub fn whole_years(self) -> u32 {
        self.0 / 2
    }

    /// Tenure after `years` further years of service
    pub fn advance(self, years: u32) -> Self {
        Tenure(self.0 + years * 2)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Fresh entrant tenure (0 or 0.5)
    pub fn is_entry(self) -> bool {
        self.0 <= 1
    }
}

impl TryFrom<f64> for Tenure {
    type Error = DataError;

    fn try_from(years: f64) -> Result<Self, Self::Error> {
        Tenure::from_years(years)
    }
}

impl From<Tenure> for f64 {
    fn from(tenure: Tenure) -> Self {
        tenure.years()
    }
}

impl fmt::Display for Tenure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 2 == 0 {
            write!(f, "{}", self.0 / 2)
        } else {
            write!(f, "{}.5", self.0 / 2)
        }
    }
}

/// Headcount and salary for one (industry, age bracket, tenure) in the base year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseWorkforceRow {
    pub industry: String,
    pub age_bracket: String,
    pub tenure: Tenure,

    /// Employees in the base year
    pub employees: f64,

    /// Average monthly basic salary
    pub average_base_salary: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenure_half_years() {
        let t = Tenure::from_years(0.5).unwrap();
        assert!(t.is_entry());
        assert!(!t.is_zero());
        assert_eq!(t.to_string(), "0.5");
        assert_eq!(t.advance(2).years(), 2.5);
        assert_eq!(Tenure::whole(7).to_string(), "7");
        assert_eq!(Tenure::from_years(3.5).unwrap().whole_years(), 3);
    }

    #[test]
    fn test_tenure_rejects_invalid() {
        assert!(Tenure::from_years(-1.0).is_err());
        assert!(Tenure::from_years(1.25).is_err());
        assert!(Tenure::from_years(f64::NAN).is_err());
    }

    #[test]
    fn test_tenure_ordering() {
        assert!(Tenure::ZERO < Tenure::from_years(0.5).unwrap());
        assert!(Tenure::whole(1) > Tenure::from_years(0.5).unwrap());
        assert!(!Tenure::whole(1).is_entry());
    }
}
