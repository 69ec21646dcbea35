//! Enumeration of every (cohort, year, tenure) a cohort occupies
//!
//! Two cohort families share the same recursion:
//! - rolling entrants `{entry_year}_0`, one per projection year, tenure = year - entry_year
//! - the pre-existing stock `{start_year}_{k}` for k in 1..=max_initial_tenure,
//!   tenure = k + (year - start_year)

use crate::error::ConfigError;
use crate::workforce::{BaseWorkforceRow, Tenure};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cohort identity within one (industry, age bracket): entry year and tenure at entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct CohortId {
    pub entry_year: i32,
    pub entry_tenure: u32,
}

impl CohortId {
    pub fn new(entry_year: i32, entry_tenure: u32) -> Self {
        Self { entry_year, entry_tenure }
    }

    /// Employees already in service when the horizon opens
    pub fn is_existing_stock(&self, start_year: i32) -> bool {
        self.entry_year == start_year && self.entry_tenure > 0
    }

    /// Tenure in a given year
    pub fn tenure_in(&self, year: i32) -> Tenure {
        let elapsed = (year - self.entry_year).max(0) as u32;
        Tenure::whole(self.entry_tenure + elapsed)
    }
}

impl fmt::Display for CohortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.entry_year, self.entry_tenure)
    }
}

impl From<CohortId> for String {
    fn from(id: CohortId) -> Self {
        id.to_string()
    }
}

impl FromStr for CohortId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, tenure) = s
            .split_once('_')
            .ok_or_else(|| format!("invalid cohort id '{}'", s))?;
        Ok(Self {
            entry_year: year.parse().map_err(|_| format!("invalid cohort year in '{}'", s))?,
            entry_tenure: tenure.parse().map_err(|_| format!("invalid cohort tenure in '{}'", s))?,
        })
    }
}

impl TryFrom<String> for CohortId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// One (industry, age bracket, cohort, year) slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortTemplateRow {
    pub industry: String,
    pub age_bracket: String,
    pub cohort: CohortId,
    pub year: i32,
    pub tenure: Tenure,
}

/// All cohort slots for a projection horizon
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CohortTemplate {
    pub start_year: i32,
    pub end_year: i32,
    pub rows: Vec<CohortTemplateRow>,
}

impl CohortTemplate {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Highest whole tenure present in the base workforce
pub fn max_initial_tenure(base: &[BaseWorkforceRow]) -> u32 {
    base.iter().map(|r| r.tenure.whole_years()).max().unwrap_or(0)
}

/// Build the cohort template for every (industry, age bracket) pair.
///
/// Per group the existing-stock cohorts come first (by starting tenure), then
/// the rolling entrant cohorts (by entry year); rows within a cohort are in
/// year order.
pub fn generate_template(
    industries: &[String],
    age_brackets: &[String],
    start_year: i32,
    end_year: i32,
    max_initial_tenure: u32,
) -> Result<CohortTemplate, ConfigError> {
    if start_year > end_year {
        return Err(ConfigError::InvalidHorizon { start_year, end_year });
    }

    let years = (end_year - start_year + 1) as usize;
    let per_group = max_initial_tenure as usize * years + years * (years + 1) / 2;
    let mut rows = Vec::with_capacity(industries.len() * age_brackets.len() * per_group);

    for industry in industries {
        for age_bracket in age_brackets {
            let mut push = |cohort: CohortId, year: i32| {
                rows.push(CohortTemplateRow {
                    industry: industry.clone(),
                    age_bracket: age_bracket.clone(),
                    cohort,
                    year,
                    tenure: cohort.tenure_in(year),
                });
            };

            for initial_tenure in 1..=max_initial_tenure {
                let cohort = CohortId::new(start_year, initial_tenure);
                for year in start_year..=end_year {
                    push(cohort, year);
                }
            }

            for entry_year in start_year..=end_year {
                let cohort = CohortId::new(entry_year, 0);
                for year in entry_year..=end_year {
                    push(cohort, year);
                }
            }
        }
    }

    log::info!(
        "cohort template: {} rows for {} industries x {} age brackets",
        rows.len(),
        industries.len(),
        age_brackets.len()
    );

    Ok(CohortTemplate { start_year, end_year, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_row_count() {
        let template =
            generate_template(&names(&["A", "B"]), &names(&["30-40"]), 2025, 2028, 3).unwrap();

        // 4 years: entrants 4+3+2+1 = 10, existing stock 3 x 4 = 12
        assert_eq!(template.len(), 2 * (10 + 12));
    }

    #[test]
    fn test_entrant_cohort_tenure() {
        let template = generate_template(&names(&["A"]), &names(&["30-40"]), 2025, 2030, 0).unwrap();
        let cohort = CohortId::new(2027, 0);
        let rows: Vec<_> = template.rows.iter().filter(|r| r.cohort == cohort).collect();

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].year, 2027);
        assert_eq!(rows[0].tenure, Tenure::ZERO);
        assert_eq!(rows[3].year, 2030);
        assert_eq!(rows[3].tenure, Tenure::whole(3));
    }

    #[test]
    fn test_existing_stock_cohort_tenure() {
        let template = generate_template(&names(&["A"]), &names(&["30-40"]), 2025, 2040, 12).unwrap();
        let cohort = CohortId::new(2025, 12);
        let rows: Vec<_> = template.rows.iter().filter(|r| r.cohort == cohort).collect();

        assert_eq!(rows.len(), 16);
        assert_eq!(rows[0].tenure, Tenure::whole(12));
        assert_eq!(rows[15].tenure, Tenure::whole(27));
        assert!(cohort.is_existing_stock(2025));
        assert!(!CohortId::new(2025, 0).is_existing_stock(2025));
    }

    #[test]
    fn test_existing_stock_listed_first() {
        let template = generate_template(&names(&["A"]), &names(&["30-40"]), 2025, 2026, 2).unwrap();
        let order: Vec<String> = template.rows.iter().map(|r| r.cohort.to_string()).collect();
        assert_eq!(
            order,
            ["2025_1", "2025_1", "2025_2", "2025_2", "2025_0", "2025_0", "2026_0"]
        );
    }

    #[test]
    fn test_cohort_id_round_trip_text() {
        let id: CohortId = "2031_0".parse().unwrap();
        assert_eq!(id, CohortId::new(2031, 0));
        assert!("2031".parse::<CohortId>().is_err());
    }

    #[test]
    fn test_max_initial_tenure_truncates() {
        let row = |t: f64| BaseWorkforceRow {
            industry: "A".into(),
            age_bracket: "30-40".into(),
            tenure: Tenure::from_years(t).unwrap(),
            employees: 1.0,
            average_base_salary: 1.0,
        };
        assert_eq!(max_initial_tenure(&[row(0.0), row(7.5), row(3.0)]), 7);
        assert_eq!(max_initial_tenure(&[]), 0);
    }
}
