//! Headcount and salary forecasts by (industry, age bracket, tenure, year)
//!
//! Tenure-0 headcount grows geometrically at the expansion hiring rate; the
//! cumulative curve is differenced so each later year carries only that
//! year's fresh hires. Other tenures carry their base-year stock only, as
//! their evolution is left to the survival engine. Salary compounds at the
//! bracket's salary growth rate independent of headcount.

use super::{BaseWorkforceRow, Tenure};
use crate::assumptions::AssumptionTable;
use crate::error::{ConfigError, Result};
use crate::table::normalize_key;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Forecast headcount for one (industry, age bracket, tenure, year)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeForecastRow {
    pub industry: String,
    pub age_bracket: String,
    pub tenure: Tenure,
    pub year: i32,

    /// Cumulative expansion curve (tenure 0 only after the base year)
    pub cumulative_employees: f64,

    /// Employees entering this (tenure, year); base stock in the base year
    pub employees: f64,
}

/// Forecast monthly salary for one (industry, age bracket, tenure, year)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryForecastRow {
    pub industry: String,
    pub age_bracket: String,
    pub tenure: Tenure,
    pub year: i32,
    pub salary: f64,
}

type Key = (String, String, Tenure, i32);

fn key(industry: &str, age_bracket: &str, tenure: Tenure, year: i32) -> Key {
    (normalize_key(industry), normalize_key(age_bracket), tenure, year)
}

/// Long-format headcount forecast
#[derive(Debug, Clone, Default)]
pub struct EmployeeForecast {
    rows: Vec<EmployeeForecastRow>,
    index: HashMap<Key, usize>,
}

impl EmployeeForecast {
    fn from_rows(rows: Vec<EmployeeForecastRow>) -> Self {
        let index = rows
            .iter()
            .enumerate()
            .map(|(i, r)| (key(&r.industry, &r.age_bracket, r.tenure, r.year), i))
            .collect();
        Self { rows, index }
    }

    pub fn rows(&self) -> &[EmployeeForecastRow] {
        &self.rows
    }

    /// Employees entering the given cell; zero when absent or non-positive
    pub fn new_employees(&self, industry: &str, age_bracket: &str, tenure: Tenure, year: i32) -> f64 {
        self.index
            .get(&key(industry, age_bracket, tenure, year))
            .map(|&i| self.rows[i].employees)
            .filter(|&e| e > 0.0)
            .unwrap_or(0.0)
    }
}

/// Long-format salary forecast
#[derive(Debug, Clone, Default)]
pub struct SalaryForecast {
    rows: Vec<SalaryForecastRow>,
    index: HashMap<Key, usize>,
    /// Tenures present per normalized (industry, age bracket), ascending
    tenures: HashMap<(String, String), Vec<Tenure>>,
}

impl SalaryForecast {
    fn from_rows(rows: Vec<SalaryForecastRow>) -> Self {
        let mut index = HashMap::with_capacity(rows.len());
        let mut tenures: HashMap<(String, String), Vec<Tenure>> = HashMap::new();
        for (i, r) in rows.iter().enumerate() {
            index.insert(key(&r.industry, &r.age_bracket, r.tenure, r.year), i);
            let group = tenures
                .entry((normalize_key(&r.industry), normalize_key(&r.age_bracket)))
                .or_default();
            if !group.contains(&r.tenure) {
                group.push(r.tenure);
            }
        }
        for group in tenures.values_mut() {
            group.sort();
        }
        Self { rows, index, tenures }
    }

    pub fn rows(&self) -> &[SalaryForecastRow] {
        &self.rows
    }

    /// Exact salary lookup
    pub fn salary(&self, industry: &str, age_bracket: &str, tenure: Tenure, year: i32) -> Option<f64> {
        self.index
            .get(&key(industry, age_bracket, tenure, year))
            .map(|&i| self.rows[i].salary)
    }

    /// Whether any salary rows exist for the group
    pub fn has_group(&self, industry: &str, age_bracket: &str) -> bool {
        self.tenures
            .contains_key(&(normalize_key(industry), normalize_key(age_bracket)))
    }

    /// Salary for the tenure, falling back to the highest lower tenure of
    /// the same group when the base table stops short of it, and to the
    /// lowest tenure when nothing lower exists. Returns the tenure used.
    pub fn salary_nearest(
        &self,
        industry: &str,
        age_bracket: &str,
        tenure: Tenure,
        year: i32,
    ) -> Option<(f64, Tenure)> {
        if let Some(salary) = self.salary(industry, age_bracket, tenure, year) {
            return Some((salary, tenure));
        }
        let group = self
            .tenures
            .get(&(normalize_key(industry), normalize_key(age_bracket)))?;
        let fallback = group
            .iter()
            .rev()
            .find(|&&t| t < tenure)
            .or_else(|| group.first())?;
        self.salary(industry, age_bracket, *fallback, year)
            .map(|s| (s, *fallback))
    }
}

/// Project headcount and salary from `start_year` to `end_year` inclusive.
///
/// Base rows sharing (industry, age bracket, tenure) are summed for headcount;
/// the first row's salary is used. Groups without assumptions grow at zero.
pub fn forecast(
    base_employees: &[BaseWorkforceRow],
    assumptions: &AssumptionTable,
    start_year: i32,
    end_year: i32,
) -> Result<(EmployeeForecast, SalaryForecast)> {
    if start_year > end_year {
        return Err(ConfigError::InvalidHorizon { start_year, end_year }.into());
    }

    // (industry, age, tenure) -> (display industry, display age, employees, salary)
    let mut groups: BTreeMap<(String, String, Tenure), (String, String, f64, f64)> = BTreeMap::new();
    for row in base_employees {
        groups
            .entry((normalize_key(&row.industry), normalize_key(&row.age_bracket), row.tenure))
            .and_modify(|g| g.2 += row.employees)
            .or_insert_with(|| {
                (
                    row.industry.trim().to_string(),
                    row.age_bracket.trim().to_string(),
                    row.employees,
                    row.average_base_salary,
                )
            });
    }

    let years = (end_year - start_year + 1) as usize;
    let mut employee_rows = Vec::with_capacity(groups.len() * years);
    let mut salary_rows = Vec::with_capacity(groups.len() * years);
    let mut missing: HashSet<(String, String)> = HashSet::new();

    for ((_, _, tenure), (industry, age_bracket, base_count, base_salary)) in &groups {
        let (expansion, salary_growth) = match assumptions.get(industry, age_bracket) {
            Some(a) => (a.expansion_hiring_rate, a.salary_growth_rate),
            None => {
                if missing.insert((industry.clone(), age_bracket.clone())) {
                    log::warn!(
                        "no assumptions for {} / {}, forecast uses zero growth",
                        industry,
                        age_bracket
                    );
                }
                (0.0, 0.0)
            }
        };

        let mut cumulative = *base_count;
        let mut salary = *base_salary;

        for year in start_year..=end_year {
            let employees = if year == start_year {
                cumulative
            } else {
                let previous = cumulative;
                cumulative = if tenure.is_zero() {
                    previous * (1.0 + expansion)
                } else {
                    0.0
                };
                salary *= 1.0 + salary_growth;

                if tenure.is_entry() {
                    cumulative - previous
                } else {
                    0.0
                }
            };

            employee_rows.push(EmployeeForecastRow {
                industry: industry.clone(),
                age_bracket: age_bracket.clone(),
                tenure: *tenure,
                year,
                cumulative_employees: cumulative,
                employees,
            });
            salary_rows.push(SalaryForecastRow {
                industry: industry.clone(),
                age_bracket: age_bracket.clone(),
                tenure: *tenure,
                year,
                salary,
            });
        }
    }

    log::info!(
        "forecast {} workforce cells over {}..={}",
        groups.len(),
        start_year,
        end_year
    );

    Ok((
        EmployeeForecast::from_rows(employee_rows),
        SalaryForecast::from_rows(salary_rows),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::AssumptionRow;
    use approx::assert_relative_eq;

    fn base() -> Vec<BaseWorkforceRow> {
        let row = |tenure: f64, employees: f64, salary: f64| BaseWorkforceRow {
            industry: "Construction".into(),
            age_bracket: "30-40".into(),
            tenure: Tenure::from_years(tenure).unwrap(),
            employees,
            average_base_salary: salary,
        };
        vec![
            row(0.0, 1000.0, 8000.0),
            row(0.5, 50.0, 8100.0),
            row(3.0, 400.0, 9500.0),
            row(3.0, 100.0, 9900.0),
        ]
    }

    fn assumptions() -> AssumptionTable {
        AssumptionTable::from_rows(vec![AssumptionRow::new(
            "Construction", "30-40", 0.10, 0.5, 0.05, 0.0, 0.0, 0.05,
        )])
    }

    #[test]
    fn test_tenure_zero_increments() {
        let (employees, _) = forecast(&base(), &assumptions(), 2025, 2028).unwrap();
        let t0 = Tenure::ZERO;

        assert_relative_eq!(employees.new_employees("construction", "30-40", t0, 2025), 1000.0);
        assert_relative_eq!(employees.new_employees("Construction", "30-40", t0, 2026), 100.0, epsilon = 1e-9);
        assert_relative_eq!(employees.new_employees("Construction", "30-40", t0, 2027), 110.0, epsilon = 1e-9);
        assert_relative_eq!(employees.new_employees("Construction", "30-40", t0, 2028), 121.0, epsilon = 1e-9);
    }

    #[test]
    fn test_existing_tenures_only_in_base_year() {
        let (employees, _) = forecast(&base(), &assumptions(), 2025, 2027).unwrap();
        let t3 = Tenure::whole(3);

        // Duplicate base rows are summed
        assert_eq!(employees.new_employees("Construction", "30-40", t3, 2025), 500.0);
        assert_eq!(employees.new_employees("Construction", "30-40", t3, 2026), 0.0);

        // Mid-year entrants never show positive fresh hires after the base year
        let half = Tenure::from_years(0.5).unwrap();
        assert_eq!(employees.new_employees("Construction", "30-40", half, 2025), 50.0);
        assert_eq!(employees.new_employees("Construction", "30-40", half, 2026), 0.0);
    }

    #[test]
    fn test_salary_compounds_and_uses_first_row() {
        let (_, salaries) = forecast(&base(), &assumptions(), 2025, 2027).unwrap();
        let t3 = Tenure::whole(3);

        assert_eq!(salaries.salary("Construction", "30-40", t3, 2025), Some(9500.0));
        assert_relative_eq!(
            salaries.salary("Construction", "30-40", t3, 2027).unwrap(),
            9500.0 * 1.05 * 1.05,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_salary_falls_back_to_nearest_tenure() {
        let (_, salaries) = forecast(&base(), &assumptions(), 2025, 2026).unwrap();

        let (salary, used) = salaries
            .salary_nearest("Construction", "30-40", Tenure::whole(9), 2026)
            .unwrap();
        assert_eq!(used, Tenure::whole(3));
        assert_relative_eq!(salary, 9500.0 * 1.05, epsilon = 1e-9);

        let (_, used) = salaries
            .salary_nearest("Construction", "30-40", Tenure::whole(2), 2026)
            .unwrap();
        assert_eq!(used, Tenure::from_years(0.5).unwrap());

        assert!(salaries.has_group("construction", "30-40"));
        assert!(!salaries.has_group("Retail", "30-40"));
        assert!(salaries.salary_nearest("Retail", "30-40", Tenure::whole(2), 2026).is_none());
        assert!(salaries.salary_nearest("Construction", "30-40", Tenure::whole(2), 2031).is_none());
    }

    #[test]
    fn test_salary_uses_lowest_tenure_when_nothing_lower() {
        let rows = vec![BaseWorkforceRow {
            industry: "Retail".into(),
            age_bracket: "30-40".into(),
            tenure: Tenure::whole(2),
            employees: 10.0,
            average_base_salary: 5000.0,
        }];
        let (_, salaries) = forecast(&rows, &AssumptionTable::default(), 2025, 2025).unwrap();
        assert_eq!(
            salaries.salary_nearest("Retail", "30-40", Tenure::ZERO, 2025),
            Some((5000.0, Tenure::whole(2)))
        );
    }

    #[test]
    fn test_invalid_horizon() {
        assert!(forecast(&base(), &assumptions(), 2030, 2025).is_err());
    }
}
