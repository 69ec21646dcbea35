//! Join of the cohort template with the forecasts and the assumption table
//!
//! Produces the engine's input rows. Groups with no base workforce at all are
//! skipped; a group that has workforce but no assumption row is an error.

use super::{CohortId, CohortTemplate};
use crate::assumptions::AssumptionTable;
use crate::error::DataError;
use crate::workforce::{EmployeeForecast, SalaryForecast, Tenure};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Engine input for one (industry, age bracket, cohort, year)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortYearInput {
    pub industry: String,
    pub age_bracket: String,
    pub cohort: CohortId,
    pub year: i32,
    pub tenure: Tenure,

    /// Monthly base salary
    pub salary: f64,

    /// Exogenous headcount entering this cell
    pub forecast_employee: f64,

    pub exit_rate: f64,
    pub replacement_rate: f64,
}

/// Attach salary, forecast headcount and rates to every template row
pub fn attach(
    template: &CohortTemplate,
    employees: &EmployeeForecast,
    salaries: &SalaryForecast,
    assumptions: &AssumptionTable,
) -> Result<Vec<CohortYearInput>, DataError> {
    let mut inputs = Vec::with_capacity(template.len());
    let mut skipped: HashSet<(String, String)> = HashSet::new();
    let mut fell_back: HashSet<(String, String)> = HashSet::new();

    for row in &template.rows {
        if !salaries.has_group(&row.industry, &row.age_bracket) {
            if skipped.insert((row.industry.clone(), row.age_bracket.clone())) {
                log::debug!(
                    "no base workforce for {} / {}, group skipped",
                    row.industry,
                    row.age_bracket
                );
            }
            continue;
        }

        let assumption = assumptions
            .get(&row.industry, &row.age_bracket)
            .ok_or_else(|| DataError::MissingAssumption {
                industry: row.industry.clone(),
                age_bracket: row.age_bracket.clone(),
            })?;

        let (salary, used) = salaries
            .salary_nearest(&row.industry, &row.age_bracket, row.tenure, row.year)
            .ok_or_else(|| DataError::MissingSalary {
                industry: row.industry.clone(),
                age_bracket: row.age_bracket.clone(),
                year: row.year,
            })?;

        if used != row.tenure && fell_back.insert((row.industry.clone(), row.age_bracket.clone())) {
            log::warn!(
                "{} / {}: no salary at tenure {}, using tenure {}",
                row.industry,
                row.age_bracket,
                row.tenure,
                used
            );
        }

        inputs.push(CohortYearInput {
            industry: row.industry.clone(),
            age_bracket: row.age_bracket.clone(),
            cohort: row.cohort,
            year: row.year,
            tenure: row.tenure,
            salary,
            forecast_employee: employees.new_employees(
                &row.industry,
                &row.age_bracket,
                row.tenure,
                row.year,
            ),
            exit_rate: assumption.total_exit_rate,
            replacement_rate: assumption.replacement_hiring_rate,
        });
    }

    log::info!(
        "attached {} cohort-year rows ({} groups without workforce)",
        inputs.len(),
        skipped.len()
    );

    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::AssumptionRow;
    use crate::cohort::generate_template;
    use crate::workforce::{forecast, BaseWorkforceRow};

    fn base() -> Vec<BaseWorkforceRow> {
        let row = |tenure: u32, employees: f64, salary: f64| BaseWorkforceRow {
            industry: "Construction".into(),
            age_bracket: "30-40".into(),
            tenure: Tenure::whole(tenure),
            employees,
            average_base_salary: salary,
        };
        vec![row(0, 1000.0, 8000.0), row(2, 500.0, 9000.0)]
    }

    fn assumptions() -> AssumptionTable {
        AssumptionTable::from_rows(vec![
            AssumptionRow::new("Construction", "30-40", 0.10, 0.5, 0.05, 0.0, 0.0, 0.0),
            AssumptionRow::new("Retail", "30-40", 0.10, 0.5, 0.05, 0.0, 0.0, 0.0),
        ])
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_attach_joins_all_sources() {
        let table = assumptions();
        let (employees, salaries) = forecast(&base(), &table, 2025, 2027).unwrap();
        let template =
            generate_template(&names(&["Construction", "Retail"]), &names(&["30-40"]), 2025, 2027, 2)
                .unwrap();

        let inputs = attach(&template, &employees, &salaries, &table).unwrap();

        // Retail has no workforce; Construction keeps all of its rows
        assert!(inputs.iter().all(|r| r.industry == "Construction"));
        assert_eq!(inputs.len(), template.len() / 2);

        let stock = inputs
            .iter()
            .find(|r| r.cohort == CohortId::new(2025, 2) && r.year == 2025)
            .unwrap();
        assert_eq!(stock.forecast_employee, 500.0);
        assert_eq!(stock.salary, 9000.0);
        assert_eq!(stock.exit_rate, 0.05);
        assert_eq!(stock.replacement_rate, 0.5);

        let entrants = inputs
            .iter()
            .find(|r| r.cohort == CohortId::new(2026, 0) && r.year == 2026)
            .unwrap();
        assert!((entrants.forecast_employee - 100.0).abs() < 1e-9);

        // Tenure 1 is absent in the base table: salary comes from tenure 0
        let aged = inputs
            .iter()
            .find(|r| r.cohort == CohortId::new(2025, 1) && r.year == 2025)
            .unwrap();
        assert_eq!(aged.salary, 8000.0);
        assert_eq!(aged.forecast_employee, 0.0);
    }

    #[test]
    fn test_missing_assumption_is_error() {
        let (employees, salaries) = forecast(&base(), &assumptions(), 2025, 2026).unwrap();
        let template =
            generate_template(&names(&["Construction"]), &names(&["30-40"]), 2025, 2026, 0).unwrap();

        let err = attach(&template, &employees, &salaries, &AssumptionTable::default()).unwrap_err();
        assert!(matches!(err, DataError::MissingAssumption { .. }));
    }

    #[test]
    fn test_year_beyond_forecast_is_missing_salary() {
        let table = assumptions();
        let (employees, salaries) = forecast(&base(), &table, 2025, 2026).unwrap();
        let template =
            generate_template(&names(&["Construction"]), &names(&["30-40"]), 2025, 2028, 0).unwrap();

        let err = attach(&template, &employees, &salaries, &table).unwrap_err();
        assert!(matches!(err, DataError::MissingSalary { year: 2027, .. }));
    }
}
