//! Industry-level summaries of simulated cohort rows
//!
//! Salary and gratuity are monthly per employee on cohort rows; totals are
//! annualised (x12) and averages are weighted by survivors. Fund gaps compare
//! the annualised gratuity accrual with the closing fund balances.

use crate::projection::CohortYearRow;
use crate::table::normalize_key;
use crate::workforce::Tenure;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Months per year used to annualise monthly figures
pub const MONTHS_PER_YEAR: f64 = 12.0;

/// One (industry, year) summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryYearRow {
    pub industry: String,
    pub year: i32,
    pub total_employees: f64,
    pub exit_employee_total: f64,
    pub weighted_monthly_salary: f64,
    pub annual_total_salary: f64,
    pub weighted_monthly_gratuity_per_employee: f64,
    pub annual_total_gratuity_accrual: f64,
    pub annual_fund_contribution: f64,
    pub closing_fund_no_return: f64,
    pub closing_fund_with_return: f64,
    pub fund_gap_no_return: f64,
    pub fund_gap_with_return: f64,
}

/// One (industry, year, tenure) summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryYearTenureRow {
    pub industry: String,
    pub year: i32,
    pub tenure: Tenure,
    pub total_employees: f64,
    pub exit_employee_total: f64,
    pub weighted_monthly_salary: f64,
    pub annual_total_salary: f64,
    pub weighted_monthly_gratuity_per_employee: f64,
    pub annual_total_gratuity_accrual: f64,
    pub annual_fund_contribution: f64,
    pub closing_fund_no_return: f64,
    pub closing_fund_with_return: f64,
    pub fund_gap_no_return: f64,
    pub fund_gap_with_return: f64,
}

#[derive(Debug, Default)]
struct Accumulator {
    industry: String,
    employees: f64,
    exits: f64,
    salary_x_employees: f64,
    gratuity_x_employees: f64,
    contribution: f64,
    closing_no_return: f64,
    closing_with_return: f64,
}

impl Accumulator {
    fn add(&mut self, row: &CohortYearRow) {
        if self.industry.is_empty() {
            self.industry = row.industry.trim().to_string();
        }
        self.employees += row.survived_employee;
        self.exits += row.exit_employee;
        self.salary_x_employees += row.salary * row.survived_employee;
        self.gratuity_x_employees += row.total_gratuity_accrual();
        self.contribution += row.fund_contribution;
        self.closing_no_return += row.no_return_closing;
        self.closing_with_return += row.with_return_closing;
    }

    fn weighted(&self, total: f64) -> f64 {
        if self.employees > 0.0 {
            total / self.employees
        } else {
            0.0
        }
    }

    fn annual_gratuity(&self) -> f64 {
        self.gratuity_x_employees * MONTHS_PER_YEAR
    }

    fn finish(self, year: i32) -> IndustryYearRow {
        let accrual = self.annual_gratuity();
        IndustryYearRow {
            year,
            total_employees: self.employees,
            exit_employee_total: self.exits,
            weighted_monthly_salary: self.weighted(self.salary_x_employees),
            annual_total_salary: self.salary_x_employees * MONTHS_PER_YEAR,
            weighted_monthly_gratuity_per_employee: self.weighted(self.gratuity_x_employees),
            annual_total_gratuity_accrual: accrual,
            annual_fund_contribution: self.contribution,
            closing_fund_no_return: self.closing_no_return,
            closing_fund_with_return: self.closing_with_return,
            fund_gap_no_return: accrual - self.closing_no_return,
            fund_gap_with_return: accrual - self.closing_with_return,
            industry: self.industry,
        }
    }
}

/// Sum cohort rows by (industry, year), ordered by industry then year
pub fn aggregate_industry_year(rows: &[CohortYearRow]) -> Vec<IndustryYearRow> {
    let mut groups: BTreeMap<(String, i32), Accumulator> = BTreeMap::new();
    for row in rows {
        groups
            .entry((normalize_key(&row.industry), row.year))
            .or_default()
            .add(row);
    }

    let out: Vec<IndustryYearRow> = groups
        .into_iter()
        .map(|((_, year), acc)| acc.finish(year))
        .collect();
    log::info!("aggregated {} cohort rows into {} industry-year rows", rows.len(), out.len());
    out
}

/// Sum cohort rows by (industry, year, tenure)
pub fn aggregate_industry_year_tenure(rows: &[CohortYearRow]) -> Vec<IndustryYearTenureRow> {
    let mut groups: BTreeMap<(String, i32, Tenure), Accumulator> = BTreeMap::new();
    for row in rows {
        groups
            .entry((normalize_key(&row.industry), row.year, row.tenure))
            .or_default()
            .add(row);
    }

    groups
        .into_iter()
        .map(|((_, year, tenure), acc)| {
            let r = acc.finish(year);
            IndustryYearTenureRow {
                industry: r.industry,
                year: r.year,
                tenure,
                total_employees: r.total_employees,
                exit_employee_total: r.exit_employee_total,
                weighted_monthly_salary: r.weighted_monthly_salary,
                annual_total_salary: r.annual_total_salary,
                weighted_monthly_gratuity_per_employee: r.weighted_monthly_gratuity_per_employee,
                annual_total_gratuity_accrual: r.annual_total_gratuity_accrual,
                annual_fund_contribution: r.annual_fund_contribution,
                closing_fund_no_return: r.closing_fund_no_return,
                closing_fund_with_return: r.closing_fund_with_return,
                fund_gap_no_return: r.fund_gap_no_return,
                fund_gap_with_return: r.fund_gap_with_return,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::CohortId;
    use approx::assert_relative_eq;

    fn row(industry: &str, year: i32, tenure: u32, survived: f64, salary: f64) -> CohortYearRow {
        CohortYearRow {
            industry: industry.to_string(),
            age_bracket: "30-40".to_string(),
            cohort: CohortId::new(2025, tenure),
            year,
            tenure: Tenure::whole(tenure),
            salary,
            forecast_employee: 0.0,
            exit_rate: 0.0,
            replacement_rate: 0.0,
            inflow_employee: 0.0,
            survived_employee: survived,
            exit_employee: 2.0,
            replacement_employee: 0.0,
            gratuity_rate: 0.1,
            gratuity_per_employee: salary * 0.1,
            fund_contribution: 100.0,
            exit_ratio: 0.0,
            no_return_opening: 0.0,
            no_return_earned: 0.0,
            no_return_payout: 0.0,
            no_return_closing: 1000.0,
            with_return_opening: 0.0,
            with_return_earned: 0.0,
            with_return_payout: 0.0,
            with_return_closing: 1100.0,
        }
    }

    #[test]
    fn test_industry_year_weighted_and_annualised() {
        let rows = vec![
            row("Construction", 2026, 1, 10.0, 5000.0),
            row("construction ", 2026, 2, 30.0, 9000.0),
            row("Construction", 2027, 1, 5.0, 5000.0),
        ];
        let out = aggregate_industry_year(&rows);

        assert_eq!(out.len(), 2);
        let first = &out[0];
        assert_eq!(first.industry, "Construction");
        assert_eq!(first.year, 2026);
        assert_eq!(first.total_employees, 40.0);
        assert_eq!(first.exit_employee_total, 4.0);
        assert_relative_eq!(first.weighted_monthly_salary, (10.0 * 5000.0 + 30.0 * 9000.0) / 40.0);
        assert_relative_eq!(first.annual_total_salary, (10.0 * 5000.0 + 30.0 * 9000.0) * 12.0);
        assert_relative_eq!(first.annual_total_gratuity_accrual, (10.0 * 500.0 + 30.0 * 900.0) * 12.0, epsilon = 1e-6);
        assert_eq!(first.annual_fund_contribution, 200.0);
        assert_eq!(first.closing_fund_with_return, 2200.0);
        assert_relative_eq!(
            first.fund_gap_no_return,
            first.annual_total_gratuity_accrual - 2000.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_zero_employees_gives_zero_average() {
        let out = aggregate_industry_year(&[row("Retail", 2026, 3, 0.0, 5000.0)]);
        assert_eq!(out[0].weighted_monthly_salary, 0.0);
        assert_eq!(out[0].weighted_monthly_gratuity_per_employee, 0.0);
    }

    #[test]
    fn test_tenure_split() {
        let rows = vec![
            row("Construction", 2026, 1, 10.0, 5000.0),
            row("Construction", 2026, 2, 30.0, 9000.0),
        ];
        let out = aggregate_industry_year_tenure(&rows);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].tenure, Tenure::whole(1));
        assert_eq!(out[1].total_employees, 30.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate_industry_year(&[]).is_empty());
        assert!(aggregate_industry_year_tenure(&[]).is_empty());
    }
}
