//! Simulation output structures

use crate::cohort::CohortId;
use crate::workforce::Tenure;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One simulated (industry, age bracket, cohort, year)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortYearRow {
    // Identity
    pub industry: String,
    pub age_bracket: String,
    pub cohort: CohortId,
    pub year: i32,
    pub tenure: Tenure,

    // Inputs
    pub salary: f64,
    pub forecast_employee: f64,
    pub exit_rate: f64,
    pub replacement_rate: f64,

    /// Headcount entering the cohort on its first row (forecast plus pooled rehires)
    pub inflow_employee: f64,

    // Survival
    pub survived_employee: f64,
    pub exit_employee: f64,
    pub replacement_employee: f64,

    // Gratuity
    pub gratuity_rate: f64,
    pub gratuity_per_employee: f64,
    pub fund_contribution: f64,

    /// Fraction of the fund paid out to this row's leavers
    pub exit_ratio: f64,

    // No-return ledger
    pub no_return_opening: f64,
    pub no_return_earned: f64,
    pub no_return_payout: f64,
    pub no_return_closing: f64,

    // With-return ledger
    pub with_return_opening: f64,
    pub with_return_earned: f64,
    pub with_return_payout: f64,
    pub with_return_closing: f64,
}

impl CohortYearRow {
    /// Gratuity owed to the cohort's survivors at this row
    pub fn total_gratuity_accrual(&self) -> f64 {
        self.gratuity_per_employee * self.survived_employee
    }
}

/// Complete engine output, in group then phase then cohort then year order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub rows: Vec<CohortYearRow>,
}

impl SimulationResult {
    pub fn new(rows: Vec<CohortYearRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Headline totals across the horizon
    pub fn summary(&self) -> SimulationSummary {
        SimulationSummary::from_rows(&self.rows)
    }
}

/// Summary statistics for a simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub total_rows: usize,
    pub total_cohorts: usize,
    pub total_exit_employee: f64,
    pub total_replacement_employee: f64,
    pub total_fund_contribution: f64,
    pub total_no_return_payout: f64,
    pub total_with_return_payout: f64,
    pub total_return_earned: f64,
    pub final_employees: f64,
    pub final_no_return_balance: f64,
    pub final_with_return_balance: f64,
}

impl SimulationSummary {
    /// Totals over `rows`; final-year figures use the latest year present
    pub fn from_rows(rows: &[CohortYearRow]) -> Self {
        let cohorts: HashSet<(&str, &str, CohortId)> = rows
            .iter()
            .map(|r| (r.industry.as_str(), r.age_bracket.as_str(), r.cohort))
            .collect();

        let final_year = rows.iter().map(|r| r.year).max();
        let final_rows = || rows.iter().filter(move |r| Some(r.year) == final_year);

        Self {
            total_rows: rows.len(),
            total_cohorts: cohorts.len(),
            total_exit_employee: rows.iter().map(|r| r.exit_employee).sum(),
            total_replacement_employee: rows.iter().map(|r| r.replacement_employee).sum(),
            total_fund_contribution: rows.iter().map(|r| r.fund_contribution).sum(),
            total_no_return_payout: rows.iter().map(|r| r.no_return_payout).sum(),
            total_with_return_payout: rows.iter().map(|r| r.with_return_payout).sum(),
            total_return_earned: rows.iter().map(|r| r.with_return_earned).sum(),
            final_employees: final_rows().map(|r| r.survived_employee).sum(),
            final_no_return_balance: final_rows().map(|r| r.no_return_closing).sum(),
            final_with_return_balance: final_rows().map(|r| r.with_return_closing).sum(),
        }
    }
}
