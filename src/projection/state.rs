//! Recursive state carried along one cohort's years

use super::ledger::FundLedger;

/// Survival and fund state between consecutive rows of a cohort
#[derive(Debug, Clone)]
pub struct CohortState {
    /// Survivors at the end of the previous row
    pub survived: f64,

    /// Rates of the previous row, applied to its survivors
    pub exit_rate: f64,
    pub replacement_rate: f64,

    /// Gratuity per employee recorded on the previous row
    pub prior_gratuity_per_employee: f64,

    pub no_return: FundLedger,
    pub with_return: FundLedger,
}

impl CohortState {
    /// State at cohort inception, before the first row
    pub fn new(fund_return_rate: f64) -> Self {
        Self {
            survived: 0.0,
            exit_rate: 0.0,
            replacement_rate: 0.0,
            prior_gratuity_per_employee: 0.0,
            no_return: FundLedger::no_return(),
            with_return: FundLedger::with_return(fund_return_rate),
        }
    }
}
