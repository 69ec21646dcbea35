//! Cohort survival and end-of-service fund projection

mod engine;
mod gratuity;
mod ledger;
mod rows;
mod state;

pub use engine::{
    is_full_replacement, round_half_even, EngineConfig, ExitRatioBasis, SurvivalEngine,
    FULL_REPLACEMENT_BRACKETS,
};
pub use gratuity::{annual_accrual_rate, gratuity_rate, CAP_YEARS, EARLY_ACCRUAL, LATE_ACCRUAL};
pub use ledger::{FundLedger, LedgerStep};
pub use rows::{CohortYearRow, SimulationResult, SimulationSummary};
pub use state::CohortState;
