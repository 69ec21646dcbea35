//! EOSG Projection - cohort survival and end-of-service gratuity fund engine
//!
//! This library provides:
//! - Rate assumption tables built from industry reference data
//! - Workforce headcount and salary forecasts by tenure
//! - Cohort survival simulation with dual (no-return / with-return) fund ledgers
//! - Industry-year aggregation and sector-multiplier economic impact
//! - A scenario runner with memoization for repeated parameter sets

pub mod error;
pub mod table;
pub mod assumptions;
pub mod workforce;
pub mod cohort;
pub mod projection;
pub mod aggregate;
pub mod impact;
pub mod scenario;
pub mod benefit;
pub mod output;

// Re-export commonly used types
pub use error::{ConfigError, DataError, EosgError, Result};
pub use assumptions::{build_assumptions, apply_override, AssumptionTable, AssumptionRow};
pub use projection::{SurvivalEngine, EngineConfig, CohortYearRow, SimulationResult};
pub use scenario::{ScenarioRunner, ScenarioParams, ScenarioOutput, ScenarioCache};
