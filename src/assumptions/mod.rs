//! Workforce rate assumptions: hiring, exit and salary growth per
//! (industry, age bracket)

mod encoding;
mod rates;
pub mod loader;

pub use encoding::{parse_rate, RateEncoding, RateEncodings};
pub use rates::{
    apply_override, build_assumptions, build_assumptions_with, AssumptionOverride, AssumptionRow,
    AssumptionTable, OverrideTarget, REQUIRED_RATE_COLUMNS,
};
pub use rates::{
    AGE_BRACKET, AGE_BRACKET_ALIASES, ATTRITION, DEATH_RATE, EMP_GROWTH, EXPANSION_HIRING, INDUSTRY, REPLACEMENT_HIRING,
    RETIREMENT_RATE, SALARY_GROWTH,
};
pub use loader::LoadedReferenceTables;
