//! Cohort survival and dual fund roll-forward
//!
//! Each (industry, age bracket) group is simulated independently, so groups
//! run in parallel. Within a group the existing-stock cohorts run first, then
//! the entrant cohorts in entry-year order; an entrant cohort consumes the
//! replacements queued for its entry year by every row processed before it.

use super::gratuity::gratuity_rate;
use super::rows::{CohortYearRow, SimulationResult};
use super::state::CohortState;
use crate::cohort::CohortYearInput;
use crate::error::{ConfigError, DataError, Result};
use crate::table::normalize_key;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Age brackets whose leavers are always fully replaced
pub const FULL_REPLACEMENT_BRACKETS: [&str; 5] = ["<55", "55-59", "60-64", "65-69", "70+"];

/// Whether an age bracket is in the near-retirement full-replacement set
pub fn is_full_replacement(age_bracket: &str) -> bool {
    let bracket = age_bracket.trim();
    FULL_REPLACEMENT_BRACKETS.iter().any(|b| *b == bracket)
}

/// Round to zero decimals, ties to even
pub fn round_half_even(value: f64) -> f64 {
    value.round_ties_even()
}

/// Denominator used to turn a row's exits into a fund withdrawal fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitRatioBasis {
    /// exit / (survived + exit): the share of the pre-exit population that left
    #[default]
    PreExitPopulation,
    /// exit / survived, clamped to 1
    Survivors,
}

impl ExitRatioBasis {
    pub fn ratio(self, survived: f64, exited: f64) -> f64 {
        let denominator = match self {
            ExitRatioBasis::PreExitPopulation => survived + exited,
            ExitRatioBasis::Survivors => survived,
        };
        if denominator <= 0.0 {
            0.0
        } else {
            (exited / denominator).min(1.0)
        }
    }
}

/// Configuration for a simulation run
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Annual return earned by the with-return ledger
    pub fund_return_rate: f64,

    pub start_year: i32,

    /// Replacements queued beyond this year are discarded
    pub end_year: i32,

    pub exit_ratio_basis: ExitRatioBasis,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fund_return_rate: 0.04,
            start_year: 2025,
            end_year: 2040,
            exit_ratio_basis: ExitRatioBasis::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.start_year > self.end_year {
            return Err(ConfigError::InvalidHorizon {
                start_year: self.start_year,
                end_year: self.end_year,
            });
        }
        if !self.fund_return_rate.is_finite() || self.fund_return_rate < 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "fund_return_rate",
                value: self.fund_return_rate,
                min: 0.0,
                max: f64::INFINITY,
            });
        }
        Ok(())
    }
}

// Existing stock sorts before entrants; then entry year, then entry tenure
type CohortOrder = (u8, i32, u32);

struct GroupInputs<'a> {
    industry: &'a str,
    age_bracket: &'a str,
    cohorts: BTreeMap<CohortOrder, Vec<&'a CohortYearInput>>,
}

/// Survival and fund engine
pub struct SurvivalEngine {
    config: EngineConfig,
}

impl SurvivalEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Simulate every cohort in `inputs`
    pub fn run(&self, inputs: &[CohortYearInput]) -> Result<SimulationResult> {
        self.config.validate()?;
        validate_inputs(inputs)?;

        let groups = self.group_inputs(inputs);
        log::info!(
            "simulating {} groups, {} input rows, fund return {:.4}",
            groups.len(),
            inputs.len(),
            self.config.fund_return_rate
        );

        let simulated: Vec<Vec<CohortYearRow>> = groups
            .par_iter()
            .map(|group| self.simulate_group(group))
            .collect();

        Ok(SimulationResult::new(simulated.into_iter().flatten().collect()))
    }

    fn group_inputs<'a>(&self, inputs: &'a [CohortYearInput]) -> Vec<GroupInputs<'a>> {
        let mut groups: BTreeMap<(String, String), GroupInputs<'a>> = BTreeMap::new();

        for input in inputs {
            let group = groups
                .entry((normalize_key(&input.industry), normalize_key(&input.age_bracket)))
                .or_insert_with(|| GroupInputs {
                    industry: input.industry.as_str(),
                    age_bracket: input.age_bracket.as_str(),
                    cohorts: BTreeMap::new(),
                });

            let phase = if input.cohort.is_existing_stock(self.config.start_year) { 0 } else { 1 };
            group
                .cohorts
                .entry((phase, input.cohort.entry_year, input.cohort.entry_tenure))
                .or_default()
                .push(input);
        }

        let mut groups: Vec<GroupInputs<'a>> = groups.into_values().collect();
        for group in &mut groups {
            for rows in group.cohorts.values_mut() {
                rows.sort_by_key(|r| r.year);
            }
        }
        groups
    }

    fn simulate_group(&self, group: &GroupInputs<'_>) -> Vec<CohortYearRow> {
        let full_replacement = is_full_replacement(group.age_bracket);
        let basis = self.config.exit_ratio_basis;

        // Rehires queued for (year, tenure 0) of this group
        let mut pool: HashMap<i32, f64> = HashMap::new();
        let mut output = Vec::with_capacity(group.cohorts.values().map(Vec::len).sum());

        for rows in group.cohorts.values() {
            let mut state = CohortState::new(self.config.fund_return_rate);

            for (i, input) in rows.iter().enumerate() {
                let (inflow, base, exit_rate, replacement_rate) = if i == 0 {
                    let pooled = if input.cohort.entry_tenure == 0 {
                        pool.remove(&input.year).unwrap_or(0.0)
                    } else {
                        0.0
                    };
                    let inflow = input.forecast_employee + pooled;
                    (inflow, inflow, input.exit_rate, input.replacement_rate)
                } else {
                    (0.0, state.survived, state.exit_rate, state.replacement_rate)
                };

                let survived = round_half_even(base * (1.0 - exit_rate));
                let exited = round_half_even(base * exit_rate);
                let replacement = if full_replacement {
                    exited
                } else {
                    round_half_even(exited * replacement_rate)
                };

                if replacement > 0.0 && input.year < self.config.end_year {
                    *pool.entry(input.year + 1).or_insert(0.0) += replacement;
                }

                let rate = gratuity_rate(input.tenure.years());
                let gratuity_per_employee = input.salary * rate;
                let contribution = if i == 0 {
                    gratuity_per_employee * survived
                } else {
                    ((gratuity_per_employee - state.prior_gratuity_per_employee) * survived).max(0.0)
                };

                let exit_ratio = basis.ratio(survived, exited);
                let no_return = state.no_return.step(contribution, exit_ratio);
                let with_return = state.with_return.step(contribution, exit_ratio);

                state.survived = survived;
                state.exit_rate = input.exit_rate;
                state.replacement_rate = input.replacement_rate;
                state.prior_gratuity_per_employee = gratuity_per_employee;

                output.push(CohortYearRow {
                    industry: input.industry.clone(),
                    age_bracket: input.age_bracket.clone(),
                    cohort: input.cohort,
                    year: input.year,
                    tenure: input.tenure,
                    salary: input.salary,
                    forecast_employee: input.forecast_employee,
                    exit_rate: input.exit_rate,
                    replacement_rate: input.replacement_rate,
                    inflow_employee: inflow,
                    survived_employee: survived,
                    exit_employee: exited,
                    replacement_employee: replacement,
                    gratuity_rate: rate,
                    gratuity_per_employee,
                    fund_contribution: contribution,
                    exit_ratio,
                    no_return_opening: no_return.opening,
                    no_return_earned: no_return.earned_return,
                    no_return_payout: no_return.exit_payout,
                    no_return_closing: no_return.closing,
                    with_return_opening: with_return.opening,
                    with_return_earned: with_return.earned_return,
                    with_return_payout: with_return.exit_payout,
                    with_return_closing: with_return.closing,
                });
            }
        }

        if !pool.is_empty() {
            log::debug!(
                "{} / {}: {} pooled replacements had no entrant cohort",
                group.industry,
                group.age_bracket,
                pool.values().sum::<f64>()
            );
        }
        log::debug!(
            "{} / {}: {} cohorts, {} rows",
            group.industry,
            group.age_bracket,
            group.cohorts.len(),
            output.len()
        );

        output
    }
}

fn validate_inputs(inputs: &[CohortYearInput]) -> std::result::Result<(), DataError> {
    let invalid = |row: usize, column: &str, value: f64| DataError::InvalidNumber {
        table: "cohort inputs".to_string(),
        column: column.to_string(),
        row,
        value: value.to_string(),
    };

    for (i, input) in inputs.iter().enumerate() {
        for (column, value) in [("exit_rate", input.exit_rate), ("replacement_rate", input.replacement_rate)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(i, column, value));
            }
        }
        for (column, value) in [("salary", input.salary), ("forecast_employee", input.forecast_employee)] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(i, column, value));
            }
        }
    }
    Ok(())
}
