//! Scenario runner for repeated pipeline runs
//!
//! Pre-loads the reference tables, base workforce and economic parameters
//! once, then runs the full pipeline for many parameter sets without
//! re-reading CSV files.

use crate::aggregate::{
    aggregate_industry_year, aggregate_industry_year_tenure, IndustryYearRow, IndustryYearTenureRow,
};
use crate::assumptions::loader::DEFAULT_DATA_PATH;
use crate::assumptions::{
    apply_override, build_assumptions_with, AssumptionOverride, AssumptionTable, LoadedReferenceTables,
    OverrideTarget, RateEncodings,
};
use crate::cohort::{attach, generate_template, max_initial_tenure, CohortId};
use crate::error::{ConfigError, Result};
use crate::impact::{apply_impact, load_economic_parameters, EconomicParameters, ImpactRow, ECONOMIC_PARAMETERS_FILE};
use crate::projection::{
    CohortYearRow, EngineConfig, ExitRatioBasis, FundLedger, SimulationSummary, SurvivalEngine,
};
use crate::table::normalize_key;
use crate::workforce::loader::{load_base_workforce, EMPLOYEE_SALARY_FILE};
use crate::workforce::{forecast, BaseWorkforceRow, Tenure};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;

pub const DEFAULT_FUND_RETURN_RATE: f64 = 0.04;
pub const DEFAULT_LEAKAGE_RATE: f64 = 0.28;
pub const DEFAULT_START_YEAR: i32 = 2025;
pub const DEFAULT_END_YEAR: i32 = 2040;

pub const MAX_FUND_RETURN_RATE: f64 = 0.15;
pub const MAX_LEAKAGE_RATE: f64 = 0.5;
pub const MAX_HORIZON_YEARS: i32 = 100;

/// Return rates compared by the fund scenario table
pub const DEFAULT_SCENARIO_RATES: [f64; 4] = [0.0, 0.04, 0.06, 0.08];

fn default_fund_return_rate() -> f64 {
    DEFAULT_FUND_RETURN_RATE
}

fn default_leakage_rate() -> f64 {
    DEFAULT_LEAKAGE_RATE
}

fn default_start_year() -> i32 {
    DEFAULT_START_YEAR
}

fn default_end_year() -> i32 {
    DEFAULT_END_YEAR
}

/// An assumption edit applied before a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOverride {
    pub target: OverrideTarget,
    #[serde(default)]
    pub fields: AssumptionOverride,
}

/// Parameters for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParams {
    #[serde(default = "default_fund_return_rate")]
    pub fund_return_rate: f64,

    #[serde(default = "default_leakage_rate")]
    pub leakage_rate: f64,

    #[serde(default = "default_start_year")]
    pub start_year: i32,

    #[serde(default = "default_end_year")]
    pub end_year: i32,

    #[serde(default)]
    pub exit_ratio_basis: ExitRatioBasis,

    /// Keep `start_year` rows in the output tables
    #[serde(default)]
    pub include_base_year: bool,

    /// Edits applied in order to the loaded assumption table
    #[serde(default)]
    pub overrides: Vec<ScenarioOverride>,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            fund_return_rate: DEFAULT_FUND_RETURN_RATE,
            leakage_rate: DEFAULT_LEAKAGE_RATE,
            start_year: DEFAULT_START_YEAR,
            end_year: DEFAULT_END_YEAR,
            exit_ratio_basis: ExitRatioBasis::default(),
            include_base_year: false,
            overrides: Vec::new(),
        }
    }
}

impl ScenarioParams {
    /// Reject out-of-range parameters before any simulation work
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        check_range("fund_return_rate", self.fund_return_rate, 0.0, MAX_FUND_RETURN_RATE)?;
        check_range("leakage_rate", self.leakage_rate, 0.0, MAX_LEAKAGE_RATE)?;
        if self.start_year > self.end_year || self.end_year - self.start_year >= MAX_HORIZON_YEARS {
            return Err(ConfigError::InvalidHorizon {
                start_year: self.start_year,
                end_year: self.end_year,
            });
        }
        Ok(())
    }

    /// The assumption table with every override applied
    pub fn effective_assumptions(
        &self,
        base: &AssumptionTable,
    ) -> std::result::Result<AssumptionTable, ConfigError> {
        let mut table = base.clone();
        for o in &self.overrides {
            table = apply_override(&table, &o.target, &o.fields)?;
        }
        Ok(table)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            fund_return_rate: self.fund_return_rate,
            start_year: self.start_year,
            end_year: self.end_year,
            exit_ratio_basis: self.exit_ratio_basis,
        }
    }
}

fn check_range(name: &'static str, value: f64, min: f64, max: f64) -> std::result::Result<(), ConfigError> {
    if !(min..=max).contains(&value) {
        return Err(ConfigError::OutOfRange { name, value, min, max });
    }
    Ok(())
}

/// Every input table the pipeline needs
#[derive(Debug, Clone)]
pub struct ScenarioInputs {
    pub assumptions: AssumptionTable,
    pub base_workforce: Vec<BaseWorkforceRow>,
    pub economic_parameters: EconomicParameters,
}

impl ScenarioInputs {
    pub fn new(
        assumptions: AssumptionTable,
        base_workforce: Vec<BaseWorkforceRow>,
        economic_parameters: EconomicParameters,
    ) -> Self {
        Self {
            assumptions,
            base_workforce,
            economic_parameters,
        }
    }

    /// Load every input table from a directory using inferred rate encodings
    pub fn load_from(dir: &Path) -> Result<Self> {
        Self::load_from_with(dir, &RateEncodings::inferred())
    }

    /// Load every input table from a directory
    pub fn load_from_with(dir: &Path, encodings: &RateEncodings) -> Result<Self> {
        let reference = LoadedReferenceTables::load_from(dir)?;
        let assumptions = build_assumptions_with(
            &reference.industry_descriptions,
            &reference.industry_rates,
            encodings,
        )?;
        Ok(Self {
            assumptions,
            base_workforce: load_base_workforce(dir.join(EMPLOYEE_SALARY_FILE))?,
            economic_parameters: load_economic_parameters(dir.join(ECONOMIC_PARAMETERS_FILE))?,
        })
    }
}

/// The three result tables of a run plus the tenure split
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioOutput {
    pub params: ScenarioParams,
    /// Totals over the rows kept in `cohort_rows`
    pub summary: SimulationSummary,
    pub cohort_rows: Vec<CohortYearRow>,
    pub industry_year: Vec<IndustryYearRow>,
    pub industry_year_tenure: Vec<IndustryYearTenureRow>,
    pub impact: Vec<ImpactRow>,
}

/// Pre-loaded scenario runner
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::from_csv()?;
///
/// for rate in [0.0, 0.04, 0.08] {
///     let params = ScenarioParams { fund_return_rate: rate, ..Default::default() };
///     let output = runner.run(&params)?;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    inputs: ScenarioInputs,
}

impl ScenarioRunner {
    pub fn new(inputs: ScenarioInputs) -> Self {
        Self { inputs }
    }

    /// Create runner by loading inputs from the default data directory
    pub fn from_csv() -> Result<Self> {
        Self::from_csv_path(Path::new(DEFAULT_DATA_PATH))
    }

    /// Create runner from a specific data directory
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        Ok(Self::new(ScenarioInputs::load_from(path)?))
    }

    pub fn inputs(&self) -> &ScenarioInputs {
        &self.inputs
    }

    /// Loaded assumption table, before any overrides
    pub fn assumptions(&self) -> &AssumptionTable {
        &self.inputs.assumptions
    }

    /// Run the pipeline with the params' overrides applied to the loaded assumptions
    pub fn run(&self, params: &ScenarioParams) -> Result<ScenarioOutput> {
        params.validate()?;
        let assumptions = params.effective_assumptions(&self.inputs.assumptions)?;
        self.run_with(&assumptions, params)
    }

    /// Run the pipeline against an explicit assumption table.
    ///
    /// `params.overrides` is ignored; the caller owns the table.
    pub fn run_with(&self, assumptions: &AssumptionTable, params: &ScenarioParams) -> Result<ScenarioOutput> {
        params.validate()?;
        let (start_year, end_year) = (params.start_year, params.end_year);
        let base = &self.inputs.base_workforce;

        let (employees, salaries) = forecast(base, assumptions, start_year, end_year)?;

        let industries = distinct(base.iter().map(|r| r.industry.as_str()));
        let age_brackets = distinct(base.iter().map(|r| r.age_bracket.as_str()));
        let template = generate_template(
            &industries,
            &age_brackets,
            start_year,
            end_year,
            max_initial_tenure(base),
        )?;

        let inputs = attach(&template, &employees, &salaries, assumptions)?;
        let simulation = SurvivalEngine::new(params.engine_config()).run(&inputs)?;

        let industry_year = aggregate_industry_year(&simulation.rows);
        let industry_year_tenure = aggregate_industry_year_tenure(&simulation.rows);
        let impact = apply_impact(&industry_year, &self.inputs.economic_parameters, params.leakage_rate)?;

        let keep = |year: i32| params.include_base_year || year > start_year;
        let cohort_rows: Vec<CohortYearRow> = simulation.rows.into_iter().filter(|r| keep(r.year)).collect();
        let output = ScenarioOutput {
            params: params.clone(),
            summary: SimulationSummary::from_rows(&cohort_rows),
            cohort_rows,
            industry_year: industry_year.into_iter().filter(|r| keep(r.year)).collect(),
            industry_year_tenure: industry_year_tenure.into_iter().filter(|r| keep(r.year)).collect(),
            impact: impact.into_iter().filter(|r| keep(r.year)).collect(),
        };

        log::info!(
            "scenario r={:.4} leakage={:.2}: {} cohort rows, {} industry-year rows",
            params.fund_return_rate,
            params.leakage_rate,
            output.cohort_rows.len(),
            output.industry_year.len()
        );
        Ok(output)
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .map(str::trim)
        .filter(|v| seen.insert(normalize_key(v)))
        .map(str::to_string)
        .collect()
}

/// Hash identifying a run: assumption contents plus every result-affecting parameter
pub fn scenario_key(assumptions: &AssumptionTable, params: &ScenarioParams) -> u64 {
    let mut hasher = DefaultHasher::new();
    assumptions.hash_contents(&mut hasher);
    params.fund_return_rate.to_bits().hash(&mut hasher);
    params.leakage_rate.to_bits().hash(&mut hasher);
    params.start_year.hash(&mut hasher);
    params.end_year.hash(&mut hasher);
    params.exit_ratio_basis.hash(&mut hasher);
    params.include_base_year.hash(&mut hasher);
    hasher.finish()
}

/// Memoized scenario outputs, owned by the caller
#[derive(Debug, Default)]
pub struct ScenarioCache {
    entries: HashMap<u64, Arc<ScenarioOutput>>,
}

impl ScenarioCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached output for `params`, running the pipeline on a miss
    pub fn get_or_run(&mut self, runner: &ScenarioRunner, params: &ScenarioParams) -> Result<Arc<ScenarioOutput>> {
        params.validate()?;
        let assumptions = params.effective_assumptions(runner.assumptions())?;
        let key = scenario_key(&assumptions, params);

        if let Some(hit) = self.entries.get(&key) {
            log::debug!("scenario cache hit {:016x}", key);
            return Ok(Arc::clone(hit));
        }

        let output = Arc::new(runner.run_with(&assumptions, params)?);
        self.entries.insert(key, Arc::clone(&output));
        Ok(output)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Balances of one cohort-year under one return rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FundBalance {
    pub return_rate: f64,
    /// After return and contribution, before exits
    pub accumulated: f64,
    /// After paying out this year's leavers
    pub exit_adjusted: f64,
}

/// A cohort-year re-rolled at several return rates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundScenarioRow {
    pub industry: String,
    pub age_bracket: String,
    pub cohort: CohortId,
    pub year: i32,
    pub tenure: Tenure,
    pub survived_employee: f64,
    pub exit_employee: f64,
    pub fund_contribution: f64,
    pub balances: Vec<FundBalance>,
}

/// Re-roll each cohort's contribution stream at every rate in `rates`
pub fn fund_scenarios(rows: &[CohortYearRow], rates: &[f64]) -> Vec<FundScenarioRow> {
    // Cohorts in first-appearance order, rows within a cohort in year order
    let mut order: Vec<Vec<&CohortYearRow>> = Vec::new();
    let mut index: HashMap<(String, String, CohortId), usize> = HashMap::new();
    for row in rows {
        let key = (normalize_key(&row.industry), normalize_key(&row.age_bracket), row.cohort);
        let i = *index.entry(key).or_insert_with(|| {
            order.push(Vec::new());
            order.len() - 1
        });
        order[i].push(row);
    }

    let mut out = Vec::with_capacity(rows.len());
    for mut cohort in order {
        cohort.sort_by_key(|r| r.year);
        let mut ledgers: Vec<FundLedger> = rates.iter().map(|&r| FundLedger::with_return(r)).collect();

        for row in cohort {
            let exit_ratio = ExitRatioBasis::PreExitPopulation.ratio(row.survived_employee, row.exit_employee);
            let balances = rates
                .iter()
                .zip(ledgers.iter_mut())
                .map(|(&rate, ledger)| {
                    let step = ledger.step(row.fund_contribution, exit_ratio);
                    FundBalance {
                        return_rate: rate,
                        accumulated: step.before_payout(),
                        exit_adjusted: step.closing,
                    }
                })
                .collect();

            out.push(FundScenarioRow {
                industry: row.industry.clone(),
                age_bracket: row.age_bracket.clone(),
                cohort: row.cohort,
                year: row.year,
                tenure: row.tenure,
                survived_employee: row.survived_employee,
                exit_employee: row.exit_employee,
                fund_contribution: row.fund_contribution,
                balances,
            });
        }
    }
    out
}

/// Exit-adjusted fund per surviving employee at one return rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerEmployeeValue {
    pub return_rate: f64,
    pub per_employee: f64,
}

/// Fund value per survivor of the start-year entrant cohort after `tenure` years
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerEmployeeBenefit {
    pub industry: String,
    pub age_bracket: String,
    pub year: i32,
    pub tenure: u32,
    pub survivors: f64,
    pub values: Vec<PerEmployeeValue>,
}

impl PerEmployeeBenefit {
    /// Value at `rate` relative to the zero-return value, in percent
    pub fn value_created_pct(&self, rate: f64) -> Option<f64> {
        let find = |r: f64| {
            self.values
                .iter()
                .find(|v| (v.return_rate - r).abs() < 1e-12)
                .map(|v| v.per_employee)
        };
        let unfunded = find(0.0)?;
        let funded = find(rate)?;
        if unfunded > 0.0 {
            Some((funded - unfunded) / unfunded * 100.0)
        } else {
            Some(0.0)
        }
    }
}

/// Projected benefit per employee for the `{start_year}_0` cohort of one group.
///
/// Returns `None` when the cohort has no row at that tenure or no survivors.
pub fn per_employee_benefit(
    scenarios: &[FundScenarioRow],
    industry: &str,
    age_bracket: &str,
    start_year: i32,
    tenure: u32,
) -> Option<PerEmployeeBenefit> {
    let cohort = CohortId::new(start_year, 0);
    let year = start_year + tenure as i32;
    let (industry_key, age_key) = (normalize_key(industry), normalize_key(age_bracket));

    let row = scenarios.iter().find(|r| {
        r.cohort == cohort
            && r.year == year
            && r.tenure == Tenure::whole(tenure)
            && normalize_key(&r.industry) == industry_key
            && normalize_key(&r.age_bracket) == age_key
    })?;

    if row.survived_employee <= 0.0 {
        return None;
    }

    Some(PerEmployeeBenefit {
        industry: row.industry.clone(),
        age_bracket: row.age_bracket.clone(),
        year,
        tenure,
        survivors: row.survived_employee,
        values: row
            .balances
            .iter()
            .map(|b| PerEmployeeValue {
                return_rate: b.return_rate,
                per_employee: b.exit_adjusted / row.survived_employee,
            })
            .collect(),
    })
}
