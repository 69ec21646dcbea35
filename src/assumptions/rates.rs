//! Per-(industry, age bracket) rate assumptions
//!
//! Built once from the description and rate tables, then replaced (never
//! mutated in place) when an override is applied.

use super::encoding::{parse_rate, RateEncodings};
use crate::error::{ConfigError, DataError};
use crate::table::{normalize_key, SourceTable};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

pub const INDUSTRY: &str = "Industry";
pub const AGE_BRACKET: &str = "Age_Bracket";
pub const AGE_BRACKET_ALIASES: [&str; 2] = ["Age_Bracket", "Age_Brackets"];
pub const RETIREMENT_RATE: &str = "Retirement Rate";
pub const DEATH_RATE: &str = "Death Rate";
pub const ATTRITION: &str = "Attrition %";
pub const REPLACEMENT_HIRING: &str = "Replacement Hiring %";
pub const EXPANSION_HIRING: &str = "Expansion Hiring %";
pub const SALARY_GROWTH: &str = "Salary Growth %";
pub const EMP_GROWTH: &str = "Emp Growth %";

/// Rate columns that must be present in one of the two source tables
pub const REQUIRED_RATE_COLUMNS: [&str; 6] = [
    RETIREMENT_RATE,
    DEATH_RATE,
    ATTRITION,
    REPLACEMENT_HIRING,
    EXPANSION_HIRING,
    SALARY_GROWTH,
];

/// Rate assumptions for one (industry, age bracket)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssumptionRow {
    pub industry: String,
    pub age_bracket: String,

    pub expansion_hiring_rate: f64,
    pub replacement_hiring_rate: f64,
    pub attrition_rate: f64,
    pub retirement_rate: f64,
    pub death_rate: f64,
    pub salary_growth_rate: f64,

    /// Carried through when the rate table provides it
    pub emp_growth_rate: Option<f64>,

    // Derived
    pub total_hiring_rate: f64,
    pub total_exit_rate: f64,
    pub net_churn_rate: f64,
}

impl AssumptionRow {
    /// Row with the given base rates and derived fields computed
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        industry: &str,
        age_bracket: &str,
        expansion_hiring_rate: f64,
        replacement_hiring_rate: f64,
        attrition_rate: f64,
        retirement_rate: f64,
        death_rate: f64,
        salary_growth_rate: f64,
    ) -> Self {
        let mut row = Self {
            industry: industry.to_string(),
            age_bracket: age_bracket.to_string(),
            expansion_hiring_rate,
            replacement_hiring_rate,
            attrition_rate,
            retirement_rate,
            death_rate,
            salary_growth_rate,
            emp_growth_rate: None,
            total_hiring_rate: 0.0,
            total_exit_rate: 0.0,
            net_churn_rate: 0.0,
        };
        row.recompute_derived();
        row
    }

    /// Recompute total hiring, total exit (capped at 1) and net churn
    pub fn recompute_derived(&mut self) {
        self.total_hiring_rate = self.expansion_hiring_rate + self.replacement_hiring_rate;
        self.total_exit_rate = (self.attrition_rate + self.retirement_rate + self.death_rate).min(1.0);
        self.net_churn_rate = self.total_hiring_rate - self.total_exit_rate;
    }

    /// Normalized lookup key
    pub fn key(&self) -> (String, String) {
        (normalize_key(&self.industry), normalize_key(&self.age_bracket))
    }

    fn hash_contents<H: Hasher>(&self, state: &mut H) {
        self.industry.hash(state);
        self.age_bracket.hash(state);
        for value in [
            self.expansion_hiring_rate,
            self.replacement_hiring_rate,
            self.attrition_rate,
            self.retirement_rate,
            self.death_rate,
            self.salary_growth_rate,
            self.emp_growth_rate.unwrap_or(f64::NAN),
            self.total_hiring_rate,
            self.total_exit_rate,
            self.net_churn_rate,
        ] {
            value.to_bits().hash(state);
        }
    }
}

/// Immutable assumption table keyed by (industry, age bracket)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<AssumptionRow>", into = "Vec<AssumptionRow>")]
pub struct AssumptionTable {
    rows: Vec<AssumptionRow>,
    #[serde(skip)]
    index: HashMap<(String, String), usize>,
}

impl From<Vec<AssumptionRow>> for AssumptionTable {
    fn from(rows: Vec<AssumptionRow>) -> Self {
        Self::from_rows(rows)
    }
}

impl From<AssumptionTable> for Vec<AssumptionRow> {
    fn from(table: AssumptionTable) -> Self {
        table.rows
    }
}

impl AssumptionTable {
    /// Build from rows; later duplicates of a key are dropped
    pub fn from_rows(rows: Vec<AssumptionRow>) -> Self {
        let mut kept = Vec::with_capacity(rows.len());
        let mut index = HashMap::new();
        for row in rows {
            let key = row.key();
            if index.contains_key(&key) {
                log::warn!(
                    "duplicate assumption row for {} / {} ignored",
                    row.industry,
                    row.age_bracket
                );
                continue;
            }
            index.insert(key, kept.len());
            kept.push(row);
        }
        Self { rows: kept, index }
    }

    pub fn rows(&self) -> &[AssumptionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Case/whitespace-insensitive lookup
    pub fn get(&self, industry: &str, age_bracket: &str) -> Option<&AssumptionRow> {
        self.index
            .get(&(normalize_key(industry), normalize_key(age_bracket)))
            .map(|&i| &self.rows[i])
    }

    /// Distinct industries in first-appearance order
    pub fn industries(&self) -> Vec<String> {
        distinct(self.rows.iter().map(|r| r.industry.as_str()))
    }

    /// Distinct age brackets in first-appearance order
    pub fn age_brackets(&self) -> Vec<String> {
        distinct(self.rows.iter().map(|r| r.age_bracket.as_str()))
    }

    /// Feed the full table contents into a hasher (scenario cache key)
    pub fn hash_contents<H: Hasher>(&self, state: &mut H) {
        self.rows.len().hash(state);
        for row in &self.rows {
            row.hash_contents(state);
        }
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(normalize_key(v)))
        .map(|v| v.to_string())
        .collect()
}

/// Merge the description and rate tables using inferred encodings
pub fn build_assumptions(
    industry_descriptions: &SourceTable,
    industry_rates: &SourceTable,
) -> Result<AssumptionTable, DataError> {
    build_assumptions_with(industry_descriptions, industry_rates, &RateEncodings::inferred())
}

/// Merge the description and rate tables.
///
/// Every description row is kept (left join on Industry, plus Age_Bracket when
/// the rate table carries it). Rate columns may live in either table; the
/// rate table wins when both carry a column. Description rows with no rate
/// row get zero rates.
pub fn build_assumptions_with(
    industry_descriptions: &SourceTable,
    industry_rates: &SourceTable,
    encodings: &RateEncodings,
) -> Result<AssumptionTable, DataError> {
    let desc_industry = industry_descriptions.column(INDUSTRY)?;
    let desc_age = industry_descriptions.column_any(&AGE_BRACKET_ALIASES)?;
    let rate_industry = industry_rates.column(INDUSTRY)?;
    let rate_age = industry_rates.column_any(&AGE_BRACKET_ALIASES).ok();

    // Resolve where each rate column is read from
    let mut sources = Vec::with_capacity(REQUIRED_RATE_COLUMNS.len());
    for column in REQUIRED_RATE_COLUMNS {
        sources.push(resolve_column(industry_descriptions, industry_rates, column)?);
    }
    let emp_growth = resolve_column(industry_descriptions, industry_rates, EMP_GROWTH).ok();

    let mut rate_rows: HashMap<(String, Option<String>), usize> = HashMap::new();
    for i in 0..industry_rates.len() {
        let key = (
            normalize_key(industry_rates.cell(i, rate_industry)),
            rate_age.map(|c| normalize_key(industry_rates.cell(i, c))),
        );
        rate_rows.entry(key).or_insert(i);
    }

    let mut unmatched: HashSet<String> = HashSet::new();
    let mut rows = Vec::with_capacity(industry_descriptions.len());

    for i in 0..industry_descriptions.len() {
        let industry = industry_descriptions.cell(i, desc_industry).trim();
        let age_bracket = industry_descriptions.cell(i, desc_age).trim();
        if industry.is_empty() || age_bracket.is_empty() {
            log::debug!("description row {} has no industry/age bracket, skipped", i + 1);
            continue;
        }

        let rate_row = rate_rows
            .get(&(normalize_key(industry), rate_age.map(|_| normalize_key(age_bracket))))
            .copied();
        if rate_row.is_none() && unmatched.insert(normalize_key(industry)) {
            log::warn!("industry '{}' has no rate row, rates default to zero", industry);
        }

        let read = |source: &ColumnSource| -> Result<f64, DataError> {
            source.read(industry_descriptions, industry_rates, i, rate_row, encodings)
        };

        let mut assumption = AssumptionRow::new(
            industry,
            age_bracket,
            read(&sources[4])?,
            read(&sources[3])?,
            read(&sources[2])?,
            read(&sources[0])?,
            read(&sources[1])?,
            read(&sources[5])?,
        );
        if let Some(source) = &emp_growth {
            assumption.emp_growth_rate = Some(read(source)?);
        }

        if assumption.attrition_rate + assumption.retirement_rate + assumption.death_rate > 1.0 {
            log::warn!(
                "{} / {}: exit components exceed 100%, total exit capped at 1",
                industry,
                age_bracket
            );
        }

        rows.push(assumption);
    }

    let table = AssumptionTable::from_rows(rows);
    log::info!(
        "built {} assumption rows across {} industries",
        table.len(),
        table.industries().len()
    );
    Ok(table)
}

/// Which table a rate column is read from
enum ColumnSource {
    Rates { column: usize, name: &'static str },
    Description { column: usize, name: &'static str },
}

fn resolve_column(
    descriptions: &SourceTable,
    rates: &SourceTable,
    name: &'static str,
) -> Result<ColumnSource, DataError> {
    if let Ok(column) = rates.column(name) {
        Ok(ColumnSource::Rates { column, name })
    } else if let Ok(column) = descriptions.column(name) {
        Ok(ColumnSource::Description { column, name })
    } else {
        Err(DataError::MissingColumn {
            table: rates.name.clone(),
            column: name.to_string(),
        })
    }
}

impl ColumnSource {
    fn read(
        &self,
        descriptions: &SourceTable,
        rates: &SourceTable,
        desc_row: usize,
        rate_row: Option<usize>,
        encodings: &RateEncodings,
    ) -> Result<f64, DataError> {
        let (table, row, column, name) = match *self {
            ColumnSource::Rates { column, name } => match rate_row {
                Some(row) => (rates, row, column, name),
                None => return Ok(0.0),
            },
            ColumnSource::Description { column, name } => (descriptions, desc_row, column, name),
        };

        let raw = table.cell(row, column);
        parse_rate(raw, encodings.get(name)).ok_or_else(|| DataError::InvalidNumber {
            table: table.name.clone(),
            column: name.to_string(),
            row: row + 1,
            value: raw.to_string(),
        })
    }
}

/// Which rows an override applies to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OverrideTarget {
    /// A single (industry, age bracket) row
    Group { industry: String, age_bracket: String },
    /// Every age bracket of one industry
    Industry { industry: String },
}

/// Replacement values for the editable base rates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssumptionOverride {
    pub expansion_hiring_rate: Option<f64>,
    pub replacement_hiring_rate: Option<f64>,
    pub attrition_rate: Option<f64>,
    pub retirement_rate: Option<f64>,
    pub death_rate: Option<f64>,
    pub salary_growth_rate: Option<f64>,
}

impl AssumptionOverride {
    fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("expansion_hiring_rate", self.expansion_hiring_rate),
            ("replacement_hiring_rate", self.replacement_hiring_rate),
            ("attrition_rate", self.attrition_rate),
            ("retirement_rate", self.retirement_rate),
            ("death_rate", self.death_rate),
            ("salary_growth_rate", self.salary_growth_rate),
        ];
        for (field, value) in fields {
            if let Some(v) = value {
                if !(0.0..=1.0).contains(&v) {
                    return Err(ConfigError::InvalidRate { field, value: v });
                }
            }
        }
        Ok(())
    }

    fn apply(&self, row: &mut AssumptionRow) {
        if let Some(v) = self.expansion_hiring_rate {
            row.expansion_hiring_rate = v;
        }
        if let Some(v) = self.replacement_hiring_rate {
            row.replacement_hiring_rate = v;
        }
        if let Some(v) = self.attrition_rate {
            row.attrition_rate = v;
        }
        if let Some(v) = self.retirement_rate {
            row.retirement_rate = v;
        }
        if let Some(v) = self.death_rate {
            row.death_rate = v;
        }
        if let Some(v) = self.salary_growth_rate {
            row.salary_growth_rate = v;
        }
        row.recompute_derived();
    }
}

/// Return a new table with the override applied to the targeted rows.
///
/// Derived fields are recomputed for the affected rows only.
pub fn apply_override(
    table: &AssumptionTable,
    target: &OverrideTarget,
    fields: &AssumptionOverride,
) -> Result<AssumptionTable, ConfigError> {
    fields.validate()?;

    let matches = |row: &AssumptionRow| match target {
        OverrideTarget::Group { industry, age_bracket } => {
            row.key() == (normalize_key(industry), normalize_key(age_bracket))
        }
        OverrideTarget::Industry { industry } => normalize_key(&row.industry) == normalize_key(industry),
    };

    if !table.rows.iter().any(matches) {
        let (industry, age_bracket) = match target {
            OverrideTarget::Group { industry, age_bracket } => (industry.clone(), age_bracket.clone()),
            OverrideTarget::Industry { industry } => (industry.clone(), "*".to_string()),
        };
        return Err(ConfigError::UnknownOverrideTarget { industry, age_bracket });
    }

    let mut updated = table.clone();
    for row in updated.rows.iter_mut().filter(|r| matches(r)) {
        fields.apply(row);
    }
    Ok(updated)
}
