//! Economic impact of fund contributions
//!
//! Each year's total fund contribution is allocated across industries by
//! payroll share, reduced by leakage, and converted into output, value-added
//! and employment impact with the industry's sector multipliers.

mod parameters;

pub use parameters::{
    load_economic_parameters, load_economic_parameters_from_reader, EconomicParameters,
    SectorMultipliers, ECONOMIC_PARAMETERS_FILE,
};

use crate::aggregate::IndustryYearRow;
use crate::error::{ConfigError, Result};
use crate::table::normalize_key;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Output scale of the employment multiplier (jobs per AED 1M)
pub const JOBS_MULTIPLIER_SCALE: f64 = 1_000_000.0;

/// Economic impact for one (industry, year)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactRow {
    pub industry: String,
    pub sector: String,
    pub year: i32,
    pub total_employees: f64,
    pub annual_total_salary: f64,
    pub annual_fund_contribution: f64,
    pub closing_fund_with_return: f64,

    /// Year's total contribution allocated by payroll share
    pub net_new_saving: f64,
    pub leakage_rate: f64,
    pub domestic_investable: f64,
    pub output_impact: f64,
    pub gva_impact: f64,
    pub jobs_impact: f64,
}

/// Years included in a sector roll-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YearFilter {
    /// Every year present
    #[default]
    Horizon,
    Year(i32),
}

impl YearFilter {
    pub fn includes(self, year: i32) -> bool {
        match self {
            YearFilter::Horizon => true,
            YearFilter::Year(y) => y == year,
        }
    }
}

/// Impact summed over a sector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorImpactRow {
    pub sector: String,
    pub net_new_saving: f64,
    pub domestic_investable: f64,
    pub output_impact: f64,
    pub gva_impact: f64,
    pub jobs_impact: f64,
}

/// Apply sector multipliers to industry-year aggregates
pub fn apply_impact(
    industry_year: &[IndustryYearRow],
    parameters: &EconomicParameters,
    leakage_rate: f64,
) -> Result<Vec<ImpactRow>> {
    if !(0.0..=1.0).contains(&leakage_rate) {
        return Err(ConfigError::OutOfRange {
            name: "leakage_rate",
            value: leakage_rate,
            min: 0.0,
            max: 1.0,
        }
        .into());
    }

    // year -> (payroll, contribution)
    let mut totals: HashMap<i32, (f64, f64)> = HashMap::new();
    for row in industry_year {
        let t = totals.entry(row.year).or_insert((0.0, 0.0));
        t.0 += row.annual_total_salary;
        t.1 += row.annual_fund_contribution;
    }

    let mut out = Vec::with_capacity(industry_year.len());
    for row in industry_year {
        let (sector, multipliers) = parameters.lookup(&row.industry)?;
        let (payroll, contribution) = totals.get(&row.year).copied().unwrap_or((0.0, 0.0));

        let allocated = if payroll > 0.0 {
            contribution * row.annual_total_salary / payroll
        } else {
            0.0
        };
        let domestic = allocated * (1.0 - leakage_rate);

        out.push(ImpactRow {
            industry: row.industry.clone(),
            sector: sector.to_string(),
            year: row.year,
            total_employees: row.total_employees,
            annual_total_salary: row.annual_total_salary,
            annual_fund_contribution: row.annual_fund_contribution,
            closing_fund_with_return: row.closing_fund_with_return,
            net_new_saving: allocated,
            leakage_rate,
            domestic_investable: domestic,
            output_impact: multipliers.output_multiplier * domestic,
            gva_impact: multipliers.gva_to_output_ratio * domestic,
            jobs_impact: multipliers.employment_multiplier * domestic / JOBS_MULTIPLIER_SCALE,
        });
    }

    log::info!(
        "economic impact for {} industry-year rows at leakage {:.2}",
        out.len(),
        leakage_rate
    );
    Ok(out)
}

/// Roll impact rows up to sectors, ordered by sector name
pub fn summarize_by_sector(impact: &[ImpactRow], years: YearFilter) -> Vec<SectorImpactRow> {
    let mut sectors: BTreeMap<String, SectorImpactRow> = BTreeMap::new();
    for row in impact.iter().filter(|r| years.includes(r.year)) {
        let s = sectors
            .entry(normalize_key(&row.sector))
            .or_insert_with(|| SectorImpactRow {
                sector: row.sector.clone(),
                net_new_saving: 0.0,
                domestic_investable: 0.0,
                output_impact: 0.0,
                gva_impact: 0.0,
                jobs_impact: 0.0,
            });
        s.net_new_saving += row.net_new_saving;
        s.domestic_investable += row.domestic_investable;
        s.output_impact += row.output_impact;
        s.gva_impact += row.gva_impact;
        s.jobs_impact += row.jobs_impact;
    }
    sectors.into_values().collect()
}
