//! EOSG Projection CLI
//!
//! Command-line interface for running workforce survival and gratuity fund projections

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use eosg_projection::assumptions::{RateEncoding, RateEncodings};
use eosg_projection::benefit::{estimate_benefit, EmployeeProfile};
use eosg_projection::impact::{summarize_by_sector, YearFilter};
use eosg_projection::output::write_scenario_output;
use eosg_projection::projection::{ExitRatioBasis, SimulationSummary};
use eosg_projection::scenario::{
    fund_scenarios, per_employee_benefit, ScenarioInputs, ScenarioParams, ScenarioRunner,
    DEFAULT_END_YEAR, DEFAULT_FUND_RETURN_RATE, DEFAULT_LEAKAGE_RATE, DEFAULT_SCENARIO_RATES,
    DEFAULT_START_YEAR,
};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "eosg")]
#[command(about = "Cohort survival and end-of-service gratuity fund projection")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Basis {
    /// exit / (survived + exit)
    PreExit,
    /// exit / survived, clamped to 1
    Survivors,
}

impl From<Basis> for ExitRatioBasis {
    fn from(b: Basis) -> Self {
        match b {
            Basis::PreExit => ExitRatioBasis::PreExitPopulation,
            Basis::Survivors => ExitRatioBasis::Survivors,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Encoding {
    Infer,
    Percent,
    Fraction,
}

impl From<Encoding> for RateEncoding {
    fn from(e: Encoding) -> Self {
        match e {
            Encoding::Infer => RateEncoding::Infer,
            Encoding::Percent => RateEncoding::Percent,
            Encoding::Fraction => RateEncoding::Fraction,
        }
    }
}

#[derive(clap::Args)]
struct ScenarioArgs {
    /// Directory holding the input CSV tables
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Annual fund return rate (fraction)
    #[arg(short = 'r', long, default_value_t = DEFAULT_FUND_RETURN_RATE)]
    fund_return_rate: f64,

    /// Leakage rate (fraction)
    #[arg(short, long, default_value_t = DEFAULT_LEAKAGE_RATE)]
    leakage_rate: f64,

    #[arg(long, default_value_t = DEFAULT_START_YEAR)]
    start_year: i32,

    #[arg(long, default_value_t = DEFAULT_END_YEAR)]
    end_year: i32,

    /// Denominator for the exit payout ratio
    #[arg(long, value_enum, default_value_t = Basis::PreExit)]
    exit_ratio_basis: Basis,

    /// Keep start-year rows in the output tables
    #[arg(long)]
    include_base_year: bool,

    /// Encoding of every rate column
    #[arg(long, value_enum, default_value_t = Encoding::Infer)]
    rate_encoding: Encoding,

    /// JSON file with a list of assumption overrides
    #[arg(long)]
    overrides: Option<PathBuf>,
}

impl ScenarioArgs {
    fn params(&self) -> Result<ScenarioParams> {
        let overrides = match &self.overrides {
            Some(path) => {
                let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
                serde_json::from_reader(file).with_context(|| format!("parsing {}", path.display()))?
            }
            None => Vec::new(),
        };
        Ok(ScenarioParams {
            fund_return_rate: self.fund_return_rate,
            leakage_rate: self.leakage_rate,
            start_year: self.start_year,
            end_year: self.end_year,
            exit_ratio_basis: self.exit_ratio_basis.into(),
            include_base_year: self.include_base_year,
            overrides,
        })
    }

    fn runner(&self) -> Result<ScenarioRunner> {
        let encodings = RateEncodings::inferred().with_default(self.rate_encoding.into());
        let inputs = ScenarioInputs::load_from_with(&self.data_dir, &encodings)
            .with_context(|| format!("loading inputs from {}", self.data_dir.display()))?;
        Ok(ScenarioRunner::new(inputs))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline and write the result tables
    Run {
        #[command(flatten)]
        scenario: ScenarioArgs,

        /// Output directory for CSV tables, summary and manifest
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,
    },

    /// Fund value per employee of the start-year entrant cohort at 0/4/6/8% returns
    PerEmployee {
        #[command(flatten)]
        scenario: ScenarioArgs,

        #[arg(long)]
        industry: String,

        #[arg(long)]
        age_bracket: String,

        /// Years of service
        #[arg(short, long, default_value_t = 5)]
        tenure: u32,
    },

    /// Unfunded vs funded end-of-service benefit for one employee
    Benefit {
        /// Previous year's monthly basic salary
        #[arg(short, long)]
        salary: f64,

        /// Annual salary growth (fraction)
        #[arg(short, long, default_value_t = 0.03)]
        growth: f64,

        /// Years of service
        #[arg(short, long, default_value_t = 5.0)]
        tenure: f64,

        /// Annual fund return (fraction)
        #[arg(short = 'r', long, default_value_t = DEFAULT_FUND_RETURN_RATE)]
        fund_return_rate: f64,
    },
}

#[derive(Serialize)]
struct RunManifest<'a> {
    generated_at: DateTime<Utc>,
    version: &'static str,
    data_dir: &'a Path,
    params: &'a ScenarioParams,
    files: Vec<PathBuf>,
    elapsed_ms: u64,
}

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Command::Run { scenario, output_dir } => run(&scenario, &output_dir),
        Command::PerEmployee {
            scenario,
            industry,
            age_bracket,
            tenure,
        } => per_employee(&scenario, &industry, &age_bracket, tenure),
        Command::Benefit {
            salary,
            growth,
            tenure,
            fund_return_rate,
        } => benefit(salary, growth, tenure, fund_return_rate),
    }
}

fn run(args: &ScenarioArgs, output_dir: &Path) -> Result<()> {
    let start = Instant::now();
    let params = args.params()?;
    let runner = args.runner()?;

    println!("EOSG Projection v{}", env!("CARGO_PKG_VERSION"));
    println!("========================\n");
    println!(
        "Horizon {}..={}, fund return {:.2}%, leakage {:.0}%",
        params.start_year,
        params.end_year,
        params.fund_return_rate * 100.0,
        params.leakage_rate * 100.0
    );

    let output = runner.run(&params).context("running scenario")?;

    println!("\n{:>6} {:>14} {:>18} {:>18} {:>18}", "Year", "Employees", "Contribution", "Fund (0%)", "Fund (return)");
    println!("{}", "-".repeat(78));
    for year in output.industry_year.iter().map(|r| r.year).collect::<std::collections::BTreeSet<_>>() {
        let rows = output.industry_year.iter().filter(|r| r.year == year);
        let (employees, contribution, no_return, with_return) = rows.fold((0.0, 0.0, 0.0, 0.0), |acc, r| {
            (
                acc.0 + r.total_employees,
                acc.1 + r.annual_fund_contribution,
                acc.2 + r.closing_fund_no_return,
                acc.3 + r.closing_fund_with_return,
            )
        });
        println!(
            "{:>6} {:>14.0} {:>18.2} {:>18.2} {:>18.2}",
            year, employees, contribution, no_return, with_return
        );
    }

    println!("\nSector impact (horizon):");
    for s in summarize_by_sector(&output.impact, YearFilter::Horizon) {
        println!(
            "  {:<32} output {:>16.2}  gva {:>16.2}  jobs {:>10.1}",
            s.sector, s.output_impact, s.gva_impact, s.jobs_impact
        );
    }

    let mut files = write_scenario_output(output_dir, &output)
        .with_context(|| format!("writing tables to {}", output_dir.display()))?;

    let summary_path = output_dir.join("summary.json");
    write_json(&summary_path, &output.summary)?;
    files.push(summary_path);

    print_summary(&output.summary);

    let manifest_path = output_dir.join("manifest.json");
    let manifest = RunManifest {
        generated_at: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
        data_dir: &args.data_dir,
        params: &params,
        files,
        elapsed_ms: start.elapsed().as_millis() as u64,
    };
    write_json(&manifest_path, &manifest)?;

    println!("\nResults written to: {}", output_dir.display());
    Ok(())
}

fn per_employee(args: &ScenarioArgs, industry: &str, age_bracket: &str, tenure: u32) -> Result<()> {
    let params = ScenarioParams {
        include_base_year: true,
        ..args.params()?
    };
    let output = args.runner()?.run(&params).context("running scenario")?;
    let scenarios = fund_scenarios(&output.cohort_rows, &DEFAULT_SCENARIO_RATES);

    let benefit = per_employee_benefit(&scenarios, industry, age_bracket, params.start_year, tenure)
        .with_context(|| {
            format!(
                "no surviving {}_0 employees for {} / {} at tenure {}",
                params.start_year, industry, age_bracket, tenure
            )
        })?;

    println!(
        "Projected benefit per employee: {} / {}, {} years of service ({})",
        benefit.industry, benefit.age_bracket, benefit.tenure, benefit.year
    );
    for v in &benefit.values {
        println!("  {:>4.1}% return: {:>14.0}", v.return_rate * 100.0, v.per_employee);
    }
    if let Some(pct) = benefit.value_created_pct(0.06) {
        println!("  6% vs 0%: +{:.1}%", pct);
    }
    Ok(())
}

fn benefit(salary: f64, growth: f64, tenure: f64, fund_return_rate: f64) -> Result<()> {
    let estimate = estimate_benefit(&EmployeeProfile {
        previous_salary: salary,
        salary_growth_rate: growth,
        tenure_years: tenure,
        fund_return_rate,
    })?;

    println!("Current year salary: {:>14.0}", estimate.current_salary);
    println!("Unfunded EOS:        {:>14.0}", estimate.unfunded);
    println!("Funded EOS:          {:>14.0}", estimate.funded);
    println!("Return differential: {:>14.0}", estimate.return_differential);
    Ok(())
}

fn print_summary(summary: &SimulationSummary) {
    println!("\nSummary:");
    println!("  Cohorts: {}", summary.total_cohorts);
    println!("  Cohort-year rows: {}", summary.total_rows);
    println!("  Total exits: {:.0}", summary.total_exit_employee);
    println!("  Total contributions: {:.2}", summary.total_fund_contribution);
    println!("  Final employees: {:.0}", summary.final_employees);
    println!("  Final fund (no return): {:.2}", summary.final_no_return_balance);
    println!("  Final fund (with return): {:.2}", summary.final_with_return_balance);
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, value).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
