//! AWS Lambda handler for running EOSG projections
//!
//! Accepts scenario parameters as JSON and returns the run summary, the
//! industry-year aggregates and the economic impact tables. Inputs are loaded
//! once per container from `EOSG_DATA_DIR` and results are cached per scenario.
//!
//! Supports Lambda Function URLs for direct HTTP access as well as direct
//! invocation with the request JSON as the event payload.

use aws_lambda_events::event::lambda_function_urls::LambdaFunctionUrlRequest;
use eosg_projection::aggregate::{IndustryYearRow, IndustryYearTenureRow};
use eosg_projection::benefit::{estimate_benefit, BenefitEstimate, EmployeeProfile};
use eosg_projection::impact::{summarize_by_sector, ImpactRow, SectorImpactRow, YearFilter};
use eosg_projection::projection::{CohortYearRow, SimulationSummary};
use eosg_projection::scenario::{
    fund_scenarios, per_employee_benefit, PerEmployeeBenefit, ScenarioCache, ScenarioOutput,
    ScenarioParams, ScenarioRunner, DEFAULT_SCENARIO_RATES,
};
use eosg_projection::EosgError;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

const DATA_DIR_VAR: &str = "EOSG_DATA_DIR";

/// Request body
#[derive(Debug, Deserialize)]
pub struct ProjectionRequest {
    #[serde(flatten)]
    pub params: ScenarioParams,

    /// Return the full cohort-year table (large)
    #[serde(default)]
    pub include_cohort_rows: bool,

    /// Return the industry-year-tenure split
    #[serde(default)]
    pub include_tenure_split: bool,

    /// Restrict the sector summary to one year; whole horizon when absent
    #[serde(default)]
    pub sector_year: Option<i32>,

    /// Per-employee fund value of the start-year entrant cohort
    #[serde(default)]
    pub per_employee: Option<PerEmployeeQuery>,

    /// Single-employee benefit estimate; answered without running the pipeline
    #[serde(default)]
    pub benefit: Option<EmployeeProfile>,
}

#[derive(Debug, Deserialize)]
pub struct PerEmployeeQuery {
    pub industry: String,
    pub age_bracket: String,
    #[serde(default = "default_per_employee_tenure")]
    pub tenure: u32,
}

fn default_per_employee_tenure() -> u32 {
    5
}

/// Response body
#[derive(Debug, Serialize)]
pub struct ProjectionResponse {
    pub params: ScenarioParams,
    pub summary: SimulationSummary,
    pub industry_year: Vec<IndustryYearRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry_year_tenure: Option<Vec<IndustryYearTenureRow>>,
    pub impact: Vec<ImpactRow>,
    pub sector_summary: Vec<SectorImpactRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cohort_rows: Option<Vec<CohortYearRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_employee: Option<PerEmployeeBenefit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefit: Option<BenefitEstimate>,
    pub execution_time_ms: u64,
}

/// Per-container state
struct AppState {
    runner: ScenarioRunner,
    cache: Mutex<ScenarioCache>,
}

fn cors_headers() -> Value {
    json!({
        "Content-Type": "application/json",
        "Access-Control-Allow-Origin": "*",
        "Access-Control-Allow-Methods": "POST, OPTIONS",
        "Access-Control-Allow-Headers": "Content-Type",
    })
}

fn http_response(status: u16, body: String) -> Value {
    json!({
        "statusCode": status,
        "headers": cors_headers(),
        "body": body,
    })
}

fn error_response(status: u16, message: &str) -> Value {
    http_response(status, json!({ "error": message }).to_string())
}

fn status_for(err: &EosgError) -> u16 {
    match err {
        EosgError::Config(_) => 400,
        EosgError::Data(_) | EosgError::Json(_) => 500,
    }
}

/// Request JSON from a Function URL envelope, or the event itself
fn extract_body(event: Value) -> Result<Option<Value>, Value> {
    if event.get("requestContext").is_none() {
        return Ok(Some(event));
    }

    let request: LambdaFunctionUrlRequest = serde_json::from_value(event)
        .map_err(|e| error_response(400, &format!("Invalid Function URL event: {}", e)))?;

    if request.request_context.http.method.as_deref() == Some("OPTIONS") {
        return Ok(None);
    }
    if request.is_base64_encoded {
        return Err(error_response(400, "Base64-encoded bodies are not supported"));
    }

    match request.body.as_deref() {
        None | Some("") => Ok(Some(json!({}))),
        Some(body) => serde_json::from_str(body)
            .map(Some)
            .map_err(|e| error_response(400, &format!("Invalid JSON: {}", e))),
    }
}

fn handle(state: &AppState, request: ProjectionRequest) -> Result<ProjectionResponse, Value> {
    let start = Instant::now();

    let benefit = match &request.benefit {
        Some(profile) => Some(estimate_benefit(profile).map_err(|e| error_response(400, &e.to_string()))?),
        None => None,
    };

    let run_cached = |params: &ScenarioParams| -> Result<Arc<ScenarioOutput>, Value> {
        let mut cache = state
            .cache
            .lock()
            .map_err(|_| error_response(500, "Scenario cache unavailable"))?;
        cache
            .get_or_run(&state.runner, params)
            .map_err(|e| error_response(status_for(&e), &e.to_string()))
    };
    let output = run_cached(&request.params)?;

    let years = request.sector_year.map_or(YearFilter::Horizon, YearFilter::Year);
    let sector_summary = summarize_by_sector(&output.impact, years);

    let per_employee = match &request.per_employee {
        Some(q) => {
            // Contribution streams must start at the first cohort year
            let full = if output.params.include_base_year {
                Arc::clone(&output)
            } else {
                run_cached(&ScenarioParams {
                    include_base_year: true,
                    ..request.params.clone()
                })?
            };
            let scenarios = fund_scenarios(&full.cohort_rows, &DEFAULT_SCENARIO_RATES);
            per_employee_benefit(&scenarios, &q.industry, &q.age_bracket, output.params.start_year, q.tenure)
        }
        None => None,
    };

    let elapsed = start.elapsed().as_millis() as u64;
    log::info!(
        "scenario r={} leakage={} {}..={} served in {}ms",
        output.params.fund_return_rate,
        output.params.leakage_rate,
        output.params.start_year,
        output.params.end_year,
        elapsed
    );

    Ok(ProjectionResponse {
        params: output.params.clone(),
        summary: output.summary.clone(),
        industry_year: output.industry_year.clone(),
        industry_year_tenure: request.include_tenure_split.then(|| output.industry_year_tenure.clone()),
        impact: output.impact.clone(),
        sector_summary,
        cohort_rows: request.include_cohort_rows.then(|| output.cohort_rows.clone()),
        per_employee,
        benefit,
        execution_time_ms: elapsed,
    })
}

async fn handler(state: Arc<AppState>, event: LambdaEvent<Value>) -> Result<Value, Error> {
    let body = match extract_body(event.payload) {
        Ok(Some(body)) => body,
        Ok(None) => return Ok(http_response(200, String::new())),
        Err(response) => return Ok(response),
    };

    let request: ProjectionRequest = match serde_json::from_value(body) {
        Ok(r) => r,
        Err(e) => return Ok(error_response(400, &format!("Invalid request: {}", e))),
    };

    let response = match handle(&state, request) {
        Ok(r) => r,
        Err(response) => return Ok(response),
    };

    match serde_json::to_string(&response) {
        Ok(body) => Ok(http_response(200, body)),
        Err(e) => Ok(error_response(500, &format!("Serialization error: {}", e))),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let data_dir = std::env::var(DATA_DIR_VAR).map_or_else(|_| PathBuf::from("data"), PathBuf::from);
    log::info!("loading inputs from {}", data_dir.display());

    let state = Arc::new(AppState {
        runner: ScenarioRunner::from_csv_path(&data_dir)?,
        cache: Mutex::new(ScenarioCache::new()),
    });

    run(service_fn(move |event: LambdaEvent<Value>| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
