use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    ContributionPlan, ContributionRange, CustomRangeBounds, CustomRangeOutcome,
    DynamicRangeConfig, InvestmentMode, ProjectionError, ProjectionResult, RateTable,
    SchedulePoint, compute_symmetric_range, custom_range_bounds, project, project_schedule,
    resolve_bucket, validate_custom_range,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliInvestmentMode {
    Systematic,
    Lumpsum,
}

impl From<CliInvestmentMode> for InvestmentMode {
    fn from(value: CliInvestmentMode) -> Self {
        match value {
            CliInvestmentMode::Systematic => InvestmentMode::Systematic,
            CliInvestmentMode::Lumpsum => InvestmentMode::Lumpsum,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiInvestmentMode {
    #[serde(alias = "sip")]
    Systematic,
    #[serde(alias = "one-time", alias = "oneTime", alias = "lumpSum")]
    Lumpsum,
}

impl From<ApiInvestmentMode> for CliInvestmentMode {
    fn from(value: ApiInvestmentMode) -> Self {
        match value {
            ApiInvestmentMode::Systematic => CliInvestmentMode::Systematic,
            ApiInvestmentMode::Lumpsum => CliInvestmentMode::Lumpsum,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "sip-projection",
    about = "SIP and lumpsum maturity projections with dynamic contribution bands"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the projection engine as a JSON API
    Serve(ServeArgs),
    /// Print a single projection as JSON
    Project(ProjectArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    host: IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
    #[arg(long, help = "JSON rate table overriding the built-in horizon buckets")]
    rate_table: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct ProjectArgs {
    #[arg(long, help = "Monthly SIP amount, or the one-time amount for lumpsum")]
    amount: f64,
    #[arg(long, allow_negative_numbers = true, help = "Investment duration in months")]
    months: i64,
    #[arg(long, value_enum, default_value_t = CliInvestmentMode::Systematic)]
    mode: CliInvestmentMode,
    #[arg(
        long,
        help = "Total width of a symmetric contribution band in percent (10-50)"
    )]
    flexibility_percent: Option<f64>,
    #[arg(long, requires = "custom_max", help = "Lowest monthly contribution of a custom band")]
    custom_min: Option<f64>,
    #[arg(long, requires = "custom_min", help = "Highest monthly contribution of a custom band")]
    custom_max: Option<f64>,
    #[arg(long, help = "Include the year-by-year growth schedule")]
    schedule: bool,
    #[arg(long, help = "JSON rate table overriding the built-in horizon buckets")]
    rate_table: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    amount: Option<f64>,
    months: Option<i64>,
    mode: Option<ApiInvestmentMode>,
    flexibility_percent: Option<f64>,
    custom_min: Option<f64>,
    custom_max: Option<f64>,
    include_schedule: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RatePayload {
    months: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SymmetricRangePayload {
    amount: Option<f64>,
    flexibility_percent: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CustomRangePayload {
    amount: Option<f64>,
    custom_min: Option<f64>,
    custom_max: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct BoundsPayload {
    amount: Option<f64>,
}

#[derive(Debug, Clone)]
struct ProjectRequest {
    plan: ContributionPlan,
    range: Option<DynamicRangeConfig>,
    include_schedule: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    mode: InvestmentMode,
    base_amount: f64,
    horizon_months: u32,
    rate_bucket: String,
    #[serde(flatten)]
    projection: ProjectionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule: Option<Vec<SchedulePoint>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RateResponse {
    horizon_months: u32,
    rate_bucket: String,
    annual_rate: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SymmetricRangeResponse {
    base_amount: f64,
    flexibility_percent: f64,
    range: ContributionRange,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CustomRangeResponse {
    base_amount: f64,
    #[serde(flatten)]
    outcome: CustomRangeOutcome,
    bounds: CustomRangeBounds,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    code: Option<&'static str>,
}

#[derive(Debug, Error)]
enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Engine(#[from] ProjectionError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Engine(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn code(&self) -> Option<&'static str> {
        match self {
            ApiError::BadRequest(_) => None,
            ApiError::Engine(err) => Some(err.code()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        json_response(
            self.status(),
            ErrorResponse {
                error: self.to_string(),
                code: self.code(),
            },
        )
    }
}

pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Serve(args) => {
            let rate_table = load_rate_table(args.rate_table.as_deref())?;
            run_http_server(SocketAddr::new(args.host, args.port), rate_table).await?;
        }
        Command::Project(args) => {
            let rate_table = load_rate_table(args.rate_table.as_deref())?;
            let request = build_request(args)?;
            let response = run_projection(&request, &rate_table)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }
    Ok(())
}

fn load_rate_table(path: Option<&Path>) -> Result<RateTable, ProjectionError> {
    match path {
        Some(path) => {
            let table = RateTable::load(path)?;
            info!(
                path = %path.display(),
                buckets = table.buckets().len(),
                "loaded rate table"
            );
            Ok(table)
        }
        None => Ok(RateTable::default()),
    }
}

/// Longest horizon accepted from the CLI or HTTP API (100 years).
const MAX_HORIZON_MONTHS: u32 = 1_200;

fn horizon_from(months: i64) -> Result<u32, ProjectionError> {
    if months <= 0 {
        return Err(ProjectionError::InvalidHorizon { months });
    }
    match u32::try_from(months) {
        Ok(horizon) if horizon <= MAX_HORIZON_MONTHS => Ok(horizon),
        _ => Err(ProjectionError::HorizonTooLong {
            months,
            max: MAX_HORIZON_MONTHS,
        }),
    }
}

fn positive_amount(amount: Option<f64>, name: &str) -> Result<f64, ApiError> {
    let Some(amount) = amount else {
        return Err(ApiError::BadRequest(format!("{name} is required")));
    };
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ProjectionError::InvalidAmount { amount }.into());
    }
    Ok(amount)
}

fn build_request(args: ProjectArgs) -> Result<ProjectRequest, ApiError> {
    let horizon_months = horizon_from(args.months)?;

    let range = match (args.custom_min, args.custom_max) {
        (Some(custom_min), Some(custom_max)) => Some(DynamicRangeConfig::Custom {
            custom_min,
            custom_max,
        }),
        (None, None) => match args.flexibility_percent {
            Some(flexibility_percent) if !flexibility_percent.is_finite() => {
                return Err(ApiError::BadRequest(
                    "--flexibility-percent must be a finite number".to_string(),
                ));
            }
            Some(flexibility_percent) => Some(DynamicRangeConfig::Symmetric {
                flexibility_percent,
            }),
            None => None,
        },
        _ => {
            return Err(ApiError::BadRequest(
                "--custom-min and --custom-max must be supplied together".to_string(),
            ));
        }
    };

    if let Some(DynamicRangeConfig::Symmetric {
        flexibility_percent,
    }) = range
    {
        if !(10.0..=50.0).contains(&flexibility_percent) {
            warn!(
                flexibility_percent,
                "flexibility outside the 10-50% slider range; projecting as given"
            );
        }
    }

    Ok(ProjectRequest {
        plan: ContributionPlan {
            base_amount: args.amount,
            horizon_months,
            mode: args.mode.into(),
        },
        range,
        include_schedule: args.schedule,
    })
}

fn run_projection(
    request: &ProjectRequest,
    rate_table: &RateTable,
) -> Result<ProjectResponse, ProjectionError> {
    let rate_bucket = resolve_bucket(request.plan.horizon_months, rate_table)?
        .label
        .to_string();
    let projection = project(&request.plan, rate_table, request.range.as_ref())?;
    let schedule = if request.include_schedule {
        Some(project_schedule(
            &request.plan,
            rate_table,
            request.range.as_ref(),
        )?)
    } else {
        None
    };

    Ok(ProjectResponse {
        mode: request.plan.mode,
        base_amount: request.plan.base_amount,
        horizon_months: request.plan.horizon_months,
        rate_bucket,
        projection,
        schedule,
    })
}

pub async fn run_http_server(addr: SocketAddr, rate_table: RateTable) -> std::io::Result<()> {
    let app = router(Arc::new(rate_table));

    let listener = TcpListener::bind(addr).await?;
    info!("SIP projection API listening on http://{addr}");

    axum::serve(listener, app).await
}

fn router(rate_table: Arc<RateTable>) -> Router {
    Router::new()
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route("/api/rate", get(rate_handler))
        .route("/api/range/symmetric", get(symmetric_range_handler))
        .route(
            "/api/range/custom",
            get(custom_range_get_handler).post(custom_range_post_handler),
        )
        .route("/api/range/bounds", get(bounds_handler))
        .fallback(not_found_handler)
        .with_state(rate_table)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(
    State(rate_table): State<Arc<RateTable>>,
    Query(payload): Query<ProjectPayload>,
) -> Response {
    project_handler_impl(&rate_table, payload)
}

async fn project_post_handler(
    State(rate_table): State<Arc<RateTable>>,
    Json(payload): Json<ProjectPayload>,
) -> Response {
    project_handler_impl(&rate_table, payload)
}

fn project_handler_impl(rate_table: &RateTable, payload: ProjectPayload) -> Response {
    let result = project_request_from_payload(payload)
        .and_then(|request| run_projection(&request, rate_table).map_err(ApiError::from));
    match result {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => err.into_response(),
    }
}

async fn rate_handler(
    State(rate_table): State<Arc<RateTable>>,
    Query(payload): Query<RatePayload>,
) -> Response {
    match rate_response(&rate_table, payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => err.into_response(),
    }
}

fn rate_response(rate_table: &RateTable, payload: RatePayload) -> Result<RateResponse, ApiError> {
    let months = payload
        .months
        .ok_or_else(|| ApiError::BadRequest("months is required".to_string()))?;
    let horizon_months = horizon_from(months)?;
    let resolved = resolve_bucket(horizon_months, rate_table)?;
    Ok(RateResponse {
        horizon_months,
        rate_bucket: resolved.label.to_string(),
        annual_rate: resolved.rate,
    })
}

async fn symmetric_range_handler(Query(payload): Query<SymmetricRangePayload>) -> Response {
    match symmetric_range_response(payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => err.into_response(),
    }
}

fn symmetric_range_response(
    payload: SymmetricRangePayload,
) -> Result<SymmetricRangeResponse, ApiError> {
    let base_amount = positive_amount(payload.amount, "amount")?;
    let flexibility_percent = payload
        .flexibility_percent
        .ok_or_else(|| ApiError::BadRequest("flexibilityPercent is required".to_string()))?;
    Ok(SymmetricRangeResponse {
        base_amount,
        flexibility_percent,
        range: compute_symmetric_range(base_amount, flexibility_percent),
    })
}

async fn custom_range_get_handler(Query(payload): Query<CustomRangePayload>) -> Response {
    custom_range_handler_impl(payload)
}

async fn custom_range_post_handler(Json(payload): Json<CustomRangePayload>) -> Response {
    custom_range_handler_impl(payload)
}

fn custom_range_handler_impl(payload: CustomRangePayload) -> Response {
    match custom_range_response(payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => err.into_response(),
    }
}

fn custom_range_response(payload: CustomRangePayload) -> Result<CustomRangeResponse, ApiError> {
    let base_amount = positive_amount(payload.amount, "amount")?;
    let (Some(custom_min), Some(custom_max)) = (payload.custom_min, payload.custom_max) else {
        return Err(ApiError::BadRequest(
            "customMin and customMax are both required".to_string(),
        ));
    };
    let outcome = validate_custom_range(base_amount, custom_min, custom_max)?;
    Ok(CustomRangeResponse {
        base_amount,
        outcome,
        bounds: custom_range_bounds(base_amount),
    })
}

async fn bounds_handler(Query(payload): Query<BoundsPayload>) -> Response {
    match positive_amount(payload.amount, "amount") {
        Ok(base_amount) => json_response(StatusCode::OK, custom_range_bounds(base_amount)),
        Err(err) => err.into_response(),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
            code: None,
        },
    )
}

#[cfg(test)]
fn project_request_from_json(json: &str) -> Result<ProjectRequest, ApiError> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| ApiError::BadRequest(format!("Invalid API JSON payload: {e}")))?;
    project_request_from_payload(payload)
}

fn project_request_from_payload(payload: ProjectPayload) -> Result<ProjectRequest, ApiError> {
    let amount = payload
        .amount
        .ok_or_else(|| ApiError::BadRequest("amount is required".to_string()))?;
    let months = payload
        .months
        .ok_or_else(|| ApiError::BadRequest("months is required".to_string()))?;

    build_request(ProjectArgs {
        amount,
        months,
        mode: payload
            .mode
            .map(CliInvestmentMode::from)
            .unwrap_or(CliInvestmentMode::Systematic),
        flexibility_percent: payload.flexibility_percent,
        custom_min: payload.custom_min,
        custom_max: payload.custom_max,
        schedule: payload.include_schedule.unwrap_or(false),
        rate_table: None,
    })
}
