//! HTTP API for the Payroll Engine.
//!
//! This module exposes the engine over a small REST API built with
//! [`axum`](https://crates.io/crates/axum).  Form and view clients post
//! salary components, leave ranges or request amounts and receive the
//! computed result as JSON.  The finance settings loaded at startup can
//! be read and replaced through `/api/settings`.

use crate::allowance::calculate_default_allowances;
use crate::calendar::{calculate_working_days, HolidayProvider, JsonFileHolidays, StaticHolidays};
use crate::config::{load_finance_settings, AppConfig};
use crate::engine::{calculate_payroll, run_payroll};
use crate::error::{PayrollError, Result};
use crate::models::{Allowances, FinanceSettings, PayRunInput, PayRunResult, PayrollCalculation, SalaryComponents};
use crate::requests::{validate_advance_request, validate_medical_reimbursement, AdvancePlan};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Application state shared across requests.
pub struct AppState {
    pub settings: RwLock<FinanceSettings>,
    pub holidays: Arc<dyn HolidayProvider>,
}

impl AppState {
    pub fn new(settings: FinanceSettings, holidays: Arc<dyn HolidayProvider>) -> Arc<Self> {
        Arc::new(Self {
            settings: RwLock::new(settings),
            holidays,
        })
    }
}

impl IntoResponse for PayrollError {
    fn into_response(self) -> Response {
        let status = match &self {
            PayrollError::Configuration(_)
            | PayrollError::InvalidInput { .. }
            | PayrollError::LimitExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            PayrollError::RequestBody { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST)
            }
            PayrollError::Holidays(_) => StatusCode::BAD_GATEWAY,
            PayrollError::Json(_) => StatusCode::BAD_REQUEST,
            PayrollError::Internal(_) | PayrollError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(error = %self, "request failed");
        }
        let body = Json(serde_json::json!({"error": self.to_string()}));
        (status, body).into_response()
    }
}

/// Unwraps a JSON body, turning axum's plain-text rejection into a
/// [`PayrollError`] so every failure carries the same `{"error": ...}` body.
fn extract_json<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| PayrollError::RequestBody {
            status: rejection.status().as_u16(),
            message: rejection.body_text(),
        })
}

#[derive(Debug, Deserialize)]
pub struct DefaultAllowancesRequest {
    #[serde(default)]
    pub is_manager: bool,
}

#[derive(Debug, Deserialize)]
pub struct WorkingDaysRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorkingDaysResponse {
    pub working_days: u32,
}

#[derive(Debug, Deserialize)]
pub struct AdvanceRequest {
    pub amount: f64,
    pub installments: u32,
}

#[derive(Debug, Deserialize)]
pub struct ReimbursementRequest {
    pub amount: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReimbursementResponse {
    pub approved_amount: f64,
}

/// Loads finance settings and the holiday source named by `config`.
pub fn load_state(config: &AppConfig) -> Result<Arc<AppState>> {
    let settings = load_finance_settings(&config.settings_path)?;
    let holidays: Arc<dyn HolidayProvider> = match &config.holidays_path {
        Some(path) => {
            info!(path = %path.display(), "reading holidays from file");
            Arc::new(JsonFileHolidays::new(path.clone()))
        }
        None => {
            warn!("no holidays file configured; only weekends are excluded");
            Arc::new(StaticHolidays::default())
        }
    };
    Ok(AppState::new(settings, holidays))
}

/// Build the API router over the given state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/settings", get(get_settings_handler).put(put_settings_handler))
        .route("/api/payroll/calculate", post(calculate_handler))
        .route("/api/payroll/run", post(run_handler))
        .route("/api/allowances/default", post(default_allowances_handler))
        .route("/api/working-days", post(working_days_handler))
        .route("/api/advances/validate", post(advance_handler))
        .route("/api/reimbursements/validate", post(reimbursement_handler))
        .with_state(state)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

async fn get_settings_handler(State(state): State<Arc<AppState>>) -> Json<FinanceSettings> {
    Json(state.settings.read().await.clone())
}

/// Handler for PUT /api/settings.  The bracket schedule is validated
/// while the body is parsed; rates and caps are checked here.
async fn put_settings_handler(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<FinanceSettings>, JsonRejection>,
) -> Result<Json<FinanceSettings>> {
    let settings = extract_json(body)?;
    settings.validate()?;
    *state.settings.write().await = settings.clone();
    info!(
        brackets = settings.tax_brackets.brackets().len(),
        "finance settings updated"
    );
    Ok(Json(settings))
}

/// Handler for POST /api/payroll/calculate
async fn calculate_handler(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<SalaryComponents>, JsonRejection>,
) -> Result<Json<PayrollCalculation>> {
    let components = extract_json(body)?;
    let settings = state.settings.read().await;
    calculate_payroll(&components, &settings).map(Json)
}

/// Handler for POST /api/payroll/run.  The batch runs on the blocking
/// pool against a snapshot of the settings, so a large run neither stalls
/// the runtime nor holds the settings lock.
async fn run_handler(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<PayRunInput>, JsonRejection>,
) -> Result<Json<PayRunResult>> {
    let input = extract_json(body)?;
    let settings = state.settings.read().await.clone();
    tokio::task::spawn_blocking(move || run_payroll(input, &settings))
        .await
        .map_err(|err| PayrollError::Internal(format!("payroll run aborted: {err}")))?
        .map(Json)
}

async fn default_allowances_handler(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<DefaultAllowancesRequest>, JsonRejection>,
) -> Result<Json<Allowances>> {
    let request = extract_json(body)?;
    let settings = state.settings.read().await;
    Ok(Json(calculate_default_allowances(request.is_manager, &settings)))
}

async fn working_days_handler(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<WorkingDaysRequest>, JsonRejection>,
) -> Result<Json<WorkingDaysResponse>> {
    let request = extract_json(body)?;
    let working_days =
        calculate_working_days(request.start_date, request.end_date, state.holidays.as_ref())
            .await?;
    Ok(Json(WorkingDaysResponse { working_days }))
}

async fn advance_handler(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<AdvanceRequest>, JsonRejection>,
) -> Result<Json<AdvancePlan>> {
    let request = extract_json(body)?;
    let settings = state.settings.read().await;
    validate_advance_request(request.amount, request.installments, &settings).map(Json)
}

async fn reimbursement_handler(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<ReimbursementRequest>, JsonRejection>,
) -> Result<Json<ReimbursementResponse>> {
    let request = extract_json(body)?;
    let settings = state.settings.read().await;
    let approved_amount = validate_medical_reimbursement(request.amount, &settings)?;
    Ok(Json(ReimbursementResponse { approved_amount }))
}

/// Launch the API server.  Loads settings and holidays from `config`,
/// binds to its address and runs until the server terminates.
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let state = load_state(&config)?;
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "server listening");
    axum::serve(listener, router).await?;
    Ok(())
}
