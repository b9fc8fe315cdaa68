use crate::config::Config;
use crate::date_window::DateWindow;
use crate::enrichment::TalanaService;
use crate::errors::AppError;
use crate::models::*;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Cached, rate-limited access to Talana.
    pub talana: Arc<TalanaService>,
}

impl AppState {
    pub fn new(config: Config, talana: TalanaService) -> Self {
        Self {
            config,
            talana: Arc::new(talana),
        }
    }
}

/// Raw upstream body served as JSON.
fn raw_json(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

fn json_body(bytes: &Bytes) -> Result<Value, AppError> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(AppError::BadRequest("Missing JSON body".to_string()));
    }
    serde_json::from_slice(bytes)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {}", e)))
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Health check endpoint.
///
/// # Arguments
///
/// * `state` - The application state.
///
/// # Returns
///
/// * `(StatusCode, Json<HealthResponse>)` - HTTP 200 OK with the current server time,
///   the upstream request spacing and the warmup schedule.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let min_interval = state.talana.client().limiter().min_interval();
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            timestamp: now_rfc3339(),
            talana_min_interval_ms: min_interval.as_millis() as u64,
            warmup_hour_utc: state.config.warmup_hour_utc,
        }),
    )
}

// ============ Employees ============

/// GET /api/empleados
///
/// Complete employees. With both `limit` and `offset` only that window of basic
/// records is returned, without enrichment.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `params` - Optional `limit`/`offset` window.
///
/// # Returns
///
/// * `Result<Response, AppError>` - A JSON array of employees or an error.
pub async fn list_employees(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitOffsetQuery>,
) -> Result<Response, AppError> {
    tracing::info!("GET /api/empleados - params: {:?}", params);

    match params.window() {
        Some((limit, offset)) => {
            let page = state.talana.employees_basic_page(limit, offset).await?;
            Ok(Json(page).into_response())
        }
        None => {
            let employees = state.talana.employees_complete(None).await?;
            tracing::info!("Returning {} complete employees", employees.len());
            Ok(Json(employees).into_response())
        }
    }
}

/// GET /api/empleados/enriquecidos
pub async fn list_employees_complete(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitOffsetQuery>,
) -> Result<Json<Vec<EmployeeDetail>>, AppError> {
    tracing::info!("GET /api/empleados/enriquecidos - params: {:?}", params);
    Ok(Json(state.talana.employees_complete(params.window()).await?))
}

/// GET /api/empleados/basicos
pub async fn list_employees_basic(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitOffsetQuery>,
) -> Result<Json<Vec<Employee>>, AppError> {
    tracing::info!("GET /api/empleados/basicos - params: {:?}", params);
    let employees = match params.window() {
        Some((limit, offset)) => state.talana.employees_basic_page(limit, offset).await?,
        None => state.talana.employees_basic(params.force).await?,
    };
    Ok(Json(employees))
}

/// GET /api/empleados/vacaciones-actuales
///
/// Employees on vacation within `desde`..`hasta` (today by default). Only approved
/// or not-yet-decided vacations unless `soloAprobadas=false`.
pub async fn current_vacations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CurrentVacationsQuery>,
) -> Result<Json<Vec<VacationSummary>>, AppError> {
    tracing::info!("GET /api/empleados/vacaciones-actuales - params: {:?}", params);
    let vacations = state
        .talana
        .current_vacations(
            params.desde.as_deref(),
            params.hasta.as_deref(),
            params.solo_aprobadas,
        )
        .await?;
    Ok(Json(vacations))
}

// ============ Lookups by national id ============

/// GET /api/empleados/detalle?rut=
pub async fn detail_by_rut_query(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RutQuery>,
) -> Result<Json<EmployeeDetail>, AppError> {
    detail_for_rut(&state, &params.rut).await
}

/// GET /api/empleados/rut/:rut/detalle
pub async fn detail_by_rut(
    State(state): State<Arc<AppState>>,
    Path(rut): Path<String>,
) -> Result<Json<EmployeeDetail>, AppError> {
    detail_for_rut(&state, &rut).await
}

async fn detail_for_rut(state: &AppState, rut: &str) -> Result<Json<EmployeeDetail>, AppError> {
    tracing::info!("Detail lookup for rut {}", rut);
    let id = state.talana.resolve_employee_id(rut).await?;
    Ok(Json(state.talana.person_detail(id).await?))
}

/// GET /api/empleados/contrato?rut=
pub async fn contract_by_rut_query(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RutQuery>,
) -> Result<Json<Contract>, AppError> {
    tracing::info!("Contract lookup for rut {}", params.rut);
    Ok(Json(state.talana.contract_by_rut(&params.rut).await?))
}

/// GET /api/empleados/rut/:rut/contrato
pub async fn contract_by_rut(
    State(state): State<Arc<AppState>>,
    Path(rut): Path<String>,
) -> Result<Json<Contract>, AppError> {
    tracing::info!("Contract lookup for rut {}", rut);
    Ok(Json(state.talana.contract_by_rut(&rut).await?))
}

/// GET /api/empleados/vacaciones?rut=
pub async fn vacation_balance_by_rut(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RutQuery>,
) -> Result<Json<VacationBalance>, AppError> {
    let id = state.talana.resolve_employee_id(&params.rut).await?;
    Ok(Json(state.talana.vacation_balance(id).await?))
}

/// GET /api/empleados/licencias?rut=
pub async fn licenses_by_rut(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RutQuery>,
) -> Result<Json<Vec<LeaveRecord>>, AppError> {
    let id = state.talana.resolve_employee_id(&params.rut).await?;
    Ok(Json(state.talana.licenses(id).await?))
}

/// GET /api/empleados/vacaciones-detalle?rut=&desde=&hasta=
pub async fn vacation_detail_by_rut(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RutQuery>,
) -> Result<Json<Vec<LeaveRecord>>, AppError> {
    let id = state.talana.resolve_employee_id(&params.rut).await?;
    let window = DateWindow::parse(params.desde.as_deref(), params.hasta.as_deref());
    Ok(Json(window.filter(state.talana.vacation_detail(id).await?)))
}

/// GET /api/empleados/vacaciones-resumen?rut=&desde=&hasta=
pub async fn vacation_summary_by_rut(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RutQuery>,
) -> Result<Json<Vec<VacationSummary>>, AppError> {
    let id = state.talana.resolve_employee_id(&params.rut).await?;
    let window = DateWindow::parse(params.desde.as_deref(), params.hasta.as_deref());
    Ok(Json(window.filter(state.talana.vacation_summary(id).await?)))
}

// ============ Lookups by id or national id ============

/// GET /api/empleados/:key
///
/// # Arguments
///
/// * `state` - The application state.
/// * `key` - Numeric Talana id, or a RUT.
///
/// # Returns
///
/// * `Result<Json<EmployeeDetail>, AppError>` - The complete employee, or 404 when the
///   key cannot be resolved.
pub async fn employee_by_key(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<EmployeeDetail>, AppError> {
    tracing::info!("GET /api/empleados/{}", key);
    Ok(Json(state.talana.employee_by_key(&key).await?))
}

/// GET /api/empleados/:key/detalle
pub async fn detail_by_key(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<EmployeeDetail>, AppError> {
    tracing::info!("GET /api/empleados/{}/detalle", key);
    let id = state.talana.resolve_key(&key).await?;
    Ok(Json(state.talana.person_detail(id).await?))
}

/// GET /api/empleados/:key/contrato
pub async fn contract_by_key(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<Contract>, AppError> {
    tracing::info!("GET /api/empleados/{}/contrato", key);
    let id = state.talana.resolve_key(&key).await?;
    Ok(Json(state.talana.contract_by_employee(id).await?))
}

/// GET /api/empleados/:key/centro-costo
pub async fn cost_center_by_key(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<CostCenter>, AppError> {
    let id = state.talana.resolve_key(&key).await?;
    Ok(Json(state.talana.cost_center_of(id).await?))
}

/// GET /api/empleados/:key/sucursal
pub async fn branch_by_key(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<Branch>, AppError> {
    let id = state.talana.resolve_key(&key).await?;
    Ok(Json(state.talana.branch_of(id).await?))
}

pub async fn vacation_balance_by_key(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<VacationBalance>, AppError> {
    let id = state.talana.resolve_key(&key).await?;
    Ok(Json(state.talana.vacation_balance(id).await?))
}

pub async fn licenses_by_key(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<Vec<LeaveRecord>>, AppError> {
    let id = state.talana.resolve_key(&key).await?;
    Ok(Json(state.talana.licenses(id).await?))
}

pub async fn vacation_detail_by_key(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<Vec<LeaveRecord>>, AppError> {
    let id = state.talana.resolve_key(&key).await?;
    let window = DateWindow::parse(range.desde.as_deref(), range.hasta.as_deref());
    Ok(Json(window.filter(state.talana.vacation_detail(id).await?)))
}

pub async fn vacation_summary_by_key(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<Vec<VacationSummary>>, AppError> {
    let id = state.talana.resolve_key(&key).await?;
    let window = DateWindow::parse(range.desde.as_deref(), range.hasta.as_deref());
    Ok(Json(window.filter(state.talana.vacation_summary(id).await?)))
}

// ============ Contracts ============

/// GET /api/contratos/activos
///
/// Without `page` the whole cached snapshot is returned (`force=true` refetches it);
/// with `page` a single uncached page.
pub async fn active_contracts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ActiveContractsQuery>,
) -> Result<Json<Vec<ContractSummary>>, AppError> {
    tracing::info!("GET /api/contratos/activos - params: {:?}", params);
    let contracts = state
        .talana
        .active_contracts(params.page, params.page_size, params.force)
        .await?;
    Ok(Json(contracts))
}

/// POST /api/contratos/activos/refresh
pub async fn refresh_active_contracts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RefreshResponse>, AppError> {
    tracing::info!("POST /api/contratos/activos/refresh");
    let count = state.talana.refresh_active_contracts().await?;
    Ok(Json(RefreshResponse {
        refreshed: true,
        count,
        timestamp: now_rfc3339(),
    }))
}

/// GET /api/contratos/historico
pub async fn historical_contracts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoricalContractsQuery>,
) -> Result<Json<Vec<ContractSummary>>, AppError> {
    tracing::info!("GET /api/contratos/historico - params: {:?}", params);
    let contracts = state
        .talana
        .historical_contracts(
            params.search_since.as_deref(),
            params.search_to.as_deref(),
            params.page_size,
        )
        .await?;
    Ok(Json(contracts))
}

// ============ Catalogs ============

pub async fn cost_centers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitOffsetQuery>,
) -> Result<Json<Vec<CostCenter>>, AppError> {
    Ok(Json(
        state.talana.cost_centers(params.window(), params.force).await?,
    ))
}

pub async fn branches(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitOffsetQuery>,
) -> Result<Json<Vec<Branch>>, AppError> {
    Ok(Json(state.talana.branches(params.window(), params.force).await?))
}

pub async fn job_titles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitOffsetQuery>,
) -> Result<Json<Vec<JobTitle>>, AppError> {
    Ok(Json(
        state.talana.job_titles(params.window(), params.force).await?,
    ))
}

// ============ Raw Talana proxies ============
//
// Bodies are passed through untouched.

/// GET /api/talana/personas/paginado
pub async fn raw_persons_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RawPageQuery>,
) -> Result<Response, AppError> {
    let query = [
        ("page", params.page.unwrap_or(1).max(1).to_string()),
        ("page_size", params.page_size.unwrap_or(50).max(1).to_string()),
    ];
    let body = state.talana.client().personas_paginated(&query).await?;
    Ok(raw_json(body))
}

pub async fn raw_person(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    Ok(raw_json(state.talana.client().persona_detail(id).await?))
}

/// GET /api/talana/contratos/paginado
pub async fn raw_contracts_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RawPageQuery>,
) -> Result<Response, AppError> {
    let query = [
        ("page", params.page.unwrap_or(1).max(1).to_string()),
        ("page_size", params.page_size.unwrap_or(50).max(1).to_string()),
        ("show_version", "last".to_string()),
    ];
    let body = state.talana.client().contracts_paginated(&query).await?;
    Ok(raw_json(body))
}

pub async fn raw_contract(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    Ok(raw_json(state.talana.client().contract_detail(id).await?))
}

pub async fn raw_create_contract(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, AppError> {
    let payload = json_body(&body)?;
    Ok(raw_json(state.talana.client().write("contrato", None, &payload).await?))
}

pub async fn raw_update_contract(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Response, AppError> {
    let payload = json_body(&body)?;
    Ok(raw_json(
        state.talana.client().write("contrato", Some(id), &payload).await?,
    ))
}

pub async fn raw_branches(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitOffsetQuery>,
) -> Result<Response, AppError> {
    let query = crate::talana_client::limit_offset_query(params.window());
    Ok(raw_json(state.talana.client().branches(&query).await?))
}

pub async fn raw_branch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    Ok(raw_json(state.talana.client().branch_detail(id).await?))
}

pub async fn raw_create_branch(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, AppError> {
    let payload = json_body(&body)?;
    Ok(raw_json(state.talana.client().write("sucursal", None, &payload).await?))
}

pub async fn raw_update_branch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Response, AppError> {
    let payload = json_body(&body)?;
    Ok(raw_json(
        state.talana.client().write("sucursal", Some(id), &payload).await?,
    ))
}

pub async fn raw_cost_centers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitOffsetQuery>,
) -> Result<Response, AppError> {
    let query = crate::talana_client::limit_offset_query(params.window());
    Ok(raw_json(state.talana.client().cost_centers(&query).await?))
}

pub async fn raw_cost_center(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    Ok(raw_json(state.talana.client().cost_center_detail(id).await?))
}

pub async fn raw_create_cost_center(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, AppError> {
    let payload = json_body(&body)?;
    Ok(raw_json(
        state.talana.client().write_cost_center(None, &payload).await?,
    ))
}

pub async fn raw_update_cost_center(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Response, AppError> {
    let payload = json_body(&body)?;
    Ok(raw_json(
        state.talana.client().write_cost_center(Some(id), &payload).await?,
    ))
}
