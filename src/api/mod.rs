//! Route table of the HTTP surface.
//!
//! `:key` segments accept a numeric Talana id or a RUT. Static segments such as
//! `basicos` or `rut` take precedence over `:key`.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{self, AppState};

/// Every `/api` route, without middleware.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Employees
        .route("/api/empleados", get(handlers::list_employees))
        .route(
            "/api/empleados/enriquecidos",
            get(handlers::list_employees_complete),
        )
        .route("/api/empleados/basicos", get(handlers::list_employees_basic))
        .route(
            "/api/empleados/vacaciones-actuales",
            get(handlers::current_vacations),
        )
        // Lookups by national id (query string)
        .route("/api/empleados/detalle", get(handlers::detail_by_rut_query))
        .route("/api/empleados/contrato", get(handlers::contract_by_rut_query))
        .route(
            "/api/empleados/vacaciones",
            get(handlers::vacation_balance_by_rut),
        )
        .route("/api/empleados/licencias", get(handlers::licenses_by_rut))
        .route(
            "/api/empleados/vacaciones-detalle",
            get(handlers::vacation_detail_by_rut),
        )
        .route(
            "/api/empleados/vacaciones-resumen",
            get(handlers::vacation_summary_by_rut),
        )
        .route("/api/empleados/rut/:rut/detalle", get(handlers::detail_by_rut))
        .route(
            "/api/empleados/rut/:rut/contrato",
            get(handlers::contract_by_rut),
        )
        // Lookups by id or national id
        .route("/api/empleados/:key", get(handlers::employee_by_key))
        .route("/api/empleados/:key/detalle", get(handlers::detail_by_key))
        .route("/api/empleados/:key/contrato", get(handlers::contract_by_key))
        .route(
            "/api/empleados/:key/centro-costo",
            get(handlers::cost_center_by_key),
        )
        .route("/api/empleados/:key/sucursal", get(handlers::branch_by_key))
        .route(
            "/api/empleados/:key/vacaciones",
            get(handlers::vacation_balance_by_key),
        )
        .route("/api/empleados/:key/licencias", get(handlers::licenses_by_key))
        .route(
            "/api/empleados/:key/vacaciones-detalle",
            get(handlers::vacation_detail_by_key),
        )
        .route(
            "/api/empleados/:key/vacaciones-resumen",
            get(handlers::vacation_summary_by_key),
        )
        // Contracts
        .route("/api/contratos/activos", get(handlers::active_contracts))
        .route(
            "/api/contratos/activos/refresh",
            post(handlers::refresh_active_contracts),
        )
        .route("/api/contratos/historico", get(handlers::historical_contracts))
        // Catalogs
        .route("/api/centros-costo", get(handlers::cost_centers))
        .route("/api/sucursales", get(handlers::branches))
        .route("/api/job-titles", get(handlers::job_titles))
        // Raw Talana proxies
        .route(
            "/api/talana/personas/paginado",
            get(handlers::raw_persons_page),
        )
        .route("/api/talana/personas/:id", get(handlers::raw_person))
        .route(
            "/api/talana/contratos/paginado",
            get(handlers::raw_contracts_page),
        )
        .route("/api/talana/contratos", post(handlers::raw_create_contract))
        .route(
            "/api/talana/contratos/:id",
            get(handlers::raw_contract).patch(handlers::raw_update_contract),
        )
        .route(
            "/api/talana/sucursales",
            get(handlers::raw_branches).post(handlers::raw_create_branch),
        )
        .route(
            "/api/talana/sucursales/:id",
            get(handlers::raw_branch).patch(handlers::raw_update_branch),
        )
        .route(
            "/api/talana/centros-costo",
            get(handlers::raw_cost_centers).post(handlers::raw_create_cost_center),
        )
        .route(
            "/api/talana/centros-costo/:id",
            get(handlers::raw_cost_center).patch(handlers::raw_update_cost_center),
        )
}

/// Health check plus every `/api` route, bound to `state`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(api_routes())
        .with_state(state)
}
