use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============ Talana Records ============
//
// Field names are English in Rust; the JSON names stay in the Spanish camelCase the
// front-end reads.

/// Basic employee record as listed by `persona-paginado`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Talana person id.
    pub id: Option<i64>,
    /// National id (RUT), compared case-insensitively.
    pub rut: Option<String>,
    /// Given name.
    #[serde(rename = "nombre")]
    pub first_name: Option<String>,
    /// Paternal surname.
    #[serde(rename = "apellidoPaterno")]
    pub paternal_surname: Option<String>,
    /// Maternal surname.
    #[serde(rename = "apellidoMaterno")]
    pub maternal_surname: Option<String>,
}

impl Employee {
    /// True when the national id matches, ignoring case and surrounding spaces.
    pub fn has_rut(&self, rut: &str) -> bool {
        self.rut
            .as_deref()
            .is_some_and(|own| own.trim().eq_ignore_ascii_case(rut.trim()))
    }
}

/// Cost center catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostCenter {
    pub id: Option<i64>,
    #[serde(rename = "codigo")]
    pub code: Option<String>,
    #[serde(rename = "nombre")]
    pub name: Option<String>,
}

/// Branch (sucursal) catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub id: Option<i64>,
    #[serde(rename = "nombre")]
    pub name: Option<String>,
}

/// Job title catalog entry. `name` is taken from `name` or, failing that, `nombre`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobTitle {
    pub id: Option<i64>,
    #[serde(rename = "nombre")]
    pub name: Option<String>,
    #[serde(rename = "codigo")]
    pub code: Option<String>,
}

/// Contract detail, as returned by `contrato/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    /// Contract id.
    pub id: Option<i64>,
    /// Id of the employee the contract belongs to.
    #[serde(rename = "empleado")]
    pub employee_id: Option<i64>,
    #[serde(rename = "cargo")]
    pub job_title: Option<String>,
    #[serde(rename = "centroCosto")]
    pub cost_center: Option<CostCenter>,
    #[serde(rename = "sucursal")]
    pub branch: Option<Branch>,
    #[serde(rename = "fechaContratacion")]
    pub hire_date: Option<NaiveDate>,
    #[serde(rename = "jefe")]
    pub manager: Option<Employee>,
    /// Derived from `activo`/`finiquitado`/`desde`/`hasta`, or the legacy `vigente` flag.
    #[serde(rename = "activo")]
    pub active: Option<bool>,
}

/// Flat contract row for listings (active and historical contracts).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractSummary {
    #[serde(rename = "contratoId")]
    pub contract_id: Option<i64>,
    #[serde(rename = "empleadoId")]
    pub employee_id: Option<i64>,
    pub rut: Option<String>,
    #[serde(rename = "nombre")]
    pub first_name: Option<String>,
    #[serde(rename = "apellidoPaterno")]
    pub paternal_surname: Option<String>,
    #[serde(rename = "cargo")]
    pub job_title: Option<String>,
    #[serde(rename = "centroCostoCodigo")]
    pub cost_center_code: Option<String>,
    #[serde(rename = "centroCostoNombre")]
    pub cost_center_name: Option<String>,
    #[serde(rename = "sucursalNombre")]
    pub branch_name: Option<String>,
    #[serde(rename = "jefeNombre")]
    pub manager_name: Option<String>,
    #[serde(rename = "fechaContratacion")]
    pub hire_date: Option<NaiveDate>,
    #[serde(rename = "activo")]
    pub active: Option<bool>,
}

/// Person record merged with the labor data of its contract.
///
/// `vacations` and `licenses` are only filled when the record is built as a
/// "complete" employee.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeDetail {
    pub id: Option<i64>,
    pub rut: Option<String>,
    #[serde(rename = "nombre")]
    pub first_name: Option<String>,
    #[serde(rename = "apellidoPaterno")]
    pub paternal_surname: Option<String>,
    #[serde(rename = "apellidoMaterno")]
    pub maternal_surname: Option<String>,
    /// Sex as reported by Talana ("M", "F" or other values).
    #[serde(rename = "sexo")]
    pub sex: Option<String>,
    /// True when any entry of `detalles` lists disabilities; absent otherwise.
    #[serde(rename = "tieneDiscapacidad")]
    pub has_disability: Option<bool>,
    #[serde(rename = "cargo")]
    pub job_title: Option<String>,
    #[serde(rename = "codigoCentroCosto")]
    pub cost_center_code: Option<String>,
    #[serde(rename = "nombreCentroCosto")]
    pub cost_center_name: Option<String>,
    #[serde(rename = "sucursal")]
    pub branch: Option<String>,
    #[serde(rename = "jefe")]
    pub manager: Option<Employee>,
    #[serde(rename = "fechaIngreso")]
    pub hire_date: Option<NaiveDate>,
    #[serde(rename = "vacaciones")]
    pub vacations: Option<VacationBalance>,
    #[serde(rename = "licencias")]
    pub licenses: Option<Vec<LeaveRecord>>,
}

impl EmployeeDetail {
    /// Starts a record from the basic employee data.
    pub fn from_employee(employee: &Employee) -> Self {
        Self {
            id: employee.id,
            rut: employee.rut.clone(),
            first_name: employee.first_name.clone(),
            paternal_surname: employee.paternal_surname.clone(),
            maternal_surname: employee.maternal_surname.clone(),
            ..Default::default()
        }
    }

    /// Names of the labor fields that are still unresolved.
    pub fn missing_labor_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.job_title) {
            missing.push("cargo");
        }
        if is_blank(&self.cost_center_code) {
            missing.push("codigoCentroCosto");
        }
        if is_blank(&self.cost_center_name) {
            missing.push("nombreCentroCosto");
        }
        if is_blank(&self.branch) {
            missing.push("sucursal");
        }
        if self.hire_date.is_none() {
            missing.push("fechaIngreso");
        }
        if self.manager.is_none() {
            missing.push("jefe");
        }
        missing
    }

    /// Completeness predicate driving the contract and path-variant fallbacks.
    pub fn needs_labor_fallback(&self) -> bool {
        !self.missing_labor_fields().is_empty()
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Vacation balance of one employee (`persona/{id}/saldo_vacaciones`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VacationBalance {
    #[serde(rename = "empleado")]
    pub employee_id: Option<i64>,
    #[serde(rename = "diasDisponibles")]
    pub available_days: Option<f64>,
    #[serde(rename = "diasTomados")]
    pub used_days: Option<f64>,
    #[serde(rename = "diasProgresivos")]
    pub progressive_days: Option<f64>,
}

/// Absence record (license or vacation) from `ausencia`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaveRecord {
    pub id: Option<i64>,
    #[serde(rename = "empleado")]
    pub employee_id: Option<i64>,
    #[serde(rename = "tipoAusencia")]
    pub absence_type: Option<String>,
    #[serde(rename = "fechaDesde")]
    pub from: Option<NaiveDate>,
    #[serde(rename = "fechaHasta")]
    pub to: Option<NaiveDate>,
    #[serde(rename = "numeroDias")]
    pub days: Option<f64>,
    /// Unknown approval is kept as `None`, not `false`.
    #[serde(rename = "aprobada")]
    pub approved: Option<bool>,
    #[serde(rename = "mediosDias")]
    pub half_days: Option<bool>,
}

/// Employee block embedded in a vacation summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSummary {
    pub id: Option<i64>,
    #[serde(rename = "fechaCreacion")]
    pub created_at: Option<String>,
    pub rut: Option<String>,
    #[serde(rename = "nombre")]
    pub first_name: Option<String>,
    #[serde(rename = "apellidoPaterno")]
    pub paternal_surname: Option<String>,
    #[serde(rename = "apellidoMaterno")]
    pub maternal_surname: Option<String>,
    #[serde(rename = "sexo")]
    pub sex: Option<String>,
    #[serde(rename = "fechaNacimiento")]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "nacionalidad")]
    pub nationality: Option<String>,
    pub email: Option<String>,
}

impl From<&Employee> for EmployeeSummary {
    fn from(employee: &Employee) -> Self {
        Self {
            id: employee.id,
            rut: employee.rut.clone(),
            first_name: employee.first_name.clone(),
            paternal_surname: employee.paternal_surname.clone(),
            maternal_surname: employee.maternal_surname.clone(),
            ..Default::default()
        }
    }
}

/// Vacation period as listed by `vacations-resumed`, also used for the
/// "currently on vacation" listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VacationSummary {
    pub id: Option<i64>,
    #[serde(rename = "empleado")]
    pub employee: Option<EmployeeSummary>,
    #[serde(rename = "vacacionesDesde")]
    pub from: Option<NaiveDate>,
    #[serde(rename = "vacacionesHasta")]
    pub to: Option<NaiveDate>,
    #[serde(rename = "vacacionesRetorno")]
    pub return_date: Option<NaiveDate>,
    #[serde(rename = "numeroDias")]
    pub days: Option<f64>,
    #[serde(rename = "mediosDias")]
    pub half_days: Option<bool>,
    #[serde(rename = "fechaAprobacion")]
    pub approved_at: Option<String>,
    /// Explicit approval flag, else true when an approval date is present.
    #[serde(rename = "aprobada")]
    pub approved: Option<bool>,
    #[serde(rename = "fechaCreacion")]
    pub created_at: Option<String>,
    #[serde(rename = "tipoVacaciones")]
    pub vacation_type: Option<String>,
}

// ============ API Query Models ============

/// `limit`/`offset` paging plus the cache bypass flag.
#[derive(Debug, Default, Deserialize)]
pub struct LimitOffsetQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    #[serde(default)]
    pub force: bool,
}

impl LimitOffsetQuery {
    /// Both bounds, only when both were given.
    pub fn window(&self) -> Option<(u32, u32)> {
        self.limit.zip(self.offset)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ActiveContractsQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoricalContractsQuery {
    pub search_since: Option<String>,
    pub search_to: Option<String>,
    pub page_size: Option<u32>,
}

/// Optional `desde`/`hasta` window (ISO dates).
#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    pub desde: Option<String>,
    pub hasta: Option<String>,
}

/// Lookup by national id, optionally with a date window.
#[derive(Debug, Default, Deserialize)]
pub struct RutQuery {
    pub rut: String,
    pub desde: Option<String>,
    pub hasta: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentVacationsQuery {
    pub desde: Option<String>,
    pub hasta: Option<String>,
    pub solo_aprobadas: Option<bool>,
}

/// Raw proxy paging for `persona-paginado`/`contrato-paginado`.
#[derive(Debug, Default, Deserialize)]
pub struct RawPageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

// ============ API Response Models ============

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub refreshed: bool,
    pub count: usize,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    /// Minimum spacing currently enforced between Talana requests.
    #[serde(rename = "talanaMinIntervalMs")]
    pub talana_min_interval_ms: u64,
    /// `None` when the daily warmup is disabled.
    #[serde(rename = "warmupHourUtc")]
    pub warmup_hour_utc: Option<u32>,
}
