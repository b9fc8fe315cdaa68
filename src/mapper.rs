use chrono::NaiveDate;
use serde_json::Value;

use crate::json_walk::{
    blank_to_none, coerce_id, deep_find_object, deep_read_id, deep_read_string, first_object,
    parse_date, read_bool, read_date, read_id, read_number, read_string, read_text, unwrap_items,
};
use crate::models::{
    Branch, Contract, ContractSummary, CostCenter, Employee, EmployeeDetail, EmployeeSummary,
    JobTitle, LeaveRecord, VacationBalance, VacationSummary,
};

/// Search depth for the primary person record.
pub const PERSON_SEARCH_DEPTH: usize = 6;
/// Search depth for secondary sources merged into a person record.
pub const MERGE_SEARCH_DEPTH: usize = 4;

const JOB_TITLE_KEYS: &[&str] = &[
    "cargo",
    "jobTitle",
    "job_title",
    "jobTitleName",
    "job_title_name",
    "tituloCargo",
    "jobTitleNombre",
    "job_title_nombre",
];
const JOB_TITLE_DEEP_KEYS: &[&str] = &[
    "cargo",
    "jobTitle",
    "job_title",
    "jobTitleName",
    "job_title_name",
    "tituloCargo",
    "jobTitleNombre",
    "job_title_nombre",
    "jobTitleText",
    "job_title_text",
];
const JOB_TITLE_ID_KEYS: &[&str] = &["jobTitleId", "job_title_id", "jobTitle", "job_title"];
const COST_CENTER_KEYS: &[&str] = &["centroCosto", "centro_costo"];
const COST_CENTER_ID_KEYS: &[&str] =
    &["centroCostoId", "centro_costo_id", "centroCosto", "centro_costo"];
const BRANCH_KEYS: &[&str] = &["sucursal", "branch"];
const BRANCH_ID_KEYS: &[&str] = &["sucursalId", "sucursal_id", "sucursal", "branch"];
const HIRE_DATE_KEYS: &[&str] = &[
    "fechaIngreso",
    "fecha_ingreso",
    "fechaContratacion",
    "fecha_contratacion",
    "hiringDate",
    "hire_date",
];
const HIRE_DATE_DEEP_KEYS: &[&str] = &[
    "fechaIngreso",
    "fecha_ingreso",
    "fechaContratacion",
    "fecha_contratacion",
    "hiringDate",
    "hire_date",
    "fechaInicio",
    "fecha_inicio",
];
const MANAGER_KEYS: &[&str] = &["jefe", "manager", "supervisor", "jefeDirecto", "jefe_directo"];
const EMPLOYEE_REF_KEYS: &[&str] = &["empleado", "empleadoId", "empleado_id", "persona"];

/// Catalog ids found on a person record whose labels must be looked up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogRefs {
    pub job_title_id: Option<i64>,
    pub cost_center_id: Option<i64>,
    pub branch_id: Option<i64>,
}

pub fn map_employee(node: &Value) -> Employee {
    Employee {
        id: read_id(node, &["id", "personaId"]),
        rut: read_string(node, &["rut"]),
        first_name: read_string(node, &["nombre", "name"]),
        paternal_surname: read_string(
            node,
            &["apellidoPaterno", "apellido_paterno", "lastName", "lastname"],
        ),
        maternal_surname: read_string(node, &["apellidoMaterno", "apellido_materno"]),
    }
}

pub fn map_employees(root: &Value) -> Vec<Employee> {
    objects(root).map(map_employee).collect()
}

pub fn map_cost_center(node: &Value) -> CostCenter {
    CostCenter {
        id: read_id(node, &["id"]),
        code: read_text(node, &["codigo", "code"]),
        name: read_string(node, &["nombre", "name"]),
    }
}

pub fn map_branch(node: &Value) -> Branch {
    Branch {
        id: read_id(node, &["id"]),
        name: read_string(node, &["nombre", "name"]),
    }
}

pub fn map_job_title(node: &Value) -> JobTitle {
    JobTitle {
        id: read_id(node, &["id"]),
        name: read_string(node, &["name", "nombre"]),
        code: read_text(node, &["codigo", "code"]),
    }
}

pub fn map_cost_centers(root: &Value) -> Vec<CostCenter> {
    objects(root).map(map_cost_center).collect()
}

pub fn map_branches(root: &Value) -> Vec<Branch> {
    objects(root).map(map_branch).collect()
}

pub fn map_job_titles(root: &Value) -> Vec<JobTitle> {
    objects(root).map(map_job_title).collect()
}

fn objects(root: &Value) -> impl Iterator<Item = &Value> {
    unwrap_items(root).into_iter().filter(|item| item.is_object())
}

/// Contract detail. `today` feeds the derived active flag.
pub fn map_contract(node: &Value, today: NaiveDate) -> Contract {
    Contract {
        id: read_id(node, &["id"]),
        employee_id: read_id(node, EMPLOYEE_REF_KEYS),
        job_title: read_string(node, JOB_TITLE_KEYS),
        cost_center: first_object(node, COST_CENTER_KEYS).map(map_cost_center),
        branch: first_object(node, BRANCH_KEYS).map(map_branch),
        hire_date: read_date(node, &["fechaContratacion", "fecha_contratacion", "desde"]),
        manager: first_object(node, MANAGER_KEYS).map(map_employee),
        active: is_contract_active(node, today),
    }
}

/// Flat listing row; the employee names come from `empleadoDetails`.
pub fn map_contract_summary(node: &Value, today: NaiveDate) -> ContractSummary {
    let details = first_object(node, &["empleadoDetails", "empleado_details"]);
    let cost_center = first_object(node, COST_CENTER_KEYS);
    let manager_name = match node.get("jefe") {
        Some(jefe @ Value::Object(_)) => read_string(jefe, &["nombre", "name"]),
        Some(Value::String(name)) => blank_to_none(Some(name.clone())),
        _ => None,
    };

    ContractSummary {
        contract_id: read_id(node, &["id"]),
        employee_id: read_id(node, EMPLOYEE_REF_KEYS),
        rut: details.and_then(|d| read_string(d, &["rut"])),
        first_name: details.and_then(|d| read_string(d, &["nombre"])),
        paternal_surname: details
            .and_then(|d| read_string(d, &["apellidoPaterno", "apellido_paterno"])),
        job_title: read_string(node, JOB_TITLE_KEYS),
        cost_center_code: cost_center.and_then(|cc| read_text(cc, &["codigo", "code"])),
        cost_center_name: cost_center.and_then(|cc| read_string(cc, &["nombre", "name"])),
        branch_name: first_object(node, BRANCH_KEYS)
            .and_then(|b| read_string(b, &["nombre", "name"])),
        manager_name,
        hire_date: read_date(node, &["fechaContratacion", "fecha_contratacion", "desde"]),
        active: is_contract_active(node, today),
    }
}

/// Active-contract predicate.
///
/// `activo OR (NOT finiquitado AND desde <= today AND (hasta absent OR hasta >= today))`.
/// The date branch needs a start date. The legacy `vigente` flag is only read when
/// none of `activo`, `finiquitado`, `desde` or `hasta` is present.
pub fn is_contract_active(node: &Value, today: NaiveDate) -> Option<bool> {
    let present = |key: &str| node.get(key).is_some_and(|v| !v.is_null());
    if !["activo", "finiquitado", "desde", "hasta"]
        .iter()
        .any(|key| present(*key))
    {
        return read_bool(node, &["vigente"]);
    }

    if read_bool(node, &["activo"]) == Some(true) {
        return Some(true);
    }
    let terminated = read_bool(node, &["finiquitado"]).unwrap_or(false);
    let started = read_date(node, &["desde"]).is_some_and(|desde| desde <= today);
    let not_ended = match read_date(node, &["hasta"]) {
        Some(hasta) => hasta >= today,
        None => true,
    };
    Some(!terminated && started && not_ended)
}

/// Maps the `persona/{id}` record.
///
/// Labels are read directly or found by a bounded search; when only an id is present
/// for job title, cost center or branch it is returned in [`CatalogRefs`] for the
/// caller to resolve against the cached catalogs.
pub fn map_person_detail(root: &Value) -> (EmployeeDetail, CatalogRefs) {
    let depth = PERSON_SEARCH_DEPTH;
    let mut refs = CatalogRefs::default();

    let job_title = read_string(root, JOB_TITLE_KEYS)
        .or_else(|| deep_read_string(root, depth, JOB_TITLE_DEEP_KEYS));
    if job_title.is_none() {
        refs.job_title_id = read_id(root, JOB_TITLE_ID_KEYS)
            .or_else(|| deep_read_id(root, depth, JOB_TITLE_ID_KEYS));
    }

    let cost_center = first_object(root, COST_CENTER_KEYS)
        .or_else(|| deep_find_object(root, depth, COST_CENTER_KEYS));
    let cost_center_code = cost_center.and_then(|cc| read_text(cc, &["codigo", "code"]));
    let cost_center_name = cost_center.and_then(|cc| read_string(cc, &["nombre", "name"]));
    if cost_center_code.is_none() || cost_center_name.is_none() {
        refs.cost_center_id = read_id(root, COST_CENTER_ID_KEYS)
            .or_else(|| deep_read_id(root, depth, COST_CENTER_ID_KEYS));
    }

    let branch = first_object(root, BRANCH_KEYS)
        .or_else(|| deep_find_object(root, depth, BRANCH_KEYS))
        .and_then(|b| read_string(b, &["nombre", "name"]));
    if branch.is_none() {
        refs.branch_id =
            read_id(root, BRANCH_ID_KEYS).or_else(|| deep_read_id(root, depth, BRANCH_ID_KEYS));
    }

    let hire_date = read_date(root, HIRE_DATE_KEYS).or_else(|| {
        deep_read_string(root, depth, HIRE_DATE_DEEP_KEYS)
            .as_deref()
            .and_then(parse_date)
    });

    let manager = first_object(root, MANAGER_KEYS)
        .or_else(|| deep_find_object(root, depth, MANAGER_KEYS))
        .map(map_employee);

    let detail = EmployeeDetail {
        id: read_id(root, &["id", "personaId"]),
        rut: read_string(root, &["rut"]),
        first_name: read_string(root, &["nombre"]),
        paternal_surname: read_string(root, &["apellidoPaterno", "apellido_paterno"]),
        maternal_surname: read_string(root, &["apellidoMaterno", "apellido_materno"]),
        sex: read_string(root, &["sexo"]),
        has_disability: disability_flag(root),
        job_title,
        cost_center_code,
        cost_center_name,
        branch,
        manager,
        hire_date,
        vacations: None,
        licenses: None,
    };
    (detail, refs)
}

fn disability_flag(root: &Value) -> Option<bool> {
    let details = root.get("detalles")?.as_array()?;
    details
        .iter()
        .any(|entry| read_string(entry, &["discapacidades"]).is_some())
        .then_some(true)
}

/// Fills the labor fields still missing on `detail` from a secondary source object.
/// Returns whether anything was applied. Present fields are never overwritten.
pub fn apply_labor_fields(detail: &mut EmployeeDetail, node: &Value) -> bool {
    let depth = MERGE_SEARCH_DEPTH;
    let mut changed = false;

    if detail.job_title.is_none() {
        let job_title = read_string(
            node,
            &["cargo", "jobTitle", "job_title", "jobTitleName", "job_title_name", "tituloCargo"],
        )
        .or_else(|| {
            deep_read_string(
                node,
                depth,
                &["cargo", "jobTitleName", "job_title_name", "jobTitle", "job_title"],
            )
        });
        if let Some(job_title) = blank_to_none(job_title) {
            detail.job_title = Some(job_title);
            changed = true;
        }
    }

    if detail.cost_center_code.is_none() || detail.cost_center_name.is_none() {
        let cost_center = first_object(node, COST_CENTER_KEYS)
            .or_else(|| deep_find_object(node, depth, COST_CENTER_KEYS));
        if let Some(cc) = cost_center {
            if detail.cost_center_code.is_none() {
                if let Some(code) = read_text(cc, &["codigo", "code"]) {
                    detail.cost_center_code = Some(code);
                    changed = true;
                }
            }
            if detail.cost_center_name.is_none() {
                if let Some(name) = read_string(cc, &["nombre", "name"]) {
                    detail.cost_center_name = Some(name);
                    changed = true;
                }
            }
        }
    }

    if detail.branch.is_none() {
        let branch = first_object(node, BRANCH_KEYS)
            .or_else(|| deep_find_object(node, depth, BRANCH_KEYS))
            .and_then(|b| read_string(b, &["nombre", "name"]));
        if let Some(branch) = branch {
            detail.branch = Some(branch);
            changed = true;
        }
    }

    if detail.hire_date.is_none() {
        let hire_date = read_date(node, HIRE_DATE_KEYS).or_else(|| {
            deep_read_string(node, depth, HIRE_DATE_DEEP_KEYS)
                .as_deref()
                .and_then(parse_date)
        });
        if hire_date.is_some() {
            detail.hire_date = hire_date;
            changed = true;
        }
    }

    if detail.manager.is_none() {
        let manager = first_object(node, MANAGER_KEYS)
            .or_else(|| deep_find_object(node, depth, MANAGER_KEYS));
        if let Some(manager) = manager {
            detail.manager = Some(map_employee(manager));
            changed = true;
        }
    }

    changed
}

/// Merges the typed contract into `detail`, filling missing fields only.
pub fn merge_contract(detail: &mut EmployeeDetail, contract: &Contract) {
    if detail.job_title.is_none() {
        detail.job_title = blank_to_none(contract.job_title.clone());
    }
    if let Some(cc) = &contract.cost_center {
        if detail.cost_center_code.is_none() {
            detail.cost_center_code = blank_to_none(cc.code.clone());
        }
        if detail.cost_center_name.is_none() {
            detail.cost_center_name = blank_to_none(cc.name.clone());
        }
    }
    if detail.branch.is_none() {
        detail.branch = contract
            .branch
            .as_ref()
            .and_then(|b| blank_to_none(b.name.clone()));
    }
    if detail.hire_date.is_none() {
        detail.hire_date = contract.hire_date;
    }
    if detail.manager.is_none() {
        detail.manager = contract.manager.clone();
    }
}

pub fn map_leave_record(node: &Value) -> LeaveRecord {
    LeaveRecord {
        id: read_id(node, &["id"]),
        employee_id: read_id(node, EMPLOYEE_REF_KEYS),
        absence_type: read_string(node, &["tipoAusencia", "tipo_ausencia", "tipo"]),
        from: read_date(node, &["fechaDesde", "fecha_desde", "desde", "fechaInicio"]),
        to: read_date(node, &["fechaHasta", "fecha_hasta", "hasta", "fechaFin"]),
        days: read_number(node, &["numeroDias", "numero_dias", "dias"]),
        approved: read_bool(node, &["aprobada", "aprobado", "approved"]),
        half_days: read_bool(node, &["mediosDias", "medios_dias"]),
    }
}

pub fn map_leave_records(root: &Value) -> Vec<LeaveRecord> {
    objects(root).map(map_leave_record).collect()
}

fn map_employee_summary(node: &Value) -> EmployeeSummary {
    EmployeeSummary {
        id: read_id(node, &["id"]),
        created_at: read_string(node, &["fechaCreacion", "fecha_creacion"]),
        rut: read_string(node, &["rut"]),
        first_name: read_string(node, &["nombre", "name"]),
        paternal_surname: read_string(node, &["apellidoPaterno", "apellido_paterno"]),
        maternal_surname: read_string(node, &["apellidoMaterno", "apellido_materno"]),
        sex: read_string(node, &["sexo"]),
        birth_date: read_date(node, &["fechaNacimiento", "fecha_nacimiento"]),
        nationality: read_string(node, &["nacionalidad"]),
        email: read_string(node, &["email"]),
    }
}

pub fn map_vacation_summary(node: &Value) -> VacationSummary {
    let employee = match node.get("empleado") {
        Some(emp @ Value::Object(_)) => Some(map_employee_summary(emp)),
        Some(other) => coerce_id(other).map(|id| EmployeeSummary {
            id: Some(id),
            ..Default::default()
        }),
        None => None,
    };
    let approved_at = read_string(node, &["fechaAprobacion", "fecha_aprobacion"]);
    let approved = read_bool(node, &["aprobada", "aprobado", "approved"])
        .or_else(|| approved_at.as_ref().map(|_| true));
    VacationSummary {
        id: read_id(node, &["id"]),
        employee,
        from: read_date(node, &["vacacionesDesde", "vacaciones_desde", "desde"]),
        to: read_date(node, &["vacacionesHasta", "vacaciones_hasta", "hasta"]),
        return_date: read_date(node, &["vacacionesRetorno", "vacaciones_retorno"]),
        days: read_number(node, &["numeroDias", "numero_dias"]),
        half_days: read_bool(node, &["mediosDias", "medios_dias"]),
        approved_at,
        approved,
        created_at: read_string(node, &["fechaCreacion", "fecha_creacion"]),
        vacation_type: read_string(node, &["tipoVacaciones", "tipo_vacaciones"]),
    }
}

pub fn map_vacation_summaries(root: &Value) -> Vec<VacationSummary> {
    objects(root).map(map_vacation_summary).collect()
}

pub fn map_vacation_balance(node: &Value, employee_id: i64) -> VacationBalance {
    VacationBalance {
        employee_id: read_id(node, EMPLOYEE_REF_KEYS).or(Some(employee_id)),
        available_days: read_number(
            node,
            &["diasDisponibles", "dias_disponibles", "saldo", "disponibles"],
        ),
        used_days: read_number(node, &["diasTomados", "dias_tomados", "usados"]),
        progressive_days: read_number(node, &["diasProgresivos", "dias_progresivos"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn test_contract_summary_best_effort() {
        let node = json!({
            "id": "77",
            "empleado": {"id": 5},
            "empleadoDetails": {"nombre": "Ana", "rut": "1-9", "apellidoPaterno": "Soto"},
            "cargo": "Analista",
            "centroCosto": {"codigo": 10, "nombre": "Ventas"},
            "sucursal": {"nombre": "Santiago"},
            "jefe": "Pedro",
            "desde": "2023-01-02",
            "finiquitado": false
        });
        let summary = map_contract_summary(&node, today());
        assert_eq!(summary.contract_id, Some(77));
        assert_eq!(summary.employee_id, Some(5));
        assert_eq!(summary.first_name.as_deref(), Some("Ana"));
        assert_eq!(summary.cost_center_code.as_deref(), Some("10"));
        assert_eq!(summary.branch_name.as_deref(), Some("Santiago"));
        assert_eq!(summary.manager_name.as_deref(), Some("Pedro"));
        assert_eq!(summary.hire_date, NaiveDate::from_ymd_opt(2023, 1, 2));
        assert_eq!(summary.active, Some(true));

        let empty = map_contract_summary(&json!({}), today());
        assert_eq!(empty, ContractSummary::default());
    }

    #[test]
    fn test_contract_active_predicate() {
        let t = today();
        assert_eq!(
            is_contract_active(&json!({"activo": true, "finiquitado": true}), t),
            Some(true)
        );
        assert_eq!(
            is_contract_active(&json!({"finiquitado": true, "desde": "2020-01-01"}), t),
            Some(false)
        );
        assert_eq!(
            is_contract_active(&json!({"desde": "2020-01-01", "hasta": "2024-06-15"}), t),
            Some(true)
        );
        assert_eq!(
            is_contract_active(&json!({"desde": "2020-01-01", "hasta": "2024-06-14"}), t),
            Some(false)
        );
        assert_eq!(is_contract_active(&json!({"desde": "2024-07-01"}), t), Some(false));
        assert_eq!(is_contract_active(&json!({"activo": false}), t), Some(false));
        assert_eq!(is_contract_active(&json!({"vigente": true}), t), Some(true));
        assert_eq!(
            is_contract_active(&json!({"vigente": true, "activo": false}), t),
            Some(false)
        );
        assert_eq!(is_contract_active(&json!({}), t), None);
    }

    #[test]
    fn test_person_detail_direct_fields() {
        let root = json!({
            "id": 12,
            "rut": "11-1",
            "nombre": "Ana",
            "sexo": "F",
            "detalles": [{"discapacidades": ""}, {"discapacidades": "visual"}],
            "jobTitle": {"name": "Contadora"},
            "centroCosto": {"codigo": "C1", "nombre": "Finanzas"},
            "sucursal": {"name": "Centro"},
            "fechaIngreso": "2019-03-01",
            "jefe": {"id": "3", "nombre": "Luis", "apellido_paterno": "Mora"}
        });
        let (detail, refs) = map_person_detail(&root);
        assert_eq!(detail.id, Some(12));
        assert_eq!(detail.has_disability, Some(true));
        assert_eq!(detail.job_title.as_deref(), Some("Contadora"));
        assert_eq!(detail.cost_center_code.as_deref(), Some("C1"));
        assert_eq!(detail.branch.as_deref(), Some("Centro"));
        assert_eq!(detail.hire_date, NaiveDate::from_ymd_opt(2019, 3, 1));
        assert!(!detail.needs_labor_fallback());
        assert_eq!(refs, CatalogRefs::default());
        let jefe = detail.manager.unwrap();
        assert_eq!(jefe.id, Some(3));
        assert_eq!(jefe.paternal_surname.as_deref(), Some("Mora"));
    }

    #[test]
    fn test_person_detail_nested_and_bare_ids() {
        let root = json!({
            "id": 4,
            "detalles": [{"discapacidades": null}],
            "laboral": {"datos": {"fecha_ingreso": "2021-05-10T00:00:00Z", "jobTitle": 8}},
            "centroCosto": "31",
            "sucursal_id": 2
        });
        let (detail, refs) = map_person_detail(&root);
        assert_eq!(detail.has_disability, None);
        assert_eq!(detail.job_title, None);
        assert_eq!(detail.hire_date, NaiveDate::from_ymd_opt(2021, 5, 10));
        assert_eq!(
            refs,
            CatalogRefs {
                job_title_id: Some(8),
                cost_center_id: Some(31),
                branch_id: Some(2),
            }
        );
        assert_eq!(detail.manager, None);
    }

    #[test]
    fn test_apply_labor_fields_never_overwrites() {
        let mut detail = EmployeeDetail {
            job_title: Some("Primario".into()),
            ..Default::default()
        };
        let node = json!({
            "cargo": "Secundario",
            "wrapper": {"centro_costo": {"code": "X9", "name": "Ops"}},
            "branch": {"nombre": "Norte"},
            "hire_date": "2018-01-01",
            "supervisor": {"id": 1, "name": "Jefa"}
        });
        assert!(apply_labor_fields(&mut detail, &node));
        assert_eq!(detail.job_title.as_deref(), Some("Primario"));
        assert_eq!(detail.cost_center_code.as_deref(), Some("X9"));
        assert_eq!(detail.cost_center_name.as_deref(), Some("Ops"));
        assert_eq!(detail.branch.as_deref(), Some("Norte"));
        assert_eq!(detail.manager.as_ref().and_then(|m| m.first_name.as_deref()), Some("Jefa"));
        assert!(!detail.needs_labor_fallback());

        // Nothing left to apply
        assert!(!apply_labor_fields(&mut detail, &node));
    }

    #[test]
    fn test_merge_contract_fills_missing_only() {
        let mut detail = EmployeeDetail {
            branch: Some("Propia".into()),
            ..Default::default()
        };
        let contract = map_contract(
            &json!({
                "id": 1,
                "empleado": "5",
                "cargo": "Chofer",
                "centroCosto": {"codigo": "C2", "nombre": "Logística"},
                "sucursal": {"nombre": "Otra"},
                "fechaContratacion": "2022-02-02",
                "jefe": {"id": 9, "nombre": "Marta"}
            }),
            today(),
        );
        assert_eq!(contract.employee_id, Some(5));
        merge_contract(&mut detail, &contract);
        assert_eq!(detail.job_title.as_deref(), Some("Chofer"));
        assert_eq!(detail.branch.as_deref(), Some("Propia"));
        assert_eq!(detail.cost_center_name.as_deref(), Some("Logística"));
        assert_eq!(detail.hire_date, NaiveDate::from_ymd_opt(2022, 2, 2));
        assert_eq!(detail.manager.and_then(|m| m.id), Some(9));
    }

    #[test]
    fn test_leave_record_employee_forms() {
        for empleado in [json!(5), json!("5"), json!({"id": 5})] {
            let record = map_leave_record(&json!({
                "id": 1,
                "empleado": empleado,
                "fechaDesde": "2024-01-01",
                "fechaHasta": "2024-01-10",
                "aprobada": null
            }));
            assert_eq!(record.employee_id, Some(5));
            assert_eq!(record.approved, None);
            assert_eq!(record.to, NaiveDate::from_ymd_opt(2024, 1, 10));
        }
    }

    #[test]
    fn test_vacation_summary_shapes() {
        let list = map_vacation_summaries(&json!({"results": [
            {"id": 1, "empleado": {"id": 5, "rut": "5-5"}, "vacacionesDesde": "2024-02-01"},
            {"id": 2, "empleado": "6", "vacacionesHasta": "2024-02-05"}
        ]}));
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].employee.as_ref().and_then(|e| e.rut.as_deref()), Some("5-5"));
        assert_eq!(list[1].employee.as_ref().and_then(|e| e.id), Some(6));
        assert_eq!(list[1].to, NaiveDate::from_ymd_opt(2024, 2, 5));
    }

    #[test]
    fn test_vacation_summary_approval() {
        let list = map_vacation_summaries(&json!([
            {"id": 1, "fechaAprobacion": "2024-01-20T10:00:00"},
            {"id": 2, "fechaAprobacion": "2024-01-20", "aprobada": false},
            {"id": 3, "fechaAprobacion": " "},
            {"id": 4}
        ]));
        let approved: Vec<_> = list.iter().map(|v| v.approved).collect();
        assert_eq!(approved, vec![Some(true), Some(false), None, None]);
    }

    #[test]
    fn test_catalog_mapping() {
        let titles = map_job_titles(&json!([
            {"id": 1, "nombre": "Analista"},
            {"id": 2, "name": "Dev", "nombre": "Desarrollador"}
        ]));
        assert_eq!(titles[0].name.as_deref(), Some("Analista"));
        assert_eq!(titles[1].name.as_deref(), Some("Dev"));
        let centers =
            map_cost_centers(&json!({"data": [{"id": "3", "code": "C3", "name": "Bodega"}]}));
        assert_eq!(centers[0].id, Some(3));
        assert_eq!(centers[0].code.as_deref(), Some("C3"));
    }
}
