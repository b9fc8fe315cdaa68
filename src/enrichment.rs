//! Aggregation over the Talana API.
//!
//! [`TalanaService`] composes the transport, the caches and the mapper into the records
//! the HTTP layer serves:
//! 1. Paginated listings (employees, active and historical contracts)
//! 2. Person detail enrichment (person record, catalogs, contract, path variants)
//! 3. National id (RUT) resolution
//! 4. Absences: licenses, vacation detail, vacation summary, current vacations
use std::collections::{HashMap, HashSet};

use chrono::{Local, NaiveDate};
use serde_json::Value;

use crate::cache::TalanaCaches;
use crate::config::Config;
use crate::date_window::DateWindow;
use crate::errors::{AppError, UpstreamError};
use crate::json_walk::{
    blank_to_none, first_item, has_next_page, parse_body, read_id, unwrap_items,
};
use crate::mapper::{
    apply_labor_fields, map_branches, map_contract, map_contract_summary, map_cost_centers,
    map_employee, map_employees, map_job_titles, map_leave_records, map_person_detail,
    map_vacation_balance, map_vacation_summaries, merge_contract, CatalogRefs,
};
use crate::models::{
    Branch, Contract, ContractSummary, CostCenter, Employee, EmployeeDetail, EmployeeSummary,
    JobTitle, LeaveRecord, VacationBalance, VacationSummary,
};
use crate::talana_client::{limit_offset_query, TalanaClient};

/// Largest `page_size` requested from Talana.
pub const MAX_PAGE_SIZE: u32 = 100;
/// Page size of the full employee and contract listings.
pub const DEFAULT_PAGE_SIZE: u32 = 100;
/// Hard stop for pagination loops whose `next` cursor never ends.
pub const MAX_PAGES: u32 = 500;
/// Default `search_since` of the historical contracts listing.
pub const DEFAULT_HISTORY_SINCE: &str = "20240101";

const CURRENT_VACATION_PATHS: &[&str] = &[
    "/ausencia/?tipoAusencia=vacaciones",
    "/ausencia/?tipoAusencia=vacation",
    "/ausencias/?tipoAusencia=vacaciones",
    "/ausencias/?tipoAusencia=vacation",
    "/ausencia/?tipo=vacaciones",
    "/ausencias/?tipo=vacaciones",
];

/// Paginated Talana collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Persons,
    Contracts,
}

/// How an employee is addressed in a route: numeric id or national id.
///
/// Any all-digit key is an id, including a RUT written without its dash
/// (`123456785`). RUTs must keep the dash, or go through the `rut` routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmployeeKey {
    Id(i64),
    Rut(String),
}

impl EmployeeKey {
    /// All-digit keys are ids; anything else is a RUT.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(id) = trimmed.parse() {
                return EmployeeKey::Id(id);
            }
        }
        EmployeeKey::Rut(trimmed.to_string())
    }
}

/// Upstream page covering a `limit`/`offset` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub page_size: u32,
    /// Items of `page` that precede `offset`.
    pub skip: usize,
}

impl PageWindow {
    pub fn from_limit_offset(limit: u32, offset: u32) -> Self {
        let page_size = limit.clamp(1, MAX_PAGE_SIZE);
        Self {
            page: offset / page_size + 1,
            page_size,
            skip: (offset % page_size) as usize,
        }
    }
}

/// Alternate sources of labor data, tried in order when the person record and its
/// active contract leave fields unresolved.
pub fn labor_path_variants(employee_id: i64, rut: Option<&str>) -> Vec<String> {
    let id = employee_id;
    let mut paths = vec![
        format!("/contrato/{}/", id),
        format!("/contratos/{}/", id),
        format!("/contrato/?persona={}", id),
        format!("/contrato/?empleado={}", id),
        format!("/contratos/?persona={}", id),
        format!("/contratos/?empleado={}", id),
        format!("/persona/{}/contrato/", id),
        format!("/persona/{}/contratos/", id),
    ];
    if let Some(rut) = rut.map(str::trim).filter(|r| !r.is_empty()) {
        let encoded: String = url::form_urlencoded::byte_serialize(rut.as_bytes()).collect();
        paths.push(format!("/contrato/?rut={}", encoded));
        paths.push(format!("/contratos/?rut={}", encoded));
    }
    paths.extend([
        format!("/empleado/{}/", id),
        format!("/empleados/{}/", id),
        format!("/relacion-laboral/{}/", id),
        format!("/relacion-laboral/?persona={}", id),
    ]);
    paths
}

fn vacation_summary_paths(employee_id: i64) -> [String; 4] {
    [
        format!("/vacations-resumed/?empleado={}", employee_id),
        format!("/vacations-resumed?empleado={}", employee_id),
        format!("/vacaciones-resumen/?empleado={}", employee_id),
        format!("/vacaciones-resumen?empleado={}", employee_id),
    ]
}

/// Window of the "currently on vacation" listing: the given bounds, or `today` when
/// neither bound is usable.
pub fn current_vacation_window(
    desde: Option<&str>,
    hasta: Option<&str>,
    today: NaiveDate,
) -> DateWindow {
    let window = DateWindow::parse(desde, hasta);
    if window.is_unbounded() {
        DateWindow::single_day(today)
    } else {
        window
    }
}

/// Keeps vacation records with both dates, inside `window`, and not explicitly
/// rejected when `only_approved` is set. Records with an unknown approval are kept.
pub fn select_current_vacations(
    records: Vec<LeaveRecord>,
    window: &DateWindow,
    only_approved: bool,
) -> Vec<LeaveRecord> {
    records
        .into_iter()
        .filter(|rec| match (rec.from, rec.to) {
            (Some(from), Some(to)) => {
                !(only_approved && rec.approved == Some(false)) && window.overlaps(from, to)
            }
            _ => false,
        })
        .collect()
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

pub struct TalanaService {
    client: TalanaClient,
    caches: TalanaCaches,
    skip_vacation_balance: bool,
    clock: fn() -> NaiveDate,
}

impl TalanaService {
    pub fn new(config: &Config, client: TalanaClient) -> Self {
        Self::with_clock(config, client, local_today)
    }

    /// Like [`TalanaService::new`] with `clock` as the source of "today" for contract
    /// activity, historical ranges and the current vacations window.
    pub fn with_clock(config: &Config, client: TalanaClient, clock: fn() -> NaiveDate) -> Self {
        Self {
            client,
            caches: TalanaCaches::new(&config.cache_ttls),
            skip_vacation_balance: config.skip_vacation_balance,
            clock,
        }
    }

    pub fn client(&self) -> &TalanaClient {
        &self.client
    }

    fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    // ============ Pagination ============

    async fn fetch_collection(
        &self,
        collection: Collection,
        query: &[(&str, String)],
    ) -> Result<String, UpstreamError> {
        match collection {
            Collection::Persons => self.client.personas_paginated(query).await,
            Collection::Contracts => self.client.contracts_paginated(query).await,
        }
    }

    /// Fetches `first_page` and, when `all_pages` is set, every following page while
    /// the response advertises a non-blank `next`. An empty page ends the loop.
    pub async fn paginate(
        &self,
        collection: Collection,
        filters: &[(&'static str, String)],
        first_page: u32,
        page_size: u32,
        all_pages: bool,
    ) -> Result<Vec<Value>, AppError> {
        let mut items = Vec::new();
        let mut page = first_page.max(1);

        loop {
            let mut query = filters.to_vec();
            query.push(("page", page.to_string()));
            query.push(("page_size", page_size.to_string()));

            let body = self.fetch_collection(collection, &query).await?;
            let root = parse_body(&body)?;
            let batch = unwrap_items(&root);
            if batch.is_empty() {
                break;
            }
            items.extend(batch.into_iter().cloned());

            if !all_pages || !has_next_page(&root) {
                break;
            }
            if page - first_page.max(1) + 1 >= MAX_PAGES {
                tracing::warn!("{:?} pagination stopped after {} pages", collection, MAX_PAGES);
                break;
            }
            page += 1;
        }

        tracing::debug!("{:?}: {} items from page {} on", collection, items.len(), first_page);
        Ok(items)
    }

    // ============ Catalogs ============

    /// Cost centers; a `limit`/`offset` window bypasses the cache.
    pub async fn cost_centers(
        &self,
        window: Option<(u32, u32)>,
        force: bool,
    ) -> Result<Vec<CostCenter>, AppError> {
        if window.is_some() {
            return self.fetch_cost_centers(window).await;
        }
        self.caches
            .cost_centers
            .get_or_fetch((), force, || self.fetch_cost_centers(None))
            .await
    }

    async fn fetch_cost_centers(
        &self,
        window: Option<(u32, u32)>,
    ) -> Result<Vec<CostCenter>, AppError> {
        let body = self.client.cost_centers(&limit_offset_query(window)).await?;
        Ok(map_cost_centers(&parse_body(&body)?))
    }

    pub async fn branches(
        &self,
        window: Option<(u32, u32)>,
        force: bool,
    ) -> Result<Vec<Branch>, AppError> {
        if window.is_some() {
            return self.fetch_branches(window).await;
        }
        self.caches
            .branches
            .get_or_fetch((), force, || self.fetch_branches(None))
            .await
    }

    async fn fetch_branches(&self, window: Option<(u32, u32)>) -> Result<Vec<Branch>, AppError> {
        let body = self.client.branches(&limit_offset_query(window)).await?;
        Ok(map_branches(&parse_body(&body)?))
    }

    pub async fn job_titles(
        &self,
        window: Option<(u32, u32)>,
        force: bool,
    ) -> Result<Vec<JobTitle>, AppError> {
        if window.is_some() {
            return self.fetch_job_titles(window).await;
        }
        self.caches
            .job_titles
            .get_or_fetch((), force, || self.fetch_job_titles(None))
            .await
    }

    async fn fetch_job_titles(
        &self,
        window: Option<(u32, u32)>,
    ) -> Result<Vec<JobTitle>, AppError> {
        let body = self.client.job_titles(&limit_offset_query(window)).await?;
        Ok(map_job_titles(&parse_body(&body)?))
    }

    /// Resolves bare catalog ids into labels. Catalog failures leave the fields empty.
    async fn resolve_catalog_refs(&self, detail: &mut EmployeeDetail, refs: CatalogRefs) {
        if let (None, Some(id)) = (&detail.job_title, refs.job_title_id) {
            match self.job_titles(None, false).await {
                Ok(titles) => {
                    detail.job_title = titles
                        .into_iter()
                        .find(|t| t.id == Some(id))
                        .and_then(|t| blank_to_none(t.name));
                }
                Err(err) => tracing::debug!("Job title catalog unavailable: {}", err),
            }
        }

        if let Some(id) = refs.cost_center_id {
            if detail.cost_center_code.is_none() || detail.cost_center_name.is_none() {
                match self.cost_centers(None, false).await {
                    Ok(centers) => {
                        if let Some(cc) = centers.into_iter().find(|c| c.id == Some(id)) {
                            if detail.cost_center_code.is_none() {
                                detail.cost_center_code = blank_to_none(cc.code);
                            }
                            if detail.cost_center_name.is_none() {
                                detail.cost_center_name = blank_to_none(cc.name);
                            }
                        }
                    }
                    Err(err) => tracing::debug!("Cost center catalog unavailable: {}", err),
                }
            }
        }

        if let (None, Some(id)) = (&detail.branch, refs.branch_id) {
            match self.branches(None, false).await {
                Ok(branches) => {
                    detail.branch = branches
                        .into_iter()
                        .find(|b| b.id == Some(id))
                        .and_then(|b| blank_to_none(b.name));
                }
                Err(err) => tracing::debug!("Branch catalog unavailable: {}", err),
            }
        }
    }

    // ============ Contracts ============

    /// Active contracts. Without `page` every page is walked and the snapshot cached
    /// (`force` skips the freshness check); with `page` only that page is fetched.
    pub async fn active_contracts(
        &self,
        page: Option<u32>,
        page_size: Option<u32>,
        force: bool,
    ) -> Result<Vec<ContractSummary>, AppError> {
        let size = page_size.filter(|s| *s >= 1).unwrap_or(DEFAULT_PAGE_SIZE);
        match page {
            Some(page) => self.fetch_active_contracts(page, size, false).await,
            None => {
                self.caches
                    .active_contracts
                    .get_or_fetch((), force, || self.fetch_active_contracts(1, size, true))
                    .await
            }
        }
    }

    async fn fetch_active_contracts(
        &self,
        page: u32,
        size: u32,
        all_pages: bool,
    ) -> Result<Vec<ContractSummary>, AppError> {
        let filters = [
            ("type_status_search", "actives".to_string()),
            ("show_version", "last".to_string()),
        ];
        let today = self.today();
        let items = self
            .paginate(Collection::Contracts, &filters, page, size, all_pages)
            .await?;
        Ok(items
            .iter()
            .map(|item| map_contract_summary(item, today))
            .collect())
    }

    /// Forced snapshot refresh; returns the number of active contracts.
    pub async fn refresh_active_contracts(&self) -> Result<usize, AppError> {
        let contracts = self.active_contracts(None, None, true).await?;
        tracing::info!("Active contracts snapshot refreshed: {} contracts", contracts.len());
        Ok(contracts.len())
    }

    /// Every contract version between `since` and `to` (`yyyyMMdd`), uncached.
    pub async fn historical_contracts(
        &self,
        since: Option<&str>,
        to: Option<&str>,
        page_size: Option<u32>,
    ) -> Result<Vec<ContractSummary>, AppError> {
        let today = self.today();
        let since = since
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_HISTORY_SINCE)
            .to_string();
        let to = to
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| today.format("%Y%m%d").to_string());
        let size = page_size.filter(|s| *s >= 1).unwrap_or(DEFAULT_PAGE_SIZE);

        let filters = [
            ("show", "all".to_string()),
            ("search_since", since),
            ("search_to", to),
        ];
        let items = self
            .paginate(Collection::Contracts, &filters, 1, size, true)
            .await?;
        Ok(items
            .iter()
            .map(|item| map_contract_summary(item, today))
            .collect())
    }

    /// First active contract matching `filters`, read through `contrato/{id}`.
    async fn fetch_active_contract(
        &self,
        mut filters: Vec<(&'static str, String)>,
    ) -> Result<Contract, AppError> {
        filters.extend([
            ("type_status_search", "actives".to_string()),
            ("page", "1".to_string()),
            ("page_size", "1".to_string()),
            ("show_version", "last".to_string()),
        ]);
        let body = self.client.contracts_paginated(&filters).await?;
        let root = parse_body(&body)?;

        let contract_id = first_item(&root).and_then(|item| read_id(item, &["id"]));
        let detail_root = match contract_id {
            Some(contract_id) => parse_body(&self.client.contract_detail(contract_id).await?)?,
            None => root,
        };

        first_item(&detail_root)
            .map(|node| map_contract(node, self.today()))
            .ok_or_else(|| AppError::NotFound("No active contract found".to_string()))
    }

    /// Active contract of an employee; on 404 the query-string variants are tried.
    pub async fn contract_by_employee(&self, employee_id: i64) -> Result<Contract, AppError> {
        self.caches
            .contract_by_employee
            .get_or_fetch(employee_id, false, || self.fetch_contract_by_employee(employee_id))
            .await
    }

    async fn fetch_contract_by_employee(&self, employee_id: i64) -> Result<Contract, AppError> {
        match self
            .fetch_active_contract(vec![("empleado", employee_id.to_string())])
            .await
        {
            Err(err) if err.is_upstream_status(404) => {
                for path in [
                    format!("/contrato/?empleado={}", employee_id),
                    format!("/contrato/?persona={}", employee_id),
                ] {
                    let root = match self.client.get(&path, &[]).await {
                        Ok(body) => match parse_body(&body) {
                            Ok(root) => root,
                            Err(_) => continue,
                        },
                        Err(_) => continue,
                    };
                    if let Some(node) = first_item(&root) {
                        return Ok(map_contract(node, self.today()));
                    }
                }
                Err(AppError::NotFound(format!(
                    "No contract found for employee {}",
                    employee_id
                )))
            }
            Err(AppError::NotFound(_)) => Err(AppError::NotFound(format!(
                "No contract found for employee {}",
                employee_id
            ))),
            other => other,
        }
    }

    /// Active contract by national id; cached under the lower-cased RUT.
    pub async fn contract_by_rut(&self, rut: &str) -> Result<Contract, AppError> {
        let rut = rut.trim();
        if rut.is_empty() {
            return Err(AppError::BadRequest("rut is required".to_string()));
        }
        self.caches
            .contract_by_rut
            .get_or_fetch(rut.to_lowercase(), false, || async {
                self.fetch_active_contract(vec![("rut", rut.to_string())])
                    .await
                    .map_err(|err| {
                        if err.is_not_found() || err.is_upstream_status(404) {
                            AppError::NotFound(format!("No active contract found for rut {}", rut))
                        } else {
                            err
                        }
                    })
            })
            .await
    }

    pub async fn cost_center_of(&self, employee_id: i64) -> Result<CostCenter, AppError> {
        self.contract_by_employee(employee_id)
            .await?
            .cost_center
            .ok_or_else(|| {
                AppError::NotFound(format!("No cost center for employee {}", employee_id))
            })
    }

    pub async fn branch_of(&self, employee_id: i64) -> Result<Branch, AppError> {
        self.contract_by_employee(employee_id)
            .await?
            .branch
            .ok_or_else(|| AppError::NotFound(format!("No branch for employee {}", employee_id)))
    }

    // ============ Employees ============

    /// Every person, walked with the paginated endpoint and cached as one snapshot.
    pub async fn employees_basic(&self, force: bool) -> Result<Vec<Employee>, AppError> {
        self.caches
            .employees
            .get_or_fetch((), force, || async {
                let items = self
                    .paginate(Collection::Persons, &[], 1, DEFAULT_PAGE_SIZE, true)
                    .await?;
                Ok::<_, AppError>(items.iter().map(map_employee).collect())
            })
            .await
    }

    /// One uncached `limit`/`offset` window over the persons listing.
    ///
    /// When the offset is not aligned to the page size the leading items are skipped
    /// and the window is completed from the following page.
    pub async fn employees_basic_page(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Employee>, AppError> {
        let window = PageWindow::from_limit_offset(limit, offset);
        let root = self.fetch_persons_page(window.page, window.page_size).await?;
        let mut employees = map_employees(&root);
        if window.skip == 0 {
            return Ok(employees);
        }

        let skip = window.skip.min(employees.len());
        employees.drain(..skip);
        let wanted = window.page_size as usize;
        if employees.len() < wanted && has_next_page(&root) {
            let next = self
                .fetch_persons_page(window.page + 1, window.page_size)
                .await?;
            let missing = wanted - employees.len();
            employees.extend(map_employees(&next).into_iter().take(missing));
        }
        Ok(employees)
    }

    async fn fetch_persons_page(&self, page: u32, page_size: u32) -> Result<Value, AppError> {
        let query = [("page", page.to_string()), ("page_size", page_size.to_string())];
        let body = self.client.personas_paginated(&query).await?;
        Ok(parse_body(&body)?)
    }

    /// Resolves a national id to an employee id: cached employee list first, then the
    /// active contract registered under that RUT.
    pub async fn resolve_employee_id(&self, rut: &str) -> Result<i64, AppError> {
        let rut = rut.trim();
        if rut.is_empty() {
            return Err(AppError::BadRequest("rut is required".to_string()));
        }

        match self.employees_basic(false).await {
            Ok(employees) => {
                if let Some(id) = employees.iter().find(|e| e.has_rut(rut)).and_then(|e| e.id) {
                    return Ok(id);
                }
            }
            Err(err) => tracing::warn!("Employee list unavailable for rut lookup: {}", err),
        }

        tracing::debug!("rut {} not in employee list, trying active contracts", rut);
        match self.contract_by_rut(rut).await {
            Ok(contract) => contract
                .employee_id
                .ok_or_else(|| AppError::NotFound(format!("Employee not found for rut {}", rut))),
            Err(AppError::NotFound(_)) => {
                Err(AppError::NotFound(format!("Employee not found for rut {}", rut)))
            }
            Err(err) => Err(err),
        }
    }

    pub async fn resolve_key(&self, key: &str) -> Result<i64, AppError> {
        match EmployeeKey::parse(key) {
            EmployeeKey::Id(id) => Ok(id),
            EmployeeKey::Rut(rut) => self.resolve_employee_id(&rut).await,
        }
    }

    /// Person record enriched with labor data, cached per id.
    pub async fn person_detail(&self, person_id: i64) -> Result<EmployeeDetail, AppError> {
        self.caches
            .person_detail
            .get_or_fetch(person_id, false, || self.fetch_person_detail(person_id))
            .await
    }

    async fn fetch_person_detail(&self, person_id: i64) -> Result<EmployeeDetail, AppError> {
        let body = self.client.persona_detail(person_id).await?;
        let root = parse_body(&body)?;
        if root.is_null() {
            return Err(AppError::NotFound(format!("Person {} not found", person_id)));
        }

        let (mut detail, refs) = map_person_detail(&root);
        if detail.id.is_none() {
            detail.id = Some(person_id);
        }
        self.resolve_catalog_refs(&mut detail, refs).await;

        if detail.needs_labor_fallback() {
            match self.contract_by_employee(person_id).await {
                Ok(contract) => merge_contract(&mut detail, &contract),
                Err(err) => {
                    tracing::debug!("No contract to merge for person {}: {}", person_id, err)
                }
            }
        }

        if detail.needs_labor_fallback() {
            let rut = detail.rut.clone();
            self.fill_from_labor_variants(person_id, rut.as_deref(), &mut detail)
                .await;
        }

        if detail.needs_labor_fallback() {
            tracing::info!(
                "Person {} still missing labor fields: {:?}",
                person_id,
                detail.missing_labor_fields()
            );
        }
        Ok(detail)
    }

    async fn fill_from_labor_variants(
        &self,
        person_id: i64,
        rut: Option<&str>,
        detail: &mut EmployeeDetail,
    ) {
        for path in labor_path_variants(person_id, rut) {
            let body = match self.client.get(&path, &[]).await {
                Ok(body) => body,
                Err(err) if err.is_status(404) => continue,
                Err(err) => {
                    tracing::debug!("Labor variant {} failed: {}", path, err);
                    continue;
                }
            };
            let root = match parse_body(&body) {
                Ok(root) => root,
                Err(err) => {
                    tracing::debug!("Labor variant {} returned invalid JSON: {}", path, err);
                    continue;
                }
            };
            if let Some(node) = first_item(&root) {
                if apply_labor_fields(detail, node) {
                    tracing::debug!(
                        "Labor fields for person {} completed from {}",
                        person_id,
                        path
                    );
                    break;
                }
            }
        }
    }

    /// Basic employee plus detail fields, vacation balance and licenses.
    ///
    /// Balance and license failures degrade to empty values.
    pub async fn complete_employee(&self, employee: &Employee) -> Result<EmployeeDetail, AppError> {
        let mut complete = EmployeeDetail::from_employee(employee);
        let Some(id) = employee.id else {
            return Ok(complete);
        };

        let detail = self.person_detail(id).await?;
        complete.sex = detail.sex;
        complete.has_disability = detail.has_disability;
        complete.job_title = detail.job_title;
        complete.cost_center_code = detail.cost_center_code;
        complete.cost_center_name = detail.cost_center_name;
        complete.branch = detail.branch;
        complete.hire_date = detail.hire_date;
        complete.manager = detail.manager;
        if complete.rut.is_none() {
            complete.rut = detail.rut;
        }

        complete.vacations = Some(match self.vacation_balance(id).await {
            Ok(balance) => balance,
            Err(err) => {
                tracing::warn!("Vacation balance unavailable for employee {}: {}", id, err);
                VacationBalance {
                    employee_id: Some(id),
                    ..Default::default()
                }
            }
        });
        complete.licenses = Some(match self.licenses(id).await {
            Ok(licenses) => licenses,
            Err(err) => {
                tracing::warn!("Licenses unavailable for employee {}: {}", id, err);
                Vec::new()
            }
        });
        Ok(complete)
    }

    /// Complete records for the cached list, or for one `limit`/`offset` window.
    /// An employee whose detail cannot be read is returned with its basic fields only.
    pub async fn employees_complete(
        &self,
        window: Option<(u32, u32)>,
    ) -> Result<Vec<EmployeeDetail>, AppError> {
        let employees = match window {
            Some((limit, offset)) => self.employees_basic_page(limit, offset).await?,
            None => self.employees_basic(false).await?,
        };

        let mut out = Vec::with_capacity(employees.len());
        for employee in &employees {
            match self.complete_employee(employee).await {
                Ok(complete) => out.push(complete),
                Err(err) => {
                    tracing::warn!("Could not enrich employee {:?}: {}", employee.id, err);
                    out.push(EmployeeDetail::from_employee(employee));
                }
            }
        }
        Ok(out)
    }

    /// Complete record for a route key; the basic fields come from the cached list
    /// when the employee is listed there.
    pub async fn employee_by_key(&self, key: &str) -> Result<EmployeeDetail, AppError> {
        let id = self.resolve_key(key).await?;
        let basic = match self.employees_basic(false).await {
            Ok(employees) => employees.into_iter().find(|e| e.id == Some(id)),
            Err(err) => {
                tracing::debug!("Employee list unavailable: {}", err);
                None
            }
        };
        let basic = basic.unwrap_or(Employee {
            id: Some(id),
            ..Default::default()
        });
        self.complete_employee(&basic).await
    }

    // ============ Absences ============

    /// Vacation balance; an empty balance when the endpoint is configured as skipped.
    pub async fn vacation_balance(&self, employee_id: i64) -> Result<VacationBalance, AppError> {
        if self.skip_vacation_balance {
            return Ok(VacationBalance {
                employee_id: Some(employee_id),
                ..Default::default()
            });
        }
        self.caches
            .vacation_balance
            .get_or_fetch(employee_id, false, || async {
                let path = format!("/persona/{}/saldo_vacaciones/", employee_id);
                let root = parse_body(&self.client.get(&path, &[]).await?)?;
                Ok::<_, AppError>(match first_item(&root) {
                    Some(node) => map_vacation_balance(node, employee_id),
                    None => VacationBalance {
                        employee_id: Some(employee_id),
                        ..Default::default()
                    },
                })
            })
            .await
    }

    async fn fetch_absences(
        &self,
        employee_id: i64,
        absence_type: &str,
    ) -> Result<Vec<LeaveRecord>, AppError> {
        let query = [
            ("empleado", employee_id.to_string()),
            ("tipoAusencia", absence_type.to_string()),
        ];
        let body = self.client.get("/ausencia/", &query).await?;
        Ok(map_leave_records(&parse_body(&body)?))
    }

    pub async fn licenses(&self, employee_id: i64) -> Result<Vec<LeaveRecord>, AppError> {
        self.caches
            .licenses
            .get_or_fetch(employee_id, false, || self.fetch_absences(employee_id, "licencia"))
            .await
    }

    pub async fn vacation_detail(&self, employee_id: i64) -> Result<Vec<LeaveRecord>, AppError> {
        self.caches
            .vacation_detail
            .get_or_fetch(employee_id, false, || self.fetch_absences(employee_id, "vacaciones"))
            .await
    }

    /// Vacation summary from the first path variant that returns records. Only non-empty
    /// results are cached; when every variant fails the result is empty.
    pub async fn vacation_summary(
        &self,
        employee_id: i64,
    ) -> Result<Vec<VacationSummary>, AppError> {
        let cache = &self.caches.vacation_summary;
        if let Some(fresh) = cache.get_fresh(&employee_id).await {
            return Ok(fresh);
        }

        for path in vacation_summary_paths(employee_id) {
            match self.client.get(&path, &[]).await {
                Ok(body) => match parse_body(&body) {
                    Ok(root) => {
                        let summaries = map_vacation_summaries(&root);
                        if !summaries.is_empty() {
                            cache.insert(employee_id, summaries.clone()).await;
                            return Ok(summaries);
                        }
                    }
                    Err(err) => tracing::debug!("Invalid JSON from {}: {}", path, err),
                },
                Err(err) if err.is_status(404) => {}
                Err(err) => tracing::debug!("Vacation summary variant {} failed: {}", path, err),
            }
        }

        if let Some(stale) = cache.entry(&employee_id).await {
            tracing::warn!("Serving stale vacation summary for employee {}", employee_id);
            return Ok(stale.value);
        }
        Ok(Vec::new())
    }

    /// Vacations overlapping `[desde, hasta]` (today when both are absent) across every
    /// absence path variant, deduplicated by id and joined with the employee list.
    pub async fn current_vacations(
        &self,
        desde: Option<&str>,
        hasta: Option<&str>,
        only_approved: Option<bool>,
    ) -> Result<Vec<VacationSummary>, AppError> {
        let window = current_vacation_window(desde, hasta, self.today());
        let only_approved = only_approved.unwrap_or(true);

        let mut seen = HashSet::new();
        let mut records = Vec::new();
        let mut any_success = false;
        let mut hard_error = None;

        for path in CURRENT_VACATION_PATHS {
            let body = match self.client.get(path, &[]).await {
                Ok(body) => body,
                Err(err) if err.is_status(404) => continue,
                Err(err) => {
                    tracing::warn!("Vacation source {} failed: {}", path, err);
                    hard_error = Some(err);
                    continue;
                }
            };
            any_success = true;
            match parse_body(&body) {
                Ok(root) => {
                    for record in map_leave_records(&root) {
                        if let Some(id) = record.id {
                            if !seen.insert(id) {
                                continue;
                            }
                        }
                        records.push(record);
                    }
                }
                Err(err) => tracing::debug!("Invalid JSON from {}: {}", path, err),
            }
        }

        // Only 404s everywhere means "no vacations"; any other failure is reported
        if !any_success {
            if let Some(err) = hard_error {
                return Err(err.into());
            }
        }

        let selected = select_current_vacations(records, &window, only_approved);

        let employees: HashMap<i64, Employee> = match self.employees_basic(false).await {
            Ok(list) => list
                .into_iter()
                .filter_map(|e| e.id.map(|id| (id, e)))
                .collect(),
            Err(err) => {
                tracing::warn!("Employee list unavailable for vacation join: {}", err);
                HashMap::new()
            }
        };

        Ok(selected
            .into_iter()
            .map(|record| {
                let employee = record.employee_id.map(|id| match employees.get(&id) {
                    Some(employee) => EmployeeSummary::from(employee),
                    None => EmployeeSummary {
                        id: Some(id),
                        ..Default::default()
                    },
                });
                VacationSummary {
                    id: record.id,
                    employee,
                    from: record.from,
                    to: record.to,
                    days: record.days,
                    half_days: record.half_days,
                    approved: record.approved,
                    vacation_type: Some("vacaciones".to_string()),
                    ..Default::default()
                }
            })
            .collect())
    }
}
