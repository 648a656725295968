use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, warn};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::domain::calendar::{MonthRef, Tenure};
use crate::domain::grid::{CellEdit, screen_edits};
use crate::domain::status::{AttendanceStatus, pay_days};
use crate::domain::workflow::{MonthState, TransitionError};
use crate::model::attendance::{AttendanceCellRow, AttendanceMonthRow};
use crate::model::employee::EmployeeTenureRow;

/// The grid pages twelve employees at a time.
const GRID_PAGE_SIZE: u32 = 12;

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct HistoryQuery {
    #[schema(example = 3)]
    pub month: u32,
    #[schema(example = 2024)]
    pub year: i32,
    #[schema(example = 1)]
    pub page: Option<u32>,
    /// Case-insensitive substring over name and employee code
    pub search: Option<String>,
    #[schema(value_type = String, format = "date")]
    pub join_from: Option<NaiveDate>,
    #[schema(value_type = String, format = "date")]
    pub join_to: Option<NaiveDate>,
    #[schema(value_type = String, format = "date")]
    pub exit_from: Option<NaiveDate>,
    #[schema(value_type = String, format = "date")]
    pub exit_to: Option<NaiveDate>,
}

#[derive(Deserialize, ToSchema)]
pub struct BulkMarkRequest {
    #[schema(example = 2024)]
    pub year: i32,
    #[schema(example = 3)]
    pub month: u32,
    pub entries: Vec<CellEdit>,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryRow {
    pub employee_id: u64,
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    #[schema(example = "John Doe")]
    pub employee_name: String,
    #[schema(value_type = String, format = "date")]
    pub join_date: NaiveDate,
    #[schema(value_type = String, format = "date", nullable = true)]
    pub exit_date: Option<NaiveDate>,
    /// day-of-month -> status; days never marked carry no entry
    #[schema(value_type = Object)]
    pub cells: BTreeMap<u32, AttendanceStatus>,
    /// Cells this month not counted as LOP/LWP. Derived, never stored.
    #[schema(example = 22)]
    pub pay_days: u32,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryResponse {
    pub data: Vec<HistoryRow>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub state: MonthState,
    #[schema(example = 31)]
    pub days_in_month: u32,
}

// Typed SQLx binding for the dynamically built WHERE clause
enum FilterValue {
    Str(String),
    Date(NaiveDate),
}

fn month_ref(year: i32, month: u32) -> actix_web::Result<MonthRef> {
    MonthRef::new(year, month)
        .ok_or_else(|| actix_web::error::ErrorBadRequest("Invalid month or year"))
}

fn reject(err: TransitionError) -> HttpResponse {
    HttpResponse::Conflict().json(json!({ "message": err.to_string() }))
}

fn in_placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

async fn load_state(pool: &MySqlPool, m: MonthRef) -> Result<MonthState, sqlx::Error> {
    let row: Option<AttendanceMonthRow> =
        sqlx::query_as("SELECT year, month, state FROM attendance_months WHERE year = ? AND month = ?")
            .bind(m.year())
            .bind(m.month())
            .fetch_optional(pool)
            .await?;

    // A month never touched has no row and starts out in Viewing.
    Ok(row
        .and_then(|r| MonthState::from_str(&r.state).ok())
        .unwrap_or(MonthState::Viewing))
}

async fn store_state<'e, E>(executor: E, m: MonthRef, state: MonthState) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::MySql>,
{
    sqlx::query(
        r#"
        INSERT INTO attendance_months (year, month, state)
        VALUES (?, ?, ?)
        ON DUPLICATE KEY UPDATE state = VALUES(state)
        "#,
    )
    .bind(m.year())
    .bind(m.month())
    .bind(state.to_string())
    .execute(executor)
    .await?;
    Ok(())
}

async fn fetch_tenure_rows_by_id(
    pool: &MySqlPool,
    ids: &[u64],
) -> Result<Vec<EmployeeTenureRow>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT id, employee_code, first_name, last_name, join_date, exit_date
         FROM employees WHERE id IN ({})",
        in_placeholders(ids.len())
    );
    let mut q = sqlx::query_as::<_, EmployeeTenureRow>(&sql);
    for id in ids {
        q = q.bind(id);
    }
    q.fetch_all(pool).await
}

fn tenure_map(rows: &[EmployeeTenureRow]) -> HashMap<u64, Tenure> {
    rows.iter()
        .map(|r| {
            (
                r.id,
                Tenure {
                    join_date: r.join_date,
                    exit_date: r.exit_date,
                },
            )
        })
        .collect()
}

async fn upsert_cells(
    tx: &mut sqlx::Transaction<'_, sqlx::MySql>,
    m: MonthRef,
    edits: &[CellEdit],
) -> Result<(), sqlx::Error> {
    for edit in edits {
        sqlx::query(
            r#"
            INSERT INTO attendance_cells (employee_id, year, month, day, status)
            VALUES (?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE status = VALUES(status)
            "#,
        )
        .bind(edit.employee_id)
        .bind(m.year())
        .bind(m.month())
        .bind(edit.day)
        .bind(edit.status.to_string())
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Begin editing a month's grid
#[utoipa::path(
    post,
    path = "/api/v1/attendance/edit/{month}/{year}",
    params(
        ("month", Path, description = "Calendar month, 1-12"),
        ("year", Path, description = "Calendar year")
    ),
    responses(
        (status = 200, description = "Editing started"),
        (status = 409, description = "Month is locked", body = Object, example = json!({
            "message": "Month is locked. Unlock it before editing"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn begin_edit(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u32, i32)>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let (month, year) = path.into_inner();
    let m = month_ref(year, month)?;

    let state = load_state(pool.get_ref(), m).await.map_err(|e| {
        error!(error = %e, year, month, "Failed to load month state");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let next = match state.begin_edit() {
        Ok(next) => next,
        Err(e) => return Ok(reject(e)),
    };

    store_state(pool.get_ref(), m, next).await.map_err(|e| {
        error!(error = %e, year, month, "Failed to store month state");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Editing started",
        "state": next
    })))
}

/// Save a batch of cell edits
#[utoipa::path(
    post,
    path = "/api/v1/attendance/bulk-mark",
    request_body = BulkMarkRequest,
    responses(
        (status = 200, description = "Edits saved", body = Object, example = json!({
            "message": "Attendance saved",
            "state": "saved",
            "applied": 24,
            "skipped": 2
        })),
        (status = 409, description = "Month not in edit mode")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn bulk_mark(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<BulkMarkRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let m = month_ref(payload.year, payload.month)?;

    let state = load_state(pool.get_ref(), m).await.map_err(|e| {
        error!(error = %e, "Failed to load month state");
        ErrorInternalServerError("Internal Server Error")
    })?;

    // Saving is only legal mid-edit; the same call decides the next state.
    let next = match state.save() {
        Ok(next) => next,
        Err(e) => return Ok(reject(e)),
    };

    let mut ids: Vec<u64> = payload.entries.iter().map(|e| e.employee_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let rows = fetch_tenure_rows_by_id(pool.get_ref(), &ids)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch employee tenures");
            ErrorInternalServerError("Internal Server Error")
        })?;
    let tenures = tenure_map(&rows);

    let screened = screen_edits(payload.entries.clone(), &tenures, m);

    let mut tx = pool.get_ref().begin().await.map_err(|e| {
        error!(error = %e, "Failed to open transaction");
        ErrorInternalServerError("Internal Server Error")
    })?;

    upsert_cells(&mut tx, m, &screened.eligible)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to save attendance cells");
            ErrorInternalServerError("Internal Server Error")
        })?;

    store_state(&mut *tx, m, next).await.map_err(|e| {
        error!(error = %e, "Failed to store month state");
        ErrorInternalServerError("Internal Server Error")
    })?;

    tx.commit().await.map_err(|e| {
        error!(error = %e, "Failed to commit attendance save");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance saved",
        "state": next,
        "applied": screened.eligible.len(),
        "skipped": screened.skipped.len()
    })))
}

/// Lock a saved month
#[utoipa::path(
    put,
    path = "/api/v1/attendance/lock/{month}/{year}",
    params(
        ("month", Path, description = "Calendar month, 1-12"),
        ("year", Path, description = "Calendar year")
    ),
    responses(
        (status = 200, description = "Month locked"),
        (status = 409, description = "Month was never saved", body = Object, example = json!({
            "message": "Save the attendance before locking"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn lock_month(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u32, i32)>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let (month, year) = path.into_inner();
    let m = month_ref(year, month)?;

    let state = load_state(pool.get_ref(), m).await.map_err(|e| {
        error!(error = %e, year, month, "Failed to load month state");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let next = match state.lock() {
        Ok(next) => next,
        Err(e) => return Ok(reject(e)),
    };

    store_state(pool.get_ref(), m, next).await.map_err(|e| {
        error!(error = %e, year, month, "Failed to store month state");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Month locked",
        "state": next
    })))
}

/// Unlock a locked month (Admin)
#[utoipa::path(
    put,
    path = "/api/v1/attendance/unlock/{month}/{year}",
    params(
        ("month", Path, description = "Calendar month, 1-12"),
        ("year", Path, description = "Calendar year")
    ),
    responses(
        (status = 200, description = "Month unlocked"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Month is not locked")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn unlock_month(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u32, i32)>,
) -> actix_web::Result<impl Responder> {
    // Unlock stays with administrators; everyone else is told to ask one.
    auth.require_admin()?;

    let (month, year) = path.into_inner();
    let m = month_ref(year, month)?;

    let state = load_state(pool.get_ref(), m).await.map_err(|e| {
        error!(error = %e, year, month, "Failed to load month state");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let next = match state.unlock() {
        Ok(next) => next,
        Err(e) => return Ok(reject(e)),
    };

    store_state(pool.get_ref(), m, next).await.map_err(|e| {
        error!(error = %e, year, month, "Failed to store month state");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Month unlocked",
        "state": next
    })))
}

/// Month grid with derived pay days
#[utoipa::path(
    get,
    path = "/api/v1/attendance/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Paged attendance grid", body = HistoryResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<HistoryQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let m = month_ref(query.year, query.month)?;
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * GRID_PAGE_SIZE;

    let state = load_state(pool.get_ref(), m).await.map_err(|e| {
        error!(error = %e, "Failed to load month state");
        ErrorInternalServerError("Internal Server Error")
    })?;

    // ---------- visibility + filters ----------
    // Payroll cutoff: joined before the previous month began, not exited
    // before the selected month began.
    let mut where_sql =
        String::from(" WHERE join_date < ? AND (exit_date IS NULL OR exit_date > ?)");
    let mut args: Vec<FilterValue> = vec![
        FilterValue::Date(m.prev().first_day()),
        FilterValue::Date(m.first_day()),
    ];

    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        where_sql.push_str(" AND (first_name LIKE ? OR last_name LIKE ? OR employee_code LIKE ?)");
        let like = format!("%{}%", search.trim());
        args.push(FilterValue::Str(like.clone()));
        args.push(FilterValue::Str(like.clone()));
        args.push(FilterValue::Str(like));
    }

    if let Some(join_from) = query.join_from {
        where_sql.push_str(" AND join_date >= ?");
        args.push(FilterValue::Date(join_from));
    }
    if let Some(join_to) = query.join_to {
        where_sql.push_str(" AND join_date <= ?");
        args.push(FilterValue::Date(join_to));
    }
    if let Some(exit_from) = query.exit_from {
        where_sql.push_str(" AND exit_date >= ?");
        args.push(FilterValue::Date(exit_from));
    }
    if let Some(exit_to) = query.exit_to {
        where_sql.push_str(" AND exit_date <= ?");
        args.push(FilterValue::Date(exit_to));
    }

    // ---------- COUNT query ----------
    let count_sql = format!("SELECT COUNT(*) FROM employees{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::Str(s) => count_q.bind(s.clone()),
            FilterValue::Date(d) => count_q.bind(*d),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count grid employees");
        ErrorInternalServerError("Internal Server Error")
    })?;

    // ---------- DATA query ----------
    let data_sql = format!(
        "SELECT id, employee_code, first_name, last_name, join_date, exit_date
         FROM employees{}
         ORDER BY employee_code
         LIMIT ? OFFSET ?",
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, EmployeeTenureRow>(&data_sql);
    for arg in &args {
        data_q = match arg {
            FilterValue::Str(s) => data_q.bind(s.clone()),
            FilterValue::Date(d) => data_q.bind(*d),
        };
    }

    let employees = data_q
        .bind(GRID_PAGE_SIZE as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch grid employees");
            ErrorInternalServerError("Internal Server Error")
        })?;

    // ---------- cells for the page ----------
    let ids: Vec<u64> = employees.iter().map(|e| e.id).collect();
    let mut cells_by_employee: HashMap<u64, BTreeMap<u32, AttendanceStatus>> = HashMap::new();

    if !ids.is_empty() {
        let cells_sql = format!(
            "SELECT employee_id, day, status FROM attendance_cells
             WHERE year = ? AND month = ? AND employee_id IN ({})",
            in_placeholders(ids.len())
        );
        let mut cells_q = sqlx::query_as::<_, AttendanceCellRow>(&cells_sql)
            .bind(m.year())
            .bind(m.month());
        for id in &ids {
            cells_q = cells_q.bind(id);
        }

        let cell_rows = cells_q.fetch_all(pool.get_ref()).await.map_err(|e| {
            error!(error = %e, "Failed to fetch attendance cells");
            ErrorInternalServerError("Internal Server Error")
        })?;

        for row in cell_rows {
            match AttendanceStatus::from_str(&row.status) {
                Ok(parsed) => {
                    cells_by_employee
                        .entry(row.employee_id)
                        .or_default()
                        .insert(row.day as u32, parsed);
                }
                Err(_) => warn!(
                    employee_id = row.employee_id,
                    day = row.day,
                    status = %row.status,
                    "Unknown status code in storage"
                ),
            }
        }
    }

    let data: Vec<HistoryRow> = employees
        .into_iter()
        .map(|e| {
            let cells = cells_by_employee.remove(&e.id).unwrap_or_default();
            let pay = pay_days(cells.values());
            HistoryRow {
                employee_id: e.id,
                employee_code: e.employee_code,
                employee_name: format!("{} {}", e.first_name, e.last_name),
                join_date: e.join_date,
                exit_date: e.exit_date,
                cells,
                pay_days: pay,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(HistoryResponse {
        data,
        page,
        per_page: GRID_PAGE_SIZE,
        total,
        state,
        days_in_month: m.days(),
    }))
}

/// Export a locked month as CSV
#[utoipa::path(
    get,
    path = "/api/v1/attendance/export/{month}/{year}",
    params(
        ("month", Path, description = "Calendar month, 1-12"),
        ("year", Path, description = "Calendar year")
    ),
    responses(
        (status = 200, description = "CSV attachment"),
        (status = 409, description = "Month not locked", body = Object, example = json!({
            "message": "Lock the month before exporting"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn export_month(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u32, i32)>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let (month, year) = path.into_inner();
    let m = month_ref(year, month)?;

    let state = load_state(pool.get_ref(), m).await.map_err(|e| {
        error!(error = %e, year, month, "Failed to load month state");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if !state.can_export() {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "Lock the month before exporting"
        })));
    }

    let employees = sqlx::query_as::<_, EmployeeTenureRow>(
        "SELECT id, employee_code, first_name, last_name, join_date, exit_date
         FROM employees
         WHERE join_date < ? AND (exit_date IS NULL OR exit_date > ?)
         ORDER BY employee_code",
    )
    .bind(m.prev().first_day())
    .bind(m.first_day())
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch employees for export");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let cell_rows = sqlx::query_as::<_, AttendanceCellRow>(
        "SELECT employee_id, day, status FROM attendance_cells WHERE year = ? AND month = ?",
    )
    .bind(m.year())
    .bind(m.month())
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch cells for export");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let mut cells_by_employee: HashMap<u64, BTreeMap<u32, AttendanceStatus>> = HashMap::new();
    for row in cell_rows {
        if let Ok(parsed) = AttendanceStatus::from_str(&row.status) {
            cells_by_employee
                .entry(row.employee_id)
                .or_default()
                .insert(row.day as u32, parsed);
        }
    }

    let days = m.days();
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["employee_code".to_string(), "employee_name".to_string()];
    header.extend((1..=days).map(|d| d.to_string()));
    header.push("pay_days".to_string());
    writer
        .write_record(&header)
        .map_err(ErrorInternalServerError)?;

    for e in &employees {
        let cells = cells_by_employee.remove(&e.id).unwrap_or_default();
        let mut record = vec![
            e.employee_code.clone(),
            format!("{} {}", e.first_name, e.last_name),
        ];
        for day in 1..=days {
            record.push(cells.get(&day).map(|s| s.to_string()).unwrap_or_default());
        }
        record.push(pay_days(cells.values()).to_string());
        writer
            .write_record(&record)
            .map_err(ErrorInternalServerError)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ErrorInternalServerError(e.to_string()))?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            "Content-Disposition",
            format!(
                "attachment; filename=\"attendance-{}-{:02}.csv\"",
                m.year(),
                m.month()
            ),
        ))
        .body(bytes))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ImportQuery {
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Deserialize)]
struct ImportRecord {
    employee_code: String,
    day: u32,
    status: String,
}

/// Import month cells from CSV (employee_code, day, status)
#[utoipa::path(
    post,
    path = "/api/v1/attendance/import",
    params(ImportQuery),
    request_body(content = String, content_type = "text/csv"),
    responses(
        (status = 200, description = "Rows imported", body = Object, example = json!({
            "message": "Attendance imported",
            "applied": 120,
            "skipped": 3,
            "unknown_codes": 1
        })),
        (status = 409, description = "Month is locked")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn import_month(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ImportQuery>,
    body: web::Bytes,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let m = month_ref(query.year, query.month)?;

    let state = load_state(pool.get_ref(), m).await.map_err(|e| {
        error!(error = %e, "Failed to load month state");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if state == MonthState::Locked {
        return Ok(reject(TransitionError::MonthLocked));
    }

    let mut reader = csv::Reader::from_reader(body.as_ref());
    let mut records: Vec<ImportRecord> = Vec::new();
    let mut bad_rows = 0usize;
    for row in reader.deserialize::<ImportRecord>() {
        match row {
            Ok(record) => records.push(record),
            Err(_) => bad_rows += 1,
        }
    }

    if records.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "No importable rows found in the file"
        })));
    }

    // resolve employee codes
    let mut codes: Vec<String> = records
        .iter()
        .map(|r| r.employee_code.trim().to_uppercase())
        .collect();
    codes.sort();
    codes.dedup();

    let sql = format!(
        "SELECT id, employee_code, first_name, last_name, join_date, exit_date
         FROM employees WHERE UPPER(employee_code) IN ({})",
        in_placeholders(codes.len())
    );
    let mut q = sqlx::query_as::<_, EmployeeTenureRow>(&sql);
    for code in &codes {
        q = q.bind(code);
    }
    let rows = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to resolve employee codes");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let id_by_code: HashMap<String, u64> = rows
        .iter()
        .map(|r| (r.employee_code.trim().to_uppercase(), r.id))
        .collect();
    let tenures = tenure_map(&rows);

    let mut unknown_codes = 0usize;
    let mut edits = Vec::with_capacity(records.len());
    for record in records {
        let Some(&employee_id) = id_by_code.get(&record.employee_code.trim().to_uppercase())
        else {
            unknown_codes += 1;
            continue;
        };
        let Ok(status) = AttendanceStatus::from_str(record.status.trim()) else {
            bad_rows += 1;
            continue;
        };
        edits.push(CellEdit {
            employee_id,
            day: record.day,
            status,
        });
    }

    let screened = screen_edits(edits, &tenures, m);

    let mut tx = pool.get_ref().begin().await.map_err(|e| {
        error!(error = %e, "Failed to open transaction");
        ErrorInternalServerError("Internal Server Error")
    })?;

    upsert_cells(&mut tx, m, &screened.eligible)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to import attendance cells");
            ErrorInternalServerError("Internal Server Error")
        })?;

    tx.commit().await.map_err(|e| {
        error!(error = %e, "Failed to commit attendance import");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance imported",
        "applied": screened.eligible.len(),
        "skipped": screened.skipped.len() + bad_rows,
        "unknown_codes": unknown_codes
    })))
}

/// CSV template for attendance import
#[utoipa::path(
    get,
    path = "/api/v1/attendance/template",
    responses(
        (status = 200, description = "CSV attachment")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn template(auth: AuthUser) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["employee_code", "day", "status"])
        .map_err(ErrorInternalServerError)?;
    writer
        .write_record(["EMP-001", "1", "P"])
        .map_err(ErrorInternalServerError)?;

    let bytes = writer
        .into_inner()
        .map_err(|e| ErrorInternalServerError(e.to_string()))?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            "Content-Disposition",
            "attachment; filename=\"attendance-template.csv\"",
        ))
        .body(bytes))
}
