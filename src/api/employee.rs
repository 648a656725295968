use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::auth::AuthUser,
    model::employee::Employee,
    utils::{
        code_cache, code_filter,
        db_utils::{build_update_sql, execute_update},
    },
};

/// Columns a partial employee update may touch.
const EMPLOYEE_UPDATE_COLUMNS: &[&str] = &[
    "employee_code",
    "first_name",
    "last_name",
    "email",
    "phone",
    "branch_id",
    "department_id",
    "designation_id",
    "grade_id",
    "join_date",
    "exit_date",
    "status",
];

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "EMP-3000")]
    pub employee_code: String,
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
    #[schema(example = "+8801712345678")]
    pub phone: Option<String>,
    #[schema(example = 2)]
    pub branch_id: Option<u64>,
    #[schema(example = 1)]
    pub department_id: Option<u64>,
    #[schema(example = 2)]
    pub designation_id: Option<u64>,
    #[schema(example = 1)]
    pub grade_id: Option<u64>,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub join_date: NaiveDate,
    #[schema(example = "2026-12-31", format = "date", value_type = String, nullable = true)]
    pub exit_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub branch_id: Option<u64>,
    pub department_id: Option<u64>,
    pub designation_id: Option<u64>,
    pub grade_id: Option<u64>,
    pub status: Option<String>,
    /// Search by name, code or email
    pub search: Option<String>,
    #[schema(value_type = String, format = "date")]
    pub join_from: Option<NaiveDate>,
    #[schema(value_type = String, format = "date")]
    pub join_to: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

/// true  => employee code AVAILABLE
/// false => employee code TAKEN
pub async fn is_code_available(code: &str, pool: &MySqlPool) -> bool {
    // 1. Cuckoo filter: fast negative
    if !code_filter::might_exist(code) {
        return true;
    }

    // 2. Moka cache: fast positive
    if code_cache::is_taken(code).await {
        return false;
    }

    // 3. Database fallback
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE UPPER(employee_code) = ? LIMIT 1)",
    )
    .bind(code.trim().to_uppercase())
    .fetch_one(pool)
    .await
    .unwrap_or(true); // fail-safe

    !exists
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Object, example = json!({
            "message": "Employee created successfully"
        })),
        (status = 409, description = "Employee code taken", body = Object, example = json!({
            "message": "Employee code already in use"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let code = payload.employee_code.trim();
    if code.is_empty() || payload.first_name.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Employee code and first name are required"
        })));
    }

    if let Some(exit) = payload.exit_date {
        if exit < payload.join_date {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "exit_date cannot precede join_date"
            })));
        }
    }

    if !is_code_available(code, pool.get_ref()).await {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "Employee code already in use"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO employees
        (employee_code, first_name, last_name, email, phone,
         branch_id, department_id, designation_id, grade_id,
         join_date, exit_date, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'active')
        "#,
    )
    .bind(code)
    .bind(payload.first_name.trim())
    .bind(payload.last_name.trim())
    .bind(payload.email.trim())
    .bind(payload.phone.as_deref())
    .bind(payload.branch_id)
    .bind(payload.department_id)
    .bind(payload.designation_id)
    .bind(payload.grade_id)
    .bind(payload.join_date)
    .bind(payload.exit_date)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            // keep the fast availability structures in step with the insert
            code_filter::insert(code);
            code_cache::mark_taken(code).await;

            Ok(HttpResponse::Created().json(json!({
                "message": "Employee created successfully"
            })))
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "Employee code already in use"
                    })));
                }
            }

            error!(error = %e, "Failed to create employee");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Something went wrong, Contact with system admin"
            })))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<sqlx::types::JsonValue> = Vec::new();

    if let Some(branch_id) = query.branch_id {
        conditions.push("branch_id = ?");
        bindings.push(branch_id.into());
    }

    if let Some(department_id) = query.department_id {
        conditions.push("department_id = ?");
        bindings.push(department_id.into());
    }

    if let Some(designation_id) = query.designation_id {
        conditions.push("designation_id = ?");
        bindings.push(designation_id.into());
    }

    if let Some(grade_id) = query.grade_id {
        conditions.push("grade_id = ?");
        bindings.push(grade_id.into());
    }

    if let Some(status) = &query.status {
        conditions.push("status = ?");
        bindings.push(status.clone().into());
    }

    if let Some(search) = &query.search {
        conditions.push("(first_name LIKE ? OR last_name LIKE ? OR employee_code LIKE ? OR email LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(like.clone().into());
        bindings.push(like.clone().into());
        bindings.push(like.clone().into());
        bindings.push(like.into());
    }

    if let Some(join_from) = query.join_from {
        conditions.push("join_date >= ?");
        bindings.push(join_from.to_string().into());
    }

    if let Some(join_to) = query.join_to {
        conditions.push("join_date <= ?");
        bindings.push(join_to.to_string().into());
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) as total FROM employees {}", where_clause);
    debug!(sql = %count_sql, bindings = ?bindings, "Counting employees");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count employees");
        ErrorInternalServerError("Database error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT * FROM employees {} ORDER BY id DESC LIMIT ? OFFSET ?",
        where_clause
    );
    debug!(sql = %data_sql, bindings = ?bindings, page, per_page, offset, "Fetching employees");

    let mut data_query = sqlx::query_as::<_, Employee>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let employees = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch employees");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/v1/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();

    let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to fetch employee");
            ErrorInternalServerError("Internal Server Error")
        })?;

    match employee {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        }))),
    }
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/v1/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Employee updated successfully"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();

    // renaming the code must not collide with another employee
    if let Some(code) = body.get("employee_code").and_then(|v| v.as_str()) {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM employees WHERE UPPER(employee_code) = ? AND id <> ? LIMIT 1)",
        )
        .bind(code.trim().to_uppercase())
        .bind(employee_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Duplicate code check failed");
            ErrorInternalServerError("Internal Server Error")
        })?;

        if taken {
            return Ok(HttpResponse::Conflict().json(json!({
                "message": "Employee code already in use"
            })));
        }
    }

    let update = build_update_sql(
        "employees",
        &body,
        EMPLOYEE_UPDATE_COLUMNS,
        "id",
        employee_id,
    )?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee updated successfully"
    })))
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/v1/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();

    let code: Option<(String,)> =
        sqlx::query_as("SELECT employee_code FROM employees WHERE id = ?")
            .bind(employee_id)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, employee_id, "Failed to fetch employee for delete");
                ErrorInternalServerError("Internal Server Error")
            })?;

    let Some((code,)) = code else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    };

    let result = sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(employee_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) => {
            if res.rows_affected() == 0 {
                return Ok(HttpResponse::NotFound().json(json!({
                    "message": "Employee not found"
                })));
            }

            // the code becomes available again
            code_filter::remove(&code);

            Ok(HttpResponse::Ok().json(json!({
                "message": "Successfully deleted"
            })))
        }

        Err(e) => {
            error!(error = %e, employee_id, "Failed to delete employee");

            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

#[derive(Debug, Deserialize)]
struct EmployeeImportRecord {
    employee_code: String,
    first_name: String,
    last_name: String,
    email: String,
    join_date: NaiveDate,
    exit_date: Option<NaiveDate>,
}

/// Import employees from CSV
#[utoipa::path(
    post,
    path = "/api/v1/employees/import",
    request_body(content = String, content_type = "text/csv"),
    responses(
        (status = 200, description = "Rows imported", body = Object, example = json!({
            "message": "Employees imported",
            "inserted": 40,
            "skipped": 2
        }))
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn import_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Bytes,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let mut reader = csv::Reader::from_reader(body.as_ref());
    let mut inserted = 0usize;
    let mut skipped = 0usize;

    for row in reader.deserialize::<EmployeeImportRecord>() {
        let record = match row {
            Ok(r) => r,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };

        let code = record.employee_code.trim();
        if code.is_empty() || !is_code_available(code, pool.get_ref()).await {
            skipped += 1;
            continue;
        }

        let result = sqlx::query(
            r#"
            INSERT INTO employees
            (employee_code, first_name, last_name, email, join_date, exit_date, status)
            VALUES (?, ?, ?, ?, ?, ?, 'active')
            "#,
        )
        .bind(code)
        .bind(record.first_name.trim())
        .bind(record.last_name.trim())
        .bind(record.email.trim())
        .bind(record.join_date)
        .bind(record.exit_date)
        .execute(pool.get_ref())
        .await;

        match result {
            Ok(_) => {
                code_filter::insert(code);
                code_cache::mark_taken(code).await;
                inserted += 1;
            }
            Err(e) => {
                error!(error = %e, code, "Failed to import employee row");
                skipped += 1;
            }
        }
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employees imported",
        "inserted": inserted,
        "skipped": skipped
    })))
}

/// Export employees as CSV
#[utoipa::path(
    get,
    path = "/api/v1/employees/export",
    responses(
        (status = 200, description = "CSV attachment")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn export_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employees =
        sqlx::query_as::<_, Employee>("SELECT * FROM employees ORDER BY employee_code")
            .fetch_all(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch employees for export");
                ErrorInternalServerError("Internal Server Error")
            })?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "employee_code",
            "first_name",
            "last_name",
            "email",
            "phone",
            "join_date",
            "exit_date",
            "status",
        ])
        .map_err(ErrorInternalServerError)?;

    for e in &employees {
        writer
            .write_record([
                e.employee_code.as_str(),
                e.first_name.as_str(),
                e.last_name.as_str(),
                e.email.as_str(),
                e.phone.as_deref().unwrap_or(""),
                &e.join_date.to_string(),
                &e.exit_date.map(|d| d.to_string()).unwrap_or_default(),
                e.status.as_str(),
            ])
            .map_err(ErrorInternalServerError)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ErrorInternalServerError(e.to_string()))?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header(("Content-Disposition", "attachment; filename=\"employees.csv\""))
        .body(bytes))
}
