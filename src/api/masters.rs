use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::model::master::{MasterRecord, SubDepartment};

/// The name-keyed master resources. One table each, same contract:
/// list / create / update / delete with a duplicate-name guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterKind {
    Branch,
    Department,
    Designation,
    Grade,
    Category,
    TerminationReason,
    ResignationReason,
}

impl MasterKind {
    pub fn table(self) -> &'static str {
        match self {
            MasterKind::Branch => "branches",
            MasterKind::Department => "departments",
            MasterKind::Designation => "designations",
            MasterKind::Grade => "grades",
            MasterKind::Category => "categories",
            MasterKind::TerminationReason => "termination_reasons",
            MasterKind::ResignationReason => "resignation_reasons",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MasterKind::Branch => "Branch",
            MasterKind::Department => "Department",
            MasterKind::Designation => "Designation",
            MasterKind::Grade => "Grade",
            MasterKind::Category => "Category",
            MasterKind::TerminationReason => "Termination reason",
            MasterKind::ResignationReason => "Resignation reason",
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct NamePayload {
    #[schema(example = "Head Office")]
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SubDepartmentPayload {
    #[schema(example = 10)]
    pub department_id: u64,
    #[schema(example = "Payroll Operations")]
    pub name: String,
}

/// Comparison form for the duplicate guard.
pub fn normalized_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Case-insensitive, trimmed collision check against the resource's table.
/// `exclude_id` skips the row being renamed.
async fn name_taken(
    pool: &MySqlPool,
    table: &str,
    name: &str,
    exclude_id: Option<u64>,
) -> Result<bool, sqlx::Error> {
    let sql = match exclude_id {
        Some(_) => format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE LOWER(TRIM(name)) = ? AND id <> ? LIMIT 1)",
            table
        ),
        None => format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE LOWER(TRIM(name)) = ? LIMIT 1)",
            table
        ),
    };

    let mut q = sqlx::query_scalar::<_, bool>(&sql).bind(normalized_name(name));
    if let Some(id) = exclude_id {
        q = q.bind(id);
    }
    q.fetch_one(pool).await
}

pub async fn list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    kind: web::Data<MasterKind>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let sql = format!(
        "SELECT id, name, created_at FROM {} ORDER BY name",
        kind.table()
    );
    let records = sqlx::query_as::<_, MasterRecord>(&sql)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, table = kind.table(), "Failed to list master records");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(json!({ "data": records })))
}

pub async fn create(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    kind: web::Data<MasterKind>,
    payload: web::Json<NamePayload>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Name must not be empty"
        })));
    }

    // Reject the collision before any write happens.
    let taken = name_taken(pool.get_ref(), kind.table(), name, None)
        .await
        .map_err(|e| {
            error!(error = %e, table = kind.table(), "Duplicate check failed");
            ErrorInternalServerError("Internal Server Error")
        })?;

    if taken {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": format!("{} with this name already exists", kind.label())
        })));
    }

    let sql = format!("INSERT INTO {} (name) VALUES (?)", kind.table());
    sqlx::query(&sql)
        .bind(name)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, table = kind.table(), "Failed to create master record");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Created().json(json!({
        "message": format!("{} created successfully", kind.label())
    })))
}

pub async fn update(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    kind: web::Data<MasterKind>,
    path: web::Path<u64>,
    payload: web::Json<NamePayload>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let id = path.into_inner();
    let name = payload.name.trim();
    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Name must not be empty"
        })));
    }

    let taken = name_taken(pool.get_ref(), kind.table(), name, Some(id))
        .await
        .map_err(|e| {
            error!(error = %e, table = kind.table(), "Duplicate check failed");
            ErrorInternalServerError("Internal Server Error")
        })?;

    if taken {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": format!("{} with this name already exists", kind.label())
        })));
    }

    let sql = format!("UPDATE {} SET name = ? WHERE id = ?", kind.table());
    let result = sqlx::query(&sql)
        .bind(name)
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, table = kind.table(), id, "Failed to update master record");
            ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": format!("{} not found", kind.label())
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("{} updated successfully", kind.label())
    })))
}

pub async fn delete(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    kind: web::Data<MasterKind>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let id = path.into_inner();

    let sql = format!("DELETE FROM {} WHERE id = ?", kind.table());
    let result = sqlx::query(&sql)
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, table = kind.table(), id, "Failed to delete master record");
            ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": format!("{} not found", kind.label())
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}

// ---------------------------------------------------------------------------
// Sub-departments carry a parent department and get their own handlers.
// ---------------------------------------------------------------------------

pub async fn list_sub_departments(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let records = sqlx::query_as::<_, SubDepartment>(
        "SELECT id, department_id, name FROM sub_departments ORDER BY name",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to list sub-departments");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({ "data": records })))
}

pub async fn create_sub_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<SubDepartmentPayload>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Name must not be empty"
        })));
    }

    let taken = name_taken(pool.get_ref(), "sub_departments", name, None)
        .await
        .map_err(|e| {
            error!(error = %e, "Duplicate check failed");
            ErrorInternalServerError("Internal Server Error")
        })?;

    if taken {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "Sub-department with this name already exists"
        })));
    }

    let result = sqlx::query("INSERT INTO sub_departments (department_id, name) VALUES (?, ?)")
        .bind(payload.department_id)
        .bind(name)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(_) => Ok(HttpResponse::Created().json(json!({
            "message": "Sub-department created successfully"
        }))),
        Err(e) => {
            // parent department gone
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::BadRequest().json(json!({
                        "message": "Parent department does not exist"
                    })));
                }
            }
            error!(error = %e, "Failed to create sub-department");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

pub async fn update_sub_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<SubDepartmentPayload>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let id = path.into_inner();
    let name = payload.name.trim();
    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Name must not be empty"
        })));
    }

    let taken = name_taken(pool.get_ref(), "sub_departments", name, Some(id))
        .await
        .map_err(|e| {
            error!(error = %e, "Duplicate check failed");
            ErrorInternalServerError("Internal Server Error")
        })?;

    if taken {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "Sub-department with this name already exists"
        })));
    }

    let result =
        sqlx::query("UPDATE sub_departments SET department_id = ?, name = ? WHERE id = ?")
            .bind(payload.department_id)
            .bind(name)
            .bind(id)
            .execute(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, id, "Failed to update sub-department");
                ErrorInternalServerError("Internal Server Error")
            })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Sub-department not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Sub-department updated successfully"
    })))
}

pub async fn delete_sub_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let id = path.into_inner();

    let result = sqlx::query("DELETE FROM sub_departments WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to delete sub-department");
            ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Sub-department not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_is_case_insensitive_and_trimmed() {
        assert_eq!(normalized_name("  Head Office "), "head office");
        assert_eq!(normalized_name("HEAD OFFICE"), normalized_name("head office"));
    }

    #[test]
    fn every_kind_maps_to_a_distinct_table() {
        let kinds = [
            MasterKind::Branch,
            MasterKind::Department,
            MasterKind::Designation,
            MasterKind::Grade,
            MasterKind::Category,
            MasterKind::TerminationReason,
            MasterKind::ResignationReason,
        ];
        let mut tables: Vec<_> = kinds.iter().map(|k| k.table()).collect();
        tables.sort();
        tables.dedup();
        assert_eq!(tables.len(), kinds.len());
    }
}
