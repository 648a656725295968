use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;
use std::str::FromStr;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::domain::declaration::{
    DeclarationSubmission, SectionUpdate, SubmissionRejection, TaxRegime, validate_submission,
};
use crate::model::declaration::DeclarationRow;

#[derive(Serialize, ToSchema)]
pub struct DeclarationResponse {
    #[schema(example = 1001)]
    pub employee_id: u64,
    /// Fiscal year start, e.g. 2024 for FY 2024-25
    #[schema(example = 2024)]
    pub fiscal_year: u16,
    pub regime: TaxRegime,
    pub confirmed: bool,
    pub sections: Vec<SectionUpdate>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn decode_section<T, F>(column: &Option<String>, wrap: F) -> Option<SectionUpdate>
where
    T: serde::de::DeserializeOwned,
    F: FnOnce(T) -> SectionUpdate,
{
    column
        .as_deref()
        .and_then(|raw| serde_json::from_str::<T>(raw).ok())
        .map(wrap)
}

fn row_to_response(row: DeclarationRow) -> DeclarationResponse {
    let mut sections = Vec::new();

    if let Some(s) = decode_section(&row.house_rent, SectionUpdate::HouseRent) {
        sections.push(s);
    }
    if let Some(s) = decode_section(&row.section_80c, SectionUpdate::Section80c) {
        sections.push(s);
    }
    if let Some(s) = decode_section(&row.section_vi_a, SectionUpdate::SectionViA) {
        sections.push(s);
    }
    if let Some(s) = decode_section(&row.house_property, SectionUpdate::HouseProperty) {
        sections.push(s);
    }

    DeclarationResponse {
        employee_id: row.employee_id,
        fiscal_year: row.fiscal_year,
        regime: TaxRegime::from_str(&row.regime).unwrap_or(TaxRegime::Old),
        confirmed: row.confirmed,
        sections,
        updated_at: row.updated_at,
    }
}

/// Employees may only read and write their own declaration; HR and Admin
/// may handle anyone's.
fn authorize(auth: &AuthUser, employee_id: u64) -> actix_web::Result<()> {
    if auth.is_employee() && auth.employee_id != Some(employee_id) {
        return Err(actix_web::error::ErrorForbidden(
            "You can only access your own declaration",
        ));
    }
    Ok(())
}

/// Fetch a declaration
#[utoipa::path(
    get,
    path = "/api/v1/declarations/{employee_id}/{fiscal_year}",
    params(
        ("employee_id", Path, description = "Employee ID"),
        ("fiscal_year", Path, description = "Fiscal year start, e.g. 2024")
    ),
    responses(
        (status = 200, description = "Declaration found", body = DeclarationResponse),
        (status = 404, description = "No declaration yet", body = Object, example = json!({
            "message": "Declaration not found"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Declaration"
)]
pub async fn get_declaration(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, u16)>,
) -> actix_web::Result<impl Responder> {
    let (employee_id, fiscal_year) = path.into_inner();
    authorize(&auth, employee_id)?;

    let row = sqlx::query_as::<_, DeclarationRow>(
        r#"
        SELECT employee_id, fiscal_year, regime, confirmed,
               house_rent, section_80c, section_vi_a, house_property, updated_at
        FROM investment_declarations
        WHERE employee_id = ? AND fiscal_year = ?
        "#,
    )
    .bind(employee_id)
    .bind(fiscal_year)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, fiscal_year, "Failed to fetch declaration");
        ErrorInternalServerError("Internal Server Error")
    })?;

    match row {
        Some(row) => Ok(HttpResponse::Ok().json(row_to_response(row))),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Declaration not found"
        }))),
    }
}

/// Submit a declaration
#[utoipa::path(
    put,
    path = "/api/v1/declarations/{employee_id}/{fiscal_year}",
    params(
        ("employee_id", Path, description = "Employee ID"),
        ("fiscal_year", Path, description = "Fiscal year start, e.g. 2024")
    ),
    request_body = DeclarationSubmission,
    responses(
        (status = 200, description = "Declaration saved"),
        (status = 400, description = "Regime rule violated", body = Object, example = json!({
            "message": "Deductions are not applicable under the new regime"
        })),
        (status = 422, description = "Field caps violated", body = Object, example = json!({
            "message": "Declaration has invalid fields",
            "errors": { "section_80c.life_insurance_premium": "Amount exceeds the 150000 ceiling" }
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Declaration"
)]
pub async fn put_declaration(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, u16)>,
    payload: web::Json<DeclarationSubmission>,
) -> actix_web::Result<impl Responder> {
    let (employee_id, fiscal_year) = path.into_inner();
    authorize(&auth, employee_id)?;

    // Nothing is written unless the whole document validates.
    if let Err(rejection) = validate_submission(&payload) {
        return Ok(match rejection {
            SubmissionRejection::InvalidFields(errors) => {
                HttpResponse::UnprocessableEntity().json(json!({
                    "message": "Declaration has invalid fields",
                    "errors": errors
                }))
            }
            other => HttpResponse::BadRequest().json(json!({
                "message": other.to_string()
            })),
        });
    }

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE id = ? LIMIT 1)",
    )
    .bind(employee_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to verify employee");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if !exists {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    }

    // Last write per section wins within one submission.
    let mut house_rent = None;
    let mut section_80c = None;
    let mut section_vi_a = None;
    let mut house_property = None;

    for section in &payload.sections {
        let encoded = match section {
            SectionUpdate::HouseRent(s) => (&mut house_rent, serde_json::to_string(s)),
            SectionUpdate::Section80c(s) => (&mut section_80c, serde_json::to_string(s)),
            SectionUpdate::SectionViA(s) => (&mut section_vi_a, serde_json::to_string(s)),
            SectionUpdate::HouseProperty(s) => (&mut house_property, serde_json::to_string(s)),
        };
        let (slot, json) = encoded;
        *slot = Some(json.map_err(ErrorInternalServerError)?);
    }

    sqlx::query(
        r#"
        INSERT INTO investment_declarations
        (employee_id, fiscal_year, regime, confirmed,
         house_rent, section_80c, section_vi_a, house_property)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            regime = VALUES(regime),
            confirmed = VALUES(confirmed),
            house_rent = VALUES(house_rent),
            section_80c = VALUES(section_80c),
            section_vi_a = VALUES(section_vi_a),
            house_property = VALUES(house_property)
        "#,
    )
    .bind(employee_id)
    .bind(fiscal_year)
    .bind(payload.regime.to_string())
    .bind(payload.confirmed.unwrap_or(false))
    .bind(&house_rent)
    .bind(&section_80c)
    .bind(&section_vi_a)
    .bind(&house_property)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, fiscal_year, "Failed to save declaration");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Declaration saved"
    })))
}
