use actix_web::{HttpRequest, HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;

use crate::auth::auth::AuthUser;
use crate::model::company::Company;
use crate::utils::domain_cache;

/// Header set by the frontend so multi-tenant installs can resolve which
/// company a request belongs to.
pub const FRONTEND_HOST_HEADER: &str = "X-Frontend-Host";

/// Get company profile
#[utoipa::path(
    get,
    path = "/api/v1/companies/{company_id}",
    params(
        ("company_id", Path, description = "Company ID")
    ),
    responses(
        (status = 200, description = "Company found", body = Company),
        (status = 404, description = "Company not found", body = Object, example = json!({
            "message": "Company not found"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Company"
)]
pub async fn get_company(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let company_id = path.into_inner();

    let company = sqlx::query_as::<_, Company>(
        "SELECT id, name, domain, address FROM companies WHERE id = ?",
    )
    .bind(company_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, company_id, "Failed to fetch company");
        ErrorInternalServerError("Internal Server Error")
    })?;

    match company {
        Some(c) => Ok(HttpResponse::Ok().json(c)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Company not found"
        }))),
    }
}

/// Resolve the calling frontend host to a tenant
#[utoipa::path(
    get,
    path = "/api/v1/companies/test-domain",
    responses(
        (status = 200, description = "Tenant resolved", body = Company),
        (status = 400, description = "Header missing"),
        (status = 404, description = "Unknown domain", body = Object, example = json!({
            "message": "No company registered for this domain"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Company"
)]
pub async fn test_domain(
    _auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let Some(domain) = req
        .headers()
        .get(FRONTEND_HOST_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|d| !d.is_empty())
    else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": format!("{} header is required", FRONTEND_HOST_HEADER)
        })));
    };

    if let Some(company) = domain_cache::lookup(domain).await {
        return Ok(HttpResponse::Ok().json(company));
    }

    let company = sqlx::query_as::<_, Company>(
        "SELECT id, name, domain, address FROM companies WHERE LOWER(domain) = ?",
    )
    .bind(domain.to_lowercase())
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, domain, "Failed to resolve domain");
        ErrorInternalServerError("Internal Server Error")
    })?;

    match company {
        Some(company) => {
            domain_cache::store(domain, company.clone()).await;
            Ok(HttpResponse::Ok().json(company))
        }
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "No company registered for this domain"
        }))),
    }
}
