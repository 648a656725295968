use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Row shape shared by every name-keyed master resource (branches,
/// departments, designations, grades, categories, reasons).
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct MasterRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Head Office")]
    pub name: String,
    #[schema(example = "2024-01-01T00:00:00Z", value_type = String, format = "date-time", nullable = true)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Sub-departments additionally hang off a parent department.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct SubDepartment {
    #[schema(example = 4)]
    pub id: u64,
    #[schema(example = 10)]
    pub department_id: u64,
    #[schema(example = "Payroll Operations")]
    pub name: String,
}
