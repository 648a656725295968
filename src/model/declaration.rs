use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Declaration document as stored: one row per (employee, fiscal year),
/// sections kept as JSON columns and decoded at the API edge.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeclarationRow {
    pub employee_id: u64,
    /// Fiscal year start, e.g. 2024 for FY 2024-25.
    pub fiscal_year: u16,
    pub regime: String,
    pub confirmed: bool,
    pub house_rent: Option<String>,
    pub section_80c: Option<String>,
    pub section_vi_a: Option<String>,
    pub house_property: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}
