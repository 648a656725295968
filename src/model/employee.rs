use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP-001",
        "first_name": "John",
        "last_name": "Doe",
        "email": "john.doe@company.com",
        "phone": "+8801712345678",
        "branch_id": 2,
        "department_id": 10,
        "designation_id": 3,
        "grade_id": 1,
        "join_date": "2023-08-23",
        "exit_date": null,
        "status": "active"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = 2)]
    pub branch_id: Option<u64>,

    #[schema(example = 10)]
    pub department_id: Option<u64>,

    #[schema(example = 3)]
    pub designation_id: Option<u64>,

    #[schema(example = 1)]
    pub grade_id: Option<u64>,

    #[schema(example = "2023-08-23", value_type = String, format = "date")]
    pub join_date: NaiveDate,

    #[schema(example = "2024-11-18", value_type = String, format = "date", nullable = true)]
    pub exit_date: Option<NaiveDate>,

    #[schema(example = "active")]
    pub status: String,
}

/// Identity plus tenure columns, enough to drive the attendance grid.
#[derive(Debug, sqlx::FromRow)]
pub struct EmployeeTenureRow {
    pub id: u64,
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub join_date: NaiveDate,
    pub exit_date: Option<NaiveDate>,
}
