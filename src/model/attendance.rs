use serde::{Deserialize, Serialize};

/// One stored grid cell; statuses live as their code strings in MySQL and
/// are parsed back into `AttendanceStatus` at the edge.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceCellRow {
    pub employee_id: u64,
    pub day: u8,
    pub status: String,
}

/// Workflow side-table row, one per (year, month) that has ever been edited.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceMonthRow {
    pub year: i32,
    pub month: u8,
    pub state: String,
}
