use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 11,
        "user_id": 3,
        "date": "2025-01-02",
        "present": true,
        "created_at": "2025-01-02T09:00:00",
        "updated_at": null
    })
)]
pub struct AttendanceRecord {
    pub id: u64,
    pub user_id: u64,
    pub date: NaiveDate,
    pub present: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewAttendance {
    pub user_id: u64,
    pub date: NaiveDate,
    pub present: bool,
}
