use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A generated bill. Only `is_paid`/`paid_date` ever change after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 7,
        "user_id": 3,
        "period_start": "2025-01-01",
        "period_end": "2025-01-31",
        "total_fixed_charges": "620.00",
        "total_food_charges": "1450.00",
        "total_amount": "2070.00",
        "total_days": 31,
        "present_days": 24,
        "absent_days": 7,
        "is_paid": false,
        "paid_date": null,
        "generated_date": "2025-02-01T10:00:00"
    })
)]
pub struct Bill {
    pub id: u64,
    pub user_id: u64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_fixed_charges: Decimal,
    pub total_food_charges: Decimal,
    pub total_amount: Decimal,
    pub total_days: u32,
    pub present_days: u32,
    pub absent_days: u32,
    pub is_paid: bool,
    pub paid_date: Option<NaiveDateTime>,
    pub generated_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBill {
    pub user_id: u64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_fixed_charges: Decimal,
    pub total_food_charges: Decimal,
    pub total_amount: Decimal,
    pub total_days: u32,
    pub present_days: u32,
    pub absent_days: u32,
    pub generated_date: NaiveDateTime,
}

/// Filter for the admin bill listing. Bounds are inclusive and a bill must
/// lie fully inside them to match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillFilter {
    pub user_id: Option<u64>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl BillFilter {
    pub fn matches(&self, bill: &Bill) -> bool {
        self.user_id.is_none_or(|id| bill.user_id == id)
            && self.start.is_none_or(|start| bill.period_start >= start)
            && self.end.is_none_or(|end| bill.period_end <= end)
    }
}
