use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::billing::money::{SCALE, checked_sum, max_bill_amount};
use crate::billing::period::BillingPeriod;
use crate::error::{AppError, AppResult};
use crate::model::attendance::AttendanceRecord;
use crate::model::daily_menu::DailyMenu;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BillTotals {
    pub user_id: u64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_fixed_charges: Decimal,
    pub total_food_charges: Decimal,
    pub total_amount: Decimal,
    pub total_days: u32,
    pub present_days: u32,
    pub absent_days: u32,
}

/// Index menus by day. Dates are unique per menu, so the first one wins if a
/// caller ever hands in duplicates.
pub fn menus_by_date(menus: &[DailyMenu]) -> HashMap<NaiveDate, &DailyMenu> {
    let mut by_date = HashMap::with_capacity(menus.len());
    for menu in menus {
        by_date.entry(menu.date).or_insert(menu);
    }
    by_date
}

/// Fixed charges accrue every day of the period, from the day's menu or from
/// `default_fixed_charge` when there is none. Food charges accrue only on
/// present days that have a menu; a present day without a menu costs nothing
/// beyond the fixed charge.
///
/// Each day's amounts are rounded to cents before summing, so the totals are
/// exactly what the `bills` columns store.
pub fn compute_bill(
    user_id: u64,
    period: &BillingPeriod,
    menus: &[DailyMenu],
    attendance: &[AttendanceRecord],
    default_fixed_charge: Decimal,
) -> AppResult<BillTotals> {
    let by_date = menus_by_date(menus);
    let total_days = period.total_days();

    let total_fixed_charges = checked_sum(
        "Total fixed charges",
        period.days().map(|day| {
            by_date
                .get(&day)
                .map_or(default_fixed_charge, |menu| menu.fixed_charge)
                .round_dp(SCALE)
        }),
    )?;

    let mut present_days = 0u32;
    let mut food_costs = Vec::new();
    for record in attendance
        .iter()
        .filter(|r| r.user_id == user_id && r.present && period.contains(r.date))
    {
        present_days += 1;
        if let Some(menu) = by_date.get(&record.date) {
            food_costs.push(menu.food_cost()?.round_dp(SCALE));
        }
    }
    let total_food_charges = checked_sum("Total food charges", food_costs)?;

    let total_amount = checked_sum("Bill total", [total_fixed_charges, total_food_charges])?;
    if total_amount > max_bill_amount() {
        return Err(AppError::invalid(format!(
            "Bill total {total_amount} exceeds {}",
            max_bill_amount()
        )));
    }

    Ok(BillTotals {
        user_id,
        period_start: period.start(),
        period_end: period.end(),
        total_fixed_charges,
        total_food_charges,
        total_amount,
        total_days,
        present_days,
        absent_days: total_days.saturating_sub(present_days),
    })
}
