use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use tracing::instrument;

use crate::billing::calculator::{BillTotals, compute_bill};
use crate::billing::period::BillingPeriod;
use crate::error::{AppError, AppResult};
use crate::model::bill::{Bill, BillFilter, NewBill};
use crate::repository::{AttendanceStore, BillStore, MenuStore, UserStore};

/// Knobs for bill generation, read once from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPolicy {
    /// Charged on days that have no menu.
    pub default_fixed_charge: Decimal,
    /// Monthly bills only for months that are already over.
    pub past_months_only: bool,
    pub min_year: i32,
    pub max_year: i32,
}

impl Default for BillingPolicy {
    fn default() -> Self {
        BillingPolicy {
            default_fixed_charge: Decimal::from(20),
            past_months_only: true,
            min_year: 2000,
            max_year: 2100,
        }
    }
}

impl BillingPolicy {
    /// Resolves `(year, month)` into a period, applying the year bounds and
    /// the past-months rule relative to `today`.
    pub fn monthly_period(&self, year: i32, month: u32, today: NaiveDate) -> AppResult<BillingPeriod> {
        if !(self.min_year..=self.max_year).contains(&year) {
            return Err(AppError::invalid(format!(
                "Year must be between {} and {}.",
                self.min_year, self.max_year
            )));
        }
        let period = BillingPeriod::month(year, month)?;

        if self.past_months_only && (year, month) >= (today.year(), today.month()) {
            return Err(AppError::invalid(
                "Bills can only be generated for past months.",
            ));
        }
        Ok(period)
    }
}

/// Loads menus and the user's attendance for the period and runs the
/// calculator. Nothing is written.
pub async fn estimate<S>(
    store: &S,
    user_id: u64,
    period: &BillingPeriod,
    default_fixed_charge: Decimal,
) -> AppResult<BillTotals>
where
    S: MenuStore + AttendanceStore,
{
    let menus = store.menus_in_range(period.start(), period.end()).await?;
    let attendance = store
        .attendance_in_range(user_id, period.start(), period.end())
        .await?;

    compute_bill(
        user_id,
        period,
        &menus,
        &attendance,
        default_fixed_charge,
    )
}

#[instrument(skip(store, policy))]
pub async fn generate_bill<S>(
    store: &S,
    policy: &BillingPolicy,
    user_id: u64,
    start: NaiveDate,
    end: NaiveDate,
    now: NaiveDateTime,
) -> AppResult<Bill>
where
    S: UserStore + MenuStore + AttendanceStore + BillStore,
{
    let period = BillingPeriod::new(start, end)?;
    generate_for_period(store, policy, user_id, period, now).await
}

#[instrument(skip(store, policy))]
pub async fn generate_monthly_bill<S>(
    store: &S,
    policy: &BillingPolicy,
    user_id: u64,
    year: i32,
    month: u32,
    now: NaiveDateTime,
) -> AppResult<Bill>
where
    S: UserStore + MenuStore + AttendanceStore + BillStore,
{
    let period = policy.monthly_period(year, month, now.date())?;
    generate_for_period(store, policy, user_id, period, now).await
}

async fn generate_for_period<S>(
    store: &S,
    policy: &BillingPolicy,
    user_id: u64,
    period: BillingPeriod,
    now: NaiveDateTime,
) -> AppResult<Bill>
where
    S: UserStore + MenuStore + AttendanceStore + BillStore,
{
    if store.find_user(user_id).await?.is_none() {
        return Err(AppError::not_found(format!("User {user_id} not found")));
    }

    if let Some(existing) = store
        .find_overlapping_bill(user_id, period.start(), period.end())
        .await?
    {
        return Err(AppError::conflict(format!(
            "User {user_id} already has bill {} for {} to {}",
            existing.id, existing.period_start, existing.period_end
        )));
    }

    let totals = estimate(store, user_id, &period, policy.default_fixed_charge).await?;

    let bill = store
        .insert_bill(&NewBill {
            user_id,
            period_start: totals.period_start,
            period_end: totals.period_end,
            total_fixed_charges: totals.total_fixed_charges,
            total_food_charges: totals.total_food_charges,
            total_amount: totals.total_amount,
            total_days: totals.total_days,
            present_days: totals.present_days,
            absent_days: totals.absent_days,
            generated_date: now,
        })
        .await?;

    tracing::info!(
        bill_id = bill.id,
        user_id,
        total = %bill.total_amount,
        "Bill generated"
    );
    Ok(bill)
}

pub async fn get_bill<S: BillStore>(store: &S, id: u64) -> AppResult<Bill> {
    store
        .find_bill(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Bill {id} not found")))
}

pub async fn bills_for_user<S: UserStore + BillStore>(store: &S, user_id: u64) -> AppResult<Vec<Bill>> {
    if store.find_user(user_id).await?.is_none() {
        return Err(AppError::not_found(format!("User {user_id} not found")));
    }
    store.bills_for_user(user_id).await
}

pub async fn list_bills<S: BillStore>(store: &S, filter: &BillFilter) -> AppResult<Vec<Bill>> {
    if let (Some(start), Some(end)) = (filter.start, filter.end) {
        BillingPeriod::new(start, end)?;
    }
    store.list_bills(filter).await
}

/// Paying an already paid bill changes nothing and returns it as stored.
#[instrument(skip(store))]
pub async fn mark_bill_paid<S: BillStore>(store: &S, id: u64, now: NaiveDateTime) -> AppResult<Bill> {
    if store.mark_bill_paid(id, now).await? {
        tracing::info!(bill_id = id, "Bill marked as paid");
    }
    get_bill(store, id).await
}

#[instrument(skip(store))]
pub async fn delete_bill<S: BillStore>(store: &S, id: u64) -> AppResult<()> {
    let bill = get_bill(store, id).await?;
    if bill.is_paid {
        return Err(AppError::conflict(format!(
            "Bill {id} is already paid and cannot be deleted"
        )));
    }
    if !store.delete_bill(id).await? {
        return Err(AppError::not_found(format!("Bill {id} not found")));
    }
    tracing::info!(bill_id = id, "Bill deleted");
    Ok(())
}
