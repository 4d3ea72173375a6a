use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::billing::calculator::{BillTotals, compute_bill, menus_by_date};
use crate::billing::money::checked_sum;
use crate::billing::period::BillingPeriod;
use crate::error::{AppError, AppResult};
use crate::model::attendance::{AttendanceRecord, NewAttendance};
use crate::model::daily_menu::MealItem;
use crate::repository::{AttendanceStore, BillStore, MenuStore, UserStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
pub struct BulkEntry {
    pub user_id: u64,
    pub present: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum DayStatus {
    Present,
    Absent,
    NotMarked,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyCharge {
    pub date: NaiveDate,
    pub status: DayStatus,
    pub meals: Vec<MealItem>,
    pub fixed_charge: Decimal,
    pub food_cost: Decimal,
    pub daily_total: Decimal,
    pub menu_available: bool,
}

/// Month-to-date view for one student. `estimate` is what a bill for the
/// whole month would contain if it were generated now.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AttendanceSummary {
    pub user_id: u64,
    pub year: i32,
    pub month: u32,
    pub days: Vec<DailyCharge>,
    pub present_days: u32,
    pub absent_days: u32,
    pub not_marked_days: u32,
    pub estimate: BillTotals,
}

async fn ensure_user<S: UserStore>(store: &S, user_id: u64) -> AppResult<()> {
    match store.find_user(user_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::not_found(format!("User {user_id} not found"))),
    }
}

async fn is_billed<S: BillStore>(store: &S, user_id: u64, date: NaiveDate) -> AppResult<bool> {
    Ok(store.find_overlapping_bill(user_id, date, date).await?.is_some())
}

async fn ensure_not_billed<S: BillStore>(store: &S, user_id: u64, date: NaiveDate) -> AppResult<()> {
    if is_billed(store, user_id, date).await? {
        return Err(AppError::conflict(format!(
            "Attendance of user {user_id} on {date} is already billed"
        )));
    }
    Ok(())
}

#[instrument(skip(store))]
pub async fn mark_attendance<S>(
    store: &S,
    user_id: u64,
    date: NaiveDate,
    present: bool,
) -> AppResult<AttendanceRecord>
where
    S: UserStore + AttendanceStore + BillStore,
{
    ensure_user(store, user_id).await?;
    ensure_not_billed(store, user_id, date).await?;

    let record = store
        .insert_attendance(&NewAttendance {
            user_id,
            date,
            present,
        })
        .await
        .map_err(|e| match e {
            AppError::Conflict { .. } => AppError::conflict(format!(
                "Attendance for user {user_id} on {date} is already marked"
            )),
            other => other,
        })?;

    tracing::info!(attendance_id = record.id, "Attendance marked");
    Ok(record)
}

/// Marks a whole day at once. Every entry is checked first and nothing is
/// written unless all of them pass.
#[instrument(skip(store, entries), fields(entries = entries.len()))]
pub async fn mark_bulk_attendance<S>(
    store: &S,
    date: NaiveDate,
    entries: &[BulkEntry],
) -> AppResult<Vec<AttendanceRecord>>
where
    S: UserStore + AttendanceStore + BillStore,
{
    if entries.is_empty() {
        return Err(AppError::invalid("At least one attendance entry is required"));
    }

    let marked: HashSet<u64> = store
        .attendance_on(date)
        .await?
        .into_iter()
        .map(|r| r.user_id)
        .collect();

    let mut seen = HashSet::with_capacity(entries.len());
    let mut failures = Vec::new();
    for entry in entries {
        let user_id = entry.user_id;
        if !seen.insert(user_id) {
            failures.push(format!("user {user_id}: listed more than once"));
        } else if store.find_user(user_id).await?.is_none() {
            failures.push(format!("user {user_id}: not found"));
        } else if marked.contains(&user_id) {
            failures.push(format!("user {user_id}: already marked"));
        } else if is_billed(store, user_id, date).await? {
            failures.push(format!("user {user_id}: day already billed"));
        }
    }

    if !failures.is_empty() {
        return Err(AppError::invalid(format!(
            "Bulk attendance for {date} rejected: {}",
            failures.join("; ")
        )));
    }

    let new_records: Vec<NewAttendance> = entries
        .iter()
        .map(|entry| NewAttendance {
            user_id: entry.user_id,
            date,
            present: entry.present,
        })
        .collect();

    let records = store.insert_attendance_batch(&new_records).await?;
    tracing::info!(count = records.len(), "Bulk attendance marked");
    Ok(records)
}

pub async fn get_attendance<S: AttendanceStore>(store: &S, id: u64) -> AppResult<AttendanceRecord> {
    store
        .find_attendance(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Attendance record {id} not found")))
}

#[instrument(skip(store))]
pub async fn update_attendance<S>(store: &S, id: u64, present: bool) -> AppResult<AttendanceRecord>
where
    S: AttendanceStore + BillStore,
{
    let record = get_attendance(store, id).await?;
    ensure_not_billed(store, record.user_id, record.date).await?;

    store
        .set_attendance_status(id, present)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Attendance record {id} not found")))
}

#[instrument(skip(store))]
pub async fn delete_attendance<S>(store: &S, id: u64) -> AppResult<()>
where
    S: AttendanceStore + BillStore,
{
    let record = get_attendance(store, id).await?;
    ensure_not_billed(store, record.user_id, record.date).await?;

    if !store.delete_attendance(id).await? {
        return Err(AppError::not_found(format!("Attendance record {id} not found")));
    }
    Ok(())
}

pub async fn attendance_on<S: AttendanceStore>(
    store: &S,
    date: NaiveDate,
) -> AppResult<Vec<AttendanceRecord>> {
    store.attendance_on(date).await
}

/// Either bound may be omitted; with both omitted the full history is returned.
pub async fn user_attendance<S>(
    store: &S,
    user_id: u64,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> AppResult<Vec<AttendanceRecord>>
where
    S: UserStore + AttendanceStore,
{
    ensure_user(store, user_id).await?;

    match (start, end) {
        (Some(start), Some(end)) => {
            let period = BillingPeriod::new(start, end)?;
            store
                .attendance_in_range(user_id, period.start(), period.end())
                .await
        }
        (start, end) => {
            let mut records = store.attendance_for_user(user_id).await?;
            records.retain(|r| {
                start.is_none_or(|s| r.date >= s) && end.is_none_or(|e| r.date <= e)
            });
            Ok(records)
        }
    }
}

pub async fn attendance_summary<S>(
    store: &S,
    user_id: u64,
    year: i32,
    month: u32,
    default_fixed_charge: Decimal,
) -> AppResult<AttendanceSummary>
where
    S: UserStore + MenuStore + AttendanceStore,
{
    ensure_user(store, user_id).await?;
    let period = BillingPeriod::month(year, month)?;

    let menus = store.menus_in_range(period.start(), period.end()).await?;
    let attendance = store
        .attendance_in_range(user_id, period.start(), period.end())
        .await?;

    let by_date = menus_by_date(&menus);
    let status_by_date: HashMap<NaiveDate, bool> =
        attendance.iter().map(|r| (r.date, r.present)).collect();

    let days = period
        .days()
        .map(|day| -> AppResult<DailyCharge> {
            let menu = by_date.get(&day);
            let status = match status_by_date.get(&day) {
                Some(true) => DayStatus::Present,
                Some(false) => DayStatus::Absent,
                None => DayStatus::NotMarked,
            };
            let fixed_charge = menu.map_or(default_fixed_charge, |m| m.fixed_charge);
            let food_cost = match (status, menu) {
                (DayStatus::Present, Some(m)) => m.food_cost()?,
                _ => Decimal::ZERO,
            };
            Ok(DailyCharge {
                date: day,
                status,
                meals: menu.map(|m| m.meals.clone()).unwrap_or_default(),
                fixed_charge,
                food_cost,
                daily_total: checked_sum(&format!("Total for {day}"), [fixed_charge, food_cost])?,
                menu_available: menu.is_some(),
            })
        })
        .collect::<AppResult<Vec<DailyCharge>>>()?;

    let count = |status: DayStatus| days.iter().filter(|d| d.status == status).count() as u32;
    let (present_days, absent_days, not_marked_days) = (
        count(DayStatus::Present),
        count(DayStatus::Absent),
        count(DayStatus::NotMarked),
    );

    Ok(AttendanceSummary {
        user_id,
        year,
        month,
        present_days,
        absent_days,
        not_marked_days,
        estimate: compute_bill(user_id, &period, &menus, &attendance, default_fixed_charge)?,
        days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::MemoryStore;
    use crate::service::billing::{BillingPolicy, generate_bill};
    use crate::service::fixtures::{at, attend, date, meal, menu, student};
    use rust_decimal_macros::dec;

    #[actix_web::test]
    async fn marks_once_per_day() {
        let store = MemoryStore::new();
        let alice = student(&store, "alice@mess.com").await;

        let record = mark_attendance(&store, alice.id, date(2025, 1, 2), true)
            .await
            .unwrap();
        assert!(record.present);

        let err = mark_attendance(&store, alice.id, date(2025, 1, 2), false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));

        let missing = mark_attendance(&store, 77, date(2025, 1, 2), true)
            .await
            .unwrap_err();
        assert!(matches!(missing, AppError::NotFound { .. }));
    }

    #[actix_web::test]
    async fn billed_days_are_frozen() {
        let store = MemoryStore::new();
        let alice = student(&store, "alice@mess.com").await;
        attend(&store, alice.id, date(2025, 1, 2), true).await;
        generate_bill(
            &store,
            &BillingPolicy::default(),
            alice.id,
            date(2025, 1, 1),
            date(2025, 1, 31),
            at(2025, 2, 1),
        )
        .await
        .unwrap();

        let record = store.attendance_for_user(alice.id).await.unwrap().remove(0);

        let update = update_attendance(&store, record.id, false).await.unwrap_err();
        assert!(matches!(update, AppError::Conflict { .. }));

        let delete = delete_attendance(&store, record.id).await.unwrap_err();
        assert!(matches!(delete, AppError::Conflict { .. }));

        let mark = mark_attendance(&store, alice.id, date(2025, 1, 3), true)
            .await
            .unwrap_err();
        assert!(matches!(mark, AppError::Conflict { .. }));

        // outside the bill
        mark_attendance(&store, alice.id, date(2025, 2, 1), true)
            .await
            .unwrap();
    }

    #[actix_web::test]
    async fn update_and_delete_unbilled_record() {
        let store = MemoryStore::new();
        let alice = student(&store, "alice@mess.com").await;
        let record = mark_attendance(&store, alice.id, date(2025, 1, 2), true)
            .await
            .unwrap();

        let updated = update_attendance(&store, record.id, false).await.unwrap();
        assert!(!updated.present);
        assert!(updated.updated_at.is_some());

        delete_attendance(&store, record.id).await.unwrap();
        assert!(matches!(
            get_attendance(&store, record.id).await.unwrap_err(),
            AppError::NotFound { .. }
        ));
        assert!(matches!(
            update_attendance(&store, record.id, true).await.unwrap_err(),
            AppError::NotFound { .. }
        ));
    }

    #[actix_web::test]
    async fn bulk_is_all_or_nothing() {
        let store = MemoryStore::new();
        let alice = student(&store, "alice@mess.com").await;
        let bob = student(&store, "bob@mess.com").await;
        let day = date(2025, 1, 2);
        attend(&store, bob.id, day, true).await;

        let entries = [
            BulkEntry {
                user_id: alice.id,
                present: true,
            },
            BulkEntry {
                user_id: bob.id,
                present: false,
            },
            BulkEntry {
                user_id: 404,
                present: true,
            },
        ];
        let err = mark_bulk_attendance(&store, day, &entries).await.unwrap_err();
        let AppError::InvalidArgument { message } = err else {
            panic!("expected InvalidArgument, got {err:?}");
        };
        assert!(message.contains(&format!("user {}: already marked", bob.id)));
        assert!(message.contains("user 404: not found"));

        // nothing was written for alice
        assert_eq!(attendance_on(&store, day).await.unwrap().len(), 1);

        let records = mark_bulk_attendance(&store, day, &entries[..1]).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(attendance_on(&store, day).await.unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn bulk_rejects_repeated_users_and_empty_requests() {
        let store = MemoryStore::new();
        let alice = student(&store, "alice@mess.com").await;
        let entry = BulkEntry {
            user_id: alice.id,
            present: true,
        };

        let err = mark_bulk_attendance(&store, date(2025, 1, 2), &[entry, entry])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument { .. }));

        let empty = mark_bulk_attendance(&store, date(2025, 1, 2), &[])
            .await
            .unwrap_err();
        assert!(matches!(empty, AppError::InvalidArgument { .. }));
        assert!(attendance_on(&store, date(2025, 1, 2)).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn user_attendance_honours_optional_bounds() {
        let store = MemoryStore::new();
        let alice = student(&store, "alice@mess.com").await;
        for d in 1..=5 {
            attend(&store, alice.id, date(2025, 1, d), d % 2 == 1).await;
        }

        assert_eq!(user_attendance(&store, alice.id, None, None).await.unwrap().len(), 5);
        assert_eq!(
            user_attendance(&store, alice.id, Some(date(2025, 1, 3)), None)
                .await
                .unwrap()
                .len(),
            3
        );
        assert_eq!(
            user_attendance(&store, alice.id, None, Some(date(2025, 1, 2)))
                .await
                .unwrap()
                .len(),
            2
        );
        let err = user_attendance(&store, alice.id, Some(date(2025, 1, 3)), Some(date(2025, 1, 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument { .. }));
    }

    #[actix_web::test]
    async fn summary_matches_calculator() {
        let store = MemoryStore::new();
        let alice = student(&store, "alice@mess.com").await;
        menu(&store, date(2025, 2, 1), dec!(25), vec![meal("Rice", dec!(30))]).await;
        menu(&store, date(2025, 2, 2), dec!(20), vec![meal("Dal", dec!(15))]).await;
        attend(&store, alice.id, date(2025, 2, 1), true).await;
        attend(&store, alice.id, date(2025, 2, 2), false).await;
        attend(&store, alice.id, date(2025, 2, 3), true).await;

        let summary = attendance_summary(&store, alice.id, 2025, 2, dec!(20))
            .await
            .unwrap();

        assert_eq!(summary.days.len(), 28);
        assert_eq!(
            (summary.present_days, summary.absent_days, summary.not_marked_days),
            (2, 1, 25)
        );

        let first = &summary.days[0];
        assert_eq!(first.status, DayStatus::Present);
        assert_eq!(first.daily_total, dec!(55));
        assert!(first.menu_available);

        let second = &summary.days[1];
        assert_eq!(second.status, DayStatus::Absent);
        assert_eq!(second.food_cost, Decimal::ZERO);
        assert_eq!(second.meals.len(), 1);

        let third = &summary.days[2];
        assert_eq!(third.status, DayStatus::Present);
        assert!(!third.menu_available);
        assert_eq!(third.daily_total, dec!(20));

        let day_sum: Decimal = summary.days.iter().map(|d| d.daily_total).sum();
        assert_eq!(summary.estimate.total_amount, day_sum);
        assert_eq!(summary.estimate.total_fixed_charges, dec!(565));
        assert_eq!(summary.estimate.total_food_charges, dec!(30));
        assert_eq!(summary.estimate.present_days, 2);
        assert_eq!(summary.estimate.absent_days, 26);
    }

    #[actix_web::test]
    async fn summary_rejects_bad_month() {
        let store = MemoryStore::new();
        let alice = student(&store, "alice@mess.com").await;
        let err = attendance_summary(&store, alice.id, 2025, 13, dec!(20))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument { .. }));
    }
}
