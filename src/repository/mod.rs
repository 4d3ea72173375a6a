//! Store interfaces consumed by the services, plus the MySQL implementation.
//!
//! Services take a generic `S` bounded by the traits they need, so the same
//! orchestration code runs against `MySqlStore` in the server and against the
//! in-memory store in tests. Uniqueness (attendance per user/day, menu per day,
//! bill per user/period, user email) is enforced by the store; a duplicate
//! insert surfaces as `AppError::Conflict`.

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::MySqlPool;

use crate::error::AppResult;
use crate::model::attendance::{AttendanceRecord, NewAttendance};
use crate::model::bill::{Bill, BillFilter, NewBill};
use crate::model::daily_menu::{DailyMenu, MenuChanges, NewMenu};
use crate::model::role::Role;
use crate::model::user::{NewUser, User, UserChanges};

pub mod attendance;
pub mod bill;
pub mod menu;
pub mod token;
pub mod user;

#[cfg(test)]
pub mod memory;

pub trait UserStore {
    async fn find_user(&self, id: u64) -> AppResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn list_users(&self, role: Option<Role>) -> AppResult<Vec<User>>;
    async fn count_users(&self) -> AppResult<i64>;
    async fn insert_user(&self, user: &NewUser) -> AppResult<User>;
    /// Returns `None` when no user has this id.
    async fn update_user(&self, id: u64, changes: &UserChanges) -> AppResult<Option<User>>;
    async fn set_password_hash(&self, id: u64, password_hash: &str) -> AppResult<bool>;
    async fn delete_user(&self, id: u64) -> AppResult<bool>;
}

pub trait MenuStore {
    /// `FetchMenus`: every menu dated inside `[start, end]`, ordered by date.
    async fn menus_in_range(&self, start: NaiveDate, end: NaiveDate) -> AppResult<Vec<DailyMenu>>;
    async fn find_menu(&self, id: u64) -> AppResult<Option<DailyMenu>>;
    async fn find_menu_by_date(&self, date: NaiveDate) -> AppResult<Option<DailyMenu>>;
    async fn insert_menu(&self, menu: &NewMenu) -> AppResult<DailyMenu>;
    async fn update_menu(&self, id: u64, changes: &MenuChanges) -> AppResult<Option<DailyMenu>>;
    async fn delete_menu(&self, id: u64) -> AppResult<bool>;
}

pub trait AttendanceStore {
    /// `FetchAttendance`: the user's records inside `[start, end]`, ordered by date.
    async fn attendance_in_range(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<AttendanceRecord>>;
    async fn attendance_for_user(&self, user_id: u64) -> AppResult<Vec<AttendanceRecord>>;
    async fn attendance_on(&self, date: NaiveDate) -> AppResult<Vec<AttendanceRecord>>;
    async fn find_attendance(&self, id: u64) -> AppResult<Option<AttendanceRecord>>;
    async fn insert_attendance(&self, record: &NewAttendance) -> AppResult<AttendanceRecord>;
    /// All rows or none.
    async fn insert_attendance_batch(
        &self,
        records: &[NewAttendance],
    ) -> AppResult<Vec<AttendanceRecord>>;
    async fn set_attendance_status(
        &self,
        id: u64,
        present: bool,
    ) -> AppResult<Option<AttendanceRecord>>;
    async fn delete_attendance(&self, id: u64) -> AppResult<bool>;
}

pub trait BillStore {
    /// Any bill of `user_id` sharing at least one day with `[start, end]`.
    async fn find_overlapping_bill(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Option<Bill>>;
    /// `SaveBill`.
    async fn insert_bill(&self, bill: &NewBill) -> AppResult<Bill>;
    async fn find_bill(&self, id: u64) -> AppResult<Option<Bill>>;
    /// Newest first.
    async fn bills_for_user(&self, user_id: u64) -> AppResult<Vec<Bill>>;
    /// Newest first.
    async fn list_bills(&self, filter: &BillFilter) -> AppResult<Vec<Bill>>;
    /// Flips an unpaid bill to paid. Returns `false` when no unpaid bill has
    /// this id; an already paid bill is left untouched.
    async fn mark_bill_paid(&self, id: u64, paid_at: NaiveDateTime) -> AppResult<bool>;
    async fn delete_bill(&self, id: u64) -> AppResult<bool>;
}

/// Refresh-token bookkeeping for the auth handlers.
pub trait TokenStore {
    async fn store_refresh_token(&self, user_id: u64, jti: &str, expires_at: i64) -> AppResult<()>;
    /// Revokes a live token and returns its owner. `None` when the token is
    /// unknown, expired or already revoked; of two concurrent callers only
    /// one gets `Some`.
    async fn consume_refresh_token(&self, jti: &str) -> AppResult<Option<u64>>;
    /// Idempotent.
    async fn revoke_refresh_token(&self, jti: &str) -> AppResult<()>;
    async fn revoke_all_refresh_tokens(&self, user_id: u64) -> AppResult<()>;
}

/// MySQL-backed implementation of every store trait.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}
