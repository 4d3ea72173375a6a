//! In-memory store used by service tests. Mirrors the unique indexes of the
//! MySQL schema so duplicate inserts fail with `Conflict` the same way.

use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{AppError, AppResult};
use crate::model::attendance::{AttendanceRecord, NewAttendance};
use crate::model::bill::{Bill, BillFilter, NewBill};
use crate::model::daily_menu::{DailyMenu, MenuChanges, NewMenu};
use crate::model::role::Role;
use crate::model::user::{NewUser, User, UserChanges};
use crate::repository::{AttendanceStore, BillStore, MenuStore, TokenStore, UserStore};

#[derive(Default)]
struct Tables {
    next_id: u64,
    users: Vec<User>,
    menus: Vec<DailyMenu>,
    attendance: Vec<AttendanceRecord>,
    bills: Vec<Bill>,
    refresh_tokens: Vec<RefreshToken>,
}

struct RefreshToken {
    user_id: u64,
    jti: String,
    expires_at: i64,
    revoked: bool,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

pub struct MemoryStore {
    tables: Mutex<Tables>,
    now: NaiveDateTime,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            now: NaiveDate::from_ymd_opt(2025, 6, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        let mut tables = self.tables.lock().unwrap();
        f(&mut tables)
    }
}

fn duplicate(what: &str) -> AppError {
    AppError::conflict(format!("Duplicate {what}"))
}

impl UserStore for MemoryStore {
    async fn find_user(&self, id: u64) -> AppResult<Option<User>> {
        Ok(self.with(|t| t.users.iter().find(|u| u.id == id).cloned()))
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.with(|t| t.users.iter().find(|u| u.email == email).cloned()))
    }

    async fn list_users(&self, role: Option<Role>) -> AppResult<Vec<User>> {
        Ok(self.with(|t| {
            t.users
                .iter()
                .filter(|u| role.is_none_or(|r| u.role == r))
                .cloned()
                .collect()
        }))
    }

    async fn count_users(&self) -> AppResult<i64> {
        Ok(self.with(|t| t.users.len() as i64))
    }

    async fn insert_user(&self, user: &NewUser) -> AppResult<User> {
        let now = self.now;
        self.with(|t| {
            if t.users.iter().any(|u| u.email == user.email) {
                return Err(duplicate("email"));
            }
            let stored = User {
                id: t.next_id(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                email: user.email.clone(),
                password_hash: user.password_hash.clone(),
                role: user.role,
                is_active: true,
                created_at: now,
                roll_number: user.roll_number.clone(),
                room_number: user.room_number.clone(),
                contact_number: user.contact_number.clone(),
            };
            t.users.push(stored.clone());
            Ok(stored)
        })
    }

    async fn update_user(&self, id: u64, changes: &UserChanges) -> AppResult<Option<User>> {
        self.with(|t| {
            if let Some(email) = &changes.email {
                if t.users.iter().any(|u| u.id != id && &u.email == email) {
                    return Err(duplicate("email"));
                }
            }
            let Some(user) = t.users.iter_mut().find(|u| u.id == id) else {
                return Ok(None);
            };
            let changes = changes.clone();
            if let Some(v) = changes.first_name {
                user.first_name = v;
            }
            if let Some(v) = changes.last_name {
                user.last_name = v;
            }
            if let Some(v) = changes.email {
                user.email = v;
            }
            if let Some(v) = changes.role {
                user.role = v;
            }
            if let Some(v) = changes.is_active {
                user.is_active = v;
            }
            changes.roll_number.apply_to(&mut user.roll_number);
            changes.room_number.apply_to(&mut user.room_number);
            changes.contact_number.apply_to(&mut user.contact_number);
            Ok(Some(user.clone()))
        })
    }

    async fn set_password_hash(&self, id: u64, password_hash: &str) -> AppResult<bool> {
        Ok(self.with(|t| match t.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                true
            }
            None => false,
        }))
    }

    async fn delete_user(&self, id: u64) -> AppResult<bool> {
        Ok(self.with(|t| {
            let before = t.users.len();
            t.users.retain(|u| u.id != id);
            // ON DELETE CASCADE
            t.attendance.retain(|a| a.user_id != id);
            t.bills.retain(|b| b.user_id != id);
            t.users.len() != before
        }))
    }
}

impl MenuStore for MemoryStore {
    async fn menus_in_range(&self, start: NaiveDate, end: NaiveDate) -> AppResult<Vec<DailyMenu>> {
        Ok(self.with(|t| {
            let mut menus: Vec<_> = t
                .menus
                .iter()
                .filter(|m| start <= m.date && m.date <= end)
                .cloned()
                .collect();
            menus.sort_by_key(|m| m.date);
            menus
        }))
    }

    async fn find_menu(&self, id: u64) -> AppResult<Option<DailyMenu>> {
        Ok(self.with(|t| t.menus.iter().find(|m| m.id == id).cloned()))
    }

    async fn find_menu_by_date(&self, date: NaiveDate) -> AppResult<Option<DailyMenu>> {
        Ok(self.with(|t| t.menus.iter().find(|m| m.date == date).cloned()))
    }

    async fn insert_menu(&self, menu: &NewMenu) -> AppResult<DailyMenu> {
        let now = self.now;
        self.with(|t| {
            if t.menus.iter().any(|m| m.date == menu.date) {
                return Err(duplicate("menu date"));
            }
            let stored = DailyMenu {
                id: t.next_id(),
                date: menu.date,
                fixed_charge: menu.fixed_charge,
                meals: menu.meals.clone(),
                created_at: now,
                updated_at: None,
            };
            t.menus.push(stored.clone());
            Ok(stored)
        })
    }

    async fn update_menu(&self, id: u64, changes: &MenuChanges) -> AppResult<Option<DailyMenu>> {
        let now = self.now;
        Ok(self.with(|t| {
            let menu = t.menus.iter_mut().find(|m| m.id == id)?;
            if let Some(fixed_charge) = changes.fixed_charge {
                menu.fixed_charge = fixed_charge;
            }
            if let Some(meals) = &changes.meals {
                menu.meals = meals.clone();
            }
            menu.updated_at = Some(now);
            Some(menu.clone())
        }))
    }

    async fn delete_menu(&self, id: u64) -> AppResult<bool> {
        Ok(self.with(|t| {
            let before = t.menus.len();
            t.menus.retain(|m| m.id != id);
            t.menus.len() != before
        }))
    }
}

fn insert_record(t: &mut Tables, record: &NewAttendance, now: NaiveDateTime) -> AppResult<AttendanceRecord> {
    if !t.users.iter().any(|u| u.id == record.user_id) {
        return Err(AppError::not_found("Referenced record does not exist"));
    }
    if t
        .attendance
        .iter()
        .any(|a| a.user_id == record.user_id && a.date == record.date)
    {
        return Err(duplicate("attendance"));
    }
    let stored = AttendanceRecord {
        id: t.next_id(),
        user_id: record.user_id,
        date: record.date,
        present: record.present,
        created_at: now,
        updated_at: None,
    };
    t.attendance.push(stored.clone());
    Ok(stored)
}

impl AttendanceStore for MemoryStore {
    async fn attendance_in_range(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<AttendanceRecord>> {
        Ok(self.with(|t| {
            let mut records: Vec<_> = t
                .attendance
                .iter()
                .filter(|a| a.user_id == user_id && start <= a.date && a.date <= end)
                .cloned()
                .collect();
            records.sort_by_key(|a| a.date);
            records
        }))
    }

    async fn attendance_for_user(&self, user_id: u64) -> AppResult<Vec<AttendanceRecord>> {
        Ok(self.with(|t| {
            let mut records: Vec<_> = t
                .attendance
                .iter()
                .filter(|a| a.user_id == user_id)
                .cloned()
                .collect();
            records.sort_by_key(|a| a.date);
            records
        }))
    }

    async fn attendance_on(&self, date: NaiveDate) -> AppResult<Vec<AttendanceRecord>> {
        Ok(self.with(|t| {
            let mut records: Vec<_> = t
                .attendance
                .iter()
                .filter(|a| a.date == date)
                .cloned()
                .collect();
            records.sort_by_key(|a| a.user_id);
            records
        }))
    }

    async fn find_attendance(&self, id: u64) -> AppResult<Option<AttendanceRecord>> {
        Ok(self.with(|t| t.attendance.iter().find(|a| a.id == id).cloned()))
    }

    async fn insert_attendance(&self, record: &NewAttendance) -> AppResult<AttendanceRecord> {
        let now = self.now;
        self.with(|t| insert_record(t, record, now))
    }

    async fn insert_attendance_batch(
        &self,
        records: &[NewAttendance],
    ) -> AppResult<Vec<AttendanceRecord>> {
        let now = self.now;
        self.with(|t| {
            let (next_id, attendance) = (t.next_id, t.attendance.clone());
            let inserted: AppResult<Vec<_>> = records
                .iter()
                .map(|record| insert_record(t, record, now))
                .collect();
            if inserted.is_err() {
                // rollback
                t.next_id = next_id;
                t.attendance = attendance;
            }
            inserted
        })
    }

    async fn set_attendance_status(
        &self,
        id: u64,
        present: bool,
    ) -> AppResult<Option<AttendanceRecord>> {
        let now = self.now;
        Ok(self.with(|t| {
            let record = t.attendance.iter_mut().find(|a| a.id == id)?;
            record.present = present;
            record.updated_at = Some(now);
            Some(record.clone())
        }))
    }

    async fn delete_attendance(&self, id: u64) -> AppResult<bool> {
        Ok(self.with(|t| {
            let before = t.attendance.len();
            t.attendance.retain(|a| a.id != id);
            t.attendance.len() != before
        }))
    }
}

impl BillStore for MemoryStore {
    async fn find_overlapping_bill(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Option<Bill>> {
        Ok(self.with(|t| {
            t.bills
                .iter()
                .find(|b| b.user_id == user_id && b.period_start <= end && start <= b.period_end)
                .cloned()
        }))
    }

    async fn insert_bill(&self, bill: &NewBill) -> AppResult<Bill> {
        self.with(|t| {
            if t.bills.iter().any(|b| {
                b.user_id == bill.user_id
                    && b.period_start == bill.period_start
                    && b.period_end == bill.period_end
            }) {
                return Err(duplicate("bill period"));
            }
            let stored = Bill {
                id: t.next_id(),
                user_id: bill.user_id,
                period_start: bill.period_start,
                period_end: bill.period_end,
                total_fixed_charges: bill.total_fixed_charges,
                total_food_charges: bill.total_food_charges,
                total_amount: bill.total_amount,
                total_days: bill.total_days,
                present_days: bill.present_days,
                absent_days: bill.absent_days,
                is_paid: false,
                paid_date: None,
                generated_date: bill.generated_date,
            };
            t.bills.push(stored.clone());
            Ok(stored)
        })
    }

    async fn find_bill(&self, id: u64) -> AppResult<Option<Bill>> {
        Ok(self.with(|t| t.bills.iter().find(|b| b.id == id).cloned()))
    }

    async fn bills_for_user(&self, user_id: u64) -> AppResult<Vec<Bill>> {
        self.list_bills(&BillFilter {
            user_id: Some(user_id),
            ..BillFilter::default()
        })
        .await
    }

    async fn list_bills(&self, filter: &BillFilter) -> AppResult<Vec<Bill>> {
        Ok(self.with(|t| {
            let mut bills: Vec<_> = t.bills.iter().filter(|b| filter.matches(b)).cloned().collect();
            bills.sort_by(|a, b| {
                b.generated_date
                    .cmp(&a.generated_date)
                    .then(b.id.cmp(&a.id))
            });
            bills
        }))
    }

    async fn mark_bill_paid(&self, id: u64, paid_at: NaiveDateTime) -> AppResult<bool> {
        Ok(self.with(|t| {
            match t.bills.iter_mut().find(|b| b.id == id && !b.is_paid) {
                Some(bill) => {
                    bill.is_paid = true;
                    bill.paid_date = Some(paid_at);
                    true
                }
                None => false,
            }
        }))
    }

    async fn delete_bill(&self, id: u64) -> AppResult<bool> {
        Ok(self.with(|t| {
            let before = t.bills.len();
            t.bills.retain(|b| b.id != id);
            t.bills.len() != before
        }))
    }
}

impl TokenStore for MemoryStore {
    async fn store_refresh_token(&self, user_id: u64, jti: &str, expires_at: i64) -> AppResult<()> {
        self.with(|t| {
            if t.refresh_tokens.iter().any(|r| r.jti == jti) {
                return Err(duplicate("refresh token"));
            }
            t.refresh_tokens.push(RefreshToken {
                user_id,
                jti: jti.to_string(),
                expires_at,
                revoked: false,
            });
            Ok(())
        })
    }

    async fn consume_refresh_token(&self, jti: &str) -> AppResult<Option<u64>> {
        let now = self.now.and_utc().timestamp();
        Ok(self.with(|t| {
            let token = t
                .refresh_tokens
                .iter_mut()
                .find(|r| r.jti == jti && !r.revoked && r.expires_at > now)?;
            token.revoked = true;
            Some(token.user_id)
        }))
    }

    async fn revoke_refresh_token(&self, jti: &str) -> AppResult<()> {
        self.with(|t| {
            for token in t.refresh_tokens.iter_mut().filter(|r| r.jti == jti) {
                token.revoked = true;
            }
        });
        Ok(())
    }

    async fn revoke_all_refresh_tokens(&self, user_id: u64) -> AppResult<()> {
        self.with(|t| {
            for token in t.refresh_tokens.iter_mut().filter(|r| r.user_id == user_id) {
                token.revoked = true;
            }
        });
        Ok(())
    }
}
