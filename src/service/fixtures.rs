//! Seed helpers shared by the service tests.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::model::attendance::NewAttendance;
use crate::model::daily_menu::{DailyMenu, MealItem, MealType, NewMenu};
use crate::model::role::Role;
use crate::model::user::{NewUser, User};
use crate::repository::memory::MemoryStore;
use crate::repository::{AttendanceStore, MenuStore, UserStore};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(10, 0, 0).unwrap()
}

pub async fn user(store: &MemoryStore, email: &str, role: Role) -> User {
    store
        .insert_user(&NewUser {
            first_name: "Test".into(),
            last_name: "User".into(),
            email: email.into(),
            password_hash: "not-a-real-hash".into(),
            role,
            roll_number: None,
            room_number: None,
            contact_number: None,
        })
        .await
        .unwrap()
}

pub async fn student(store: &MemoryStore, email: &str) -> User {
    user(store, email, Role::Student).await
}

pub fn meal(name: &str, price: Decimal) -> MealItem {
    MealItem {
        name: name.into(),
        meal_type: MealType::Lunch,
        price,
    }
}

pub async fn menu(store: &MemoryStore, day: NaiveDate, fixed: Decimal, meals: Vec<MealItem>) -> DailyMenu {
    store
        .insert_menu(&NewMenu {
            date: day,
            fixed_charge: fixed,
            meals,
        })
        .await
        .unwrap()
}

pub async fn attend(store: &MemoryStore, user_id: u64, day: NaiveDate, present: bool) {
    store
        .insert_attendance(&NewAttendance {
            user_id,
            date: day,
            present,
        })
        .await
        .unwrap();
}
