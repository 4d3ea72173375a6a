use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;
use crate::utils::patch::Patch;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 3,
        "first_name": "Alice",
        "last_name": "Student",
        "email": "alice@mess.com",
        "role": "Student",
        "is_active": true,
        "created_at": "2025-01-01T08:00:00",
        "roll_number": "CS2024001",
        "room_number": "A-101",
        "contact_number": "+1234567892"
    })
)]
pub struct User {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,

    #[serde(skip_serializing, default)]
    #[schema(write_only)]
    pub password_hash: String,

    #[sqlx(rename = "role_id", try_from = "u8")]
    pub role: Role,
    pub is_active: bool,
    pub created_at: NaiveDateTime,

    // Mess details, only meaningful for students
    pub roll_number: Option<String>,
    pub room_number: Option<String>,
    pub contact_number: Option<String>,
}

/// A validated, normalized user ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub roll_number: Option<String>,
    pub room_number: Option<String>,
    pub contact_number: Option<String>,
}

/// Column changes for an existing user. Required columns are plain options,
/// nullable ones keep the full `Patch` so they can be cleared.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub roll_number: Patch<String>,
    pub room_number: Patch<String>,
    pub contact_number: Patch<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.role.is_none()
            && self.is_active.is_none()
            && self.roll_number.is_absent()
            && self.room_number.is_absent()
            && self.contact_number.is_absent()
    }
}
