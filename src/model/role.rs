use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, EnumString, AsRefStr, ToSchema,
)]
#[strum(ascii_case_insensitive)]
pub enum Role {
    Admin = 1,
    Teacher = 2,
    Student = 3,
}

#[derive(Debug, Display, Error)]
#[display(fmt = "unknown role id {}", id)]
pub struct UnknownRole {
    pub id: u8,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Teacher),
            3 => Some(Role::Student),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Admins and teachers run the mess day to day.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Teacher)
    }
}

impl TryFrom<u8> for Role {
    type Error = UnknownRole;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Role::from_id(id).ok_or(UnknownRole { id })
    }
}
