use serde::Deserialize;
use tracing::instrument;
use utoipa::ToSchema;

use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::model::role::Role;
use crate::model::user::{NewUser, User, UserChanges};
use crate::repository::UserStore;
use crate::utils::email_index::EmailIndex;
use crate::utils::patch::Patch;
use crate::utils::validation::{
    normalize_optional, validate_email, validate_name, validate_password,
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "first_name": "Alice",
        "last_name": "Student",
        "email": "alice@mess.com",
        "password": "Student@123",
        "role": "Student",
        "roll_number": "CS2024001",
        "room_number": "A-101",
        "contact_number": "+1234567892"
    })
)]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub roll_number: Option<String>,
    pub room_number: Option<String>,
    pub contact_number: Option<String>,
}

/// Partial update. Missing keys are left alone; `null` clears the nullable
/// mess details and is rejected for everything else.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateUser {
    #[schema(value_type = Option<String>)]
    pub first_name: Patch<String>,
    #[schema(value_type = Option<String>)]
    pub last_name: Patch<String>,
    #[schema(value_type = Option<String>)]
    pub email: Patch<String>,
    #[schema(value_type = Option<Role>)]
    pub role: Patch<Role>,
    #[schema(value_type = Option<bool>)]
    pub is_active: Patch<bool>,
    #[schema(value_type = Option<String>)]
    pub roll_number: Patch<String>,
    #[schema(value_type = Option<String>)]
    pub room_number: Patch<String>,
    #[schema(value_type = Option<String>)]
    pub contact_number: Patch<String>,
}

fn normalize_patch(patch: Patch<String>) -> Patch<String> {
    match patch {
        Patch::Value(v) => match normalize_optional(Some(v)) {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        },
        other => other,
    }
}

impl UpdateUser {
    /// Validates and turns the request into column changes.
    /// `admin` gates role and activation changes.
    fn into_changes(self, admin: bool) -> AppResult<UserChanges> {
        let role = self.role.into_required("role")?;
        let is_active = self.is_active.into_required("is_active")?;
        if !admin && (role.is_some() || is_active.is_some()) {
            return Err(AppError::forbidden(
                "Only admins can change role or account status",
            ));
        }

        Ok(UserChanges {
            first_name: self
                .first_name
                .into_required("first_name")?
                .map(|v| validate_name("first_name", &v))
                .transpose()?,
            last_name: self
                .last_name
                .into_required("last_name")?
                .map(|v| validate_name("last_name", &v))
                .transpose()?,
            email: self
                .email
                .into_required("email")?
                .map(|v| validate_email(&v))
                .transpose()?,
            role,
            is_active,
            roll_number: normalize_patch(self.roll_number),
            room_number: normalize_patch(self.room_number),
            contact_number: normalize_patch(self.contact_number),
        })
    }
}

fn user_not_found(id: u64) -> AppError {
    AppError::not_found(format!("User {id} not found"))
}

#[instrument(skip(store, index, input), fields(email = %input.email, role = ?input.role))]
pub async fn create_user<S: UserStore>(
    store: &S,
    index: &EmailIndex,
    input: CreateUser,
) -> AppResult<User> {
    let first_name = validate_name("first_name", &input.first_name)?;
    let last_name = validate_name("last_name", &input.last_name)?;
    let email = validate_email(&input.email)?;
    validate_password(&input.password)?;

    if !index.is_available(&email, store).await? {
        return Err(AppError::conflict("Email already registered"));
    }

    let user = store
        .insert_user(&NewUser {
            first_name,
            last_name,
            email,
            password_hash: hash_password(&input.password)?,
            role: input.role,
            roll_number: normalize_optional(input.roll_number),
            room_number: normalize_optional(input.room_number),
            contact_number: normalize_optional(input.contact_number),
        })
        .await
        .map_err(|e| match e {
            AppError::Conflict { .. } => AppError::conflict("Email already registered"),
            other => other,
        })?;

    index.mark_taken(&user.email).await;
    tracing::info!(user_id = user.id, "User created");
    Ok(user)
}

pub async fn list_users<S: UserStore>(store: &S, role: Option<Role>) -> AppResult<Vec<User>> {
    store.list_users(role).await
}

pub async fn get_user<S: UserStore>(store: &S, id: u64) -> AppResult<User> {
    store.find_user(id).await?.ok_or_else(|| user_not_found(id))
}

#[instrument(skip(store, index, input))]
pub async fn update_user<S: UserStore>(
    store: &S,
    index: &EmailIndex,
    id: u64,
    input: UpdateUser,
    admin: bool,
) -> AppResult<User> {
    let changes = input.into_changes(admin)?;
    if changes.is_empty() {
        return Err(AppError::invalid("No fields provided for update"));
    }

    let before = get_user(store, id).await?;
    let user = store
        .update_user(id, &changes)
        .await
        .map_err(|e| match e {
            AppError::Conflict { .. } => AppError::conflict("Email already registered"),
            other => other,
        })?
        .ok_or_else(|| user_not_found(id))?;

    if before.email != user.email {
        index.forget(&before.email).await;
        index.mark_taken(&user.email).await;
    }
    tracing::info!(user_id = id, "User updated");
    Ok(user)
}

#[instrument(skip(store, index))]
pub async fn delete_user<S: UserStore>(store: &S, index: &EmailIndex, id: u64) -> AppResult<()> {
    let user = get_user(store, id).await?;
    if !store.delete_user(id).await? {
        return Err(user_not_found(id));
    }
    index.forget(&user.email).await;
    tracing::info!(user_id = id, "User deleted");
    Ok(())
}

/// With `require_current` the caller must prove the old password; admins
/// resetting someone's password skip that.
#[instrument(skip(store, current_password, new_password))]
pub async fn change_password<S: UserStore>(
    store: &S,
    id: u64,
    current_password: Option<&str>,
    new_password: &str,
    require_current: bool,
) -> AppResult<()> {
    let user = get_user(store, id).await?;

    if require_current {
        let current = current_password
            .ok_or_else(|| AppError::invalid("current_password is required"))?;
        if !verify_password(current, &user.password_hash)? {
            return Err(AppError::unauthorized("Current password is incorrect"));
        }
    }
    validate_password(new_password)?;

    if !store.set_password_hash(id, &hash_password(new_password)?).await? {
        return Err(user_not_found(id));
    }
    tracing::info!(user_id = id, "Password changed");
    Ok(())
}

/// Returns the active user owning these credentials. Every failure reads
/// the same to the caller.
#[instrument(skip(store, password))]
pub async fn authenticate<S: UserStore>(store: &S, email: &str, password: &str) -> AppResult<User> {
    let invalid = || AppError::unauthorized("Invalid credentials");

    let email = email.trim().to_lowercase();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::invalid("Email and password are required"));
    }

    let Some(user) = store.find_user_by_email(&email).await? else {
        tracing::info!("Invalid credentials: user not found");
        return Err(invalid());
    };

    if !verify_password(password, &user.password_hash)? {
        tracing::info!(user_id = user.id, "Invalid credentials: password mismatch");
        return Err(invalid());
    }
    if !user.is_active {
        tracing::info!(user_id = user.id, "Login refused: account disabled");
        return Err(invalid());
    }
    Ok(user)
}
