use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::model::role::Role;
use crate::model::user::User;
use crate::repository::{MySqlStore, TokenStore};
use crate::service::user::{self, CreateUser, UpdateUser};
use crate::utils::email_index::EmailIndex;

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    /// Only users with this role
    #[schema(example = "Student")]
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePassword {
    /// Required unless an admin is resetting the password
    #[schema(example = "Student@123")]
    pub current_password: Option<String>,
    #[schema(example = "Student@456")]
    pub new_password: String,
}

/// Current user's profile
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Profile of the caller", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Account no longer exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn me(auth: AuthUser, store: web::Data<MySqlStore>) -> actix_web::Result<impl Responder> {
    let user = user::get_user(store.get_ref(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Create a user of any role
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Email already registered")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn create_user(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    index: web::Data<EmailIndex>,
    payload: web::Json<CreateUser>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user = user::create_user(store.get_ref(), index.get_ref(), payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}

/// List users
#[utoipa::path(
    get,
    path = "/api/users",
    params(UserQuery),
    responses(
        (status = 200, description = "Users ordered by id", body = [User]),
        (status = 403, description = "Admin/Teacher only")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_users(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    query: web::Query<UserQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;

    let users = user::list_users(store.get_ref(), query.role).await?;
    Ok(HttpResponse::Ok().json(users))
}

/// Get a user
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 403, description = "Not your account"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_user(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    auth.require_self_or_staff(id)?;

    let user = user::get_user(store.get_ref(), id).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Update a user
///
/// Omitted fields stay as they are; `null` clears roll, room and contact
/// numbers. Only admins may change `role` or `is_active`.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Validation failed or nothing to update"),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already registered")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_user(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    index: web::Data<EmailIndex>,
    path: web::Path<u64>,
    payload: web::Json<UpdateUser>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    auth.require_self_or_admin(id)?;

    let user = user::update_user(
        store.get_ref(),
        index.get_ref(),
        id,
        payload.into_inner(),
        auth.is_admin(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Delete a user together with their attendance and bills
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn delete_user(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    index: web::Data<EmailIndex>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    user::delete_user(store.get_ref(), index.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Change a password
#[utoipa::path(
    post,
    path = "/api/users/{id}/password",
    params(("id" = u64, Path, description = "User id")),
    request_body = ChangePassword,
    responses(
        (status = 200, description = "Password changed", body = Object, example = json!({
            "message": "Password changed successfully"
        })),
        (status = 400, description = "Weak password or current password missing"),
        (status = 401, description = "Current password is incorrect"),
        (status = 403, description = "Not your account")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn change_password(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
    payload: web::Json<ChangePassword>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    auth.require_self_or_admin(id)?;

    user::change_password(
        store.get_ref(),
        id,
        payload.current_password.as_deref(),
        &payload.new_password,
        !auth.is_admin(),
    )
    .await?;
    // sessions opened with the old password end here
    store.revoke_all_refresh_tokens(id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Password changed successfully"
    })))
}
