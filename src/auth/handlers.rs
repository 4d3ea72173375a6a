use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::auth::jwt::{generate_access_token, generate_refresh_token, verify_token};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::role::Role;
use crate::model::user::User;
use crate::models::TokenType;
use crate::repository::{MySqlStore, TokenStore};
use crate::service::session;
use crate::service::user::{self, CreateUser};
use crate::utils::email_index::EmailIndex;

#[derive(Debug, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "first_name": "Alice",
        "last_name": "Student",
        "email": "alice@mess.com",
        "password": "Student@123",
        "roll_number": "CS2024001",
        "room_number": "A-101",
        "contact_number": "+1234567892"
    })
)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub roll_number: Option<String>,
    pub room_number: Option<String>,
    pub contact_number: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice@mess.com")]
    pub email: String,
    #[schema(example = "Student@123")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Issues an access/refresh pair and records the refresh token.
async fn issue_tokens(store: &MySqlStore, config: &Config, user: &User) -> AppResult<TokenResponse> {
    debug!(user_id = user.id, "Generating tokens");

    let access_token = generate_access_token(user, &config.jwt_secret, config.access_token_ttl)?;
    let (refresh_token, refresh_claims) =
        generate_refresh_token(user, &config.jwt_secret, config.refresh_token_ttl)?;

    store
        .store_refresh_token(user.id, &refresh_claims.jti, refresh_claims.exp as i64)
        .await?;

    Ok(TokenResponse {
        access_token,
        refresh_token,
    })
}

/// Student self-registration
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Student account created", body = User),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_register", skip(store, index, payload), fields(email = %payload.email))]
pub async fn register(
    store: web::Data<MySqlStore>,
    index: web::Data<EmailIndex>,
    payload: web::Json<RegisterRequest>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();

    let user = user::create_user(
        store.get_ref(),
        index.get_ref(),
        CreateUser {
            first_name: payload.first_name,
            last_name: payload.last_name,
            email: payload.email,
            password: payload.password,
            role: Role::Student,
            roll_number: payload.roll_number,
            room_number: payload.room_number,
            contact_number: payload.contact_number,
        },
    )
    .await?;

    info!(user_id = user.id, "Student registered");
    Ok(HttpResponse::Created().json(user))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Tokens issued", body = TokenResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(store, config, payload), fields(email = %payload.email))]
pub async fn login(
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    payload: web::Json<LoginRequest>,
) -> actix_web::Result<impl Responder> {
    info!("Login request received");

    let user = user::authenticate(store.get_ref(), &payload.email, &payload.password).await?;
    let tokens = issue_tokens(store.get_ref(), config.get_ref(), &user).await?;

    info!(user_id = user.id, "Login successful");
    Ok(HttpResponse::Ok().json(tokens))
}

/// Trade a refresh token for a new token pair
///
/// The presented refresh token is revoked; each one works once.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New tokens issued", body = TokenResponse),
        (status = 401, description = "Missing, invalid, expired or revoked refresh token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let token = bearer_token(&req).ok_or_else(|| AppError::unauthorized("No token"))?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| AppError::unauthorized("Invalid token"))?;
    if claims.token_type != TokenType::Refresh {
        return Err(AppError::unauthorized("Refresh token required").into());
    }

    // revokes the old refresh token
    let user = session::redeem_refresh_token(store.get_ref(), &claims.jti).await?;

    let tokens = issue_tokens(store.get_ref(), config.get_ref(), &user).await?;
    debug!(user_id = user.id, "Refresh token rotated");
    Ok(HttpResponse::Ok().json(tokens))
}

/// Revoke a refresh token
///
/// Always answers 204, whether or not the token was known.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Logged out")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let Some(token) = bearer_token(&req) else {
        return Ok(HttpResponse::NoContent().finish());
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) if c.token_type == TokenType::Refresh => c,
        _ => return Ok(HttpResponse::NoContent().finish()),
    };

    store.revoke_refresh_token(&claims.jti).await?;
    Ok(HttpResponse::NoContent().finish())
}
