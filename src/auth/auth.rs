use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::role::Role;
use crate::models::{Claims, TokenType};

/// The caller behind a valid access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    /// Builds the caller from access-token claims. Refresh tokens are refused.
    pub fn from_claims(claims: Claims) -> AppResult<Self> {
        if claims.token_type != TokenType::Access {
            return Err(AppError::unauthorized("Access token required"));
        }
        let role = Role::from_id(claims.role)
            .ok_or_else(|| AppError::unauthorized("Invalid role"))?;

        Ok(AuthUser {
            user_id: claims.user_id,
            email: claims.sub,
            role,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("Admin only"))
        }
    }

    pub fn require_staff(&self) -> AppResult<()> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::forbidden("Admin/Teacher only"))
        }
    }

    /// Students may only touch their own data; staff may touch anyone's.
    pub fn require_self_or_staff(&self, user_id: u64) -> AppResult<()> {
        if self.user_id == user_id || self.is_staff() {
            Ok(())
        } else {
            Err(AppError::forbidden("You can only access your own records"))
        }
    }

    pub fn require_self_or_admin(&self, user_id: u64) -> AppResult<()> {
        if self.user_id == user_id || self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("You can only access your own records"))
        }
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

fn authenticate(req: &HttpRequest) -> AppResult<AuthUser> {
    // already resolved by `auth_middleware`
    if let Some(user) = req.extensions().get::<AuthUser>() {
        return Ok(user.clone());
    }

    let token = bearer_token(req).ok_or_else(|| AppError::unauthorized("Missing token"))?;
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| AppError::internal("Config missing"))?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| AppError::unauthorized("Invalid token"))?;
    AuthUser::from_claims(claims)
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req).map_err(Into::into))
    }
}
