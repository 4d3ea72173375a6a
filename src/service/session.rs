use tracing::instrument;

use crate::error::{AppError, AppResult};
use crate::model::user::User;
use crate::repository::{TokenStore, UserStore};

/// Spends a refresh token and returns its owner. Each token works once.
#[instrument(skip(store, jti))]
pub async fn redeem_refresh_token<S>(store: &S, jti: &str) -> AppResult<User>
where
    S: UserStore + TokenStore,
{
    let user_id = store
        .consume_refresh_token(jti)
        .await?
        .ok_or_else(|| AppError::unauthorized("Refresh token revoked or expired"))?;

    // role or status may have changed since the token was issued
    match store.find_user(user_id).await? {
        Some(user) if user.is_active => Ok(user),
        _ => Err(AppError::unauthorized("Account is not active")),
    }
}
