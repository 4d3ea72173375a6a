use crate::error::AppResult;
use crate::repository::{MySqlStore, TokenStore};

impl TokenStore for MySqlStore {
    async fn store_refresh_token(&self, user_id: u64, jti: &str, expires_at: i64) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, jti, expires_at)
            VALUES (?, ?, FROM_UNIXTIME(?))
            "#,
        )
        .bind(user_id)
        .bind(jti)
        .bind(expires_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn consume_refresh_token(&self, jti: &str) -> AppResult<Option<u64>> {
        // the guarded UPDATE is the check; a concurrent caller sees 0 rows
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE jti = ? AND revoked = FALSE AND expires_at > NOW()
            "#,
        )
        .bind(jti)
        .execute(self.pool())
        .await?;

        if result.rows_affected() != 1 {
            return Ok(None);
        }

        let owner = sqlx::query_as::<_, (u64,)>("SELECT user_id FROM refresh_tokens WHERE jti = ?")
            .bind(jti)
            .fetch_optional(self.pool())
            .await?;
        Ok(owner.map(|(user_id,)| user_id))
    }

    async fn revoke_refresh_token(&self, jti: &str) -> AppResult<()> {
        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
            .bind(jti)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn revoke_all_refresh_tokens(&self, user_id: u64) -> AppResult<()> {
        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = ?")
            .bind(user_id)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}
