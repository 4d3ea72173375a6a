use crate::error::AppResult;
use crate::model::role::Role;
use crate::model::user::{NewUser, User, UserChanges};
use crate::repository::{MySqlStore, UserStore};
use crate::utils::db_utils::{build_update_sql, execute_update, user_update_columns};

const USER_COLUMNS: &str = r#"
    id, first_name, last_name, email, password_hash, role_id, is_active,
    created_at, roll_number, room_number, contact_number
"#;

impl UserStore for MySqlStore {
    async fn find_user(&self, id: u64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    async fn list_users(&self, role: Option<Role>) -> AppResult<Vec<User>> {
        let users = match role {
            Some(role) => {
                sqlx::query_as::<_, User>(&format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE role_id = ? ORDER BY id"
                ))
                .bind(role.id())
                .fetch_all(self.pool())
                .await?
            }
            None => {
                sqlx::query_as::<_, User>(&format!(
                    "SELECT {USER_COLUMNS} FROM users ORDER BY id"
                ))
                .fetch_all(self.pool())
                .await?
            }
        };
        Ok(users)
    }

    async fn count_users(&self) -> AppResult<i64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool())
            .await?;
        Ok(total)
    }

    async fn insert_user(&self, user: &NewUser) -> AppResult<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users
                (first_name, last_name, email, password_hash, role_id,
                 roll_number, room_number, contact_number)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.id())
        .bind(&user.roll_number)
        .bind(&user.room_number)
        .bind(&user.contact_number)
        .execute(self.pool())
        .await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(result.last_insert_id())
        .fetch_one(self.pool())
        .await?;
        Ok(user)
    }

    async fn update_user(&self, id: u64, changes: &UserChanges) -> AppResult<Option<User>> {
        if self.find_user(id).await?.is_none() {
            return Ok(None);
        }

        let columns = user_update_columns(changes);
        if !columns.is_empty() {
            let update = build_update_sql("users", columns, "id", id)?;
            execute_update(self.pool(), update).await?;
        }

        self.find_user(id).await
    }

    async fn set_password_hash(&self, id: u64, password_hash: &str) -> AppResult<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, id: u64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
