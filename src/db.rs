use anyhow::{Context, Result};
use sqlx::MySqlPool;
use tracing::info;

use crate::model::role::Role;
use crate::repository::UserStore;
use crate::service::user::{CreateUser, create_user};
use crate::utils::email_index::EmailIndex;

pub async fn init_db(database_url: &str, run_migrations: bool) -> Result<MySqlPool> {
    let pool = MySqlPool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    if run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;
        info!("Database migrations applied");
    }

    Ok(pool)
}

/// Creates the first admin when nobody can log in yet. Returns whether an
/// account was created.
pub async fn seed_admin<S: UserStore>(
    store: &S,
    index: &EmailIndex,
    email: &str,
    password: &str,
) -> Result<bool> {
    if store.count_users().await? > 0 {
        return Ok(false);
    }

    let admin = create_user(
        store,
        index,
        CreateUser {
            first_name: "Mess".into(),
            last_name: "Admin".into(),
            email: email.into(),
            password: password.into(),
            role: Role::Admin,
            roll_number: None,
            room_number: None,
            contact_number: None,
        },
    )
    .await
    .context("Failed to seed admin account")?;

    info!(user_id = admin.id, "Seeded admin account");
    Ok(true)
}
