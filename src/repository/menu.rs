use chrono::{NaiveDate, Utc};

use crate::error::{AppError, AppResult};
use crate::model::daily_menu::{DailyMenu, DailyMenuRow, MenuChanges, NewMenu};
use crate::repository::{MenuStore, MySqlStore};
use crate::utils::db_utils::{SqlValue, build_update_sql, execute_update};

const MENU_COLUMNS: &str = "id, date, fixed_charge, meals, created_at, updated_at";

impl MenuStore for MySqlStore {
    async fn menus_in_range(&self, start: NaiveDate, end: NaiveDate) -> AppResult<Vec<DailyMenu>> {
        let rows = sqlx::query_as::<_, DailyMenuRow>(&format!(
            "SELECT {MENU_COLUMNS} FROM daily_menus WHERE date BETWEEN ? AND ? ORDER BY date"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(DailyMenu::from).collect())
    }

    async fn find_menu(&self, id: u64) -> AppResult<Option<DailyMenu>> {
        let row = sqlx::query_as::<_, DailyMenuRow>(&format!(
            "SELECT {MENU_COLUMNS} FROM daily_menus WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(DailyMenu::from))
    }

    async fn find_menu_by_date(&self, date: NaiveDate) -> AppResult<Option<DailyMenu>> {
        let row = sqlx::query_as::<_, DailyMenuRow>(&format!(
            "SELECT {MENU_COLUMNS} FROM daily_menus WHERE date = ?"
        ))
        .bind(date)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(DailyMenu::from))
    }

    async fn insert_menu(&self, menu: &NewMenu) -> AppResult<DailyMenu> {
        let result = sqlx::query(
            r#"
            INSERT INTO daily_menus (date, fixed_charge, meals)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(menu.date)
        .bind(menu.fixed_charge)
        .bind(sqlx::types::Json(menu.meals.clone()))
        .execute(self.pool())
        .await?;

        let row = sqlx::query_as::<_, DailyMenuRow>(&format!(
            "SELECT {MENU_COLUMNS} FROM daily_menus WHERE id = ?"
        ))
        .bind(result.last_insert_id())
        .fetch_one(self.pool())
        .await?;
        Ok(row.into())
    }

    async fn update_menu(&self, id: u64, changes: &MenuChanges) -> AppResult<Option<DailyMenu>> {
        if self.find_menu(id).await?.is_none() {
            return Ok(None);
        }

        let mut columns = Vec::new();
        if let Some(fixed_charge) = changes.fixed_charge {
            columns.push(("fixed_charge", SqlValue::Decimal(fixed_charge)));
        }
        if let Some(meals) = &changes.meals {
            let meals = serde_json::to_value(meals)
                .map_err(|e| AppError::internal(e.to_string()))?;
            columns.push(("meals", SqlValue::Json(meals)));
        }
        if !columns.is_empty() {
            columns.push(("updated_at", SqlValue::DateTime(Utc::now().naive_utc())));
            let update = build_update_sql("daily_menus", columns, "id", id)?;
            execute_update(self.pool(), update).await?;
        }

        self.find_menu(id).await
    }

    async fn delete_menu(&self, id: u64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM daily_menus WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
