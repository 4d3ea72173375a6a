use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::{Executor, MySql};

use crate::error::AppError;
use crate::model::user::UserChanges;
use crate::utils::patch::Patch;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    U8(u8),
    Decimal(Decimal),
    Bool(bool),
    Json(serde_json::Value),
    DateTime(NaiveDateTime),
    Null,
}

/// `None` when the column should be left out of the update.
fn patch_value(patch: &Patch<String>) -> Option<SqlValue> {
    match patch {
        Patch::Absent => None,
        Patch::Null => Some(SqlValue::Null),
        Patch::Value(v) => Some(SqlValue::String(v.clone())),
    }
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug, PartialEq)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
///
/// Column names come from code, never from request bodies.
pub fn build_update_sql(
    table: &str,
    columns: Vec<(&'static str, SqlValue)>,
    id_column: &str,
    id_value: u64,
) -> Result<SqlUpdate, AppError> {
    if columns.is_empty() {
        return Err(AppError::invalid("No fields provided for update"));
    }

    let set_clause = columns
        .iter()
        .map(|(column, _)| format!("{} = ?", column))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values = Vec::with_capacity(columns.len() + 1);
    values.extend(columns.into_iter().map(|(_, value)| value));

    // WHERE id = ?
    values.push(SqlValue::U64(id_value));

    Ok(SqlUpdate { sql, values })
}

/// Column list for `users` from typed changes.
pub fn user_update_columns(changes: &UserChanges) -> Vec<(&'static str, SqlValue)> {
    let mut columns = Vec::new();

    if let Some(first_name) = &changes.first_name {
        columns.push(("first_name", SqlValue::String(first_name.clone())));
    }
    if let Some(last_name) = &changes.last_name {
        columns.push(("last_name", SqlValue::String(last_name.clone())));
    }
    if let Some(email) = &changes.email {
        columns.push(("email", SqlValue::String(email.clone())));
    }
    if let Some(role) = changes.role {
        columns.push(("role_id", SqlValue::U8(role.id())));
    }
    if let Some(is_active) = changes.is_active {
        columns.push(("is_active", SqlValue::Bool(is_active)));
    }

    let nullable = [
        ("roll_number", &changes.roll_number),
        ("room_number", &changes.room_number),
        ("contact_number", &changes.contact_number),
    ];
    for (column, patch) in nullable {
        if let Some(value) = patch_value(patch) {
            columns.push((column, value));
        }
    }

    columns
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update<'e, E>(executor: E, update: SqlUpdate) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::U8(v) => query.bind(v),
            SqlValue::Decimal(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Json(v) => query.bind(sqlx::types::Json(v)),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(executor).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;

    #[test]
    fn builds_set_clause_in_column_order() {
        let update = build_update_sql(
            "users",
            vec![
                ("first_name", SqlValue::String("Bob".into())),
                ("is_active", SqlValue::Bool(false)),
            ],
            "id",
            42,
        )
        .unwrap();

        assert_eq!(
            update.sql,
            "UPDATE users SET first_name = ?, is_active = ? WHERE id = ?"
        );
        assert_eq!(
            update.values,
            vec![
                SqlValue::String("Bob".into()),
                SqlValue::Bool(false),
                SqlValue::U64(42)
            ]
        );
    }

    #[test]
    fn empty_update_is_rejected() {
        let err = build_update_sql("users", Vec::new(), "id", 1).unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument { .. }));
    }

    #[test]
    fn user_changes_map_patches_to_columns() {
        let changes = UserChanges {
            role: Some(Role::Teacher),
            room_number: Patch::Null,
            contact_number: Patch::Value("+100".into()),
            ..UserChanges::default()
        };

        let columns = user_update_columns(&changes);

        assert_eq!(
            columns,
            vec![
                ("role_id", SqlValue::U8(2)),
                ("room_number", SqlValue::Null),
                ("contact_number", SqlValue::String("+100".into())),
            ]
        );
    }
}
