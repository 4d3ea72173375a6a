use chrono::{NaiveDate, NaiveDateTime};

use crate::error::AppResult;
use crate::model::bill::{Bill, BillFilter, NewBill};
use crate::repository::{BillStore, MySqlStore};

const BILL_COLUMNS: &str = r#"
    id, user_id, period_start, period_end,
    total_fixed_charges, total_food_charges, total_amount,
    total_days, present_days, absent_days,
    is_paid, paid_date, generated_date
"#;

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Date(NaiveDate),
}

impl BillStore for MySqlStore {
    async fn find_overlapping_bill(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Option<Bill>> {
        let bill = sqlx::query_as::<_, Bill>(&format!(
            r#"
            SELECT {BILL_COLUMNS}
            FROM bills
            WHERE user_id = ? AND period_start <= ? AND period_end >= ?
            ORDER BY period_start
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .bind(end)
        .bind(start)
        .fetch_optional(self.pool())
        .await?;
        Ok(bill)
    }

    async fn insert_bill(&self, bill: &NewBill) -> AppResult<Bill> {
        // uq_bills_user_period closes the race between two generate calls
        let result = sqlx::query(
            r#"
            INSERT INTO bills
                (user_id, period_start, period_end,
                 total_fixed_charges, total_food_charges, total_amount,
                 total_days, present_days, absent_days, generated_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(bill.user_id)
        .bind(bill.period_start)
        .bind(bill.period_end)
        .bind(bill.total_fixed_charges)
        .bind(bill.total_food_charges)
        .bind(bill.total_amount)
        .bind(bill.total_days)
        .bind(bill.present_days)
        .bind(bill.absent_days)
        .bind(bill.generated_date)
        .execute(self.pool())
        .await?;

        let bill = sqlx::query_as::<_, Bill>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE id = ?"
        ))
        .bind(result.last_insert_id())
        .fetch_one(self.pool())
        .await?;
        Ok(bill)
    }

    async fn find_bill(&self, id: u64) -> AppResult<Option<Bill>> {
        let bill = sqlx::query_as::<_, Bill>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(bill)
    }

    async fn bills_for_user(&self, user_id: u64) -> AppResult<Vec<Bill>> {
        let bills = sqlx::query_as::<_, Bill>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE user_id = ? ORDER BY generated_date DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(bills)
    }

    async fn list_bills(&self, filter: &BillFilter) -> AppResult<Vec<Bill>> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(user_id) = filter.user_id {
            where_sql.push_str(" AND user_id = ?");
            args.push(FilterValue::U64(user_id));
        }
        if let Some(start) = filter.start {
            where_sql.push_str(" AND period_start >= ?");
            args.push(FilterValue::Date(start));
        }
        if let Some(end) = filter.end {
            where_sql.push_str(" AND period_end <= ?");
            args.push(FilterValue::Date(end));
        }

        let sql = format!(
            "SELECT {BILL_COLUMNS} FROM bills{where_sql} ORDER BY generated_date DESC, id DESC"
        );
        tracing::debug!(sql = %sql, "Listing bills");

        let mut query = sqlx::query_as::<_, Bill>(&sql);
        for arg in args {
            query = match arg {
                FilterValue::U64(v) => query.bind(v),
                FilterValue::Date(v) => query.bind(v),
            };
        }

        Ok(query.fetch_all(self.pool()).await?)
    }

    async fn mark_bill_paid(&self, id: u64, paid_at: NaiveDateTime) -> AppResult<bool> {
        // is_paid = FALSE guard keeps the first paid_date on repeat calls
        let result =
            sqlx::query("UPDATE bills SET is_paid = TRUE, paid_date = ? WHERE id = ? AND is_paid = FALSE")
                .bind(paid_at)
                .bind(id)
                .execute(self.pool())
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_bill(&self, id: u64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM bills WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
