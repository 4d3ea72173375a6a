use chrono::NaiveDate;

use crate::error::AppResult;
use crate::model::attendance::{AttendanceRecord, NewAttendance};
use crate::repository::{AttendanceStore, MySqlStore};

const ATTENDANCE_COLUMNS: &str = "id, user_id, date, present, created_at, updated_at";

impl AttendanceStore for MySqlStore {
    async fn attendance_in_range(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<AttendanceRecord>> {
        let records = sqlx::query_as::<_, AttendanceRecord>(&format!(
            r#"
            SELECT {ATTENDANCE_COLUMNS}
            FROM attendance
            WHERE user_id = ? AND date BETWEEN ? AND ?
            ORDER BY date
            "#
        ))
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(self.pool())
        .await?;
        Ok(records)
    }

    async fn attendance_for_user(&self, user_id: u64) -> AppResult<Vec<AttendanceRecord>> {
        let records = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE user_id = ? ORDER BY date"
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(records)
    }

    async fn attendance_on(&self, date: NaiveDate) -> AppResult<Vec<AttendanceRecord>> {
        let records = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE date = ? ORDER BY user_id"
        ))
        .bind(date)
        .fetch_all(self.pool())
        .await?;
        Ok(records)
    }

    async fn find_attendance(&self, id: u64) -> AppResult<Option<AttendanceRecord>> {
        let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(record)
    }

    async fn insert_attendance(&self, record: &NewAttendance) -> AppResult<AttendanceRecord> {
        // uq_attendance_user_date rejects a second row for the same day
        let result =
            sqlx::query("INSERT INTO attendance (user_id, date, present) VALUES (?, ?, ?)")
                .bind(record.user_id)
                .bind(record.date)
                .bind(record.present)
                .execute(self.pool())
                .await?;

        let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id = ?"
        ))
        .bind(result.last_insert_id())
        .fetch_one(self.pool())
        .await?;
        Ok(record)
    }

    async fn insert_attendance_batch(
        &self,
        records: &[NewAttendance],
    ) -> AppResult<Vec<AttendanceRecord>> {
        let mut tx = self.pool().begin().await?;
        let mut ids = Vec::with_capacity(records.len());

        for record in records {
            let result =
                sqlx::query("INSERT INTO attendance (user_id, date, present) VALUES (?, ?, ?)")
                    .bind(record.user_id)
                    .bind(record.date)
                    .bind(record.present)
                    .execute(&mut *tx)
                    .await?;
            ids.push(result.last_insert_id());
        }

        tx.commit().await?;

        let mut inserted = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.find_attendance(id).await? {
                inserted.push(record);
            }
        }
        Ok(inserted)
    }

    async fn set_attendance_status(
        &self,
        id: u64,
        present: bool,
    ) -> AppResult<Option<AttendanceRecord>> {
        // rows_affected is not a reliable existence check on MySQL, re-read instead
        sqlx::query("UPDATE attendance SET present = ?, updated_at = UTC_TIMESTAMP() WHERE id = ?")
            .bind(present)
            .bind(id)
            .execute(self.pool())
            .await?;

        self.find_attendance(id).await
    }

    async fn delete_attendance(&self, id: u64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM attendance WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
