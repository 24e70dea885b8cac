use super::{AttendanceFilter, Directory, Ledger, StoreError};
use crate::model::{
    attendance::{AttendanceRecord, GeoPoint, NewAttendance},
    shift::Shift,
    user::User,
};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use moka::future::Cache;
use sqlx::MySqlPool;
use std::time::Duration;
use tracing::debug;

const RECORD_COLUMNS: &str = r#"
    id, user_id, shift_date, check_in_time, check_out_time,
    check_in_latitude, check_in_longitude, check_out_latitude, check_out_longitude
"#;

/// MySQL SQLSTATE for integrity constraint violations (duplicate key).
const DUPLICATE_KEY_STATE: &str = "23000";

pub struct MySqlDirectory {
    pool: MySqlPool,
    /// Shifts never change underneath a scan, so they are cached by id.
    shifts: Cache<u64, Shift>,
}

impl MySqlDirectory {
    pub fn new(pool: MySqlPool, shift_ttl: Duration) -> Self {
        Self {
            pool,
            shifts: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(shift_ttl)
                .build(),
        }
    }
}

#[async_trait]
impl Directory for MySqlDirectory {
    async fn get_user(&self, user_id: u64) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, shift_id AS default_shift_id
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_shift(&self, shift_id: u64) -> Result<Option<Shift>, StoreError> {
        if let Some(shift) = self.shifts.get(&shift_id).await {
            return Ok(Some(shift));
        }

        let shift = sqlx::query_as::<_, Shift>(
            r#"
            SELECT id, name, start_time, end_time, tolerance_start_time AS tolerance
            FROM shifts
            WHERE id = ?
            "#,
        )
        .bind(shift_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(shift) = &shift {
            self.shifts.insert(shift_id, shift.clone()).await;
        }

        Ok(shift)
    }

    async fn get_schedule_override(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<Option<u64>, StoreError> {
        let shift_id = sqlx::query_scalar::<_, u64>(
            r#"
            SELECT shift_id
            FROM shift_schedules
            WHERE user_id = ? AND schedule_date = ?
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift_id)
    }
}

pub struct MySqlLedger {
    pool: MySqlPool,
}

impl MySqlLedger {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Ledger for MySqlLedger {
    async fn find_open_record(
        &self,
        user_id: u64,
        shift_date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM attendance WHERE user_id = ? AND shift_date = ? AND check_out_time IS NULL",
            RECORD_COLUMNS
        );

        let record = sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(user_id)
            .bind(shift_date)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn find_record(
        &self,
        user_id: u64,
        shift_date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM attendance WHERE user_id = ? AND shift_date = ?",
            RECORD_COLUMNS
        );

        let record = sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(user_id)
            .bind(shift_date)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn insert(&self, record: &NewAttendance) -> Result<u64, StoreError> {
        // The unique key on (user_id, shift_date) is what actually prevents
        // double check-ins; the caller's earlier lookup is only a fast path.
        let result = sqlx::query(
            r#"
            INSERT INTO attendance
            (user_id, shift_date, check_in_time, check_in_latitude, check_in_longitude)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.user_id)
        .bind(record.shift_date)
        .bind(record.check_in_time)
        .bind(record.location.latitude)
        .bind(record.location.longitude)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.last_insert_id()),
            Err(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some(DUPLICATE_KEY_STATE) =>
            {
                Err(StoreError::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn close_out(
        &self,
        record_id: u64,
        checkout_time: NaiveDateTime,
        location: GeoPoint,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out_time = ?, check_out_latitude = ?, check_out_longitude = ?
            WHERE id = ?
            AND check_out_time IS NULL
            "#,
        )
        .bind(checkout_time)
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(record_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyClosed);
        }

        Ok(())
    }

    async fn list(
        &self,
        filter: &AttendanceFilter,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<AttendanceRecord>, i64), StoreError> {
        let offset = u64::from(page.saturating_sub(1)) * u64::from(per_page);

        // ---------- build WHERE clause dynamically ----------
        let mut conditions = Vec::new();
        if filter.user_id.is_some() {
            conditions.push("user_id = ?");
        }
        if filter.shift_date.is_some() {
            conditions.push("shift_date = ?");
        }

        let where_clause = if conditions.is_empty() {
            "".to_string()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        // ---------- total count ----------
        let count_sql = format!("SELECT COUNT(*) FROM attendance {}", where_clause);
        debug!(sql = %count_sql, ?filter, "Counting attendance");

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(user_id) = filter.user_id {
            count_query = count_query.bind(user_id);
        }
        if let Some(shift_date) = filter.shift_date {
            count_query = count_query.bind(shift_date);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        // ---------- data query ----------
        let data_sql = format!(
            "SELECT {} FROM attendance {} ORDER BY shift_date DESC, id DESC LIMIT ? OFFSET ?",
            RECORD_COLUMNS, where_clause
        );
        debug!(sql = %data_sql, page, per_page, offset, "Fetching attendance");

        let mut data_query = sqlx::query_as::<_, AttendanceRecord>(&data_sql);
        if let Some(user_id) = filter.user_id {
            data_query = data_query.bind(user_id);
        }
        if let Some(shift_date) = filter.shift_date {
            data_query = data_query.bind(shift_date);
        }
        data_query = data_query.bind(i64::from(per_page)).bind(offset as i64);

        let records = data_query.fetch_all(&self.pool).await?;

        Ok((records, total))
    }
}
