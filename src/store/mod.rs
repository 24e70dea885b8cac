use crate::model::{
    attendance::{AttendanceRecord, GeoPoint, NewAttendance},
    shift::Shift,
    user::User,
};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

#[cfg(test)]
pub mod memory;
pub mod mysql;

#[derive(Error, Debug)]
pub enum StoreError {
    /// A record for the same (user, shift_date) already exists.
    #[error("attendance already recorded for this date")]
    Duplicate,

    /// The record was closed by someone else between read and write.
    #[error("attendance record is already closed")]
    AlreadyClosed,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read access to users, shifts and per-date schedule overrides.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn get_user(&self, user_id: u64) -> Result<Option<User>, StoreError>;

    async fn get_shift(&self, shift_id: u64) -> Result<Option<Shift>, StoreError>;

    async fn get_schedule_override(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<Option<u64>, StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub user_id: Option<u64>,
    pub shift_date: Option<NaiveDate>,
}

/// Append-only store of attendance rows, unique per (user, shift_date).
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn find_open_record(
        &self,
        user_id: u64,
        shift_date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    async fn find_record(
        &self,
        user_id: u64,
        shift_date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Inserts a check-in and returns its id. Fails with
    /// [`StoreError::Duplicate`] if the (user, shift_date) slot is taken.
    async fn insert(&self, record: &NewAttendance) -> Result<u64, StoreError>;

    /// Fills the check-out fields of an open record. Fails with
    /// [`StoreError::AlreadyClosed`] if the record is not open anymore.
    async fn close_out(
        &self,
        record_id: u64,
        checkout_time: NaiveDateTime,
        location: GeoPoint,
    ) -> Result<(), StoreError>;

    /// One page of records, newest first, with the total matching count.
    async fn list(
        &self,
        filter: &AttendanceFilter,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<AttendanceRecord>, i64), StoreError>;
}
