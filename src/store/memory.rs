//! In-memory directory and ledger used by tests.

use super::{AttendanceFilter, Directory, Ledger, StoreError};
use crate::model::{
    attendance::{AttendanceRecord, GeoPoint, NewAttendance},
    shift::Shift,
    user::User,
};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
pub struct InMemoryDirectory {
    users: Mutex<HashMap<u64, User>>,
    shifts: Mutex<HashMap<u64, Shift>>,
    overrides: Mutex<HashMap<(u64, NaiveDate), u64>>,
}

impl InMemoryDirectory {
    pub fn with_user(self, id: u64, default_shift_id: Option<u64>) -> Self {
        self.users.lock().unwrap().insert(
            id,
            User {
                id,
                name: format!("user-{}", id),
                default_shift_id,
            },
        );
        self
    }

    /// Registers a shift from `"HH:MM"` strings and a tolerance in minutes.
    pub fn with_shift(self, id: u64, start: &str, end: &str, tolerance_minutes: u32) -> Self {
        let parse = |s: &str| NaiveTime::parse_from_str(s, "%H:%M").unwrap();
        self.shifts.lock().unwrap().insert(
            id,
            Shift {
                id,
                name: format!("shift-{}", id),
                start_time: parse(start),
                end_time: parse(end),
                tolerance: NaiveTime::from_hms_opt(tolerance_minutes / 60, tolerance_minutes % 60, 0)
                    .unwrap(),
            },
        );
        self
    }

    pub fn with_override(self, user_id: u64, date: NaiveDate, shift_id: u64) -> Self {
        self.overrides
            .lock()
            .unwrap()
            .insert((user_id, date), shift_id);
        self
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn get_user(&self, user_id: u64) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }

    async fn get_shift(&self, shift_id: u64) -> Result<Option<Shift>, StoreError> {
        Ok(self.shifts.lock().unwrap().get(&shift_id).cloned())
    }

    async fn get_schedule_override(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<Option<u64>, StoreError> {
        Ok(self.overrides.lock().unwrap().get(&(user_id, date)).copied())
    }
}

#[derive(Default)]
pub struct InMemoryLedger {
    records: Mutex<Vec<AttendanceRecord>>,
    /// When set, every call fails with a database error.
    pub broken: AtomicBool,
    /// When set, lookups miss everything, as if a concurrent write were
    /// not yet visible. Writes still see the real state.
    pub stale_reads: AtomicBool,
}

impl InMemoryLedger {
    pub fn records(&self) -> Vec<AttendanceRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Seeds an open record as if a check-in had already happened.
    pub fn seed_open(&self, user_id: u64, shift_date: NaiveDate, check_in_time: NaiveDateTime) -> u64 {
        let mut records = self.records.lock().unwrap();
        let id = records.len() as u64 + 1;
        records.push(AttendanceRecord {
            id,
            user_id,
            shift_date,
            check_in_time,
            check_out_time: None,
            check_in_latitude: None,
            check_in_longitude: None,
            check_out_latitude: None,
            check_out_longitude: None,
        });
        id
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn find_open_record(
        &self,
        user_id: u64,
        shift_date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        self.check()?;
        if self.stale_reads.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user_id == user_id && r.shift_date == shift_date && r.is_open())
            .cloned())
    }

    async fn find_record(
        &self,
        user_id: u64,
        shift_date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        self.check()?;
        if self.stale_reads.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user_id == user_id && r.shift_date == shift_date)
            .cloned())
    }

    async fn insert(&self, record: &NewAttendance) -> Result<u64, StoreError> {
        self.check()?;
        let mut records = self.records.lock().unwrap();
        if records
            .iter()
            .any(|r| r.user_id == record.user_id && r.shift_date == record.shift_date)
        {
            return Err(StoreError::Duplicate);
        }
        let id = records.len() as u64 + 1;
        records.push(AttendanceRecord {
            id,
            user_id: record.user_id,
            shift_date: record.shift_date,
            check_in_time: record.check_in_time,
            check_out_time: None,
            check_in_latitude: record.location.latitude,
            check_in_longitude: record.location.longitude,
            check_out_latitude: None,
            check_out_longitude: None,
        });
        Ok(id)
    }

    async fn close_out(
        &self,
        record_id: u64,
        checkout_time: NaiveDateTime,
        location: GeoPoint,
    ) -> Result<(), StoreError> {
        self.check()?;
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == record_id && r.is_open())
            .ok_or(StoreError::AlreadyClosed)?;
        record.check_out_time = Some(checkout_time);
        record.check_out_latitude = location.latitude;
        record.check_out_longitude = location.longitude;
        Ok(())
    }

    async fn list(
        &self,
        filter: &AttendanceFilter,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<AttendanceRecord>, i64), StoreError> {
        self.check()?;
        let mut matching: Vec<_> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| filter.user_id.is_none_or(|id| r.user_id == id))
            .filter(|r| filter.shift_date.is_none_or(|d| r.shift_date == d))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.shift_date.cmp(&a.shift_date).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let offset = u64::from(page.saturating_sub(1)) * u64::from(per_page);
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let data = matching
            .into_iter()
            .skip(offset)
            .take(per_page as usize)
            .collect();
        Ok((data, total))
    }
}
