use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Shift {
    pub id: u64,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Late allowance after `start_time`, stored as a time of day (`00:15:00`).
    pub tolerance: NaiveTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftSource {
    Override,
    Default,
}

/// The shift that actually applies to one user on one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveShift {
    pub shift_id: u64,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub tolerance: Duration,
    pub source: ShiftSource,
}

impl EffectiveShift {
    pub fn from_shift(shift: &Shift, source: ShiftSource) -> Self {
        Self {
            shift_id: shift.id,
            start_time: shift.start_time,
            end_time: shift.end_time,
            tolerance: time_of_day_as_duration(shift.tolerance),
            source,
        }
    }

    /// True when the shift crosses midnight. Compared at whole-second resolution.
    pub fn is_overnight(&self) -> bool {
        self.end_time.num_seconds_from_midnight() < self.start_time.num_seconds_from_midnight()
    }

    pub fn start_on(&self, shift_date: NaiveDate) -> NaiveDateTime {
        shift_date.and_time(self.start_time)
    }

    /// End instant of the shift that starts on `shift_date`.
    pub fn end_on(&self, shift_date: NaiveDate) -> NaiveDateTime {
        let end = shift_date.and_time(self.end_time);
        if self.is_overnight() {
            end + Duration::days(1)
        } else {
            end
        }
    }

    /// Latest accepted check-in for the shift starting on `shift_date`.
    pub fn tolerance_deadline(&self, shift_date: NaiveDate) -> NaiveDateTime {
        self.start_on(shift_date) + self.tolerance
    }
}

pub fn time_of_day_as_duration(time: NaiveTime) -> Duration {
    Duration::seconds(i64::from(time.num_seconds_from_midnight()))
}
