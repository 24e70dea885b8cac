//! Decides what a single attendance scan means.
//!
//! A scan is matched, in order, against:
//!
//! 1. an open record filed under the scan's own date (check-out),
//! 2. an open record filed under the previous date whose overnight shift
//!    ends today (check-out, subject to the cutover rule),
//! 3. a new check-in, filed under yesterday when the scan falls in the
//!    early-morning tail of an overnight shift.
//!
//! Every scan produces exactly one ledger write or one rejection.

use super::notify::AttendanceEvent;
use super::shift_resolver::ShiftResolver;
use crate::error::{AttendanceError, Rejection};
use crate::model::{
    attendance::{AttendanceRecord, GeoPoint, NewAttendance},
    shift::EffectiveShift,
    user::User,
};
use crate::store::{AttendanceFilter, Directory, Ledger};
use crate::utils::clock;
use chrono::{Duration, FixedOffset, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Raw scan as submitted by a device. Nothing is validated yet.
#[derive(Debug, Clone, Default)]
pub struct ScanInput {
    pub user_id: Option<u64>,
    pub timestamp: Option<String>,
    pub location: GeoPoint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScanOutcome {
    Checkin { record_id: u64, shift_date: NaiveDate },
    Checkout { record_id: u64, shift_date: NaiveDate },
}

/// Committed outcome plus the event to publish about it.
#[derive(Debug, Clone)]
pub struct ScanDecision {
    pub outcome: ScanOutcome,
    pub event: AttendanceEvent,
}

/// What to do with yesterday's open record when a scan arrives today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarryOver {
    CloseYesterday,
    TooEarly,
    SkipToCheckin,
}

/// Cutover rule for an open record left over from the previous date.
///
/// `next_start` is the start of the shift that applies on the scan's own
/// date, if any. A scan later than `next_start - grace` belongs to the new
/// cycle and leaves yesterday's record open.
pub fn carry_over_decision(
    shift: &EffectiveShift,
    shift_date: NaiveDate,
    scanned_at: NaiveDateTime,
    next_start: Option<NaiveDateTime>,
    grace: Duration,
) -> CarryOver {
    let shift_end = shift.end_on(shift_date);

    if !shift.is_overnight() || shift_end.date() != scanned_at.date() {
        return CarryOver::SkipToCheckin;
    }

    if scanned_at < shift_end {
        return CarryOver::TooEarly;
    }

    match next_start {
        Some(start) if scanned_at > start - grace => CarryOver::SkipToCheckin,
        _ => CarryOver::CloseYesterday,
    }
}

/// Date a check-in is filed under, given the shift that applies today.
pub fn checkin_shift_date(today_shift: &EffectiveShift, scanned_at: NaiveDateTime) -> NaiveDate {
    let today = scanned_at.date();
    if today_shift.is_overnight() && scanned_at.time() < today_shift.end_time {
        today.pred_opt().unwrap_or(today)
    } else {
        today
    }
}

pub struct AttendanceService {
    directory: Arc<dyn Directory>,
    ledger: Arc<dyn Ledger>,
    resolver: ShiftResolver,
    offset: FixedOffset,
    cutover_grace: Duration,
}

impl AttendanceService {
    pub fn new(
        directory: Arc<dyn Directory>,
        ledger: Arc<dyn Ledger>,
        offset: FixedOffset,
        cutover_grace: Duration,
    ) -> Self {
        Self {
            resolver: ShiftResolver::new(directory.clone()),
            directory,
            ledger,
            offset,
            cutover_grace,
        }
    }

    pub fn resolver(&self) -> &ShiftResolver {
        &self.resolver
    }

    pub fn offset(&self) -> &FixedOffset {
        &self.offset
    }

    #[instrument(skip(self, input), fields(user_id = ?input.user_id))]
    pub async fn handle_scan(&self, input: ScanInput) -> Result<ScanDecision, AttendanceError> {
        let user_id = input
            .user_id
            .ok_or_else(|| AttendanceError::InvalidInput("user_id is required".into()))?;

        let raw = input
            .timestamp
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AttendanceError::InvalidInput("timestamp is required".into()))?;

        let scanned_at = clock::parse_scan_timestamp(raw, &self.offset).ok_or_else(|| {
            AttendanceError::InvalidInput(format!("timestamp is not a valid date-time: {}", raw))
        })?;
        if !clock::in_supported_range(&scanned_at) {
            return Err(AttendanceError::InvalidInput("timestamp is out of range".into()));
        }

        let user = self
            .directory
            .get_user(user_id)
            .await?
            .ok_or_else(|| AttendanceError::NotFound("user not found".into()))?;

        let today = scanned_at.date();
        let yesterday = today
            .pred_opt()
            .ok_or_else(|| AttendanceError::InvalidInput("timestamp is out of range".into()))?;

        if let Some(open) = self.ledger.find_open_record(user.id, today).await? {
            return self.close_today(&user, &open, scanned_at, input.location).await;
        }

        if let Some(open) = self.ledger.find_open_record(user.id, yesterday).await? {
            if let Some(decision) = self
                .close_yesterday(&user, &open, scanned_at, input.location)
                .await?
            {
                return Ok(decision);
            }
        }

        self.check_in(&user, scanned_at, input.location).await
    }

    async fn close_today(
        &self,
        user: &User,
        open: &AttendanceRecord,
        scanned_at: NaiveDateTime,
        location: GeoPoint,
    ) -> Result<ScanDecision, AttendanceError> {
        let shift = self
            .resolver
            .resolve(user, open.shift_date)
            .await?
            .ok_or_else(no_shift)?;

        let shift_end = shift.end_on(open.shift_date);
        if scanned_at < shift_end {
            info!(user_id = user.id, %scanned_at, %shift_end, "Check-out before shift end");
            return Err(AttendanceError::Rejected(Rejection::TooEarlyToCheckOut));
        }

        self.check_out(user, open, scanned_at, location).await
    }

    async fn close_yesterday(
        &self,
        user: &User,
        open: &AttendanceRecord,
        scanned_at: NaiveDateTime,
        location: GeoPoint,
    ) -> Result<Option<ScanDecision>, AttendanceError> {
        let Some(shift) = self.resolver.resolve(user, open.shift_date).await? else {
            debug!(user_id = user.id, shift_date = %open.shift_date, "Open record has no shift, treating scan as check-in");
            return Ok(None);
        };

        let today = scanned_at.date();
        let next_start = if shift.is_overnight() {
            self.resolver
                .resolve(user, today)
                .await?
                .map(|next| next.start_on(today))
        } else {
            None
        };

        match carry_over_decision(
            &shift,
            open.shift_date,
            scanned_at,
            next_start,
            self.cutover_grace,
        ) {
            CarryOver::TooEarly => {
                info!(user_id = user.id, %scanned_at, shift_date = %open.shift_date, "Overnight check-out before shift end");
                Err(AttendanceError::Rejected(Rejection::TooEarlyToCheckOut))
            }
            CarryOver::SkipToCheckin => {
                debug!(user_id = user.id, shift_date = %open.shift_date, "Leaving previous record open");
                Ok(None)
            }
            CarryOver::CloseYesterday => self
                .check_out(user, open, scanned_at, location)
                .await
                .map(Some),
        }
    }

    async fn check_out(
        &self,
        user: &User,
        open: &AttendanceRecord,
        scanned_at: NaiveDateTime,
        location: GeoPoint,
    ) -> Result<ScanDecision, AttendanceError> {
        self.ledger.close_out(open.id, scanned_at, location).await?;

        info!(user_id = user.id, record_id = open.id, shift_date = %open.shift_date, "Checked out");

        Ok(ScanDecision {
            outcome: ScanOutcome::Checkout {
                record_id: open.id,
                shift_date: open.shift_date,
            },
            event: AttendanceEvent::CheckedOut {
                user_id: user.id,
                user_name: user.name.clone(),
                shift_date: open.shift_date,
                at: scanned_at,
            },
        })
    }

    async fn check_in(
        &self,
        user: &User,
        scanned_at: NaiveDateTime,
        location: GeoPoint,
    ) -> Result<ScanDecision, AttendanceError> {
        let today = scanned_at.date();
        let today_shift = self
            .resolver
            .resolve(user, today)
            .await?
            .ok_or_else(no_shift)?;

        let shift_date = checkin_shift_date(&today_shift, scanned_at);
        let shift = if shift_date == today {
            today_shift
        } else {
            self.resolver
                .resolve(user, shift_date)
                .await?
                .ok_or_else(no_shift)?
        };

        if self.ledger.find_record(user.id, shift_date).await?.is_some() {
            info!(user_id = user.id, %shift_date, "Duplicate check-in");
            return Err(AttendanceError::Rejected(Rejection::DuplicateAttendance));
        }

        let deadline = shift.tolerance_deadline(shift_date);
        if scanned_at > deadline {
            info!(user_id = user.id, %scanned_at, %deadline, "Check-in past tolerance");
            return Err(AttendanceError::Rejected(Rejection::LateBeyondTolerance));
        }

        let record_id = self
            .ledger
            .insert(&NewAttendance {
                user_id: user.id,
                shift_date,
                check_in_time: scanned_at,
                location,
            })
            .await?;

        info!(user_id = user.id, record_id, %shift_date, "Checked in");

        Ok(ScanDecision {
            outcome: ScanOutcome::Checkin {
                record_id,
                shift_date,
            },
            event: AttendanceEvent::CheckedIn {
                user_id: user.id,
                user_name: user.name.clone(),
                shift_date,
                at: scanned_at,
            },
        })
    }

    /// The user's record filed under the current date.
    pub async fn today_record(&self, user_id: u64) -> Result<AttendanceRecord, AttendanceError> {
        let today = clock::today(&self.offset);
        self.ledger
            .find_record(user_id, today)
            .await?
            .ok_or_else(|| AttendanceError::NotFound("attendance not found".into()))
    }

    pub async fn list_records(
        &self,
        filter: &AttendanceFilter,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<AttendanceRecord>, i64), AttendanceError> {
        Ok(self.ledger.list(filter, page, per_page).await?)
    }
}

fn no_shift() -> AttendanceError {
    AttendanceError::NotFound("no shift configured".into())
}
