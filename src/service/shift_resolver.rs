use crate::error::AttendanceError;
use crate::model::{
    shift::{EffectiveShift, ShiftSource},
    user::User,
};
use crate::store::{Directory, StoreError};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::warn;

/// Picks the shift that applies to a user on a given date.
///
/// A schedule override for the exact date wins; otherwise the user's default
/// shift applies. An override pointing at a deleted shift is ignored.
#[derive(Clone)]
pub struct ShiftResolver {
    directory: Arc<dyn Directory>,
}

impl ShiftResolver {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self { directory }
    }

    pub async fn resolve(
        &self,
        user: &User,
        date: NaiveDate,
    ) -> Result<Option<EffectiveShift>, StoreError> {
        if let Some(shift_id) = self.directory.get_schedule_override(user.id, date).await? {
            match self.directory.get_shift(shift_id).await? {
                Some(shift) => {
                    return Ok(Some(EffectiveShift::from_shift(&shift, ShiftSource::Override)));
                }
                None => {
                    warn!(user_id = user.id, shift_id, %date, "Schedule override references a missing shift");
                }
            }
        }

        let Some(shift_id) = user.default_shift_id else {
            return Ok(None);
        };

        let shift = self.directory.get_shift(shift_id).await?;
        Ok(shift.map(|s| EffectiveShift::from_shift(&s, ShiftSource::Default)))
    }

    /// Same as [`resolve`](Self::resolve) but starting from a bare user id.
    pub async fn resolve_effective_shift(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<EffectiveShift, AttendanceError> {
        let user = self
            .directory
            .get_user(user_id)
            .await?
            .ok_or_else(|| AttendanceError::NotFound("user not found".into()))?;

        self.resolve(&user, date)
            .await?
            .ok_or_else(|| AttendanceError::NotFound("no shift configured".into()))
    }
}
