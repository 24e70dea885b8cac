use crate::store::StoreError;
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

/// Business-rule violations. Expected and frequent, not server errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TooEarlyToCheckOut,
    LateBeyondTolerance,
    DuplicateAttendance,
    AlreadyCheckedOut,
}

impl Rejection {
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::TooEarlyToCheckOut => "too_early_to_check_out",
            Rejection::LateBeyondTolerance => "late_beyond_tolerance",
            Rejection::DuplicateAttendance => "duplicate_attendance",
            Rejection::AlreadyCheckedOut => "already_checked_out",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::TooEarlyToCheckOut => "too early to check out",
            Rejection::LateBeyondTolerance => "late beyond tolerance",
            Rejection::DuplicateAttendance => "duplicate attendance",
            Rejection::AlreadyCheckedOut => "already checked out",
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum AttendanceError {
    #[error("{0}")]
    InvalidInput(String),

    /// Unknown user, or no shift configured for the date in question.
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Rejected(Rejection),

    #[error("storage failure: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for AttendanceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => AttendanceError::Rejected(Rejection::DuplicateAttendance),
            StoreError::AlreadyClosed => AttendanceError::Rejected(Rejection::AlreadyCheckedOut),
            other => AttendanceError::Storage(other),
        }
    }
}

impl AttendanceError {
    pub fn code(&self) -> &'static str {
        match self {
            AttendanceError::InvalidInput(_) => "invalid_input",
            AttendanceError::NotFound(_) => "not_found",
            AttendanceError::Rejected(r) => r.code(),
            AttendanceError::Storage(_) => "internal",
        }
    }
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::InvalidInput(_) | AttendanceError::Rejected(_) => {
                StatusCode::BAD_REQUEST
            }
            AttendanceError::NotFound(_) => StatusCode::NOT_FOUND,
            AttendanceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let reason = match self {
            AttendanceError::Storage(e) => {
                tracing::error!(error = %e, "Attendance storage failure");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "code": self.code(),
            "reason": reason,
        }))
    }
}
