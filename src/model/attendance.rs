use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Scan location. Recorded as-is, never validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 42,
        "user_id": 7,
        "shift_date": "2026-03-01",
        "check_in_time": "2026-03-01T21:55:03",
        "check_out_time": "2026-03-02T06:02:41",
        "check_in_latitude": -6.2001,
        "check_in_longitude": 106.8166,
        "check_out_latitude": -6.2003,
        "check_out_longitude": 106.8169
    })
)]
pub struct AttendanceRecord {
    pub id: u64,
    pub user_id: u64,

    /// Date the record is filed under. For overnight shifts this is the
    /// date the shift started, not necessarily the date of the scan.
    #[schema(value_type = String, format = "date")]
    pub shift_date: NaiveDate,

    #[schema(value_type = String, format = "date-time")]
    pub check_in_time: NaiveDateTime,

    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub check_out_time: Option<NaiveDateTime>,

    #[schema(nullable = true)]
    pub check_in_latitude: Option<f64>,
    #[schema(nullable = true)]
    pub check_in_longitude: Option<f64>,
    #[schema(nullable = true)]
    pub check_out_latitude: Option<f64>,
    #[schema(nullable = true)]
    pub check_out_longitude: Option<f64>,
}

impl AttendanceRecord {
    pub fn is_open(&self) -> bool {
        self.check_out_time.is_none()
    }
}

/// A check-in about to be written to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttendance {
    pub user_id: u64,
    pub shift_date: NaiveDate,
    pub check_in_time: NaiveDateTime,
    pub location: GeoPoint,
}
