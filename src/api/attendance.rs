use crate::error::AttendanceError;
use crate::model::attendance::{AttendanceRecord, GeoPoint};
use crate::model::shift::ShiftSource;
use crate::service::{AttendanceService, NotificationDispatcher, ScanInput, ScanOutcome};
use crate::store::AttendanceFilter;
use crate::utils::clock;
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ScanPayload {
    #[schema(example = 7)]
    pub user_id: Option<u64>,

    /// RFC 3339, or `YYYY-MM-DD HH:MM:SS` in the server's configured offset
    #[schema(example = "2026-03-02T07:58:12+07:00")]
    pub timestamp: Option<String>,

    #[schema(example = json!(-6.2001), nullable = true)]
    pub latitude: Option<f64>,

    #[schema(example = 106.8166, nullable = true)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AttendanceQuery {
    #[schema(example = 1)]
    pub page: Option<u32>,

    #[schema(example = 20)]
    pub per_page: Option<u32>,

    #[schema(example = 7)]
    pub user_id: Option<u64>,

    /// `YYYY-MM-DD`
    #[schema(example = "2026-03-01")]
    pub shift_date: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<AttendanceRecord>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ShiftQuery {
    /// `YYYY-MM-DD`, defaults to today
    pub date: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EffectiveShiftResponse {
    #[schema(example = 2)]
    pub shift_id: u64,
    #[schema(example = "2026-03-01")]
    pub date: String,
    #[schema(example = "22:00:00")]
    pub start_time: String,
    #[schema(example = "06:00:00")]
    pub end_time: String,
    #[schema(example = 15)]
    pub tolerance_minutes: i64,
    #[schema(example = true)]
    pub overnight: bool,
    /// `override` or `default`
    #[schema(example = "default")]
    pub source: String,
}

fn parse_date(raw: &str) -> Result<NaiveDate, AttendanceError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AttendanceError::InvalidInput(format!("invalid date: {}", raw)))
}

/// Submit a scan. The server decides whether it is a check-in or a check-out.
#[utoipa::path(
    post,
    path = "/api/attendance/submit",
    request_body = ScanPayload,
    responses(
        (status = 201, description = "Checked in", body = Object, example = json!({
            "type": "checkin",
            "record_id": 42,
            "shift_date": "2026-03-01"
        })),
        (status = 200, description = "Checked out", body = Object, example = json!({
            "type": "checkout",
            "record_id": 42,
            "shift_date": "2026-03-01"
        })),
        (status = 400, description = "Invalid input or rejected scan", body = Object, example = json!({
            "code": "late_beyond_tolerance",
            "reason": "late beyond tolerance"
        })),
        (status = 404, description = "Unknown user or no shift configured", body = Object, example = json!({
            "code": "not_found",
            "reason": "no shift configured"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn submit_scan(
    service: web::Data<AttendanceService>,
    notifications: web::Data<NotificationDispatcher>,
    payload: web::Json<ScanPayload>,
) -> Result<HttpResponse, AttendanceError> {
    let payload = payload.into_inner();

    let decision = service
        .handle_scan(ScanInput {
            user_id: payload.user_id,
            timestamp: payload.timestamp,
            location: GeoPoint {
                latitude: payload.latitude,
                longitude: payload.longitude,
            },
        })
        .await?;

    notifications.dispatch(decision.event);

    let response = match decision.outcome {
        ScanOutcome::Checkin { .. } => HttpResponse::Created().json(&decision.outcome),
        ScanOutcome::Checkout { .. } => HttpResponse::Ok().json(&decision.outcome),
    };

    Ok(response)
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Paginated attendance list", body = AttendanceListResponse),
        (status = 400, description = "Invalid filter"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    service: web::Data<AttendanceService>,
    query: web::Query<AttendanceQuery>,
) -> Result<HttpResponse, AttendanceError> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let filter = AttendanceFilter {
        user_id: query.user_id,
        shift_date: query.shift_date.as_deref().map(parse_date).transpose()?,
    };

    let (data, total) = service.list_records(&filter, page, per_page).await?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/attendance/{user_id}/today",
    params(
        ("user_id", Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Record filed under today", body = AttendanceRecord),
        (status = 404, description = "No attendance today", body = Object, example = json!({
            "code": "not_found",
            "reason": "attendance not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn today_attendance(
    service: web::Data<AttendanceService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AttendanceError> {
    let record = service.today_record(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/shift",
    params(
        ("user_id", Path, description = "User ID"),
        ShiftQuery
    ),
    responses(
        (status = 200, description = "Shift in effect on the date", body = EffectiveShiftResponse),
        (status = 404, description = "Unknown user or no shift configured"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Shift"
)]
pub async fn effective_shift(
    service: web::Data<AttendanceService>,
    path: web::Path<u64>,
    query: web::Query<ShiftQuery>,
) -> Result<HttpResponse, AttendanceError> {
    let user_id = path.into_inner();
    let date = match query.date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => clock::today(service.offset()),
    };

    let shift = service
        .resolver()
        .resolve_effective_shift(user_id, date)
        .await?;

    Ok(HttpResponse::Ok().json(EffectiveShiftResponse {
        shift_id: shift.shift_id,
        date: date.to_string(),
        start_time: shift.start_time.format("%H:%M:%S").to_string(),
        end_time: shift.end_time.format("%H:%M:%S").to_string(),
        tolerance_minutes: shift.tolerance.num_minutes(),
        overnight: shift.is_overnight(),
        source: match shift.source {
            ShiftSource::Override => "override".to_string(),
            ShiftSource::Default => "default".to_string(),
        },
    }))
}
