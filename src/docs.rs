use crate::api::attendance::{
    AttendanceListResponse, AttendanceQuery, EffectiveShiftResponse, ScanPayload,
};
use crate::model::attendance::AttendanceRecord;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shift Attendance API",
        version = "0.1.0",
        description = r#"
## Shift Attendance

Records employee attendance from device scans. A single endpoint receives
every scan; the server decides whether it is a check-in or a check-out.

### Rules
- **Check-in** must happen no later than shift start + tolerance
- **Check-out** is accepted from shift end onwards
- **Overnight shifts** (end before start) are filed under the date they began
- A scan closer than the grace period to the next shift start leaves an
  unfinished overnight record open and counts as a fresh check-in
- **Schedule overrides** replace the default shift for their date only

### Errors
Rejections and invalid input return `400 {code, reason}`; unknown users and
dates without a shift return `404 {code, reason}`.
"#,
    ),
    paths(
        crate::api::attendance::submit_scan,
        crate::api::attendance::list_attendance,
        crate::api::attendance::today_attendance,
        crate::api::attendance::effective_shift,
    ),
    components(
        schemas(
            ScanPayload,
            AttendanceQuery,
            AttendanceRecord,
            AttendanceListResponse,
            EffectiveShiftResponse
        )
    ),
    tags(
        (name = "Attendance", description = "Scan submission and attendance ledger"),
        (name = "Shift", description = "Effective shift lookup"),
    )
)]
pub struct ApiDoc;
