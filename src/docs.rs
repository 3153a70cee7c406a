use crate::api::attendance::{
    ClockRequest, EndBreakRequest, HistoryQuery, HistoryResponse, StartBreakRequest,
    TodayResponse, WeekQuery,
};
use crate::attendance::summary::{DaySummary, HistoryEntry, WeekDayEntry, WeekDayRecord, WeekSummary};
use crate::model::attendance::{AttendanceStatus, BreakInterval, BreakType, EventMetadata};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Service API",
        version = "1.0.0",
        description = r#"
## Attendance Time-Tracking Service

This API powers the **attendance subsystem** of the HR platform: clocking in
and out, tracking breaks, and serving daily and weekly summaries.

### 🔹 Key Features
- **Clock In / Clock Out**
  - One record per employee per calendar date, closed days are frozen
- **Break Tracking**
  - Lunch/personal/other breaks, one open break at a time
- **Summaries**
  - Today's status, date-range history, Monday-start weekly rollups
  - Worked, break, and net hours derived from the recorded timestamps

### 🔐 Security
Callers are authenticated upstream. The gateway forwards the resolved
identity in the `X-User-Id` and `X-User-Role` headers; requests without
them are rejected with `401`.

### 📦 Response Format
- JSON-based RESTful responses
- Errors use `{"error": <kind>, "message": <detail>}`
- Timestamps are ISO-8601 with timezone (UTC)

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::clock_in,
        crate::api::attendance::clock_out,
        crate::api::attendance::start_break,
        crate::api::attendance::end_break,
        crate::api::attendance::today,
        crate::api::attendance::history,
        crate::api::attendance::week,
    ),
    components(
        schemas(
            ClockRequest,
            StartBreakRequest,
            EndBreakRequest,
            TodayResponse,
            HistoryQuery,
            HistoryResponse,
            WeekQuery,
            DaySummary,
            HistoryEntry,
            WeekSummary,
            WeekDayEntry,
            WeekDayRecord,
            AttendanceStatus,
            BreakInterval,
            BreakType,
            EventMetadata
        )
    ),
    tags(
        (name = "Attendance", description = "Attendance time-tracking APIs"),
    )
)]
pub struct ApiDoc;
