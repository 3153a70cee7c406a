use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::attendance::error::AttendanceError;
use crate::attendance::service::AttendanceService;
use crate::attendance::summary::{DaySummary, HistoryEntry, WeekSummary};
use crate::identity::CallerIdentity;
use crate::model::attendance::{AttendanceStatus, BreakType, EventMetadata};

#[derive(Deserialize, ToSchema)]
pub struct ClockRequest {
    #[schema(example = "HQ, floor 4")]
    /// Where the event happened, free text
    pub location: Option<String>,
    #[schema(example = "client call ran over")]
    /// Free-form note stored with the event
    pub notes: Option<String>,
    #[schema(example = "req-7f3a9c")]
    /// Client-supplied key making a retried request safe to re-send
    pub idempotency_key: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct StartBreakRequest {
    #[schema(example = "lunch")]
    pub break_type: BreakType,
    #[schema(example = "cafeteria")]
    pub location: Option<String>,
    pub notes: Option<String>,
    #[schema(example = "req-7f3a9c")]
    pub idempotency_key: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct EndBreakRequest {
    #[schema(example = "req-7f3a9c")]
    pub idempotency_key: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct TodayResponse {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "clocked_in", value_type = String)]
    pub status: AttendanceStatus,
    /// Absent until the first clock-in of the day
    pub record: Option<DaySummary>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct HistoryQuery {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    /// First date of the range, inclusive
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-11", format = "date", value_type = String)]
    /// Last date of the range, inclusive
    pub end_date: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryResponse {
    pub data: Vec<HistoryEntry>,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-11", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct WeekQuery {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    /// Any date inside the wanted week; defaults to today. Normalized to
    /// that week's Monday.
    pub start: Option<NaiveDate>,
}

fn metadata_of(location: &Option<String>, notes: &Option<String>) -> Option<EventMetadata> {
    let meta = EventMetadata {
        location: location.clone(),
        notes: notes.clone(),
    };
    (!meta.is_empty()).then_some(meta)
}

/// Clock-in endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance",
    request_body = ClockRequest,
    responses(
        (status = 200, description = "Clocked in successfully", body = Object, example = json!({
            "message": "Clocked in",
            "day": { "date": "2026-01-05", "status": "clocked_in", "total_hours": 0.0 }
        })),
        (status = 400, description = "Already clocked in today", body = Object, example = json!({
            "error": "invalid_transition",
            "message": "already clocked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee record, or role does not track attendance"),
        (status = 503, description = "Attendance store unavailable")
    ),
    tag = "Attendance"
)]
pub async fn clock_in(
    caller: CallerIdentity,
    service: web::Data<AttendanceService>,
    payload: web::Json<ClockRequest>,
) -> Result<HttpResponse, AttendanceError> {
    let day = service
        .clock_in(
            &caller,
            Utc::now(),
            metadata_of(&payload.location, &payload.notes),
            payload.idempotency_key.clone(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Clocked in",
        "day": day
    })))
}

/// Clock-out endpoint
#[utoipa::path(
    put,
    path = "/api/v1/attendance",
    request_body = ClockRequest,
    responses(
        (status = 200, description = "Clocked out successfully", body = Object, example = json!({
            "message": "Clocked out",
            "day": { "date": "2026-01-05", "status": "clocked_out", "net_hours": 7.5 }
        })),
        (status = 400, description = "Not clocked in, or a break is still open", body = Object, example = json!({
            "error": "invalid_transition",
            "message": "a break is still open, end it before clocking out"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee record, or role does not track attendance"),
        (status = 503, description = "Attendance store unavailable")
    ),
    tag = "Attendance"
)]
pub async fn clock_out(
    caller: CallerIdentity,
    service: web::Data<AttendanceService>,
    payload: web::Json<ClockRequest>,
) -> Result<HttpResponse, AttendanceError> {
    let day = service
        .clock_out(
            &caller,
            Utc::now(),
            metadata_of(&payload.location, &payload.notes),
            payload.idempotency_key.clone(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Clocked out",
        "day": day
    })))
}

/// Break-start endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/breaks",
    request_body = StartBreakRequest,
    responses(
        (status = 200, description = "Break started", body = Object, example = json!({
            "message": "Break started",
            "day": { "date": "2026-01-05", "status": "on_break" }
        })),
        (status = 400, description = "Not clocked in or already on break", body = Object, example = json!({
            "error": "invalid_transition",
            "message": "already on break"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee record, or role does not track attendance"),
        (status = 503, description = "Attendance store unavailable")
    ),
    tag = "Attendance"
)]
pub async fn start_break(
    caller: CallerIdentity,
    service: web::Data<AttendanceService>,
    payload: web::Json<StartBreakRequest>,
) -> Result<HttpResponse, AttendanceError> {
    let day = service
        .start_break(
            &caller,
            Utc::now(),
            payload.break_type,
            metadata_of(&payload.location, &payload.notes),
            payload.idempotency_key.clone(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Break started",
        "day": day
    })))
}

/// Break-end endpoint
#[utoipa::path(
    put,
    path = "/api/v1/attendance/breaks",
    request_body = EndBreakRequest,
    responses(
        (status = 200, description = "Break ended", body = Object, example = json!({
            "message": "Break ended",
            "day": { "date": "2026-01-05", "status": "clocked_in" }
        })),
        (status = 400, description = "No open break", body = Object, example = json!({
            "error": "invalid_transition",
            "message": "no open break"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee record, or role does not track attendance"),
        (status = 503, description = "Attendance store unavailable")
    ),
    tag = "Attendance"
)]
pub async fn end_break(
    caller: CallerIdentity,
    service: web::Data<AttendanceService>,
    payload: web::Json<EndBreakRequest>,
) -> Result<HttpResponse, AttendanceError> {
    let day = service
        .end_break(&caller, Utc::now(), payload.idempotency_key.clone())
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Break ended",
        "day": day
    })))
}

/// Today's status and summary
#[utoipa::path(
    get,
    path = "/api/v1/attendance/today",
    responses(
        (status = 200, description = "Today's state; `record` is null before the first clock-in", body = TodayResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee record, or role does not track attendance"),
        (status = 503, description = "Attendance store unavailable")
    ),
    tag = "Attendance"
)]
pub async fn today(
    caller: CallerIdentity,
    service: web::Data<AttendanceService>,
) -> Result<HttpResponse, AttendanceError> {
    let now = Utc::now();
    let record = service.today(&caller, now).await?;

    let status = record
        .as_ref()
        .map(|r| r.status)
        .unwrap_or(AttendanceStatus::NotClockedIn);

    Ok(HttpResponse::Ok().json(TodayResponse {
        date: now.date_naive(),
        status,
        record,
    }))
}

/// Attendance history over a date range
#[utoipa::path(
    get,
    path = "/api/v1/attendance/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "One entry per date, oldest first; `record` is null for absent dates", body = HistoryResponse),
        (status = 400, description = "Bad date range", body = Object, example = json!({
            "message": "start_date cannot be after end_date"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee record, or role does not track attendance"),
        (status = 503, description = "Attendance store unavailable")
    ),
    tag = "Attendance"
)]
pub async fn history(
    caller: CallerIdentity,
    service: web::Data<AttendanceService>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, AttendanceError> {
    if query.start_date > query.end_date {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "start_date cannot be after end_date"
        })));
    }
    if (query.end_date - query.start_date).num_days() >= 366 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Date range too large, one year max"
        })));
    }

    let data = service
        .history(&caller, query.start_date, query.end_date, Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(HistoryResponse {
        data,
        start_date: query.start_date,
        end_date: query.end_date,
    }))
}

/// Weekly rollup, Monday-start
#[utoipa::path(
    get,
    path = "/api/v1/attendance/week",
    params(WeekQuery),
    responses(
        (status = 200, description = "Seven entries, Monday first; `record` is null for absent dates", body = WeekSummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee record, or role does not track attendance"),
        (status = 503, description = "Attendance store unavailable")
    ),
    tag = "Attendance"
)]
pub async fn week(
    caller: CallerIdentity,
    service: web::Data<AttendanceService>,
    query: web::Query<WeekQuery>,
) -> Result<HttpResponse, AttendanceError> {
    let now = Utc::now();
    let start = query.start.unwrap_or_else(|| now.date_naive());

    let week = service.week(&caller, start, now).await?;
    Ok(HttpResponse::Ok().json(week))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_of_collapses_empty_fields() {
        assert_eq!(metadata_of(&None, &None), None);

        let meta = metadata_of(&Some("HQ".into()), &None).unwrap();
        assert_eq!(meta.location.as_deref(), Some("HQ"));
        assert_eq!(meta.notes, None);
    }

    #[test]
    fn week_query_start_is_optional() {
        let q: WeekQuery = serde_json::from_str("{}").unwrap();
        assert!(q.start.is_none());
    }
}
