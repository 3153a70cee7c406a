use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use utoipa::ToSchema;

/// Free-text context captured with an event (where the person was, what
/// they noted). Stored verbatim, never interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EventMetadata {
    #[schema(example = "HQ, floor 4")]
    pub location: Option<String>,
    #[schema(example = "client call ran over")]
    pub notes: Option<String>,
}

impl EventMetadata {
    pub fn is_empty(&self) -> bool {
        self.location.is_none() && self.notes.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BreakType {
    Lunch,
    Personal,
    Other,
}

/// One pause inside a clocked-in period. `end = None` means the break is
/// still open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BreakInterval {
    #[schema(example = "lunch")]
    pub break_type: BreakType,
    #[schema(example = "2026-01-05T12:00:00Z", format = "date-time", value_type = String)]
    pub start: DateTime<Utc>,
    #[schema(example = "2026-01-05T12:30:00Z", format = "date-time", value_type = String)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<EventMetadata>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    NotClockedIn,
    ClockedIn,
    OnBreak,
    ClockedOut,
}

/// One record per (employee, calendar date). Created implicitly by the
/// first clock-in of the day; frozen once `clock_out` is set.
///
/// Status is always derived from the timestamps below, never stored, so it
/// cannot disagree with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceDay {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub clock_in: Option<DateTime<Utc>>,
    pub clock_out: Option<DateTime<Utc>>,
    /// Non-overlapping, ordered by start; at most one open interval.
    pub breaks: Vec<BreakInterval>,
    pub clock_in_meta: Option<EventMetadata>,
    pub clock_out_meta: Option<EventMetadata>,
}

impl AttendanceDay {
    pub fn new(employee_id: u64, date: NaiveDate) -> Self {
        Self {
            employee_id,
            date,
            clock_in: None,
            clock_out: None,
            breaks: Vec::new(),
            clock_in_meta: None,
            clock_out_meta: None,
        }
    }

    /// The one break without an end timestamp, if any.
    pub fn open_break(&self) -> Option<&BreakInterval> {
        self.breaks.iter().find(|b| b.end.is_none())
    }

    /// Timestamp of the most recent recorded event on this day.
    pub fn last_event_at(&self) -> Option<DateTime<Utc>> {
        let mut last = self.clock_in;
        for b in &self.breaks {
            last = last.max(Some(b.start));
            if b.end.is_some() {
                last = last.max(b.end);
            }
        }
        last.max(self.clock_out)
    }

    pub fn status(&self) -> AttendanceStatus {
        if self.clock_out.is_some() {
            AttendanceStatus::ClockedOut
        } else if self.open_break().is_some() {
            AttendanceStatus::OnBreak
        } else if self.clock_in.is_some() {
            AttendanceStatus::ClockedIn
        } else {
            AttendanceStatus::NotClockedIn
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, h, m, 0).unwrap()
    }

    fn day() -> AttendanceDay {
        AttendanceDay::new(7, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap())
    }

    #[test]
    fn status_follows_timestamps() {
        let mut d = day();
        assert_eq!(d.status(), AttendanceStatus::NotClockedIn);

        d.clock_in = Some(ts(9, 0));
        assert_eq!(d.status(), AttendanceStatus::ClockedIn);

        d.breaks.push(BreakInterval {
            break_type: BreakType::Lunch,
            start: ts(12, 0),
            end: None,
            meta: None,
        });
        assert_eq!(d.status(), AttendanceStatus::OnBreak);

        d.breaks[0].end = Some(ts(12, 30));
        assert_eq!(d.status(), AttendanceStatus::ClockedIn);

        d.clock_out = Some(ts(17, 0));
        assert_eq!(d.status(), AttendanceStatus::ClockedOut);
    }

    #[test]
    fn last_event_tracks_break_boundaries() {
        let mut d = day();
        assert_eq!(d.last_event_at(), None);

        d.clock_in = Some(ts(9, 0));
        assert_eq!(d.last_event_at(), Some(ts(9, 0)));

        d.breaks.push(BreakInterval {
            break_type: BreakType::Personal,
            start: ts(11, 0),
            end: None,
            meta: None,
        });
        assert_eq!(d.last_event_at(), Some(ts(11, 0)));

        d.breaks[0].end = Some(ts(11, 15));
        assert_eq!(d.last_event_at(), Some(ts(11, 15)));

        d.clock_out = Some(ts(17, 0));
        assert_eq!(d.last_event_at(), Some(ts(17, 0)));
    }
}
