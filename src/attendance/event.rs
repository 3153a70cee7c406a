use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;

use crate::model::attendance::{AttendanceDay, BreakInterval, BreakType, EventMetadata};

/// A single state-changing action against one employee's day.
#[derive(Debug, Clone)]
pub enum AttendanceEvent {
    ClockIn {
        meta: Option<EventMetadata>,
    },
    ClockOut {
        meta: Option<EventMetadata>,
    },
    BreakStart {
        break_type: BreakType,
        meta: Option<EventMetadata>,
    },
    BreakEnd,
}

impl AttendanceEvent {
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceEvent::ClockIn { .. } => "clock_in",
            AttendanceEvent::ClockOut { .. } => "clock_out",
            AttendanceEvent::BreakStart { .. } => "break_start",
            AttendanceEvent::BreakEnd => "break_end",
        }
    }
}

/// Why a transition was refused.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    #[display(fmt = "already clocked in today")]
    AlreadyClockedIn,
    #[display(fmt = "not clocked in")]
    NotClockedIn,
    #[display(fmt = "already on break")]
    AlreadyOnBreak,
    #[display(fmt = "no open break")]
    NoOpenBreak,
    #[display(fmt = "a break is still open, end it before clocking out")]
    BreakStillOpen,
    #[display(fmt = "day is already closed")]
    DayClosed,
    #[display(fmt = "event timestamp is earlier than the last recorded event")]
    OutOfOrder,
}

/// Validates `event` against the current day and returns the updated day.
/// Pure: persistence is the caller's responsibility. `existing = None`
/// means nothing has been recorded for the date yet.
pub fn apply(
    existing: Option<&AttendanceDay>,
    employee_id: u64,
    date: NaiveDate,
    event: &AttendanceEvent,
    at: DateTime<Utc>,
) -> Result<AttendanceDay, TransitionError> {
    if let Some(d) = existing {
        // A closed day is frozen, whatever the event.
        if d.clock_out.is_some() {
            return Err(TransitionError::DayClosed);
        }
        if d.last_event_at().is_some_and(|t| at < t) {
            return Err(TransitionError::OutOfOrder);
        }
    }

    match event {
        AttendanceEvent::ClockIn { meta } => {
            if existing.is_some_and(|d| d.clock_in.is_some()) {
                return Err(TransitionError::AlreadyClockedIn);
            }
            let mut next = existing
                .cloned()
                .unwrap_or_else(|| AttendanceDay::new(employee_id, date));
            next.clock_in = Some(at);
            next.clock_in_meta = meta.clone();
            Ok(next)
        }

        AttendanceEvent::ClockOut { meta } => {
            let Some(d) = existing.filter(|d| d.clock_in.is_some()) else {
                return Err(TransitionError::NotClockedIn);
            };
            if d.open_break().is_some() {
                return Err(TransitionError::BreakStillOpen);
            }
            // clock_out must be strictly after clock_in
            if d.clock_in.is_some_and(|ci| at <= ci) {
                return Err(TransitionError::OutOfOrder);
            }
            let mut next = d.clone();
            next.clock_out = Some(at);
            next.clock_out_meta = meta.clone();
            Ok(next)
        }

        AttendanceEvent::BreakStart { break_type, meta } => {
            let Some(d) = existing.filter(|d| d.clock_in.is_some()) else {
                return Err(TransitionError::NotClockedIn);
            };
            if d.open_break().is_some() {
                return Err(TransitionError::AlreadyOnBreak);
            }
            let mut next = d.clone();
            next.breaks.push(BreakInterval {
                break_type: *break_type,
                start: at,
                end: None,
                meta: meta.clone(),
            });
            Ok(next)
        }

        AttendanceEvent::BreakEnd => {
            let Some(d) = existing else {
                return Err(TransitionError::NoOpenBreak);
            };
            let mut next = d.clone();
            let Some(open) = next.breaks.iter_mut().find(|b| b.end.is_none()) else {
                return Err(TransitionError::NoOpenBreak);
            };
            open.end = Some(at);
            Ok(next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceStatus;
    use chrono::TimeZone;

    const EMP: u64 = 42;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
    }

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, h, m, 0).unwrap()
    }

    fn clock_in_at(h: u32, m: u32) -> AttendanceDay {
        apply(
            None,
            EMP,
            date(),
            &AttendanceEvent::ClockIn { meta: None },
            ts(h, m),
        )
        .unwrap()
    }

    #[test]
    fn clock_in_creates_the_day() {
        let day = clock_in_at(9, 0);
        assert_eq!(day.employee_id, EMP);
        assert_eq!(day.date, date());
        assert_eq!(day.clock_in, Some(ts(9, 0)));
        assert_eq!(day.status(), AttendanceStatus::ClockedIn);
    }

    #[test]
    fn double_clock_in_is_rejected() {
        let day = clock_in_at(9, 0);
        let err = apply(
            Some(&day),
            EMP,
            date(),
            &AttendanceEvent::ClockIn { meta: None },
            ts(9, 5),
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::AlreadyClockedIn);
    }

    #[test]
    fn clock_out_requires_clock_in() {
        let err = apply(
            None,
            EMP,
            date(),
            &AttendanceEvent::ClockOut { meta: None },
            ts(17, 0),
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::NotClockedIn);
    }

    #[test]
    fn break_start_requires_clock_in() {
        let err = apply(
            None,
            EMP,
            date(),
            &AttendanceEvent::BreakStart {
                break_type: BreakType::Lunch,
                meta: None,
            },
            ts(12, 0),
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::NotClockedIn);
    }

    #[test]
    fn second_break_start_is_rejected_while_on_break() {
        let day = clock_in_at(9, 0);
        let day = apply(
            Some(&day),
            EMP,
            date(),
            &AttendanceEvent::BreakStart {
                break_type: BreakType::Lunch,
                meta: None,
            },
            ts(12, 0),
        )
        .unwrap();

        let err = apply(
            Some(&day),
            EMP,
            date(),
            &AttendanceEvent::BreakStart {
                break_type: BreakType::Personal,
                meta: None,
            },
            ts(12, 10),
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::AlreadyOnBreak);
    }

    #[test]
    fn end_break_twice_fails_second_time() {
        let day = clock_in_at(9, 0);
        let day = apply(
            Some(&day),
            EMP,
            date(),
            &AttendanceEvent::BreakStart {
                break_type: BreakType::Lunch,
                meta: None,
            },
            ts(12, 0),
        )
        .unwrap();
        let day = apply(Some(&day), EMP, date(), &AttendanceEvent::BreakEnd, ts(12, 30)).unwrap();

        let err = apply(Some(&day), EMP, date(), &AttendanceEvent::BreakEnd, ts(12, 31)).unwrap_err();
        assert_eq!(err, TransitionError::NoOpenBreak);
        // the earlier close is untouched
        assert_eq!(day.breaks[0].end, Some(ts(12, 30)));
    }

    #[test]
    fn clock_out_on_break_must_end_break_first() {
        let day = clock_in_at(9, 0);
        let day = apply(
            Some(&day),
            EMP,
            date(),
            &AttendanceEvent::BreakStart {
                break_type: BreakType::Lunch,
                meta: None,
            },
            ts(12, 0),
        )
        .unwrap();

        let err = apply(
            Some(&day),
            EMP,
            date(),
            &AttendanceEvent::ClockOut { meta: None },
            ts(12, 15),
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::BreakStillOpen);

        let day = apply(Some(&day), EMP, date(), &AttendanceEvent::BreakEnd, ts(12, 30)).unwrap();
        let day = apply(
            Some(&day),
            EMP,
            date(),
            &AttendanceEvent::ClockOut { meta: None },
            ts(17, 0),
        )
        .unwrap();
        assert_eq!(day.status(), AttendanceStatus::ClockedOut);
    }

    #[test]
    fn closed_day_is_frozen() {
        let day = clock_in_at(9, 0);
        let day = apply(
            Some(&day),
            EMP,
            date(),
            &AttendanceEvent::ClockOut { meta: None },
            ts(17, 0),
        )
        .unwrap();

        for (event, at) in [
            (AttendanceEvent::ClockIn { meta: None }, ts(17, 30)),
            (AttendanceEvent::ClockOut { meta: None }, ts(17, 30)),
            (
                AttendanceEvent::BreakStart {
                    break_type: BreakType::Other,
                    meta: None,
                },
                ts(17, 30),
            ),
            (AttendanceEvent::BreakEnd, ts(17, 30)),
        ] {
            let err = apply(Some(&day), EMP, date(), &event, at).unwrap_err();
            assert_eq!(err, TransitionError::DayClosed);
        }
    }

    #[test]
    fn events_must_not_go_back_in_time() {
        let day = clock_in_at(9, 0);
        let err = apply(
            Some(&day),
            EMP,
            date(),
            &AttendanceEvent::BreakStart {
                break_type: BreakType::Lunch,
                meta: None,
            },
            ts(8, 0),
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::OutOfOrder);

        // clock-out exactly at clock-in time is not "strictly after"
        let err = apply(
            Some(&day),
            EMP,
            date(),
            &AttendanceEvent::ClockOut { meta: None },
            ts(9, 0),
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::OutOfOrder);
    }

    #[test]
    fn metadata_is_stored_verbatim() {
        let meta = EventMetadata {
            location: Some("HQ, floor 4".into()),
            notes: Some("forgot badge".into()),
        };
        let day = apply(
            None,
            EMP,
            date(),
            &AttendanceEvent::ClockIn {
                meta: Some(meta.clone()),
            },
            ts(9, 0),
        )
        .unwrap();
        assert_eq!(day.clock_in_meta, Some(meta));
    }
}
