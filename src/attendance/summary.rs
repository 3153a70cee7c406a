use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceDay, AttendanceStatus, BreakInterval};

/// Durations are accumulated in whole seconds; converting to fractional
/// hours (2 dp) happens only here, at the presentation boundary.
fn hours(seconds: i64) -> f64 {
    (seconds as f64 / 3600.0 * 100.0).round() / 100.0
}

/// Clocked time for the day: `clock_out - clock_in` once closed, elapsed
/// time up to `now` while in progress, zero before the first clock-in.
pub fn worked_seconds(day: &AttendanceDay, now: DateTime<Utc>) -> i64 {
    match (day.clock_in, day.clock_out) {
        (Some(start), Some(end)) => (end - start).num_seconds(),
        (Some(start), None) => (now - start).num_seconds().max(0),
        _ => 0,
    }
}

pub fn break_seconds(day: &AttendanceDay, now: DateTime<Utc>) -> i64 {
    day.breaks
        .iter()
        .map(|b| (b.end.unwrap_or(now) - b.start).num_seconds().max(0))
        .sum()
}

/// Worked time minus break time. Never negative: a negative raw value means
/// the stored intervals overlap or are corrupt, so it clamps to zero and
/// reports the anomaly.
pub fn net_seconds(day: &AttendanceDay, now: DateTime<Utc>) -> (i64, bool) {
    let raw = worked_seconds(day, now) - break_seconds(day, now);
    if raw < 0 { (0, true) } else { (raw, false) }
}

/// Per-day numbers handed to the presentation layer.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DaySummary {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "clocked_in", value_type = String)]
    pub status: AttendanceStatus,
    #[schema(example = "2026-01-05T09:00:00Z", format = "date-time", value_type = String)]
    pub clock_in: Option<DateTime<Utc>>,
    #[schema(example = "2026-01-05T17:00:00Z", format = "date-time", value_type = String)]
    pub clock_out: Option<DateTime<Utc>>,
    pub breaks: Vec<BreakInterval>,
    #[schema(example = 8.0)]
    pub total_hours: f64,
    #[schema(example = 0.5)]
    pub break_hours: f64,
    #[schema(example = 7.5)]
    pub net_hours: f64,
    /// Set when net time had to be clamped to zero
    pub anomaly: bool,
}

impl DaySummary {
    pub fn of(day: &AttendanceDay, now: DateTime<Utc>) -> Self {
        let (net, anomaly) = net_seconds(day, now);
        if anomaly {
            tracing::warn!(
                employee_id = day.employee_id,
                date = %day.date,
                "negative net time clamped to zero, break intervals look corrupt"
            );
        }
        Self {
            employee_id: day.employee_id,
            date: day.date,
            status: day.status(),
            clock_in: day.clock_in,
            clock_out: day.clock_out,
            breaks: day.breaks.clone(),
            total_hours: hours(worked_seconds(day, now)),
            break_hours: hours(break_seconds(day, now)),
            net_hours: hours(net),
            anomaly,
        }
    }
}

/// One calendar date in a queried range. `record = None` marks a date
/// nothing was recorded for; it is not a synthetic zero-hours day.
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryEntry {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub record: Option<DaySummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WeekDayRecord {
    #[schema(example = "2026-01-05T09:00:00Z", format = "date-time", value_type = String)]
    pub clock_in: Option<DateTime<Utc>>,
    #[schema(example = "2026-01-05T17:00:00Z", format = "date-time", value_type = String)]
    pub clock_out: Option<DateTime<Utc>>,
    #[schema(example = 8.0)]
    pub total_hours: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WeekDayEntry {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    /// `None` when nothing was recorded that day
    pub record: Option<WeekDayRecord>,
}

/// Monday-start rollup of one week, always seven entries.
#[derive(Debug, Serialize, ToSchema)]
pub struct WeekSummary {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub week_start: NaiveDate,
    pub days: Vec<WeekDayEntry>,
    #[schema(example = 40.0)]
    pub total_hours: f64,
}

/// Monday of the week containing `date`.
pub fn week_monday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

pub fn weekly_summary(days: &[AttendanceDay], week_start: NaiveDate, now: DateTime<Utc>) -> WeekSummary {
    let monday = week_monday(week_start);
    let mut total = 0i64;

    let entries = (0..7)
        .map(|offset| {
            let date = monday + Duration::days(offset);
            let record = days.iter().find(|d| d.date == date).map(|d| {
                let worked = worked_seconds(d, now);
                total += worked;
                WeekDayRecord {
                    clock_in: d.clock_in,
                    clock_out: d.clock_out,
                    total_hours: hours(worked),
                }
            });
            WeekDayEntry { date, record }
        })
        .collect();

    WeekSummary {
        week_start: monday,
        days: entries,
        total_hours: hours(total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::BreakType;
    use chrono::TimeZone;

    fn ts(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, d, h, m, 0).unwrap()
    }

    fn lunch(day: u32, from: (u32, u32), to: Option<(u32, u32)>) -> BreakInterval {
        BreakInterval {
            break_type: BreakType::Lunch,
            start: ts(day, from.0, from.1),
            end: to.map(|(h, m)| ts(day, h, m)),
            meta: None,
        }
    }

    fn closed_day(d: u32, in_h: u32, out_h: u32) -> AttendanceDay {
        let mut day = AttendanceDay::new(7, NaiveDate::from_ymd_opt(2026, 1, d).unwrap());
        day.clock_in = Some(ts(d, in_h, 0));
        day.clock_out = Some(ts(d, out_h, 0));
        day
    }

    #[test]
    fn full_day_round_trip() {
        // 09:00 in, 12:00-12:30 lunch, 17:00 out
        let mut day = closed_day(5, 9, 17);
        day.breaks.push(lunch(5, (12, 0), Some((12, 30))));

        let now = ts(5, 18, 0);
        let s = DaySummary::of(&day, now);
        assert_eq!(s.total_hours, 8.0);
        assert_eq!(s.break_hours, 0.5);
        assert_eq!(s.net_hours, 7.5);
        assert!(!s.anomaly);
        assert_eq!(s.status, AttendanceStatus::ClockedOut);
    }

    #[test]
    fn in_progress_day_counts_up_to_now() {
        let mut day = AttendanceDay::new(7, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        day.clock_in = Some(ts(5, 9, 0));

        assert_eq!(worked_seconds(&day, ts(5, 11, 0)), 2 * 3600);

        // open break also counts up to now
        day.breaks.push(lunch(5, (10, 0), None));
        assert_eq!(break_seconds(&day, ts(5, 11, 0)), 3600);
    }

    #[test]
    fn empty_day_is_zero() {
        let day = AttendanceDay::new(7, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        assert_eq!(worked_seconds(&day, ts(5, 11, 0)), 0);
        assert_eq!(break_seconds(&day, ts(5, 11, 0)), 0);
    }

    #[test]
    fn negative_net_clamps_and_flags() {
        // corrupt record: 1h shift with two "lunches" covering 2h
        let mut day = closed_day(5, 9, 10);
        day.breaks.push(lunch(5, (9, 0), Some((10, 0))));
        day.breaks.push(lunch(5, (9, 0), Some((10, 0))));

        let (net, anomaly) = net_seconds(&day, ts(5, 18, 0));
        assert_eq!(net, 0);
        assert!(anomaly);

        let s = DaySummary::of(&day, ts(5, 18, 0));
        assert_eq!(s.net_hours, 0.0);
        assert!(s.anomaly);
    }

    #[test]
    fn breaks_never_exceed_total_on_a_sane_closed_day() {
        let mut day = closed_day(5, 9, 17);
        day.breaks.push(lunch(5, (12, 0), Some((12, 45))));
        let now = ts(5, 18, 0);
        assert!(break_seconds(&day, now) <= worked_seconds(&day, now));
    }

    #[test]
    fn week_monday_normalizes_any_weekday() {
        // 2026-01-05 is a Monday
        let monday = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert_eq!(week_monday(monday), monday);
        assert_eq!(week_monday(NaiveDate::from_ymd_opt(2026, 1, 8).unwrap()), monday);
        assert_eq!(week_monday(NaiveDate::from_ymd_opt(2026, 1, 11).unwrap()), monday);
    }

    #[test]
    fn weekly_summary_has_seven_entries_with_explicit_gaps() {
        let days = vec![closed_day(5, 9, 17), closed_day(7, 10, 18), closed_day(9, 9, 13)];
        let week = weekly_summary(&days, NaiveDate::from_ymd_opt(2026, 1, 7).unwrap(), ts(11, 0, 0));

        assert_eq!(week.week_start, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        assert_eq!(week.days.len(), 7);

        let populated: Vec<_> = week.days.iter().filter(|e| e.record.is_some()).collect();
        assert_eq!(populated.len(), 3);
        assert_eq!(week.days[0].record.as_ref().unwrap().total_hours, 8.0);
        assert!(week.days[1].record.is_none());
        assert_eq!(week.total_hours, 8.0 + 8.0 + 4.0);
    }
}
