use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{error, info, warn};

use crate::attendance::error::AttendanceError;
use crate::attendance::event::{self, AttendanceEvent};
use crate::attendance::summary::{self, DaySummary, HistoryEntry, WeekSummary};
use crate::directory::EmployeeDirectory;
use crate::identity::CallerIdentity;
use crate::model::attendance::{AttendanceDay, BreakType, EventMetadata};
use crate::store::{AttendanceStore, StoreError, StoredDay};
use crate::utils::today_cache;

/// How many times a lost compare-and-swap is re-read and re-validated
/// before giving up.
const CAS_ATTEMPTS: u32 = 3;

/// The façade the HTTP layer talks to. Resolves the caller to an employee,
/// runs events through the transition rules, and persists through the
/// record store before returning.
pub struct AttendanceService {
    store: Arc<dyn AttendanceStore>,
    directory: Arc<dyn EmployeeDirectory>,
    /// Extra read attempts after a transient store failure.
    store_retries: u32,
}

impl AttendanceService {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        directory: Arc<dyn EmployeeDirectory>,
        store_retries: u32,
    ) -> Self {
        Self {
            store,
            directory,
            store_retries,
        }
    }

    pub async fn clock_in(
        &self,
        caller: &CallerIdentity,
        now: DateTime<Utc>,
        meta: Option<EventMetadata>,
        idempotency_key: Option<String>,
    ) -> Result<DaySummary, AttendanceError> {
        let employee_id = self.resolve_employee(caller).await?;
        let day = self
            .apply_event(employee_id, AttendanceEvent::ClockIn { meta }, now, idempotency_key)
            .await?;
        info!(employee_id, date = %day.date, "clocked in");
        Ok(DaySummary::of(&day, now))
    }

    pub async fn clock_out(
        &self,
        caller: &CallerIdentity,
        now: DateTime<Utc>,
        meta: Option<EventMetadata>,
        idempotency_key: Option<String>,
    ) -> Result<DaySummary, AttendanceError> {
        let employee_id = self.resolve_employee(caller).await?;
        let day = self
            .apply_event(employee_id, AttendanceEvent::ClockOut { meta }, now, idempotency_key)
            .await?;
        info!(employee_id, date = %day.date, "clocked out");
        Ok(DaySummary::of(&day, now))
    }

    pub async fn start_break(
        &self,
        caller: &CallerIdentity,
        now: DateTime<Utc>,
        break_type: BreakType,
        meta: Option<EventMetadata>,
        idempotency_key: Option<String>,
    ) -> Result<DaySummary, AttendanceError> {
        let employee_id = self.resolve_employee(caller).await?;
        let day = self
            .apply_event(
                employee_id,
                AttendanceEvent::BreakStart { break_type, meta },
                now,
                idempotency_key,
            )
            .await?;
        info!(employee_id, date = %day.date, %break_type, "break started");
        Ok(DaySummary::of(&day, now))
    }

    pub async fn end_break(
        &self,
        caller: &CallerIdentity,
        now: DateTime<Utc>,
        idempotency_key: Option<String>,
    ) -> Result<DaySummary, AttendanceError> {
        let employee_id = self.resolve_employee(caller).await?;
        let day = self
            .apply_event(employee_id, AttendanceEvent::BreakEnd, now, idempotency_key)
            .await?;
        info!(employee_id, date = %day.date, "break ended");
        Ok(DaySummary::of(&day, now))
    }

    /// Today's record, if anything has happened yet. `None` is the normal
    /// "no record yet" answer before the first clock-in, not an error. An
    /// open session that started before midnight is still "today" until it
    /// is clocked out.
    pub async fn today(
        &self,
        caller: &CallerIdentity,
        now: DateTime<Utc>,
    ) -> Result<Option<DaySummary>, AttendanceError> {
        let employee_id = self.resolve_employee(caller).await?;
        let day = self.current_day(employee_id, now).await?;
        Ok(day.map(|d| DaySummary::of(&d, now)))
    }

    /// Cache-aware read of the day in play: the row for the current UTC
    /// date, or the still-open row that started the previous date and
    /// crossed midnight. Only the cache consult differs from
    /// `resolve_day`; a cached closed row under the previous date never
    /// counts.
    async fn current_day(
        &self,
        employee_id: u64,
        now: DateTime<Utc>,
    ) -> Result<Option<AttendanceDay>, AttendanceError> {
        let date = now.date_naive();

        if let Some(day) = today_cache::get(employee_id, date).await {
            return Ok(Some(day));
        }
        if let Some(prev) = date.pred_opt() {
            if let Some(day) = today_cache::get(employee_id, prev).await {
                if day.clock_out.is_none() {
                    return Ok(Some(day));
                }
            }
        }

        let (_, stored) = self.resolve_day(employee_id, now).await?;
        match stored {
            Some(s) => {
                today_cache::insert(&s.day).await;
                Ok(Some(s.day))
            }
            None => Ok(None),
        }
    }

    /// One entry per calendar date in `[start, end]`, oldest first. Dates
    /// without a record come back explicitly absent, never zero-filled.
    pub async fn history(
        &self,
        caller: &CallerIdentity,
        start: NaiveDate,
        end: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<HistoryEntry>, AttendanceError> {
        let employee_id = self.resolve_employee(caller).await?;

        let stored = self
            .with_retry("read range", async || {
                self.store.range(employee_id, start, end).await
            })
            .await
            .map_err(read_failed)?;

        let mut entries = Vec::new();
        for date in start.iter_days() {
            if date > end {
                break;
            }
            let record = stored
                .iter()
                .find(|s| s.day.date == date)
                .map(|s| DaySummary::of(&s.day, now));
            entries.push(HistoryEntry { date, record });
        }
        Ok(entries)
    }

    /// Monday-start rollup for the week containing `start`.
    pub async fn week(
        &self,
        caller: &CallerIdentity,
        start: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<WeekSummary, AttendanceError> {
        let employee_id = self.resolve_employee(caller).await?;

        let monday = summary::week_monday(start);
        let sunday = monday + chrono::Duration::days(6);
        let stored = self
            .with_retry("read week", async || {
                self.store.range(employee_id, monday, sunday).await
            })
            .await
            .map_err(read_failed)?;

        let days: Vec<_> = stored.into_iter().map(|s| s.day).collect();
        Ok(summary::weekly_summary(&days, monday, now))
    }

    /// Role gate plus directory lookup. Both failure shapes are expected
    /// for whole user classes and keep distinct, actionable errors.
    async fn resolve_employee(&self, caller: &CallerIdentity) -> Result<u64, AttendanceError> {
        if !caller.role.tracks_attendance() {
            return Err(AttendanceError::RoleNotPermitted(caller.role));
        }
        let link = self
            .with_retry("resolve employee", async || {
                self.directory.employee_id_for(caller.user_id).await
            })
            .await
            .map_err(read_failed)?;

        link.ok_or(AttendanceError::EmployeeRecordMissing)
    }

    /// Read-validate-write cycle for one event. Preconditions are checked
    /// before anything reaches the store, so a rejected event never leaves
    /// a partial write behind. A lost conditional write re-reads and
    /// re-validates; transition errors found on re-validation are reported
    /// as-is (that is how the loser of a concurrent clock-in learns it
    /// already happened).
    async fn apply_event(
        &self,
        employee_id: u64,
        event: AttendanceEvent,
        at: DateTime<Utc>,
        idempotency_key: Option<String>,
    ) -> Result<AttendanceDay, AttendanceError> {
        for _ in 0..CAS_ATTEMPTS {
            let (date, existing) = self.resolve_day(employee_id, at).await?;

            // A retried, already-applied mutation short-circuits to success
            // instead of tripping over its own transition rules.
            if let (Some(stored), Some(key)) = (&existing, idempotency_key.as_deref()) {
                if stored.last_event_key.as_deref() == Some(key) {
                    return Ok(stored.day.clone());
                }
            }

            let next = event::apply(existing.as_ref().map(|s| &s.day), employee_id, date, &event, at)?;

            // Writes are not auto-retried: after a transient failure the
            // outcome is unknown, and the idempotency key already makes the
            // client's retry safe.
            let write = match &existing {
                None => {
                    self.store
                        .insert_new(&StoredDay::new(next.clone(), idempotency_key.clone()))
                        .await
                }
                Some(stored) => {
                    self.store
                        .update(&StoredDay {
                            day: next.clone(),
                            version: stored.version,
                            last_event_key: idempotency_key.clone(),
                        })
                        .await
                }
            };

            match write {
                Ok(()) => {
                    today_cache::invalidate(employee_id, date).await;
                    return Ok(next);
                }
                Err(StoreError::Conflict) => continue,
                Err(StoreError::Unavailable(e)) => {
                    error!(
                        error = %e,
                        employee_id,
                        %date,
                        event = event.label(),
                        "persisting attendance day failed"
                    );
                    return Err(AttendanceError::StoreUnavailable);
                }
            }
        }

        warn!(employee_id, event = event.label(), "gave up after repeated write conflicts");
        Err(AttendanceError::StoreUnavailable)
    }

    /// The day an event belongs to, with its store key. A session keeps
    /// the UTC date of its first clock-in, so the key is never derived
    /// from the event's own timestamp alone: when the event's date has no
    /// row and the previous date's row is still open, that open day is the
    /// one in play. Anything else would let a clock-out land after
    /// midnight on a fresh key and strand the open day.
    async fn resolve_day(
        &self,
        employee_id: u64,
        at: DateTime<Utc>,
    ) -> Result<(NaiveDate, Option<StoredDay>), AttendanceError> {
        let date = at.date_naive();

        let existing = self
            .with_retry("read day", async || self.store.get(employee_id, date).await)
            .await
            .map_err(read_failed)?;
        if existing.is_some() {
            return Ok((date, existing));
        }

        let Some(prev) = date.pred_opt() else {
            return Ok((date, None));
        };
        let yesterday = self
            .with_retry("read previous day", async || {
                self.store.get(employee_id, prev).await
            })
            .await
            .map_err(read_failed)?;

        match yesterday {
            Some(open) if open.day.clock_out.is_none() => Ok((prev, Some(open))),
            _ => Ok((date, None)),
        }
    }

    async fn with_retry<T>(
        &self,
        what: &str,
        mut op: impl AsyncFnMut() -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Err(StoreError::Unavailable(e)) if attempt < self.store_retries => {
                    attempt += 1;
                    warn!(error = %e, what, attempt, "transient store failure, retrying");
                    actix_web::rt::time::sleep(Duration::from_millis(50 * u64::from(attempt))).await;
                }
                other => return other,
            }
        }
    }
}

fn read_failed(e: StoreError) -> AttendanceError {
    if let StoreError::Unavailable(err) = &e {
        error!(error = %err, "attendance store read failed");
    }
    AttendanceError::StoreUnavailable
}
