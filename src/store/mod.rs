pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::NaiveDate;
use derive_more::Display;

use crate::model::attendance::AttendanceDay;

/// A day plus the bookkeeping conditional writes need.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDay {
    pub day: AttendanceDay,
    /// Observed row version; `update` is a compare-and-swap against it.
    pub version: i64,
    /// Idempotency key of the last applied mutation, if the client sent one.
    pub last_event_key: Option<String>,
}

impl StoredDay {
    pub fn new(day: AttendanceDay, last_event_key: Option<String>) -> Self {
        Self {
            day,
            version: 1,
            last_event_key,
        }
    }
}

#[derive(Debug, Display)]
pub enum StoreError {
    /// Lost a conditional write: the row already exists (insert) or its
    /// version moved underneath us (update).
    #[display(fmt = "conditional write conflict")]
    Conflict,
    #[display(fmt = "store unavailable: {}", _0)]
    Unavailable(anyhow::Error),
}

impl std::error::Error for StoreError {}

/// Durable keyed storage for attendance days: point read, range read, and
/// conditional writes. The conditional writes are what make concurrent
/// clock-ins for the same employee and date resolve to exactly one winner;
/// client-side status checks alone are a race.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn get(&self, employee_id: u64, date: NaiveDate) -> Result<Option<StoredDay>, StoreError>;

    /// Days in `[start, end]`, oldest first. Dates without a row are simply
    /// absent from the result.
    async fn range(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<StoredDay>, StoreError>;

    /// Inserts a brand-new day at version 1. Fails with `Conflict` when a
    /// row already exists for (employee_id, date).
    async fn insert_new(&self, day: &StoredDay) -> Result<(), StoreError>;

    /// Replaces the row if its stored version still equals `day.version`,
    /// writing `day.version + 1`. Fails with `Conflict` otherwise.
    async fn update(&self, day: &StoredDay) -> Result<(), StoreError>;
}
