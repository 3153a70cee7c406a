use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

use super::{AttendanceStore, StoreError, StoredDay};
use crate::model::attendance::{AttendanceDay, BreakInterval, EventMetadata};

/// MySQL-backed store. One row per (employee_id, date), guarded by a unique
/// key; `version` carries the optimistic-concurrency token. Breaks and
/// event metadata live in JSON text columns (see `schema.sql`).
pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// Maps a row from `attendance_days` back to the domain type. Shared with
/// the cache warmup, which streams the same columns.
pub(crate) fn decode_day(row: &MySqlRow) -> anyhow::Result<AttendanceDay> {
    let breaks_json: String = row.try_get("breaks")?;
    let breaks: Vec<BreakInterval> = serde_json::from_str(&breaks_json)?;

    Ok(AttendanceDay {
        employee_id: row.try_get("employee_id")?,
        date: row.try_get("date")?,
        clock_in: row.try_get::<Option<DateTime<Utc>>, _>("clock_in")?,
        clock_out: row.try_get::<Option<DateTime<Utc>>, _>("clock_out")?,
        breaks,
        clock_in_meta: decode_meta(row.try_get("clock_in_meta")?)?,
        clock_out_meta: decode_meta(row.try_get("clock_out_meta")?)?,
    })
}

fn decode_meta(json: Option<String>) -> anyhow::Result<Option<EventMetadata>> {
    json.map(|s| serde_json::from_str(&s)).transpose().map_err(Into::into)
}

fn decode_stored(row: &MySqlRow) -> Result<StoredDay, StoreError> {
    let day = decode_day(row).map_err(StoreError::Unavailable)?;
    let version: i64 = row.try_get("version").map_err(unavailable)?;
    let last_event_key: Option<String> = row.try_get("last_event_key").map_err(unavailable)?;
    Ok(StoredDay {
        day,
        version,
        last_event_key,
    })
}

fn encode_breaks(breaks: &[BreakInterval]) -> Result<String, StoreError> {
    serde_json::to_string(breaks).map_err(|e| StoreError::Unavailable(e.into()))
}

fn encode_meta(meta: &Option<EventMetadata>) -> Result<Option<String>, StoreError> {
    meta.as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| StoreError::Unavailable(e.into()))
}

fn unavailable(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.into())
}

/// Unique-key violations surface as SQLSTATE 23000.
fn is_duplicate_key(e: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = e {
        db_err.code().as_deref() == Some("23000")
    } else {
        false
    }
}

const DAY_COLUMNS: &str = "employee_id, date, clock_in, clock_out, breaks, \
                           clock_in_meta, clock_out_meta, last_event_key, version";

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn get(&self, employee_id: u64, date: NaiveDate) -> Result<Option<StoredDay>, StoreError> {
        let sql = format!(
            "SELECT {DAY_COLUMNS} FROM attendance_days WHERE employee_id = ? AND date = ?"
        );
        let row = sqlx::query(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;

        row.as_ref().map(decode_stored).transpose()
    }

    async fn range(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<StoredDay>, StoreError> {
        let sql = format!(
            "SELECT {DAY_COLUMNS} FROM attendance_days \
             WHERE employee_id = ? AND date BETWEEN ? AND ? \
             ORDER BY date ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(employee_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;

        rows.iter().map(decode_stored).collect()
    }

    async fn insert_new(&self, day: &StoredDay) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_days
                (employee_id, date, clock_in, clock_out, breaks,
                 clock_in_meta, clock_out_meta, last_event_key, version)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1)
            "#,
        )
        .bind(day.day.employee_id)
        .bind(day.day.date)
        .bind(day.day.clock_in)
        .bind(day.day.clock_out)
        .bind(encode_breaks(&day.day.breaks)?)
        .bind(encode_meta(&day.day.clock_in_meta)?)
        .bind(encode_meta(&day.day.clock_out_meta)?)
        .bind(day.last_event_key.as_deref())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Conflict),
            Err(e) => Err(unavailable(e)),
        }
    }

    async fn update(&self, day: &StoredDay) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance_days
            SET clock_in = ?, clock_out = ?, breaks = ?,
                clock_in_meta = ?, clock_out_meta = ?,
                last_event_key = ?, version = version + 1
            WHERE employee_id = ? AND date = ? AND version = ?
            "#,
        )
        .bind(day.day.clock_in)
        .bind(day.day.clock_out)
        .bind(encode_breaks(&day.day.breaks)?)
        .bind(encode_meta(&day.day.clock_in_meta)?)
        .bind(encode_meta(&day.day.clock_out_meta)?)
        .bind(day.last_event_key.as_deref())
        .bind(day.day.employee_id)
        .bind(day.day.date)
        .bind(day.version)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        // zero rows touched means the version moved (or the row vanished)
        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict);
        }
        Ok(())
    }
}
