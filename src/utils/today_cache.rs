use anyhow::Result;
use chrono::{NaiveDate, Utc};
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::model::attendance::AttendanceDay;
use crate::store::mysql::decode_day;

/// Read-through view of today's records, consulted only by `today` reads.
/// Every successful mutation invalidates its key; the short TTL bounds how
/// long a missed invalidation could serve stale state.
static TODAY_CACHE: Lazy<Cache<(u64, NaiveDate), AttendanceDay>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(Duration::from_secs(60))
        .build()
});

pub async fn get(employee_id: u64, date: NaiveDate) -> Option<AttendanceDay> {
    TODAY_CACHE.get(&(employee_id, date)).await
}

/// Only present records are cached; absence is cheap to re-read.
pub async fn insert(day: &AttendanceDay) {
    TODAY_CACHE.insert((day.employee_id, day.date), day.clone()).await;
}

pub async fn invalidate(employee_id: u64, date: NaiveDate) {
    TODAY_CACHE.invalidate(&(employee_id, date)).await;
}

/// Batch insert a chunk of warmed-up days
async fn batch_insert(days: &[AttendanceDay]) {
    let futures: Vec<_> = days
        .iter()
        .map(|d| TODAY_CACHE.insert((d.employee_id, d.date), d.clone()))
        .collect();

    futures::future::join_all(futures).await;
}

/// Preload today's rows so the first dashboard hit after a restart does not
/// stampede the database.
pub async fn warmup_today_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let today = Utc::now().date_naive();

    let mut stream = sqlx::query(
        r#"
        SELECT employee_id, date, clock_in, clock_out, breaks,
               clock_in_meta, clock_out_meta
        FROM attendance_days
        WHERE date = ?
        "#,
    )
    .bind(today)
    .fetch(pool);

    let mut batch: Vec<AttendanceDay> = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let day = decode_day(&row?)?;
        batch.push(day);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_insert(&batch).await;
            batch.clear();
        }
    }

    // Insert any remaining rows
    if !batch.is_empty() {
        batch_insert(&batch).await;
    }

    log::info!(
        "Today cache warmup complete: {} attendance rows for {}",
        total_count,
        today
    );

    Ok(())
}
