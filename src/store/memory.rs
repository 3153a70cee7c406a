use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{AttendanceStore, StoreError, StoredDay};

/// Mutex-guarded map with the same conditional-write semantics as the MySQL
/// store. Backs the service tests.
#[derive(Default)]
pub struct MemoryAttendanceStore {
    days: Mutex<HashMap<(u64, NaiveDate), StoredDay>>,
}

#[async_trait]
impl AttendanceStore for MemoryAttendanceStore {
    async fn get(&self, employee_id: u64, date: NaiveDate) -> Result<Option<StoredDay>, StoreError> {
        Ok(self.days.lock().unwrap().get(&(employee_id, date)).cloned())
    }

    async fn range(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<StoredDay>, StoreError> {
        let map = self.days.lock().unwrap();
        let mut rows: Vec<StoredDay> = map
            .values()
            .filter(|s| s.day.employee_id == employee_id && s.day.date >= start && s.day.date <= end)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.day.date);
        Ok(rows)
    }

    async fn insert_new(&self, day: &StoredDay) -> Result<(), StoreError> {
        let mut map = self.days.lock().unwrap();
        match map.entry((day.day.employee_id, day.day.date)) {
            Entry::Occupied(_) => Err(StoreError::Conflict),
            Entry::Vacant(slot) => {
                slot.insert(StoredDay {
                    version: 1,
                    ..day.clone()
                });
                Ok(())
            }
        }
    }

    async fn update(&self, day: &StoredDay) -> Result<(), StoreError> {
        let mut map = self.days.lock().unwrap();
        let Some(existing) = map.get_mut(&(day.day.employee_id, day.day.date)) else {
            return Err(StoreError::Conflict);
        };
        if existing.version != day.version {
            return Err(StoreError::Conflict);
        }
        *existing = StoredDay {
            version: day.version + 1,
            ..day.clone()
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceDay;
    use chrono::TimeZone;
    use chrono::Utc;

    fn stored(employee_id: u64, d: u32) -> StoredDay {
        let date = NaiveDate::from_ymd_opt(2026, 1, d).unwrap();
        let mut day = AttendanceDay::new(employee_id, date);
        day.clock_in = Some(Utc.with_ymd_and_hms(2026, 1, d, 9, 0, 0).unwrap());
        StoredDay::new(day, None)
    }

    #[actix_web::test]
    async fn second_insert_for_same_key_conflicts() {
        let store = MemoryAttendanceStore::default();
        store.insert_new(&stored(1, 5)).await.unwrap();

        let err = store.insert_new(&stored(1, 5)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict));

        // a different date is a different key
        store.insert_new(&stored(1, 6)).await.unwrap();
    }

    #[actix_web::test]
    async fn update_is_a_compare_and_swap() {
        let store = MemoryAttendanceStore::default();
        store.insert_new(&stored(1, 5)).await.unwrap();

        let mut fresh = store.get(1, stored(1, 5).day.date).await.unwrap().unwrap();
        fresh.day.clock_out = Some(Utc.with_ymd_and_hms(2026, 1, 5, 17, 0, 0).unwrap());
        store.update(&fresh).await.unwrap();

        // the same observed version again is now stale
        let err = store.update(&fresh).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict));

        let current = store.get(1, fresh.day.date).await.unwrap().unwrap();
        assert_eq!(current.version, 2);
        assert!(current.day.clock_out.is_some());
    }

    #[actix_web::test]
    async fn range_is_ordered_and_scoped_to_the_employee() {
        let store = MemoryAttendanceStore::default();
        store.insert_new(&stored(1, 7)).await.unwrap();
        store.insert_new(&stored(1, 5)).await.unwrap();
        store.insert_new(&stored(2, 6)).await.unwrap();

        let rows = store
            .range(
                1,
                NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            )
            .await
            .unwrap();

        let dates: Vec<u32> = rows.iter().map(|s| {
            use chrono::Datelike;
            s.day.date.day()
        }).collect();
        assert_eq!(dates, vec![5, 7]);
    }
}
