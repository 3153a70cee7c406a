use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{MySqlPool, Row};

use crate::store::StoreError;

/// Resolves a platform user to the employee record attendance is tracked
/// against. Users without one (service accounts, logins created before
/// onboarding finished) resolve to `None`.
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn employee_id_for(&self, user_id: u64) -> Result<Option<u64>, StoreError>;
}

/// Reads the link from the platform `users` table, which the user service
/// owns.
pub struct MySqlEmployeeDirectory {
    pool: MySqlPool,
}

impl MySqlEmployeeDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeDirectory for MySqlEmployeeDirectory {
    async fn employee_id_for(&self, user_id: u64) -> Result<Option<u64>, StoreError> {
        let row = sqlx::query("SELECT employee_id FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.into()))?;

        // A user row with a NULL employee_id is still "no employee record"
        match row {
            Some(r) => r
                .try_get::<Option<u64>, _>("employee_id")
                .map_err(|e| StoreError::Unavailable(e.into())),
            None => Ok(None),
        }
    }
}

/// In-memory double used by the service tests.
#[derive(Default)]
pub struct MemoryEmployeeDirectory {
    links: HashMap<u64, u64>,
}

impl MemoryEmployeeDirectory {
    pub fn with_links(links: &[(u64, u64)]) -> Self {
        Self {
            links: links.iter().copied().collect(),
        }
    }
}

#[async_trait]
impl EmployeeDirectory for MemoryEmployeeDirectory {
    async fn employee_id_for(&self, user_id: u64) -> Result<Option<u64>, StoreError> {
        Ok(self.links.get(&user_id).copied())
    }
}
