//! Shared handle over the readings table.

use envmon_core::types::Reading;
use tokio::sync::Mutex;

use crate::models::sensor_record::SensorRecord;
use crate::repositories::ReadingRepo;
use crate::DbPool;

/// Append-only record store.
///
/// Appends are serialized through `write_lock`; reads go straight to the
/// pool and see committed rows only (WAL).
pub struct RecordStore {
    pool: DbPool,
    write_lock: Mutex<()>,
}

impl RecordStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            write_lock: Mutex::new(()),
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn append(&self, reading: &Reading) -> Result<SensorRecord, sqlx::Error> {
        let _guard = self.write_lock.lock().await;
        ReadingRepo::insert(&self.pool, reading).await
    }

    /// Newest `n` records, oldest first.
    pub async fn latest(&self, n: i64) -> Result<Vec<SensorRecord>, sqlx::Error> {
        ReadingRepo::latest(&self.pool, n).await
    }

    /// Full history, newest first.
    pub async fn all(&self) -> Result<Vec<SensorRecord>, sqlx::Error> {
        ReadingRepo::list_all(&self.pool).await
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        ReadingRepo::count(&self.pool).await
    }
}
