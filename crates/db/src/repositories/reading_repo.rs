//! Repository for the `sensor_data` table (append-only time-series).

use envmon_core::types::Reading;
use sqlx::SqlitePool;

use crate::models::sensor_record::SensorRecord;

/// Column list for `sensor_data` SELECT queries.
const COLUMNS: &str = "id, timestamp, temperature, humidity, light";

/// Provides query operations for stored readings.
pub struct ReadingRepo;

impl ReadingRepo {
    /// Append a reading and return the stored row.
    pub async fn insert(pool: &SqlitePool, reading: &Reading) -> Result<SensorRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO sensor_data (timestamp, temperature, humidity, light) \
             VALUES (?1, ?2, ?3, ?4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SensorRecord>(&query)
            .bind(&reading.timestamp)
            .bind(reading.temperature)
            .bind(reading.humidity)
            .bind(reading.light)
            .fetch_one(pool)
            .await
    }

    /// The newest `limit` rows in chronological order (oldest first).
    pub async fn latest(pool: &SqlitePool, limit: i64) -> Result<Vec<SensorRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sensor_data ORDER BY id DESC LIMIT ?1");
        let mut rows = sqlx::query_as::<_, SensorRecord>(&query)
            .bind(limit.max(0))
            .fetch_all(pool)
            .await?;
        rows.reverse();
        Ok(rows)
    }

    /// Every row, newest first.
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<SensorRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sensor_data ORDER BY id DESC");
        sqlx::query_as::<_, SensorRecord>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sensor_data")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
