//! Start-up verification of the `sensor_data` column set.
//!
//! Columns are compared by name and SQLite type affinity, so tables declared
//! as `VARCHAR(20)` / `FLOAT` by older tooling still pass.

use crate::DbPool;

/// Columns the station reads and writes, with their expected affinity.
pub const EXPECTED_COLUMNS: [(&str, Affinity); 5] = [
    ("id", Affinity::Integer),
    ("timestamp", Affinity::Text),
    ("temperature", Affinity::Real),
    ("humidity", Affinity::Real),
    ("light", Affinity::Real),
];

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Failed to inspect sensor_data: {0}")]
    Query(#[from] sqlx::Error),

    #[error("Schema mismatch. Expected {expected}, found {found}")]
    Mismatch { expected: String, found: String },
}

/// SQLite column affinity (section 3.1 of the SQLite datatype docs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    Integer,
    Text,
    Blob,
    Real,
    Numeric,
}

impl Affinity {
    /// Derive the affinity SQLite assigns to a declared column type.
    pub fn of_declared_type(declared: &str) -> Self {
        let upper = declared.to_ascii_uppercase();
        if upper.contains("INT") {
            Affinity::Integer
        } else if ["CHAR", "CLOB", "TEXT"].iter().any(|k| upper.contains(k)) {
            Affinity::Text
        } else if upper.is_empty() || upper.contains("BLOB") {
            Affinity::Blob
        } else if ["REAL", "FLOA", "DOUB"].iter().any(|k| upper.contains(k)) {
            Affinity::Real
        } else {
            Affinity::Numeric
        }
    }
}

/// Check that every expected column exists with a compatible type and
/// return the number of stored readings.
pub async fn verify_schema(pool: &DbPool) -> Result<i64, SchemaError> {
    let columns: Vec<(String, String)> =
        sqlx::query_as("SELECT name, type FROM pragma_table_info('sensor_data')")
            .fetch_all(pool)
            .await?;

    let compatible = EXPECTED_COLUMNS.iter().all(|(name, affinity)| {
        columns
            .iter()
            .any(|(col, ty)| col == name && Affinity::of_declared_type(ty) == *affinity)
    });

    if !compatible {
        return Err(SchemaError::Mismatch {
            expected: format!("{EXPECTED_COLUMNS:?}"),
            found: format!("{columns:?}"),
        });
    }

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sensor_data")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
