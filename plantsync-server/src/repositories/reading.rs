use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Error, Sqlite, Transaction};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::configs::Storage;
use crate::errors::StorageError;
use crate::models::{truncate_to_seconds, Reading};
use crate::repositories::SampleStore;

/// SQLite backed [`SampleStore`].
///
/// Appends take the write side of `guard` and range queries the read side, so
/// queries run alongside each other but never interleave with an insert.
pub struct ReadingRepository {
    storage: Arc<Storage>,
    guard: RwLock<()>,
}

impl ReadingRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            guard: RwLock::new(()),
        }
    }
}

impl ReadingRepository {
    // Insert one reading inside an existing transaction
    pub async fn create(
        &self,
        item: &Reading,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO measurements (timestamp, temperature, humidity, pressure)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(truncate_to_seconds(item.timestamp))
        .bind(item.temperature)
        .bind(item.humidity)
        .bind(item.pressure)
        .execute(&mut **transaction)
        .await?;

        Ok(())
    }

    // Get readings within a given time range, both ends inclusive
    pub async fn find_by_time_range(
        &self,
        start_time: OffsetDateTime,
        end_time: OffsetDateTime,
    ) -> Result<Vec<Reading>, Error> {
        let records: Vec<Reading> = sqlx::query_as(
            r#"
            SELECT timestamp, temperature, humidity, pressure FROM measurements
            WHERE timestamp >= $1 AND timestamp <= $2
            "#,
        )
        .bind(truncate_to_seconds(start_time))
        .bind(truncate_to_seconds(end_time))
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(records)
    }

    // Get the most recent reading
    pub async fn find_latest(&self) -> Result<Option<Reading>, Error> {
        let record: Option<Reading> = sqlx::query_as(
            r#"
            SELECT timestamp, temperature, humidity, pressure FROM measurements
            ORDER BY timestamp DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(self.storage.get_pool())
        .await?;

        Ok(record)
    }

    pub async fn count(&self) -> Result<i64, Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM measurements")
            .fetch_one(self.storage.get_pool())
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl SampleStore for ReadingRepository {
    async fn append(&self, reading: &Reading) -> Result<(), StorageError> {
        let _writer = self.guard.write().await;

        let pool = self.storage.get_pool();
        if pool.is_closed() {
            return Err(StorageError::Closed);
        }

        let mut tx = pool.begin().await?;
        self.create(reading, &mut tx).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn query_range(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<Reading>, StorageError> {
        let _reader = self.guard.read().await;

        if self.storage.get_pool().is_closed() {
            return Err(StorageError::Closed);
        }

        Ok(self.find_by_time_range(start, end).await?)
    }
}
