mod event;
mod reading;

pub use event::EventRepository;
pub use reading::ReadingRepository;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::errors::StorageError;
use crate::models::Reading;

/// Append-only, time-ordered log of readings.
///
/// Implementations must accept `append` and `query_range` from different
/// tasks at the same time; a query never observes a half-written reading.
#[async_trait]
pub trait SampleStore: Send + Sync {
    /// Persists one reading atomically.
    async fn append(&self, reading: &Reading) -> Result<(), StorageError>;

    /// All readings with `start <= timestamp <= end`, in no particular order.
    async fn query_range(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<Reading>, StorageError>;
}
