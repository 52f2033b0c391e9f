use std::sync::Arc;

use time::macros::datetime;
use time::{Duration, OffsetDateTime};

use crate::errors::StorageError;
use crate::models::{truncate_to_seconds, Statistics};
use crate::repositories::SampleStore;

/// Lower bound for windows reaching past the representable calendar.
const EARLIEST: OffsetDateTime = datetime!(0001-01-01 0:00 UTC);

/// Min/max/mean over a trailing window of whole days.
#[derive(Clone)]
pub struct Aggregator {
    store: Arc<dyn SampleStore>,
}

impl Aggregator {
    pub fn new(store: Arc<dyn SampleStore>) -> Self {
        Self { store }
    }

    pub async fn summarize(&self, period_days: u32) -> Result<Statistics, StorageError> {
        self.summarize_at(period_days, OffsetDateTime::now_utc()).await
    }

    /// Aggregates readings in `[now - period_days, now]`, both ends included.
    pub async fn summarize_at(
        &self,
        period_days: u32,
        now: OffsetDateTime,
    ) -> Result<Statistics, StorageError> {
        let end = truncate_to_seconds(now);
        let start = end
            .checked_sub(Duration::days(i64::from(period_days)))
            .map_or(EARLIEST, |start| start.max(EARLIEST));

        let readings = self.store.query_range(start, end).await?;

        tracing::debug!(
            "Aggregating {} readings over {} days",
            readings.len(),
            period_days
        );

        Ok(Statistics::from_readings(period_days, &readings))
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::models::{Measurement, Reading};
    use crate::repositories::ReadingRepository;
    use crate::tests::*;

    use super::*;

    async fn seeded(now: OffsetDateTime) -> Aggregator {
        let store = Arc::new(ReadingRepository::new(setup_test_db().await));

        // Days ago and temperature; inserted out of order on purpose
        for (days_ago, temperature) in [(10, 32.0), (2, 20.0), (5, 25.0)] {
            store
                .append(&Reading::new(
                    now - Duration::days(days_ago),
                    Measurement {
                        temperature,
                        humidity: 50.0,
                        pressure: 1010.0,
                    },
                ))
                .await
                .unwrap();
        }

        Aggregator::new(store)
    }

    #[tokio::test]
    async fn test_weekly_and_monthly_windows() {
        let now = datetime!(2024-06-30 12:00:00 UTC);
        let aggregator = seeded(now).await;

        let Statistics::Summary(week) = aggregator.summarize_at(7, now).await.unwrap() else {
            panic!("expected a weekly summary");
        };
        assert_eq!(week.samples, 2);
        assert_eq!(week.temperature.rounded().min, 20.0);
        assert_eq!(week.temperature.rounded().max, 25.0);
        assert_eq!(week.temperature.rounded().mean, 22.5);

        let Statistics::Summary(month) = aggregator.summarize_at(30, now).await.unwrap() else {
            panic!("expected a monthly summary");
        };
        assert_eq!(month.samples, 3);
        assert_eq!(month.temperature.rounded().min, 20.0);
        assert_eq!(month.temperature.rounded().max, 32.0);
        assert_eq!(month.temperature.rounded().mean, 25.67);
    }

    #[tokio::test]
    async fn test_empty_window_has_no_data() {
        let now = datetime!(2024-06-30 12:00:00 UTC);
        let aggregator = seeded(now).await;

        assert_eq!(
            aggregator.summarize_at(1, now).await.unwrap(),
            Statistics::NoData { period_days: 1 }
        );
        assert_eq!(
            aggregator.summarize_at(0, now).await.unwrap(),
            Statistics::NoData { period_days: 0 }
        );
    }

    #[tokio::test]
    async fn test_huge_window_covers_everything() {
        let now = datetime!(2024-06-30 12:00:00 UTC);
        let aggregator = seeded(now).await;

        let Statistics::Summary(summary) = aggregator.summarize_at(u32::MAX, now).await.unwrap()
        else {
            panic!("expected a summary");
        };
        assert_eq!(summary.samples, 3);
        assert_eq!(summary.period_days, u32::MAX);

        assert!(matches!(
            aggregator.summarize(u32::MAX).await,
            Ok(Statistics::Summary(_))
        ));
    }

    #[tokio::test]
    async fn test_summarize_is_idempotent() {
        let now = datetime!(2024-06-30 12:00:00 UTC);
        let aggregator = seeded(now).await;

        let first = aggregator.summarize_at(30, now).await.unwrap();
        let second = aggregator.summarize_at(30, now).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_window_edge_is_inclusive() {
        let now = datetime!(2024-06-30 12:00:00 UTC);
        let aggregator = seeded(now).await;

        // The day-5 reading sits exactly on the start of a 5-day window
        let Statistics::Summary(summary) = aggregator.summarize_at(5, now).await.unwrap() else {
            panic!("expected a summary");
        };
        assert_eq!(summary.samples, 2);
    }
}
