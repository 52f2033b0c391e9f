use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use time::OffsetDateTime;
use tokio::sync::watch;
use uuid::Uuid;

use crate::errors::SensorError;
use crate::models::{truncate_to_seconds, EventKind, IndicatorState, Reading, Thresholds, UserId};
use crate::repositories::SampleStore;

use super::{templates, AlertEvaluator, Indicator, Notifier, SharedSensor};

/// What a single tick did.
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    Recorded {
        reading: Reading,
        state: IndicatorState,
        alerted: bool,
    },
    SensorFailed(SensorError),
    /// The reading was taken but could not be stored, so it is lost.
    StorageFailed(Reading),
}

/// Periodic sampling: read, store, show, report, alert.
pub struct MeasurementLoop {
    sensor: SharedSensor,
    store: Arc<dyn SampleStore>,
    indicator: Arc<dyn Indicator>,
    notifier: Notifier,
    alerts: AlertEvaluator,
    principal: UserId,
    thresholds: Thresholds,
    interval: Duration,
    last_timestamp: Option<OffsetDateTime>,
}

impl MeasurementLoop {
    pub fn new(
        sensor: SharedSensor,
        store: Arc<dyn SampleStore>,
        indicator: Arc<dyn Indicator>,
        notifier: Notifier,
        principal: UserId,
        thresholds: Thresholds,
        interval: Duration,
    ) -> Self {
        let alerts = AlertEvaluator::new(notifier.clone(), principal, thresholds);

        Self {
            sensor,
            store,
            indicator,
            notifier,
            alerts,
            principal,
            thresholds,
            interval,
            last_timestamp: None,
        }
    }

    /// Runs one iteration. Never fails: every error is handled here.
    pub async fn tick(&mut self) -> TickOutcome {
        let measurement = match self.sensor.read().await {
            Ok(measurement) => measurement,
            Err(e) => {
                tracing::error!("Sensor read failed: {}", e);

                self.notifier
                    .record(EventKind::SensorFailure, json!({ "error": e.to_string() }))
                    .await;
                self.notifier
                    .send(self.principal, &templates::error(&e))
                    .await;

                return TickOutcome::SensorFailed(e);
            }
        };

        let reading = Reading::new(self.next_timestamp(), measurement);

        if let Err(e) = self.store.append(&reading).await {
            let error_id = Uuid::new_v4();
            tracing::error!("Failed to store reading [{}]: {}", error_id, e);

            self.notifier
                .record(
                    EventKind::StorageFailure,
                    json!({
                        "error_id": error_id,
                        "error": e.to_string(),
                        "reading": &reading,
                    }),
                )
                .await;
            self.notifier
                .send(self.principal, &templates::error(&e))
                .await;

            return TickOutcome::StorageFailed(reading);
        }

        let state = self.thresholds.classify(reading.temperature);
        self.indicator.set_indicator(state);

        self.notifier
            .send(
                self.principal,
                &templates::measurement_summary(&reading.measurement()),
            )
            .await;

        let alerted = self.alerts.evaluate(&reading).await;

        tracing::debug!("Recorded reading at {} ({})", reading.timestamp, state.as_str());

        TickOutcome::Recorded {
            reading,
            state,
            alerted,
        }
    }

    /// Ticks immediately, then once per interval, until `shutdown` fires.
    /// The next tick is armed only after the previous one has finished.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("Measurement loop started, interval {:?}", self.interval);

        while !*shutdown.borrow() {
            self.tick().await;

            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!("Measurement loop stopped");
    }

    // Wall clock can step back; stored timestamps must not.
    fn next_timestamp(&mut self) -> OffsetDateTime {
        let now = truncate_to_seconds(OffsetDateTime::now_utc());
        let timestamp = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };

        self.last_timestamp = Some(timestamp);
        timestamp
    }
}
