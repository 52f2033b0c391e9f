use crate::models::{Reading, Thresholds, UserId};

use super::{templates, Notifier};

/// Warns the principal when a reading leaves the safe temperature band.
#[derive(Clone)]
pub struct AlertEvaluator {
    notifier: Notifier,
    principal: UserId,
    thresholds: Thresholds,
}

impl AlertEvaluator {
    pub fn new(notifier: Notifier, principal: UserId, thresholds: Thresholds) -> Self {
        Self {
            notifier,
            principal,
            thresholds,
        }
    }

    /// Returns `true` when the reading is out of band and a warning was attempted.
    pub async fn evaluate(&self, reading: &Reading) -> bool {
        if !self.thresholds.is_out_of_band(reading.temperature) {
            return false;
        }

        tracing::info!(
            "Temperature {:.2} outside [{}, {}]",
            reading.temperature,
            self.thresholds.cold,
            self.thresholds.hot
        );

        self.notifier
            .send(
                self.principal,
                &templates::temperature_warning(reading.temperature),
            )
            .await;

        true
    }
}
