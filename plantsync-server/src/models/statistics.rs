use serde::{Deserialize, Serialize};

use super::Reading;

/// Minimum, maximum and arithmetic mean of one field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl FieldStats {
    /// Returns `None` for an empty sequence.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for value in values {
            count += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }

        if count == 0 {
            return None;
        }

        Some(Self {
            min,
            max,
            mean: sum / count as f64,
        })
    }

    /// Same values rounded to two decimals, as they are presented.
    pub fn rounded(&self) -> Self {
        Self {
            min: round2(self.min),
            max: round2(self.max),
            mean: round2(self.mean),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    pub period_days: u32,
    pub samples: usize,
    pub temperature: FieldStats,
    pub humidity: FieldStats,
    pub pressure: FieldStats,
}

/// Result of aggregating a trailing window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Statistics {
    NoData { period_days: u32 },
    Summary(StatisticsSummary),
}

impl Statistics {
    pub fn from_readings(period_days: u32, readings: &[Reading]) -> Self {
        let temperature = FieldStats::from_values(readings.iter().map(|r| r.temperature));
        let humidity = FieldStats::from_values(readings.iter().map(|r| r.humidity));
        let pressure = FieldStats::from_values(readings.iter().map(|r| r.pressure));

        match (temperature, humidity, pressure) {
            (Some(temperature), Some(humidity), Some(pressure)) => {
                Statistics::Summary(StatisticsSummary {
                    period_days,
                    samples: readings.len(),
                    temperature,
                    humidity,
                    pressure,
                })
            }
            _ => Statistics::NoData { period_days },
        }
    }
}
