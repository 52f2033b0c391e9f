use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, UtcOffset};

use super::Table;

/// Raw values delivered by a sensor, not yet stamped with a sampling time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Temperature in Celsius
    pub temperature: f64,
    /// Relative humidity %
    pub humidity: f64,
    /// Air pressure in hPa
    pub pressure: f64,
}

/// One persisted sample. Created by the measurement loop and never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Reading {
    /// Sampling time, UTC with whole-second precision
    pub timestamp: OffsetDateTime,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Relative humidity %
    pub humidity: f64,
    /// Air pressure in hPa
    pub pressure: f64,
}

impl Reading {
    pub fn new(timestamp: OffsetDateTime, measurement: Measurement) -> Self {
        Self {
            timestamp: truncate_to_seconds(timestamp),
            temperature: measurement.temperature,
            humidity: measurement.humidity,
            pressure: measurement.pressure,
        }
    }

    pub fn measurement(&self) -> Measurement {
        Measurement {
            temperature: self.temperature,
            humidity: self.humidity,
            pressure: self.pressure,
        }
    }
}

/// Normalizes an instant to UTC and drops the sub-second part.
///
/// Stored timestamps are compared as text by SQLite, so every instant that
/// reaches the database goes through here to keep the encoding uniform.
pub fn truncate_to_seconds(time: OffsetDateTime) -> OffsetDateTime {
    let utc = time.to_offset(UtcOffset::UTC);

    utc - Duration::nanoseconds(i64::from(utc.nanosecond()))
}

#[derive(Clone)]
pub struct ReadingTable;

impl Table for ReadingTable {
    fn name(&self) -> &'static str {
        "measurements"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS measurements (
                timestamp TIMESTAMP NOT NULL,
                temperature REAL NOT NULL,
                humidity REAL NOT NULL,
                pressure REAL NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_measurements_timestamp ON measurements (timestamp);
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS measurements;")
    }
}
