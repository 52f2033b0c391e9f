use std::f64::consts::PI;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::errors::SensorError;
use crate::models::Measurement;

use super::Sensor;

/// Day-cycle sensor for hosts without a BME280.
///
/// Temperature swings from about 18 °C before dawn to about 33 °C in the
/// afternoon, so both the cold and the hot alert fire once per day.
pub struct SimulatedSensor {
    offset_hours: f64,
}

impl SimulatedSensor {
    pub fn new() -> Self {
        Self { offset_hours: 0.0 }
    }

    /// Shifts the simulated day, e.g. to start in the afternoon heat.
    pub fn with_offset_hours(offset_hours: f64) -> Self {
        Self { offset_hours }
    }

    fn day_fraction(&self, now: OffsetDateTime) -> f64 {
        let seconds = f64::from(now.hour()) * 3600.0
            + f64::from(now.minute()) * 60.0
            + f64::from(now.second())
            + self.offset_hours * 3600.0;

        (seconds / 86400.0).rem_euclid(1.0)
    }
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new()
    }
}

pub fn simulated_temperature(day_fraction: f64) -> f64 {
    // Coldest around 04:00, warmest around 16:00
    let radians = (day_fraction - 1.0 / 6.0) * 2.0 * PI;

    25.5 - (radians.cos() * 7.5)
}

pub fn simulated_humidity(day_fraction: f64) -> f64 {
    let radians = day_fraction * 2.0 * PI;

    if (0.3..=0.7).contains(&day_fraction) {
        ((radians.sin().max(0.0) * 25.0) + 45.0).round()
    } else {
        ((radians.cos().max(0.0) * 30.0) + 40.0).round()
    }
}

pub fn simulated_pressure(day_fraction: f64) -> f64 {
    // Standard pressure with a small semidiurnal tide
    1013.25 + (day_fraction * 4.0 * PI).sin() * 1.5
}

#[async_trait]
impl Sensor for SimulatedSensor {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn read(&mut self) -> Result<Measurement, SensorError> {
        let day_fraction = self.day_fraction(OffsetDateTime::now_utc());

        Ok(Measurement {
            temperature: simulated_temperature(day_fraction),
            humidity: simulated_humidity(day_fraction),
            pressure: simulated_pressure(day_fraction),
        })
    }
}
