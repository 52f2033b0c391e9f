mod bme280;
mod simulated;

#[cfg(feature = "hardware")]
pub use bme280::Bme280Sensor;
pub use bme280::Calibration;
pub use simulated::SimulatedSensor;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::errors::SensorError;
use crate::models::Measurement;

/// Source of temperature, humidity and pressure samples.
#[async_trait]
pub trait Sensor: Send {
    fn name(&self) -> &'static str;

    async fn read(&mut self) -> Result<Measurement, SensorError>;
}

/// Cloneable handle that lets the measurement loop and the command router
/// share one physical sensor. At most one read is in flight at a time.
#[derive(Clone)]
pub struct SharedSensor {
    inner: Arc<Mutex<Box<dyn Sensor>>>,
}

impl SharedSensor {
    pub fn new(sensor: impl Sensor + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(sensor))),
        }
    }

    pub async fn read(&self) -> Result<Measurement, SensorError> {
        let mut sensor = self.inner.lock().await;

        let result = sensor.read().await;
        if let Ok(measurement) = &result {
            tracing::debug!("{} read {:?}", sensor.name(), measurement);
        }

        result
    }
}
