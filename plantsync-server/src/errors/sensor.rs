#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SensorError {
    #[error("Sensor not initialized")]
    NotInitialized,

    #[error("Sensor communication failed: {0}")]
    Communication(String),

    #[error("Sensor returned invalid data: {0}")]
    InvalidData(String),

    #[error("Sensor did not answer in time")]
    Timeout,
}
