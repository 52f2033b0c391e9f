use super::{SensorError, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Sensor error: {0}")]
    SensorError(#[from] SensorError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}
