pub mod auth;
pub mod delivery;
pub mod sensor;
pub mod service;
pub mod storage;

pub use auth::AuthError;
pub use delivery::DeliveryError;
pub use sensor::SensorError;
pub use service::ServiceError;
pub use storage::StorageError;
