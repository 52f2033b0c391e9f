mod alert_service;
mod command_router;
mod indicator;
mod measurement_service;
mod messenger;
mod notifier;
mod sensor;
mod statistics_service;
pub mod templates;

pub use alert_service::*;
pub use command_router::*;
pub use indicator::*;
pub use measurement_service::*;
pub use messenger::*;
pub use notifier::*;
pub use sensor::*;
pub use statistics_service::*;
