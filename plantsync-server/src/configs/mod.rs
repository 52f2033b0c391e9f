mod schema;
mod settings;
mod storage;

pub use schema::SchemaManager;
pub use settings::{
    Database, Hardware, IndicatorKind, Logger, Sampling, SensorKind, Settings, Telegram,
};
pub use storage::Storage;
