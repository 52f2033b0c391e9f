use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use super::Table;

/// Operational failure kept for the operator.
#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: i64,
    pub event_type: String,
    pub payload: Value,
    pub time: OffsetDateTime,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    SensorFailure,
    StorageFailure,
    DeliveryFailure,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SensorFailure => "sensor_failure",
            EventKind::StorageFailure => "storage_failure",
            EventKind::DeliveryFailure => "delivery_failure",
        }
    }
}

#[derive(Clone)]
pub struct EventTable;

impl Table for EventTable {
    fn name(&self) -> &'static str {
        "events"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_type VARCHAR(255) NOT NULL,
                payload JSON NOT NULL DEFAULT '{}',
                time TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS events;")
    }
}
