use std::sync::Arc;

use serde_json::{json, Value};

use crate::models::{EventKind, MenuEntry, UserId};
use crate::repositories::EventRepository;

use super::Messenger;

/// Best-effort outbound delivery.
///
/// Failures never reach the caller: they are logged and, when an event log
/// is attached, recorded as `delivery_failure` events. Nothing is retried.
#[derive(Clone)]
pub struct Notifier {
    messenger: Arc<dyn Messenger>,
    events: Option<EventRepository>,
}

impl Notifier {
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Self {
            messenger,
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventRepository) -> Self {
        self.events = Some(events);
        self
    }

    /// Returns whether the transport accepted the message.
    pub async fn send(&self, user: UserId, text: &str) -> bool {
        match self.messenger.send_message(user, text).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to deliver message to {}: {}", user, e);
                self.record(
                    EventKind::DeliveryFailure,
                    json!({ "user": user, "error": e.to_string() }),
                )
                .await;
                false
            }
        }
    }

    pub async fn send_menu(&self, user: UserId, text: &str, entries: &[MenuEntry]) -> bool {
        match self.messenger.send_menu(user, text, entries).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to deliver menu to {}: {}", user, e);
                self.record(
                    EventKind::DeliveryFailure,
                    json!({ "user": user, "error": e.to_string() }),
                )
                .await;
                false
            }
        }
    }

    /// Replies on the pressed button instead of in the chat.
    pub async fn answer_callback(&self, user: UserId, callback_id: &str, text: &str) -> bool {
        match self.messenger.answer_callback(user, callback_id, text).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to answer callback {} of {}: {}", callback_id, user, e);
                self.record(
                    EventKind::DeliveryFailure,
                    json!({ "user": user, "callback_id": callback_id, "error": e.to_string() }),
                )
                .await;
                false
            }
        }
    }

    pub async fn acknowledge(&self, callback_id: &str) {
        if let Err(e) = self.messenger.acknowledge(callback_id).await {
            tracing::debug!("Failed to acknowledge callback {}: {}", callback_id, e);
        }
    }

    /// Writes an operational event, if an event log is attached.
    pub async fn record(&self, kind: EventKind, payload: Value) {
        let Some(events) = &self.events else {
            return;
        };

        if let Err(e) = events.record(kind, payload).await {
            tracing::error!("Failed to record {} event: {}", kind.as_str(), e);
        }
    }
}
