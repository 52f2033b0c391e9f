mod log;
mod telegram;

pub use log::LogMessenger;
pub use telegram::{parse_update, BotUser, TelegramBot, Update};

use async_trait::async_trait;

use crate::errors::DeliveryError;
use crate::models::{MenuEntry, UserId};

/// Outbound side of the conversational transport.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(&self, user: UserId, text: &str) -> Result<(), DeliveryError>;

    /// Sends `text` followed by the menu options. Transports with buttons
    /// override this; the default lists the options as plain text.
    async fn send_menu(
        &self,
        user: UserId,
        text: &str,
        entries: &[MenuEntry],
    ) -> Result<(), DeliveryError> {
        let mut body = String::from(text);
        for entry in entries {
            body.push_str("\n- ");
            body.push_str(entry.label);
        }

        self.send_message(user, &body).await
    }

    /// Confirms that a button press was handled.
    async fn acknowledge(&self, _callback_id: &str) -> Result<(), DeliveryError> {
        Ok(())
    }

    /// Replies to a button press on the button itself. Transports without
    /// callback answers fall back to a plain message.
    async fn answer_callback(
        &self,
        user: UserId,
        _callback_id: &str,
        text: &str,
    ) -> Result<(), DeliveryError> {
        self.send_message(user, text).await
    }
}
