use async_trait::async_trait;

use crate::errors::DeliveryError;
use crate::models::UserId;

use super::Messenger;

/// Messenger used when no transport is configured; messages go to the log.
#[derive(Debug, Default)]
pub struct LogMessenger;

#[async_trait]
impl Messenger for LogMessenger {
    async fn send_message(&self, user: UserId, text: &str) -> Result<(), DeliveryError> {
        tracing::info!("message to {}: {}", user, text.replace('\n', " | "));

        Ok(())
    }
}
