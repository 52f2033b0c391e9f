//! Telegram Bot API transport: outbound messages plus `getUpdates` long polling.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::{mpsc, watch};

use crate::configs::Telegram;
use crate::errors::DeliveryError;
use crate::models::{Command, InboundCommand, MenuEntry, UserId};

use super::Messenger;

const POLL_ERROR_PAUSE: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotUser {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    pub from: Option<BotUser>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: BotUser,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<ChatMessage>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Serialize)]
struct GetUpdates<'a> {
    offset: i64,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

pub struct TelegramBot {
    client: reqwest::Client,
    base_url: String,
    poll_timeout: Duration,
}

impl TelegramBot {
    pub fn new(settings: &Telegram) -> Result<Self, DeliveryError> {
        let poll_timeout = Duration::from_secs(settings.poll_timeout_secs);

        // Long polls must not be cut short by the client timeout
        let client = reqwest::Client::builder()
            .timeout(poll_timeout + Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: format!(
                "{}/bot{}",
                settings.api_url.trim_end_matches('/'),
                settings.token
            ),
            poll_timeout,
        })
    }

    async fn call<P, T>(&self, method: &str, params: &P) -> Result<T, DeliveryError>
    where
        P: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        // Request errors carry the URL, and the URL carries the token
        let response: ApiResponse<T> = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .json(params)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.without_url()))?
            .json()
            .await
            .map_err(|e| DeliveryError::Transport(e.without_url()))?;

        match (response.ok, response.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(DeliveryError::Rejected {
                code: response.error_code.unwrap_or_default(),
                description: response
                    .description
                    .unwrap_or_else(|| format!("{method} failed")),
            }),
        }
    }

    /// Identity of the bot; used at start-up to check the token and the network.
    pub async fn get_me(&self) -> Result<BotUser, DeliveryError> {
        self.call("getMe", &json!({})).await
    }

    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, DeliveryError> {
        self.call(
            "getUpdates",
            &GetUpdates {
                offset,
                timeout: self.poll_timeout.as_secs(),
                allowed_updates: &["message", "callback_query"],
            },
        )
        .await
    }

    /// Feeds parsed commands into `commands` until shutdown or until the
    /// receiving side is gone.
    pub async fn poll(
        self: Arc<Self>,
        commands: mpsc::Sender<InboundCommand>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut offset = 0;

        tracing::info!("telegram polling started");

        loop {
            let updates = tokio::select! {
                _ = shutdown.changed() => break,
                result = self.get_updates(offset) => result,
            };

            match updates {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);

                        let Some(command) = parse_update(&update) else {
                            tracing::debug!("ignoring update {}", update.update_id);
                            continue;
                        };

                        if commands.send(command).await.is_err() {
                            tracing::info!("command router gone, telegram polling stopped");
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("getUpdates failed: {}", e);

                    tokio::select! {
                        _ = shutdown.changed() => break,
                        _ = tokio::time::sleep(POLL_ERROR_PAUSE) => {}
                    }
                }
            }
        }

        tracing::info!("telegram polling stopped");
    }
}

/// Inline keyboard with one button per row.
pub fn menu_markup(entries: &[MenuEntry]) -> Value {
    let rows: Vec<Value> = entries
        .iter()
        .map(|entry| {
            json!([{
                "text": entry.label,
                "callback_data": entry.command.callback_data(),
            }])
        })
        .collect();

    json!({ "inline_keyboard": rows })
}

/// Maps an update to a command; `None` for anything the service does not handle.
pub fn parse_update(update: &Update) -> Option<InboundCommand> {
    if let Some(query) = &update.callback_query {
        let command = Command::from_callback_data(query.data.as_deref()?)?;

        return Some(InboundCommand::new(query.from.id, command).with_callback(query.id.clone()));
    }

    let message = update.message.as_ref()?;
    let requester = message
        .from
        .as_ref()
        .map(|user| user.id)
        .unwrap_or(message.chat.id);
    let command = Command::from_text(message.text.as_deref()?)?;

    Some(InboundCommand::new(requester, command))
}

#[async_trait]
impl Messenger for TelegramBot {
    async fn send_message(&self, user: UserId, text: &str) -> Result<(), DeliveryError> {
        let _: Value = self
            .call("sendMessage", &json!({ "chat_id": user, "text": text }))
            .await?;

        Ok(())
    }

    async fn send_menu(
        &self,
        user: UserId,
        text: &str,
        entries: &[MenuEntry],
    ) -> Result<(), DeliveryError> {
        let _: Value = self
            .call(
                "sendMessage",
                &json!({
                    "chat_id": user,
                    "text": text,
                    "reply_markup": menu_markup(entries),
                }),
            )
            .await?;

        Ok(())
    }

    async fn acknowledge(&self, callback_id: &str) -> Result<(), DeliveryError> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &json!({ "callback_query_id": callback_id }),
            )
            .await?;

        Ok(())
    }

    async fn answer_callback(
        &self,
        _user: UserId,
        callback_id: &str,
        text: &str,
    ) -> Result<(), DeliveryError> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &json!({ "callback_query_id": callback_id, "text": text }),
            )
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::models::MENU;

    use super::*;

    fn update(value: Value) -> Update {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_start_command() {
        let parsed = parse_update(&update(json!({
            "update_id": 10,
            "message": {
                "message_id": 1,
                "from": {"id": 154966995, "is_bot": false, "first_name": "A"},
                "chat": {"id": 154966995, "type": "private"},
                "date": 1700000000,
                "text": "/start"
            }
        })));

        assert_eq!(parsed, Some(InboundCommand::new(154966995, Command::ShowMenu)));
    }

    #[test]
    fn test_parse_callback_query() {
        let parsed = parse_update(&update(json!({
            "update_id": 11,
            "callback_query": {
                "id": "4382",
                "from": {"id": 42, "is_bot": false, "first_name": "B"},
                "chat_instance": "-1",
                "data": "week"
            }
        })));

        assert_eq!(
            parsed,
            Some(InboundCommand::new(42, Command::GetWeekStats).with_callback("4382"))
        );
    }

    #[test]
    fn test_ignore_unhandled_updates() {
        let plain_text = update(json!({
            "update_id": 12,
            "message": {
                "message_id": 2,
                "from": {"id": 1, "is_bot": false, "first_name": "C"},
                "chat": {"id": 1, "type": "private"},
                "date": 1700000000,
                "text": "how are my plants?"
            }
        }));
        let unknown_button = update(json!({
            "update_id": 13,
            "callback_query": {
                "id": "1",
                "from": {"id": 1, "is_bot": false, "first_name": "C"},
                "chat_instance": "-1",
                "data": "refresh"
            }
        }));
        let edited = update(json!({"update_id": 14}));

        assert_eq!(parse_update(&plain_text), None);
        assert_eq!(parse_update(&unknown_button), None);
        assert_eq!(parse_update(&edited), None);
    }

    #[test]
    fn test_menu_markup_has_one_row_per_option() {
        let markup = menu_markup(&MENU);
        let rows = markup["inline_keyboard"].as_array().unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0]["callback_data"], "current");
        assert_eq!(rows[1][0]["callback_data"], "week");
        assert_eq!(rows[2][0]["callback_data"], "month");
    }

    #[tokio::test]
    async fn test_unreachable_api_is_a_transport_error() {
        let bot = TelegramBot::new(&Telegram {
            enabled: true,
            token: String::from("123:secret"),
            authorized_user: 1,
            api_url: String::from("http://127.0.0.1:9"),
            poll_timeout_secs: 1,
        })
        .unwrap();

        let error = bot.send_message(1, "hello").await.unwrap_err();

        assert!(matches!(error, DeliveryError::Transport(_)));
        assert!(!error.to_string().contains("secret"));
    }
}
