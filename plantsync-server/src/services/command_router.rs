use tokio::sync::{mpsc, watch};

use crate::errors::{AuthError, ServiceError};
use crate::models::{Command, InboundCommand, UserId, MENU};

use super::{templates, Aggregator, Notifier, SharedSensor};

const WEEK_DAYS: u32 = 7;
const MONTH_DAYS: u32 = 30;

/// Authorizes inbound commands against the single principal and answers them.
///
/// Holds no per-user state; every command is checked on its own.
#[derive(Clone)]
pub struct CommandRouter {
    principal: UserId,
    sensor: SharedSensor,
    aggregator: Aggregator,
    notifier: Notifier,
}

impl CommandRouter {
    pub fn new(
        principal: UserId,
        sensor: SharedSensor,
        aggregator: Aggregator,
        notifier: Notifier,
    ) -> Self {
        Self {
            principal,
            sensor,
            aggregator,
            notifier,
        }
    }

    pub fn authorize(&self, requester: UserId) -> Result<(), AuthError> {
        if requester == self.principal {
            Ok(())
        } else {
            Err(AuthError::AccessDenied { requester })
        }
    }

    /// Handles one command. A denied requester gets exactly one reply, on
    /// the pressed button when there is one, and nothing else happens; every
    /// other failure is answered to the requester.
    pub async fn handle(&self, inbound: &InboundCommand) -> Result<(), AuthError> {
        if let Err(denied) = self.authorize(inbound.requester) {
            tracing::info!("{}", denied);
            match &inbound.callback_id {
                Some(callback_id) => {
                    self.notifier
                        .answer_callback(inbound.requester, callback_id, templates::ACCESS_DENIED)
                        .await
                }
                None => {
                    self.notifier
                        .send(inbound.requester, templates::ACCESS_DENIED)
                        .await
                }
            };
            return Err(denied);
        }

        tracing::debug!("Handling {:?} from {}", inbound.command, inbound.requester);

        if let Err(e) = self.dispatch(inbound).await {
            tracing::error!("Command {:?} failed: {}", inbound.command, e);
            self.notifier
                .send(inbound.requester, &templates::error(&e))
                .await;
        }

        if let Some(callback_id) = &inbound.callback_id {
            self.notifier.acknowledge(callback_id).await;
        }

        Ok(())
    }

    async fn dispatch(&self, inbound: &InboundCommand) -> Result<(), ServiceError> {
        let requester = inbound.requester;

        match inbound.command {
            Command::ShowMenu => {
                self.notifier
                    .send_menu(requester, templates::MENU_TITLE, &MENU)
                    .await;
            }
            Command::GetCurrent => {
                let measurement = self.sensor.read().await?;
                self.notifier
                    .send(requester, &templates::current_readings(&measurement))
                    .await;
            }
            Command::GetWeekStats => self.send_statistics(requester, WEEK_DAYS).await?,
            Command::GetMonthStats => self.send_statistics(requester, MONTH_DAYS).await?,
        }

        Ok(())
    }

    async fn send_statistics(&self, requester: UserId, days: u32) -> Result<(), ServiceError> {
        let statistics = self.aggregator.summarize(days).await?;
        self.notifier
            .send(requester, &templates::statistics(&statistics))
            .await;

        Ok(())
    }

    /// Serves commands until `shutdown` fires or the inbound channel closes.
    /// A command already being handled is finished first.
    pub async fn run(
        self,
        mut commands: mpsc::Receiver<InboundCommand>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        tracing::info!("Command router started");

        loop {
            let inbound = tokio::select! {
                _ = shutdown.changed() => break,
                inbound = commands.recv() => match inbound {
                    Some(inbound) => inbound,
                    None => break,
                },
            };

            let _ = self.handle(&inbound).await;
        }

        tracing::info!("Command router stopped");
    }
}
