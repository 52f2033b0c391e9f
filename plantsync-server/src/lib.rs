use std::sync::Arc;

use crate::app::App;
use crate::configs::Settings;

pub mod app;
pub mod configs;
pub mod errors;
pub mod models;
pub mod repositories;
pub mod services;

/// Runs the service until Ctrl-C.
pub async fn run(settings: &Arc<Settings>) -> anyhow::Result<()> {
    let app = App::start(settings).await?;

    tracing::info!("plantsync running, sampling every {}s", settings.sampling.interval_secs);

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for the shutdown signal: {}", e);
    }

    app.shutdown().await;

    Ok(())
}

#[cfg(test)]
pub mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::configs::{Database, SchemaManager, Storage};
    use crate::errors::{DeliveryError, SensorError};
    use crate::models::{Measurement, UserId};
    use crate::services::{Messenger, Sensor};

    pub async fn setup_test_db() -> Arc<Storage> {
        Arc::new(
            Storage::new(
                Database {
                    clean_start: true,
                    url: String::from("sqlite::memory:"),
                },
                SchemaManager::default(),
            )
            .await
            .unwrap(),
        )
    }

    /// Returns the scripted results in order, then fails.
    pub struct ScriptedSensor {
        results: VecDeque<Result<Measurement, SensorError>>,
        pub reads: Arc<AtomicUsize>,
    }

    impl ScriptedSensor {
        pub fn new(results: Vec<Result<Measurement, SensorError>>) -> Self {
            Self {
                results: results.into(),
                reads: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl Sensor for ScriptedSensor {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn read(&mut self) -> Result<Measurement, SensorError> {
            self.reads.fetch_add(1, Ordering::SeqCst);

            self.results
                .pop_front()
                .unwrap_or(Err(SensorError::NotInitialized))
        }
    }

    #[derive(Default)]
    pub struct RecordingMessenger {
        sent: Mutex<Vec<(UserId, String)>>,
        acknowledged: Mutex<Vec<String>>,
        answered: Mutex<Vec<(String, String)>>,
        failing: AtomicBool,
    }

    impl RecordingMessenger {
        pub fn fail_deliveries(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn sent(&self) -> Vec<(UserId, String)> {
            self.sent.lock().unwrap().clone()
        }

        pub fn acknowledged(&self) -> Vec<String> {
            self.acknowledged.lock().unwrap().clone()
        }

        pub fn answered(&self) -> Vec<(String, String)> {
            self.answered.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Messenger for RecordingMessenger {
        async fn send_message(&self, user: UserId, text: &str) -> Result<(), DeliveryError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(DeliveryError::ChannelClosed);
            }

            self.sent.lock().unwrap().push((user, text.to_string()));
            Ok(())
        }

        async fn acknowledge(&self, callback_id: &str) -> Result<(), DeliveryError> {
            self.acknowledged.lock().unwrap().push(callback_id.to_string());
            Ok(())
        }

        async fn answer_callback(
            &self,
            _user: UserId,
            callback_id: &str,
            text: &str,
        ) -> Result<(), DeliveryError> {
            self.answered
                .lock()
                .unwrap()
                .push((callback_id.to_string(), text.to_string()));
            Ok(())
        }
    }
}
