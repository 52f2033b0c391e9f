use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use plantsync_server::app::{App, Components};
use plantsync_server::configs::{Database, SchemaManager, Storage};
use plantsync_server::errors::{DeliveryError, SensorError};
use plantsync_server::models::{IndicatorState, Measurement, Thresholds, UserId};
use plantsync_server::repositories::{EventRepository, ReadingRepository};
use plantsync_server::services::{
    Aggregator, CommandRouter, Indicator, MeasurementLoop, Messenger, Notifier, Sensor,
    SharedSensor,
};

pub const PRINCIPAL: UserId = 154966995;
pub const STRANGER: UserId = 42;

pub fn measurement(temperature: f64) -> Measurement {
    Measurement {
        temperature,
        humidity: 55.0,
        pressure: 1013.25,
    }
}

/// Start and end of one sensor read.
pub type ReadSpan = (Instant, Instant);

/// Sensor that plays back a script, then repeats `fallback` (or fails).
pub struct MockSensor {
    script: VecDeque<Result<Measurement, SensorError>>,
    fallback: Option<Measurement>,
    delay: Duration,
    reads: Arc<AtomicUsize>,
    spans: Arc<Mutex<Vec<ReadSpan>>>,
}

impl MockSensor {
    pub fn scripted(script: Vec<Result<Measurement, SensorError>>) -> Self {
        Self {
            script: script.into(),
            fallback: None,
            delay: Duration::ZERO,
            reads: Arc::default(),
            spans: Arc::default(),
        }
    }

    pub fn steady(temperature: f64) -> Self {
        Self {
            fallback: Some(measurement(temperature)),
            ..Self::scripted(vec![])
        }
    }

    /// Every read takes `delay` before answering.
    pub fn slow(temperature: f64, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::steady(temperature)
        }
    }

    pub fn failing() -> Self {
        Self::scripted(vec![])
    }
}

#[async_trait]
impl Sensor for MockSensor {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn read(&mut self) -> Result<Measurement, SensorError> {
        let started = Instant::now();
        self.reads.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let result = match self.script.pop_front() {
            Some(result) => result,
            None => self
                .fallback
                .ok_or_else(|| SensorError::Communication(String::from("bus error"))),
        };

        self.spans.lock().unwrap().push((started, Instant::now()));
        result
    }
}

#[derive(Default)]
pub struct RecordingIndicator {
    updates: Mutex<Vec<IndicatorState>>,
    released: AtomicBool,
}

impl RecordingIndicator {
    pub fn updates(&self) -> Vec<IndicatorState> {
        self.updates.lock().unwrap().clone()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl Indicator for RecordingIndicator {
    fn set_indicator(&self, state: IndicatorState) {
        self.updates.lock().unwrap().push(state);
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
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

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text)| text).collect()
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
            return Err(DeliveryError::Rejected {
                code: 403,
                description: String::from("Forbidden: bot was blocked by the user"),
            });
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

pub struct MockApp {
    pub storage: Arc<Storage>,
    pub store: Arc<ReadingRepository>,
    pub events: EventRepository,
    pub indicator: Arc<RecordingIndicator>,
    pub messenger: Arc<RecordingMessenger>,
    pub sensor_reads: Arc<AtomicUsize>,
    pub read_spans: Arc<Mutex<Vec<ReadSpan>>>,
    sensor: SharedSensor,
}

impl MockApp {
    pub async fn new(sensor: MockSensor) -> Self {
        let storage = Arc::new(
            Storage::new(
                Database {
                    clean_start: true,
                    url: String::from("sqlite::memory:"),
                },
                SchemaManager::default(),
            )
            .await
            .unwrap(),
        );

        Self {
            store: Arc::new(ReadingRepository::new(storage.clone())),
            events: EventRepository::new(storage.clone()),
            indicator: Arc::default(),
            messenger: Arc::default(),
            sensor_reads: sensor.reads.clone(),
            read_spans: sensor.spans.clone(),
            sensor: SharedSensor::new(sensor),
            storage,
        }
    }

    pub fn notifier(&self) -> Notifier {
        Notifier::new(self.messenger.clone()).with_events(self.events.clone())
    }

    pub fn measurement_loop(&self) -> MeasurementLoop {
        MeasurementLoop::new(
            self.sensor.clone(),
            self.store.clone(),
            self.indicator.clone(),
            self.notifier(),
            PRINCIPAL,
            Thresholds::default(),
            Duration::from_secs(1200),
        )
    }

    pub fn router(&self) -> CommandRouter {
        CommandRouter::new(
            PRINCIPAL,
            self.sensor.clone(),
            Aggregator::new(self.store.clone()),
            self.notifier(),
        )
    }

    pub fn launch(&self, interval: Duration) -> App {
        App::launch(Components {
            sensor: self.sensor.clone(),
            store: self.store.clone(),
            indicator: self.indicator.clone(),
            messenger: self.messenger.clone(),
            events: Some(self.events.clone()),
            principal: PRINCIPAL,
            thresholds: Thresholds::default(),
            interval,
        })
    }

    pub fn reads(&self) -> usize {
        self.sensor_reads.load(Ordering::SeqCst)
    }

    pub fn read_spans(&self) -> Vec<ReadSpan> {
        self.read_spans.lock().unwrap().clone()
    }

    pub async fn stored(&self) -> i64 {
        self.store.count().await.unwrap()
    }
}
