use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::configs::{Hardware, IndicatorKind, SchemaManager, SensorKind, Settings, Storage};
use crate::models::{InboundCommand, Thresholds, UserId};
use crate::repositories::{EventRepository, ReadingRepository, SampleStore};
use crate::services::*;

const COMMAND_QUEUE: usize = 32;

/// Everything the two core tasks need, already constructed.
pub struct Components {
    pub sensor: SharedSensor,
    pub store: Arc<dyn SampleStore>,
    pub indicator: Arc<dyn Indicator>,
    pub messenger: Arc<dyn Messenger>,
    pub events: Option<EventRepository>,
    pub principal: UserId,
    pub thresholds: Thresholds,
    pub interval: Duration,
}

/// The running service: the measurement loop, the command router and any
/// transport tasks, plus what must be released when they stop.
pub struct App {
    shutdown: watch::Sender<bool>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
    commands: mpsc::Sender<InboundCommand>,
    indicator: Arc<dyn Indicator>,
    storage: Option<Arc<Storage>>,
}

impl App {
    /// Builds every adapter from `settings` and starts the service.
    pub async fn start(settings: &Settings) -> anyhow::Result<Self> {
        let storage = Arc::new(
            Storage::new(settings.database.clone(), SchemaManager::default())
                .await
                .context("Failed to open the database")?,
        );

        let readings = Arc::new(ReadingRepository::new(storage.clone()));
        match readings.find_latest().await? {
            Some(latest) => tracing::info!(
                "{} readings stored, latest at {}",
                readings.count().await?,
                latest.timestamp
            ),
            None => tracing::info!("No readings stored yet"),
        }

        let sensor = open_sensor(&settings.hardware)?;
        let indicator = open_indicator(&settings.hardware)?;

        let bot = if settings.telegram.enabled {
            let bot = Arc::new(TelegramBot::new(&settings.telegram)?);
            let me = bot
                .get_me()
                .await
                .context("Failed to reach the Telegram Bot API")?;

            tracing::info!(
                "Connected to Telegram as @{}",
                me.username.as_deref().unwrap_or("unknown")
            );
            Some(bot)
        } else {
            tracing::info!("Telegram disabled, messages go to the log");
            None
        };

        let messenger: Arc<dyn Messenger> = match &bot {
            Some(bot) => bot.clone() as Arc<dyn Messenger>,
            None => Arc::new(LogMessenger),
        };

        let mut app = Self::launch(Components {
            sensor,
            store: readings,
            indicator,
            messenger,
            events: Some(EventRepository::new(storage.clone())),
            principal: settings.telegram.authorized_user,
            thresholds: settings.sampling.thresholds(),
            interval: settings.sampling.interval(),
        });
        app.storage = Some(storage);

        if let Some(bot) = bot {
            let commands = app.inbound();
            let shutdown = app.shutdown.subscribe();
            app.spawn("telegram poller", bot.poll(commands, shutdown));
        }

        Ok(app)
    }

    /// Starts the measurement loop and the command router over `components`.
    pub fn launch(components: Components) -> Self {
        let (shutdown, _) = watch::channel(false);
        let (commands, receiver) = mpsc::channel(COMMAND_QUEUE);

        let mut notifier = Notifier::new(components.messenger);
        if let Some(events) = components.events {
            notifier = notifier.with_events(events);
        }

        let measurement_loop = MeasurementLoop::new(
            components.sensor.clone(),
            components.store.clone(),
            components.indicator.clone(),
            notifier.clone(),
            components.principal,
            components.thresholds,
            components.interval,
        );
        let router = CommandRouter::new(
            components.principal,
            components.sensor,
            Aggregator::new(components.store),
            notifier,
        );

        let mut app = Self {
            shutdown,
            tasks: Vec::new(),
            commands,
            indicator: components.indicator,
            storage: None,
        };

        let stop = app.shutdown.subscribe();
        app.spawn("measurement loop", measurement_loop.run(stop));
        let stop = app.shutdown.subscribe();
        app.spawn("command router", router.run(receiver, stop));

        app
    }

    /// Sender for commands arriving from a transport.
    pub fn inbound(&self) -> mpsc::Sender<InboundCommand> {
        self.commands.clone()
    }

    pub fn spawn<F>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::debug!("Spawning {}", name);

        self.tasks.push((name, tokio::spawn(task)));
    }

    /// Signals every task, waits for in-flight work to finish, then switches
    /// the indicator off and closes the database.
    pub async fn shutdown(self) {
        tracing::info!("Shutting down");

        let _ = self.shutdown.send(true);

        for (name, handle) in self.tasks {
            if let Err(e) = handle.await {
                tracing::error!("{} ended abnormally: {}", name, e);
            }
        }

        self.indicator.release();

        if let Some(storage) = self.storage {
            storage.close().await;
        }

        tracing::info!("Shutdown complete");
    }
}

fn open_sensor(hardware: &Hardware) -> anyhow::Result<SharedSensor> {
    match hardware.sensor {
        SensorKind::Simulated => Ok(SharedSensor::new(SimulatedSensor::new())),
        #[cfg(feature = "hardware")]
        SensorKind::Bme280 => Ok(SharedSensor::new(
            Bme280Sensor::open(hardware.i2c_bus, hardware.i2c_address)
                .context("Failed to open the BME280 sensor")?,
        )),
        #[cfg(not(feature = "hardware"))]
        SensorKind::Bme280 => {
            anyhow::bail!("sensor \"bme280\" requires the \"hardware\" feature")
        }
    }
}

fn open_indicator(hardware: &Hardware) -> anyhow::Result<Arc<dyn Indicator>> {
    match hardware.indicator {
        IndicatorKind::Log => Ok(Arc::new(LogIndicator::new())),
        #[cfg(feature = "hardware")]
        IndicatorKind::Gpio => Ok(Arc::new(
            GpioIndicator::open(hardware.red_pin, hardware.green_pin, hardware.blue_pin)
                .context("Failed to open the indicator pins")?,
        )),
        #[cfg(not(feature = "hardware"))]
        IndicatorKind::Gpio => {
            anyhow::bail!("indicator \"gpio\" requires the \"hardware\" feature")
        }
    }
}
