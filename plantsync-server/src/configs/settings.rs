use std::env;
use std::time::Duration;

use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use config::builder::DefaultState;
use serde::{Deserialize, Serialize};

use crate::models::{Thresholds, UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sampling {
    /// Seconds between two ticks of the measurement loop
    pub interval_secs: u64,
    /// Below this temperature (Celsius) the reading is cold
    pub cold_threshold: f64,
    /// Above this temperature (Celsius) the reading is hot
    pub hot_threshold: f64,
}

impl Sampling {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            cold: self.cold_threshold,
            hot: self.hot_threshold,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub clean_start: bool,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Telegram {
    pub enabled: bool,
    pub token: String,
    /// The only user allowed to issue commands and receive alerts
    pub authorized_user: UserId,
    pub api_url: String,
    /// Long polling timeout passed to `getUpdates`
    pub poll_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Simulated,
    Bme280,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    Log,
    Gpio,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hardware {
    pub sensor: SensorKind,
    pub i2c_bus: u8,
    pub i2c_address: u16,
    pub indicator: IndicatorKind,
    pub red_pin: u8,
    pub green_pin: u8,
    pub blue_pin: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub sampling: Sampling,
    pub database: Database,
    pub telegram: Telegram,
    pub hardware: Hardware,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        Self::build(
            Config::builder()
                .add_source(File::with_name("configs/default"))
                .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
                .add_source(Environment::with_prefix("PLANTSYNC").separator("__")),
        )
    }

    /// Loads settings from a single TOML document, without environment overrides.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Self::build(Config::builder().add_source(File::from_str(content, FileFormat::Toml)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;

        settings.validate()?;

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.sampling.interval_secs == 0 {
            return Err(ConfigError::Message(
                "sampling.interval_secs must be greater than zero".into(),
            ));
        }

        let thresholds = self.sampling.thresholds();
        if !thresholds.cold.is_finite() || !thresholds.hot.is_finite() {
            return Err(ConfigError::Message("thresholds must be finite".into()));
        }
        if thresholds.cold > thresholds.hot {
            return Err(ConfigError::Message(format!(
                "cold threshold {} is above hot threshold {}",
                thresholds.cold, thresholds.hot
            )));
        }

        if self.telegram.enabled && self.telegram.token.trim().is_empty() {
            return Err(ConfigError::Message(
                "telegram.token is required when telegram is enabled".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [logger]
        level = "debug"

        [sampling]
        interval_secs = 1200
        cold_threshold = 22.0
        hot_threshold = 30.0

        [database]
        clean_start = false
        url = "sqlite::memory:"

        [telegram]
        enabled = true
        token = "123:abc"
        authorized_user = 154966995
        api_url = "https://api.telegram.org"
        poll_timeout_secs = 30

        [hardware]
        sensor = "bme280"
        i2c_bus = 1
        i2c_address = 118
        indicator = "gpio"
        red_pin = 17
        green_pin = 27
        blue_pin = 22
    "#;

    #[test]
    fn test_parse_settings() {
        let settings = Settings::from_toml(SAMPLE).unwrap();

        assert_eq!(settings.sampling.interval(), Duration::from_secs(1200));
        assert_eq!(settings.sampling.thresholds(), Thresholds::default());
        assert_eq!(settings.telegram.authorized_user, 154966995);
        assert_eq!(settings.hardware.sensor, SensorKind::Bme280);
        assert_eq!(settings.hardware.indicator, IndicatorKind::Gpio);
        assert_eq!(settings.hardware.i2c_address, 0x76);
    }

    #[test]
    fn test_reject_zero_interval() {
        let content = SAMPLE.replace("interval_secs = 1200", "interval_secs = 0");

        assert!(Settings::from_toml(&content).is_err());
    }

    #[test]
    fn test_reject_inverted_thresholds() {
        let content = SAMPLE.replace("cold_threshold = 22.0", "cold_threshold = 31.0");

        assert!(Settings::from_toml(&content).is_err());
    }

    #[test]
    fn test_reject_missing_token() {
        let content = SAMPLE.replace("token = \"123:abc\"", "token = \"\"");

        assert!(Settings::from_toml(&content).is_err());
    }
}
