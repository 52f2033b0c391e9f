use std::sync::Mutex;

use rppal::gpio::{Gpio, OutputPin};

use crate::models::IndicatorState;

use super::Indicator;

struct Pins {
    red: OutputPin,
    green: OutputPin,
    blue: OutputPin,
}

/// RGB LED on three BCM pins: blue for cold, green for normal, red for hot.
pub struct GpioIndicator {
    pins: Mutex<Pins>,
}

impl GpioIndicator {
    pub fn open(red: u8, green: u8, blue: u8) -> Result<Self, rppal::gpio::Error> {
        let gpio = Gpio::new()?;

        let mut pins = Pins {
            red: gpio.get(red)?.into_output_low(),
            green: gpio.get(green)?.into_output_low(),
            blue: gpio.get(blue)?.into_output_low(),
        };
        // Leave the LED dark after the process exits
        pins.red.set_reset_on_drop(true);
        pins.green.set_reset_on_drop(true);
        pins.blue.set_reset_on_drop(true);

        tracing::info!("indicator on BCM pins r={} g={} b={}", red, green, blue);

        Ok(Self {
            pins: Mutex::new(pins),
        })
    }
}

impl Indicator for GpioIndicator {
    fn set_indicator(&self, state: IndicatorState) {
        let mut pins = self.pins.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        pins.red.set_low();
        pins.green.set_low();
        pins.blue.set_low();

        match state {
            IndicatorState::Cold => pins.blue.set_high(),
            IndicatorState::Normal => pins.green.set_high(),
            IndicatorState::Hot => pins.red.set_high(),
        }
    }

    fn release(&self) {
        let mut pins = self.pins.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        pins.red.set_low();
        pins.green.set_low();
        pins.blue.set_low();
    }
}
