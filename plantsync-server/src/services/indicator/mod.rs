#[cfg(feature = "hardware")]
mod gpio;
mod log;

#[cfg(feature = "hardware")]
pub use gpio::GpioIndicator;
pub use log::LogIndicator;

use crate::models::IndicatorState;

/// Three-state visual output. Exactly one state is shown at a time.
pub trait Indicator: Send + Sync {
    /// Shows `state`; idempotent.
    fn set_indicator(&self, state: IndicatorState);

    /// Turns every output off. Called once on shutdown.
    fn release(&self) {}
}
