use std::sync::Mutex;

use crate::models::IndicatorState;

use super::Indicator;

/// Indicator for hosts without LEDs: state changes only show up in the log.
#[derive(Default)]
pub struct LogIndicator {
    current: Mutex<Option<IndicatorState>>,
}

impl LogIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<IndicatorState> {
        *self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Indicator for LogIndicator {
    fn set_indicator(&self, state: IndicatorState) {
        let mut current = self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if *current != Some(state) {
            tracing::info!("indicator: {}", state.as_str());
            *current = Some(state);
        }
    }

    fn release(&self) {
        let mut current = self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = None;

        tracing::debug!("indicator released");
    }
}
