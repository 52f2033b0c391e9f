use serde::{Deserialize, Serialize};

/// Three-way classification of the latest temperature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndicatorState {
    Cold,
    Normal,
    Hot,
}

impl IndicatorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorState::Cold => "cold",
            IndicatorState::Normal => "normal",
            IndicatorState::Hot => "hot",
        }
    }
}

/// The safe temperature band shared by the indicator and the alerting.
///
/// Both bounds belong to the band: `Cold` iff `t < cold`, `Hot` iff `t > hot`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Lower bound in Celsius
    pub cold: f64,
    /// Upper bound in Celsius
    pub hot: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cold: 22.0,
            hot: 30.0,
        }
    }
}

impl Thresholds {
    pub fn classify(&self, temperature: f64) -> IndicatorState {
        if temperature < self.cold {
            IndicatorState::Cold
        } else if temperature > self.hot {
            IndicatorState::Hot
        } else {
            IndicatorState::Normal
        }
    }

    pub fn is_out_of_band(&self, temperature: f64) -> bool {
        temperature < self.cold || temperature > self.hot
    }
}
