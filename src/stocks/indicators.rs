//! Price change and trend classification.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IndicatorError {
    #[error("cannot compute a change from a reference price of {0}")]
    InvalidReference(f64),

    #[error("price is not a finite number: {0}")]
    NotFinite(f64),
}

/// Direction of a price move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

impl Trend {
    pub fn from_change(percent: f64) -> Self {
        if percent > 0.0 {
            Trend::Bullish
        } else if percent < 0.0 {
            Trend::Bearish
        } else {
            Trend::Neutral
        }
    }
}

/// Percentage change from `reference` to `current`, rounded to two decimals.
pub fn percentage_change(reference: f64, current: f64) -> Result<f64, IndicatorError> {
    if !current.is_finite() {
        return Err(IndicatorError::NotFinite(current));
    }
    if !reference.is_finite() || reference <= 0.0 {
        return Err(IndicatorError::InvalidReference(reference));
    }
    let change = (current - reference) / reference * 100.0;
    Ok((change * 100.0).round() / 100.0)
}
