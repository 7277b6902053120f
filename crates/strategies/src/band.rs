use crate::error::StrategyError;
use crate::indicators::to_f64;
use core_types::CandleSeries;
use serde::Serialize;
use ta::indicators::{Maximum, Minimum};
use ta::Next;

/// Recent price extremes used as a context filter for the signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Band {
    /// Highest high over the trailing window.
    pub resistance: f64,
    /// Lowest low over the trailing window.
    pub support: f64,
}

/// Finds resistance and support over the trailing `window` bars of `series`.
///
/// A series shorter than `window` is an error rather than a narrower band.
pub fn detect_band(series: &CandleSeries, window: usize) -> Result<Band, StrategyError> {
    if window == 0 {
        return Err(StrategyError::InvalidParameters(
            "Band window must be greater than zero".to_string(),
        ));
    }
    if series.len() < window {
        return Err(StrategyError::InsufficientData {
            required: window,
            available: series.len(),
        });
    }

    let invalid = |_| StrategyError::InvalidParameters(format!("Invalid band window: {window}"));
    let mut highest = Maximum::new(window).map_err(invalid)?;
    let mut lowest = Minimum::new(window).map_err(invalid)?;

    let mut band = Band {
        resistance: f64::NEG_INFINITY,
        support: f64::INFINITY,
    };
    for bar in series.tail(window) {
        band.resistance = highest.next(to_f64(bar.high)?);
        band.support = lowest.next(to_f64(bar.low)?);
    }

    Ok(band)
}
