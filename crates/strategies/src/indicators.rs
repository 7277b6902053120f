//! MACD indicator engine.
//!
//! Every poll recomputes the whole frame from the fetched series; nothing is
//! carried between cycles.

use crate::error::StrategyError;
use configuration::MacdParams;
use core_types::CandleSeries;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use ta::{Next, Reset};

/// Crossover detection needs one prior sample.
pub const MIN_BARS: usize = 2;

/// Exponential moving average seeded with the first input (pandas `adjust=False`).
///
/// `ema[0] = x[0]`, then `ema[i] = ema[i-1] + α·(x[i] - ema[i-1])` with `α = 2/(period+1)`.
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f64,
    current: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Result<Self, StrategyError> {
        if period == 0 {
            return Err(StrategyError::InvalidParameters(
                "EMA period must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            alpha: 2.0 / (period as f64 + 1.0),
            current: None,
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl Next<f64> for Ema {
    type Output = f64;

    fn next(&mut self, input: f64) -> f64 {
        let value = match self.current {
            None => input,
            Some(prev) => prev + self.alpha * (input - prev),
        };
        self.current = Some(value);
        value
    }
}

impl Reset for Ema {
    fn reset(&mut self) {
        self.current = None;
    }
}

/// Indicator columns aligned index-for-index with the series they were computed from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorFrame {
    pub close: Vec<f64>,
    pub ema_fast: Vec<f64>,
    pub ema_slow: Vec<f64>,
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub hist: Vec<f64>,
    pub macd_cross_up: Vec<bool>,
    pub macd_cross_down: Vec<bool>,
}

/// A single index of an [`IndicatorFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorRow {
    pub close: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub macd: f64,
    pub signal: f64,
    pub hist: f64,
    pub macd_cross_up: bool,
    pub macd_cross_down: bool,
}

impl IndicatorFrame {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            close: Vec::with_capacity(capacity),
            ema_fast: Vec::with_capacity(capacity),
            ema_slow: Vec::with_capacity(capacity),
            macd: Vec::with_capacity(capacity),
            signal: Vec::with_capacity(capacity),
            hist: Vec::with_capacity(capacity),
            macd_cross_up: Vec::with_capacity(capacity),
            macd_cross_down: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<IndicatorRow> {
        if index >= self.len() {
            return None;
        }
        Some(IndicatorRow {
            close: self.close[index],
            ema_fast: self.ema_fast[index],
            ema_slow: self.ema_slow[index],
            macd: self.macd[index],
            signal: self.signal[index],
            hist: self.hist[index],
            macd_cross_up: self.macd_cross_up[index],
            macd_cross_down: self.macd_cross_down[index],
        })
    }

    /// The most recent row, the only one the signal evaluator looks at.
    pub fn latest(&self) -> Option<IndicatorRow> {
        self.len().checked_sub(1).and_then(|index| self.row(index))
    }
}

pub(crate) fn to_f64(value: Decimal) -> Result<f64, StrategyError> {
    value
        .to_f64()
        .ok_or_else(|| StrategyError::IndicatorError(format!("{value} is not representable as f64")))
}

/// Computes fast/slow EMAs, MACD, signal line, histogram and crossover flags over `series`.
pub fn compute_indicators(
    series: &CandleSeries,
    params: &MacdParams,
) -> Result<IndicatorFrame, StrategyError> {
    if series.len() < MIN_BARS {
        return Err(StrategyError::InsufficientData {
            required: MIN_BARS,
            available: series.len(),
        });
    }

    let mut fast = Ema::new(params.fast_period)?;
    let mut slow = Ema::new(params.slow_period)?;
    let mut signal_line = Ema::new(params.signal_period)?;
    let mut frame = IndicatorFrame::with_capacity(series.len());

    for bar in series {
        let close = to_f64(bar.close)?;
        let ema_fast = fast.next(close);
        let ema_slow = slow.next(close);
        let macd = ema_fast - ema_slow;
        let signal = signal_line.next(macd);

        let (cross_up, cross_down) = match (frame.macd.last(), frame.signal.last()) {
            (Some(&prev_macd), Some(&prev_signal)) => (
                macd > signal && prev_macd <= prev_signal,
                macd < signal && prev_macd >= prev_signal,
            ),
            _ => (false, false),
        };

        frame.close.push(close);
        frame.ema_fast.push(ema_fast);
        frame.ema_slow.push(ema_slow);
        frame.macd.push(macd);
        frame.signal.push(signal);
        frame.hist.push(macd - signal);
        frame.macd_cross_up.push(cross_up);
        frame.macd_cross_down.push(cross_down);
    }

    Ok(frame)
}
