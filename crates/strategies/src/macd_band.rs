use crate::band::detect_band;
use crate::error::StrategyError;
use crate::evaluator::evaluate;
use crate::indicators::compute_indicators;
use crate::{Evaluation, Strategy};
use configuration::MacdParams;
use core_types::CandleSeries;

/// MACD crossover strategy filtered by a recent support/resistance band.
#[derive(Debug, Clone)]
pub struct MacdBand {
    params: MacdParams,
}

impl MacdBand {
    /// Creates a new `MacdBand` instance with the given parameters.
    ///
    /// It performs validation to ensure the parameters are logical.
    pub fn new(params: MacdParams) -> Result<Self, StrategyError> {
        params.check().map_err(StrategyError::InvalidParameters)?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &MacdParams {
        &self.params
    }
}

impl Strategy for MacdBand {
    fn warm_up(&self) -> usize {
        self.params.warm_up()
    }

    fn evaluate(&self, series: &CandleSeries) -> Result<Evaluation, StrategyError> {
        let required = self.warm_up();
        if series.len() < required {
            return Err(StrategyError::InsufficientData {
                required,
                available: series.len(),
            });
        }

        let frame = compute_indicators(series, &self.params)?;
        let band = detect_band(series, self.params.band_window)?;
        let row = frame.latest().ok_or(StrategyError::InsufficientData {
            required,
            available: 0,
        })?;

        tracing::debug!(
            macd = row.macd,
            signal = row.signal,
            hist = row.hist,
            cross_up = row.macd_cross_up,
            cross_down = row.macd_cross_down,
            "MacdBand: latest indicator row"
        );
        tracing::debug!(
            resistance = band.resistance,
            support = band.support,
            close = row.close,
            "MacdBand: band levels"
        );

        let signal = evaluate(&row, &band, self.params.buy_reference);
        tracing::debug!(?signal, "MacdBand: decision");

        Ok(Evaluation { signal, row, band })
    }
}
