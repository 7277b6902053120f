use crate::band::Band;
use crate::indicators::IndicatorRow;
use core_types::{BandReference, Signal};

/// Turns the latest indicator row and the current band into a trading decision.
///
/// Sell is checked first: a fresh death cross with a negative histogram while
/// the close is under resistance. Buy needs a fresh golden cross, a positive
/// histogram and a close above the `buy_reference` level (support by default).
pub fn evaluate(row: &IndicatorRow, band: &Band, buy_reference: BandReference) -> Signal {
    let buy_level = match buy_reference {
        BandReference::Support => band.support,
        BandReference::Resistance => band.resistance,
    };

    if row.macd_cross_down && row.hist < 0.0 && row.close < band.resistance {
        Signal::Sell
    } else if row.macd_cross_up && row.hist > 0.0 && row.close > buy_level {
        Signal::Buy
    } else {
        Signal::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BAND: Band = Band {
        resistance: 110.0,
        support: 90.0,
    };

    fn row(close: f64, hist: f64, cross_up: bool, cross_down: bool) -> IndicatorRow {
        IndicatorRow {
            close,
            ema_fast: 0.0,
            ema_slow: 0.0,
            macd: hist,
            signal: 0.0,
            hist,
            macd_cross_up: cross_up,
            macd_cross_down: cross_down,
        }
    }

    #[test]
    fn death_cross_below_resistance_sells() {
        let r = row(100.0, -0.2, false, true);
        assert_eq!(evaluate(&r, &BAND, BandReference::Support), Signal::Sell);
    }

    #[test]
    fn death_cross_at_resistance_does_not_sell() {
        let r = row(110.0, -0.2, false, true);
        assert_eq!(evaluate(&r, &BAND, BandReference::Support), Signal::None);
    }

    #[test]
    fn golden_cross_above_support_buys() {
        let r = row(100.0, 0.3, true, false);
        assert_eq!(evaluate(&r, &BAND, BandReference::Support), Signal::Buy);
    }

    #[test]
    fn golden_cross_needs_positive_histogram() {
        let r = row(100.0, 0.0, true, false);
        assert_eq!(evaluate(&r, &BAND, BandReference::Support), Signal::None);
    }

    #[test]
    fn histogram_sign_without_fresh_cross_is_ignored() {
        assert_eq!(
            evaluate(&row(100.0, 0.3, false, false), &BAND, BandReference::Support),
            Signal::None
        );
        assert_eq!(
            evaluate(&row(100.0, -0.3, false, false), &BAND, BandReference::Support),
            Signal::None
        );
    }

    #[test]
    fn resistance_reference_requires_breakout_for_buys() {
        let inside = row(100.0, 0.3, true, false);
        assert_eq!(evaluate(&inside, &BAND, BandReference::Resistance), Signal::None);

        let breakout = row(111.0, 0.3, true, false);
        assert_eq!(evaluate(&breakout, &BAND, BandReference::Resistance), Signal::Buy);
    }

    #[test]
    fn identical_inputs_give_identical_output() {
        let r = row(100.0, -0.2, false, true);
        let first = evaluate(&r, &BAND, BandReference::Support);
        for _ in 0..10 {
            assert_eq!(evaluate(&r, &BAND, BandReference::Support), first);
        }
    }
}
