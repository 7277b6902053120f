use chrono::{Duration, TimeZone, Utc};
use core_types::{Bar, CandleSeries};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// One-minute bars with highs half a point above and lows half a point below each close.
pub fn series_from_closes(closes: &[f64]) -> CandleSeries {
    let bars = closes
        .iter()
        .map(|&close| (close, close + 0.5, close - 0.5))
        .collect::<Vec<_>>();
    series_from_ohlc(&bars)
}

/// One-minute bars from `(close, high, low)` triples.
pub fn series_from_ohlc(rows: &[(f64, f64, f64)]) -> CandleSeries {
    let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let bars = rows
        .iter()
        .enumerate()
        .map(|(i, &(close, high, low))| {
            let close = Decimal::from_f64(close).unwrap();
            Bar {
                timestamp: start + Duration::minutes(i as i64),
                open: close,
                high: Decimal::from_f64(high).unwrap(),
                low: Decimal::from_f64(low).unwrap(),
                close,
                volume: Decimal::ONE,
            }
        })
        .collect();
    CandleSeries::new(bars).unwrap()
}
