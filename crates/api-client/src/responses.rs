use crate::error::ApiError;
use chrono::{TimeZone, Utc};
use core_types::{Bar, OrderSide, Position, Quote};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

// Using `#[serde(rename_all = "camelCase")]` to automatically map from JSON camelCase to Rust snake_case.

/// One row of `GET /fapi/v1/klines`: a positional array of open time, OHLCV strings and more.
#[derive(Debug, Deserialize)]
pub struct RawKline(
    pub i64,
    pub String,
    pub String,
    pub String,
    pub String,
    pub String,
    pub i64,
    pub String,
    pub i64,
    pub String,
    pub String,
    pub String,
);

fn decimal(field: &str, raw: &str) -> Result<Decimal, ApiError> {
    Decimal::from_str(raw)
        .map_err(|e| ApiError::Deserialization(format!("{field} '{raw}': {e}")))
}

impl TryFrom<RawKline> for Bar {
    type Error = ApiError;

    fn try_from(raw: RawKline) -> Result<Self, Self::Error> {
        Ok(Bar {
            timestamp: Utc
                .timestamp_millis_opt(raw.0)
                .single()
                .ok_or_else(|| ApiError::InvalidData(format!("Invalid open_time: {}", raw.0)))?,
            open: decimal("open", &raw.1)?,
            high: decimal("high", &raw.2)?,
            low: decimal("low", &raw.3)?,
            close: decimal("close", &raw.4)?,
            volume: decimal("volume", &raw.5)?,
        })
    }
}

/// `GET /fapi/v1/exchangeInfo`, reduced to the per-symbol trading status.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeInfoResponse {
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    pub status: String,
}

impl ExchangeInfoResponse {
    /// `None` if the venue does not list `symbol` at all.
    pub fn is_trading(&self, symbol: &str) -> Option<bool> {
        self.symbols
            .iter()
            .find(|info| info.symbol == symbol)
            .map(|info| info.status == "TRADING")
    }
}

/// `GET /fapi/v1/ticker/bookTicker`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookTickerResponse {
    pub symbol: String,
    pub bid_price: Decimal,
    pub ask_price: Decimal,
}

impl From<BookTickerResponse> for Quote {
    fn from(ticker: BookTickerResponse) -> Self {
        Quote {
            bid: ticker.bid_price,
            ask: ticker.ask_price,
        }
    }
}

/// The response from a successful `POST /fapi/v1/order` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub client_order_id: String,
    pub order_id: i64,
    pub symbol: String,
    pub status: String,
    #[serde(default)]
    pub avg_price: Decimal,
    pub executed_qty: Decimal,
    pub orig_qty: Decimal,
    #[serde(rename = "type")]
    pub order_type: String,
    // There are more fields, but these are the most important for us.
}

/// A single entry from `GET /fapi/v2/positionRisk`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionResponse {
    pub symbol: String,
    pub position_amt: Decimal,
    pub entry_price: Decimal,
    pub un_realized_profit: Decimal,
}

impl PositionResponse {
    /// Converts a non-flat entry into a `Position`. Flat entries map to `None`.
    pub fn into_position(self) -> Option<Position> {
        if self.position_amt.is_zero() {
            return None;
        }
        let side = if self.position_amt.is_sign_positive() {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        };
        Some(Position {
            symbol: self.symbol,
            side,
            volume: self.position_amt.abs(),
            open_price: self.entry_price,
            stop_loss: None,
            take_profit: None,
            unrealized_pnl: self.un_realized_profit,
        })
    }
}

/// Represents an error response from the Binance API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub code: i64,
    pub msg: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_kline_rows_into_bars() {
        let json = r#"[[1700000000000,"100.10","101.00","99.50","100.75","12.5",1700000059999,"1259.3",42,"6.1","614.2","0"]]"#;
        let rows: Vec<RawKline> = serde_json::from_str(json).unwrap();
        let bar = Bar::try_from(rows.into_iter().next().unwrap()).unwrap();
        assert_eq!(bar.timestamp.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(bar.open, dec!(100.10));
        assert_eq!(bar.high, dec!(101.00));
        assert_eq!(bar.low, dec!(99.50));
        assert_eq!(bar.close, dec!(100.75));
        assert_eq!(bar.volume, dec!(12.5));
    }

    #[test]
    fn rejects_malformed_prices() {
        let raw = RawKline(
            0,
            "x".into(),
            "1".into(),
            "1".into(),
            "1".into(),
            "1".into(),
            0,
            "0".into(),
            0,
            "0".into(),
            "0".into(),
            "0".into(),
        );
        assert!(matches!(Bar::try_from(raw), Err(ApiError::Deserialization(_))));
    }

    #[test]
    fn trading_status_lookup() {
        let json = r#"{"symbols":[{"symbol":"BTCUSDT","status":"TRADING"},{"symbol":"ETHUSDT","status":"SETTLING"}]}"#;
        let info: ExchangeInfoResponse = serde_json::from_str(json).unwrap();
        assert_eq!(info.is_trading("BTCUSDT"), Some(true));
        assert_eq!(info.is_trading("ETHUSDT"), Some(false));
        assert_eq!(info.is_trading("XAUUSD"), None);
    }

    #[test]
    fn short_positions_have_sell_side() {
        let json = r#"[
            {"symbol":"BTCUSDT","positionAmt":"-0.100","entryPrice":"42000.5","unRealizedProfit":"-3.2"},
            {"symbol":"ETHUSDT","positionAmt":"0.000","entryPrice":"0.0","unRealizedProfit":"0.0"}
        ]"#;
        let raw: Vec<PositionResponse> = serde_json::from_str(json).unwrap();
        let positions: Vec<Position> = raw.into_iter().filter_map(PositionResponse::into_position).collect();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].side, OrderSide::Sell);
        assert_eq!(positions[0].volume, dec!(0.100));
        assert_eq!(positions[0].open_price, dec!(42000.5));
    }

    #[test]
    fn book_ticker_becomes_quote() {
        let json = r#"{"symbol":"BTCUSDT","bidPrice":"99.9","bidQty":"1","askPrice":"100.1","askQty":"2","time":1}"#;
        let quote: Quote = serde_json::from_str::<BookTickerResponse>(json).unwrap().into();
        assert_eq!(quote.bid, dec!(99.9));
        assert_eq!(quote.ask, dec!(100.1));
    }
}
