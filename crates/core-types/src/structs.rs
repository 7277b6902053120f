use crate::enums::OrderSide;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single OHLCV candle. Immutable once produced by the market data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// The open time of the bar.
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// The current top of book for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub bid: Decimal,
    pub ask: Decimal,
}

impl Quote {
    /// The price an order on `side` would reference: buys lift the ask, sells hit the bid.
    pub fn price_for(&self, side: OrderSide) -> Decimal {
        match side {
            OrderSide::Buy => self.ask,
            OrderSide::Sell => self.bid,
        }
    }
}

/// An open position as reported by the venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: OrderSide,
    pub volume: Decimal,
    pub open_price: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub unrealized_pnl: Decimal,
}

/// A market order submitted together with its protective stop-loss and take-profit levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketOrder {
    pub client_order_id: Uuid,
    pub symbol: String,
    pub side: OrderSide,
    pub volume: Decimal,
    /// The bid or ask the entry was priced against.
    pub reference_price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Filled,
    Accepted,
}

/// The outcome of a successfully submitted bracket order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    pub client_order_id: Uuid,
    /// The venue's identifier for the entry order.
    pub order_id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub status: OrderStatus,
    pub filled_volume: Decimal,
    pub price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub timestamp: DateTime<Utc>,
}
