use crate::error::ApiError;
use crate::responses::OrderResponse;
use async_trait::async_trait;
use chrono::Utc;
use core_types::{BracketOrder, OrderResult, OrderStatus};
use rust_decimal::Decimal;
use std::fmt;

/// One of the two protective legs that follow a bracket's market entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitLeg {
    StopLoss,
    TakeProfit,
}

impl ExitLeg {
    pub const ALL: [ExitLeg; 2] = [ExitLeg::StopLoss, ExitLeg::TakeProfit];

    /// The venue order type used for this leg.
    pub fn order_type(self) -> &'static str {
        match self {
            ExitLeg::StopLoss => "STOP_MARKET",
            ExitLeg::TakeProfit => "TAKE_PROFIT_MARKET",
        }
    }

    pub fn trigger(self, order: &BracketOrder) -> Decimal {
        match self {
            ExitLeg::StopLoss => order.stop_loss,
            ExitLeg::TakeProfit => order.take_profit,
        }
    }
}

impl fmt::Display for ExitLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitLeg::StopLoss => write!(f, "stop-loss"),
            ExitLeg::TakeProfit => write!(f, "take-profit"),
        }
    }
}

/// The individual order requests a bracket is assembled from.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Sends the MARKET entry.
    async fn submit_entry(&self, order: &BracketOrder) -> Result<OrderResponse, ApiError>;

    /// Sends one protective leg on the side opposite the entry.
    async fn submit_exit_leg(
        &self,
        order: &BracketOrder,
        leg: ExitLeg,
    ) -> Result<OrderResponse, ApiError>;

    async fn cancel_order(&self, symbol: &str, order_id: i64) -> Result<(), ApiError>;

    /// Closes `quantity` of the entry with a reduce-only MARKET order.
    async fn flatten(&self, order: &BracketOrder, quantity: Decimal) -> Result<OrderResponse, ApiError>;
}

/// Places the entry and both protective legs.
///
/// If a leg is rejected, the legs already placed are cancelled and the entry is
/// closed at market, so a failed bracket never leaves an unprotected position.
pub async fn place_bracket<G: OrderGateway + ?Sized>(
    gateway: &G,
    order: &BracketOrder,
) -> Result<OrderResult, ApiError> {
    let entry = gateway.submit_entry(order).await?;
    tracing::debug!(?entry, "Entry order acknowledged.");

    let mut placed_legs = Vec::with_capacity(ExitLeg::ALL.len());
    for leg in ExitLeg::ALL {
        match gateway.submit_exit_leg(order, leg).await {
            Ok(response) => placed_legs.push(response.order_id),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    order_id = entry.order_id,
                    %leg,
                    "Protective leg rejected. Unwinding the entry."
                );
                return Err(unwind(gateway, order, &entry, &placed_legs, leg, e).await);
            }
        }
    }

    let status = if entry.status == "FILLED" {
        OrderStatus::Filled
    } else {
        OrderStatus::Accepted
    };
    let price = if entry.avg_price.is_zero() {
        order.reference_price
    } else {
        entry.avg_price
    };

    Ok(OrderResult {
        client_order_id: order.client_order_id,
        order_id: entry.order_id.to_string(),
        symbol: entry.symbol,
        side: order.side,
        status,
        filled_volume: entry.executed_qty,
        price,
        stop_loss: order.stop_loss,
        take_profit: order.take_profit,
        timestamp: Utc::now(),
    })
}

async fn unwind<G: OrderGateway + ?Sized>(
    gateway: &G,
    order: &BracketOrder,
    entry: &OrderResponse,
    placed_legs: &[i64],
    failed_leg: ExitLeg,
    cause: ApiError,
) -> ApiError {
    for &order_id in placed_legs {
        if let Err(e) = gateway.cancel_order(&order.symbol, order_id).await {
            tracing::warn!(error = %e, order_id, "Failed to cancel protective leg during unwind.");
        }
    }

    // An entry acknowledged before filling reports zero; fall back to the requested size.
    let quantity = if entry.executed_qty.is_zero() {
        order.volume
    } else {
        entry.executed_qty
    };

    match gateway.flatten(order, quantity).await {
        Ok(close) => {
            tracing::warn!(order_id = close.order_id, %quantity, "Entry closed after a rejected leg.");
            ApiError::BracketUnwound {
                leg: failed_leg.to_string(),
                reason: cause.to_string(),
            }
        }
        Err(e) => {
            tracing::error!(error = %e, symbol = %order.symbol, %quantity, "Failed to close the entry. Position is unprotected.");
            ApiError::UnprotectedPosition {
                symbol: order.symbol.clone(),
                reason: format!("{failed_leg} leg: {cause}; close: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::OrderSide;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Debug, Clone, PartialEq)]
    enum Request {
        Entry,
        Leg(ExitLeg),
        Cancel(i64),
        Flatten(Decimal),
    }

    #[derive(Default)]
    struct RecordingGateway {
        requests: Mutex<Vec<Request>>,
        reject_leg: Option<ExitLeg>,
        reject_flatten: bool,
    }

    impl RecordingGateway {
        fn requests(&self) -> Vec<Request> {
            self.requests.lock().unwrap().clone()
        }

        fn record(&self, request: Request) {
            self.requests.lock().unwrap().push(request);
        }
    }

    fn response(order_id: i64, order_type: &str) -> OrderResponse {
        OrderResponse {
            client_order_id: "c".to_string(),
            order_id,
            symbol: "BTCUSDT".to_string(),
            status: "FILLED".to_string(),
            avg_price: dec!(100.05),
            executed_qty: dec!(0.1),
            orig_qty: dec!(0.1),
            order_type: order_type.to_string(),
        }
    }

    fn rejection() -> ApiError {
        ApiError::Exchange {
            code: -2021,
            msg: "Order would immediately trigger.".to_string(),
        }
    }

    #[async_trait]
    impl OrderGateway for RecordingGateway {
        async fn submit_entry(&self, _order: &BracketOrder) -> Result<OrderResponse, ApiError> {
            self.record(Request::Entry);
            Ok(response(1, "MARKET"))
        }

        async fn submit_exit_leg(
            &self,
            _order: &BracketOrder,
            leg: ExitLeg,
        ) -> Result<OrderResponse, ApiError> {
            self.record(Request::Leg(leg));
            if self.reject_leg == Some(leg) {
                return Err(rejection());
            }
            let order_id = match leg {
                ExitLeg::StopLoss => 2,
                ExitLeg::TakeProfit => 3,
            };
            Ok(response(order_id, leg.order_type()))
        }

        async fn cancel_order(&self, _symbol: &str, order_id: i64) -> Result<(), ApiError> {
            self.record(Request::Cancel(order_id));
            Ok(())
        }

        async fn flatten(
            &self,
            _order: &BracketOrder,
            quantity: Decimal,
        ) -> Result<OrderResponse, ApiError> {
            self.record(Request::Flatten(quantity));
            if self.reject_flatten {
                return Err(rejection());
            }
            Ok(response(4, "MARKET"))
        }
    }

    fn order() -> BracketOrder {
        BracketOrder {
            client_order_id: Uuid::new_v4(),
            symbol: "BTCUSDT".to_string(),
            side: OrderSide::Buy,
            volume: dec!(0.1),
            reference_price: dec!(100),
            stop_loss: dec!(99.85),
            take_profit: dec!(100.10),
        }
    }

    #[tokio::test]
    async fn places_entry_then_both_legs() {
        let gateway = RecordingGateway::default();
        let result = place_bracket(&gateway, &order()).await.unwrap();

        assert_eq!(
            gateway.requests(),
            vec![
                Request::Entry,
                Request::Leg(ExitLeg::StopLoss),
                Request::Leg(ExitLeg::TakeProfit)
            ]
        );
        assert_eq!(result.status, OrderStatus::Filled);
        assert_eq!(result.price, dec!(100.05));
        assert_eq!(result.order_id, "1");
    }

    #[tokio::test]
    async fn rejected_stop_loss_closes_the_entry() {
        let gateway = RecordingGateway {
            reject_leg: Some(ExitLeg::StopLoss),
            ..Default::default()
        };
        let err = place_bracket(&gateway, &order()).await.unwrap_err();

        assert!(matches!(err, ApiError::BracketUnwound { ref leg, .. } if leg == "stop-loss"));
        assert_eq!(
            gateway.requests(),
            vec![
                Request::Entry,
                Request::Leg(ExitLeg::StopLoss),
                Request::Flatten(dec!(0.1))
            ]
        );
    }

    #[tokio::test]
    async fn rejected_take_profit_cancels_the_stop_and_closes_the_entry() {
        let gateway = RecordingGateway {
            reject_leg: Some(ExitLeg::TakeProfit),
            ..Default::default()
        };
        let err = place_bracket(&gateway, &order()).await.unwrap_err();

        assert!(matches!(err, ApiError::BracketUnwound { ref leg, .. } if leg == "take-profit"));
        assert_eq!(
            gateway.requests(),
            vec![
                Request::Entry,
                Request::Leg(ExitLeg::StopLoss),
                Request::Leg(ExitLeg::TakeProfit),
                Request::Cancel(2),
                Request::Flatten(dec!(0.1))
            ]
        );
    }

    #[tokio::test]
    async fn failed_close_reports_an_unprotected_position() {
        let gateway = RecordingGateway {
            reject_leg: Some(ExitLeg::StopLoss),
            reject_flatten: true,
            ..Default::default()
        };
        let err = place_bracket(&gateway, &order()).await.unwrap_err();

        assert!(matches!(err, ApiError::UnprotectedPosition { ref symbol, .. } if symbol == "BTCUSDT"));
    }
}
