use crate::error::ExecutorError;
use configuration::BracketSettings;
use core_types::{BracketOrder, OrderSide};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Prices a bracket around `reference_price`.
///
/// Offsets are `stop_loss_pips * pip_size` and `take_profit_pips * pip_size`.
/// A buy puts its stop below the entry and its target above; a sell is mirrored.
pub fn build_bracket_order(
    symbol: &str,
    side: OrderSide,
    reference_price: Decimal,
    settings: &BracketSettings,
) -> Result<BracketOrder, ExecutorError> {
    if reference_price <= Decimal::ZERO {
        return Err(ExecutorError::InvalidOrder(format!(
            "reference price must be positive, got {reference_price}"
        )));
    }

    let stop_loss_offset = settings.stop_loss_pips * settings.pip_size;
    let take_profit_offset = settings.take_profit_pips * settings.pip_size;

    let (stop_loss, take_profit) = match side {
        OrderSide::Buy => (
            reference_price - stop_loss_offset,
            reference_price + take_profit_offset,
        ),
        OrderSide::Sell => (
            reference_price + stop_loss_offset,
            reference_price - take_profit_offset,
        ),
    };

    if stop_loss <= Decimal::ZERO || take_profit <= Decimal::ZERO {
        return Err(ExecutorError::InvalidOrder(format!(
            "bracket levels must be positive (sl {stop_loss}, tp {take_profit})"
        )));
    }

    Ok(BracketOrder {
        client_order_id: Uuid::new_v4(),
        symbol: symbol.to_string(),
        side,
        volume: settings.lot_size,
        reference_price,
        stop_loss,
        take_profit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn settings() -> BracketSettings {
        BracketSettings {
            pip_size: dec!(0.01),
            stop_loss_pips: dec!(15),
            take_profit_pips: dec!(10),
            lot_size: dec!(0.1),
        }
    }

    #[test]
    fn buy_stop_below_target_above() {
        let order = build_bracket_order("XAUUSD", OrderSide::Buy, dec!(2000.00), &settings()).unwrap();
        assert_eq!(order.stop_loss, dec!(1999.85));
        assert_eq!(order.take_profit, dec!(2000.10));
        assert_eq!(order.volume, dec!(0.1));
        assert_eq!(order.reference_price, dec!(2000.00));
    }

    #[test]
    fn sell_stop_above_target_below() {
        let order = build_bracket_order("XAUUSD", OrderSide::Sell, dec!(2000.00), &settings()).unwrap();
        assert_eq!(order.stop_loss, dec!(2000.15));
        assert_eq!(order.take_profit, dec!(1999.90));
    }

    #[test]
    fn pip_size_scales_offsets() {
        let settings = BracketSettings {
            pip_size: dec!(0.10),
            ..settings()
        };
        let order = build_bracket_order("XAUUSD", OrderSide::Buy, dec!(2000), &settings).unwrap();
        assert_eq!(order.stop_loss, dec!(1998.5));
        assert_eq!(order.take_profit, dec!(2001.0));
    }

    #[test]
    fn each_order_gets_its_own_client_id() {
        let a = build_bracket_order("X", OrderSide::Buy, dec!(10), &settings()).unwrap();
        let b = build_bracket_order("X", OrderSide::Buy, dec!(10), &settings()).unwrap();
        assert_ne!(a.client_order_id, b.client_order_id);
    }

    #[test]
    fn rejects_levels_that_cross_zero() {
        assert!(matches!(
            build_bracket_order("X", OrderSide::Buy, dec!(0.1), &settings()),
            Err(ExecutorError::InvalidOrder(_))
        ));
        assert!(matches!(
            build_bracket_order("X", OrderSide::Sell, dec!(0), &settings()),
            Err(ExecutorError::InvalidOrder(_))
        ));
    }
}
