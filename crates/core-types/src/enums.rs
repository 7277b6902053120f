use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side of the order
    pub fn opposite(&self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

/// The ternary trading decision produced for the most recent bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    Sell,
    None,
}

impl Signal {
    /// The order side this signal asks for, if any.
    pub fn side(&self) -> Option<OrderSide> {
        match self {
            Signal::Buy => Some(OrderSide::Buy),
            Signal::Sell => Some(OrderSide::Sell),
            Signal::None => None,
        }
    }
}

/// Which band level the close is compared against on the buy arm.
///
/// `Support` is the canonical rule. `Resistance` reproduces the older variant
/// of the bot, which required the close to clear the recent high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandReference {
    #[default]
    Support,
    Resistance,
}
