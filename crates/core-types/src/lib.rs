pub mod enums;
pub mod error;
pub mod series;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{BandReference, OrderSide, Signal};
pub use error::CoreError;
pub use series::CandleSeries;
pub use structs::{Bar, BracketOrder, OrderResult, OrderStatus, Position, Quote};
