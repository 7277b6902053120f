use thiserror::Error;

#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Strategy received invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Insufficient data: {required} bars required, {available} available")]
    InsufficientData { required: usize, available: usize },

    #[error("An error occurred during indicator calculation: {0}")]
    IndicatorError(String),
}
