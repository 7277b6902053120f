use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Market data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),

    #[error("Exchange rejected the request (code {code}): {msg}")]
    Exchange { code: i64, msg: String },

    #[error("Bracket {leg} leg rejected; the entry was closed at market: {reason}")]
    BracketUnwound { leg: String, reason: String },

    #[error("Position on {symbol} is open without protection: {reason}")]
    UnprotectedPosition { symbol: String, reason: String },

    #[error("Invalid API credentials: {0}")]
    Credentials(String),
}
