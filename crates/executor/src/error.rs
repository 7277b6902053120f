use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Invalid bracket order: {0}")]
    InvalidOrder(String),

    #[error("The venue rejected the order: {0}")]
    Rejected(String),

    #[error("API error: {0}")]
    Api(#[from] api_client::error::ApiError),
}
