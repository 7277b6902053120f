use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] configuration::error::ConfigError),

    #[error("API client error: {0}")]
    ApiClient(#[from] api_client::error::ApiError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] strategies::StrategyError),

    #[error("Executor error: {0}")]
    Executor(#[from] executor::ExecutorError),

    #[error("Market for '{0}' is closed or disabled for trading.")]
    MarketClosed(String),
}
