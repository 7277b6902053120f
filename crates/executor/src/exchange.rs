use crate::error::ExecutorError;
use api_client::error::ApiError;
use api_client::ApiClient;
use async_trait::async_trait;
use chrono::Utc;
use core_types::{BracketOrder, OrderResult, OrderStatus};
use std::sync::Arc;
use uuid::Uuid;

/// A generic trait for an execution engine.
///
/// This trait allows the trading loop to be agnostic about whether it is
/// talking to a simulated exchange or a real one.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Submits a market order with its stop-loss and take-profit levels.
    async fn submit_bracket_order(&self, order: &BracketOrder) -> Result<OrderResult, ExecutorError>;
}

/// The "live" executor that sends real orders to the exchange via the ApiClient.
pub struct LiveExecutor {
    api_client: Arc<dyn ApiClient>,
}

impl LiveExecutor {
    pub fn new(api_client: Arc<dyn ApiClient>) -> Self {
        Self { api_client }
    }
}

#[async_trait]
impl Executor for LiveExecutor {
    async fn submit_bracket_order(&self, order: &BracketOrder) -> Result<OrderResult, ExecutorError> {
        tracing::debug!("LiveExecutor: Submitting bracket order {:?}", order);
        let result = self
            .api_client
            .place_bracket_order(order)
            .await
            .map_err(|e| match e {
                ApiError::Exchange { code, msg } => ExecutorError::Rejected(format!("{code}: {msg}")),
                other => ExecutorError::Api(other),
            })?;
        tracing::debug!("LiveExecutor: Venue result {:?}", result);
        Ok(result)
    }
}

/// Paper-trading executor: every order fills in full at its reference price.
#[derive(Debug, Default)]
pub struct SimulatedExecutor;

impl SimulatedExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Executor for SimulatedExecutor {
    async fn submit_bracket_order(&self, order: &BracketOrder) -> Result<OrderResult, ExecutorError> {
        let result = OrderResult {
            client_order_id: order.client_order_id,
            order_id: format!("sim-{}", Uuid::new_v4()),
            symbol: order.symbol.clone(),
            side: order.side,
            status: OrderStatus::Filled,
            filled_volume: order.volume,
            price: order.reference_price,
            stop_loss: order.stop_loss,
            take_profit: order.take_profit,
            timestamp: Utc::now(),
        };
        tracing::debug!("SimulatedExecutor: Created fill {:?}", result);
        Ok(result)
    }
}
