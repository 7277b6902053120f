use crate::auth::signed_query;
use crate::bracket::{place_bracket, ExitLeg, OrderGateway};
use crate::error::ApiError;
use async_trait::async_trait;
use chrono::Utc;
use configuration::settings::Config;
use core_types::{Bar, BracketOrder, CandleSeries, OrderResult, OrderSide, Position, Quote};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

mod auth;
pub mod bracket;
pub mod error;
pub mod responses;

// --- Public API ---
pub use auth::sign_request;
pub use responses::{
    ApiErrorResponse, BookTickerResponse, ExchangeInfoResponse, OrderResponse, PositionResponse,
    RawKline,
};

/// The generic, abstract interface for a trading venue.
///
/// The trading loop only ever talks to the venue through this trait, so the
/// concrete implementation (live or mock) can be swapped out.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Fetches the trailing `count` bars of `timeframe` for `symbol`, oldest first.
    ///
    /// Fails with `ApiError::DataUnavailable` when the venue cannot supply them.
    async fn fetch_recent_bars(
        &self,
        symbol: &str,
        timeframe: &str,
        count: usize,
    ) -> Result<CandleSeries, ApiError>;

    /// Whether `symbol` currently accepts orders.
    async fn is_tradable(&self, symbol: &str) -> Result<bool, ApiError>;

    /// The current best bid and ask.
    async fn latest_quote(&self, symbol: &str) -> Result<Quote, ApiError>;

    /// Places a market entry with its stop-loss and take-profit legs. (Authenticated)
    ///
    /// A bracket whose legs cannot all be placed is closed again before this returns.
    async fn place_bracket_order(&self, order: &BracketOrder) -> Result<OrderResult, ApiError>;

    /// Fetches all current open positions. (Authenticated)
    async fn open_positions(&self) -> Result<Vec<Position>, ApiError>;
}

const PRODUCTION_URL: &str = "https://fapi.binance.com";
const TESTNET_URL: &str = "https://testnet.binancefuture.com";

/// A concrete implementation of the `ApiClient` for Binance USDⓈ-M futures.
#[derive(Clone)]
pub struct BinanceClient {
    client: reqwest::Client,
    base_url: String,
    api_secret: String,
}

impl BinanceClient {
    /// Builds a client for the production or testnet endpoint, per `live_trading_enabled`.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let base_url = if config.live_trading_enabled {
            PRODUCTION_URL
        } else {
            TESTNET_URL
        };
        Self::with_base_url(base_url, &config.api_key, &config.api_secret)
    }

    pub fn with_base_url(base_url: &str, api_key: &str, api_secret: &str) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if !api_key.is_empty() {
            headers.insert(
                "X-MBX-APIKEY",
                HeaderValue::from_str(api_key).map_err(|e| ApiError::Credentials(e.to_string()))?,
            );
        }

        Ok(Self {
            client: reqwest::Client::builder().default_headers(headers).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_secret: api_secret.to_string(),
        })
    }

    /// Reads a response body, turning non-2xx replies into `ApiError::Exchange`.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str::<T>(&text).map_err(|e| ApiError::Deserialization(e.to_string()))
        } else {
            let api_error: ApiErrorResponse = serde_json::from_str(&text).map_err(|e| {
                ApiError::Deserialization(format!(
                    "Failed to deserialize error response: {}. Original text: {}",
                    e, text
                ))
            })?;
            Err(ApiError::Exchange {
                code: api_error.code,
                msg: api_error.msg,
            })
        }
    }

    async fn get_public<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).query(query).send().await?;
        Self::decode(response).await
    }

    async fn send_signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        mut params: BTreeMap<&'static str, String>,
    ) -> Result<T, ApiError> {
        let query = signed_query(&self.api_secret, &mut params, Utc::now().timestamp_millis())?;
        let url = format!("{}{}?{}", self.base_url, path, query);
        let response = self.client.request(method, &url).send().await?;
        Self::decode(response).await
    }
}

fn side_param(side: OrderSide) -> &'static str {
    match side {
        OrderSide::Buy => "BUY",
        OrderSide::Sell => "SELL",
    }
}

#[async_trait]
impl ApiClient for BinanceClient {
    async fn fetch_recent_bars(
        &self,
        symbol: &str,
        timeframe: &str,
        count: usize,
    ) -> Result<CandleSeries, ApiError> {
        let rows: Vec<RawKline> = self
            .get_public(
                "/fapi/v1/klines",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", timeframe.to_string()),
                    ("limit", count.to_string()),
                ],
            )
            .await
            .map_err(|e| ApiError::DataUnavailable(e.to_string()))?;

        if rows.is_empty() {
            return Err(ApiError::DataUnavailable(format!(
                "no {timeframe} bars returned for {symbol}"
            )));
        }

        let bars = rows
            .into_iter()
            .map(Bar::try_from)
            .collect::<Result<Vec<Bar>, ApiError>>()?;
        CandleSeries::new(bars).map_err(|e| ApiError::InvalidData(e.to_string()))
    }

    async fn is_tradable(&self, symbol: &str) -> Result<bool, ApiError> {
        let info: ExchangeInfoResponse = self.get_public("/fapi/v1/exchangeInfo", &[]).await?;
        match info.is_trading(symbol) {
            Some(trading) => Ok(trading),
            None => {
                tracing::error!(%symbol, "Symbol is not listed on the venue.");
                Ok(false)
            }
        }
    }

    async fn latest_quote(&self, symbol: &str) -> Result<Quote, ApiError> {
        let ticker: BookTickerResponse = self
            .get_public("/fapi/v1/ticker/bookTicker", &[("symbol", symbol.to_string())])
            .await?;
        Ok(ticker.into())
    }

    async fn place_bracket_order(&self, order: &BracketOrder) -> Result<OrderResult, ApiError> {
        place_bracket(self, order).await
    }

    async fn open_positions(&self) -> Result<Vec<Position>, ApiError> {
        let raw: Vec<PositionResponse> = self
            .send_signed(Method::GET, "/fapi/v2/positionRisk", BTreeMap::new())
            .await?;
        Ok(raw
            .into_iter()
            .filter_map(PositionResponse::into_position)
            .collect())
    }
}

#[async_trait]
impl OrderGateway for BinanceClient {
    async fn submit_entry(&self, order: &BracketOrder) -> Result<OrderResponse, ApiError> {
        let mut params = BTreeMap::new();
        params.insert("symbol", order.symbol.clone());
        params.insert("side", side_param(order.side).to_string());
        params.insert("type", "MARKET".to_string());
        params.insert("quantity", order.volume.to_string());
        params.insert("newClientOrderId", order.client_order_id.to_string());
        params.insert("newOrderRespType", "RESULT".to_string());
        self.send_signed(Method::POST, "/fapi/v1/order", params).await
    }

    async fn submit_exit_leg(
        &self,
        order: &BracketOrder,
        leg: ExitLeg,
    ) -> Result<OrderResponse, ApiError> {
        let mut params = BTreeMap::new();
        params.insert("symbol", order.symbol.clone());
        params.insert("side", side_param(order.side.opposite()).to_string());
        params.insert("type", leg.order_type().to_string());
        params.insert("stopPrice", leg.trigger(order).to_string());
        params.insert("closePosition", "true".to_string());
        self.send_signed(Method::POST, "/fapi/v1/order", params).await
    }

    async fn cancel_order(&self, symbol: &str, order_id: i64) -> Result<(), ApiError> {
        let mut params = BTreeMap::new();
        params.insert("symbol", symbol.to_string());
        params.insert("orderId", order_id.to_string());
        let _: OrderResponse = self.send_signed(Method::DELETE, "/fapi/v1/order", params).await?;
        Ok(())
    }

    async fn flatten(&self, order: &BracketOrder, quantity: Decimal) -> Result<OrderResponse, ApiError> {
        let mut params = BTreeMap::new();
        params.insert("symbol", order.symbol.clone());
        params.insert("side", side_param(order.side.opposite()).to_string());
        params.insert("type", "MARKET".to_string());
        params.insert("quantity", quantity.to_string());
        params.insert("reduceOnly", "true".to_string());
        params.insert("newOrderRespType", "RESULT".to_string());
        self.send_signed(Method::POST, "/fapi/v1/order", params).await
    }
}
