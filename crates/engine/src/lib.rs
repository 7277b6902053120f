use crate::error::EngineError;
use api_client::{ApiClient, BinanceClient};
use configuration::settings::Config;
use core_types::{OrderResult, OrderSide};
use executor::{build_bracket_order, Executor, LiveExecutor, SimulatedExecutor};
use std::sync::Arc;
use strategies::{Evaluation, MacdBand, Strategy, StrategyError};

pub mod error;

/// What a single poll cycle ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The venue reported the market closed; nothing was evaluated.
    MarketClosed,
    /// No decision could be made this cycle (no data, too few bars, ...).
    Skipped { reason: String },
    /// The strategy ran and returned `Signal::None`.
    NoSignal(Evaluation),
    /// A bracket order was submitted and accepted.
    Traded { evaluation: Evaluation, order: OrderResult },
    /// The strategy fired but the order could not be placed.
    OrderFailed { evaluation: Evaluation, error: String },
}

/// The polling orchestrator: fetch → compute → decide → act → report → sleep.
pub struct TradingLoop {
    config: Config,
    api_client: Arc<dyn ApiClient>,
    executor: Arc<dyn Executor>,
    strategy: Box<dyn Strategy>,
}

impl TradingLoop {
    /// Creates a new `TradingLoop` from already constructed collaborators.
    pub fn new(
        config: Config,
        api_client: Arc<dyn ApiClient>,
        executor: Arc<dyn Executor>,
        strategy: Box<dyn Strategy>,
    ) -> Self {
        Self {
            config,
            api_client,
            executor,
            strategy,
        }
    }

    /// Wires the Binance client, the executor selected by `dry_run`, and the MACD strategy.
    pub fn from_config(config: Config) -> Result<Self, EngineError> {
        config.validate()?;
        let api_client: Arc<dyn ApiClient> = Arc::new(BinanceClient::new(&config)?);
        let executor: Arc<dyn Executor> = if config.dry_run {
            tracing::info!("Dry run enabled: orders go to the simulated executor.");
            Arc::new(SimulatedExecutor::new())
        } else {
            Arc::new(LiveExecutor::new(Arc::clone(&api_client)))
        };
        let strategy = Box::new(MacdBand::new(config.strategy.clone())?);
        Ok(Self::new(config, api_client, executor, strategy))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetches a fresh series and runs the strategy on it. Errors are returned, not logged.
    pub async fn evaluate_latest(&self) -> Result<Evaluation, EngineError> {
        let series = self
            .api_client
            .fetch_recent_bars(&self.config.symbol, &self.config.timeframe, self.config.bar_count)
            .await?;
        Ok(self.strategy.evaluate(&series)?)
    }

    /// Runs one full cycle. Recoverable failures are logged and reported as an outcome;
    /// only configuration-level strategy errors are returned as `Err`.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, EngineError> {
        let symbol = &self.config.symbol;

        if self.config.wait_for_market_open {
            match self.api_client.is_tradable(symbol).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::info!(%symbol, "Market is closed. Waiting for the market to open...");
                    return Ok(CycleOutcome::MarketClosed);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to query market state. Skipping this iteration.");
                    return Ok(CycleOutcome::Skipped { reason: e.to_string() });
                }
            }
        }

        let evaluation = match self.evaluate_latest().await {
            Ok(evaluation) => evaluation,
            Err(EngineError::ApiClient(e)) => {
                tracing::error!(error = %e, "Data retrieval failed. Skipping this iteration.");
                return Ok(CycleOutcome::Skipped { reason: e.to_string() });
            }
            Err(EngineError::Strategy(e @ StrategyError::InsufficientData { .. })) => {
                tracing::error!(error = %e, "Not enough bars to evaluate. Skipping this iteration.");
                return Ok(CycleOutcome::Skipped { reason: e.to_string() });
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            %symbol,
            macd = evaluation.row.macd,
            signal = evaluation.row.signal,
            hist = evaluation.row.hist,
            support = evaluation.band.support,
            resistance = evaluation.band.resistance,
            decision = ?evaluation.signal,
            "Evaluated latest bar."
        );

        let outcome = match evaluation.signal.side() {
            None => CycleOutcome::NoSignal(evaluation),
            Some(side) => match self.place_order(side).await {
                Ok(order) => {
                    tracing::info!(
                        "{:?} order placed at {} with SL: {} and TP: {}",
                        order.side,
                        order.price,
                        order.stop_loss,
                        order.take_profit
                    );
                    CycleOutcome::Traded { evaluation, order }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Order failed.");
                    CycleOutcome::OrderFailed {
                        evaluation,
                        error: e.to_string(),
                    }
                }
            },
        };

        if self.can_query_account() {
            self.report_open_positions().await;
        }
        Ok(outcome)
    }

    /// Prices a bracket off the live quote (ask for buys, bid for sells) and submits it.
    async fn place_order(&self, side: OrderSide) -> Result<OrderResult, EngineError> {
        let quote = self.api_client.latest_quote(&self.config.symbol).await?;
        let order = build_bracket_order(
            &self.config.symbol,
            side,
            quote.price_for(side),
            &self.config.bracket_settings(),
        )?;
        Ok(self.executor.submit_bracket_order(&order).await?)
    }

    /// Account endpoints are signed; a dry run without credentials cannot reach them.
    fn can_query_account(&self) -> bool {
        !(self.config.dry_run && (self.config.api_key.is_empty() || self.config.api_secret.is_empty()))
    }

    async fn report_open_positions(&self) {
        match self.api_client.open_positions().await {
            Ok(positions) if positions.is_empty() => tracing::info!("No open positions."),
            Ok(positions) => {
                tracing::info!("Open positions:");
                for pos in positions {
                    tracing::info!(
                        "Symbol: {}, Type: {:?}, Volume: {}, Open Price: {}, SL: {:?}, TP: {:?}",
                        pos.symbol,
                        pos.side,
                        pos.volume,
                        pos.open_price,
                        pos.stop_loss,
                        pos.take_profit
                    );
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to retrieve open positions."),
        }
    }

    /// Startup precondition: the market must be tradable unless we are configured to wait.
    async fn check_market_open(&self) -> Result<(), EngineError> {
        let symbol = &self.config.symbol;
        if self.api_client.is_tradable(symbol).await? {
            return Ok(());
        }
        if self.config.wait_for_market_open {
            tracing::warn!(%symbol, "Market is closed. Will keep polling until it opens.");
            Ok(())
        } else {
            Err(EngineError::MarketClosed(symbol.clone()))
        }
    }

    /// The main loop. Runs until Ctrl-C, or for `max_cycles` cycles when given.
    pub async fn run(&self, max_cycles: Option<u64>) -> Result<(), EngineError> {
        self.check_market_open().await?;
        tracing::info!(
            symbol = %self.config.symbol,
            timeframe = %self.config.timeframe,
            interval_secs = self.config.poll_interval_secs,
            "Trading loop started."
        );
        if !self.can_query_account() {
            tracing::info!("Dry run without API credentials: open positions will not be reported.");
        }

        let mut cycles: u64 = 0;
        loop {
            let outcome = self.run_cycle().await?;
            tracing::debug!(?outcome, "Cycle complete.");
            cycles += 1;
            if max_cycles.is_some_and(|max| cycles >= max) {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval()) => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown requested. Stopping trading loop.");
                    break;
                }
            }
        }

        tracing::info!(cycles, "Trading loop stopped.");
        Ok(())
    }
}
