use crate::error::ConfigError;
use core_types::BandReference;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the entire application.
///
/// Top-level keys keep the plain environment variable names the bot has always
/// used (`SYMBOL`, `PIP_SIZE`, ...). Nested sections are reached with a double
/// underscore, e.g. `STRATEGY__FAST_PERIOD`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Venue API key. May be empty in dry-run mode.
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,

    /// The instrument to trade (e.g., "BTCUSDT").
    pub symbol: String,
    /// The bar interval requested from the venue (e.g., "1m").
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    /// How many trailing bars to fetch on each poll.
    #[serde(default = "default_bar_count")]
    pub bar_count: usize,

    /// The price value of one pip. Depends on instrument precision, so there is no default.
    pub pip_size: Decimal,
    #[serde(default = "default_stop_loss_pips")]
    pub stop_loss_pips: Decimal,
    #[serde(default = "default_take_profit_pips")]
    pub take_profit_pips: Decimal,
    #[serde(default = "default_lot_size")]
    pub lot_size: Decimal,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Use the production endpoint instead of the testnet.
    #[serde(default)]
    pub live_trading_enabled: bool,
    /// Route orders to the simulated executor instead of the venue.
    #[serde(default)]
    pub dry_run: bool,
    /// Keep polling while the market is closed instead of exiting.
    #[serde(default)]
    pub wait_for_market_open: bool,

    #[serde(default)]
    pub strategy: MacdParams,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Parameters for the MACD crossover strategy with a support/resistance filter.
#[derive(Debug, Clone, Deserialize)]
pub struct MacdParams {
    #[serde(default = "default_fast_period")]
    pub fast_period: usize,
    #[serde(default = "default_slow_period")]
    pub slow_period: usize,
    #[serde(default = "default_signal_period")]
    pub signal_period: usize,
    /// Number of trailing bars the support/resistance band is taken over.
    #[serde(default = "default_band_window")]
    pub band_window: usize,
    /// The band level a buy's close must clear.
    #[serde(default)]
    pub buy_reference: BandReference,
}

/// The pip-denominated risk settings used to price a bracket order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BracketSettings {
    pub pip_size: Decimal,
    pub stop_loss_pips: Decimal,
    pub take_profit_pips: Decimal,
    pub lot_size: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

fn default_timeframe() -> String {
    "1m".to_string()
}
fn default_bar_count() -> usize {
    50
}
fn default_stop_loss_pips() -> Decimal {
    dec!(15)
}
fn default_take_profit_pips() -> Decimal {
    dec!(10)
}
fn default_lot_size() -> Decimal {
    dec!(0.1)
}
fn default_poll_interval_secs() -> u64 {
    60
}
fn default_fast_period() -> usize {
    12
}
fn default_slow_period() -> usize {
    26
}
fn default_signal_period() -> usize {
    9
}
fn default_band_window() -> usize {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast_period: default_fast_period(),
            slow_period: default_slow_period(),
            signal_period: default_signal_period(),
            band_window: default_band_window(),
            buy_reference: BandReference::default(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

impl MacdParams {
    /// The shortest series the strategy will evaluate: slow EMA span plus signal span.
    pub fn warm_up(&self) -> usize {
        self.slow_period + self.signal_period
    }

    /// Checks that the periods describe a usable MACD.
    pub fn check(&self) -> Result<(), String> {
        if self.fast_period == 0 || self.slow_period == 0 || self.signal_period == 0 {
            return Err("MACD periods must be greater than zero".to_string());
        }
        if self.fast_period >= self.slow_period {
            return Err("Fast EMA period must be less than slow EMA period".to_string());
        }
        if self.band_window == 0 {
            return Err("Band window must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn bracket_settings(&self) -> BracketSettings {
        BracketSettings {
            pip_size: self.pip_size,
            stop_loss_pips: self.stop_loss_pips,
            take_profit_pips: self.take_profit_pips,
            lot_size: self.lot_size,
        }
    }

    /// Rejects configurations that would make the bot trade nonsense.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

        if self.symbol.trim().is_empty() {
            return invalid("SYMBOL must not be empty");
        }
        if self.pip_size <= Decimal::ZERO {
            return invalid("PIP_SIZE must be greater than zero");
        }
        if self.stop_loss_pips <= Decimal::ZERO || self.take_profit_pips <= Decimal::ZERO {
            return invalid("STOP_LOSS_PIPS and TAKE_PROFIT_PIPS must be greater than zero");
        }
        if self.lot_size <= Decimal::ZERO {
            return invalid("LOT_SIZE must be greater than zero");
        }
        if self.poll_interval_secs == 0 {
            return invalid("POLL_INTERVAL_SECS must be greater than zero");
        }
        self.strategy.check().map_err(ConfigError::ValidationError)?;

        let required = self.strategy.warm_up().max(self.strategy.band_window);
        if self.bar_count < required {
            return Err(ConfigError::ValidationError(format!(
                "BAR_COUNT ({}) must cover the strategy warm-up of {} bars",
                self.bar_count, required
            )));
        }
        if !self.dry_run && (self.api_key.is_empty() || self.api_secret.is_empty()) {
            return invalid("API_KEY and API_SECRET are required unless DRY_RUN is set");
        }
        Ok(())
    }
}
