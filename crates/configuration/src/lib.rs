use crate::error::ConfigError;
use crate::settings::Config;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{BracketSettings, LoggingSettings, MacdParams};

/// Top-level keys read from the environment.
const ENV_KEYS: &[&str] = &[
    "API_KEY",
    "API_SECRET",
    "SYMBOL",
    "TIMEFRAME",
    "BAR_COUNT",
    "PIP_SIZE",
    "STOP_LOSS_PIPS",
    "TAKE_PROFIT_PIPS",
    "LOT_SIZE",
    "POLL_INTERVAL_SECS",
    "LIVE_TRADING_ENABLED",
    "DRY_RUN",
    "WAIT_FOR_MARKET_OPEN",
];

/// Nested sections, reached as `STRATEGY__FAST_PERIOD` and so on.
const ENV_SECTIONS: &[&str] = &["STRATEGY__", "LOGGING__"];

fn is_known_key(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    ENV_KEYS.contains(&key.as_str()) || ENV_SECTIONS.iter().any(|prefix| key.starts_with(prefix))
}

/// Loads the application configuration from `config.toml` and the process environment.
///
/// This function is the primary entry point for this crate. The file is optional;
/// environment variables override anything it sets. Only the keys this crate knows
/// are taken from the environment, so unrelated variables never reach the
/// deserializer. The result is validated before it is returned, so callers can rely
/// on every invariant `Config::validate` checks.
pub fn load_config() -> Result<Config, ConfigError> {
    let vars = std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)));
    load_config_with(vars)
}

/// Same as [`load_config`], but reads variables from `vars` instead of the process environment.
pub fn load_config_with<I>(vars: I) -> Result<Config, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let known: config::Map<String, String> = vars
        .into_iter()
        .filter(|(key, _)| is_known_key(key))
        .collect();
    let environment = config::Environment::default().source(Some(known));

    let builder = config::Config::builder()
        // Tells the builder to look for a file named `config.toml`, if present.
        .add_source(config::File::with_name("config").required(false))
        .add_source(environment.separator("__"))
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::BandReference;
    use rust_decimal_macros::dec;

    fn env(vars: &[(&str, &str)]) -> Vec<(String, String)> {
        vars.iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    const BASE: &[(&str, &str)] = &[
        ("SYMBOL", "BTCUSDT"),
        ("PIP_SIZE", "0.01"),
        ("API_KEY", "key"),
        ("API_SECRET", "secret"),
    ];

    #[test]
    fn applies_documented_defaults() {
        let config = load_config_with(env(BASE)).unwrap();
        assert_eq!(config.symbol, "BTCUSDT");
        assert_eq!(config.pip_size, dec!(0.01));
        assert_eq!(config.stop_loss_pips, dec!(15));
        assert_eq!(config.take_profit_pips, dec!(10));
        assert_eq!(config.lot_size, dec!(0.1));
        assert_eq!(config.poll_interval_secs, 60);
        assert_eq!(config.bar_count, 50);
        assert_eq!(config.timeframe, "1m");
        assert_eq!(config.strategy.fast_period, 12);
        assert_eq!(config.strategy.slow_period, 26);
        assert_eq!(config.strategy.signal_period, 9);
        assert_eq!(config.strategy.band_window, 10);
        assert_eq!(config.strategy.buy_reference, BandReference::Support);
        assert!(!config.dry_run);
    }

    #[test]
    fn pip_size_has_no_default() {
        let vars: Vec<_> = BASE.iter().copied().filter(|(k, _)| *k != "PIP_SIZE").collect();
        assert!(matches!(
            load_config_with(env(&vars)),
            Err(ConfigError::LoadError(_))
        ));
    }

    #[test]
    fn nested_strategy_keys_override_defaults() {
        let mut vars = BASE.to_vec();
        vars.push(("STRATEGY__FAST_PERIOD", "5"));
        vars.push(("STRATEGY__BUY_REFERENCE", "resistance"));
        let config = load_config_with(env(&vars)).unwrap();
        assert_eq!(config.strategy.fast_period, 5);
        assert_eq!(config.strategy.buy_reference, BandReference::Resistance);
    }

    #[test]
    fn rejects_bar_count_below_warm_up() {
        let mut vars = BASE.to_vec();
        vars.push(("BAR_COUNT", "34"));
        assert!(matches!(
            load_config_with(env(&vars)),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn rejects_inverted_ema_periods() {
        let mut vars = BASE.to_vec();
        vars.push(("STRATEGY__FAST_PERIOD", "30"));
        assert!(matches!(
            load_config_with(env(&vars)),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn credentials_are_optional_in_dry_run() {
        let vars = [("SYMBOL", "XAUUSD"), ("PIP_SIZE", "0.10"), ("DRY_RUN", "true")];
        let config = load_config_with(env(&vars)).unwrap();
        assert!(config.dry_run);
        assert_eq!(config.bracket_settings().pip_size, dec!(0.10));

        let vars = [("SYMBOL", "XAUUSD"), ("PIP_SIZE", "0.10")];
        assert!(matches!(
            load_config_with(env(&vars)),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn unrelated_environment_variables_are_ignored() {
        let mut vars = BASE.to_vec();
        vars.push(("LOGGING", "verbose"));
        vars.push(("STRATEGY", "aggressive"));
        vars.push(("PATH", "/usr/bin"));
        vars.push(("LOGGING__LEVEL", "debug"));
        let config = load_config_with(env(&vars)).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.strategy.fast_period, 12);
    }
}
