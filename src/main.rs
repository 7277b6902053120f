use anyhow::Context;
use api_client::{ApiClient, BinanceClient};
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use configuration::{init_tracing, load_config};
use engine::TradingLoop;
use rust_decimal::Decimal;

/// The main entry point for the MACD trading bot.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the variables may come from the real environment.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = load_config().context("Failed to load configuration")?;
    // Keep the guard alive so the file writer flushes on exit.
    let _log_guard = init_tracing(&config.logging);
    tracing::info!(
        symbol = %config.symbol,
        timeframe = %config.timeframe,
        dry_run = config.dry_run,
        live = config.live_trading_enabled,
        "Configuration loaded."
    );

    match cli.command {
        Commands::Run(args) => {
            let trading_loop = TradingLoop::from_config(config)?;
            trading_loop.run(args.max_cycles).await?;
        }
        Commands::Check => handle_check(TradingLoop::from_config(config)?).await?,
        Commands::Positions => {
            let client = BinanceClient::new(&config)?;
            handle_positions(&client).await?;
        }
    }

    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A polling MACD crossover bot with a support/resistance filter.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the polling trading loop. Stops on Ctrl-C.
    Run(RunArgs),
    /// Evaluate the latest bar once and print the indicator snapshot. Places no orders.
    Check,
    /// List the account's open positions.
    Positions,
}

#[derive(Parser)]
struct RunArgs {
    /// Stop after this many poll cycles instead of running until interrupted.
    #[arg(long)]
    max_cycles: Option<u64>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_check(trading_loop: TradingLoop) -> anyhow::Result<()> {
    let config = trading_loop.config();
    let evaluation = trading_loop
        .evaluate_latest()
        .await
        .with_context(|| format!("Could not evaluate {} {}", config.symbol, config.timeframe))?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Field", "Value"]);
    table.add_row(vec!["Symbol".to_string(), config.symbol.clone()]);
    table.add_row(vec!["Timeframe".to_string(), config.timeframe.clone()]);
    table.add_row(vec!["Close".to_string(), format!("{:.5}", evaluation.row.close)]);
    table.add_row(vec!["MACD".to_string(), format!("{:.5}", evaluation.row.macd)]);
    table.add_row(vec!["Signal".to_string(), format!("{:.5}", evaluation.row.signal)]);
    table.add_row(vec!["Histogram".to_string(), format!("{:.5}", evaluation.row.hist)]);
    table.add_row(vec!["Support".to_string(), format!("{:.5}", evaluation.band.support)]);
    table.add_row(vec![
        "Resistance".to_string(),
        format!("{:.5}", evaluation.band.resistance),
    ]);
    table.add_row(vec!["Decision".to_string(), format!("{:?}", evaluation.signal)]);

    println!("{table}");
    Ok(())
}

async fn handle_positions(client: &dyn ApiClient) -> anyhow::Result<()> {
    let positions = client.open_positions().await?;
    if positions.is_empty() {
        println!("No open positions.");
        return Ok(());
    }

    let level = |value: Option<Decimal>| value.map_or_else(|| "-".to_string(), |v| v.to_string());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Symbol", "Side", "Volume", "Open Price", "SL", "TP", "Unrealized PnL",
    ]);
    for pos in positions {
        table.add_row(vec![
            pos.symbol,
            format!("{:?}", pos.side),
            pos.volume.to_string(),
            pos.open_price.to_string(),
            level(pos.stop_loss),
            level(pos.take_profit),
            pos.unrealized_pnl.to_string(),
        ]);
    }

    println!("{table}");
    Ok(())
}
