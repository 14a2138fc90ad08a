//! Command-line interface for stock-forecast

mod render;

use anyhow::Context;
use clap::{Parser, Subcommand};
use forecast_core::{ForecastConfig, HorizonConfig};
use forecast_stock::{ForecastService, LookupOutcome, StockConfig, StockError, SymbolLookup};
use forecast_utils::{AppConfig, init_tracing};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "stock-forecast")]
#[command(about = "Forecast stock closing prices with three models and their ensemble", long_about = None)]
struct Cli {
    /// Log filter, overrides LOG_LEVEL (RUST_LOG still wins)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run all models on a ticker and print the comparison and forecast
    Forecast {
        /// Ticker symbol, e.g. AAPL
        symbol: String,

        /// Calendar days held out for validation
        #[arg(short, long)]
        validation_days: Option<u32>,

        /// Business days to forecast
        #[arg(short, long)]
        forecast_days: Option<u32>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find tickers matching a company name
    Lookup {
        /// Company name or partial ticker
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Print matches as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut app = AppConfig::from_env()?;
    if let Some(level) = cli.log_level {
        app.log.level = level;
    }
    init_tracing(&app.log);

    let stock = StockConfig::from_env()?;
    debug!(?stock, "Stock configuration loaded");

    match cli.command {
        Command::Forecast {
            symbol,
            validation_days,
            forecast_days,
            json,
        } => {
            let config = ForecastConfig::from_env()?;
            let horizon = HorizonConfig {
                validation_days: validation_days.unwrap_or(config.horizon.validation_days),
                forecast_days: forecast_days.unwrap_or(config.horizon.forecast_days),
            };
            let service = ForecastService::from_config(&stock, config)?;

            info!(symbol = %symbol, ?horizon, "Running forecast");
            let report = service
                .forecast(&symbol, horizon)
                .await
                .map_err(user_facing)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{} forecast ({})\n", report.symbol, report.generated_at);
                println!("Validation over the last {} days", horizon.validation_days);
                println!("{}\n", render::comparison(&report));
                println!("{}", render::forecast(&report));
                let missing = report.comparison.missing();
                if !missing.is_empty() {
                    let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
                    println!("\nEnsemble excludes failed models: {}", names.join(", "));
                }
            }
        }
        Command::Lookup { query, json } => {
            let lookup = SymbolLookup::new(&stock)?;
            let outcome = lookup
                .search(&query.join(" "))
                .await
                .map_err(user_facing)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                match outcome {
                    LookupOutcome::Matches(matches) => println!("{}", render::matches(&matches)),
                    LookupOutcome::NoResults => println!("No matching tickers"),
                }
            }
        }
    }

    Ok(())
}

/// Show the user-facing message, keep the detail in the error chain for
/// `RUST_LOG=debug`
fn user_facing(err: StockError) -> anyhow::Error {
    debug!(error = %err, kind = ?err.kind(), "Command failed");
    let message = err.user_message();
    anyhow::Error::new(err).context(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_forecast() {
        let cli = Cli::parse_from(["stock-forecast", "forecast", "AAPL", "-v", "60", "--json"]);
        match cli.command {
            Command::Forecast {
                symbol,
                validation_days,
                forecast_days,
                json,
            } => {
                assert_eq!(symbol, "AAPL");
                assert_eq!(validation_days, Some(60));
                assert_eq!(forecast_days, None);
                assert!(json);
            }
            Command::Lookup { .. } => panic!("expected forecast"),
        }
    }

    #[test]
    fn test_parse_lookup_joins_words() {
        let cli = Cli::parse_from(["stock-forecast", "lookup", "general", "motors"]);
        match cli.command {
            Command::Lookup { query, json } => {
                assert_eq!(query.join(" "), "general motors");
                assert!(!json);
            }
            Command::Forecast { .. } => panic!("expected lookup"),
        }
    }

    #[test]
    fn test_user_facing_hides_internals() {
        let err = user_facing(StockError::no_data("ZZZZ"));
        assert!(err.to_string().starts_with("No data found"));
    }
}
