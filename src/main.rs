use anyhow::Result;
use chrono::{Days, Local, NaiveDate};
use clap::{Args, CommandFactory, Parser, Subcommand};
use corrmat::cli::correlate::CorrelateOptions;
use corrmat::core::basket::BasketMode;
use corrmat::core::clean::MissingPolicy;
use corrmat::core::log::init_logging;
use corrmat::core::pipeline::{PipelineParams, WindowSpec};
use corrmat::core::price::PriceField;
use corrmat::core::resample::Interval;
use corrmat::core::returns::ReturnMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Compute and display the correlation matrix of ticker returns
    Correlate(CorrelateArgs),
    /// List predefined and configured ticker baskets
    Baskets,
}

#[derive(Args)]
struct CorrelateArgs {
    /// Tickers, comma-separated
    #[arg(short, long, default_value = "AAPL,MSFT,GOOGL,AMZN,NVDA")]
    tickers: String,

    /// Predefined or configured basket to add to the tickers
    #[arg(short, long)]
    basket: Option<String>,

    /// Use only the basket tickers instead of appending them
    #[arg(long, requires = "basket")]
    basket_only: bool,

    /// Start date (YYYY-MM-DD), defaults to one year before the end date
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD, inclusive), defaults to today
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Sampling interval: daily, weekly or monthly
    #[arg(short, long, default_value = "daily")]
    interval: Interval,

    /// Price field: open, high, low, close, adj-close or volume
    #[arg(short, long, default_value = "close")]
    field: PriceField,

    /// Returns transform: percent, log or levels
    #[arg(long, default_value = "percent")]
    transform: ReturnMode,

    /// Missing data policy: drop or ffill
    #[arg(short, long, default_value = "drop")]
    missing: MissingPolicy,

    /// Rolling window length in periods
    #[arg(short, long)]
    window: Option<usize>,

    /// Row index of the rolling window end, defaults to the last row
    #[arg(long, requires = "window")]
    window_end: Option<usize>,

    /// Show a color-mapped heatmap instead of the numeric grid
    #[arg(long)]
    heatmap: bool,

    /// Write the return table to a CSV file
    #[arg(long)]
    export_returns: Option<PathBuf>,

    /// Write the correlation matrix to a CSV file
    #[arg(long)]
    export_correlation: Option<PathBuf>,

    /// Write the cleaned prices to a CSV file
    #[arg(long)]
    export_prices: Option<PathBuf>,
}

impl From<CorrelateArgs> for CorrelateOptions {
    fn from(args: CorrelateArgs) -> CorrelateOptions {
        let end = args.end.unwrap_or_else(|| Local::now().date_naive());
        let start = args
            .start
            .unwrap_or_else(|| end.checked_sub_days(Days::new(365)).unwrap_or(end));

        CorrelateOptions {
            tickers: args.tickers,
            basket: args.basket,
            basket_mode: if args.basket_only {
                BasketMode::Replace
            } else {
                BasketMode::Append
            },
            start,
            end,
            field: args.field,
            params: PipelineParams {
                interval: args.interval,
                policy: args.missing,
                mode: args.transform,
                window: args.window.map(|length| WindowSpec {
                    length,
                    end: args.window_end,
                }),
            },
            heatmap: args.heatmap,
            export_returns: args.export_returns,
            export_correlation: args.export_correlation,
            export_prices: args.export_prices,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config_path = cli.config_path.as_deref();
    let result = match cli.command {
        Some(Commands::Setup) => corrmat::cli::setup::setup(),
        Some(Commands::Correlate(args)) => {
            corrmat::run_command(
                corrmat::AppCommand::Correlate(Box::new(args.into())),
                config_path,
            )
            .await
        }
        Some(Commands::Baskets) => {
            corrmat::run_command(corrmat::AppCommand::Baskets, config_path).await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
