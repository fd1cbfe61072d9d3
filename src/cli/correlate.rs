use super::ui;
use crate::core::basket::{self, Basket, BasketMode};
use crate::core::correlation::CorrelationMatrix;
use crate::core::export;
use crate::core::pipeline::{self, Analysis, PipelineParams};
use crate::core::{NoResult, PriceField, PriceProvider, PriceQuery, Table};
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::Cell;
use std::path::PathBuf;
use tracing::{debug, info};

/// Rows of the price table shown before the correlation matrix.
const PRICE_PREVIEW_ROWS: usize = 10;

#[derive(Debug, Clone)]
pub struct CorrelateOptions {
    /// Comma-separated tickers as typed by the user.
    pub tickers: String,
    pub basket: Option<String>,
    pub basket_mode: BasketMode,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub field: PriceField,
    pub params: PipelineParams,
    pub heatmap: bool,
    pub export_returns: Option<PathBuf>,
    pub export_correlation: Option<PathBuf>,
    pub export_prices: Option<PathBuf>,
}

pub async fn run(
    options: &CorrelateOptions,
    provider: &(dyn PriceProvider + Send + Sync),
    extra_baskets: &[Basket],
) -> Result<()> {
    match analyse(options, provider, extra_baskets).await? {
        Ok(analysis) => {
            println!("{}", render_report(&analysis, options));
            export_results(&analysis, options)?;
        }
        Err(no_result) => {
            info!(reason = ?no_result, "No correlation result");
            println!("{}", ui::style_text(&no_result.to_string(), ui::StyleType::Info));
        }
    }
    Ok(())
}

/// Resolves the selection, fetches prices and runs the pipeline.
///
/// The outer `Result` carries fetch failures; the inner one the
/// informational "no result" states.
pub async fn analyse(
    options: &CorrelateOptions,
    provider: &(dyn PriceProvider + Send + Sync),
    extra_baskets: &[Basket],
) -> Result<Result<Analysis, NoResult>> {
    let manual = basket::parse_tickers(&options.tickers);
    let chosen = match &options.basket {
        Some(name) => match basket::find_basket(name, extra_baskets) {
            Some(b) => Some(b),
            None => return Ok(Err(NoResult::UnknownBasket { name: name.clone() })),
        },
        None => None,
    };
    let tickers = match basket::resolve_tickers(&manual, chosen.as_ref(), options.basket_mode) {
        Ok(tickers) => tickers,
        Err(no_result) => return Ok(Err(no_result)),
    };
    if options.end <= options.start {
        return Ok(Err(NoResult::InvalidDateRange {
            start: options.start,
            end: options.end,
        }));
    }

    let query = PriceQuery::new(&tickers, options.start, options.end, options.field);
    debug!("Fetching {} for {:?}", options.field, query.tickers());

    let spinner = ui::new_spinner(&format!("Fetching {} prices...", tickers.len()));
    let fetched = provider.fetch_prices(&query).await;
    spinner.finish_and_clear();
    let raw = fetched?;

    info!(
        rows = raw.row_count(),
        columns = raw.column_count(),
        "Fetched prices"
    );
    Ok(pipeline::run(&raw, &options.params))
}

fn table_to_display(table: &Table, decimals: usize) -> comfy_table::Table {
    let mut display = ui::new_styled_table();
    let mut header = vec![ui::header_cell("Date")];
    header.extend(table.tickers().iter().map(|t| ui::header_cell(t)));
    display.set_header(header);

    for (date, row) in table.dates().iter().zip(table.rows()) {
        let mut cells = vec![Cell::new(date.format("%Y-%m-%d"))];
        cells.extend(row.iter().map(|v| ui::number_cell(*v, decimals)));
        display.add_row(cells);
    }
    display
}

pub fn correlation_table(matrix: &CorrelationMatrix) -> comfy_table::Table {
    let mut display = ui::new_styled_table();
    let mut header = vec![ui::header_cell("")];
    header.extend(matrix.tickers().iter().map(|t| ui::header_cell(t)));
    display.set_header(header);

    for (ticker, row) in matrix.tickers().iter().zip(matrix.values()) {
        let mut cells = vec![ui::header_cell(ticker)];
        cells.extend(row.iter().map(|v| ui::number_cell(Some(*v), 2)));
        display.add_row(cells);
    }
    display
}

pub fn heatmap_table(matrix: &CorrelationMatrix) -> comfy_table::Table {
    let mut display = ui::new_styled_table();
    let mut header = vec![ui::header_cell("ρ")];
    header.extend(matrix.tickers().iter().map(|t| ui::header_cell(t)));
    display.set_header(header);

    for (ticker, row) in matrix.tickers().iter().zip(matrix.values()) {
        let mut cells = vec![ui::header_cell(ticker)];
        cells.extend(row.iter().map(|v| ui::heat_cell(*v)));
        display.add_row(cells);
    }
    display
}

pub fn render_report(analysis: &Analysis, options: &CorrelateOptions) -> String {
    let params = &options.params;
    let mut output = format!(
        "{}\n{}\n\n",
        ui::style_text(
            &format!("{} {} prices", capitalise(&params.interval.to_string()), options.field),
            ui::StyleType::Title
        ),
        ui::style_text(
            &format!(
                "{} to {}, missing data: {}, last {} rows",
                options.start, options.end, params.policy, PRICE_PREVIEW_ROWS
            ),
            ui::StyleType::Subtle
        ),
    );
    output.push_str(&table_to_display(&analysis.prices.tail(PRICE_PREVIEW_ROWS), 2).to_string());

    let title = match &analysis.window {
        Some(w) => format!(
            "Correlation matrix ({}, {}-period window {} to {})",
            params.mode, w.rows, w.first_date, w.last_date
        ),
        None => format!("Correlation matrix ({})", params.mode),
    };
    output.push_str(&format!(
        "\n\n{}\n\n",
        ui::style_text(&title, ui::StyleType::Title)
    ));

    if options.heatmap {
        output.push_str(&heatmap_table(&analysis.correlation).to_string());
    } else {
        output.push_str(&correlation_table(&analysis.correlation).to_string());
    }
    output
}

fn capitalise(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn export_results(analysis: &Analysis, options: &CorrelateOptions) -> Result<()> {
    if let Some(path) = &options.export_returns {
        export::export_table(&analysis.returns, path)?;
        info!("Wrote returns to {}", path.display());
    }
    if let Some(path) = &options.export_correlation {
        export::export_matrix(&analysis.correlation, path)?;
        info!("Wrote correlation matrix to {}", path.display());
    }
    if let Some(path) = &options.export_prices {
        export::export_table(&analysis.prices, path)?;
        info!("Wrote prices to {}", path.display());
    }
    Ok(())
}
