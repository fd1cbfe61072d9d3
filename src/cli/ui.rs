use crate::core::heatmap::{self, LabelTone};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Info,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Info => style(text).yellow(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Formats an `Option<f64>` into a right-aligned cell. `None` is displayed as "N/A".
pub fn number_cell(value: Option<f64>, decimals: usize) -> Cell {
    match value {
        Some(v) if v.is_finite() => {
            Cell::new(format!("{v:.decimals$}")).set_alignment(CellAlignment::Right)
        }
        _ => na_cell(),
    }
}

/// Creates a cell for "N/A" values.
pub fn na_cell() -> Cell {
    Cell::new("N/A")
        .fg(Color::DarkGrey)
        .set_alignment(CellAlignment::Right)
}

/// Correlation value on a color-mapped background with a contrasting label.
pub fn heat_cell(value: f64) -> Cell {
    let heat = heatmap::heat_cell(value);
    let fg = match heat.tone {
        LabelTone::Light => Color::White,
        LabelTone::Dark => Color::Black,
    };
    Cell::new(heat.label)
        .bg(Color::Rgb {
            r: heat.background.r,
            g: heat.background.g,
            b: heat.background.b,
        })
        .fg(fg)
        .set_alignment(CellAlignment::Center)
}

/// Creates a spinner shown while a request is in flight.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
