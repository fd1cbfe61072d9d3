use super::ui;
use crate::core::basket::{self, Basket};
use comfy_table::Cell;

/// Lists the built-in baskets followed by the configured ones.
pub fn baskets_table(extra: &[Basket]) -> comfy_table::Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Basket"),
        ui::header_cell("Source"),
        ui::header_cell("Tickers"),
    ]);

    let builtin = basket::presets().into_iter().map(|b| (b, "built-in"));
    let configured = extra.iter().cloned().map(|b| (b, "config"));
    for (b, source) in builtin.chain(configured) {
        table.add_row(vec![
            Cell::new(&b.name),
            Cell::new(ui::style_text(source, ui::StyleType::Subtle)),
            Cell::new(b.tickers.join(", ")),
        ]);
    }
    table
}

pub fn run(extra: &[Basket]) {
    println!("{}", baskets_table(extra));
}
