//! Predefined ticker baskets and resolution of the final ticker selection.

use crate::core::error::NoResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Basket {
    pub name: String,
    pub tickers: Vec<String>,
}

const PRESETS: &[(&str, &[&str])] = &[
    (
        "Tech Megacaps (US)",
        &[
            "AAPL", "MSFT", "GOOGL", "AMZN", "META", "NVDA", "TSLA", "ORCL", "INTC", "CSCO", "ADBE",
        ],
    ),
    (
        "Airlines (US + Intl)",
        &[
            "AAL", "DAL", "UAL", "LUV", "ALK", "JBLU", "RYAAY", "BA", "EADSY",
        ],
    ),
    (
        "US Money Center Banks",
        &["JPM", "BAC", "WFC", "C", "GS", "MS", "USB", "PNC"],
    ),
    (
        "Consumer Staples (US)",
        &["KO", "PEP", "PG", "WMT", "COST", "MDLZ", "KHC"],
    ),
    (
        "Semiconductors",
        &["NVDA", "AMD", "AVGO", "TSM", "QCOM", "INTC", "MU", "TXN"],
    ),
    (
        "S&P Sectors (SPDR ETFs)",
        &[
            "XLB", "XLE", "XLF", "XLI", "XLK", "XLP", "XLU", "XLV", "XLY", "XLRE", "XLC",
        ],
    ),
    ("Energy Majors", &["XOM", "CVX", "SHEL", "BP", "TTE"]),
    (
        "Media & Streaming",
        &["NFLX", "DIS", "PARA", "WBD", "ROKU", "SPOT"],
    ),
];

/// The built-in baskets, in display order.
pub fn presets() -> Vec<Basket> {
    PRESETS
        .iter()
        .map(|(name, tickers)| Basket {
            name: name.to_string(),
            tickers: tickers.iter().map(|t| t.to_string()).collect(),
        })
        .collect()
}

/// Finds a basket by case-insensitive name among the presets and `extra`.
///
/// Baskets in `extra` take precedence over presets with the same name.
pub fn find_basket(name: &str, extra: &[Basket]) -> Option<Basket> {
    let wanted = name.trim().to_lowercase();
    extra
        .iter()
        .cloned()
        .chain(presets())
        .find(|b| b.name.to_lowercase() == wanted)
}

/// Splits a comma-separated list into trimmed, upper-cased, unique tickers.
pub fn parse_tickers(raw: &str) -> Vec<String> {
    dedup(raw.split(',').map(|t| t.trim().to_uppercase()))
}

fn dedup(tickers: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tickers
        .into_iter()
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// How a basket combines with manually entered tickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BasketMode {
    /// Sorted union of manual and basket tickers.
    #[default]
    Append,
    /// Basket tickers only, in basket order.
    Replace,
}

/// Resolves the tickers to fetch.
///
/// Fails with [`NoResult::EmptySelection`] when fewer than two remain.
pub fn resolve_tickers(
    manual: &[String],
    basket: Option<&Basket>,
    mode: BasketMode,
) -> Result<Vec<String>, NoResult> {
    let tickers: Vec<String> = match basket {
        Some(b) if !b.tickers.is_empty() => match mode {
            BasketMode::Append => manual
                .iter()
                .chain(&b.tickers)
                .map(|t| t.trim().to_uppercase())
                .filter(|t| !t.is_empty())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            BasketMode::Replace => dedup(b.tickers.iter().map(|t| t.trim().to_uppercase())),
        },
        _ => dedup(manual.iter().cloned()),
    };

    if tickers.len() < 2 {
        return Err(NoResult::EmptySelection {
            count: tickers.len(),
        });
    }
    Ok(tickers)
}
