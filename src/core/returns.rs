//! Price-to-return transforms.

use crate::core::table::{PriceTable, ReturnTable};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReturnMode {
    /// `p[t] / p[t-1] - 1`
    #[default]
    Percent,
    /// `ln(p[t]) - ln(p[t-1])`
    Log,
    /// Prices passed through unchanged.
    Levels,
}

impl Display for ReturnMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ReturnMode::Percent => "% returns",
                ReturnMode::Log => "log returns",
                ReturnMode::Levels => "price levels",
            }
        )
    }
}

impl FromStr for ReturnMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "percent" | "pct" | "simple" => Ok(ReturnMode::Percent),
            "log" => Ok(ReturnMode::Log),
            "levels" | "raw" | "none" => Ok(ReturnMode::Levels),
            _ => Err(anyhow::anyhow!("Invalid returns transform: {}", s)),
        }
    }
}

impl ReturnMode {
    fn apply(&self, prev: f64, curr: f64) -> f64 {
        match self {
            ReturnMode::Percent => curr / prev - 1.0,
            ReturnMode::Log => curr.ln() - prev.ln(),
            ReturnMode::Levels => curr,
        }
    }
}

/// Transforms prices into returns according to `mode`.
///
/// Differencing modes drop the first row. Results that are not finite (a zero
/// or negative price) become absent cells, and columns left with no value at
/// all are removed.
pub fn to_returns(prices: &PriceTable, mode: ReturnMode) -> ReturnTable {
    if mode == ReturnMode::Levels {
        return prices.clone().drop_empty_columns();
    }
    if prices.row_count() < 2 {
        return ReturnTable::empty(prices.tickers().to_vec());
    }

    let rows = prices
        .rows()
        .windows(2)
        .map(|pair| {
            pair[0]
                .iter()
                .zip(&pair[1])
                .map(|(prev, curr)| match (prev, curr) {
                    (Some(p), Some(c)) => Some(mode.apply(*p, *c)),
                    _ => None,
                })
                .collect()
        })
        .collect();

    ReturnTable::from_parts(
        prices.dates()[1..].to_vec(),
        prices.tickers().to_vec(),
        rows,
    )
    .drop_empty_columns()
}
