//! Missing-data policies that turn a sparse price table into a dense one.

use crate::core::table::PriceTable;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MissingPolicy {
    /// Remove every row that has at least one absent cell.
    #[default]
    DropAny,
    /// Carry the last known value forward per column, then drop the leading
    /// rows that are still incomplete.
    ForwardFill,
}

impl Display for MissingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                MissingPolicy::DropAny => "drop",
                MissingPolicy::ForwardFill => "ffill",
            }
        )
    }
}

impl FromStr for MissingPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "drop" | "dropna" | "drop-any" => Ok(MissingPolicy::DropAny),
            "ffill" | "forward-fill" => Ok(MissingPolicy::ForwardFill),
            _ => Err(anyhow::anyhow!("Invalid missing-data policy: {}", s)),
        }
    }
}

/// Applies `policy` and returns a table where every cell holds a value.
///
/// The result has no rows when nothing survives.
pub fn clean(prices: &PriceTable, policy: MissingPolicy) -> PriceTable {
    let mut rows: Vec<Vec<Option<f64>>> = prices.rows().to_vec();

    if policy == MissingPolicy::ForwardFill {
        let mut last: Vec<Option<f64>> = vec![None; prices.column_count()];
        for row in rows.iter_mut() {
            for (cell, carried) in row.iter_mut().zip(last.iter_mut()) {
                if cell.is_some() {
                    *carried = *cell;
                } else {
                    *cell = *carried;
                }
            }
        }
    }

    let (dates, rows): (Vec<_>, Vec<_>) = prices
        .dates()
        .iter()
        .copied()
        .zip(rows)
        .filter(|(_, row)| row.iter().all(Option::is_some))
        .unzip();

    debug!(
        "Cleaned with {policy}: kept {} of {} rows",
        rows.len(),
        prices.row_count()
    );
    PriceTable::from_parts(dates, prices.tickers().to_vec(), rows)
}
