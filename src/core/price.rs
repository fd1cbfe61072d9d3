//! Price fetching abstractions and core types

use crate::core::table::PriceTable;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PriceField {
    Open,
    High,
    Low,
    #[default]
    Close,
    AdjClose,
    Volume,
}

impl Display for PriceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PriceField::Open => "Open",
                PriceField::High => "High",
                PriceField::Low => "Low",
                PriceField::Close => "Close",
                PriceField::AdjClose => "Adj Close",
                PriceField::Volume => "Volume",
            }
        )
    }
}

impl FromStr for PriceField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', '-', ' '], "").as_str() {
            "open" => Ok(PriceField::Open),
            "high" => Ok(PriceField::High),
            "low" => Ok(PriceField::Low),
            "close" => Ok(PriceField::Close),
            "adjclose" | "adjustedclose" => Ok(PriceField::AdjClose),
            "volume" => Ok(PriceField::Volume),
            _ => Err(anyhow::anyhow!("Invalid price field: {}", s)),
        }
    }
}

impl PriceField {
    /// Fields to try, in order, when this one is missing for a symbol.
    pub fn fallbacks(&self) -> &'static [PriceField] {
        match self {
            PriceField::AdjClose => &[PriceField::Close],
            PriceField::Close => &[PriceField::AdjClose],
            _ => &[PriceField::AdjClose, PriceField::Close],
        }
    }
}

/// A request for one field of daily prices over an inclusive date range.
///
/// Doubles as the cache key, so tickers are kept sorted and unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceQuery {
    tickers: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub field: PriceField,
}

impl PriceQuery {
    pub fn new(tickers: &[String], start: NaiveDate, end: NaiveDate, field: PriceField) -> Self {
        let mut tickers = tickers.to_vec();
        tickers.sort();
        tickers.dedup();
        Self {
            tickers,
            start,
            end,
            field,
        }
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Returns a dates x tickers table. Symbols the provider has nothing for
    /// are left out; the table is empty when no symbol has data.
    async fn fetch_prices(&self, query: &PriceQuery) -> Result<PriceTable>;
}
