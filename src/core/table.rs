//! Date-indexed tables of per-ticker values.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Rows indexed by ascending unique dates, columns by unique ticker symbols.
///
/// A cell is `None` when there is no observation for that date and ticker.
/// Non-finite numbers are never stored; they are normalised to `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
}

/// Raw or cleaned prices.
pub type PriceTable = Table;

/// Period-over-period returns (or passthrough levels).
pub type ReturnTable = Table;

impl Table {
    pub fn new(
        dates: Vec<NaiveDate>,
        tickers: Vec<String>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> Result<Self> {
        if dates.len() != rows.len() {
            bail!(
                "Table has {} dates but {} rows",
                dates.len(),
                rows.len()
            );
        }
        if let Some(pair) = dates.windows(2).find(|w| w[0] >= w[1]) {
            bail!(
                "Dates must be ascending and unique: {} is followed by {}",
                pair[0],
                pair[1]
            );
        }
        let mut seen = HashSet::new();
        if let Some(dup) = tickers.iter().find(|t| !seen.insert(t.as_str())) {
            bail!("Duplicate ticker column: {dup}");
        }
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != tickers.len())
        {
            bail!(
                "Row {} ({}) has {} cells, expected {}",
                i,
                dates[i],
                row.len(),
                tickers.len()
            );
        }

        Ok(Self::from_parts(dates, tickers, rows))
    }

    /// Builds a table from already-validated parts.
    pub(crate) fn from_parts(
        dates: Vec<NaiveDate>,
        tickers: Vec<String>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|v| v.filter(|x| x.is_finite())).collect())
            .collect();
        Self {
            dates,
            tickers,
            rows,
        }
    }

    pub fn empty(tickers: Vec<String>) -> Self {
        Self {
            dates: Vec::new(),
            tickers,
            rows: Vec::new(),
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn rows(&self) -> &[Vec<Option<f64>>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True when every cell holds a value.
    pub fn is_dense(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(Option::is_some))
    }

    pub fn column(&self, index: usize) -> impl Iterator<Item = Option<f64>> + '_ {
        self.rows.iter().map(move |row| row[index])
    }

    /// Keeps only the rows in `range`, preserving the column set.
    pub fn slice_rows(&self, range: std::ops::Range<usize>) -> Table {
        Self {
            dates: self.dates[range.clone()].to_vec(),
            tickers: self.tickers.clone(),
            rows: self.rows[range].to_vec(),
        }
    }

    /// Keeps only the last `n` rows.
    pub fn tail(&self, n: usize) -> Table {
        let start = self.rows.len().saturating_sub(n);
        self.slice_rows(start..self.rows.len())
    }

    /// Drops columns where every cell is absent.
    pub fn drop_empty_columns(self) -> Table {
        let keep: Vec<usize> = (0..self.tickers.len())
            .filter(|&c| self.rows.iter().any(|row| row[c].is_some()))
            .collect();
        if keep.len() == self.tickers.len() {
            return self;
        }
        let tickers = keep.iter().map(|&c| self.tickers[c].clone()).collect();
        let rows = self
            .rows
            .into_iter()
            .map(|row| keep.iter().map(|&c| row[c]).collect())
            .collect();
        Self {
            dates: self.dates,
            tickers,
            rows,
        }
    }
}
