//! Pearson correlation matrices over return tables, whole-range or windowed.

use crate::core::error::NoResult;
use crate::core::table::ReturnTable;
use chrono::NaiveDate;

/// Square, symmetric matrix of pairwise correlations.
///
/// The diagonal is always `1.0`. An off-diagonal entry is `NaN` when the pair
/// has no defined correlation (a constant series, or fewer than two shared
/// observations).
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    tickers: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn new(tickers: Vec<String>, values: Vec<Vec<f64>>) -> anyhow::Result<Self> {
        let n = tickers.len();
        if values.len() != n || values.iter().any(|row| row.len() != n) {
            anyhow::bail!("Correlation matrix must be {n}x{n}");
        }
        Ok(Self { tickers, values })
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.tickers.iter().position(|t| t == a)?;
        let j = self.tickers.iter().position(|t| t == b)?;
        Some(self.values[i][j])
    }
}

/// A correlation matrix computed over a slice of the return rows.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedCorrelation {
    pub matrix: CorrelationMatrix,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub rows: usize,
}

fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    // A series that is constant up to rounding has no variance to normalise
    // by. Two identical constant series still move together perfectly.
    if is_flat(var_x, mean_x, n) || is_flat(var_y, mean_y, n) {
        let identical = pairs
            .iter()
            .all(|(x, y)| (x - y).abs() <= 1e-12 * x.abs().max(y.abs()).max(1.0));
        return if identical { 1.0 } else { f64::NAN };
    }
    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

/// True when the spread of a series is within the rounding noise of its mean.
fn is_flat(var: f64, mean: f64, n: f64) -> bool {
    let noise = 64.0 * n * f64::EPSILON * mean.abs();
    (var / n).sqrt() <= noise
}

/// Pairwise Pearson correlation over every column of `returns`.
pub fn correlate(returns: &ReturnTable) -> Result<CorrelationMatrix, NoResult> {
    if returns.column_count() < 2 {
        return Err(NoResult::InsufficientTickers {
            available: returns.column_count(),
        });
    }
    if returns.row_count() < 2 {
        return Err(NoResult::InsufficientObservations {
            rows: returns.row_count(),
        });
    }

    let columns: Vec<Vec<Option<f64>>> = (0..returns.column_count())
        .map(|c| returns.column(c).collect())
        .collect();
    let n = columns.len();

    let mut values = vec![vec![1.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let r = pearson(&columns[i], &columns[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        tickers: returns.tickers().to_vec(),
        values,
    })
}

/// Checks that a `window`-period window ending at row `end` fits in
/// `rows` observations, and returns the half-open row range it covers.
pub fn window_range(
    rows: usize,
    window: usize,
    end: usize,
) -> Result<std::ops::Range<usize>, NoResult> {
    if window == 0 || window >= rows || end >= rows {
        return Err(NoResult::InfeasibleWindow { window, end, rows });
    }
    let start = (end + 1).saturating_sub(window);
    Ok(start..end + 1)
}

/// Correlation over rows `[max(0, end - window + 1), end]`.
pub fn correlate_window(
    returns: &ReturnTable,
    window: usize,
    end: usize,
) -> Result<WindowedCorrelation, NoResult> {
    let range = window_range(returns.row_count(), window, end)?;
    if range.len() < 2 {
        return Err(NoResult::InsufficientWindow { rows: range.len() });
    }

    let slice = returns.slice_rows(range);
    let matrix = correlate(&slice)?;
    let dates = slice.dates();
    match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => Ok(WindowedCorrelation {
            matrix,
            first_date: *first,
            last_date: *last,
            rows: slice.row_count(),
        }),
        _ => Err(NoResult::InsufficientWindow { rows: 0 }),
    }
}
