//! The returns/correlation pipeline: resample, clean, transform, correlate.

use crate::core::clean::{MissingPolicy, clean};
use crate::core::correlation::{
    CorrelationMatrix, WindowedCorrelation, correlate, correlate_window,
};
use crate::core::error::NoResult;
use crate::core::resample::{Interval, resample};
use crate::core::returns::{ReturnMode, to_returns};
use crate::core::table::{PriceTable, ReturnTable};
use tracing::debug;

/// Rolling window selection. `end` defaults to the last return row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    pub length: usize,
    pub end: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineParams {
    pub interval: Interval,
    pub policy: MissingPolicy,
    pub mode: ReturnMode,
    pub window: Option<WindowSpec>,
}

/// Everything one pipeline run produces.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Resampled and cleaned prices the returns were computed from.
    pub prices: PriceTable,
    pub returns: ReturnTable,
    /// Whole-range matrix, or the windowed one when a window was requested.
    pub correlation: CorrelationMatrix,
    pub window: Option<WindowedCorrelation>,
}

pub fn run(raw: &PriceTable, params: &PipelineParams) -> Result<Analysis, NoResult> {
    if raw.is_empty() {
        return Err(NoResult::NoData);
    }
    let available = raw.clone().drop_empty_columns().column_count();
    if available < 2 {
        return Err(NoResult::InsufficientTickers { available });
    }

    let resampled = resample(raw, params.interval);
    let prices = clean(&resampled, params.policy);
    if prices.row_count() < 2 {
        return Err(NoResult::InsufficientObservations {
            rows: prices.row_count(),
        });
    }

    let returns = to_returns(&prices, params.mode);
    debug!(
        rows = returns.row_count(),
        columns = returns.column_count(),
        "Computed {}",
        params.mode
    );

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

    let (correlation, window) = match params.window {
        Some(w) => {
            let end = w.end.unwrap_or(returns.row_count() - 1);
            let windowed = correlate_window(&returns, w.length, end)?;
            (windowed.matrix.clone(), Some(windowed))
        }
        None => (correlate(&returns)?, None),
    };

    Ok(Analysis {
        prices,
        returns,
        correlation,
        window,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::table::tests::{date, table};

    fn proportional() -> PriceTable {
        table(
            &["A", "B"],
            &[
                ("2024-01-02", vec![Some(100.0), Some(50.0)]),
                ("2024-01-03", vec![Some(110.0), Some(55.0)]),
                ("2024-01-04", vec![Some(121.0), Some(60.5)]),
            ],
        )
    }

    fn wobbly() -> PriceTable {
        table(
            &["A", "B", "C"],
            &[
                ("2024-01-02", vec![Some(100.0), Some(50.0), Some(10.0)]),
                ("2024-01-03", vec![Some(101.0), Some(49.0), Some(10.5)]),
                ("2024-01-04", vec![Some(99.0), Some(51.0), None]),
                ("2024-01-05", vec![Some(102.0), Some(52.0), Some(10.2)]),
                ("2024-01-08", vec![Some(103.0), Some(50.5), Some(10.4)]),
                ("2024-01-09", vec![Some(101.5), Some(50.0), Some(10.1)]),
            ],
        )
    }

    #[test]
    fn proportional_prices_correlate_perfectly() {
        let analysis = run(&proportional(), &PipelineParams::default()).unwrap();
        for row in analysis.returns.rows() {
            for cell in row {
                assert!((cell.unwrap() - 0.10).abs() < 1e-12);
            }
        }
        let r = analysis.correlation.get("A", "B").unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        assert!(analysis.window.is_none());
    }

    #[test]
    fn fewer_than_two_tickers_is_no_result() {
        let t = table(
            &["A"],
            &[("2024-01-02", vec![Some(1.0)]), ("2024-01-03", vec![Some(2.0)])],
        );
        assert_eq!(
            run(&t, &PipelineParams::default()).unwrap_err(),
            NoResult::InsufficientTickers { available: 1 }
        );
    }

    #[test]
    fn ticker_without_any_price_does_not_count() {
        let t = table(
            &["A", "B"],
            &[
                ("2024-01-02", vec![Some(1.0), None]),
                ("2024-01-03", vec![Some(2.0), None]),
            ],
        );
        assert_eq!(
            run(&t, &PipelineParams::default()).unwrap_err(),
            NoResult::InsufficientTickers { available: 1 }
        );
    }

    #[test]
    fn empty_prices_are_no_data() {
        let t = PriceTable::empty(vec!["A".to_string(), "B".to_string()]);
        assert_eq!(
            run(&t, &PipelineParams::default()).unwrap_err(),
            NoResult::NoData
        );
    }

    #[test]
    fn no_overlap_after_cleaning() {
        let t = table(
            &["A", "B"],
            &[
                ("2024-01-02", vec![Some(1.0), None]),
                ("2024-01-03", vec![None, Some(2.0)]),
            ],
        );
        assert_eq!(
            run(&t, &PipelineParams::default()).unwrap_err(),
            NoResult::InsufficientObservations { rows: 0 }
        );
    }

    #[test]
    fn forward_fill_keeps_the_gap_row() {
        let params = PipelineParams {
            policy: MissingPolicy::ForwardFill,
            ..Default::default()
        };
        let analysis = run(&wobbly(), &params).unwrap();
        assert_eq!(analysis.prices.row_count(), 6);
        assert_eq!(analysis.returns.row_count(), 5);

        let dropped = run(&wobbly(), &PipelineParams::default()).unwrap();
        assert_eq!(dropped.prices.row_count(), 5);
    }

    #[test]
    fn window_matching_row_count_is_infeasible() {
        let params = PipelineParams {
            window: Some(WindowSpec {
                length: 4,
                end: None,
            }),
            ..Default::default()
        };
        // Five prices after dropping the gap row leave four returns.
        assert_eq!(
            run(&wobbly(), &params).unwrap_err(),
            NoResult::InfeasibleWindow {
                window: 4,
                end: 3,
                rows: 4
            }
        );
    }

    #[test]
    fn window_one_short_covers_all_but_first_row() {
        let params = PipelineParams {
            window: Some(WindowSpec {
                length: 3,
                end: None,
            }),
            ..Default::default()
        };
        let analysis = run(&wobbly(), &params).unwrap();
        let window = analysis.window.expect("windowed result");
        assert_eq!(window.rows, 3);
        assert_eq!(window.first_date, date("2024-01-05"));
        assert_eq!(window.last_date, date("2024-01-09"));
        assert_eq!(analysis.correlation, window.matrix);
    }

    #[test]
    fn weekly_interval_shrinks_rows() {
        let params = PipelineParams {
            interval: Interval::Weekly,
            mode: ReturnMode::Levels,
            ..Default::default()
        };
        let analysis = run(&wobbly(), &params).unwrap();
        assert_eq!(
            analysis.prices.dates(),
            &[date("2024-01-05"), date("2024-01-12")]
        );
        assert_eq!(analysis.returns.row_count(), 2);
    }
}
