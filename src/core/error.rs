//! Informational "no result" states of the correlation pipeline.
//!
//! None of these are faults. Every stage returns one of them when it cannot
//! produce a meaningful result, and the caller shows the guidance message
//! instead of continuing to the next stage.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoResult {
    #[error("Enter at least two valid tickers (got {count}).")]
    EmptySelection { count: usize },

    #[error("Unknown basket '{name}'. Run `corrmat baskets` to list the available baskets.")]
    UnknownBasket { name: String },

    #[error("End date {end} must be after start date {start}.")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("No price data was returned for the selected tickers and date range.")]
    NoData,

    #[error(
        "Only {available} ticker(s) have usable data; at least two are needed. Try adjusting the date range or tickers."
    )]
    InsufficientTickers { available: usize },

    #[error(
        "Not enough overlapping data to compute correlation ({rows} observation(s)). Try adjusting the date range or tickers."
    )]
    InsufficientObservations { rows: usize },

    #[error(
        "A rolling window of {window} periods ending at row {end} is not feasible with {rows} return observations."
    )]
    InfeasibleWindow {
        window: usize,
        end: usize,
        rows: usize,
    },

    #[error("The selected window holds only {rows} observation(s); at least two are needed.")]
    InsufficientWindow { rows: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_user_facing_guidance() {
        let msg = NoResult::EmptySelection { count: 1 }.to_string();
        assert_eq!(msg, "Enter at least two valid tickers (got 1).");

        let msg = NoResult::InfeasibleWindow {
            window: 10,
            end: 9,
            rows: 10,
        }
        .to_string();
        assert!(msg.contains("10 periods"));
        assert!(msg.contains("not feasible"));
    }
}
