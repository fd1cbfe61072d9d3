//! Downsampling of price tables to weekly or monthly observations.

use crate::core::table::PriceTable;
use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Interval {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Interval::Daily => "daily",
                Interval::Weekly => "weekly",
                Interval::Monthly => "monthly",
            }
        )
    }
}

impl FromStr for Interval {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "d" | "1d" => Ok(Interval::Daily),
            "weekly" | "w" | "1wk" => Ok(Interval::Weekly),
            "monthly" | "m" | "1mo" => Ok(Interval::Monthly),
            _ => Err(anyhow::anyhow!("Invalid interval: {}", s)),
        }
    }
}

impl Interval {
    /// The label of the period `date` falls into.
    fn period_end(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Interval::Daily => date,
            Interval::Weekly => {
                let ahead = (Weekday::Fri.num_days_from_monday() + 7
                    - date.weekday().num_days_from_monday())
                    % 7;
                date + Days::new(u64::from(ahead))
            }
            Interval::Monthly => {
                let (year, month) = if date.month() == 12 {
                    (date.year() + 1, 1)
                } else {
                    (date.year(), date.month() + 1)
                };
                NaiveDate::from_ymd_opt(year, month, 1)
                    .and_then(|first| first.pred_opt())
                    .unwrap_or(date)
            }
        }
    }
}

/// Groups rows by `interval` and keeps the last observed value per column.
///
/// Each output row is labelled with its period end (Friday, or the last day
/// of the month). A column with no observation inside a group stays absent.
pub fn resample(prices: &PriceTable, interval: Interval) -> PriceTable {
    if interval == Interval::Daily {
        return prices.clone();
    }

    let mut dates: Vec<NaiveDate> = Vec::new();
    let mut rows: Vec<Vec<Option<f64>>> = Vec::new();

    for (date, row) in prices.dates().iter().zip(prices.rows()) {
        let label = interval.period_end(*date);
        if dates.last() != Some(&label) {
            dates.push(label);
            rows.push(vec![None; prices.column_count()]);
        }
        if let Some(current) = rows.last_mut() {
            for (slot, value) in current.iter_mut().zip(row) {
                if value.is_some() {
                    *slot = *value;
                }
            }
        }
    }

    PriceTable::from_parts(dates, prices.tickers().to_vec(), rows)
}
