use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, NaiveTime};
use futures::future::join_all;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

use crate::core::{PriceField, PriceProvider, PriceQuery, PriceTable};
use crate::providers::util::with_retry;

pub struct YahooFinanceProvider {
    base_url: String,
}

impl YahooFinanceProvider {
    pub fn new(base_url: &str) -> Self {
        YahooFinanceProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
    error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Deserialize, Debug)]
struct Quote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

#[derive(Deserialize, Debug)]
struct AdjClose {
    adjclose: Option<Vec<Option<f64>>>,
}

impl ChartItem {
    fn field_values(&self, field: PriceField) -> Option<&Vec<Option<f64>>> {
        let indicators = self.indicators.as_ref()?;
        let values = match field {
            PriceField::AdjClose => indicators.adjclose.as_ref()?.first()?.adjclose.as_ref(),
            _ => {
                let quote = indicators.quote.first()?;
                match field {
                    PriceField::Open => quote.open.as_ref(),
                    PriceField::High => quote.high.as_ref(),
                    PriceField::Low => quote.low.as_ref(),
                    PriceField::Close => quote.close.as_ref(),
                    PriceField::Volume => quote.volume.as_ref(),
                    PriceField::AdjClose => None,
                }
            }
        }?;
        values.iter().any(Option::is_some).then_some(values)
    }

    /// Daily values for `field`, falling back to adjusted close and close
    /// when the symbol has no data for it.
    fn series(&self, symbol: &str, field: PriceField) -> Vec<(NaiveDate, f64)> {
        let Some(timestamps) = self.timestamp.as_ref() else {
            return Vec::new();
        };
        let chosen = std::iter::once(field)
            .chain(field.fallbacks().iter().copied())
            .find_map(|f| self.field_values(f).map(|values| (f, values)));
        let Some((used, values)) = chosen else {
            return Vec::new();
        };
        if used != field {
            warn!("{} has no {} data, using {}", symbol, field, used);
        }

        let offset = self.meta.as_ref().and_then(|m| m.gmtoffset).unwrap_or(0);
        timestamps
            .iter()
            .zip(values)
            .filter_map(|(ts, value)| {
                let date = DateTime::from_timestamp(ts + offset, 0)?.date_naive();
                Some((date, (*value)?))
            })
            .collect()
    }
}

fn day_start_timestamp(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

impl YahooFinanceProvider {
    /// Builds the chart URL with `symbol` as a single escaped path segment.
    fn chart_url(&self, symbol: &str, query: &PriceQuery) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid Yahoo base URL: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Yahoo base URL cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);

        let end_exclusive = query.end.checked_add_days(Days::new(1)).unwrap_or(query.end);
        url.query_pairs_mut()
            .append_pair("period1", &day_start_timestamp(query.start).to_string())
            .append_pair("period2", &day_start_timestamp(end_exclusive).to_string())
            .append_pair("interval", "1d")
            .append_pair("includeAdjustedClose", "true");
        Ok(url)
    }

    #[instrument(name = "YahooChartFetch", skip(self, client, query), fields(symbol = %symbol))]
    async fn fetch_symbol(
        &self,
        client: &reqwest::Client,
        symbol: &str,
        query: &PriceQuery,
    ) -> Result<Vec<(NaiveDate, f64)>> {
        let url = self.chart_url(symbol, query)?;
        debug!("Requesting price history from {}", url);

        let response = with_retry(|| client.get(url.clone()).send(), 3, 500)
            .await
            .with_context(|| format!("Request error for symbol: {symbol} URL: {url}"))?;

        if response.status() == StatusCode::NOT_FOUND {
            warn!("No data found for symbol: {}", symbol);
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        let text = response.text().await?;
        let data: YahooChartResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;

        if let Some(err) = data.chart.error {
            warn!(
                "Chart error for {}: {} {}",
                symbol,
                err.code.unwrap_or_default(),
                err.description.unwrap_or_default()
            );
        }

        let Some(item) = data.chart.result.and_then(|r| r.into_iter().next()) else {
            warn!("No price data found for symbol: {}", symbol);
            return Ok(Vec::new());
        };

        let series: Vec<(NaiveDate, f64)> = item
            .series(symbol, query.field)
            .into_iter()
            .filter(|(date, _)| *date >= query.start && *date <= query.end)
            .collect();
        debug!("Received {} observations for {}", series.len(), symbol);
        Ok(series)
    }
}

/// Aligns per-symbol series on their union of dates.
fn merge_series(series: Vec<(String, Vec<(NaiveDate, f64)>)>) -> PriceTable {
    let series: Vec<_> = series.into_iter().filter(|(_, s)| !s.is_empty()).collect();
    let tickers: Vec<String> = series.iter().map(|(t, _)| t.clone()).collect();

    let mut by_date: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
    for (col, (_, points)) in series.iter().enumerate() {
        for (date, value) in points {
            by_date.entry(*date).or_insert_with(|| vec![None; tickers.len()])[col] = Some(*value);
        }
    }

    let (dates, rows): (Vec<NaiveDate>, Vec<Vec<Option<f64>>>) = by_date.into_iter().unzip();
    PriceTable::from_parts(dates, tickers, rows)
}

#[async_trait]
impl PriceProvider for YahooFinanceProvider {
    async fn fetch_prices(&self, query: &PriceQuery) -> Result<PriceTable> {
        if query.tickers().is_empty() {
            return Ok(PriceTable::default());
        }

        let client = reqwest::Client::builder()
            .user_agent("corrmat/1.0")
            .build()?;

        let futures = query.tickers().iter().map(|symbol| {
            let client = &client;
            async move {
                let series = self.fetch_symbol(client, symbol, query).await;
                (symbol.clone(), series)
            }
        });

        let mut fetched = Vec::with_capacity(query.tickers().len());
        for (symbol, series) in join_all(futures).await {
            fetched.push((symbol, series?));
        }

        Ok(merge_series(fetched))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn ts(s: &str) -> i64 {
        // 14:30 UTC, a regular-session open in New York.
        day_start_timestamp(date(s)) + 14 * 3600 + 30 * 60
    }

    fn query(tickers: &[&str], field: PriceField) -> PriceQuery {
        let tickers: Vec<String> = tickers.iter().map(|t| t.to_string()).collect();
        PriceQuery::new(&tickers, date("2024-01-02"), date("2024-01-05"), field)
    }

    fn chart_body(days: &[&str], close: &[Option<f64>], adjclose: Option<&[f64]>) -> String {
        let timestamps: Vec<String> = days.iter().map(|d| ts(d).to_string()).collect();
        let close: Vec<String> = close
            .iter()
            .map(|v| v.map_or("null".to_string(), |x| x.to_string()))
            .collect();
        let adj = adjclose.map_or(String::new(), |a| {
            let values: Vec<String> = a.iter().map(|x| x.to_string()).collect();
            format!(r#", "adjclose": [{{"adjclose": [{}]}}]"#, values.join(","))
        });
        format!(
            r#"{{
                "chart": {{
                    "result": [{{
                        "meta": {{"currency": "USD", "gmtoffset": -18000}},
                        "timestamp": [{}],
                        "indicators": {{
                            "quote": [{{"close": [{}]}}]{}
                        }}
                    }}],
                    "error": null
                }}
            }}"#,
            timestamps.join(","),
            close.join(","),
            adj
        )
    }

    async fn mount(server: &MockServer, symbol: &str, status: u16, body: String) {
        Mock::given(method("GET"))
            .and(path(format!("/v8/finance/chart/{symbol}")))
            .and(query_param("interval", "1d"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_fetches_and_aligns_close_prices() {
        let server = MockServer::start().await;
        mount(
            &server,
            "AAPL",
            200,
            chart_body(
                &["2024-01-02", "2024-01-03", "2024-01-04"],
                &[Some(185.6), Some(184.2), Some(181.9)],
                None,
            ),
        )
        .await;
        mount(
            &server,
            "MSFT",
            200,
            chart_body(
                &["2024-01-02", "2024-01-04", "2024-01-05"],
                &[Some(370.9), None, Some(367.8)],
                None,
            ),
        )
        .await;

        let provider = YahooFinanceProvider::new(&server.uri());
        let table = provider
            .fetch_prices(&query(&["MSFT", "AAPL"], PriceField::Close))
            .await
            .unwrap();

        assert_eq!(table.tickers(), &["AAPL".to_string(), "MSFT".to_string()]);
        assert_eq!(
            table.dates(),
            &[
                date("2024-01-02"),
                date("2024-01-03"),
                date("2024-01-04"),
                date("2024-01-05")
            ]
        );
        assert_eq!(table.rows()[0], vec![Some(185.6), Some(370.9)]);
        assert_eq!(table.rows()[1], vec![Some(184.2), None]);
        assert_eq!(table.rows()[2], vec![Some(181.9), None]);
        assert_eq!(table.rows()[3], vec![None, Some(367.8)]);
    }

    #[tokio::test]
    async fn test_falls_back_when_field_missing() {
        let server = MockServer::start().await;
        mount(
            &server,
            "SPY",
            200,
            chart_body(&["2024-01-02", "2024-01-03"], &[Some(472.6), Some(468.8)], None),
        )
        .await;
        mount(
            &server,
            "QQQ",
            200,
            chart_body(
                &["2024-01-02", "2024-01-03"],
                &[Some(400.0), Some(396.0)],
                Some(&[399.1, 395.2]),
            ),
        )
        .await;

        let provider = YahooFinanceProvider::new(&server.uri());
        let table = provider
            .fetch_prices(&query(&["SPY", "QQQ"], PriceField::AdjClose))
            .await
            .unwrap();

        // QQQ has adjusted closes, SPY falls back to close.
        assert_eq!(table.tickers(), &["QQQ".to_string(), "SPY".to_string()]);
        assert_eq!(table.rows()[0], vec![Some(399.1), Some(472.6)]);
        assert_eq!(table.rows()[1], vec![Some(395.2), Some(468.8)]);
    }

    #[tokio::test]
    async fn test_unknown_symbols_are_omitted() {
        let server = MockServer::start().await;
        mount(
            &server,
            "AAPL",
            200,
            chart_body(&["2024-01-02"], &[Some(185.6)], None),
        )
        .await;
        mount(
            &server,
            "NOPE",
            404,
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#.to_string(),
        )
        .await;
        mount(
            &server,
            "EMPTY",
            200,
            r#"{"chart":{"result":[],"error":null}}"#.to_string(),
        )
        .await;

        let provider = YahooFinanceProvider::new(&server.uri());
        let table = provider
            .fetch_prices(&query(&["AAPL", "NOPE", "EMPTY"], PriceField::Close))
            .await
            .unwrap();
        assert_eq!(table.tickers(), &["AAPL".to_string()]);
        assert_eq!(table.row_count(), 1);
    }

    #[tokio::test]
    async fn test_nothing_found_is_empty_table() {
        let server = MockServer::start().await;
        mount(
            &server,
            "NOPE",
            404,
            r#"{"chart":{"result":null,"error":null}}"#.to_string(),
        )
        .await;

        let provider = YahooFinanceProvider::new(&server.uri());
        let table = provider
            .fetch_prices(&query(&["NOPE"], PriceField::Close))
            .await
            .unwrap();
        assert!(table.is_empty());
        assert_eq!(table.column_count(), 0);
    }

    #[tokio::test]
    async fn test_symbol_is_escaped_in_path() {
        let server = MockServer::start().await;
        mount(
            &server,
            "BRK%2FB",
            200,
            chart_body(&["2024-01-02", "2024-01-03"], &[Some(1.0), Some(2.0)], None),
        )
        .await;

        let provider = YahooFinanceProvider::new(&server.uri());
        let table = provider
            .fetch_prices(&query(&["BRK/B"], PriceField::Close))
            .await
            .unwrap();
        assert_eq!(table.tickers(), &["BRK/B".to_string()]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_chart_url_escapes_reserved_characters() {
        let provider = YahooFinanceProvider::new("http://localhost:1234/api/");
        let url = provider
            .chart_url("A#B?C", &query(&["A#B?C"], PriceField::Close))
            .unwrap();
        assert_eq!(url.path(), "/api/v8/finance/chart/A%23B%3FC");
        assert_eq!(
            url.query(),
            Some("period1=1704153600&period2=1704499200&interval=1d&includeAdjustedClose=true")
        );
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let server = MockServer::start().await;
        mount(&server, "AAPL", 500, String::new()).await;

        let provider = YahooFinanceProvider::new(&server.uri());
        let result = provider
            .fetch_prices(&query(&["AAPL"], PriceField::Close))
            .await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 500 Internal Server Error for symbol: AAPL"
        );
    }

    #[tokio::test]
    async fn test_malformed_response_is_reported() {
        let server = MockServer::start().await;
        mount(&server, "AAPL", 200, r#"{"charts": {}}"#.to_string()).await;

        let provider = YahooFinanceProvider::new(&server.uri());
        let result = provider
            .fetch_prices(&query(&["AAPL"], PriceField::Close))
            .await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse JSON response for AAPL")
        );
    }
}
