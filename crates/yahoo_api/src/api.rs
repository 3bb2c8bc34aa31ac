use chrono::{NaiveDate, Utc};
use history_model::{HistoryEntry, Interval, Period, StockInfo};
use itertools::izip;
use log::debug;
use serde::Deserialize;

use crate::error::ApiError;

pub const YAHOO_BASE_API_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Deserialize)]
struct ChartJSON {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: String,
    long_name: Option<String>,
    short_name: Option<String>,
    currency: Option<String>,
    full_exchange_name: Option<String>,
    exchange_name: Option<String>,
    instrument_type: Option<String>,
    regular_market_price: Option<f64>,
    fifty_two_week_high: Option<f64>,
    fifty_two_week_low: Option<f64>,
    exchange_timezone_name: Option<String>,
    data_granularity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

impl From<ChartMeta> for StockInfo {
    fn from(meta: ChartMeta) -> Self {
        StockInfo {
            symbol: meta.symbol,
            long_name: meta.long_name,
            short_name: meta.short_name,
            currency: meta.currency,
            exchange_name: meta.full_exchange_name.or(meta.exchange_name),
            instrument_type: meta.instrument_type,
            regular_market_price: meta.regular_market_price,
            fifty_two_week_high: meta.fifty_two_week_high,
            fifty_two_week_low: meta.fifty_two_week_low,
            timezone: meta.exchange_timezone_name,
        }
    }
}

/// Price history and metadata decoded from one chart response.
#[derive(Debug, Clone)]
pub struct StockData {
    pub info: StockInfo,
    pub history: Vec<HistoryEntry>,
}

pub struct YahooAPI {
    base_url: String,
    client: reqwest::Client,
    headers: reqwest::header::HeaderMap,
}

impl YahooAPI {
    pub fn new(base_url: &str) -> Self {
        let mut reqwest_headers = reqwest::header::HeaderMap::new();
        reqwest_headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36"),
        );

        YahooAPI {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            headers: reqwest_headers,
        }
    }

    pub async fn get_history(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<HistoryEntry>, ApiError> {
        Ok(self.get_stock(ticker, period, interval).await?.history)
    }

    pub async fn get_info(&self, ticker: &str) -> Result<StockInfo, ApiError> {
        Ok(self
            .get_stock(ticker, Period::FiveDays, Interval::OneDay)
            .await?
            .info)
    }

    pub async fn get_stock(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> Result<StockData, ApiError> {
        if ticker.is_empty() {
            return Err(ApiError::NotFound(ticker.to_string()));
        }
        validate_range(period, interval)?;

        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);

        // the upstream coarsens the bars of `range=max`, so the whole history
        // is requested as an explicit time range
        let span = match period {
            Period::Max => {
                let timerange = self.get_time_range();
                vec![
                    ("period1", timerange.start.to_string()),
                    ("period2", timerange.end.to_string()),
                ]
            }
            _ => vec![("range", period.as_str().to_string())],
        };

        debug!(
            "get_stock | url: {} | span: {:?} | interval: {}",
            url, span, interval
        );

        let response = self
            .client
            .get(&url)
            .headers(self.headers.clone())
            .query(&span)
            .query(&[
                ("interval", interval.as_str()),
                ("includePrePost", "false"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        debug!("get_stock | status: {} | bytes: {}", status, body.len());

        match parse_chart(&body, interval) {
            Err(ApiError::Decode(_)) if !status.is_success() => {
                Err(ApiError::Status(status.as_u16()))
            }
            parsed => parsed,
        }
    }

    fn get_time_range(&self) -> TimeRange {
        TimeRange {
            start: 0,
            end: Utc::now().timestamp(),
        }
    }
}

struct TimeRange {
    start: i64,
    end: i64,
}

/// Rejects combinations the upstream refuses to serve, before any request
/// is made.
pub fn validate_range(period: Period, interval: Interval) -> Result<(), ApiError> {
    validate_range_on(period, interval, Utc::now().date_naive())
}

pub fn validate_range_on(
    period: Period,
    interval: Interval,
    today: NaiveDate,
) -> Result<(), ApiError> {
    let Some(lookback) = interval.max_lookback_days() else {
        return Ok(());
    };
    match period.max_days(today) {
        Some(days) if days <= lookback => Ok(()),
        _ => Err(ApiError::InvalidRange { period, interval }),
    }
}

/// Decodes a chart response whose bars must be of size `interval`.
pub fn parse_chart(body: &str, interval: Interval) -> Result<StockData, ApiError> {
    let json: ChartJSON = serde_json::from_str(body)?;

    if let Some(error) = json.chart.error {
        return Err(ApiError::Api {
            code: error.code,
            description: error.description,
        });
    }

    let result = json
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| ApiError::NotFound(String::new()))?;

    if let Some(granularity) = &result.meta.data_granularity {
        if granularity != interval.as_str() {
            return Err(ApiError::Granularity {
                requested: interval,
                returned: granularity.clone(),
            });
        }
    }

    let symbol = result.meta.symbol.clone();
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let len = result.timestamp.len();
    let lengths = [
        quote.open.len(),
        quote.high.len(),
        quote.low.len(),
        quote.close.len(),
        quote.volume.len(),
    ];
    if lengths.iter().any(|l| *l != len) {
        return Err(ApiError::Malformed(format!(
            "{} timestamps but quote columns of length {:?}",
            len, lengths
        )));
    }

    let history: Vec<HistoryEntry> = izip!(
        &result.timestamp,
        &quote.open,
        &quote.high,
        &quote.low,
        &quote.close,
        &quote.volume
    )
    .filter_map(|(t, o, h, l, c, v)| {
        let close = (*c)?;
        Some(HistoryEntry {
            date: chrono::DateTime::from_timestamp(*t, 0)?,
            open: o.unwrap_or(close),
            high: h.unwrap_or(close),
            low: l.unwrap_or(close),
            close,
            volume: v.unwrap_or_default(),
        })
    })
    .collect();

    if history.is_empty() {
        return Err(ApiError::NotFound(symbol));
    }

    Ok(StockData {
        info: result.meta.into(),
        history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART_OK: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "currency": "USD",
                    "symbol": "AAPL",
                    "exchangeName": "NMS",
                    "fullExchangeName": "NasdaqGS",
                    "instrumentType": "EQUITY",
                    "regularMarketPrice": 231.59,
                    "fiftyTwoWeekHigh": 260.1,
                    "fiftyTwoWeekLow": 169.21,
                    "longName": "Apple Inc.",
                    "shortName": "Apple Inc.",
                    "exchangeTimezoneName": "America/New_York",
                    "dataGranularity": "1d"
                },
                "timestamp": [1735828200, 1735914600, 1736173800],
                "indicators": {
                    "quote": [{
                        "open": [248.93, 243.36, null],
                        "high": [249.1, 244.18, 247.33],
                        "low": [241.82, 241.89, null],
                        "close": [243.85, null, 245.0],
                        "volume": [55740700, 40244100, null]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parse_chart_pass_history_and_info() {
        let data = parse_chart(CHART_OK, Interval::OneDay).unwrap();

        assert_eq!(data.info.symbol, "AAPL");
        assert_eq!(data.info.exchange_name.as_deref(), Some("NasdaqGS"));
        assert_eq!(data.info.timezone.as_deref(), Some("America/New_York"));

        assert_eq!(data.history.len(), 2);
        assert_eq!(data.history[0].close, 243.85);
        assert_eq!(data.history[0].volume, 55740700);
        assert_eq!(data.history[0].date.timestamp(), 1735828200);
    }

    #[test]
    fn parse_chart_pass_fills_missing_columns_from_close() {
        let data = parse_chart(CHART_OK, Interval::OneDay).unwrap();
        let last = &data.history[1];
        assert_eq!(last.open, 245.0);
        assert_eq!(last.high, 247.33);
        assert_eq!(last.low, 245.0);
        assert_eq!(last.volume, 0);
    }

    #[test]
    fn parse_chart_fail_coarser_bars_than_requested() {
        let monthly = CHART_OK.replace(r#""dataGranularity": "1d""#, r#""dataGranularity": "3mo""#);
        match parse_chart(&monthly, Interval::OneDay) {
            Err(ApiError::Granularity {
                requested,
                returned,
            }) => {
                assert_eq!(requested, Interval::OneDay);
                assert_eq!(returned, "3mo");
            }
            other => panic!("expected granularity error, got {:?}", other),
        }
        assert!(parse_chart(&monthly, Interval::OneWeek).is_err());
    }

    #[test]
    fn parse_chart_fail_upstream_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        match parse_chart(body, Interval::OneDay) {
            Err(ApiError::Api { code, description }) => {
                assert_eq!(code, "Not Found");
                assert!(description.contains("delisted"));
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[test]
    fn parse_chart_fail_empty_result() {
        let body = r#"{"chart":{"result":[],"error":null}}"#;
        assert!(matches!(parse_chart(body, Interval::OneDay), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn parse_chart_fail_no_bars() {
        let body = r#"{"chart":{"result":[{"meta":{"symbol":"ZZZZ"},"indicators":{"quote":[{}]}}],"error":null}}"#;
        match parse_chart(body, Interval::OneDay) {
            Err(ApiError::NotFound(symbol)) => assert_eq!(symbol, "ZZZZ"),
            other => panic!("expected not found, got {:?}", other),
        }
    }

    #[test]
    fn parse_chart_fail_ragged_columns() {
        let body = r#"{"chart":{"result":[{"meta":{"symbol":"AAPL"},"timestamp":[1,2],"indicators":{"quote":[{"open":[1.0,2.0],"high":[1.0,2.0],"low":[1.0,2.0],"close":[1.0],"volume":[1,2]}]}}],"error":null}}"#;
        assert!(matches!(parse_chart(body, Interval::OneDay), Err(ApiError::Malformed(_))));
    }

    #[test]
    fn parse_chart_fail_not_json() {
        assert!(matches!(
            parse_chart("<html>Too Many Requests</html>", Interval::OneDay),
            Err(ApiError::Decode(_))
        ));
    }

    #[test]
    fn validate_range_pass_daily_any_period() {
        for period in Period::ALL {
            assert!(validate_range(period, Interval::OneDay).is_ok());
        }
    }

    #[test]
    fn validate_range_pass_intraday_short_period() {
        assert!(validate_range(Period::FiveDays, Interval::OneMinute).is_ok());
        assert!(validate_range(Period::OneMonth, Interval::FiveMinutes).is_ok());
        assert!(validate_range(Period::OneYear, Interval::OneHour).is_ok());
    }

    #[test]
    fn validate_range_fail_intraday_long_period() {
        assert!(matches!(
            validate_range(Period::OneMonth, Interval::OneMinute),
            Err(ApiError::InvalidRange { .. })
        ));
        assert!(validate_range(Period::ThreeMonths, Interval::ThirtyMinutes).is_err());
        assert!(validate_range(Period::Max, Interval::OneHour).is_err());
    }

    #[test]
    fn validate_range_year_to_date_follows_calendar() {
        let january = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
        let october = NaiveDate::from_ymd_opt(2025, 10, 20).unwrap();
        assert!(validate_range_on(Period::YearToDate, Interval::FifteenMinutes, january).is_ok());
        assert!(matches!(
            validate_range_on(Period::YearToDate, Interval::FifteenMinutes, october),
            Err(ApiError::InvalidRange { .. })
        ));
    }

    /// Base url of a local port nobody listens on.
    fn closed_base_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        format!("http://127.0.0.1:{}", port)
    }

    #[test]
    fn time_range_spans_whole_history() {
        let api = YahooAPI::new(YAHOO_BASE_API_URL);
        let timerange = api.get_time_range();
        assert_eq!(timerange.start, 0);
        assert!(timerange.end > 1_700_000_000);
    }

    #[tokio::test]
    async fn get_stock_fail_invalid_range_without_request() {
        // the call must fail before any I/O is attempted
        let api = YahooAPI::new(&closed_base_url());
        let result = api
            .get_history("AAPL", Period::Max, Interval::OneMinute)
            .await;
        assert!(matches!(result, Err(ApiError::InvalidRange { .. })));
    }

    #[tokio::test]
    async fn get_stock_fail_empty_ticker() {
        let api = YahooAPI::new(&closed_base_url());
        let result = api.get_info("").await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
