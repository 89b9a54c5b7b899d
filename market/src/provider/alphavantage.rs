use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::errors::ProviderError;
use crate::types::{Interval, PricePoint, Ticker, Timestamp};

pub const DEFAULT_URL: &str = "https://www.alphavantage.co/query";

const PROVIDER: &str = "alphavantage";
const BAR_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Intraday history and symbol validation.
#[derive(Clone)]
pub struct AlphaVantageClient {
    http: Client,
    url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct IntradayBar {
    #[serde(rename = "4. close")]
    close: String,
}

impl AlphaVantageClient {
    pub fn new(url: String, api_key: String) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, url, api_key })
    }

    #[instrument(skip(self), fields(ticker = %ticker, interval = %interval), level = "debug")]
    pub async fn intraday_history(
        &self,
        ticker: &Ticker,
        interval: Interval,
    ) -> Result<Vec<PricePoint>, ProviderError> {
        let interval_param = format!("{}min", interval.minutes());
        let body = self
            .query(&[
                ("function", "TIME_SERIES_INTRADAY"),
                ("outputsize", "full"),
                ("symbol", ticker.as_str()),
                ("interval", &interval_param),
            ])
            .await?;

        let points = parse_intraday(&body, interval)?;
        debug!(points = points.len(), "alphavantage history fetched");
        Ok(points)
    }

    #[instrument(skip(self), fields(ticker = %ticker), level = "debug")]
    pub async fn symbol_exists(&self, ticker: &Ticker) -> Result<bool, ProviderError> {
        let body = self
            .query(&[("function", "GLOBAL_QUOTE"), ("symbol", ticker.as_str())])
            .await?;
        Ok(global_quote_exists(&body))
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<Value, ProviderError> {
        let resp = self
            .http
            .get(&self.url)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?;

        Ok(resp.json().await?)
    }
}

/// Extracts ascending closes from a `TIME_SERIES_INTRADAY` payload.
///
/// A payload without the series key (rate-limit note, unknown symbol) is
/// an empty history, not an error.
pub fn parse_intraday(body: &Value, interval: Interval) -> Result<Vec<PricePoint>, ProviderError> {
    let key = format!("Time Series ({}min)", interval.minutes());
    let Some(series) = body.get(&key) else {
        for notice in ["Error Message", "Note", "Information"] {
            if let Some(msg) = body.get(notice) {
                warn!(notice, message = %msg, "alphavantage returned no series");
            }
        }
        return Ok(Vec::new());
    };

    let bars: BTreeMap<String, IntradayBar> =
        serde_json::from_value(series.clone()).map_err(|e| ProviderError::InvalidResponse {
            provider: PROVIDER,
            reason: e.to_string(),
        })?;

    let mut points = Vec::with_capacity(bars.len());
    for (raw_ts, bar) in bars {
        let dt = NaiveDateTime::parse_from_str(&raw_ts, BAR_TIME_FORMAT)?;
        let price: f64 = bar.close.trim().parse()?;
        points.push(PricePoint::new(Timestamp::from_datetime(dt), price));
    }
    points.sort_by_key(|p| p.timestamp);

    Ok(points)
}

/// A symbol is known unless the payload carries an error or an empty quote.
pub fn global_quote_exists(body: &Value) -> bool {
    if body.get("Error Message").is_some() {
        return false;
    }
    match body.get("Global Quote") {
        Some(Value::Object(quote)) => !quote.is_empty(),
        Some(_) => false,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn intraday_closes_are_sorted_ascending() {
        let body = json!({
            "Meta Data": { "1. Information": "Intraday (5min)" },
            "Time Series (5min)": {
                "2024-03-01 09:40:00": { "1. open": "1", "4. close": "101.5" },
                "2024-03-01 09:35:00": { "1. open": "1", "4. close": "100.25" }
            }
        });

        let points = parse_intraday(&body, Interval::FiveMinutes).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].timestamp.to_string(), "2024-03-01-09:35");
        assert_eq!(points[0].price, 100.25);
        assert_eq!(points[1].timestamp.to_string(), "2024-03-01-09:40");
        assert_eq!(points[1].price, 101.5);
    }

    #[test]
    fn missing_series_key_is_empty_history() {
        let body = json!({ "Note": "Thank you for using Alpha Vantage!" });
        assert!(parse_intraday(&body, Interval::FiveMinutes).unwrap().is_empty());
    }

    #[test]
    fn series_for_another_interval_is_ignored() {
        let body = json!({
            "Time Series (15min)": {
                "2024-03-01 09:45:00": { "4. close": "10" }
            }
        });
        assert!(parse_intraday(&body, Interval::FiveMinutes).unwrap().is_empty());
    }

    #[test]
    fn bad_close_is_a_parse_error() {
        let body = json!({
            "Time Series (1min)": {
                "2024-03-01 09:31:00": { "4. close": "n/a" }
            }
        });
        assert!(matches!(
            parse_intraday(&body, Interval::OneMinute),
            Err(ProviderError::ParseFloat(_))
        ));
    }

    #[test]
    fn global_quote_detects_unknown_symbols() {
        assert!(global_quote_exists(&json!({ "Global Quote": { "01. symbol": "AAPL" } })));
        assert!(!global_quote_exists(&json!({ "Global Quote": {} })));
        assert!(!global_quote_exists(&json!({ "Error Message": "Invalid API call." })));
    }
}
