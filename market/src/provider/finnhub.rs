use std::time::Duration;

use chrono::{Local, TimeZone};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::errors::ProviderError;
use crate::types::{PricePoint, Ticker, Timestamp};

pub const DEFAULT_URL: &str = "https://finnhub.io/api/v1/quote";

/// Latest-quote endpoint.
#[derive(Clone)]
pub struct FinnhubClient {
    http: Client,
    url: String,
    token: String,
}

/// Subset of the `/quote` payload: current price and its unix time.
#[derive(Debug, Clone, Deserialize)]
pub struct FinnhubQuote {
    pub c: f64,
    pub t: i64,
}

impl FinnhubClient {
    pub fn new(url: String, token: String) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(5))
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, url, token })
    }

    #[instrument(skip(self), fields(ticker = %ticker), level = "debug")]
    pub async fn quote(&self, ticker: &Ticker) -> Result<Option<PricePoint>, ProviderError> {
        let resp = self
            .http
            .get(&self.url)
            .query(&[("symbol", ticker.as_str()), ("token", self.token.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let quote: FinnhubQuote = resp.json().await?;
        debug!(price = quote.c, unix = quote.t, "finnhub quote fetched");

        Ok(quote_to_point(&quote))
    }
}

/// Finnhub answers unknown symbols with a zeroed quote.
pub fn quote_to_point(quote: &FinnhubQuote) -> Option<PricePoint> {
    if quote.t <= 0 || !quote.c.is_finite() {
        return None;
    }
    let local = Local.timestamp_opt(quote.t, 0).single()?;
    Some(PricePoint::new(
        Timestamp::from_datetime(local.naive_local()),
        quote.c,
    ))
}
