use std::time::Duration;

use async_trait::async_trait;
use common::logger::warn_if_slow;
use tracing::{error, warn};

use super::{AlphaVantageClient, FinnhubClient, MarketDataProvider};
use crate::types::{Interval, PricePoint, Ticker};

const SLOW_CALL: Duration = Duration::from_secs(3);

/// Production provider: Alpha Vantage for history and validation, Finnhub
/// for the latest quote.
#[derive(Clone)]
pub struct HttpMarketData {
    history: AlphaVantageClient,
    quotes: FinnhubClient,
}

impl HttpMarketData {
    pub fn new(history: AlphaVantageClient, quotes: FinnhubClient) -> Self {
        Self { history, quotes }
    }
}

#[async_trait]
impl MarketDataProvider for HttpMarketData {
    async fn validate_ticker(&self, ticker: &Ticker) -> bool {
        match warn_if_slow("validate_ticker", SLOW_CALL, self.history.symbol_exists(ticker)).await {
            Ok(known) => known,
            Err(e) => {
                error!(error = %e, ticker = %ticker, "ticker validation failed");
                false
            }
        }
    }

    async fn fetch_history(&self, ticker: &Ticker, interval: Interval) -> Vec<PricePoint> {
        match warn_if_slow(
            "fetch_history",
            SLOW_CALL,
            self.history.intraday_history(ticker, interval),
        )
        .await
        {
            Ok(points) => points,
            Err(e) => {
                error!(error = %e, ticker = %ticker, "error fetching historical data");
                Vec::new()
            }
        }
    }

    async fn fetch_quote(&self, ticker: &Ticker) -> Option<PricePoint> {
        match warn_if_slow("fetch_quote", SLOW_CALL, self.quotes.quote(ticker)).await {
            Ok(Some(point)) => Some(point),
            Ok(None) => {
                warn!(ticker = %ticker, "quote provider returned no data");
                None
            }
            Err(e) => {
                error!(error = %e, ticker = %ticker, "error fetching quote");
                None
            }
        }
    }
}
