//! Quote and history collaborators.
//!
//! The core only talks to [`MarketDataProvider`]. Implementations swallow
//! transport and payload failures: they log them and answer "no data".

pub mod alphavantage;
pub mod finnhub;
pub mod http;

use async_trait::async_trait;

use crate::types::{Interval, PricePoint, Ticker};

pub use alphavantage::AlphaVantageClient;
pub use finnhub::FinnhubClient;
pub use http::HttpMarketData;

#[async_trait]
pub trait MarketDataProvider: Send + Sync + 'static {
    /// `false` for unknown symbols and for provider failures.
    async fn validate_ticker(&self, ticker: &Ticker) -> bool;

    /// Ascending intraday bars; empty when the provider has nothing.
    async fn fetch_history(&self, ticker: &Ticker, interval: Interval) -> Vec<PricePoint>;

    /// Latest quote, or `None` on provider error.
    async fn fetch_quote(&self, ticker: &Ticker) -> Option<PricePoint>;
}
