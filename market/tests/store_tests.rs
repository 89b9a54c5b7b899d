use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use market::{
    AddTickerOutcome, Interval, Lookup, MarketDataProvider, PricePoint, Ticker, TimeSeriesStore,
};

/// Knows a fixed symbol set and counts validation calls.
#[derive(Default)]
struct MockProvider {
    known: HashSet<String>,
    validations: Arc<AtomicUsize>,
}

impl MockProvider {
    fn knowing(symbols: &[&str]) -> Self {
        Self {
            known: symbols.iter().map(|s| s.to_string()).collect(),
            validations: Arc::default(),
        }
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for MockProvider {
    async fn validate_ticker(&self, ticker: &Ticker) -> bool {
        self.validations.fetch_add(1, Ordering::SeqCst);
        self.known.contains(ticker.as_str())
    }

    async fn fetch_history(&self, _ticker: &Ticker, _interval: Interval) -> Vec<PricePoint> {
        Vec::new()
    }

    async fn fetch_quote(&self, _ticker: &Ticker) -> Option<PricePoint> {
        None
    }
}

fn point(ts: &str, price: f64) -> PricePoint {
    PricePoint::new(ts.parse().unwrap(), price)
}

#[tokio::test]
async fn add_ticker_creates_empty_series_for_known_symbol() {
    let provider = MockProvider::knowing(&["AAPL"]);
    let mut store = TimeSeriesStore::new();

    let outcome = store.add_ticker("aapl", &provider).await;

    assert_eq!(outcome, AddTickerOutcome::Added);
    let aapl = Ticker::parse("AAPL").unwrap();
    assert!(store.series(&aapl).unwrap().is_empty());
}

#[tokio::test]
async fn add_ticker_rejects_unknown_symbol_without_creating_series() {
    let provider = MockProvider::knowing(&["AAPL"]);
    let mut store = TimeSeriesStore::new();

    let outcome = store.add_ticker("ZZZZ", &provider).await;

    assert_eq!(outcome, AddTickerOutcome::Invalid);
    assert!(store.is_empty());
}

#[tokio::test]
async fn add_ticker_rejects_empty_input_without_calling_provider() {
    let provider = MockProvider::knowing(&["AAPL"]);
    let mut store = TimeSeriesStore::new();

    assert_eq!(store.add_ticker("  ", &provider).await, AddTickerOutcome::Invalid);
    assert_eq!(provider.validations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn duplicate_add_leaves_existing_series_alone() {
    let provider = MockProvider::knowing(&["AAPL"]);
    let mut store = TimeSeriesStore::new();
    store.add_ticker("AAPL", &provider).await;

    let aapl = Ticker::parse("AAPL").unwrap();
    store.replace_series(
        &aapl,
        vec![point("2024-03-01-09:35", 10.0), point("2024-03-01-09:40", 11.0)],
    );
    let before = store.clone();

    let outcome = store.add_ticker("AAPL", &provider).await;

    assert_eq!(outcome, AddTickerOutcome::AlreadyExists);
    assert_eq!(store, before);
    assert_eq!(provider.validations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn replace_then_upsert_merges_in_order() {
    let provider = MockProvider::knowing(&["MSFT"]);
    let mut store = TimeSeriesStore::new();
    store.add_ticker("MSFT", &provider).await;
    let msft = Ticker::parse("MSFT").unwrap();

    store.replace_series(
        &msft,
        vec![point("2024-03-01-09:35", 1.0), point("2024-03-01-09:45", 3.0)],
    );
    store.upsert_point(&msft, "2024-03-01-09:40".parse().unwrap(), 2.0);
    store.upsert_point(&msft, "2024-03-01-09:45".parse().unwrap(), 3.5);

    let prices: Vec<f64> = store.series(&msft).unwrap().iter().map(|p| p.price).collect();
    assert_eq!(prices, vec![1.0, 2.0, 3.5]);
    assert_eq!(store.get_at(&msft, &Lookup::Latest), Some(3.5));
}
