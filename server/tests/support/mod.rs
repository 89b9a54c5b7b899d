#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use market::{Interval, MarketDataProvider, PricePoint, Ticker};

/// In-memory provider with call counters.
#[derive(Default)]
pub struct MockProvider {
    known: HashSet<String>,
    histories: Mutex<HashMap<String, Vec<PricePoint>>>,
    quotes: Mutex<HashMap<String, PricePoint>>,
    pub history_calls: AtomicUsize,
    pub quote_calls: AtomicUsize,
}

impl MockProvider {
    pub fn knowing(symbols: &[&str]) -> Self {
        Self {
            known: symbols.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_history(self, symbol: &str, points: Vec<PricePoint>) -> Self {
        self.set_history(symbol, points);
        self
    }

    pub fn set_history(&self, symbol: &str, points: Vec<PricePoint>) {
        self.histories
            .lock()
            .unwrap()
            .insert(symbol.to_string(), points);
    }

    pub fn set_quote(&self, symbol: &str, quote: PricePoint) {
        self.quotes.lock().unwrap().insert(symbol.to_string(), quote);
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    pub fn quote_calls(&self) -> usize {
        self.quote_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for MockProvider {
    async fn validate_ticker(&self, ticker: &Ticker) -> bool {
        self.known.contains(ticker.as_str())
    }

    async fn fetch_history(&self, ticker: &Ticker, _interval: Interval) -> Vec<PricePoint> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        self.histories
            .lock()
            .unwrap()
            .get(ticker.as_str())
            .cloned()
            .unwrap_or_default()
    }

    async fn fetch_quote(&self, ticker: &Ticker) -> Option<PricePoint> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        self.quotes.lock().unwrap().get(ticker.as_str()).copied()
    }
}

pub fn point(ts: &str, price: f64) -> PricePoint {
    PricePoint::new(ts.parse().unwrap(), price)
}

pub fn ticker(raw: &str) -> Ticker {
    Ticker::parse(raw).unwrap()
}

/// Writes a reload table named `file_name` into `dir`.
pub fn write_reload_file(
    dir: &tempfile::TempDir,
    file_name: &str,
    rows: &[(&str, f64)],
) -> PathBuf {
    let path = dir.path().join(file_name);
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "datetime,price").unwrap();
    for (ts, price) in rows {
        writeln!(f, "{ts},{price}").unwrap();
    }
    path
}
