//! Mean-reversion band signal with a running position and PnL ledger.
//!
//! For every bar: a price above `mean + std` over the trailing window is a
//! `+1` signal, below `mean - std` a `-1`, anything else (ties included) `0`.
//! Each non-zero signal moves the position by one unit, inverted when
//! `flip_signal` is set. A bar's PnL is the position carried *into* the bar
//! times the bar's percent return.

use std::collections::HashMap;
use std::fmt;

use market::{Interval, Lookup, Ticker, TickerSeries, TimeSeriesStore, Timestamp};
use tracing::debug;

use crate::rolling_window::{Band, RollingWindow};

/// Minutes in one regular trading session (6.5 hours).
pub const SESSION_MINUTES: u32 = 390;

/// Bars in one session plus one: `ceil(6.5h / interval) + 1`.
pub fn window_size(interval: Interval) -> usize {
    (SESSION_MINUTES.div_ceil(interval.minutes()) + 1) as usize
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Signal {
    Short,
    Flat,
    Long,
}

impl Signal {
    pub fn value(self) -> i8 {
        match self {
            Self::Short => -1,
            Self::Flat => 0,
            Self::Long => 1,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Derived state for one bar.
#[derive(Clone, Debug, PartialEq)]
pub struct SignalRow {
    pub timestamp: Timestamp,
    pub price: f64,
    /// `None` while the window is warming up.
    pub average: Option<f64>,
    pub std_dev: Option<f64>,
    pub signal: Signal,
    /// Cumulative position after this bar's signal.
    pub position: i64,
    pub pnl: f64,
}

/// Classifies `price` against `band`. Returns the signal and the position
/// delta it implies. Both comparisons are strict.
pub fn classify(price: f64, band: Band, flip_signal: bool) -> (Signal, i64) {
    let unit = if flip_signal { -1 } else { 1 };
    if price > band.mean + band.std_dev {
        (Signal::Long, unit)
    } else if price < band.mean - band.std_dev {
        (Signal::Short, -unit)
    } else {
        (Signal::Flat, 0)
    }
}

/// Percent change; a zero or non-finite base gives no return.
fn pct_change(prev: f64, price: f64) -> f64 {
    let ret = (price - prev) / prev;
    if ret.is_finite() { ret } else { 0.0 }
}

#[derive(Debug, Clone)]
pub struct SignalEngine {
    window: usize,
    flip_signal: bool,
    rows: HashMap<Ticker, Vec<SignalRow>>,
}

impl SignalEngine {
    pub fn new(interval: Interval, flip_signal: bool) -> Self {
        Self {
            window: window_size(interval),
            flip_signal,
            rows: HashMap::new(),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn flip_signal(&self) -> bool {
        self.flip_signal
    }

    /// Updates the window length. Derived rows are stale until the next
    /// [`recompute`](Self::recompute).
    pub fn set_interval(&mut self, interval: Interval) {
        self.window = window_size(interval);
    }

    /// Rebuilds every ticker's rows from `store`, dropping tickers the store
    /// no longer has.
    pub fn recompute(&mut self, store: &TimeSeriesStore) {
        let mut rows = HashMap::with_capacity(store.len());
        for (ticker, series) in store.iter() {
            let derived = self.derive(series);
            debug!(
                ticker = %ticker,
                rows = derived.len(),
                position = derived.last().map(|r| r.position).unwrap_or_default(),
                "signals derived"
            );
            rows.insert(ticker.clone(), derived);
        }
        self.rows = rows;
    }

    /// Full derivation for one series, in timestamp order.
    pub fn derive(&self, series: &TickerSeries) -> Vec<SignalRow> {
        let mut window = RollingWindow::new(self.window);
        let mut position: i64 = 0;
        let mut prev_price: Option<f64> = None;
        let mut out = Vec::with_capacity(series.len());

        for point in series.iter() {
            window.push(point.price);
            let band = window.band();

            let (signal, delta) = match band {
                Some(band) => classify(point.price, band, self.flip_signal),
                None => (Signal::Flat, 0),
            };

            let ret = prev_price
                .map(|prev| pct_change(prev, point.price))
                .unwrap_or(0.0);
            let pnl = position as f64 * ret;
            position += delta;

            out.push(SignalRow {
                timestamp: point.timestamp,
                price: point.price,
                average: band.map(|b| b.mean),
                std_dev: band.map(|b| b.std_dev),
                signal,
                position,
                pnl,
            });
            prev_price = Some(point.price);
        }

        out
    }

    pub fn remove_ticker(&mut self, ticker: &Ticker) -> bool {
        self.rows.remove(ticker).is_some()
    }

    pub fn rows(&self, ticker: &Ticker) -> Option<&[SignalRow]> {
        self.rows.get(ticker).map(Vec::as_slice)
    }

    /// Same `now` / exact-match semantics as the price store.
    pub fn get_signal_at(&self, ticker: &Ticker, lookup: &Lookup) -> Option<Signal> {
        let rows = self.rows.get(ticker)?;
        match lookup {
            Lookup::Latest => rows.last().map(|r| r.signal),
            Lookup::At(ts) => rows
                .binary_search_by_key(ts, |r| r.timestamp)
                .ok()
                .map(|idx| rows[idx].signal),
            Lookup::Unmatched(_) => None,
        }
    }
}
