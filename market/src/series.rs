//! Per-ticker price series.
//!
//! Each ticker owns a map keyed by [`Timestamp`], so points stay unique and
//! ascending no matter the order in which upserts arrive. Tickers keep the
//! order in which they were added; query responses list them that way.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::provider::MarketDataProvider;
use crate::types::{Lookup, PricePoint, Ticker, Timestamp};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickerSeries {
    points: BTreeMap<Timestamp, f64>,
}

impl TickerSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later duplicates of a timestamp win.
    pub fn from_points(points: impl IntoIterator<Item = PricePoint>) -> Self {
        Self {
            points: points.into_iter().map(|p| (p.timestamp, p.price)).collect(),
        }
    }

    /// Overwrites the price at `timestamp` or inserts it in order.
    /// Returns `true` when the timestamp was new.
    pub fn upsert(&mut self, timestamp: Timestamp, price: f64) -> bool {
        self.points.insert(timestamp, price).is_none()
    }

    pub fn get(&self, lookup: &Lookup) -> Option<f64> {
        match lookup {
            Lookup::Latest => self.latest().map(|p| p.price),
            Lookup::At(ts) => self.points.get(ts).copied(),
            Lookup::Unmatched(_) => None,
        }
    }

    pub fn latest(&self) -> Option<PricePoint> {
        self.points
            .last_key_value()
            .map(|(ts, price)| PricePoint::new(*ts, *price))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points in ascending timestamp order.
    pub fn iter(&self) -> impl Iterator<Item = PricePoint> + '_ {
        self.points
            .iter()
            .map(|(ts, price)| PricePoint::new(*ts, *price))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddTickerOutcome {
    Added,
    AlreadyExists,
    Invalid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoveTickerOutcome {
    Removed,
    NotFound,
}

/// Owns one [`TickerSeries`] per active ticker.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeSeriesStore {
    series: Vec<(Ticker, TickerSeries)>,
}

impl TimeSeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty series for each ticker, in the given order, without validation.
    pub fn with_tickers(tickers: impl IntoIterator<Item = Ticker>) -> Self {
        let mut store = Self::new();
        for ticker in tickers {
            store.insert_unvalidated(ticker);
        }
        store
    }

    /// Adds an empty series for `raw` after the provider confirms the symbol.
    ///
    /// An existing ticker is reported without touching its series or calling
    /// the provider.
    pub async fn add_ticker<P>(&mut self, raw: &str, validator: &P) -> AddTickerOutcome
    where
        P: MarketDataProvider + ?Sized,
    {
        let Some(ticker) = Ticker::parse(raw) else {
            warn!(input = raw, "no usable ticker specified for addition");
            return AddTickerOutcome::Invalid;
        };

        if self.contains(&ticker) {
            warn!(ticker = %ticker, "ticker already added");
            return AddTickerOutcome::AlreadyExists;
        }

        if !validator.validate_ticker(&ticker).await {
            warn!(ticker = %ticker, "ticker is invalid, ignoring");
            return AddTickerOutcome::Invalid;
        }

        info!(ticker = %ticker, "ticker added");
        self.series.push((ticker, TickerSeries::new()));
        AddTickerOutcome::Added
    }

    /// Creates an empty series unless one exists. Used by file reload, which
    /// trusts the file name. Returns `true` when a series was created.
    pub fn insert_unvalidated(&mut self, ticker: Ticker) -> bool {
        if self.contains(&ticker) {
            return false;
        }
        self.series.push((ticker, TickerSeries::new()));
        true
    }

    pub fn remove_ticker(&mut self, raw: &str) -> RemoveTickerOutcome {
        let Some(ticker) = Ticker::parse(raw) else {
            return RemoveTickerOutcome::NotFound;
        };
        match self.position(&ticker) {
            Some(idx) => {
                self.series.remove(idx);
                info!(ticker = %ticker, "ticker removed");
                RemoveTickerOutcome::Removed
            }
            None => {
                warn!(ticker = %ticker, "ticker does not exist in price map");
                RemoveTickerOutcome::NotFound
            }
        }
    }

    /// Bulk-overwrites a known ticker's series. Returns `false` for unknown
    /// tickers.
    pub fn replace_series(&mut self, ticker: &Ticker, points: Vec<PricePoint>) -> bool {
        let Some(series) = self.series_mut(ticker) else {
            warn!(ticker = %ticker, "replace for unknown ticker dropped");
            return false;
        };
        *series = TickerSeries::from_points(points);
        debug!(ticker = %ticker, points = series.len(), "series replaced");
        true
    }

    /// Returns `false` for unknown tickers.
    pub fn upsert_point(&mut self, ticker: &Ticker, timestamp: Timestamp, price: f64) -> bool {
        let Some(series) = self.series_mut(ticker) else {
            warn!(ticker = %ticker, "upsert for unknown ticker dropped");
            return false;
        };
        let inserted = series.upsert(timestamp, price);
        debug!(ticker = %ticker, %timestamp, price, inserted, "price upserted");
        true
    }

    /// Unknown ticker and missing timestamp both yield `None`.
    pub fn get_at(&self, ticker: &Ticker, lookup: &Lookup) -> Option<f64> {
        self.series(ticker).and_then(|s| s.get(lookup))
    }

    pub fn series(&self, ticker: &Ticker) -> Option<&TickerSeries> {
        self.series
            .iter()
            .find(|(t, _)| t == ticker)
            .map(|(_, s)| s)
    }

    pub fn contains(&self, ticker: &Ticker) -> bool {
        self.position(ticker).is_some()
    }

    pub fn tickers(&self) -> Vec<Ticker> {
        self.series.iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Ticker, &TickerSeries)> {
        self.series.iter().map(|(t, s)| (t, s))
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    fn position(&self, ticker: &Ticker) -> Option<usize> {
        self.series.iter().position(|(t, _)| t == ticker)
    }

    fn series_mut(&mut self, ticker: &Ticker) -> Option<&mut TickerSeries> {
        self.series
            .iter_mut()
            .find(|(t, _)| t == ticker)
            .map(|(_, s)| s)
    }
}
