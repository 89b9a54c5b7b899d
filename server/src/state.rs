//! The store and the signal engine behind one lock.
//!
//! Every mutation of the store is followed by a recompute while the lock is
//! still held, so readers never see prices and signals out of step.

use std::sync::Arc;

use engine::SignalEngine;
use market::{
    InvalidInterval, Interval, Lookup, PricePoint, RemoveTickerOutcome, Ticker, TimeSeriesStore,
};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::command::render_report;

pub type SharedState = Arc<Mutex<MarketState>>;

#[derive(Debug, Clone)]
pub struct MarketState {
    pub store: TimeSeriesStore,
    pub engine: SignalEngine,
    interval: Interval,
    /// Bumped on every reset. Refresh fires that started under an older
    /// generation discard their results.
    generation: u64,
}

/// Provider results for one ticker, gathered outside the lock.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerUpdate {
    pub ticker: Ticker,
    /// Present when the series was empty at fetch time.
    pub history: Option<Vec<PricePoint>>,
    pub quote: Option<PricePoint>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppliedUpdates {
    pub backfilled: usize,
    pub quotes: usize,
}

impl MarketState {
    pub fn new(interval: Interval, flip_signal: bool) -> Self {
        Self {
            store: TimeSeriesStore::new(),
            engine: SignalEngine::new(interval, flip_signal),
            interval,
            generation: 0,
        }
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// An unsupported cadence leaves the current one in place.
    pub fn set_interval(&mut self, minutes: u32) -> Result<Interval, InvalidInterval> {
        match Interval::from_minutes(minutes) {
            Ok(interval) => {
                self.interval = interval;
                self.engine.set_interval(interval);
                self.recompute();
                info!(%interval, window = self.engine.window(), "interval updated");
                Ok(interval)
            }
            Err(e) => {
                error!(error = %e, current = %self.interval, "interval unchanged");
                Err(e)
            }
        }
    }

    pub fn recompute(&mut self) {
        self.engine.recompute(&self.store);
    }

    pub fn remove_ticker(&mut self, raw: &str) -> RemoveTickerOutcome {
        let outcome = self.store.remove_ticker(raw);
        if outcome == RemoveTickerOutcome::Removed {
            if let Some(ticker) = Ticker::parse(raw) {
                self.engine.remove_ticker(&ticker);
            }
            self.recompute();
        }
        outcome
    }

    pub fn price_report(&self, lookup: &Lookup) -> String {
        render_report(self.store.iter().map(|(ticker, series)| {
            (ticker, series.get(lookup).map(|price| format!("{price:?}")))
        }))
    }

    pub fn signal_report(&self, lookup: &Lookup) -> String {
        render_report(self.store.iter().map(|(ticker, _)| {
            (
                ticker,
                self.engine
                    .get_signal_at(ticker, lookup)
                    .map(|signal| signal.to_string()),
            )
        }))
    }

    /// Writes fetched history and quotes. Tickers deleted since the fetch
    /// are skipped, and history only fills a series that is still empty.
    pub fn apply_updates(&mut self, updates: Vec<TickerUpdate>) -> AppliedUpdates {
        let mut applied = AppliedUpdates::default();

        for update in updates {
            let still_empty = self
                .store
                .series(&update.ticker)
                .is_some_and(|series| series.is_empty());

            if let Some(history) = update.history {
                if still_empty && self.store.replace_series(&update.ticker, history) {
                    applied.backfilled += 1;
                }
            }

            if let Some(quote) = update.quote {
                if self
                    .store
                    .upsert_point(&update.ticker, quote.timestamp, quote.price)
                {
                    applied.quotes += 1;
                }
            }
        }

        self.recompute();
        applied
    }

    /// Fresh store and engine for the same tickers, seeded with `histories`,
    /// at the next generation. Interval and flip carry over.
    pub fn rebuilt(&self, histories: Vec<(Ticker, Vec<PricePoint>)>) -> Self {
        let mut store = TimeSeriesStore::with_tickers(histories.iter().map(|(t, _)| t.clone()));
        for (ticker, points) in histories {
            store.replace_series(&ticker, points);
        }

        let mut engine = SignalEngine::new(self.interval, self.engine.flip_signal());
        engine.recompute(&store);

        Self {
            store,
            engine,
            interval: self.interval,
            generation: self.generation + 1,
        }
    }
}
