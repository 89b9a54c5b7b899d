//! Operations behind the command surface.
//!
//! `TradingDesk` owns the shared state, the provider and the refresh
//! scheduler. Mutating commands hold the state lock for their whole
//! duration; reset fetches history unlocked and swaps the state in one step.

use std::path::Path;
use std::sync::Arc;

use common::logger::annotate_ticker;
use market::reload::reload_from_source;
use market::{AddTickerOutcome, Lookup, MarketDataProvider, RemoveTickerOutcome, Ticker};
use scheduler::{MarketClock, Scheduler, SchedulerState};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::error::AppError;
use crate::refresh::QuoteRefreshJob;
use crate::state::{MarketState, SharedState};

pub struct TradingDesk<P: ?Sized> {
    state: SharedState,
    provider: Arc<P>,
    clock: MarketClock,
    scheduler: Mutex<Scheduler>,
}

impl<P> TradingDesk<P>
where
    P: MarketDataProvider + ?Sized,
{
    pub fn new(provider: Arc<P>, state: MarketState, clock: MarketClock) -> Self {
        Self {
            state: state.into_shared(),
            provider,
            clock,
            scheduler: Mutex::new(Scheduler::new(clock)),
        }
    }

    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    /// Validates and adds `tickers`. With `reload`, the file's ticker is
    /// added unvalidated and seeded from disk and nothing else is fetched;
    /// otherwise every ticker is backfilled from the provider.
    pub async fn bootstrap(
        &self,
        tickers: &[String],
        reload: Option<&Path>,
    ) -> Result<(), AppError> {
        let mut state = self.state.lock().await;

        for raw in tickers {
            match state.store.add_ticker(raw, self.provider.as_ref()).await {
                AddTickerOutcome::Added => {}
                AddTickerOutcome::AlreadyExists => info!(ticker = %raw, "duplicate startup ticker"),
                AddTickerOutcome::Invalid => error!(ticker = %raw, "startup ticker rejected"),
            }
        }

        match reload {
            Some(path) => {
                let reloaded = reload_from_source(path)?;
                state.store.insert_unvalidated(reloaded.ticker.clone());
                state.store.replace_series(&reloaded.ticker, reloaded.points);
            }
            None => {
                let interval = state.interval();
                for ticker in state.store.tickers() {
                    let history = self.provider.fetch_history(&ticker, interval).await;
                    state.store.replace_series(&ticker, history);
                }
            }
        }

        state.recompute();
        info!(
            tickers = state.store.len(),
            interval = %state.interval(),
            "market state bootstrapped"
        );
        Ok(())
    }

    /// Loads a reload file into the live state, adding its ticker if needed.
    pub async fn reload(&self, path: &Path) -> Result<(), AppError> {
        let reloaded = reload_from_source(path)?;
        let mut state = self.state.lock().await;
        state.store.insert_unvalidated(reloaded.ticker.clone());
        state.store.replace_series(&reloaded.ticker, reloaded.points);
        state.recompute();
        Ok(())
    }

    pub async fn price_report(&self, lookup: &Lookup) -> String {
        self.state.lock().await.price_report(lookup)
    }

    pub async fn signal_report(&self, lookup: &Lookup) -> String {
        self.state.lock().await.signal_report(lookup)
    }

    /// Validates, adds and backfills the ticker under the lock.
    pub async fn add_ticker(&self, raw: &str) -> AddTickerOutcome {
        annotate_ticker(raw);
        let mut state = self.state.lock().await;

        let outcome = state.store.add_ticker(raw, self.provider.as_ref()).await;
        if outcome != AddTickerOutcome::Added {
            return outcome;
        }

        if let Some(ticker) = Ticker::parse(raw) {
            let history = self.provider.fetch_history(&ticker, state.interval()).await;
            state.store.replace_series(&ticker, history);
        }
        state.recompute();
        outcome
    }

    pub async fn remove_ticker(&self, raw: &str) -> RemoveTickerOutcome {
        annotate_ticker(raw);
        self.state.lock().await.remove_ticker(raw)
    }

    /// Cancels the refresh job, rebuilds the state from fresh history for
    /// the current tickers and re-arms the job.
    pub async fn reset(&self) {
        let mut scheduler = self.scheduler.lock().await;
        scheduler.cancel();

        let (tickers, interval) = {
            let state = self.state.lock().await;
            (state.store.tickers(), state.interval())
        };

        let mut histories = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            let history = self.provider.fetch_history(&ticker, interval).await;
            histories.push((ticker, history));
        }

        let generation = {
            let mut state = self.state.lock().await;
            let fresh = state.rebuilt(histories);
            *state = fresh;
            state.generation()
        };
        info!(generation, "market state reset");

        scheduler.schedule(interval, self.refresh_job(generation).into_callback());
    }

    /// Arms the refresh job for the current state.
    pub async fn arm_refresh(&self) {
        let (interval, generation) = {
            let state = self.state.lock().await;
            (state.interval(), state.generation())
        };
        let mut scheduler = self.scheduler.lock().await;
        scheduler.schedule(interval, self.refresh_job(generation).into_callback());
    }

    pub async fn shutdown(&self) {
        self.scheduler.lock().await.cancel();
    }

    pub fn refresh_job(&self, generation: u64) -> QuoteRefreshJob<P> {
        QuoteRefreshJob::new(
            Arc::clone(&self.state),
            Arc::clone(&self.provider),
            self.clock,
            generation,
        )
    }

    pub async fn is_refresh_armed(&self) -> bool {
        self.scheduler.lock().await.state() == SchedulerState::Armed
    }
}
