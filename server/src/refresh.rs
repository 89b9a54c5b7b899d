//! Periodic quote refresh.
//!
//! Provider calls happen without the state lock; results are applied under it
//! only if no reset happened in between.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use common::logger::{TraceId, root_span};
use futures::FutureExt;
use market::MarketDataProvider;
use scheduler::{FireCallback, MarketClock};
use tracing::{Instrument, info, warn};

use crate::state::{AppliedUpdates, SharedState, TickerUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    MarketClosed,
    /// A reset replaced the state this fire was armed for.
    Stale,
    Applied(AppliedUpdates),
}

pub struct QuoteRefreshJob<P: ?Sized> {
    state: SharedState,
    provider: Arc<P>,
    clock: MarketClock,
    generation: u64,
}

impl<P> QuoteRefreshJob<P>
where
    P: MarketDataProvider + ?Sized,
{
    pub fn new(state: SharedState, provider: Arc<P>, clock: MarketClock, generation: u64) -> Self {
        Self {
            state,
            provider,
            clock,
            generation,
        }
    }

    pub fn into_callback(self) -> FireCallback {
        let job = Arc::new(self);
        Arc::new(move || {
            let job = Arc::clone(&job);
            async move {
                job.run().await;
            }
            .boxed()
        })
    }

    pub async fn run(&self) -> RefreshOutcome {
        self.run_at(Local::now().naive_local()).await
    }

    pub async fn run_at(&self, now: NaiveDateTime) -> RefreshOutcome {
        let span = root_span("quote_refresh", &TraceId::default());
        self.refresh(now).instrument(span).await
    }

    async fn refresh(&self, now: NaiveDateTime) -> RefreshOutcome {
        if !self.clock.in_session(now.time()) {
            info!(
                now = %now.format("%H:%M"),
                open = %self.clock.open().format("%H:%M"),
                close = %self.clock.close().format("%H:%M"),
                "market closed; skipping quote refresh"
            );
            return RefreshOutcome::MarketClosed;
        }

        let (interval, targets) = {
            let state = self.state.lock().await;
            if state.generation() != self.generation {
                return RefreshOutcome::Stale;
            }
            let targets: Vec<_> = state
                .store
                .iter()
                .map(|(ticker, series)| (ticker.clone(), series.is_empty()))
                .collect();
            (state.interval(), targets)
        };

        let mut updates = Vec::with_capacity(targets.len());
        for (ticker, empty) in targets {
            let history = if empty {
                info!(ticker = %ticker, "series empty; fetching history first");
                Some(self.provider.fetch_history(&ticker, interval).await)
            } else {
                None
            };
            let quote = self.provider.fetch_quote(&ticker).await;
            if quote.is_none() {
                warn!(ticker = %ticker, "no quote returned");
            }
            updates.push(TickerUpdate {
                ticker,
                history,
                quote,
            });
        }

        let mut state = self.state.lock().await;
        if state.generation() != self.generation {
            warn!(
                armed = self.generation,
                current = state.generation(),
                "state was reset during refresh; discarding quotes"
            );
            return RefreshOutcome::Stale;
        }

        let applied = state.apply_updates(updates);
        info!(
            quotes = applied.quotes,
            backfilled = applied.backfilled,
            "quote refresh applied"
        );
        RefreshOutcome::Applied(applied)
    }
}
