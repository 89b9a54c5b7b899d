//! Fixed-cadence job runner aligned to wall-clock boundaries.
//!
//! The timer runs in its own task and spawns each fire separately, so
//! cancelling the timer never interrupts a fire already in progress. A tick
//! that lands while the previous fire is still running is skipped rather
//! than queued.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Local;
use market::Interval;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::clock::MarketClock;
use crate::types::{FireCallback, SchedulerState};

struct ArmedJob {
    period: Duration,
    timer: JoinHandle<()>,
}

pub struct Scheduler {
    clock: MarketClock,
    job: Option<ArmedJob>,
    /// Set while a fire is running. Shared across re-arms so a fresh job
    /// never overlaps a fire left over from the previous one.
    in_flight: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(clock: MarketClock) -> Self {
        Self {
            clock,
            job: None,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn state(&self) -> SchedulerState {
        match self.job {
            Some(_) => SchedulerState::Armed,
            None => SchedulerState::Idle,
        }
    }

    pub fn period(&self) -> Option<Duration> {
        self.job.as_ref().map(|job| job.period)
    }

    /// `true` while a fire is executing.
    pub fn is_firing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Arms `callback` every `interval`, first firing on the next aligned
    /// wall-clock boundary (e.g. :35, :40 for five minutes).
    pub fn schedule(&mut self, interval: Interval, callback: FireCallback) {
        let now = Local::now().naive_local();
        let first = self.clock.next_aligned_boundary(now, interval.minutes());
        let delay = (first - now).to_std().unwrap_or(Duration::ZERO);

        info!(
            %interval,
            first_fire = %first.format("%Y-%m-%d %H:%M:%S"),
            "refresh job scheduled"
        );

        self.schedule_after(delay, interval.period(), callback);
    }

    /// Arms `callback` to fire after `delay` and then every `period`.
    /// An already armed job is cancelled first.
    pub fn schedule_after(&mut self, delay: Duration, period: Duration, callback: FireCallback) {
        if self.cancel() {
            warn!("scheduler re-armed while armed; previous job replaced");
        }

        let period = period.max(Duration::from_millis(1));
        let in_flight = Arc::clone(&self.in_flight);
        let timer = tokio::spawn(run_timer(delay, period, callback, in_flight));

        self.job = Some(ArmedJob { period, timer });
    }

    /// Stops future fires. A fire already running completes. Returns `true`
    /// when a job was armed.
    pub fn cancel(&mut self) -> bool {
        match self.job.take() {
            Some(job) => {
                job.timer.abort();
                info!("refresh job cancelled");
                true
            }
            None => false,
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(job) = self.job.take() {
            job.timer.abort();
        }
    }
}

/// Clears the in-flight flag when a fire ends, including by panic.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

async fn run_timer(
    delay: Duration,
    period: Duration,
    callback: FireCallback,
    in_flight: Arc<AtomicBool>,
) {
    let mut ticker = interval_at(Instant::now() + delay, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        if in_flight.swap(true, Ordering::AcqRel) {
            debug!("previous fire still running; tick coalesced");
            continue;
        }

        let guard = InFlightGuard(Arc::clone(&in_flight));
        let fire = callback();
        tokio::spawn(async move {
            let _guard = guard;
            fire.await;
        });
    }
}
