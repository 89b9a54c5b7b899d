pub mod clock;
pub mod engine;
pub mod types;

pub use clock::{ClockError, MarketClock};
pub use engine::Scheduler;
pub use types::{FireCallback, FireFuture, SchedulerState};
