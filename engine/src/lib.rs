pub mod rolling_window;
pub mod signal;

pub use rolling_window::{Band, RollingWindow};
pub use signal::{Signal, SignalEngine, SignalRow, classify, window_size};
