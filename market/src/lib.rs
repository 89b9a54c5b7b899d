pub mod errors;
pub mod provider;
pub mod reload;
pub mod series;
pub mod types;

pub use errors::{InvalidInterval, InvalidTimestamp, ProviderError, ReloadError};
pub use provider::MarketDataProvider;
pub use series::{AddTickerOutcome, RemoveTickerOutcome, TickerSeries, TimeSeriesStore};
pub use types::{Interval, Lookup, PricePoint, Ticker, Timestamp};
