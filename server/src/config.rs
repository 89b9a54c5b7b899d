use std::path::PathBuf;

use market::Interval;
use market::provider::{AlphaVantageClient, FinnhubClient, HttpMarketData, alphavantage, finnhub};
use scheduler::MarketClock;
use tracing::warn;

use crate::cli::Cli;
use crate::error::AppError;
use crate::state::MarketState;

/// Tickers beyond this many on the command line are dropped.
pub const MAX_TICKERS: usize = 3;
pub const DEFAULT_TICKER: &str = "AAPL";
pub const MAX_COMMAND_BYTES: usize = 1024;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// `host:port` for the command listener.
    pub listen_addr: String,

    /// Requested bar cadence in minutes. Applied by [`AppConfig::initial_state`].
    pub minutes: u32,

    /// Startup tickers, at most [`MAX_TICKERS`]. Validated at bootstrap.
    pub tickers: Vec<String>,

    /// When set, the file's ticker is loaded from disk and the other tickers
    /// are not backfilled at startup.
    pub reload_file: Option<PathBuf>,

    pub flip_signal: bool,

    pub clock: MarketClock,

    /// Largest accepted command frame.
    pub max_command_bytes: usize,

    pub provider: ProviderConfig,
}

#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub alphavantage_url: String,
    pub alphavantage_api_key: String,
    pub finnhub_url: String,
    pub finnhub_api_key: String,
}

impl ProviderConfig {
    pub fn from_env() -> Self {
        let alphavantage_api_key = std::env::var("ALPHAVANTAGE_API_KEY").unwrap_or_default();
        let finnhub_api_key = std::env::var("FINNHUB_API_KEY").unwrap_or_default();

        if alphavantage_api_key.is_empty() {
            warn!("ALPHAVANTAGE_API_KEY not set; history and ticker validation will fail");
        }
        if finnhub_api_key.is_empty() {
            warn!("FINNHUB_API_KEY not set; quote refresh will fail");
        }

        Self {
            alphavantage_url: std::env::var("ALPHAVANTAGE_URL")
                .unwrap_or_else(|_| alphavantage::DEFAULT_URL.to_string()),
            alphavantage_api_key,
            finnhub_url: std::env::var("FINNHUB_URL")
                .unwrap_or_else(|_| finnhub::DEFAULT_URL.to_string()),
            finnhub_api_key,
        }
    }

    /// History from Alpha Vantage, quotes from Finnhub.
    pub fn build(&self) -> Result<HttpMarketData, AppError> {
        let history = AlphaVantageClient::new(
            self.alphavantage_url.clone(),
            self.alphavantage_api_key.clone(),
        )?;
        let quotes = FinnhubClient::new(self.finnhub_url.clone(), self.finnhub_api_key.clone())?;
        Ok(HttpMarketData::new(history, quotes))
    }
}

impl AppConfig {
    /// Soft problems (bad cadence, too many tickers) are logged and
    /// corrected. An unusable session window is an error.
    pub fn from_cli_and_env(cli: Cli) -> Result<Self, AppError> {
        let clock = MarketClock::parse(&cli.market_open, &cli.market_close)?;

        Ok(Self {
            listen_addr: format!("{}:{}", cli.host, cli.port),
            minutes: cli.minutes,
            tickers: normalize_tickers(cli.tickers),
            reload_file: cli.reload,
            flip_signal: cli.flip_signal,
            clock,
            max_command_bytes: MAX_COMMAND_BYTES,
            provider: ProviderConfig::from_env(),
        })
    }

    /// Empty market state at the requested cadence, or the default one if
    /// the cadence is unsupported.
    pub fn initial_state(&self) -> MarketState {
        let mut state = MarketState::new(Interval::default(), self.flip_signal);
        if state.set_interval(self.minutes).is_err() {
            warn!(
                minutes = self.minutes,
                default = %Interval::default(),
                "falling back to default interval"
            );
        }
        state
    }
}

pub fn normalize_tickers(mut tickers: Vec<String>) -> Vec<String> {
    if tickers.is_empty() {
        return vec![DEFAULT_TICKER.to_string()];
    }
    if tickers.len() > MAX_TICKERS {
        warn!(
            given = tickers.len(),
            kept = MAX_TICKERS,
            "too many tickers; only the first ones are used"
        );
        tickers.truncate(MAX_TICKERS);
    }
    tickers
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn initial_interval(minutes: &str) -> Interval {
        let cli = Cli::parse_from(["server", "--minutes", minutes]);
        AppConfig::from_cli_and_env(cli).unwrap().initial_state().interval()
    }

    #[test]
    fn unsupported_minutes_fall_back_to_five() {
        assert_eq!(initial_interval("7"), Interval::FiveMinutes);
        assert_eq!(initial_interval("0"), Interval::FiveMinutes);
        assert_eq!(initial_interval("30"), Interval::ThirtyMinutes);
    }

    #[test]
    fn tickers_default_and_truncate() {
        assert_eq!(normalize_tickers(vec![]), vec!["AAPL"]);

        let many = ["a", "b", "c", "d"].map(String::from).to_vec();
        assert_eq!(normalize_tickers(many), vec!["a", "b", "c"]);
    }

    #[test]
    fn cli_defaults_produce_a_usable_config() {
        let cli = Cli::parse_from(["server"]);
        let cfg = AppConfig::from_cli_and_env(cli).unwrap();

        assert_eq!(cfg.listen_addr, "127.0.0.1:8000");
        assert_eq!(cfg.minutes, 5);
        assert_eq!(cfg.initial_state().interval(), Interval::FiveMinutes);
        assert_eq!(cfg.tickers, vec!["AAPL"]);
        assert!(cfg.reload_file.is_none());
        assert!(!cfg.flip_signal);
        assert_eq!(cfg.max_command_bytes, 1024);
    }

    #[test]
    fn cli_flags_are_honoured() {
        let cli = Cli::parse_from([
            "server",
            "--port",
            "9001",
            "--minutes",
            "15",
            "--tickers",
            "msft",
            "ibm",
            "--reload",
            "aapl_price.csv",
            "--flip-signal",
        ]);
        let cfg = AppConfig::from_cli_and_env(cli).unwrap();

        assert_eq!(cfg.listen_addr, "127.0.0.1:9001");
        let state = cfg.initial_state();
        assert_eq!(state.interval(), Interval::FifteenMinutes);
        assert_eq!(state.engine.window(), 27);
        assert!(state.engine.flip_signal());
        assert_eq!(cfg.tickers, vec!["msft", "ibm"]);
        assert_eq!(cfg.reload_file, Some(PathBuf::from("aapl_price.csv")));
        assert!(cfg.flip_signal);
    }

    #[test]
    fn provider_builds_from_default_urls() {
        let cfg = ProviderConfig {
            alphavantage_url: alphavantage::DEFAULT_URL.to_string(),
            alphavantage_api_key: "demo".to_string(),
            finnhub_url: finnhub::DEFAULT_URL.to_string(),
            finnhub_api_key: "demo".to_string(),
        };
        assert!(cfg.build().is_ok());
    }

    #[test]
    fn inverted_session_is_rejected() {
        let cli = Cli::parse_from(["server", "--market-open", "16:00", "--market-close", "09:30"]);
        assert!(matches!(
            AppConfig::from_cli_and_env(cli),
            Err(AppError::Clock(_))
        ));
    }
}
