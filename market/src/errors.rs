use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from {provider}: {reason}")]
    InvalidResponse {
        provider: &'static str,
        reason: String,
    },

    #[error("price parse error: {0}")]
    ParseFloat(#[from] std::num::ParseFloatError),

    #[error("timestamp parse error: {0}")]
    ParseTime(#[from] chrono::ParseError),
}

#[derive(Error, Debug)]
pub enum ReloadError {
    #[error("could not open reload file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read reload file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed line {line} in {path}: {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("cannot derive a ticker from file name {0}")]
    NoTicker(PathBuf),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{0}m interval not allowed; expected one of 1, 5, 15, 30, 60")]
pub struct InvalidInterval(pub u32);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("timestamp {0:?} is not in YYYY-MM-DD-HH:MM form")]
pub struct InvalidTimestamp(pub String);
