use market::{ProviderError, ReloadError};
use scheduler::ClockError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Clock(#[from] ClockError),

    #[error(transparent)]
    Reload(#[from] ReloadError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame of {len} bytes exceeds maximum {max}")]
    Oversized { len: usize, max: usize },

    #[error("frame is not valid utf-8")]
    NotUtf8,
}
