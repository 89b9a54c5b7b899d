//! Process-wide tracing setup and the span helpers shared by the server,
//! the refresh job and the command loop.

mod init;
mod span;
mod trace_id;

pub use init::init_logger;
pub use span::{annotate_ticker, root_span, warn_if_slow};
pub use trace_id::TraceId;
