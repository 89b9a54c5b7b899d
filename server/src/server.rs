use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use common::logger::{TraceId, root_span};
use market::{AddTickerOutcome, MarketDataProvider, RemoveTickerOutcome};
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tracing::{Instrument, info, warn};

use crate::command::{Command, MALFORMED, OK, status};
use crate::desk::TradingDesk;
use crate::error::{AppError, ProtocolError};
use crate::protocol::{Frame, read_frame, write_frame};

/// Accepts one client at a time and answers each command frame with one
/// response frame.
pub struct CommandServer<P: ?Sized> {
    listener: TcpListener,
    desk: Arc<TradingDesk<P>>,
    max_command_bytes: usize,
}

impl<P> CommandServer<P>
where
    P: MarketDataProvider + ?Sized,
{
    pub async fn bind(
        addr: &str,
        desk: Arc<TradingDesk<P>>,
        max_command_bytes: usize,
    ) -> Result<Self, AppError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| AppError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        Ok(Self {
            listener,
            desk,
            max_command_bytes,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn serve(self) {
        loop {
            info!("waiting for a connection");
            let (stream, peer) = match self.listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    continue;
                }
            };

            let span = root_span("client_connection", &TraceId::default());
            if let Err(e) = self.serve_connection(stream, peer).instrument(span).await {
                warn!(peer = %peer, error = %e, "connection ended with error");
            }
        }
    }

    async fn serve_connection(
        &self,
        mut stream: TcpStream,
        peer: SocketAddr,
    ) -> Result<(), ProtocolError> {
        info!(peer = %peer, "client connected");
        let (reader, mut writer) = stream.split();
        let mut reader = BufReader::new(reader);

        loop {
            let response = match read_frame(&mut reader, self.max_command_bytes).await? {
                Frame::Closed => {
                    info!(peer = %peer, "client disconnected");
                    return Ok(());
                }
                Frame::Rejected(reason) => {
                    warn!(error = %reason, "frame rejected");
                    MALFORMED.to_string()
                }
                Frame::Message(raw) => {
                    info!(command = %raw.trim(), "command received");
                    self.respond(&raw).await
                }
            };
            write_frame(&mut writer, &response).await?;
        }
    }

    /// Parses and executes one command, returning the response text.
    pub async fn respond(&self, raw: &str) -> String {
        let command = match raw.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                warn!(error = %e, "bad command");
                return e.response();
            }
        };

        match command {
            Command::Price(lookup) => self.desk.price_report(&lookup).await,
            Command::Signal(lookup) => self.desk.signal_report(&lookup).await,
            Command::AddTicker(raw) => {
                status(self.desk.add_ticker(&raw).await == AddTickerOutcome::Added)
            }
            Command::DelTicker(raw) => {
                status(self.desk.remove_ticker(&raw).await == RemoveTickerOutcome::Removed)
            }
            Command::Reset => {
                self.desk.reset().await;
                OK.to_string()
            }
        }
    }
}
