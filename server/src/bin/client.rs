use anyhow::Context;
use clap::Parser;
use common::logger::init_logger;
use server::protocol::{Frame, read_frame, write_frame};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::warn;

const MAX_RESPONSE_BYTES: usize = 1 << 20;
const PROMPT: &[u8] = b"Enter Command > ";

#[derive(Debug, Parser)]
#[command(name = "client", version, about = "Start the trading client.")]
struct Args {
    /// Server address, `host:port`
    #[arg(long, default_value = "127.0.0.1:8000")]
    server_address: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger("trading-client", false);

    let mut stream = TcpStream::connect(&args.server_address)
        .await
        .with_context(|| format!("could not connect to {}", args.server_address))?;
    let (reader, mut writer) = stream.split();
    let mut reader = BufReader::new(reader);

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(PROMPT).await?;
        stdout.flush().await?;

        let Some(line) = stdin.next_line().await? else {
            break;
        };
        let message = line.trim();
        if message == "q" {
            break;
        }
        if message.is_empty() {
            continue;
        }

        write_frame(&mut writer, message).await?;
        match read_frame(&mut reader, MAX_RESPONSE_BYTES).await? {
            Frame::Message(response) => {
                stdout.write_all(response.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
            }
            Frame::Rejected(e) => warn!(error = %e, "unreadable response"),
            Frame::Closed => {
                warn!("server closed the connection");
                break;
            }
        }
    }

    Ok(())
}
