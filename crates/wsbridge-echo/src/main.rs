//! TCP echo service for checking a bridge end to end by hand.
//!
//! ```text
//! wsbridge-echo --listen localhost:21080
//! wsbridge --mode server --local localhost:28081 --remote localhost:21080
//! wsbridge --mode client --local localhost:28080 --remote localhost:28081 --protocol ws
//! nc localhost 28080      # anything typed comes back
//! ```

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Size of each read; larger than the bridge chunk so echoes are not re-split.
const ECHO_BUFFER_BYTES: usize = 100 << 10;

#[derive(Debug, Parser)]
#[command(name = "wsbridge-echo", about = "TCP echo service", version)]
struct Cli {
    /// Address to listen on.
    #[arg(long, default_value = "localhost:21080", env = "WSBRIDGE_ECHO_LISTEN")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let listener = TcpListener::bind(&cli.listen)
        .await
        .with_context(|| format!("failed to bind echo listener on {}", cli.listen))?;
    info!("TCP echo server is running at {}", listener.local_addr()?);

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                info!("accept: {peer}");
                tokio::spawn(echo(stream));
            }
            Err(e) => error!("accept error: {e}"),
        }
    }
}

async fn echo(mut stream: TcpStream) {
    let mut buf = vec![0u8; ECHO_BUFFER_BYTES];
    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                debug!("echo read failed: {e}");
                break;
            }
        };
        if let Err(e) = stream.write_all(&buf[..n]).await {
            debug!("echo write failed: {e}");
            break;
        }
    }
}
