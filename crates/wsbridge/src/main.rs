//! wsbridge entry point.
//!
//! Runs one bridge head, selected by `--mode`:
//!
//! - `client`: accept TCP on `--local`, tunnel each connection to the
//!   WebSocket head at `--protocol://--remote/`.
//! - `server`: accept WebSocket upgrades on `--local`, forward each session
//!   as TCP to `--remote`.
//!
//! # Usage
//!
//! ```text
//! wsbridge [OPTIONS]
//!
//! Options:
//!   --mode <MODE>          client | server           [default: server]
//!   --local <ADDR>         Address to listen on
//!   --remote <ADDR>        Address to connect to
//!   --protocol <SCHEME>    ws | wss (client mode)    [default: wss]
//!   --dial-timeout <SECS>  Outbound dial bound       [default: 10]
//!   --idle-timeout <SECS>  Idle bound for a pair, 0 = off [default: 0]
//!   --config <FILE>        TOML file with a [bridge] table
//! ```
//!
//! Each option can also come from an environment variable (`WSBRIDGE_MODE`,
//! `WSBRIDGE_LOCAL`, ...).  Precedence: flag, then environment, then the
//! config file, then the built-in default for the selected mode.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use wsbridge::domain::{ClientConfig, Scheme, ServerConfig, Timeouts};
use wsbridge::infrastructure::file_config::{BridgeSection, FileConfig};
use wsbridge::infrastructure::{run_client, run_server, UpgradeRouter};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Which bridge head to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Accept TCP, dial WebSocket.
    Client,
    /// Accept WebSocket, dial TCP.
    Server,
}

/// Tunnel TCP connections through WebSocket.
#[derive(Debug, Parser)]
#[command(
    name = "wsbridge",
    about = "Bidirectional TCP <-> WebSocket bridge",
    version
)]
struct Cli {
    /// Running mode.
    #[arg(long, value_enum, env = "WSBRIDGE_MODE")]
    mode: Option<Mode>,

    /// Local address to listen on (host:port).
    #[arg(long, env = "WSBRIDGE_LOCAL")]
    local: Option<String>,

    /// Remote address to connect to (host:port).
    #[arg(long, env = "WSBRIDGE_REMOTE")]
    remote: Option<String>,

    /// Scheme used to reach the remote WebSocket head (client mode only).
    #[arg(long, env = "WSBRIDGE_PROTOCOL")]
    protocol: Option<Scheme>,

    /// Seconds allowed for an outbound dial and handshake.
    #[arg(long, env = "WSBRIDGE_DIAL_TIMEOUT")]
    dial_timeout: Option<u64>,

    /// Seconds with no traffic in either direction before a pair is torn down; 0 disables.
    #[arg(long, env = "WSBRIDGE_IDLE_TIMEOUT")]
    idle_timeout: Option<u64>,

    /// Optional TOML config file.
    #[arg(long, env = "WSBRIDGE_CONFIG")]
    config: Option<PathBuf>,
}

/// Fully resolved configuration for the selected head.
#[derive(Debug, PartialEq, Eq)]
enum HeadConfig {
    Client(ClientConfig),
    Server(ServerConfig),
}

impl Cli {
    /// Merges CLI/env values over the file section over built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file names an unknown mode or protocol.
    fn resolve(self, file: BridgeSection) -> anyhow::Result<HeadConfig> {
        let mode = match (self.mode, file.mode.as_deref()) {
            (Some(mode), _) => mode,
            (None, Some(text)) => Mode::from_str(text, true)
                .map_err(|e| anyhow!("invalid mode '{text}' in config file: {e}"))?,
            (None, None) => Mode::Server,
        };

        let timeouts = {
            let defaults = Timeouts::default();
            let dial = self
                .dial_timeout
                .or(file.dial_timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.dial);
            let idle = self
                .idle_timeout
                .or(file.idle_timeout_secs)
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs);
            Timeouts { dial, idle }
        };

        let local = self.local.or(file.local);
        let remote = self.remote.or(file.remote);

        match mode {
            Mode::Client => {
                let scheme = match (self.protocol, file.protocol.as_deref()) {
                    (Some(scheme), _) => scheme,
                    (None, Some(text)) => text
                        .parse::<Scheme>()
                        .with_context(|| format!("invalid protocol '{text}' in config file"))?,
                    (None, None) => Scheme::default(),
                };
                let defaults = ClientConfig::default();
                Ok(HeadConfig::Client(ClientConfig {
                    listen_addr: local.unwrap_or(defaults.listen_addr),
                    remote_addr: remote.unwrap_or(defaults.remote_addr),
                    scheme,
                    timeouts,
                }))
            }
            Mode::Server => {
                let defaults = ServerConfig::default();
                Ok(HeadConfig::Server(ServerConfig {
                    listen_addr: local.unwrap_or(defaults.listen_addr),
                    remote_addr: remote.unwrap_or(defaults.remote_addr),
                    timeouts,
                }))
            }
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Exits with a usage message on an unknown --mode or --protocol.
    let cli = Cli::parse();

    let file = match &cli.config {
        Some(path) => FileConfig::load(path)
            .with_context(|| format!("failed to load config file {}", path.display()))?,
        None => FileConfig::default(),
    };
    let head = cli.resolve(file.bridge)?;

    // Cleared by Ctrl+C; the accept loop polls it every 200 ms.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    match head {
        HeadConfig::Client(config) => {
            info!(
                "wsbridge client starting: tcp={} -> {}",
                config.listen_addr,
                config.remote_url()
            );
            run_client(config, running).await?;
        }
        HeadConfig::Server(config) => {
            info!(
                "wsbridge server starting: ws={} -> tcp={}",
                config.listen_addr, config.remote_addr
            );
            run_server(config, UpgradeRouter::default(), running).await?;
        }
    }

    info!("wsbridge stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
