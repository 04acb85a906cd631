//! Bridge head configuration types.
//!
//! Each head gets its own immutable config value at construction.  Nothing in
//! here reads the environment or touches the network; `main.rs` and
//! [`crate::infrastructure::file_config`] are responsible for populating these
//! structs from CLI flags, environment variables, or a TOML file.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Largest chunk read from a stream endpoint before it is forwarded as one
/// WebSocket message.
///
/// This is a latency/throughput knob, not part of the wire contract: the far
/// side must not attach meaning to message boundaries.
pub const BUFFER_BYTES: usize = 8 << 10;

/// Path the WebSocket handshake is performed on.
pub const UPGRADE_PATH: &str = "/";

/// Default listen address for the TCP-accepting ("client") head.
pub const DEFAULT_CLIENT_LISTEN_ADDR: &str = "localhost:28080";

/// Default WebSocket remote for the TCP-accepting ("client") head.
pub const DEFAULT_CLIENT_REMOTE_ADDR: &str = "localhost:28081";

/// Default listen address for the WebSocket-accepting ("server") head.
pub const DEFAULT_SERVER_LISTEN_ADDR: &str = "localhost:28081";

/// Default TCP destination for the WebSocket-accepting ("server") head.
pub const DEFAULT_SERVER_REMOTE_ADDR: &str = "localhost:21080";

/// Default upper bound on establishing an outbound connection.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(10);

// ── Scheme ────────────────────────────────────────────────────────────────────

/// Scheme used to reach the remote WebSocket head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    /// Plain `ws://`.
    Ws,
    /// TLS-wrapped `wss://`.
    #[default]
    Wss,
}

impl Scheme {
    /// Returns the URL scheme string (`"ws"` or `"wss"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Ws => "ws",
            Scheme::Wss => "wss",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a scheme string is neither `ws` nor `wss`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown WebSocket scheme '{0}' (expected 'ws' or 'wss')")]
pub struct UnknownScheme(pub String);

impl FromStr for Scheme {
    type Err = UnknownScheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ws" => Ok(Scheme::Ws),
            "wss" => Ok(Scheme::Wss),
            _ => Err(UnknownScheme(s.to_string())),
        }
    }
}

// ── Timeouts ──────────────────────────────────────────────────────────────────

/// Deadlines applied by a head to its connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Bound on the outbound dial (and, for `wss`, the TLS + WebSocket
    /// handshake).  Expiry counts as a dial failure.
    pub dial: Duration,

    /// Bound on a single pump read.  `None` means a pump may wait forever
    /// for its source.
    pub idle: Option<Duration>,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            dial: DEFAULT_DIAL_TIMEOUT,
            idle: None,
        }
    }
}

// ── Head configs ──────────────────────────────────────────────────────────────

/// Configuration for the TCP-accepting head (the "client" role).
///
/// # Example
///
/// ```rust
/// use wsbridge::domain::{ClientConfig, Scheme};
///
/// let cfg = ClientConfig {
///     scheme: Scheme::Ws,
///     remote_addr: "relay.example:443".to_string(),
///     ..ClientConfig::default()
/// };
/// assert_eq!(cfg.remote_url(), "ws://relay.example:443/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// `host:port` the TCP listener binds to.
    pub listen_addr: String,
    /// `host:port` of the remote WebSocket head.
    pub remote_addr: String,
    /// Scheme used to build the remote URL.
    pub scheme: Scheme,
    pub timeouts: Timeouts,
}

impl ClientConfig {
    /// Builds the URL of the remote WebSocket head:
    /// `{scheme}://{remote_addr}/`.
    pub fn remote_url(&self) -> String {
        format!("{}://{}{}", self.scheme, self.remote_addr, UPGRADE_PATH)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_CLIENT_LISTEN_ADDR.to_string(),
            remote_addr: DEFAULT_CLIENT_REMOTE_ADDR.to_string(),
            scheme: Scheme::default(),
            timeouts: Timeouts::default(),
        }
    }
}

/// Configuration for the WebSocket-accepting head (the "server" role).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `host:port` the HTTP/WebSocket listener binds to.
    pub listen_addr: String,
    /// `host:port` of the final TCP destination.
    pub remote_addr: String,
    pub timeouts: Timeouts,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_SERVER_LISTEN_ADDR.to_string(),
            remote_addr: DEFAULT_SERVER_REMOTE_ADDR.to_string(),
            timeouts: Timeouts::default(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
