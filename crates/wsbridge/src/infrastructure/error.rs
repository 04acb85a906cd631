//! Errors that stop a bridge head from starting.
//!
//! Everything after startup is per-connection and only logged.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeadError {
    /// The listener could not be bound (port in use, permission denied,
    /// unresolvable host).
    #[error("failed to bind listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The configured remote does not form a valid WebSocket URL.
    #[error("invalid remote WebSocket URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
