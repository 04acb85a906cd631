//! Domain layer for wsbridge.
//!
//! Plain configuration types and protocol constants.  No sockets, no async,
//! no environment reads.

pub mod config;

pub use config::{
    ClientConfig, Scheme, ServerConfig, Timeouts, UnknownScheme, BUFFER_BYTES, UPGRADE_PATH,
};
