//! wsbridge library crate.
//!
//! Carries arbitrary TCP sessions across a path that only passes HTTP, by
//! tunnelling each one through its own WebSocket session and turning it back
//! into TCP on the far side.
//!
//! ```text
//! app ──TCP──► [client head] ══ WebSocket ══► [server head] ──TCP──► service
//! ```
//!
//! # Architecture
//!
//! ```text
//! [wsbridge]
//!   ├── domain/          Head configs, scheme, protocol constants
//!   ├── application/     Endpoint traits, Pump, ConnectionBridge
//!   └── infrastructure/
//!         ├── stream_endpoint / framed_endpoint   TCP and WebSocket endpoints
//!         ├── tcp_head / ws_head                   The two bridge heads
//!         └── file_config                          Optional TOML config
//! ```
//!
//! `domain` does no I/O.  `application` is written against the endpoint
//! traits only, so the same pump and teardown logic serves both directions.

/// Domain layer: configuration and constants (no I/O).
pub mod domain;

/// Application layer: endpoint abstraction, pumps, and the connection bridge.
pub mod application;

/// Infrastructure layer: sockets, WebSocket handshakes, bridge heads.
pub mod infrastructure;
