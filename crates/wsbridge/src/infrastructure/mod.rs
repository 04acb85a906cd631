//! Infrastructure layer for wsbridge.
//!
//! Everything that touches a socket or a file: the concrete TCP and
//! WebSocket endpoints, the two bridge heads with their accept loops, and
//! the optional TOML config file.

mod accept;
pub mod error;
pub mod file_config;
pub mod framed_endpoint;
pub mod stream_endpoint;
pub mod tcp_head;
pub mod ws_head;

pub use error::HeadError;
pub use framed_endpoint::FramedEndpoint;
pub use stream_endpoint::StreamEndpoint;
pub use tcp_head::{run_client, TcpBridgeHead};
pub use ws_head::{run_server, UpgradeRouter, WebSocketBridgeHead};
