//! Application layer for wsbridge.
//!
//! The transport-agnostic core: the endpoint capability traits, the pump
//! that moves data one way, and the connection bridge that runs two pumps
//! with first-completion-wins teardown.  Nothing here opens a socket; the
//! infrastructure layer supplies concrete endpoints.

pub mod bridge;
pub mod endpoint;
pub mod pump;

#[cfg(test)]
pub(crate) mod test_support;

pub use bridge::{BridgeReport, ConnectionBridge};
pub use endpoint::{
    Chunk, DuplexEndpoint, EndpointError, EndpointKind, EndpointReader, EndpointWriter,
};
pub use pump::{Direction, IdleClock, Pump, PumpOutcome, Termination};
