//! Protocol layer - wire format and transports.
//!
//! This module provides:
//! - `codec`: JSON text frames for calls, responses, errors and events
//! - `transport`: the `Transport` trait and its WebSocket and in-process adapters
//!
//! Nothing here knows about pending calls or handlers; the runtime layer
//! owns those.

pub mod codec;
pub mod transport;

pub use transport::{ChannelTransport, HostEndpoint, Transport, WebSocketTransport};
