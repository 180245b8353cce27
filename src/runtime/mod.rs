//! Runtime modules for call correlation and event delivery.
//!
//! `pending` tracks outstanding calls, `events` fans native events out to
//! handlers, `dispatcher` drives the transport, and `bridge` ties them to a
//! configuration.

pub mod bridge;
pub mod dispatcher;
pub mod events;
pub mod pending;
