//! API types for the client-host bridge.
//!
//! This module defines the stable types shared by the codec, the runtime
//! and the command facades.

pub mod types;
