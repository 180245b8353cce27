//! Command facades organized by host namespace.
//!
//! Each function builds one call shape, checks required options, and hands
//! it to the dispatcher. No facade keeps state of its own.

use serde::Serialize;

use crate::api::types::ApiError;

pub mod app;
pub mod computer;
pub mod debug;
pub mod events;
pub mod filesystem;
pub mod os;
pub mod storage;
pub mod window;

/// Serialize an options record for the wire.
fn to_options<O: Serialize>(method: &str, options: &O) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(options).map_err(|e| ApiError::ProtocolError {
        message: format!("Failed to serialize options for {method}: {e}"),
    })
}

/// Reject empty or whitespace-only required string options.
fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput {
            message: format!("{field} cannot be empty"),
        });
    }
    Ok(())
}
