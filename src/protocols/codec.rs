//! Message codec - JSON text frames exchanged with the host.
//!
//! Outbound frames are calls. Inbound frames carry an explicit `kind`
//! discriminant (`response`, `error`, `event`); shape is never sniffed.
//! The host half of the format is exposed too so in-process hosts speak it.

use serde::{Deserialize, Serialize};

use crate::api::types::{ApiError, CallId, Event, EventName};

const KIND_CALL: &str = "call";

/// An outbound call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub id: CallId,
    /// Qualified operation name, e.g. `filesystem.readFile`
    pub method: String,
    /// Structured options record
    #[serde(rename = "data")]
    pub options: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// Host-side description of a failed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostFailure {
    pub code: String,
    pub message: String,
}

/// Outcome carried by a response frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(serde_json::Value),
    Failure(HostFailure),
}

/// A response correlated to a call by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub id: CallId,
    pub outcome: Outcome,
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Response(Response),
    Event(Event),
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum CallFrameRef<'a> {
    Call(&'a Call),
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum CallFrame {
    Call(Call),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum InboundFrame {
    Response {
        id: CallId,
        #[serde(default)]
        result: serde_json::Value,
    },
    Error {
        id: CallId,
        error: HostFailure,
    },
    Event {
        event: String,
        #[serde(default)]
        data: serde_json::Value,
    },
}

/// Encode a call into a text frame.
pub fn encode(call: &Call) -> Result<String, ApiError> {
    serde_json::to_string(&CallFrameRef::Call(call)).map_err(|e| ApiError::ProtocolError {
        message: format!("Failed to serialize call {}: {e}", call.method),
    })
}

/// Decode an inbound text frame into a response or an event.
pub fn decode(frame: &str) -> Result<Inbound, ApiError> {
    let parsed: InboundFrame = serde_json::from_str(frame).map_err(|e| ApiError::ProtocolError {
        message: format!("Malformed frame: {e}"),
    })?;

    match parsed {
        InboundFrame::Response { id, result } => Ok(Inbound::Response(Response {
            id,
            outcome: Outcome::Success(result),
        })),
        InboundFrame::Error { id, error } => Ok(Inbound::Response(Response {
            id,
            outcome: Outcome::Failure(error),
        })),
        InboundFrame::Event { event, data } => {
            let name = EventName::parse(&event).ok_or_else(|| ApiError::ProtocolError {
                message: format!("Unknown event: {event}"),
            })?;
            Event::from_parts(name, data).map(Inbound::Event)
        }
    }
}

/// Decode a call frame (host side).
pub fn decode_call(frame: &str) -> Result<Call, ApiError> {
    let value: serde_json::Value =
        serde_json::from_str(frame).map_err(|e| ApiError::ProtocolError {
            message: format!("Malformed frame: {e}"),
        })?;
    if value.get("kind").and_then(|kind| kind.as_str()) != Some(KIND_CALL) {
        return Err(ApiError::ProtocolError {
            message: "Frame is not a call".to_string(),
        });
    }
    let CallFrame::Call(call) =
        serde_json::from_value(value).map_err(|e| ApiError::ProtocolError {
            message: format!("Malformed call: {e}"),
        })?;
    Ok(call)
}

/// Encode a success response (host side).
pub fn encode_response(id: &str, result: serde_json::Value) -> Result<String, ApiError> {
    to_frame(&InboundFrame::Response {
        id: id.to_string(),
        result,
    })
}

/// Encode a failure response (host side).
pub fn encode_error(id: &str, code: &str, message: &str) -> Result<String, ApiError> {
    to_frame(&InboundFrame::Error {
        id: id.to_string(),
        error: HostFailure {
            code: code.to_string(),
            message: message.to_string(),
        },
    })
}

/// Encode a native event (host side).
pub fn encode_event(event: &Event) -> Result<String, ApiError> {
    to_frame(&InboundFrame::Event {
        event: event.name().as_str().to_string(),
        data: event.detail(),
    })
}

fn to_frame(frame: &InboundFrame) -> Result<String, ApiError> {
    serde_json::to_string(frame).map_err(|e| ApiError::ProtocolError {
        message: format!("Failed to serialize frame: {e}"),
    })
}
