//! Bridge types shared by every layer.
//!
//! These types are the stable surface application code sees: identifiers,
//! the error taxonomy, and the typed native events.

use serde::{Deserialize, Serialize};

/// Unique identifier for an outstanding call (UUID v4 string)
pub type CallId = String;

/// Host error code: a file could not be read.
pub const NE_FS_FILRDER: &str = "NE_FS_FILRDER";
/// Host error code: a path does not exist.
pub const NE_FS_NOPATHE: &str = "NE_FS_NOPATHE";
/// Host error code: a storage bucket was never written (or was erased).
pub const NE_ST_NOSTKEX: &str = "NE_ST_NOSTKEX";
/// Host error code: generic native runtime failure.
pub const NE_RT_NATRTER: &str = "NE_RT_NATRTER";

/// API errors surfaced by the bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ApiError {
    /// Invalid input parameter or configuration value
    InvalidInput { message: String },
    /// The transport could not be established
    ConnectionFailed { message: String },
    /// The transport was lost while the call was pending
    ConnectionLost { reason: String },
    /// A frame could not be encoded or decoded
    ProtocolError { message: String },
    /// The host reported that the operation failed
    HostError { code: String, message: String },
    /// No response arrived before the configured deadline
    Timeout { method: String, after_ms: u64 },
    /// A call with this id is already pending
    DuplicateCallId { id: CallId },
    /// An event handler returned an error or panicked
    HandlerFailed { event: String, message: String },
    /// IO error while loading configuration
    IoError { message: String },
}

impl ApiError {
    /// Host error code, if this is a host-reported failure.
    pub fn host_code(&self) -> Option<&str> {
        match self {
            ApiError::HostError { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }

    pub(crate) fn connection_lost(reason: impl Into<String>) -> Self {
        ApiError::ConnectionLost {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::InvalidInput { message } => write!(f, "Invalid input: {message}"),
            ApiError::ConnectionFailed { message } => write!(f, "Connection failed: {message}"),
            ApiError::ConnectionLost { reason } => write!(f, "Connection lost: {reason}"),
            ApiError::ProtocolError { message } => write!(f, "Protocol error: {message}"),
            ApiError::HostError { code, message } => write!(f, "Host error {code}: {message}"),
            ApiError::Timeout { method, after_ms } => {
                write!(f, "Call {method} timed out after {after_ms}ms")
            }
            ApiError::DuplicateCallId { id } => write!(f, "Call id already pending: {id}"),
            ApiError::HandlerFailed { event, message } => {
                write!(f, "Handler for {event} failed: {message}")
            }
            ApiError::IoError { message } => write!(f, "IO error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// A tray menu item. Also the detail of `trayMenuItemClicked`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrayMenuItem {
    /// Unique identifier for the menu item
    pub id: String,
    /// Label; `-` renders a separator
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_checked: Option<bool>,
}

impl TrayMenuItem {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            is_disabled: None,
            is_checked: None,
        }
    }
}

/// Names of the native events the host can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    /// The user clicked a tray menu item
    TrayMenuItemClicked,
    /// The user asked to close the native window
    WindowClose,
    /// The native window gained focus
    WindowFocus,
    /// The native window lost focus
    WindowBlur,
    /// The host finished initializing the app
    Ready,
}

impl EventName {
    pub const ALL: [EventName; 5] = [
        EventName::TrayMenuItemClicked,
        EventName::WindowClose,
        EventName::WindowFocus,
        EventName::WindowBlur,
        EventName::Ready,
    ];

    /// Wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::TrayMenuItemClicked => "trayMenuItemClicked",
            EventName::WindowClose => "windowClose",
            EventName::WindowFocus => "windowFocus",
            EventName::WindowBlur => "windowBlur",
            EventName::Ready => "ready",
        }
    }

    /// Parse a wire name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|candidate| candidate.as_str() == name)
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A native event with its name-specific detail payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    TrayMenuItemClicked(TrayMenuItem),
    WindowClose,
    WindowFocus,
    WindowBlur,
    Ready,
}

impl Event {
    pub fn name(&self) -> EventName {
        match self {
            Event::TrayMenuItemClicked(_) => EventName::TrayMenuItemClicked,
            Event::WindowClose => EventName::WindowClose,
            Event::WindowFocus => EventName::WindowFocus,
            Event::WindowBlur => EventName::WindowBlur,
            Event::Ready => EventName::Ready,
        }
    }

    /// Build an event from its wire name and detail.
    ///
    /// Events without a payload ignore `detail`.
    pub fn from_parts(name: EventName, detail: serde_json::Value) -> Result<Self, ApiError> {
        match name {
            EventName::TrayMenuItemClicked => serde_json::from_value::<TrayMenuItem>(detail)
                .map(Event::TrayMenuItemClicked)
                .map_err(|e| ApiError::ProtocolError {
                    message: format!("Invalid {name} detail: {e}"),
                }),
            EventName::WindowClose => Ok(Event::WindowClose),
            EventName::WindowFocus => Ok(Event::WindowFocus),
            EventName::WindowBlur => Ok(Event::WindowBlur),
            EventName::Ready => Ok(Event::Ready),
        }
    }

    /// Detail payload as JSON (`null` for events without one).
    pub fn detail(&self) -> serde_json::Value {
        match self {
            Event::TrayMenuItemClicked(item) => {
                serde_json::to_value(item).unwrap_or(serde_json::Value::Null)
            }
            _ => serde_json::Value::Null,
        }
    }
}
