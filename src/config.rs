//! BridgeConfig - immutable process configuration.
//!
//! Produced once at startup (from the `NL_*` environment the host sets, or
//! from a JSON file) and passed by reference to whatever needs it. The
//! transport needs the port; facades need nothing.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::types::ApiError;

/// Keep-alive interval used in browser mode when none is configured.
pub const DEFAULT_BROWSER_KEEP_ALIVE_MS: u64 = 10_000;

/// How the application is being presented by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Window,
    Browser,
    Cloud,
}

impl Mode {
    fn parse(value: &str) -> Result<Self, ApiError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "window" => Ok(Mode::Window),
            "browser" => Ok(Mode::Browser),
            "cloud" => Ok(Mode::Cloud),
            other => Err(ApiError::InvalidInput {
                message: format!("Unknown mode: {other}"),
            }),
        }
    }
}

/// Process-wide configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Operating system name: Linux, Windows, or macOS
    #[serde(default)]
    pub os: String,
    /// Application identifier
    #[serde(default)]
    pub app_id: String,
    /// Port of the host process
    pub port: u16,
    #[serde(default)]
    pub mode: Mode,
    /// Host version
    #[serde(default)]
    pub version: String,
    /// Client library version
    #[serde(default)]
    pub client_version: String,
    /// Current working directory
    #[serde(default)]
    pub cwd: String,
    /// Application path
    #[serde(default)]
    pub path: String,
    /// Command-line arguments
    #[serde(default)]
    pub args: Vec<String>,
    /// Token attached to every outbound call when the host requires one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive_interval_ms: Option<u64>,
}

impl BridgeConfig {
    /// Minimal configuration addressing a host on `port`.
    pub fn new(port: u16) -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            app_id: String::new(),
            port,
            mode: Mode::Window,
            version: String::new(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            cwd: String::new(),
            path: String::new(),
            args: Vec::new(),
            access_token: None,
            call_timeout_ms: None,
            keep_alive_interval_ms: None,
        }
    }

    /// Read the configuration from the `NL_*` process environment.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port_raw = lookup("NL_PORT").ok_or_else(|| ApiError::InvalidInput {
            message: "NL_PORT is not set".to_string(),
        })?;
        let port = parse_port(&port_raw)?;

        let mut config = Self::new(port);
        if let Some(os) = lookup("NL_OS") {
            config.os = os;
        }
        if let Some(mode) = lookup("NL_MODE") {
            config.mode = Mode::parse(&mode)?;
        }
        config.app_id = lookup("NL_APPID").unwrap_or_default();
        config.version = lookup("NL_VERSION").unwrap_or_default();
        if let Some(client_version) = lookup("NL_CVERSION") {
            config.client_version = client_version;
        }
        config.cwd = lookup("NL_CWD").unwrap_or_default();
        config.path = lookup("NL_PATH").unwrap_or_default();
        config.args = lookup("NL_ARGS").map(|raw| parse_args(&raw)).unwrap_or_default();
        config.access_token = lookup("NL_TOKEN").filter(|token| !token.is_empty());

        log::debug!(
            "Loaded bridge config from environment: app={}, port={}, mode={:?}",
            config.app_id,
            config.port,
            config.mode
        );
        Ok(config)
    }

    /// Parse a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, ApiError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ApiError::InvalidInput {
            message: format!("Invalid bridge config: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self, ApiError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ApiError::IoError {
            message: format!("Failed to read config '{}': {e}", path.display()),
        })?;
        Self::from_json_str(&raw)
    }

    fn validate(&self) -> Result<(), ApiError> {
        if self.port == 0 {
            return Err(ApiError::InvalidInput {
                message: "Port cannot be 0".to_string(),
            });
        }
        if self.call_timeout_ms == Some(0) {
            return Err(ApiError::InvalidInput {
                message: "callTimeoutMs must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// WebSocket endpoint of the host process.
    pub fn websocket_url(&self) -> String {
        format!("ws://127.0.0.1:{}", self.port)
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }

    /// Interval between `app.keepAlive` calls. Browser mode keeps the host
    /// alive by default.
    pub fn keep_alive_interval(&self) -> Option<Duration> {
        match (self.keep_alive_interval_ms, self.mode) {
            (Some(0), _) => None,
            (Some(ms), _) => Some(Duration::from_millis(ms)),
            (None, Mode::Browser) => Some(Duration::from_millis(DEFAULT_BROWSER_KEEP_ALIVE_MS)),
            (None, _) => None,
        }
    }
}

fn parse_port(raw: &str) -> Result<u16, ApiError> {
    match raw.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(ApiError::InvalidInput {
            message: format!("Invalid port: {raw}"),
        }),
        Ok(port) => Ok(port),
    }
}

/// `NL_ARGS` is a JSON array; older hosts pass a plain space-separated list.
fn parse_args(raw: &str) -> Vec<String> {
    serde_json::from_str::<Vec<String>>(raw)
        .unwrap_or_else(|_| raw.split_whitespace().map(str::to_string).collect())
}
