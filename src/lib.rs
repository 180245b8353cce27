//! Client-side bridge to a native host process.
//!
//! Application code issues typed calls (`window.*`, `filesystem.*`, `os.*`,
//! `storage.*` ...) through a [`Dispatcher`], which correlates each call
//! with exactly one response from the host over a single transport, and
//! subscribes to native events through an [`EventHub`].
//!
//! ```no_run
//! use host_bridge::{commands, Bridge, BridgeConfig};
//!
//! # async fn run() -> Result<(), host_bridge::ApiError> {
//! let bridge = Bridge::connect(BridgeConfig::from_env()?).await?;
//! commands::storage::put_data(bridge.dispatcher(), "theme", Some("dark")).await?;
//! let _theme = commands::storage::get_data(bridge.dispatcher(), "theme").await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod commands;
pub mod config;
pub mod protocols;
pub mod runtime;

#[cfg(test)]
mod testing;

pub use api::types::{ApiError, CallId, Event, EventName, TrayMenuItem};
pub use config::{BridgeConfig, Mode};
pub use runtime::bridge::Bridge;
pub use runtime::dispatcher::{CallHandle, Dispatcher};
pub use runtime::events::{handler, DispatchReport, EventHandler, EventHub};
