//! `debug.*` - write to the host's log file.

use serde::{Deserialize, Serialize};

use super::to_options;
use crate::api::types::ApiError;
use crate::runtime::dispatcher::Dispatcher;

pub const METHOD_LOG: &str = "debug.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    #[default]
    Info,
    Warn,
    Error,
}

#[derive(Debug, Serialize)]
struct LogOptions<'a> {
    #[serde(rename = "type")]
    level: LogLevel,
    message: &'a str,
}

/// Append `message` to the host log at the given level.
pub async fn log(dispatcher: &Dispatcher, level: LogLevel, message: &str) -> Result<(), ApiError> {
    let options = to_options(METHOD_LOG, &LogOptions { level, message })?;
    dispatcher.call(METHOD_LOG, options).await.map(|_| ())
}
