//! `app.*` - lifecycle of the running application instance.

use serde::{Deserialize, Serialize};

use super::{require, to_options};
use crate::api::types::ApiError;
use crate::runtime::dispatcher::Dispatcher;

pub const METHOD_EXIT: &str = "app.exit";
pub const METHOD_KEEP_ALIVE: &str = "app.keepAlive";
pub const METHOD_GET_CONFIG: &str = "app.getConfig";
pub const METHOD_OPEN: &str = "app.open";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenActionOptions {
    /// URL to open with the default browser
    pub url: String,
}

/// Terminate the running application.
pub async fn exit(dispatcher: &Dispatcher) -> Result<(), ApiError> {
    dispatcher
        .call(METHOD_EXIT, serde_json::Value::Null)
        .await
        .map(|_| ())
}

/// Keep the host from terminating an idle browser-mode instance.
pub async fn keep_alive(dispatcher: &Dispatcher) -> Result<(), ApiError> {
    dispatcher
        .call(METHOD_KEEP_ALIVE, serde_json::Value::Null)
        .await
        .map(|_| ())
}

/// The application configuration as a JSON object.
pub async fn get_config(dispatcher: &Dispatcher) -> Result<serde_json::Value, ApiError> {
    dispatcher.call(METHOD_GET_CONFIG, serde_json::Value::Null).await
}

/// Open a URL with the default web browser.
pub async fn open(
    dispatcher: &Dispatcher,
    options: OpenActionOptions,
) -> Result<serde_json::Value, ApiError> {
    require("url", &options.url)?;
    dispatcher
        .call(METHOD_OPEN, to_options(METHOD_OPEN, &options)?)
        .await
}
