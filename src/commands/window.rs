//! `window.*` - control of the native window (window mode only).

use serde::{Deserialize, Serialize};

use super::{require, to_options};
use crate::api::types::ApiError;
use crate::runtime::dispatcher::Dispatcher;

pub const METHOD_SET_TITLE: &str = "window.setTitle";
pub const METHOD_MINIMIZE: &str = "window.minimize";
pub const METHOD_MAXIMIZE: &str = "window.maximize";
pub const METHOD_UNMAXIMIZE: &str = "window.unmaximize";
pub const METHOD_IS_MAXIMIZED: &str = "window.isMaximized";
pub const METHOD_SET_FULL_SCREEN: &str = "window.setFullScreen";
pub const METHOD_EXIT_FULL_SCREEN: &str = "window.exitFullScreen";
pub const METHOD_IS_FULL_SCREEN: &str = "window.isFullScreen";
pub const METHOD_SHOW: &str = "window.show";
pub const METHOD_HIDE: &str = "window.hide";
pub const METHOD_IS_VISIBLE: &str = "window.isVisible";
pub const METHOD_FOCUS: &str = "window.focus";
pub const METHOD_MOVE: &str = "window.move";
pub const METHOD_SET_ICON: &str = "window.setIcon";
pub const METHOD_SET_DRAGGABLE_REGION: &str = "window.setDraggableRegion";

#[derive(Debug, Clone, Serialize)]
struct TitleOptions<'a> {
    title: &'a str,
}

/// Screen coordinates; `(0, 0)` is the top-left corner of the main screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Serialize)]
struct IconOptions<'a> {
    icon: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct DraggableRegionOptions<'a> {
    dom_id: &'a str,
}

async fn unit(dispatcher: &Dispatcher, method: &str) -> Result<(), ApiError> {
    dispatcher
        .call(method, serde_json::Value::Null)
        .await
        .map(|_| ())
}

async fn flag(dispatcher: &Dispatcher, method: &str) -> Result<bool, ApiError> {
    dispatcher
        .call_typed::<bool>(method, serde_json::Value::Null)
        .await
}

/// Set the title of the native window. An empty title is allowed.
pub async fn set_title(dispatcher: &Dispatcher, title: &str) -> Result<(), ApiError> {
    let options = to_options(METHOD_SET_TITLE, &TitleOptions { title })?;
    dispatcher.call(METHOD_SET_TITLE, options).await.map(|_| ())
}

pub async fn minimize(dispatcher: &Dispatcher) -> Result<(), ApiError> {
    unit(dispatcher, METHOD_MINIMIZE).await
}

pub async fn maximize(dispatcher: &Dispatcher) -> Result<(), ApiError> {
    unit(dispatcher, METHOD_MAXIMIZE).await
}

/// Restore a maximized window.
pub async fn unmaximize(dispatcher: &Dispatcher) -> Result<(), ApiError> {
    unit(dispatcher, METHOD_UNMAXIMIZE).await
}

pub async fn is_maximized(dispatcher: &Dispatcher) -> Result<bool, ApiError> {
    flag(dispatcher, METHOD_IS_MAXIMIZED).await
}

pub async fn set_full_screen(dispatcher: &Dispatcher) -> Result<(), ApiError> {
    unit(dispatcher, METHOD_SET_FULL_SCREEN).await
}

pub async fn exit_full_screen(dispatcher: &Dispatcher) -> Result<(), ApiError> {
    unit(dispatcher, METHOD_EXIT_FULL_SCREEN).await
}

pub async fn is_full_screen(dispatcher: &Dispatcher) -> Result<bool, ApiError> {
    flag(dispatcher, METHOD_IS_FULL_SCREEN).await
}

pub async fn show(dispatcher: &Dispatcher) -> Result<(), ApiError> {
    unit(dispatcher, METHOD_SHOW).await
}

pub async fn hide(dispatcher: &Dispatcher) -> Result<(), ApiError> {
    unit(dispatcher, METHOD_HIDE).await
}

pub async fn is_visible(dispatcher: &Dispatcher) -> Result<bool, ApiError> {
    flag(dispatcher, METHOD_IS_VISIBLE).await
}

pub async fn focus(dispatcher: &Dispatcher) -> Result<(), ApiError> {
    unit(dispatcher, METHOD_FOCUS).await
}

/// Move the window to the given screen coordinates.
pub async fn move_to(dispatcher: &Dispatcher, position: Position) -> Result<(), ApiError> {
    let options = to_options(METHOD_MOVE, &position)?;
    dispatcher.call(METHOD_MOVE, options).await.map(|_| ())
}

/// Set the window (or Dock) icon from a PNG path.
pub async fn set_icon(dispatcher: &Dispatcher, icon: &str) -> Result<(), ApiError> {
    require("icon", icon)?;
    let options = to_options(METHOD_SET_ICON, &IconOptions { icon })?;
    dispatcher.call(METHOD_SET_ICON, options).await.map(|_| ())
}

/// Turn the DOM element with `dom_id` into a window drag handle.
pub async fn set_draggable_region(dispatcher: &Dispatcher, dom_id: &str) -> Result<(), ApiError> {
    require("domId", dom_id)?;
    let options = to_options(METHOD_SET_DRAGGABLE_REGION, &DraggableRegionOptions { dom_id })?;
    dispatcher
        .call(METHOD_SET_DRAGGABLE_REGION, options)
        .await
        .map(|_| ())
}
