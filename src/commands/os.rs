//! `os.*` - shell commands, environment, dialogs, notifications and the tray.

use serde::{Deserialize, Serialize};

use super::{require, to_options};
use crate::api::types::{ApiError, TrayMenuItem};
use crate::runtime::dispatcher::Dispatcher;

pub const METHOD_EXEC_COMMAND: &str = "os.execCommand";
pub const METHOD_GET_ENVAR: &str = "os.getEnvar";
pub const METHOD_SHOW_DIALOG_OPEN: &str = "os.showDialogOpen";
pub const METHOD_SHOW_DIALOG_SAVE: &str = "os.showDialogSave";
pub const METHOD_SHOW_NOTIFICATION: &str = "os.showNotification";
pub const METHOD_SHOW_MESSAGE_BOX: &str = "os.showMessageBox";
pub const METHOD_SET_TRAY: &str = "os.setTray";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageBoxType {
    Warn,
    Error,
    Info,
    Question,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenDialogOptions {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_directory_mode: Option<bool>,
    /// File extensions to list, e.g. `["js", "ts", "*"]`
    #[serde(default)]
    pub filter: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationOptions {
    pub summary: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBoxOptions {
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageBoxType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrayOptions {
    pub icon: String,
    #[serde(default)]
    pub menu_items: Vec<TrayMenuItem>,
}

#[derive(Debug, Serialize)]
struct CommandOptions<'a> {
    command: &'a str,
}

#[derive(Debug, Serialize)]
struct EnvarOptions<'a> {
    key: &'a str,
}

#[derive(Debug, Serialize)]
struct SaveDialogOptions<'a> {
    title: &'a str,
}

#[derive(Debug, Deserialize)]
struct CommandResult {
    output: String,
}

#[derive(Debug, Deserialize)]
struct EnvarResult {
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DialogResult {
    selected_entry: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageBoxResult {
    yes_button_clicked: bool,
}

/// Run a shell command and return its combined stdout/stderr.
pub async fn exec_command(dispatcher: &Dispatcher, command: &str) -> Result<String, ApiError> {
    require("command", command)?;
    let options = to_options(METHOD_EXEC_COMMAND, &CommandOptions { command })?;
    let result: CommandResult = dispatcher.call_typed(METHOD_EXEC_COMMAND, options).await?;
    Ok(result.output)
}

/// Read an environment variable of the host process. Unset variables read
/// as an empty string.
pub async fn get_envar(dispatcher: &Dispatcher, key: &str) -> Result<String, ApiError> {
    require("key", key)?;
    let options = to_options(METHOD_GET_ENVAR, &EnvarOptions { key })?;
    let result: EnvarResult = dispatcher.call_typed(METHOD_GET_ENVAR, options).await?;
    Ok(result.value)
}

/// Show a native open dialog and return the selected path.
pub async fn show_dialog_open(
    dispatcher: &Dispatcher,
    options: OpenDialogOptions,
) -> Result<String, ApiError> {
    let options = to_options(METHOD_SHOW_DIALOG_OPEN, &options)?;
    let result: DialogResult = dispatcher.call_typed(METHOD_SHOW_DIALOG_OPEN, options).await?;
    Ok(result.selected_entry)
}

pub async fn show_dialog_save(dispatcher: &Dispatcher, title: &str) -> Result<String, ApiError> {
    let options = to_options(METHOD_SHOW_DIALOG_SAVE, &SaveDialogOptions { title })?;
    let result: DialogResult = dispatcher.call_typed(METHOD_SHOW_DIALOG_SAVE, options).await?;
    Ok(result.selected_entry)
}

pub async fn show_notification(
    dispatcher: &Dispatcher,
    options: NotificationOptions,
) -> Result<(), ApiError> {
    require("summary", &options.summary)?;
    dispatcher
        .call(METHOD_SHOW_NOTIFICATION, to_options(METHOD_SHOW_NOTIFICATION, &options)?)
        .await
        .map(|_| ())
}

/// Show a message box. Returns `true` when the user picked "yes" on a
/// `QUESTION` box.
pub async fn show_message_box(
    dispatcher: &Dispatcher,
    options: MessageBoxOptions,
) -> Result<bool, ApiError> {
    let options = to_options(METHOD_SHOW_MESSAGE_BOX, &options)?;
    let result: MessageBoxResult = dispatcher.call_typed(METHOD_SHOW_MESSAGE_BOX, options).await?;
    Ok(result.yes_button_clicked)
}

/// Replace the tray icon and its menu.
pub async fn set_tray(dispatcher: &Dispatcher, options: TrayOptions) -> Result<(), ApiError> {
    require("icon", &options.icon)?;
    dispatcher
        .call(METHOD_SET_TRAY, to_options(METHOD_SET_TRAY, &options)?)
        .await
        .map(|_| ())
}
