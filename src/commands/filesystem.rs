//! `filesystem.*` - file and directory operations performed by the host.

use serde::{Deserialize, Serialize};

use super::{require, to_options};
use crate::api::types::ApiError;
use crate::runtime::dispatcher::Dispatcher;

pub const METHOD_CREATE_DIRECTORY: &str = "filesystem.createDirectory";
pub const METHOD_REMOVE_DIRECTORY: &str = "filesystem.removeDirectory";
pub const METHOD_WRITE_FILE: &str = "filesystem.writeFile";
pub const METHOD_READ_FILE: &str = "filesystem.readFile";
pub const METHOD_REMOVE_FILE: &str = "filesystem.removeFile";
pub const METHOD_READ_DIRECTORY: &str = "filesystem.readDirectory";

#[derive(Debug, Clone, Serialize)]
struct PathOptions<'a> {
    path: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileOptions<'a> {
    file_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryType {
    File,
    Directory,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub entry: String,
    #[serde(rename = "type")]
    pub kind: EntryType,
}

#[derive(Debug, Deserialize)]
struct ReadFileResult {
    data: String,
}

#[derive(Debug, Deserialize)]
struct ReadDirectoryResult {
    entries: Vec<DirectoryEntry>,
}

async fn path_call(dispatcher: &Dispatcher, method: &str, path: &str) -> Result<(), ApiError> {
    require("path", path)?;
    let options = to_options(method, &PathOptions { path })?;
    dispatcher.call(method, options).await.map(|_| ())
}

pub async fn create_directory(dispatcher: &Dispatcher, path: &str) -> Result<(), ApiError> {
    path_call(dispatcher, METHOD_CREATE_DIRECTORY, path).await
}

pub async fn remove_directory(dispatcher: &Dispatcher, path: &str) -> Result<(), ApiError> {
    path_call(dispatcher, METHOD_REMOVE_DIRECTORY, path).await
}

/// Write `data` to `file_name`, replacing any existing contents.
pub async fn write_file(dispatcher: &Dispatcher, file_name: &str, data: &str) -> Result<(), ApiError> {
    require("fileName", file_name)?;
    let options = to_options(
        METHOD_WRITE_FILE,
        &FileOptions {
            file_name,
            data: Some(data),
        },
    )?;
    dispatcher.call(METHOD_WRITE_FILE, options).await.map(|_| ())
}

/// Read a whole text file.
///
/// A missing or unreadable file is reported by the host and surfaces as
/// [`ApiError::HostError`] with code `NE_FS_FILRDER`.
pub async fn read_file(dispatcher: &Dispatcher, file_name: &str) -> Result<String, ApiError> {
    require("fileName", file_name)?;
    let options = to_options(
        METHOD_READ_FILE,
        &FileOptions {
            file_name,
            data: None,
        },
    )?;
    let result: ReadFileResult = dispatcher.call_typed(METHOD_READ_FILE, options).await?;
    Ok(result.data)
}

pub async fn remove_file(dispatcher: &Dispatcher, file_name: &str) -> Result<(), ApiError> {
    require("fileName", file_name)?;
    let options = to_options(
        METHOD_REMOVE_FILE,
        &FileOptions {
            file_name,
            data: None,
        },
    )?;
    dispatcher.call(METHOD_REMOVE_FILE, options).await.map(|_| ())
}

/// List the direct children of `path`.
pub async fn read_directory(
    dispatcher: &Dispatcher,
    path: &str,
) -> Result<Vec<DirectoryEntry>, ApiError> {
    require("path", path)?;
    let options = to_options(METHOD_READ_DIRECTORY, &PathOptions { path })?;
    let result: ReadDirectoryResult = dispatcher.call_typed(METHOD_READ_DIRECTORY, options).await?;
    Ok(result.entries)
}
