//! `storage.*` - persistent key-value buckets shared by every app instance.
//!
//! Writing `None` erases a bucket. Reading a bucket that was never written
//! (or was erased) is rejected by the host with `NE_ST_NOSTKEX`.

use serde::{Deserialize, Serialize};

use super::{require, to_options};
use crate::api::types::ApiError;
use crate::runtime::dispatcher::Dispatcher;

pub const METHOD_PUT_DATA: &str = "storage.putData";
pub const METHOD_GET_DATA: &str = "storage.getData";

#[derive(Debug, Serialize)]
struct PutDataOptions<'a> {
    bucket: &'a str,
    // Serialized as `null` when absent; the host erases on null.
    data: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct BucketOptions<'a> {
    bucket: &'a str,
}

#[derive(Debug, Deserialize)]
struct GetDataResult {
    data: String,
}

/// Store `data` under `bucket`, or erase the bucket when `data` is `None`.
pub async fn put_data(
    dispatcher: &Dispatcher,
    bucket: &str,
    data: Option<&str>,
) -> Result<(), ApiError> {
    require("bucket", bucket)?;
    let options = to_options(METHOD_PUT_DATA, &PutDataOptions { bucket, data })?;
    dispatcher.call(METHOD_PUT_DATA, options).await.map(|_| ())
}

pub async fn get_data(dispatcher: &Dispatcher, bucket: &str) -> Result<String, ApiError> {
    require("bucket", bucket)?;
    let options = to_options(METHOD_GET_DATA, &BucketOptions { bucket })?;
    let result: GetDataResult = dispatcher.call_typed(METHOD_GET_DATA, options).await?;
    Ok(result.data)
}
