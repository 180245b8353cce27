//! In-process scripted host used by the facade and scenario tests.
//!
//! Speaks the codec's host side over a `ChannelTransport` and keeps its
//! storage buckets, files and window flags in memory.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::types::{Event, NE_FS_FILRDER, NE_FS_NOPATHE, NE_RT_NATRTER, NE_ST_NOSTKEX};
use crate::config::BridgeConfig;
use crate::protocols::codec::{self, Call};
use crate::protocols::transport::ChannelTransport;
use crate::runtime::dispatcher::Dispatcher;
use crate::runtime::events::EventHub;

type Reply = Result<Value, (&'static str, String)>;

#[derive(Default)]
struct HostState {
    storage: HashMap<String, String>,
    files: BTreeMap<String, String>,
    dirs: BTreeSet<String>,
    env: HashMap<String, String>,
    maximized: bool,
    full_screen: bool,
    visible: bool,
}

pub(crate) struct MockHost {
    dispatcher: Arc<Dispatcher>,
    calls: Arc<Mutex<Vec<Call>>>,
    to_client: Option<mpsc::UnboundedSender<String>>,
    task: JoinHandle<()>,
}

impl MockHost {
    pub(crate) fn start() -> Self {
        Self::start_with(&BridgeConfig::new(1))
    }

    pub(crate) fn start_with(config: &BridgeConfig) -> Self {
        let (transport, mut endpoint) = ChannelTransport::pair();
        let dispatcher = Dispatcher::start(transport, Arc::new(EventHub::new()), config);
        let calls: Arc<Mutex<Vec<Call>>> = Arc::default();
        let to_client = endpoint.to_client.clone();

        let calls_for_task = calls.clone();
        let task = tokio::spawn(async move {
            let mut state = HostState {
                visible: true,
                ..HostState::default()
            };
            state.dirs.insert(".".to_string());
            state.env.insert("HOME".to_string(), "/home/mock".to_string());

            while let Some(frame) = endpoint.recv().await {
                let call = match codec::decode_call(&frame) {
                    Ok(call) => call,
                    Err(e) => panic!("mock host received a bad frame: {e}"),
                };
                calls_for_task.lock().push(call.clone());

                let reply = match answer(&mut state, &call) {
                    Ok(result) => codec::encode_response(&call.id, result),
                    Err((code, message)) => codec::encode_error(&call.id, code, &message),
                };
                let Ok(reply) = reply else { break };
                if endpoint.send(reply).is_err() {
                    break;
                }
            }
        });

        Self {
            dispatcher,
            calls,
            to_client: Some(to_client),
            task,
        }
    }

    pub(crate) fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub(crate) fn dispatcher_arc(&self) -> Arc<Dispatcher> {
        self.dispatcher.clone()
    }

    /// Most recent call for `method`.
    pub(crate) fn last_call(&self, method: &str) -> Option<Call> {
        self.calls
            .lock()
            .iter()
            .rev()
            .find(|call| call.method == method)
            .cloned()
    }

    pub(crate) fn call_count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.method == method)
            .count()
    }

    /// Emit a native event towards the bridge.
    pub(crate) fn emit(&self, event: &Event) {
        let frame = codec::encode_event(event).expect("encode event");
        if let Some(to_client) = &self.to_client {
            to_client.send(frame).expect("bridge transport dropped");
        }
    }

    /// Drop the connection from the host side.
    pub(crate) fn disconnect(&mut self) {
        self.task.abort();
        self.to_client = None;
    }
}

impl Drop for MockHost {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn str_option<'a>(call: &'a Call, key: &str) -> &'a str {
    call.options.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn answer(state: &mut HostState, call: &Call) -> Reply {
    match call.method.as_str() {
        "app.getConfig" => Ok(json!({"applicationId": "js.mock.app", "defaultMode": "window"})),
        "app.open" => Ok(json!({"success": true})),
        "app.exit" | "app.keepAlive" => Ok(Value::Null),

        "window.maximize" => {
            state.maximized = true;
            Ok(Value::Null)
        }
        "window.unmaximize" => {
            state.maximized = false;
            Ok(Value::Null)
        }
        "window.isMaximized" => Ok(json!(state.maximized)),
        "window.setFullScreen" => {
            state.full_screen = true;
            Ok(Value::Null)
        }
        "window.exitFullScreen" => {
            state.full_screen = false;
            Ok(Value::Null)
        }
        "window.isFullScreen" => Ok(json!(state.full_screen)),
        "window.show" => {
            state.visible = true;
            Ok(Value::Null)
        }
        "window.hide" => {
            state.visible = false;
            Ok(Value::Null)
        }
        "window.isVisible" => Ok(json!(state.visible)),
        "window.setTitle" | "window.minimize" | "window.focus" | "window.move"
        | "window.setIcon" | "window.setDraggableRegion" => Ok(Value::Null),

        "filesystem.createDirectory" => {
            state.dirs.insert(str_option(call, "path").to_string());
            Ok(Value::Null)
        }
        "filesystem.removeDirectory" => {
            let path = str_option(call, "path");
            if state.dirs.remove(path) {
                Ok(Value::Null)
            } else {
                Err((NE_FS_NOPATHE, format!("No such directory: {path}")))
            }
        }
        "filesystem.writeFile" => {
            state.files.insert(
                str_option(call, "fileName").to_string(),
                str_option(call, "data").to_string(),
            );
            Ok(Value::Null)
        }
        "filesystem.readFile" => {
            let name = str_option(call, "fileName");
            match state.files.get(name) {
                Some(data) => Ok(json!({"data": data, "hasError": false})),
                None => Err((NE_FS_FILRDER, format!("Unable to open file {name}"))),
            }
        }
        "filesystem.removeFile" => {
            let name = str_option(call, "fileName");
            match state.files.remove(name) {
                Some(_) => Ok(Value::Null),
                None => Err((NE_FS_NOPATHE, format!("No such file: {name}"))),
            }
        }
        "filesystem.readDirectory" => {
            let path = str_option(call, "path");
            if !state.dirs.contains(path) {
                return Err((NE_FS_NOPATHE, format!("No such directory: {path}")));
            }
            let prefix = format!("{path}/");
            let child = |full: &String| {
                full.strip_prefix(&prefix)
                    .filter(|rest| !rest.is_empty() && !rest.contains('/'))
                    .map(str::to_string)
            };
            let mut entries: Vec<Value> = state
                .dirs
                .iter()
                .filter_map(child)
                .map(|entry| json!({"entry": entry, "type": "DIRECTORY"}))
                .collect();
            entries.extend(
                state
                    .files
                    .keys()
                    .filter_map(child)
                    .map(|entry| json!({"entry": entry, "type": "FILE"})),
            );
            Ok(json!({"entries": entries, "success": true}))
        }

        "os.execCommand" => {
            let command = str_option(call, "command");
            let output = command
                .strip_prefix("echo ")
                .map(|rest| format!("{rest}\n"))
                .unwrap_or_else(|| format!("sh: {command}: not found\n"));
            Ok(json!({"output": output}))
        }
        "os.getEnvar" => {
            let value = state.env.get(str_option(call, "key")).cloned().unwrap_or_default();
            Ok(json!({"value": value}))
        }
        "os.showDialogOpen" => Ok(json!({"selectedEntry": "/home/mock/picked.txt"})),
        "os.showDialogSave" => Ok(json!({"selectedEntry": "/home/mock/saved.txt"})),
        "os.showMessageBox" => Ok(json!({"yesButtonClicked": str_option(call, "type") == "QUESTION"})),
        "os.showNotification" | "os.setTray" => Ok(Value::Null),

        "computer.getRamUsage" => Ok(json!({
            "ram": {"total": 16_384_000, "available": 8_192_000},
            "success": true
        })),

        "storage.putData" => {
            let bucket = str_option(call, "bucket").to_string();
            match call.options.get("data").and_then(Value::as_str) {
                Some(data) => {
                    state.storage.insert(bucket, data.to_string());
                }
                None => {
                    state.storage.remove(&bucket);
                }
            }
            Ok(Value::Null)
        }
        "storage.getData" => {
            let bucket = str_option(call, "bucket");
            match state.storage.get(bucket) {
                Some(data) => Ok(json!({"data": data})),
                None => Err((NE_ST_NOSTKEX, format!("Unable to find storage bucket: {bucket}"))),
            }
        }

        "debug.log" => Ok(Value::Null),

        other => Err((NE_RT_NATRTER, format!("Unknown method: {other}"))),
    }
}
