//! Dispatcher - correlates outbound calls with inbound responses.
//!
//! A single driver task owns the transport. It forwards outbound frames,
//! decodes inbound frames, settles responses through the pending registry
//! and hands events to the hub. When the transport ends, every pending call
//! is abandoned and later calls reject immediately.
//!
//! Event handlers run on the driver task: they may issue calls, but must not
//! block waiting for a response.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{AbortHandle, JoinHandle};

use crate::api::types::{ApiError, CallId};
use crate::config::BridgeConfig;
use crate::protocols::codec::{self, Call, Inbound, Outcome, Response};
use crate::protocols::transport::Transport;
use crate::runtime::events::EventHub;
use crate::runtime::pending::PendingCalls;

const REASON_SHUTDOWN: &str = "bridge shut down";
const REASON_HOST_CLOSED: &str = "host closed the connection";
const REASON_TRANSPORT_CLOSED: &str = "transport closed";

/// Completion handle for a single call.
///
/// Resolves exactly once with the host's payload or a failure. Dropping the
/// handle cancels its deadline timer, if any.
#[derive(Debug)]
pub struct CallHandle {
    id: CallId,
    method: String,
    rx: oneshot::Receiver<Result<serde_json::Value, ApiError>>,
    deadline: Option<AbortHandle>,
}

impl CallHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}

impl Future for CallHandle {
    type Output = Result<serde_json::Value, ApiError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            // Sender dropped without an outcome: the registry itself went away
            Poll::Ready(Err(_)) => Poll::Ready(Err(ApiError::connection_lost(
                "call dropped without a response",
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for CallHandle {
    fn drop(&mut self) {
        if let Some(deadline) = self.deadline.take() {
            deadline.abort();
        }
    }
}

/// The bridge's correlation engine.
pub struct Dispatcher {
    pending: Arc<PendingCalls>,
    hub: Arc<EventHub>,
    outbound: mpsc::UnboundedSender<String>,
    connected: Arc<watch::Sender<bool>>,
    access_token: Option<String>,
    call_timeout: Option<Duration>,
    runtime: tokio::runtime::Handle,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Start the driver task over `transport`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<T: Transport>(transport: T, hub: Arc<EventHub>, config: &BridgeConfig) -> Arc<Self> {
        let pending = Arc::new(PendingCalls::new());
        let connected = Arc::new(watch::Sender::new(true));
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let driver = tokio::spawn(drive(
            transport,
            outbound_rx,
            shutdown_rx,
            pending.clone(),
            hub.clone(),
            connected.clone(),
        ));

        log::info!(
            "Dispatcher started: app={}, port={}, call_timeout={:?}",
            config.app_id,
            config.port,
            config.call_timeout()
        );

        Arc::new(Self {
            pending,
            hub,
            outbound: outbound_tx,
            connected,
            access_token: config.access_token.clone(),
            call_timeout: config.call_timeout(),
            runtime: tokio::runtime::Handle::current(),
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            driver: Mutex::new(Some(driver)),
        })
    }

    /// Issue a call. Never blocks; the outcome arrives through the handle.
    pub fn call(&self, method: &str, options: serde_json::Value) -> CallHandle {
        let (tx, rx) = oneshot::channel();
        let id = self.pending.register_new(method, tx);
        let mut handle = CallHandle {
            id: id.clone(),
            method: method.to_string(),
            rx,
            deadline: None,
        };

        let call = Call {
            id,
            method: method.to_string(),
            options,
            access_token: self.access_token.clone(),
        };

        let frame = match codec::encode(&call) {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Failed to encode call: id={}, method={method}: {e}", call.id);
                self.pending.reject(&call.id, e);
                return handle;
            }
        };

        if self.outbound.send(frame).is_err() {
            log::debug!("Call issued after transport closed: id={}, method={method}", call.id);
            self.pending
                .reject(&call.id, ApiError::connection_lost(REASON_TRANSPORT_CLOSED));
            return handle;
        }

        log::debug!("Call sent: id={}, method={method}", call.id);

        if let Some(after) = self.call_timeout {
            let timer = self.runtime.spawn(expire_after(
                Arc::downgrade(&self.pending),
                call.id,
                call.method,
                after,
            ));
            handle.deadline = Some(timer.abort_handle());
        }

        handle
    }

    /// Issue a call and deserialize its success payload.
    pub async fn call_typed<T: DeserializeOwned>(
        &self,
        method: &str,
        options: serde_json::Value,
    ) -> Result<T, ApiError> {
        let payload = self.call(method, options).await?;
        serde_json::from_value(payload).map_err(|e| ApiError::ProtocolError {
            message: format!("Unexpected result for {method}: {e}"),
        })
    }

    pub fn hub(&self) -> &Arc<EventHub> {
        &self.hub
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    /// Wait until the transport has ended, for any reason.
    pub async fn closed(&self) {
        let mut connected = self.connected.subscribe();
        // The sender lives in `self`, so this only returns once disconnected
        let _ = connected.wait_for(|connected| !*connected).await;
    }

    /// Close the transport and reject everything still pending.
    pub async fn shutdown(&self) {
        let shutdown_tx = self.shutdown_tx.lock().take();
        if let Some(tx) = shutdown_tx {
            // Driver already gone if this fails
            let _ = tx.send(());
        }

        let driver = self.driver.lock().take();
        if let Some(driver) = driver {
            if let Err(e) = driver.await {
                log::warn!("Dispatcher driver task failed: {e}");
            }
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        log::debug!("Dispatcher dropped: pending={}", self.pending.len());
    }
}

async fn drive<T: Transport>(
    mut transport: T,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    mut shutdown_rx: oneshot::Receiver<()>,
    pending: Arc<PendingCalls>,
    hub: Arc<EventHub>,
    connected: Arc<watch::Sender<bool>>,
) {
    let reason = loop {
        tokio::select! {
            _ = &mut shutdown_rx => break REASON_SHUTDOWN.to_string(),
            frame = outbound_rx.recv() => match frame {
                Some(frame) => {
                    if let Err(e) = transport.send(frame).await {
                        log::error!("Failed to send frame to host: {e}");
                        break loss_reason(e);
                    }
                }
                None => break REASON_SHUTDOWN.to_string(),
            },
            inbound = transport.next_frame() => match inbound {
                Some(Ok(frame)) => handle_frame(&frame, &pending, &hub),
                Some(Err(e @ ApiError::ProtocolError { .. })) => {
                    log::warn!("Discarding undecodable frame: {e}");
                }
                Some(Err(e)) => {
                    log::error!("Host connection failed: {e}");
                    break loss_reason(e);
                }
                None => break REASON_HOST_CLOSED.to_string(),
            },
        }
    };

    connected.send_replace(false);
    // Close before abandoning: a call racing with shutdown either lands in the
    // registry before abandon_all or fails its send and rejects itself.
    outbound_rx.close();
    if let Err(e) = transport.close().await {
        log::debug!("Transport close failed: {e}");
    }

    log::info!("Dispatcher stopped: {reason}");
    pending.abandon_all(&reason);
}

fn loss_reason(error: ApiError) -> String {
    match error {
        ApiError::ConnectionLost { reason } => reason,
        other => other.to_string(),
    }
}

fn handle_frame(frame: &str, pending: &PendingCalls, hub: &EventHub) {
    match codec::decode(frame) {
        Ok(Inbound::Response(Response { id, outcome })) => {
            let delivered = match outcome {
                Outcome::Success(payload) => pending.resolve(&id, payload),
                Outcome::Failure(failure) => pending.reject(
                    &id,
                    ApiError::HostError {
                        code: failure.code,
                        message: failure.message,
                    },
                ),
            };
            if !delivered {
                log::warn!("Dropping response for unknown call: id={id}");
            }
        }
        Ok(Inbound::Event(event)) => {
            let report = hub.dispatch(&event);
            log::debug!(
                "Event dispatched: event={}, handlers={}, failed={}",
                event.name(),
                report.invoked,
                report.failed.len()
            );
        }
        Err(e) => {
            log::warn!("Discarding undecodable frame: {e}");
        }
    }
}

async fn expire_after(pending: Weak<PendingCalls>, id: CallId, method: String, after: Duration) {
    tokio::time::sleep(after).await;
    let Some(pending) = pending.upgrade() else {
        return;
    };
    let error = ApiError::Timeout {
        method: method.clone(),
        after_ms: after.as_millis() as u64,
    };
    if pending.reject(&id, error) {
        log::warn!("Call timed out: id={id}, method={method}");
    }
}
