//! Pending Call Registry - outstanding calls awaiting their single outcome.
//!
//! Each outstanding call owns a tokio oneshot sender keyed by its id.
//!
//! # Flow
//!
//! 1. The dispatcher allocates an id and registers the sender
//! 2. The call frame goes out through the transport
//! 3. A response frame (or a timeout, or transport loss) removes the entry
//! 4. The removed sender delivers the outcome; later attempts find nothing
//!
//! Removal and delivery happen under one lock, so an id resolves at most once.

use std::collections::HashMap;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::api::types::{ApiError, CallId};

/// Completion side of a call: exactly one of success or failure.
pub type Completion = oneshot::Sender<Result<serde_json::Value, ApiError>>;

/// A call awaiting its response
struct PendingCall {
    /// Oneshot sender to deliver the outcome
    tx: Completion,
    /// Qualified method name, for diagnostics
    method: String,
    created_at: Instant,
}

/// Registry of outstanding calls keyed by id.
pub struct PendingCalls {
    pending: Mutex<HashMap<CallId, PendingCall>>,
}

impl PendingCalls {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Register a completion under an explicit id.
    ///
    /// # Errors
    ///
    /// - `DuplicateCallId` if a call with this id is still pending
    pub fn register(&self, id: CallId, method: &str, tx: Completion) -> Result<(), ApiError> {
        let mut pending = self.pending.lock();
        if pending.contains_key(&id) {
            return Err(ApiError::DuplicateCallId { id });
        }
        pending.insert(
            id,
            PendingCall {
                tx,
                method: method.to_string(),
                created_at: Instant::now(),
            },
        );
        Ok(())
    }

    /// Allocate a fresh id unused by any pending call and register under it.
    pub fn register_new(&self, method: &str, tx: Completion) -> CallId {
        let mut pending = self.pending.lock();
        let id = loop {
            let candidate = Uuid::new_v4().to_string();
            if !pending.contains_key(&candidate) {
                break candidate;
            }
            log::warn!("Call id collision, regenerating: id={candidate}");
        };
        pending.insert(
            id.clone(),
            PendingCall {
                tx,
                method: method.to_string(),
                created_at: Instant::now(),
            },
        );
        id
    }

    /// Resolve a pending call with its success payload.
    ///
    /// Returns `false` (and does nothing else) if the id is not pending.
    pub fn resolve(&self, id: &str, payload: serde_json::Value) -> bool {
        self.complete(id, Ok(payload))
    }

    /// Reject a pending call.
    ///
    /// Returns `false` (and does nothing else) if the id is not pending.
    pub fn reject(&self, id: &str, error: ApiError) -> bool {
        self.complete(id, Err(error))
    }

    /// Reject every pending call with `ConnectionLost { reason }` and clear
    /// the registry. Returns the number of calls rejected.
    pub fn abandon_all(&self, reason: &str) -> usize {
        let drained: Vec<(CallId, PendingCall)> = {
            let mut pending = self.pending.lock();
            pending.drain().collect()
        };

        let count = drained.len();
        for (id, call) in drained {
            log::debug!(
                "Abandoning call: id={id}, method={}, age_ms={}",
                call.method,
                call.created_at.elapsed().as_millis()
            );
            if call.tx.send(Err(ApiError::connection_lost(reason))).is_err() {
                log::debug!("Abandoned call had no listener: id={id}");
            }
        }

        if count > 0 {
            log::warn!("Abandoned {count} pending call(s): {reason}");
        }
        count
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.pending.lock().contains_key(id)
    }

    fn complete(&self, id: &str, outcome: Result<serde_json::Value, ApiError>) -> bool {
        let call = {
            let mut pending = self.pending.lock();
            pending.remove(id)
        };

        match call {
            Some(call) => {
                let ok = outcome.is_ok();
                // The caller may have dropped its handle; the entry is gone either way
                if call.tx.send(outcome).is_err() {
                    log::debug!("Call completed with no listener: id={id}, method={}", call.method);
                } else {
                    log::debug!(
                        "Call completed: id={id}, method={}, ok={ok}, elapsed_ms={}",
                        call.method,
                        call.created_at.elapsed().as_millis()
                    );
                }
                true
            }
            None => false,
        }
    }
}

impl Default for PendingCalls {
    fn default() -> Self {
        Self::new()
    }
}
