//! EventHub - per-event ordered handler lists with fan-out dispatch.
//!
//! Registration never deduplicates: the same handler registered twice fires
//! twice. `off` removes the first matching registration only. Handler
//! identity is `Arc` pointer identity.
//!
//! Dispatch iterates over a snapshot taken at dispatch time, so handlers may
//! register or unregister handlers (for any event) while running.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::api::types::{ApiError, Event, EventName};

/// A registered event handler.
pub type EventHandler = Arc<dyn Fn(&Event) -> Result<(), ApiError> + Send + Sync>;

/// Wrap a closure as an `EventHandler`.
pub fn handler<F>(f: F) -> EventHandler
where
    F: Fn(&Event) -> Result<(), ApiError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Outcome of a single dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers invoked (including failed ones)
    pub invoked: usize,
    /// Errors and panics, in invocation order
    pub failed: Vec<ApiError>,
}

pub struct EventHub {
    handlers: Mutex<HashMap<EventName, Vec<EventHandler>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(HashMap::new()),
        }
    }

    /// Append a handler for `name`.
    pub fn on(&self, name: EventName, handler: EventHandler) {
        let mut handlers = self.handlers.lock();
        let list = handlers.entry(name).or_default();
        list.push(handler);
        log::debug!("Handler registered: event={name}, total={}", list.len());
    }

    /// Remove the first registration of `handler` for `name`.
    ///
    /// Returns `false` if it was not registered.
    pub fn off(&self, name: EventName, handler: &EventHandler) -> bool {
        let mut handlers = self.handlers.lock();
        let Some(list) = handlers.get_mut(&name) else {
            return false;
        };
        let Some(index) = list.iter().position(|h| Arc::ptr_eq(h, handler)) else {
            return false;
        };
        list.remove(index);
        if list.is_empty() {
            handlers.remove(&name);
        }
        log::debug!("Handler unregistered: event={name}");
        true
    }

    pub fn handler_count(&self, name: EventName) -> usize {
        self.handlers.lock().get(&name).map_or(0, Vec::len)
    }

    /// Invoke every handler registered for the event's name, in order.
    pub fn dispatch(&self, event: &Event) -> DispatchReport {
        let name = event.name();
        let snapshot: Vec<EventHandler> = {
            let handlers = self.handlers.lock();
            handlers.get(&name).cloned().unwrap_or_default()
        };

        if snapshot.is_empty() {
            log::debug!("No handlers for event: {name}");
        }

        let mut report = DispatchReport::default();
        for handler in snapshot {
            report.invoked += 1;
            let failure = match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(ApiError::HandlerFailed {
                    event: name.to_string(),
                    message: e.to_string(),
                }),
                Err(panic) => Some(ApiError::HandlerFailed {
                    event: name.to_string(),
                    message: format!("handler panicked: {}", panic_message(panic.as_ref())),
                }),
            };
            if let Some(error) = failure {
                log::warn!("{error}");
                report.failed.push(error);
            }
        }
        report
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::TrayMenuItem;

    type Log = Arc<Mutex<Vec<String>>>;

    fn recorder(log: &Log, label: &'static str) -> EventHandler {
        let log = log.clone();
        handler(move |event| {
            log.lock().push(format!("{label}:{}", event.name()));
            Ok(())
        })
    }

    fn tray_click() -> Event {
        Event::TrayMenuItemClicked(TrayMenuItem::new("quit", "Quit"))
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let hub = EventHub::new();
        let log: Log = Arc::default();
        hub.on(EventName::TrayMenuItemClicked, recorder(&log, "h1"));
        hub.on(EventName::TrayMenuItemClicked, recorder(&log, "h2"));

        let report = hub.dispatch(&tray_click());

        assert_eq!(report.invoked, 2);
        assert!(report.failed.is_empty());
        assert_eq!(
            *log.lock(),
            vec!["h1:trayMenuItemClicked", "h2:trayMenuItemClicked"]
        );
    }

    #[test]
    fn test_handler_receives_payload() {
        let hub = EventHub::new();
        let seen: Arc<Mutex<Option<TrayMenuItem>>> = Arc::default();
        let seen_clone = seen.clone();
        hub.on(
            EventName::TrayMenuItemClicked,
            handler(move |event| {
                if let Event::TrayMenuItemClicked(item) = event {
                    *seen_clone.lock() = Some(item.clone());
                }
                Ok(())
            }),
        );

        hub.dispatch(&tray_click());

        assert_eq!(*seen.lock(), Some(TrayMenuItem::new("quit", "Quit")));
    }

    #[test]
    fn test_off_before_dispatch() {
        let hub = EventHub::new();
        let log: Log = Arc::default();
        let h1 = recorder(&log, "h1");
        hub.on(EventName::TrayMenuItemClicked, h1.clone());
        hub.on(EventName::TrayMenuItemClicked, recorder(&log, "h2"));

        assert!(hub.off(EventName::TrayMenuItemClicked, &h1));
        hub.dispatch(&tray_click());

        assert_eq!(*log.lock(), vec!["h2:trayMenuItemClicked"]);
    }

    #[test]
    fn test_off_unknown_handler_is_noop() {
        let hub = EventHub::new();
        let log: Log = Arc::default();
        let stranger = recorder(&log, "x");

        assert!(!hub.off(EventName::WindowClose, &stranger));
        hub.on(EventName::WindowClose, recorder(&log, "y"));
        assert!(!hub.off(EventName::WindowClose, &stranger));
        assert_eq!(hub.handler_count(EventName::WindowClose), 1);
    }

    #[test]
    fn test_duplicate_registration_fires_twice_and_off_removes_one() {
        let hub = EventHub::new();
        let log: Log = Arc::default();
        let h = recorder(&log, "h");
        hub.on(EventName::WindowFocus, h.clone());
        hub.on(EventName::WindowFocus, h.clone());

        hub.dispatch(&Event::WindowFocus);
        assert_eq!(log.lock().len(), 2);

        assert!(hub.off(EventName::WindowFocus, &h));
        assert_eq!(hub.handler_count(EventName::WindowFocus), 1);
    }

    #[test]
    fn test_failing_handlers_do_not_stop_dispatch() {
        let hub = EventHub::new();
        let log: Log = Arc::default();
        hub.on(
            EventName::Ready,
            handler(|_| {
                Err(ApiError::InvalidInput {
                    message: "boom".to_string(),
                })
            }),
        );
        hub.on(EventName::Ready, handler(|_| panic!("handler exploded")));
        hub.on(EventName::Ready, recorder(&log, "after"));

        let report = hub.dispatch(&Event::Ready);

        assert_eq!(report.invoked, 3);
        assert_eq!(report.failed.len(), 2);
        assert!(matches!(
            &report.failed[1],
            ApiError::HandlerFailed { message, .. } if message.contains("handler exploded")
        ));
        assert_eq!(*log.lock(), vec!["after:ready"]);
    }

    #[test]
    fn test_dispatch_only_reaches_matching_name() {
        let hub = EventHub::new();
        let log: Log = Arc::default();
        hub.on(EventName::WindowBlur, recorder(&log, "blur"));

        let report = hub.dispatch(&Event::WindowFocus);

        assert_eq!(report.invoked, 0);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_reentrant_registration_uses_snapshot() {
        let hub = Arc::new(EventHub::new());
        let log: Log = Arc::default();

        let late = recorder(&log, "late");
        let hub_for_handler = hub.clone();
        let late_for_handler = late.clone();
        let log_for_handler = log.clone();
        let first = handler(move |_| {
            log_for_handler.lock().push("first".to_string());
            hub_for_handler.on(EventName::WindowClose, late_for_handler.clone());
            Ok(())
        });
        hub.on(EventName::WindowClose, first.clone());

        let hub_for_remover = hub.clone();
        let first_for_remover = first.clone();
        hub.on(
            EventName::WindowClose,
            handler(move |_| {
                hub_for_remover.off(EventName::WindowClose, &first_for_remover);
                Ok(())
            }),
        );

        let report = hub.dispatch(&Event::WindowClose);

        // Late handler was added mid-dispatch and must wait for the next one
        assert_eq!(report.invoked, 2);
        assert_eq!(*log.lock(), vec!["first"]);

        hub.dispatch(&Event::WindowClose);
        assert_eq!(*log.lock(), vec!["first", "late:windowClose"]);
    }
}
