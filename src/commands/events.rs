//! `events.*` - local subscription to native events.
//!
//! These never reach the host: they operate on the hub the dispatcher
//! forwards inbound event frames to.

use crate::api::types::{Event, EventName};
use crate::runtime::dispatcher::Dispatcher;
use crate::runtime::events::{DispatchReport, EventHandler};

/// Register `handler` for `name`. Registering the same handler twice makes
/// it fire twice.
pub fn on(dispatcher: &Dispatcher, name: EventName, handler: EventHandler) {
    dispatcher.hub().on(name, handler);
}

/// Unregister one registration of `handler`. Returns `false` if none existed.
pub fn off(dispatcher: &Dispatcher, name: EventName, handler: &EventHandler) -> bool {
    dispatcher.hub().off(name, handler)
}

/// Deliver `event` to local handlers as if the host had emitted it.
pub fn dispatch(dispatcher: &Dispatcher, event: &Event) -> DispatchReport {
    dispatcher.hub().dispatch(event)
}
