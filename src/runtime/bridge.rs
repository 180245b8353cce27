//! Bridge - the handle application code holds for one host connection.
//!
//! Owns the configuration, the event hub and the dispatcher, plus the
//! keep-alive ticker in browser mode. Facades in `commands` take the
//! dispatcher from here.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::api::types::ApiError;
use crate::commands;
use crate::config::BridgeConfig;
use crate::protocols::transport::{Transport, WebSocketTransport};
use crate::runtime::dispatcher::Dispatcher;
use crate::runtime::events::EventHub;

pub struct Bridge {
    config: BridgeConfig,
    hub: Arc<EventHub>,
    dispatcher: Arc<Dispatcher>,
    keep_alive: Option<JoinHandle<()>>,
}

impl Bridge {
    /// Connect to the host's WebSocket endpoint on `config.port`.
    pub async fn connect(config: BridgeConfig) -> Result<Self, ApiError> {
        let transport = WebSocketTransport::connect(&config).await?;
        Ok(Self::with_transport(config, transport))
    }

    /// Run the bridge over an already open transport.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_transport<T: Transport>(config: BridgeConfig, transport: T) -> Self {
        let hub = Arc::new(EventHub::new());
        let dispatcher = Dispatcher::start(transport, hub.clone(), &config);

        let keep_alive = config.keep_alive_interval().map(|interval| {
            log::debug!("Keep-alive enabled: interval={interval:?}");
            tokio::spawn(keep_alive_loop(Arc::downgrade(&dispatcher), interval))
        });

        Self {
            config,
            hub,
            dispatcher,
            keep_alive,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn hub(&self) -> &Arc<EventHub> {
        &self.hub
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Shared handle to the dispatcher, for tasks that outlive a borrow.
    pub fn dispatcher_arc(&self) -> Arc<Dispatcher> {
        self.dispatcher.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.dispatcher.is_connected()
    }

    /// Stop the keep-alive ticker, close the transport and reject every
    /// pending call.
    pub async fn shutdown(&mut self) {
        if let Some(task) = self.keep_alive.take() {
            task.abort();
        }
        self.dispatcher.shutdown().await;
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        if let Some(task) = self.keep_alive.take() {
            task.abort();
        }
    }
}

async fn keep_alive_loop(dispatcher: Weak<Dispatcher>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let Some(dispatcher) = dispatcher.upgrade() else {
            return;
        };
        if !dispatcher.is_connected() {
            log::debug!("Keep-alive stopped: not connected");
            return;
        }

        match commands::app::keep_alive(&dispatcher).await {
            Ok(()) => log::trace!("Keep-alive acknowledged"),
            Err(ApiError::ConnectionLost { reason }) => {
                log::debug!("Keep-alive stopped: {reason}");
                return;
            }
            Err(e) => log::warn!("Keep-alive failed: {e}"),
        }
    }
}
