//! Event loop of the dynamic float daemon
//!
//! Each event first updates the registry, then every affected window is run
//! through the rule engine. Actions fire only when a window goes from
//! unmatched to matched, so later updates (focus, manual resizes) leave an
//! already floated window alone.

use std::io;

use niri_helpers_ipc::{
    Action, Event, EventStream, NiriClient, NiriError, SocketTransport, Transport, Window,
};
use tokio::io::AsyncBufRead;
use tracing::{debug, info, warn};

use crate::registry::WindowRegistry;
use crate::rules::RuleEngine;

pub struct FloatDaemon<T = SocketTransport> {
    client: NiriClient<T>,
    engine: RuleEngine,
    registry: WindowRegistry,
}

impl<T: Transport> FloatDaemon<T> {
    pub fn new(client: NiriClient<T>, engine: RuleEngine) -> Self {
        Self {
            client,
            engine,
            registry: WindowRegistry::new(),
        }
    }

    #[cfg(test)]
    pub fn registry(&self) -> &WindowRegistry {
        &self.registry
    }

    #[cfg(test)]
    pub fn client(&self) -> &NiriClient<T> {
        &self.client
    }

    /// Apply an event to the registry and return the actions it triggers
    pub fn apply(&mut self, event: Event) -> Vec<Action> {
        match event {
            Event::WindowsChanged { windows } => {
                let ids: Vec<u64> = windows.iter().map(|w| w.id).collect();
                self.registry.replace_all(windows);
                ids.into_iter()
                    .flat_map(|id| self.on_window_updated(id))
                    .collect()
            }
            Event::WindowOpenedOrChanged { window } => {
                let id = window.id;
                self.registry.upsert(window);
                self.on_window_updated(id)
            }
            Event::WindowClosed { id } => {
                if self.registry.remove(id).is_none() {
                    debug!(id, "Close event for unknown window");
                }
                Vec::new()
            }
            Event::Unknown { kind } => {
                debug!(kind = %kind, "Ignoring event");
                Vec::new()
            }
        }
    }

    fn on_window_updated(&mut self, id: u64) -> Vec<Action> {
        if self.registry.is_matched(id) {
            return Vec::new();
        }

        let Some(window) = self.registry.get(id) else {
            return Vec::new();
        };
        let Some(rule) = self.engine.evaluate(window) else {
            return Vec::new();
        };

        log_floating(window);
        let actions = rule.actions(window);
        self.registry.mark_matched(id);
        actions
    }

    /// Apply an event and send the resulting actions
    pub async fn handle_event(&mut self, event: Event) {
        for action in self.apply(event) {
            self.client.send_action(&action).await;
        }
    }

    /// Consume the stream until it ends
    ///
    /// Lines that fail to decode, including ones that are not UTF-8, are
    /// logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `NiriError::ReceiveFailed` if reading from the stream fails.
    pub async fn run<R: AsyncBufRead + Unpin>(
        &mut self,
        stream: &mut EventStream<R>,
    ) -> Result<(), NiriError> {
        while let Some(next) = stream.next_event().await {
            match next {
                Ok(event) => self.handle_event(event).await,
                Err(NiriError::ReceiveFailed(e)) if e.kind() != io::ErrorKind::InvalidData => {
                    return Err(NiriError::ReceiveFailed(e));
                }
                Err(e) => warn!(error = %e, "Skipping malformed event"),
            }
        }

        info!(windows = self.registry.len(), "Niri event stream closed");
        Ok(())
    }
}

fn log_floating(window: &Window) {
    info!(
        id = window.id,
        title = %window.title,
        app_id = %window.app_id,
        "Floating window"
    );
}
