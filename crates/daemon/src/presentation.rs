// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Presentation adapter.
//!
//! Subscribes to the engine's event bus, keeps the latest UI-facing
//! snapshots, and forwards each event as a [`UiMessage`] to any attached
//! broadcast sink (the WebSocket layer subscribes there). Progress
//! traffic is coalesced by the broadcast channel's lag semantics: a slow
//! client misses intermediate updates, never the latest.

use freight_core::{Clock, Event};
use freight_engine::{EventBus, FileRepository, StateMachine};
use freight_wire::UiMessage;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const UI_CHANNEL_CAPACITY: usize = 256;

pub struct Presentation {
    repo: Arc<FileRepository>,
    bus: EventBus,
    ui_tx: broadcast::Sender<UiMessage>,
}

impl Presentation {
    pub fn new<C: Clock>(state_machine: &StateMachine<C>, bus: EventBus) -> Self {
        let (ui_tx, _) = broadcast::channel(UI_CHANNEL_CAPACITY);
        Self { repo: state_machine.repository().clone(), bus, ui_tx }
    }

    /// Subscribe to the outgoing UI stream.
    pub fn subscribe(&self) -> broadcast::Receiver<UiMessage> {
        self.ui_tx.subscribe()
    }

    /// Event pump: project every domain event into a UI message.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut rx = self.bus.subscribe();
        loop {
            let event = tokio::select! {
                () = cancel.cancelled() => break,
                received = rx.recv() => match received {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "presentation lagged behind the event bus");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            };
            self.forward(&event);
        }
        debug!("presentation adapter stopped");
    }

    fn forward(&self, event: &Event) {
        let record = event.file_id().and_then(|id| self.repo.get(id));
        if let Some(message) = UiMessage::from_event(event, record.as_ref()) {
            // No subscribers is fine; the UI may not be attached.
            let _ = self.ui_tx.send(message);
        }
    }
}

#[cfg(test)]
#[path = "presentation_tests.rs"]
mod tests;
