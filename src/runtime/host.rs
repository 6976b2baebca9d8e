// SPDX-License-Identifier: MIT

//! Host collaborator - the outbound side channel to the graph executor
//!
//! Nodes never reach into host internals. State changes are requested by
//! sending a named event with a JSON payload, followed by an interrupt
//! request so the executor restarts the evaluation pass. Both are
//! fire-and-forget.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HostEvent {
    Notification { event: String, payload: Value },
    InterruptProcessing,
}

/// Narrow interface to the host executor
pub trait Host: Send + Sync {
    /// Publish an event to the host's pub/sub endpoint
    fn send_sync(&self, event: &str, payload: Value);

    /// Ask the executor to abort and restart the current evaluation pass
    fn interrupt_processing(&self);
}

/// Host that forwards every event into an unbounded channel
#[derive(Clone)]
pub struct ChannelHost {
    tx: mpsc::UnboundedSender<HostEvent>,
}

impl ChannelHost {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, event: HostEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("Host channel closed, dropping event");
        }
    }
}

impl Host for ChannelHost {
    fn send_sync(&self, event: &str, payload: Value) {
        self.forward(HostEvent::Notification {
            event: event.to_string(),
            payload,
        });
    }

    fn interrupt_processing(&self) {
        self.forward(HostEvent::InterruptProcessing);
    }
}

/// Host that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHost;

impl Host for NullHost {
    fn send_sync(&self, event: &str, payload: Value) {
        log::info!("Host event '{}': {}", event, payload);
    }

    fn interrupt_processing(&self) {
        log::info!("Host interrupt requested");
    }
}
