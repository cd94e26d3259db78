// ── Status events ──
//
// Every state transition and every meaningful transfer progress update is
// published as a `StatusEvent` on the session's broadcast channel, in the
// order the transitions occur. Events are transient: nothing is stored
// beyond what the watch channel keeps for late subscribers.

use bytes::Bytes;
use tokio::sync::{broadcast, watch};

use crate::state::ConnectionState;

/// A preview image pushed alongside transfer progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewFrame(pub Bytes);

/// One observable progress update.
#[derive(Debug, Clone)]
pub struct StatusEvent {
    pub state: ConnectionState,
    /// Human-readable, suitable for direct display.
    pub message: String,
    pub preview: Option<PreviewFrame>,
}

/// Fan-out handle pairing the state watch with the event broadcast.
///
/// Cloned into the session's phase helpers so they can publish without
/// reaching back into session internals. The watch and broadcast are
/// always updated together, from a single publisher, which is what keeps
/// event order aligned with transition order.
#[derive(Debug, Clone)]
pub(crate) struct StatusPublisher {
    state_tx: watch::Sender<ConnectionState>,
    event_tx: broadcast::Sender<StatusEvent>,
}

impl StatusPublisher {
    pub(crate) fn new(
        state_tx: watch::Sender<ConnectionState>,
        event_tx: broadcast::Sender<StatusEvent>,
    ) -> Self {
        Self { state_tx, event_tx }
    }

    pub(crate) fn publish(&self, state: ConnectionState, message: impl Into<String>) {
        self.publish_with_preview(state, message, None);
    }

    pub(crate) fn publish_with_preview(
        &self,
        state: ConnectionState,
        message: impl Into<String>,
        preview: Option<PreviewFrame>,
    ) {
        let message = message.into();
        tracing::debug!(%state, %message, "status");
        let _ = self.state_tx.send(state);
        let _ = self.event_tx.send(StatusEvent {
            state,
            message,
            preview,
        });
    }
}
