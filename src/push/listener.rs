//! Push channel consumption.
//!
//! The listener owns the receiving half of the transport channel and drives
//! the engine from it. Each session constructs its own listener around its
//! own engine handle, so listener lifecycle follows session lifecycle.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use super::events::{event_types, Envelope, PushEvent};
use crate::engine::Reconciler;

/// Transport-level signal delivered to the listener.
///
/// The transport implementation translates its own connection lifecycle
/// into these variants; the engine never sees the transport directly.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelSignal {
    /// The channel is established. `resumed` is false on the first connect
    /// of a session, true on every reconnect after a drop.
    Open { resumed: bool },
    /// One frame arrived.
    Frame(Envelope),
    /// The channel dropped; events are lost until the next `Open`.
    Closed,
}

/// Consumes transport signals and dispatches them to the engine.
pub struct PushListener {
    engine: Arc<Reconciler>,
}

impl PushListener {
    pub fn new(engine: Arc<Reconciler>) -> Self {
        Self { engine }
    }

    /// Drive the engine from `signals` until the sender side is dropped.
    pub async fn run(self, mut signals: mpsc::Receiver<ChannelSignal>) {
        while let Some(signal) = signals.recv().await {
            self.dispatch(signal).await;
        }
        debug!("Push channel closed, listener stopping");
    }

    async fn dispatch(&self, signal: ChannelSignal) {
        match signal {
            ChannelSignal::Open { resumed } => {
                self.engine.handle_connected(resumed).await;
            }
            ChannelSignal::Closed => {
                self.engine.handle_disconnected().await;
            }
            ChannelSignal::Frame(envelope) => {
                if !event_types::is_notification_event(&envelope.event_type) {
                    // Other features multiplex on the same channel
                    trace!("Ignoring frame type: {}", envelope.event_type);
                    return;
                }
                match PushEvent::decode(&envelope) {
                    Ok(event) => self.engine.handle_event(event).await,
                    Err(e) => {
                        // A half-applied frame could desync the local view,
                        // so refetch everything instead of guessing.
                        warn!(
                            "Dropping malformed {} frame: {}",
                            envelope.event_type, e
                        );
                        if let Err(e) = self.engine.refresh().await {
                            warn!("Reconcile after malformed frame failed: {}", e);
                        }
                    }
                }
            }
        }
    }
}
