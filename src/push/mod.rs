//! Push channel types and the listener that feeds them to the engine.

mod events;
mod listener;

pub use events::{event_types, Envelope, PushEvent, ReceivedPayload, UpdatedPayload};
pub use listener::{ChannelSignal, PushListener};
