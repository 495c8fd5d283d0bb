//! Topic-based event bus for session events.
//!
//! Consumers subscribe to the topics they need: state transitions of the
//! session, or progress of orchestrated operations.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{OperationEvent, SessionEvent};
