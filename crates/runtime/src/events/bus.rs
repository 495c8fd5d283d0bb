//! Topic-based event bus implementation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{OperationEvent, SessionEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Session state transitions
    Session,
    /// Operation status and outcomes
    Operation,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Session(SessionEvent),
    Operation(OperationEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Session(_) => Topic::Session,
            Event::Operation(_) => Topic::Operation,
        }
    }
}

struct Channels {
    session: broadcast::Sender<Event>,
    operation: broadcast::Sender<Event>,
}

impl Channels {
    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Session => &self.session,
            Topic::Operation => &self.operation,
        }
    }
}

/// Topic-based event bus
///
/// Publishing never blocks; events sent while nobody is subscribed are dropped.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<Channels>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Channels {
                session: broadcast::channel(capacity).0,
                operation: broadcast::channel(capacity).0,
            }),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.channels.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channels.sender(topic).subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SessionState;
    use client_blockchain_core::Address;

    #[tokio::test]
    async fn subscribers_only_see_their_topic() {
        let bus = EventBus::new();
        let mut session = bus.subscribe(Topic::Session);
        let mut operation = bus.subscribe(Topic::Operation);

        bus.publish(Event::Session(SessionEvent::StateChanged {
            player: Address::ZERO,
            from: SessionState::Unknown,
            to: SessionState::Idle,
        }));

        assert!(matches!(session.recv().await.unwrap(), Event::Session(_)));
        assert!(operation.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let bus = EventBus::with_capacity(1);
        bus.publish(Event::Session(SessionEvent::StateChanged {
            player: Address::ZERO,
            from: SessionState::Unknown,
            to: SessionState::Idle,
        }));
    }
}
