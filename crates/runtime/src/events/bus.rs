//! Topic-based event bus implementation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use turn_core::{Diagnostic, TurnEvent};

use super::types::WatchdogReport;

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Turn progress (phases, actions, turn start/end)
    Turn,
    /// Diagnostics absorbed by the scheduler
    Diagnostics,
    /// Stuck-suspension reports
    Watchdog,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Turn(TurnEvent),
    Diagnostic(Diagnostic),
    Watchdog(WatchdogReport),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Turn(_) => Topic::Turn,
            Event::Diagnostic(_) => Topic::Diagnostics,
            Event::Watchdog(_) => Topic::Watchdog,
        }
    }
}

struct Channels {
    turn: broadcast::Sender<Event>,
    diagnostics: broadcast::Sender<Event>,
    watchdog: broadcast::Sender<Event>,
}

impl Channels {
    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Turn => &self.turn,
            Topic::Diagnostics => &self.diagnostics,
            Topic::Watchdog => &self.watchdog,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Publishing never blocks; slow subscribers lag.
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
        let capacity = capacity.max(1);
        Self {
            channels: Arc::new(Channels {
                turn: broadcast::channel(capacity).0,
                diagnostics: broadcast::channel(capacity).0,
                watchdog: broadcast::channel(capacity).0,
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
    ///
    /// Returns a receiver that will only receive events for that topic.
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

    #[tokio::test]
    async fn routes_events_by_topic() {
        let bus = EventBus::with_capacity(8);
        let mut turn_rx = bus.subscribe(Topic::Turn);
        let mut watchdog_rx = bus.subscribe(Topic::Watchdog);

        bus.publish(Event::Turn(TurnEvent::TurnEnded { turn: 3, ticks: 9 }));

        match turn_rx.recv().await {
            Ok(Event::Turn(TurnEvent::TurnEnded { turn, ticks })) => {
                assert_eq!((turn, ticks), (3, 9));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(watchdog_rx.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::new();
        bus.publish(Event::Turn(TurnEvent::TurnCancelled {
            turn: 1,
            abandoned: 0,
        }));
    }
}
