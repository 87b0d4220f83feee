//! Topic-based event bus implementation.

use std::collections::HashMap;
use std::sync::Arc;

use combat_core::{CombatEvent, EntityId, RoomId, Tick};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Room broadcasts and grid renderings.
    Room,
    /// Messages addressed to a single entity.
    Entity,
    /// Battle lifecycle: start, turns, defeats, end, respawns.
    Battle,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::Room, Topic::Entity, Topic::Battle];
}

/// An engine event stamped with the game clock it was published at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub clock: Tick,
    pub event: CombatEvent,
}

impl Event {
    pub fn new(clock: Tick, event: CombatEvent) -> Self {
        Self { clock, event }
    }

    pub fn topic(&self) -> Topic {
        match &self.event {
            CombatEvent::Room { .. } | CombatEvent::Grid { .. } => Topic::Room,
            CombatEvent::Private { .. } | CombatEvent::LookAround { .. } => Topic::Entity,
            CombatEvent::BattleStarted { .. }
            | CombatEvent::TurnStarted { .. }
            | CombatEvent::BattleEnded { .. }
            | CombatEvent::Defeated { .. }
            | CombatEvent::Respawned { .. } => Topic::Battle,
        }
    }

    /// Room the event happened in, when it has one.
    pub fn room(&self) -> Option<RoomId> {
        match &self.event {
            CombatEvent::Room { room, .. }
            | CombatEvent::Grid { room, .. }
            | CombatEvent::BattleStarted { room, .. }
            | CombatEvent::TurnStarted { room, .. }
            | CombatEvent::BattleEnded { room, .. }
            | CombatEvent::Respawned { room, .. } => Some(*room),
            CombatEvent::Defeated { room, .. } => *room,
            CombatEvent::Private { .. } | CombatEvent::LookAround { .. } => None,
        }
    }

    /// Entity the event is addressed to, for entity-scoped events.
    pub fn recipient(&self) -> Option<EntityId> {
        match &self.event {
            CombatEvent::Private { entity, .. } | CombatEvent::LookAround { entity } => {
                Some(*entity)
            }
            CombatEvent::Grid { observer, .. } => Some(*observer),
            _ => None,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Publishing never blocks; events without
/// subscribers are dropped.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<HashMap<Topic, broadcast::Sender<Event>>>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let channels = Topic::ALL
            .into_iter()
            .map(|topic| (topic, broadcast::channel(capacity.max(1)).0))
            .collect();

        Self {
            channels: Arc::new(channels),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if let Some(tx) = self.channels.get(&topic)
            && tx.send(event).is_err()
        {
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        match self.channels.get(&topic) {
            Some(tx) => tx.subscribe(),
            // Every topic is created up front; this arm only keeps the
            // signature infallible.
            None => broadcast::channel(1).1,
        }
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
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
    use combat_core::EndReason;

    #[test]
    fn events_route_to_their_audience() {
        let room = RoomId(1);
        let entity = EntityId(2);

        let say = Event::new(Tick(0), CombatEvent::Room { room, text: "hi".into() });
        assert_eq!(say.topic(), Topic::Room);
        assert_eq!(say.room(), Some(room));

        let tell = Event::new(Tick(0), CombatEvent::Private { entity, text: "psst".into() });
        assert_eq!(tell.topic(), Topic::Entity);
        assert_eq!(tell.recipient(), Some(entity));

        let ended = Event::new(
            Tick(4),
            CombatEvent::BattleEnded {
                room,
                reason: EndReason::OneSideDown,
                survivors: vec![entity],
            },
        );
        assert_eq!(ended.topic(), Topic::Battle);
    }

    #[tokio::test]
    async fn subscribers_only_see_their_topic() {
        let bus = EventBus::with_capacity(8);
        let mut battle = bus.subscribe(Topic::Battle);
        let mut rooms = bus.subscribe(Topic::Room);

        bus.publish(Event::new(Tick(1), CombatEvent::LookAround { entity: EntityId(3) }));
        bus.publish(Event::new(
            Tick(2),
            CombatEvent::TurnStarted {
                room: RoomId(1),
                entity: EntityId(3),
                round: 1,
            },
        ));

        let received = battle.recv().await.unwrap();
        assert_eq!(received.clock, Tick(2));
        assert!(rooms.try_recv().is_err());
    }
}
