//! Messages produced by the engine for the host to deliver.
//!
//! The core never performs I/O. Every announcement lands in the world's
//! [`Outbox`], which the host drains after each call and fans out to rooms
//! and players.

use crate::state::{EntityId, RoomId};

/// Why a battle stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EndReason {
    OneSideDown,
    AllDisengaged,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombatEvent {
    /// Text for everyone in a room.
    Room { room: RoomId, text: String },
    /// Text for one entity only.
    Private { entity: EntityId, text: String },
    /// Grid rendering for one observer.
    Grid {
        room: RoomId,
        observer: EntityId,
        rendering: String,
    },
    BattleStarted {
        room: RoomId,
        order: Vec<EntityId>,
    },
    TurnStarted {
        room: RoomId,
        entity: EntityId,
        round: u32,
    },
    BattleEnded {
        room: RoomId,
        reason: EndReason,
        survivors: Vec<EntityId>,
    },
    Defeated {
        room: Option<RoomId>,
        entity: EntityId,
    },
    Respawned {
        room: RoomId,
        entity: EntityId,
    },
    /// Host should show the room description to `entity`.
    LookAround { entity: EntityId },
}

impl CombatEvent {
    /// Text payload, if the event carries one.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Room { text, .. } | Self::Private { text, .. } => Some(text),
            Self::Grid { rendering, .. } => Some(rendering),
            _ => None,
        }
    }
}

/// Pending events, in emission order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outbox {
    events: Vec<CombatEvent>,
}

impl Outbox {
    pub fn push(&mut self, event: CombatEvent) {
        self.events.push(event);
    }

    pub fn say(&mut self, room: RoomId, text: impl Into<String>) {
        self.push(CombatEvent::Room {
            room,
            text: text.into(),
        });
    }

    pub fn tell(&mut self, entity: EntityId, text: impl Into<String>) {
        self.push(CombatEvent::Private {
            entity,
            text: text.into(),
        });
    }

    pub fn drain(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    /// All text payloads joined by newlines. Handy for assertions and logs.
    pub fn transcript(&self) -> String {
        self.events
            .iter()
            .filter_map(CombatEvent::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
