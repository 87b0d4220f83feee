//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! every combat verb, for driving the clock and for streaming events from
//! specific topics.
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};

use combat_content::Content;
use combat_core::{
    AbilityKey, AbilityTarget, AttackOutcome, CastOutcome, Direction, Entity, EntityId, EquipSlot,
    ItemId, ItemLocation, Position, RoomId, Tick, World,
};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::repository::SnapshotInfo;
use crate::workers::Command;

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
    content: Arc<Content>,
}

impl RuntimeHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        event_bus: EventBus,
        content: Arc<Content>,
    ) -> Self {
        Self {
            command_tx,
            event_bus,
            content,
        }
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    // ========================================================================
    // World setup
    // ========================================================================

    pub async fn add_room(&self, name: impl Into<String>) -> Result<RoomId> {
        let name = name.into();
        self.request(|reply| Command::AddRoom { name, reply }).await
    }

    /// Registers `entity` in `room` with full pools.
    pub async fn spawn(&self, entity: Entity, room: RoomId) -> Result<EntityId> {
        self.request(|reply| Command::Spawn {
            entity: Box::new(entity),
            room,
            reply,
        })
        .await
    }

    /// Mints an item from the content's template named `template`.
    pub async fn mint_item(
        &self,
        template: impl Into<String>,
        location: ItemLocation,
    ) -> Result<ItemId> {
        let template = template.into();
        self.request(|reply| Command::MintItem {
            template,
            location,
            reply,
        })
        .await?
    }

    /// Teaches a catalog ability to `entity`.
    pub async fn learn(&self, entity: EntityId, ability: impl Into<AbilityKey>) -> Result<()> {
        let ability = ability.into();
        self.request(|reply| Command::Learn {
            entity,
            ability,
            reply,
        })
        .await?
    }

    // ========================================================================
    // Combat verbs
    // ========================================================================

    /// Weapon attack. Starts or joins a fight when needed.
    pub async fn attack(&self, attacker: EntityId, target: EntityId) -> Result<AttackOutcome> {
        self.request(|reply| Command::Attack {
            attacker,
            target,
            reply,
        })
        .await?
    }

    pub async fn cast(
        &self,
        caster: EntityId,
        ability: impl Into<AbilityKey>,
        target: AbilityTarget,
    ) -> Result<CastOutcome> {
        let ability = ability.into();
        self.request(|reply| Command::Cast {
            caster,
            ability,
            target,
            reply,
        })
        .await?
    }

    pub async fn use_item(
        &self,
        user: EntityId,
        item: ItemId,
        target: Option<EntityId>,
    ) -> Result<()> {
        self.request(|reply| Command::UseItem {
            user,
            item,
            target,
            reply,
        })
        .await?
    }

    /// Moves one cell on the battle grid.
    pub async fn step(&self, entity: EntityId, direction: Direction) -> Result<Position> {
        self.request(|reply| Command::Step {
            entity,
            direction,
            reply,
        })
        .await?
    }

    pub async fn pass_turn(&self, entity: EntityId) -> Result<()> {
        self.request(|reply| Command::Pass { entity, reply }).await?
    }

    pub async fn disengage(&self, entity: EntityId) -> Result<()> {
        self.request(|reply| Command::Disengage { entity, reply })
            .await?
    }

    /// Wears `item`, returning whatever it displaced.
    pub async fn equip(&self, entity: EntityId, item: ItemId) -> Result<Option<ItemId>> {
        self.request(|reply| Command::Equip {
            entity,
            item,
            reply,
        })
        .await?
    }

    pub async fn unequip(&self, entity: EntityId, slot: EquipSlot) -> Result<Option<ItemId>> {
        self.request(|reply| Command::Unequip {
            entity,
            slot,
            reply,
        })
        .await?
    }

    /// Picks up an item lying in the entity's room.
    pub async fn pick_up(&self, entity: EntityId, item: ItemId) -> Result<()> {
        self.request(|reply| Command::PickUp {
            entity,
            item,
            reply,
        })
        .await?
    }

    // ========================================================================
    // Clock, queries and persistence
    // ========================================================================

    /// Advances the game clock by `secs` and returns the new time.
    pub async fn advance(&self, secs: u32) -> Result<Tick> {
        self.request(|reply| Command::Advance {
            secs,
            reply: Some(reply),
        })
        .await
    }

    /// Query the current world (read-only copy).
    pub async fn query_world(&self) -> Result<World> {
        self.request(|reply| Command::QueryWorld { reply }).await
    }

    pub async fn save_snapshot(&self, name: impl Into<String>) -> Result<SnapshotInfo> {
        let name = name.into();
        self.request(|reply| Command::SaveSnapshot { name, reply })
            .await?
    }

    /// Replaces the running world with a saved one and resumes its battles.
    pub async fn load_snapshot(&self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.request(|reply| Command::LoadSnapshot { name, reply })
            .await?
    }

    // ========================================================================
    // Events and content
    // ========================================================================

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Room` - room broadcasts and grid renderings
    /// - `Topic::Entity` - messages for a single entity
    /// - `Topic::Battle` - battle start, turns, defeats, end and respawns
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> std::collections::HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// The rule set the simulation runs with.
    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
