//! Simulation worker that owns the authoritative [`combat_core::World`].
//!
//! Receives commands from [`crate::RuntimeHandle`], runs them through a
//! [`CombatEngine`] and publishes the drained outbox on the [`EventBus`].
//! Commands are processed one at a time, so an engine call always runs to
//! completion before the next one starts.

use std::sync::Arc;

use combat_content::Content;
use combat_core::{
    AbilityKey, AbilityTarget, AttackOutcome, CastOutcome, CombatEngine, CombatError, Direction,
    Entity, EntityId, EquipSlot, GameError, ItemId, ItemLocation, Position, RoomId, Tick, World,
};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::api::{Result, RuntimeError};
use crate::events::{Event, EventBus};
use crate::repository::{SnapshotInfo, SnapshotRepository};

/// Commands that can be sent to the simulation worker
pub(crate) enum Command {
    AddRoom {
        name: String,
        reply: oneshot::Sender<RoomId>,
    },
    Spawn {
        entity: Box<Entity>,
        room: RoomId,
        reply: oneshot::Sender<EntityId>,
    },
    MintItem {
        template: String,
        location: ItemLocation,
        reply: oneshot::Sender<Result<ItemId>>,
    },
    Learn {
        entity: EntityId,
        ability: AbilityKey,
        reply: oneshot::Sender<Result<()>>,
    },
    Attack {
        attacker: EntityId,
        target: EntityId,
        reply: oneshot::Sender<Result<AttackOutcome>>,
    },
    Cast {
        caster: EntityId,
        ability: AbilityKey,
        target: AbilityTarget,
        reply: oneshot::Sender<Result<CastOutcome>>,
    },
    UseItem {
        user: EntityId,
        item: ItemId,
        target: Option<EntityId>,
        reply: oneshot::Sender<Result<()>>,
    },
    Step {
        entity: EntityId,
        direction: Direction,
        reply: oneshot::Sender<Result<Position>>,
    },
    Pass {
        entity: EntityId,
        reply: oneshot::Sender<Result<()>>,
    },
    Disengage {
        entity: EntityId,
        reply: oneshot::Sender<Result<()>>,
    },
    Equip {
        entity: EntityId,
        item: ItemId,
        reply: oneshot::Sender<Result<Option<ItemId>>>,
    },
    Unequip {
        entity: EntityId,
        slot: EquipSlot,
        reply: oneshot::Sender<Result<Option<ItemId>>>,
    },
    PickUp {
        entity: EntityId,
        item: ItemId,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Advance the game clock. The real-time clock sends these without a
    /// reply channel.
    Advance {
        secs: u32,
        reply: Option<oneshot::Sender<Tick>>,
    },
    QueryWorld {
        reply: oneshot::Sender<World>,
    },
    SaveSnapshot {
        name: String,
        reply: oneshot::Sender<Result<SnapshotInfo>>,
    },
    LoadSnapshot {
        name: String,
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Background task that processes combat commands.
pub(crate) struct SimulationWorker {
    world: World,
    content: Arc<Content>,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    repository: Option<Arc<dyn SnapshotRepository>>,
}

impl SimulationWorker {
    pub fn new(
        world: World,
        content: Arc<Content>,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
        repository: Option<Arc<dyn SnapshotRepository>>,
    ) -> Self {
        info!(
            entities = world.entities.len(),
            battles = world.battles.len(),
            clock = %world.clock,
            "SimulationWorker initialized"
        );
        Self {
            world,
            content,
            command_rx,
            event_bus,
            repository,
        }
    }

    /// Main worker loop. Ends when every command sender is gone.
    pub async fn run(mut self) {
        self.with_engine(|engine| engine.resume());
        while let Some(command) = self.command_rx.recv().await {
            self.handle_command(command);
        }
        info!(clock = %self.world.clock, "SimulationWorker stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::AddRoom { name, reply } => {
                let room = self.world.add_room(name);
                respond(reply, room, "AddRoom");
            }
            Command::Spawn {
                entity,
                room,
                reply,
            } => {
                let id = self.with_engine(|engine| engine.spawn(*entity, room));
                respond(reply, id, "Spawn");
            }
            Command::MintItem {
                template,
                location,
                reply,
            } => {
                let result = self.mint_item(template, location);
                respond(reply, result, "MintItem");
            }
            Command::Learn {
                entity,
                ability,
                reply,
            } => {
                let result = self.learn(entity, ability);
                respond(reply, result, "Learn");
            }
            Command::Attack {
                attacker,
                target,
                reply,
            } => {
                let result = self.with_engine(|engine| engine.attack(attacker, target));
                respond(reply, refused(result, attacker), "Attack");
            }
            Command::Cast {
                caster,
                ability,
                target,
                reply,
            } => {
                let result = self.with_engine(|engine| engine.cast(caster, &ability, target));
                respond(reply, refused(result, caster), "Cast");
            }
            Command::UseItem {
                user,
                item,
                target,
                reply,
            } => {
                let result = self.with_engine(|engine| engine.use_item(user, item, target));
                respond(reply, refused(result, user), "UseItem");
            }
            Command::Step {
                entity,
                direction,
                reply,
            } => {
                let result = self.with_engine(|engine| engine.step(entity, direction));
                respond(reply, refused(result, entity), "Step");
            }
            Command::Pass { entity, reply } => {
                let result = self.with_engine(|engine| engine.pass_turn(entity));
                respond(reply, refused(result, entity), "Pass");
            }
            Command::Disengage { entity, reply } => {
                let result = self.with_engine(|engine| engine.disengage(entity));
                respond(reply, refused(result, entity), "Disengage");
            }
            Command::Equip {
                entity,
                item,
                reply,
            } => {
                let result = self.with_engine(|engine| engine.equip(entity, item));
                respond(reply, refused(result, entity), "Equip");
            }
            Command::Unequip {
                entity,
                slot,
                reply,
            } => {
                let result = self.with_engine(|engine| engine.unequip(entity, slot));
                respond(reply, refused(result, entity), "Unequip");
            }
            Command::PickUp {
                entity,
                item,
                reply,
            } => {
                let result = self.with_engine(|engine| engine.pick_up(entity, item));
                respond(reply, refused(result, entity), "PickUp");
            }
            Command::Advance { secs, reply } => {
                // One second per engine call so every event carries the
                // clock it happened at.
                for _ in 0..secs {
                    self.with_engine(|engine| engine.advance(1));
                }
                if let Some(reply) = reply {
                    respond(reply, self.world.clock, "Advance");
                }
            }
            Command::QueryWorld { reply } => {
                respond(reply, self.world.clone(), "QueryWorld");
            }
            Command::SaveSnapshot { name, reply } => {
                let result = self.save_snapshot(&name);
                respond(reply, result, "SaveSnapshot");
            }
            Command::LoadSnapshot { name, reply } => {
                let result = self.load_snapshot(&name);
                respond(reply, result, "LoadSnapshot");
            }
        }
    }

    /// Runs `f` against an engine over the world, then publishes whatever
    /// the call put in the outbox.
    fn with_engine<R>(&mut self, f: impl FnOnce(&mut CombatEngine<'_>) -> R) -> R {
        let mut engine = CombatEngine::new(&mut self.world, self.content.env());
        let result = f(&mut engine);
        drop(engine);
        self.flush();
        result
    }

    fn flush(&mut self) {
        let clock = self.world.clock;
        for event in self.world.outbox.drain() {
            self.event_bus.publish(Event::new(clock, event));
        }
    }

    /// Mints into an inventory only while the holder stays within its
    /// carry limits.
    fn mint_item(&mut self, template: String, location: ItemLocation) -> Result<ItemId> {
        let Some(weight) = self.content.items.get(&template).map(|found| found.weight) else {
            return Err(RuntimeError::UnknownItemTemplate(template));
        };
        if let ItemLocation::Carried(holder) = location
            && !self.world.can_carry(holder, weight)
        {
            return refused(Err(CombatError::OverCarryLimit), holder);
        }
        self.content
            .items
            .mint(&mut self.world, &template, location)
            .ok_or(RuntimeError::UnknownItemTemplate(template))
    }

    fn learn(&mut self, entity: EntityId, ability: AbilityKey) -> Result<()> {
        if self.content.abilities.get(&ability).is_none() {
            return Err(CombatError::UnknownAbility(ability).into());
        }
        let record = self
            .world
            .entity_mut(entity)
            .ok_or(CombatError::UnknownEntity(entity))?;
        if !record.knows(&ability) {
            record.abilities.push(ability);
        }
        Ok(())
    }

    fn save_snapshot(&self, name: &str) -> Result<SnapshotInfo> {
        let repository = self.repository.as_ref().ok_or(RuntimeError::NoRepository)?;
        let info = repository.save(name, &self.world)?;
        info!(name, clock = %info.clock, checksum = %info.checksum, "snapshot saved");
        Ok(info)
    }

    fn load_snapshot(&mut self, name: &str) -> Result<()> {
        let repository = self.repository.as_ref().ok_or(RuntimeError::NoRepository)?;
        let world = repository
            .load(name)?
            .ok_or_else(|| RuntimeError::SnapshotNotFound(name.to_string()))?;
        self.world = world;
        self.with_engine(|engine| engine.resume());
        info!(name, clock = %self.world.clock, "snapshot restored");
        Ok(())
    }
}

/// Lifts an engine refusal into a runtime error, logging it on the way.
fn refused<T>(
    result: std::result::Result<T, CombatError>,
    actor: EntityId,
) -> Result<T> {
    result.map_err(|error| {
        if error.severity().is_internal() {
            warn!(%actor, code = error.error_code(), "{error}");
        } else {
            debug!(%actor, code = error.error_code(), "{error}");
        }
        RuntimeError::Combat(error)
    })
}

fn respond<T>(reply: oneshot::Sender<T>, value: T, command: &'static str) {
    if reply.send(value).is_err() {
        debug!("{} reply channel closed (caller dropped)", command);
    }
}
