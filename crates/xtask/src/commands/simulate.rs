//! Scripted skirmish against the standard content
//!
//! Spawns one character and two creatures in an arena, starts a fight and
//! drives the clock one second at a time. The character follows a fixed
//! script (drink when hurt, fireball when ready, otherwise swing) while the
//! creatures run on the built-in planner. Everything the engine announces is
//! printed as it happens.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use tokio::sync::broadcast::{self, error::TryRecvError};

use combat_core::{
    AbilityKey, AbilityTarget, CombatEvent, Entity, EntityId, EntityKind, ItemId, ItemLocation,
    RoomId, World,
};
use runtime::{Event, Runtime, RuntimeConfig, RuntimeHandle, Topic};

use crate::dirs;

/// Hit points under which the character drinks its potion.
const DRINK_BELOW: u32 = 15;

/// Run a scripted skirmish and print the transcript
#[derive(Parser)]
pub struct Simulate {
    /// Seconds of game time to run before giving up
    #[arg(short, long, default_value_t = 120)]
    seconds: u32,

    /// World seed
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Content directory (defaults to the embedded standard content)
    #[arg(long, value_name = "DIR")]
    content_dir: Option<PathBuf>,

    /// Save a snapshot under this name when the run ends
    #[arg(long, value_name = "NAME")]
    save: Option<String>,

    /// Snapshot directory (defaults to $COMBAT_SNAPSHOT_DIR or the platform data dir)
    #[arg(long, value_name = "DIR")]
    snapshot_dir: Option<PathBuf>,

    /// Also print grid renderings
    #[arg(long)]
    grid: bool,
}

impl Simulate {
    pub async fn execute(self) -> Result<()> {
        let snapshot_dir = self
            .save
            .as_ref()
            .map(|_| self.snapshot_dir.clone().unwrap_or_else(dirs::snapshot_dir));
        let config = RuntimeConfig {
            seed: self.seed,
            snapshot_dir,
            ..RuntimeConfig::default()
        };

        let mut builder = Runtime::builder().config(config);
        if let Some(dir) = &self.content_dir {
            builder = builder.content_dir(dir);
        }
        let runtime = builder.build().await.context("Failed to start runtime")?;
        let handle = runtime.handle();
        let mut feed = Feed::new(&handle, self.grid);

        // ====================================================================
        // Arena setup
        // ====================================================================
        let room = handle.add_room("arena").await?;
        let ann = feed.spawn(&handle, "Ann", EntityKind::Character, room).await?;
        let rat = feed.spawn(&handle, "Rat", EntityKind::Npc, room).await?;
        feed.spawn(&handle, "Goblin", EntityKind::Npc, room).await?;
        for ability in ["fireball", "heal"] {
            handle
                .learn(ann, ability)
                .await
                .with_context(|| format!("Content has no '{ability}' ability"))?;
        }
        let mut potion = Some(
            handle
                .mint_item("mend_wounds", ItemLocation::Carried(ann))
                .await
                .context("Content has no 'mend_wounds' item")?,
        );

        println!("{}", style("=== Skirmish ===").bold().green());
        handle.attack(ann, rat).await?;
        feed.flush();

        // ====================================================================
        // Clock loop
        // ====================================================================
        for _ in 0..self.seconds {
            let world = handle.query_world().await?;
            let Some(record) = world.battle(room) else {
                break;
            };
            if record.current() == Some(ann) {
                take_turn(&handle, &world, ann, &mut potion).await?;
                feed.flush();
            }
            handle.advance(1).await?;
            feed.flush();
        }

        let world = handle.query_world().await?;
        print_summary(&world, room, &feed.names);

        if let Some(name) = self.save {
            let info = handle.save_snapshot(&name).await?;
            println!(
                "{} {} ({} entities, checksum {})",
                style("Saved snapshot:").bold().cyan(),
                info.name,
                info.entities,
                &info.checksum[..12.min(info.checksum.len())]
            );
        }

        drop(handle);
        runtime.shutdown().await?;
        Ok(())
    }
}

/// One action for the scripted character. Refused actions end its turn.
async fn take_turn(
    handle: &RuntimeHandle,
    world: &World,
    me: EntityId,
    potion: &mut Option<ItemId>,
) -> Result<()> {
    let Some(record) = world.entity(me) else {
        return Ok(());
    };
    let enemy = world
        .entities
        .iter()
        .filter(|(id, entity)| {
            *id != me && entity.location == record.location && !entity.knocked_out
        })
        .map(|(id, _)| id)
        .next();
    let Some(enemy) = enemy else {
        return pass(handle, me).await;
    };

    let fireball = AbilityKey::from("fireball");
    let ready = record
        .cooldowns
        .get(&fireball)
        .is_none_or(|left| *left == 0);

    let outcome = if record.hp.current < DRINK_BELOW
        && let Some(item) = potion.take()
    {
        handle.use_item(me, item, None).await
    } else if ready {
        handle
            .cast(me, fireball, AbilityTarget::Entity(enemy))
            .await
            .map(|_| ())
    } else {
        handle.attack(me, enemy).await.map(|_| ())
    };

    match outcome {
        Ok(()) => Ok(()),
        Err(error) if error.is_player_facing() => {
            tracing::debug!(%error, "scripted action refused");
            pass(handle, me).await
        }
        Err(error) => Err(error.into()),
    }
}

async fn pass(handle: &RuntimeHandle, me: EntityId) -> Result<()> {
    match handle.pass_turn(me).await {
        Ok(()) => Ok(()),
        Err(error) if error.is_player_facing() => {
            tracing::debug!(%error, "pass refused");
            Ok(())
        }
        Err(error) => Err(error.into()),
    }
}

fn print_summary(world: &World, room: RoomId, names: &BTreeMap<EntityId, String>) {
    println!();
    println!("{}", style("=== Summary ===").bold().green());
    println!("  Clock: {}", world.clock);
    println!(
        "  Battle: {}",
        match world.battle(room) {
            Some(record) => format!("still running (round {})", record.round),
            None => "over".to_string(),
        }
    );
    for (id, entity) in world.entities.iter() {
        let state = if entity.knocked_out {
            style("knocked out").red()
        } else if entity.location.is_none() {
            style("dead").red()
        } else {
            style("standing").green()
        };
        println!(
            "  {} {:<8} HP {:>3}  MP {:>3}  {}",
            id,
            names.get(&id).map_or(entity.name.as_str(), String::as_str),
            entity.hp.current,
            entity.mana.current,
            state
        );
    }
}

/// Prints bus traffic as it arrives.
struct Feed {
    receivers: Vec<(Topic, broadcast::Receiver<Event>)>,
    names: BTreeMap<EntityId, String>,
    grid: bool,
}

impl Feed {
    fn new(handle: &RuntimeHandle, grid: bool) -> Self {
        let receivers = [Topic::Battle, Topic::Room, Topic::Entity]
            .into_iter()
            .map(|topic| (topic, handle.subscribe(topic)))
            .collect();
        Self {
            receivers,
            names: BTreeMap::new(),
            grid,
        }
    }

    async fn spawn(
        &mut self,
        handle: &RuntimeHandle,
        name: &str,
        kind: EntityKind,
        room: RoomId,
    ) -> Result<EntityId> {
        let id = handle.spawn(Entity::new(name, kind), room).await?;
        self.names.insert(id, name.to_string());
        Ok(id)
    }

    fn name(&self, id: EntityId) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    fn names(&self, ids: &[EntityId]) -> String {
        ids.iter()
            .map(|id| self.name(*id))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn flush(&mut self) {
        let mut pending = Vec::new();
        for (topic, receiver) in &mut self.receivers {
            loop {
                match receiver.try_recv() {
                    Ok(event) => pending.push(event),
                    Err(TryRecvError::Lagged(skipped)) => {
                        tracing::warn!(?topic, skipped, "transcript dropped events");
                    }
                    Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                }
            }
        }
        for event in pending {
            self.print(&event);
        }
    }

    fn print(&self, event: &Event) {
        let stamp = style(format!("[{:>5}]", event.clock.to_string())).dim();
        match &event.event {
            CombatEvent::Room { text, .. } => println!("{stamp} {text}"),
            CombatEvent::Private { entity, text } => {
                println!("{stamp} {} {text}", style(format!("({})", self.name(*entity))).dim());
            }
            CombatEvent::Grid { rendering, .. } if self.grid => {
                for line in rendering.lines() {
                    println!("{stamp}   {line}");
                }
            }
            CombatEvent::BattleStarted { order, .. } => println!(
                "{stamp} {} {}",
                style("Battle started:").bold().yellow(),
                self.names(order)
            ),
            CombatEvent::TurnStarted { entity, round, .. } => println!(
                "{stamp} {}",
                style(format!("Round {round}: {}'s turn", self.name(*entity))).cyan()
            ),
            CombatEvent::BattleEnded {
                reason, survivors, ..
            } => println!(
                "{stamp} {} {reason} (survivors: {})",
                style("Battle ended:").bold().yellow(),
                self.names(survivors)
            ),
            CombatEvent::Defeated { entity, .. } => println!(
                "{stamp} {}",
                style(format!("{} is defeated", self.name(*entity))).red()
            ),
            CombatEvent::Respawned { entity, .. } => {
                println!("{stamp} {} respawns", self.name(*entity));
            }
            CombatEvent::Grid { .. } | CombatEvent::LookAround { .. } => {}
        }
    }
}
