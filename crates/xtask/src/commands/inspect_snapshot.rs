//! Read and inspect snapshot files
//!
//! Opens `<name>.snapshot` files written by the runtime's file repository,
//! verifies their checksum and displays the restored world.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use combat_core::World;
use runtime::repository::world_to_json;
use runtime::{FileSnapshotRepository, SnapshotInfo, SnapshotRepository};

use crate::dirs;

/// Read and inspect snapshot files
#[derive(Parser)]
pub struct InspectSnapshot {
    /// Snapshot name; omit to list the available snapshots
    #[arg(value_name = "NAME")]
    name: Option<String>,

    /// Read this file directly instead of looking the name up
    #[arg(short, long, value_name = "FILE", conflicts_with = "name")]
    path: Option<PathBuf>,

    /// Snapshot directory (defaults to $COMBAT_SNAPSHOT_DIR or the platform data dir)
    #[arg(short, long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Summary view (header, entities, battles)
    Summary,
    /// Full JSON output of the world
    Json,
    /// Pretty-printed debug format
    Debug,
}

impl InspectSnapshot {
    pub fn execute(self) -> Result<()> {
        let dir = self.dir.unwrap_or_else(dirs::snapshot_dir);

        let path = match (self.path, self.name) {
            (Some(path), _) => path,
            (None, Some(name)) => {
                let repo = FileSnapshotRepository::new(&dir).with_context(|| {
                    format!("Failed to open snapshot directory: {}", dir.display())
                })?;
                repo.snapshot_path(&name)
            }
            (None, None) => return list(&dir),
        };

        if !path.exists() {
            anyhow::bail!(
                "Snapshot file not found: {}\n\nHint: run `cargo xtask inspect-snapshot` to list {}",
                path.display(),
                dir.display()
            );
        }

        let (info, world) = FileSnapshotRepository::read_path(&path)
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;

        println!("{} {}", style("Snapshot File:").bold().cyan(), path.display());
        print_header(&info);
        println!();

        match self.format {
            OutputFormat::Summary => print_summary(&world),
            OutputFormat::Json => {
                let json = world_to_json(&world).context("Failed to serialize world to JSON")?;
                println!("{json}");
            }
            OutputFormat::Debug => println!("{world:#?}"),
        }

        Ok(())
    }
}

fn list(dir: &std::path::Path) -> Result<()> {
    if !dir.exists() {
        println!(
            "{}",
            style(format!("No snapshots yet ({} does not exist)", dir.display())).dim()
        );
        return Ok(());
    }
    let repo = FileSnapshotRepository::new(dir)
        .with_context(|| format!("Failed to open snapshot directory: {}", dir.display()))?;
    let names = repo.list().context("Failed to list snapshots")?;

    println!("{} {}", style("Snapshots in").bold().cyan(), dir.display());
    if names.is_empty() {
        println!("  {}", style("(none)").dim());
    }
    for name in names {
        match repo.info(&name) {
            Ok(Some(info)) => println!(
                "  {} {:<20} clock {:>6}  saved {}",
                style("→").cyan(),
                info.name,
                info.clock.to_string(),
                info.saved_at.format("%Y-%m-%d %H:%M:%S")
            ),
            Ok(None) => {}
            Err(error) => println!("  {} {name}: {error}", style("✗").red()),
        }
    }
    Ok(())
}

fn print_header(info: &SnapshotInfo) {
    println!("{} {}", style("Name:").bold().cyan(), info.name);
    println!("{} {}", style("Format Version:").bold().cyan(), info.version);
    println!("{} {}", style("Saved At:").bold().cyan(), info.saved_at);
    println!("{} {}", style("Checksum:").bold().cyan(), info.checksum);
}

fn print_summary(world: &World) {
    println!("{}", style("=== World Summary ===").bold().green());
    println!();

    println!("{}", style("Clock:").bold().yellow());
    println!("  Time: {}", world.clock);
    println!("  Seed: {}", world.seed);
    println!("  Pending Timers: {}", world.timers.len());
    println!();

    println!("{}", style("Registries:").bold().yellow());
    println!("  Rooms: {}", world.rooms.len());
    println!("  Entities: {}", world.entities.len());
    println!("  Items: {}", world.items.len());
    println!();

    if !world.entities.is_empty() {
        println!("{}", style("Entities:").bold().yellow());
        for (id, entity) in world.entities.iter() {
            let location = entity
                .location
                .map_or_else(|| "nowhere".to_string(), |room| room.to_string());
            println!(
                "  {id} {} ({}) - HP: {}, MP: {}, SP: {}, Room: {location}{}",
                entity.name,
                entity.kind,
                entity.hp.current,
                entity.mana.current,
                entity.stamina.current,
                if entity.knocked_out { ", knocked out" } else { "" }
            );
            for effect in entity.effects.iter() {
                println!("      effect {}", effect.key);
            }
        }
        println!();
    }

    if !world.battles.is_empty() {
        println!("{}", style("Battles:").bold().yellow());
        for (room, record) in &world.battles {
            let order = record
                .order
                .iter()
                .map(|id| world.name_of(*id))
                .collect::<Vec<_>>()
                .join(" → ");
            println!(
                "  Room {room}: round {}, timer {}s, current {}",
                record.round,
                record.timer,
                record
                    .current()
                    .map_or_else(|| "-".to_string(), |id| world.name_of(id))
            );
            println!("    Order: {order}");
            println!("    Tile effects: {}", record.grid.tiles().count());
        }
        println!();
    }
}
