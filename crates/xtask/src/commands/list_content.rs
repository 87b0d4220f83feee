//! List the rule set a content directory resolves to
//!
//! Loads the directory the same way the runtime does, so missing files fall
//! back to the embedded standard content and malformed ones fail loudly.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use combat_content::{Content, ContentFactory};
use combat_core::ItemUse;

/// List abilities and item templates
#[derive(Parser)]
pub struct ListContent {
    /// Content directory (defaults to the embedded standard content)
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Only list abilities
    #[arg(long, conflicts_with = "items")]
    abilities: bool,

    /// Only list item templates
    #[arg(long)]
    items: bool,
}

impl ListContent {
    pub fn execute(self) -> Result<()> {
        let content = match &self.dir {
            Some(dir) => ContentFactory::new(dir)
                .load()
                .with_context(|| format!("Failed to load content from {}", dir.display()))?,
            None => ContentFactory::standard().context("Embedded content is malformed")?,
        };

        if !self.items {
            print_abilities(&content);
        }
        if !self.abilities {
            print_items(&content);
        }
        Ok(())
    }
}

fn print_abilities(content: &Content) {
    println!(
        "{} ({})",
        style("Abilities").bold().yellow(),
        content.abilities.len()
    );
    let mut abilities: Vec<_> = content.abilities.iter().collect();
    abilities.sort_by(|a, b| a.key.cmp(&b.key));
    for ability in abilities {
        let cost = ability
            .cost
            .as_ref()
            .map_or_else(|| "free".to_string(), |cost| format!("{} {}", cost.amount, cost.resource));
        println!(
            "  {} {:<18} {:<22} {} AP, {cost}, cooldown {}s, range {}{}",
            style("→").cyan(),
            ability.key.to_string(),
            ability.name,
            ability.ap_cost,
            ability.cooldown,
            ability.range,
            if ability.offensive { "" } else { ", friendly" }
        );
    }
    println!();
}

fn print_items(content: &Content) {
    println!(
        "{} ({})",
        style("Item templates").bold().yellow(),
        content.items.len()
    );
    let mut items: Vec<_> = content.items.iter().collect();
    items.sort_by(|a, b| a.key.cmp(&b.key));
    for item in items {
        let role = match (&item.gear, &item.use_fn) {
            (Some(gear), _) => format!("worn on {}", gear.slot),
            (None, Some(ItemUse::Heal { min, max })) => format!("heals {min}-{max}"),
            (None, Some(ItemUse::RestoreMana { min, max })) => format!("restores {min}-{max} mana"),
            (None, Some(ItemUse::RestoreStamina { min, max })) => {
                format!("restores {min}-{max} stamina")
            }
            (None, Some(ItemUse::Cure(effect))) => format!("cures {effect}"),
            (None, Some(ItemUse::ApplyEffect(template))) => format!("applies {}", template.key),
            (None, None) if !item.components.is_empty() => "spell component".to_string(),
            (None, None) => "-".to_string(),
        };
        println!(
            "  {} {:<18} {:<22} {role}",
            style("→").cyan(),
            item.key,
            item.name
        );
    }
}
