//! Item use and equipment.

use tracing::debug;

use super::CombatEngine;
use crate::effect::{EffectKey, EffectOrigin, EffectTemplate};
use crate::error::{BlockReason, CombatError, TargetIssue};
use crate::state::{EntityId, EquipSlot, ItemId, ItemLocation, ItemUse, ResourceKind};

impl<'a> CombatEngine<'a> {
    /// Uses a carried item on `target` (the user when `None`).
    ///
    /// In a battle this is gated on the user's turn and costs
    /// `item_ap` action points. Consumables are destroyed afterwards.
    pub fn use_item(
        &mut self,
        user: EntityId,
        item: ItemId,
        target: Option<EntityId>,
    ) -> Result<(), CombatError> {
        let record = self
            .world()
            .item(item)
            .filter(|record| record.location == ItemLocation::Carried(user))
            .ok_or(CombatError::UnknownItem(item))?;
        let effect = record.use_fn.clone().ok_or(CombatError::NotUsable)?;
        let item_name = record.name.clone();
        if !self.is_standing(user) {
            return Err(CombatError::ActionBlocked(BlockReason::Incapacitated));
        }

        let target = target.unwrap_or(user);
        if target != user {
            let here = self
                .world()
                .entity(target)
                .ok_or(CombatError::InvalidTarget(TargetIssue::NotFound))?
                .location;
            if here.is_none() || here != self.room_of(user) {
                return Err(CombatError::InvalidTarget(TargetIssue::NotHere));
            }
        }

        let cost = self.config().item_ap;
        let battle = self.world().battle_room_of(user);
        if let Some(room) = battle {
            if !self.is_turn(user) {
                return Err(CombatError::TurnGated);
            }
            if self.has_effect(user, &EffectKey::FROZEN) {
                return Err(CombatError::ActionBlocked(BlockReason::Frozen));
            }
            let available = self.world().battle(room).map(|r| r.ap(user)).unwrap_or(0);
            if available < cost {
                return Err(CombatError::NotEnoughActionPoints {
                    needed: cost,
                    available,
                });
            }
        }

        let name = self.name(user);
        self.say_near(user, format!("{name} uses {item_name}."));
        self.resolve_item_use(user, target, &effect);
        debug!(%user, %item, %target, "item used");
        self.remove_item_effects(user, item);
        self.world_mut().delete_item(item);

        if let Some(room) = battle {
            self.finish_action(room, user, cost);
        }
        Ok(())
    }

    fn resolve_item_use(&mut self, user: EntityId, target: EntityId, effect: &ItemUse) {
        let (resource, min, max) = match effect {
            ItemUse::Heal { min, max } => (ResourceKind::Hp, *min, *max),
            ItemUse::RestoreMana { min, max } => (ResourceKind::Mana, *min, *max),
            ItemUse::RestoreStamina { min, max } => (ResourceKind::Stamina, *min, *max),
            ItemUse::Cure(key) => {
                if self.remove_effect(target, key).is_some() {
                    let name = self.name(target);
                    self.say_near(target, format!("{name} is no longer affected by {key}."));
                }
                return;
            }
            ItemUse::ApplyEffect(template) => {
                self.apply_effect(target, template, Some(user), EffectOrigin::Item);
                return;
            }
        };
        let amount = self.roll(min, max);
        let gained = self.restore(target, resource, amount);
        self.tell(target, format!("You recover {gained} {resource}."));
    }

    /// Wears a carried item in its gear slot, swapping out whatever was
    /// there. Refused during a battle.
    pub fn equip(&mut self, entity: EntityId, item: ItemId) -> Result<Option<ItemId>, CombatError> {
        if self.is_in_combat(entity) {
            return Err(CombatError::ActionBlocked(BlockReason::InCombat));
        }
        let wearer = self
            .world()
            .entity(entity)
            .ok_or(CombatError::UnknownEntity(entity))?;
        let record = self
            .world()
            .item(item)
            .filter(|record| record.location == ItemLocation::Carried(entity))
            .ok_or(CombatError::UnknownItem(item))?;
        let gear = record.gear.as_ref().ok_or(CombatError::NotEquippable)?;
        if wearer.level < gear.required_level {
            return Err(CombatError::LevelTooLow(gear.required_level));
        }
        if let Some((attribute, minimum)) = gear.required_attribute {
            let effective = self
                .stats(entity)
                .map(|stats| stats.attributes.get(attribute))
                .unwrap_or(0);
            if effective < minimum {
                return Err(CombatError::AttributeTooLow(attribute, minimum));
            }
        }
        let slot = gear.slot;
        let passives: Vec<EffectTemplate> = gear.passives.clone();
        let item_name = record.name.clone();

        let previous = self.unequip(entity, slot)?;
        if let Some(wearer) = self.world_mut().entity_mut(entity) {
            wearer.equipment.equip(slot, item);
        }
        for passive in &passives {
            let permanent = EffectTemplate {
                duration: None,
                ..passive.clone()
            };
            self.apply_effect(entity, &permanent, None, EffectOrigin::Equipment(item));
        }
        self.clamp_pools(entity);
        self.tell(entity, format!("You are now wearing {item_name}."));
        Ok(previous)
    }

    /// Takes an item lying in the entity's room into its inventory, within
    /// its carry limits. Refused during a battle.
    pub fn pick_up(&mut self, entity: EntityId, item: ItemId) -> Result<(), CombatError> {
        if self.is_in_combat(entity) {
            return Err(CombatError::ActionBlocked(BlockReason::InCombat));
        }
        let room = self.room_of(entity).ok_or(CombatError::UnknownEntity(entity))?;
        let record = self
            .world()
            .item(item)
            .filter(|record| record.location == ItemLocation::Room(room))
            .ok_or(CombatError::UnknownItem(item))?;
        if !self.world().can_carry(entity, record.weight) {
            return Err(CombatError::OverCarryLimit);
        }
        let item_name = record.name.clone();

        self.world_mut().place_item(item, ItemLocation::Carried(entity));
        let name = self.name(entity);
        self.say(room, format!("{name} picks up {item_name}."));
        debug!(%entity, %item, "item picked up");
        Ok(())
    }

    /// Empties `slot`, dropping the passives of the item that was in it.
    pub fn unequip(&mut self, entity: EntityId, slot: EquipSlot) -> Result<Option<ItemId>, CombatError> {
        if self.is_in_combat(entity) {
            return Err(CombatError::ActionBlocked(BlockReason::InCombat));
        }
        let Some(record) = self.world_mut().entity_mut(entity) else {
            return Err(CombatError::UnknownEntity(entity));
        };
        let Some(item) = record.equipment.unequip(slot) else {
            return Ok(None);
        };
        self.remove_item_effects(entity, item);
        self.clamp_pools(entity);
        let name = self
            .world()
            .item(item)
            .map(|record| record.name.clone())
            .unwrap_or_default();
        self.tell(entity, format!("You stop wearing {name}."));
        Ok(Some(item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{EffectKind, StatTarget};
    use crate::state::Gear;
    use crate::testing::Fixture;

    fn potion(fixture: &mut Fixture, owner: EntityId) -> ItemId {
        let mut template = Fixture::template("Potion");
        template.use_fn = Some(ItemUse::Heal { min: 5, max: 5 });
        fixture.give(owner, &template)
    }

    fn amulet(fixture: &mut Fixture, owner: EntityId, required_level: u32) -> ItemId {
        let mut template = Fixture::template("Amulet");
        template.gear = Some(Gear {
            required_level,
            passives: vec![EffectTemplate::new(
                "Sturdy",
                EffectKind::stat(StatTarget::MaxResource(ResourceKind::Hp), 10),
                Some(5),
            )],
            ..Gear::new(EquipSlot::Neck)
        });
        fixture.give(owner, &template)
    }

    #[test]
    fn healing_item_is_consumed() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        let flask = potion(&mut fixture, ann);
        fixture.world.entity_mut(ann).unwrap().hp.current = 30;
        let mut engine = fixture.engine();

        engine.use_item(ann, flask, None).unwrap();

        assert_eq!(engine.world().entity(ann).unwrap().hp.current, 35);
        assert!(engine.world().item(flask).is_none());
        assert!(!engine.world().entity(ann).unwrap().inventory.contains(&flask));
        assert!(engine.world().outbox.transcript().contains("You recover 5 health."));
    }

    #[test]
    fn items_must_be_carried_and_usable() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        let bob = fixture.character("Bob");
        let flask = potion(&mut fixture, bob);
        let rock = fixture.give(ann, &Fixture::template("Rock"));
        let mut engine = fixture.engine();

        assert_eq!(engine.use_item(ann, flask, None), Err(CombatError::UnknownItem(flask)));
        assert_eq!(engine.use_item(ann, rock, None), Err(CombatError::NotUsable));
    }

    #[test]
    fn using_an_item_in_battle_costs_action_points() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        let rat = fixture.creature("Rat");
        let flask = potion(&mut fixture, ann);
        let room = fixture.room;
        let mut engine = fixture.engine();
        engine.start_or_join_fight(ann, rat, 2).unwrap();

        engine.use_item(ann, flask, None).unwrap();

        assert_eq!(engine.world().battle(room).unwrap().ap(ann), 1);
    }

    #[test]
    fn gear_passives_last_while_worn() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        let charm = amulet(&mut fixture, ann, 1);
        let mut engine = fixture.engine();

        assert_eq!(engine.equip(ann, charm), Ok(None));
        assert_eq!(engine.stats(ann).unwrap().max_hp, 50);
        let passive = engine.world().entity(ann).unwrap().effects.get(&"Sturdy".into()).cloned();
        assert_eq!(passive.and_then(|effect| effect.remaining()), None);

        assert_eq!(engine.unequip(ann, EquipSlot::Neck), Ok(Some(charm)));
        assert_eq!(engine.stats(ann).unwrap().max_hp, 40);
        assert!(engine.world().entity(ann).unwrap().equipment.get(EquipSlot::Neck).is_none());
    }

    #[test]
    fn picking_up_respects_carry_limits() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        let room = fixture.room;
        let mut anvil = Fixture::template("Anvil");
        anvil.weight = crate::config::CombatConfig::BASE_CARRY_WEIGHT;
        let anvil = fixture.world.mint_item(&anvil, ItemLocation::Room(room));
        let pebble = fixture
            .world
            .mint_item(&Fixture::template("Pebble"), ItemLocation::Room(room));
        let mut engine = fixture.engine();

        engine.pick_up(ann, pebble).unwrap();
        assert_eq!(engine.pick_up(ann, anvil), Err(CombatError::OverCarryLimit));

        assert_eq!(engine.world().entity(ann).unwrap().inventory, vec![pebble]);
        assert_eq!(engine.world().item(anvil).unwrap().location, ItemLocation::Room(room));
        assert_eq!(engine.pick_up(ann, pebble), Err(CombatError::UnknownItem(pebble)));
        assert!(engine.world().outbox.transcript().contains("Ann picks up Pebble."));
    }

    #[test]
    fn shared_passive_outlasts_one_of_its_items() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        let charm = amulet(&mut fixture, ann, 1);
        let mut template = Fixture::template("Girdle");
        template.gear = Some(Gear {
            passives: vec![EffectTemplate::new(
                "Sturdy",
                EffectKind::stat(StatTarget::MaxResource(ResourceKind::Hp), 10),
                None,
            )],
            ..Gear::new(EquipSlot::Waist)
        });
        let girdle = fixture.give(ann, &template);
        let mut engine = fixture.engine();

        engine.equip(ann, charm).unwrap();
        engine.equip(ann, girdle).unwrap();
        assert_eq!(engine.stats(ann).unwrap().max_hp, 60);

        engine.unequip(ann, EquipSlot::Neck).unwrap();

        assert_eq!(engine.stats(ann).unwrap().max_hp, 50);
        assert!(engine.has_effect(ann, &"Sturdy".into()));
        engine.unequip(ann, EquipSlot::Waist).unwrap();
        assert!(!engine.has_effect(ann, &"Sturdy".into()));
    }

    #[test]
    fn equipment_requirements_are_enforced() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        let rat = fixture.creature("Rat");
        let heavy = amulet(&mut fixture, ann, 5);
        let light = amulet(&mut fixture, ann, 1);
        let mut engine = fixture.engine();

        assert_eq!(engine.equip(ann, heavy), Err(CombatError::LevelTooLow(5)));

        engine.start_or_join_fight(ann, rat, 1).unwrap();
        assert_eq!(
            engine.equip(ann, light),
            Err(CombatError::ActionBlocked(BlockReason::InCombat))
        );
    }
}
