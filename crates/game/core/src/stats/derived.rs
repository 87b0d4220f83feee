//! Derived stats: the output of the pipeline.

use strum::IntoEnumIterator;

use super::tables::{StatTables, lookup};
use crate::effect::{EffectKey, EffectKind, EffectSet, StatTarget};
use crate::state::{Attribute, Attributes, DamageType, Gear, Item, ResourceKind, TypedTable};

/// Everything combat reads about an entity, recomputed on demand.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DerivedStats {
    /// Effective attributes after modifiers.
    pub attributes: Attributes,
    pub max_hp: u32,
    pub max_mana: u32,
    pub max_stamina: u32,
    /// Regeneration in thousandths per second.
    pub hp_regen: u32,
    pub mana_regen: u32,
    pub stamina_regen: u32,
    pub defense: TypedTable,
    pub resistance: TypedTable,
    pub evasion: u32,
    pub accuracy: i32,
    pub damage_bonus: i32,
    /// Cells walked per action point.
    pub speed: u32,
}

impl DerivedStats {
    /// Runs the pipeline for one entity.
    ///
    /// `worn` lists every equipped item; items without gear data are ignored.
    pub fn compute(
        level: u32,
        base: &Attributes,
        worn: &[&Item],
        effects: &EffectSet,
        tables: &StatTables,
    ) -> Self {
        let attributes = effective_attributes(base, effects);
        let gear: Vec<&Gear> = worn.iter().filter_map(|item| item.gear.as_ref()).collect();
        let carried_weight: Vec<u32> = worn.iter().map(|item| item.weight).collect();
        let level = level.min(i32::MAX as u32) as i32;

        let max_hp = tables.max_hp_base
            + lookup(&tables.level_to_max_hp, level)
            + lookup(&tables.con_to_max_hp, attributes.constitution)
            + effects.stat_sum(StatTarget::MaxResource(ResourceKind::Hp));
        let max_mana = tables.max_mana_base
            + lookup(&tables.level_to_max_mana, level)
            + lookup(&tables.spirit_to_max_mana, attributes.spirit)
            + effects.stat_sum(StatTarget::MaxResource(ResourceKind::Mana));
        let max_stamina = tables.max_stamina_base
            + lookup(&tables.level_to_max_stamina, level)
            + lookup(&tables.str_to_max_stamina, attributes.strength)
            + effects.stat_sum(StatTarget::MaxResource(ResourceKind::Stamina));

        let regen = |table: &[i32], value: i32, resource: ResourceKind| -> u32 {
            non_negative(lookup(table, value) + effects.stat_sum(StatTarget::Regen(resource)))
        };

        Self {
            max_hp: non_negative(max_hp).max(1),
            max_mana: non_negative(max_mana),
            max_stamina: non_negative(max_stamina),
            hp_regen: regen(&tables.con_to_hp_regen, attributes.constitution, ResourceKind::Hp),
            mana_regen: regen(&tables.spirit_to_mana_regen, attributes.spirit, ResourceKind::Mana),
            stamina_regen: regen(
                &tables.str_to_stamina_regen,
                attributes.strength,
                ResourceKind::Stamina,
            ),
            defense: defense(&attributes, &gear, effects, tables),
            resistance: resistance(&attributes, &gear, effects, tables),
            evasion: evasion(&attributes, &gear, &carried_weight, effects, tables),
            accuracy: effects.stat_sum(StatTarget::Accuracy),
            damage_bonus: effects.stat_sum(StatTarget::Damage),
            speed: speed(&attributes, effects),
            attributes,
        }
    }

    pub fn max(&self, resource: ResourceKind) -> u32 {
        match resource {
            ResourceKind::Hp => self.max_hp,
            ResourceKind::Mana => self.max_mana,
            ResourceKind::Stamina => self.max_stamina,
        }
    }

    pub fn regen(&self, resource: ResourceKind) -> u32 {
        match resource {
            ResourceKind::Hp => self.hp_regen,
            ResourceKind::Mana => self.mana_regen,
            ResourceKind::Stamina => self.stamina_regen,
        }
    }

    /// Flat reduction against one damage type, floored at zero.
    pub fn defense_against(&self, damage_type: DamageType) -> u32 {
        non_negative(self.defense.against(damage_type))
    }

    pub fn resistance_against(&self, damage_type: DamageType) -> u32 {
        non_negative(self.resistance.against(damage_type))
    }
}

fn non_negative(value: i32) -> u32 {
    value.max(0) as u32
}

fn effective_attributes(base: &Attributes, effects: &EffectSet) -> Attributes {
    let mut effective = *base;
    for attribute in Attribute::iter() {
        let value = base.get(attribute) + effects.stat_sum(StatTarget::Attribute(attribute));
        *effective.get_mut(attribute) = value.max(0);
    }
    effective
}

/// Adds every typed or untyped modifier selected by `select` into `table`.
fn add_typed_mods(
    table: &mut TypedTable,
    effects: &EffectSet,
    select: impl Fn(StatTarget) -> Option<Option<DamageType>>,
) {
    for effect in effects.iter() {
        if let EffectKind::StatMod { stat, amount, .. } = &effect.kind {
            if let Some(damage_type) = select(*stat) {
                table.add(damage_type, *amount);
            }
        }
    }
}

fn defense(
    attributes: &Attributes,
    gear: &[&Gear],
    effects: &EffectSet,
    tables: &StatTables,
) -> TypedTable {
    let mut equipment = TypedTable::new();
    for item in gear {
        equipment.merge(&item.defense);
    }

    if effects.has(&EffectKey::ARMOR_IGNORED) {
        let ignored = effects.stat_sum(StatTarget::ArmorIgnored).clamp(0, 100);
        equipment = equipment.scaled(100 - ignored);
    }

    let mut total = TypedTable::new().with_untyped(lookup(
        &tables.con_to_defense,
        attributes.constitution,
    ));
    total.merge(&equipment);
    add_typed_mods(&mut total, effects, |stat| match stat {
        StatTarget::Defense(damage_type) => Some(damage_type),
        _ => None,
    });
    total
}

fn resistance(
    attributes: &Attributes,
    gear: &[&Gear],
    effects: &EffectSet,
    tables: &StatTables,
) -> TypedTable {
    let mut total =
        TypedTable::new().with_untyped(lookup(&tables.wis_to_resist, attributes.wisdom));
    for item in gear {
        total.merge(&item.resistance);
    }
    add_typed_mods(&mut total, effects, |stat| match stat {
        StatTarget::Resistance(damage_type) => Some(damage_type),
        _ => None,
    });
    total
}

fn evasion(
    attributes: &Attributes,
    gear: &[&Gear],
    weights: &[u32],
    effects: &EffectSet,
    tables: &StatTables,
) -> u32 {
    let gear_evasion: i32 = gear.iter().map(|item| item.evasion).sum();
    let weight_penalty: i32 = weights.iter().map(|weight| (weight / 2) as i32).sum();
    let value = lookup(&tables.dex_to_evade, attributes.dexterity) + gear_evasion
        - weight_penalty
        + effects.stat_sum(StatTarget::Evasion);
    non_negative(value)
}

fn speed(attributes: &Attributes, effects: &EffectSet) -> u32 {
    let mut speed = non_negative(attributes.dexterity) / 3;
    if effects.has(&EffectKey::SLOWED) {
        speed /= 2;
    }
    speed.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{EffectOrigin, EffectTemplate};
    use crate::state::{EffectId, EntityId, EquipSlot, ItemId};

    fn apply(effects: &mut EffectSet, template: EffectTemplate) {
        let id = EffectId(effects.len() as u32 + 1);
        effects.insert(template.instantiate(id, None, EntityId(1), EffectOrigin::Ability));
    }

    #[test]
    fn max_hp_combines_base_level_and_constitution() {
        let tables = StatTables {
            level_to_max_hp: vec![0, 10, 20],
            con_to_max_hp: vec![0, 1, 2, 3],
            ..StatTables::flat(50, 0, 0)
        };
        let base = Attributes::uniform(0).with(Attribute::Constitution, 3);

        let stats = DerivedStats::compute(2, &base, &[], &EffectSet::new(), &tables);

        assert_eq!(stats.max_hp, 73);
    }

    #[test]
    fn attribute_modifiers_are_floored_at_zero() {
        let mut effects = EffectSet::new();
        apply(
            &mut effects,
            EffectTemplate::new(
                "Weakness",
                EffectKind::stat(StatTarget::Attribute(Attribute::Strength), -50),
                Some(30),
            ),
        );

        let stats = DerivedStats::compute(
            1,
            &Attributes::uniform(10),
            &[],
            &effects,
            &StatTables::default(),
        );

        assert_eq!(stats.attributes.strength, 0);
    }

    #[test]
    fn armor_ignored_scales_only_equipment_defense() {
        let tables = StatTables {
            con_to_defense: vec![4],
            ..StatTables::default()
        };
        let mut plate = Item::new(ItemId(1), "plate");
        let mut gear = Gear::new(EquipSlot::Torso);
        gear.defense = TypedTable::new().with_untyped(10);
        plate.gear = Some(gear);

        let mut effects = EffectSet::new();
        apply(
            &mut effects,
            EffectTemplate::new(
                EffectKey::ARMOR_IGNORED,
                EffectKind::stat(StatTarget::ArmorIgnored, 50),
                Some(9),
            ),
        );

        let stats =
            DerivedStats::compute(1, &Attributes::uniform(0), &[&plate], &effects, &tables);

        assert_eq!(stats.defense_against(DamageType::Slashing), 4 + 5);
    }

    #[test]
    fn gear_weight_reduces_evasion_to_floor() {
        let tables = StatTables {
            dex_to_evade: vec![6],
            ..StatTables::default()
        };
        let mut cloak = Item::new(ItemId(1), "cloak");
        let mut gear = Gear::new(EquipSlot::AboutBody);
        gear.evasion = 2;
        cloak.gear = Some(gear);
        cloak.weight = 4;
        let mut anvil = Item::new(ItemId(2), "anvil");
        anvil.gear = Some(Gear::new(EquipSlot::Secondary));
        anvil.weight = 40;

        let light = DerivedStats::compute(
            1,
            &Attributes::uniform(0),
            &[&cloak],
            &EffectSet::new(),
            &tables,
        );
        let heavy = DerivedStats::compute(
            1,
            &Attributes::uniform(0),
            &[&cloak, &anvil],
            &EffectSet::new(),
            &tables,
        );

        assert_eq!(light.evasion, 6 + 2 - 2);
        assert_eq!(heavy.evasion, 0);
    }

    #[test]
    fn typed_defense_modifiers_only_apply_to_their_type() {
        let mut effects = EffectSet::new();
        apply(
            &mut effects,
            EffectTemplate::new(
                "Fireward",
                EffectKind::stat(StatTarget::Defense(Some(DamageType::Fire)), 6),
                Some(9),
            ),
        );

        let stats = DerivedStats::compute(
            1,
            &Attributes::uniform(0),
            &[],
            &effects,
            &StatTables::default(),
        );

        assert_eq!(stats.defense_against(DamageType::Fire), 6);
        assert_eq!(stats.defense_against(DamageType::Cold), 0);
    }

    #[test]
    fn slowed_halves_speed_with_floor_of_one() {
        let base = Attributes::uniform(0).with(Attribute::Dexterity, 12);
        let mut effects = EffectSet::new();
        let fast = DerivedStats::compute(1, &base, &[], &effects, &StatTables::default());
        assert_eq!(fast.speed, 4);

        apply(
            &mut effects,
            EffectTemplate::new(EffectKey::SLOWED, EffectKind::flag(), Some(9)),
        );
        let slow = DerivedStats::compute(1, &base, &[], &effects, &StatTables::default());
        assert_eq!(slow.speed, 2);

        let clumsy = Attributes::uniform(0);
        let crawl = DerivedStats::compute(1, &clumsy, &[], &effects, &StatTables::default());
        assert_eq!(crawl.speed, 1);
    }

    #[test]
    fn compute_is_pure() {
        let tables = StatTables::standard();
        let base = Attributes::uniform(12);
        let effects = EffectSet::new();
        let first = DerivedStats::compute(5, &base, &[], &effects, &tables);
        let second = DerivedStats::compute(5, &base, &[], &effects, &tables);
        assert_eq!(first, second);
    }
}
