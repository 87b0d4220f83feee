/// Balance tables indexed by level or by effective attribute value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StatTables {
    pub max_hp_base: i32,
    pub max_mana_base: i32,
    pub max_stamina_base: i32,

    pub level_to_max_hp: Vec<i32>,
    pub con_to_max_hp: Vec<i32>,
    pub level_to_max_mana: Vec<i32>,
    pub spirit_to_max_mana: Vec<i32>,
    pub level_to_max_stamina: Vec<i32>,
    pub str_to_max_stamina: Vec<i32>,

    pub con_to_defense: Vec<i32>,
    pub dex_to_evade: Vec<i32>,
    pub wis_to_resist: Vec<i32>,

    /// Thousandths of a point per second.
    pub con_to_hp_regen: Vec<i32>,
    pub spirit_to_mana_regen: Vec<i32>,
    pub str_to_stamina_regen: Vec<i32>,
}

/// Reads `table[index]`, using the first value below the table and the last
/// value past its end. Empty tables read as zero.
pub fn lookup(table: &[i32], index: i32) -> i32 {
    let Some(last) = table.last() else {
        return 0;
    };
    if index < 0 {
        return table[0];
    }
    table.get(index as usize).copied().unwrap_or(*last)
}

impl StatTables {
    /// Balanced defaults used when no table file is supplied.
    pub fn standard() -> Self {
        let linear = |len: i32, numerator: i32, denominator: i32| -> Vec<i32> {
            (0..len).map(|i| i * numerator / denominator).collect()
        };

        Self {
            max_hp_base: 20,
            max_mana_base: 10,
            max_stamina_base: 10,
            level_to_max_hp: linear(51, 5, 1),
            con_to_max_hp: linear(31, 2, 1),
            level_to_max_mana: linear(51, 3, 1),
            spirit_to_max_mana: linear(31, 2, 1),
            level_to_max_stamina: linear(51, 3, 1),
            str_to_max_stamina: linear(31, 2, 1),
            con_to_defense: linear(31, 1, 5),
            dex_to_evade: linear(31, 2, 1),
            wis_to_resist: linear(31, 1, 4),
            con_to_hp_regen: linear(31, 50, 1),
            spirit_to_mana_regen: linear(31, 50, 1),
            str_to_stamina_regen: linear(31, 80, 1),
        }
    }

    /// Tables that contribute nothing beyond the flat base maxima.
    pub fn flat(max_hp: i32, max_mana: i32, max_stamina: i32) -> Self {
        Self {
            max_hp_base: max_hp,
            max_mana_base: max_mana,
            max_stamina_base: max_stamina,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_saturates_at_both_ends() {
        let table = [1, 4, 9];
        assert_eq!(lookup(&table, 1), 4);
        assert_eq!(lookup(&table, 12), 9);
        assert_eq!(lookup(&table, -3), 1);
        assert_eq!(lookup(&[], 2), 0);
    }

    #[test]
    fn standard_tables_grow_with_level() {
        let tables = StatTables::standard();
        assert!(lookup(&tables.level_to_max_hp, 10) > lookup(&tables.level_to_max_hp, 1));
        assert_eq!(lookup(&tables.dex_to_evade, 10), 20);
    }
}
