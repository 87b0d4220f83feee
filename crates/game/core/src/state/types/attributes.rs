/// Primary attributes of an entity.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Attribute {
    Strength,
    Constitution,
    Dexterity,
    Perception,
    Intelligence,
    Wisdom,
    Spirit,
}

/// Attribute block. Used both for base values and for effective values
/// after stat modifiers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attributes {
    pub strength: i32,
    pub constitution: i32,
    pub dexterity: i32,
    pub perception: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub spirit: i32,
}

impl Attributes {
    /// Every attribute set to `value`.
    pub const fn uniform(value: i32) -> Self {
        Self {
            strength: value,
            constitution: value,
            dexterity: value,
            perception: value,
            intelligence: value,
            wisdom: value,
            spirit: value,
        }
    }

    pub fn get(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Strength => self.strength,
            Attribute::Constitution => self.constitution,
            Attribute::Dexterity => self.dexterity,
            Attribute::Perception => self.perception,
            Attribute::Intelligence => self.intelligence,
            Attribute::Wisdom => self.wisdom,
            Attribute::Spirit => self.spirit,
        }
    }

    pub fn get_mut(&mut self, attribute: Attribute) -> &mut i32 {
        match attribute {
            Attribute::Strength => &mut self.strength,
            Attribute::Constitution => &mut self.constitution,
            Attribute::Dexterity => &mut self.dexterity,
            Attribute::Perception => &mut self.perception,
            Attribute::Intelligence => &mut self.intelligence,
            Attribute::Wisdom => &mut self.wisdom,
            Attribute::Spirit => &mut self.spirit,
        }
    }

    pub fn with(mut self, attribute: Attribute, value: i32) -> Self {
        *self.get_mut(attribute) = value;
        self
    }
}
