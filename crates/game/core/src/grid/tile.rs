use crate::effect::EffectTemplate;
use crate::state::{DamageRange, EntityId, Position};

/// What a tile effect does to whoever stands on it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TileApply {
    /// Typed damage when entering a cell and at the start of each turn on it.
    Damage(DamageRange),
    /// Effect applied on enter and refreshed at the start of each turn on it.
    Inflict(EffectTemplate),
    /// Weapon attacks are impossible while standing on the tile.
    SuppressAttacks,
}

/// Declarative tile effect carried by area abilities.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileTemplate {
    pub name: String,
    pub apply: TileApply,
    /// Seconds of combat time before the tiles fade.
    pub duration: u32,
}

/// Live area effect laid over a set of cells.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileEffect {
    pub name: String,
    pub source: Option<EntityId>,
    pub cells: Vec<Position>,
    pub apply: TileApply,
    pub duration: u32,
    pub elapsed: u32,
}

impl TileEffect {
    pub fn from_template(
        template: &TileTemplate,
        source: Option<EntityId>,
        cells: Vec<Position>,
    ) -> Self {
        Self {
            name: template.name.clone(),
            source,
            cells,
            apply: template.apply.clone(),
            duration: template.duration,
            elapsed: 0,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn covers(&self, position: Position) -> bool {
        self.cells.contains(&position)
    }
}
