//! Fixed-size battle grid.
//!
//! Each battle owns one [`Grid`]: a rectangle of cells holding at most one
//! entity each plus a short ordered list of tile effects. The grid enforces
//! single occupancy and bounds; effect-based movement rules such as Stuck
//! are checked by the engine before it calls [`Grid::step`].

mod area;
mod tile;

pub use area::tiles_for;
pub use tile::{TileApply, TileEffect, TileTemplate};

use std::collections::BTreeMap;

use arrayvec::ArrayVec;

use crate::config::CombatConfig;
use crate::state::{EntityId, Position, Registry, TileEffectId};

/// Errors raised by grid placement.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("position {0} is outside the grid")]
    OutOfBounds(Position),

    #[error("position {position} is occupied by {occupant}")]
    Occupied {
        position: Position,
        occupant: EntityId,
    },
}

/// Eight compass directions. North is toward row 0.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    #[strum(to_string = "north", serialize = "n")]
    North,
    #[strum(to_string = "northeast", serialize = "ne")]
    NorthEast,
    #[strum(to_string = "east", serialize = "e")]
    East,
    #[strum(to_string = "southeast", serialize = "se")]
    SouthEast,
    #[strum(to_string = "south", serialize = "s")]
    South,
    #[strum(to_string = "southwest", serialize = "sw")]
    SouthWest,
    #[strum(to_string = "west", serialize = "w")]
    West,
    #[strum(to_string = "northwest", serialize = "nw")]
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::NorthEast => (1, -1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::South => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
        }
    }

    pub fn apply(self, position: Position) -> Position {
        let (dx, dy) = self.delta();
        position.offset(dx, dy)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct Cell {
    occupant: Option<EntityId>,
    overlays: ArrayVec<TileEffectId, { CombatConfig::MAX_OVERLAYS_PER_TILE }>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
    positions: BTreeMap<EntityId, Position>,
    tiles: Registry<TileEffectId, TileEffect>,
}

impl Grid {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            cells: vec![Cell::default(); (width * height) as usize],
            positions: BTreeMap::new(),
            tiles: Registry::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && (position.x as u32) < self.width
            && (position.y as u32) < self.height
    }

    fn index(&self, position: Position) -> Option<usize> {
        self.contains(position)
            .then(|| position.y as usize * self.width as usize + position.x as usize)
    }

    /// Puts `entity` on `position`, moving it if it was already placed.
    pub fn place(&mut self, entity: EntityId, position: Position) -> Result<(), GridError> {
        let index = self
            .index(position)
            .ok_or(GridError::OutOfBounds(position))?;
        match self.cells[index].occupant {
            Some(occupant) if occupant != entity => {
                return Err(GridError::Occupied { position, occupant });
            }
            _ => {}
        }
        self.remove(entity);
        self.cells[index].occupant = Some(entity);
        self.positions.insert(entity, position);
        Ok(())
    }

    /// Takes `entity` off the grid, returning where it stood.
    pub fn remove(&mut self, entity: EntityId) -> Option<Position> {
        let position = self.positions.remove(&entity)?;
        if let Some(index) = self.index(position) {
            self.cells[index].occupant = None;
        }
        Some(position)
    }

    pub fn coordinates(&self, entity: EntityId) -> Option<Position> {
        self.positions.get(&entity).copied()
    }

    pub fn at(&self, position: Position) -> Option<EntityId> {
        self.index(position)
            .and_then(|index| self.cells[index].occupant)
    }

    pub fn is_free(&self, position: Position) -> bool {
        self.contains(position) && self.at(position).is_none()
    }

    /// Moves `entity` one cell. Returns the new position, or `None` when the
    /// entity is not placed or the target cell is blocked.
    pub fn step(&mut self, entity: EntityId, direction: Direction) -> Option<Position> {
        let from = self.coordinates(entity)?;
        let to = direction.apply(from);
        if !self.is_free(to) {
            return None;
        }
        self.place(entity, to).ok()?;
        Some(to)
    }

    /// First compass direction whose step strictly reduces (or, with `away`,
    /// strictly increases) the Chebyshev distance to `target` and lands on a
    /// free cell. Does not move anything.
    pub fn move_toward(
        &self,
        entity: EntityId,
        target: Position,
        away: bool,
    ) -> Option<Direction> {
        let from = self.coordinates(entity)?;
        let current = from.chebyshev(target);
        Direction::ALL.into_iter().find(|direction| {
            let next = direction.apply(from);
            let distance = next.chebyshev(target);
            let improves = if away {
                distance > current
            } else {
                distance < current
            };
            improves && self.is_free(next)
        })
    }

    pub fn distance(&self, a: EntityId, b: EntityId) -> Option<u32> {
        Some(self.coordinates(a)?.chebyshev(self.coordinates(b)?))
    }

    /// Nearest free cell to `origin`, searching outward ring by ring.
    pub fn free_cell_near(&self, origin: Position) -> Option<Position> {
        let max_radius = self.width.max(self.height) as i32;
        (0..=max_radius).find_map(|radius| {
            (-radius..=radius)
                .flat_map(|dy| (-radius..=radius).map(move |dx| origin.offset(dx, dy)))
                .filter(|p| p.chebyshev(origin) == radius as u32)
                .find(|p| self.is_free(*p))
        })
    }

    /// Entities placed on the grid, in id order.
    pub fn occupants(&self) -> impl Iterator<Item = (EntityId, Position)> + '_ {
        self.positions.iter().map(|(id, pos)| (*id, *pos))
    }

    // ========================================================================
    // Tile effects
    // ========================================================================

    /// Tile effects overlaying `position`, oldest first.
    pub fn effects_at(&self, position: Position) -> &[TileEffectId] {
        match self.index(position) {
            Some(index) => self.cells[index].overlays.as_slice(),
            None => &[],
        }
    }

    /// Lays a tile effect over its in-bounds cells. Cells whose overlay list
    /// is full are left out.
    pub fn add_tile(&mut self, mut effect: TileEffect) -> TileEffectId {
        effect.cells.retain(|cell| self.contains(*cell));
        let id = self.tiles.allocate();
        let mut covered = Vec::with_capacity(effect.cells.len());
        for cell in &effect.cells {
            let Some(index) = self.index(*cell) else {
                continue;
            };
            if self.cells[index].overlays.try_push(id).is_ok() {
                covered.push(*cell);
            } else {
                tracing::warn!(%cell, "tile overlay list full; cell skipped");
            }
        }
        effect.cells = covered;
        self.tiles.insert_at(id, effect);
        id
    }

    pub fn remove_tile(&mut self, id: TileEffectId) -> Option<TileEffect> {
        let effect = self.tiles.remove(id)?;
        for cell in &effect.cells {
            if let Some(index) = self.index(*cell) {
                self.cells[index].overlays.retain(|overlay| *overlay != id);
            }
        }
        Some(effect)
    }

    pub fn tile(&self, id: TileEffectId) -> Option<&TileEffect> {
        self.tiles.get(id)
    }

    pub fn tiles(&self) -> impl Iterator<Item = (TileEffectId, &TileEffect)> {
        self.tiles.iter()
    }

    /// Advances every tile effect and removes the ones that ran out.
    pub fn age_tiles(&mut self, secs: u32) -> Vec<TileEffect> {
        let ids: Vec<TileEffectId> = self.tiles.ids().collect();
        let mut expired = Vec::new();
        for id in ids {
            let done = match self.tiles.get_mut(id) {
                Some(effect) => {
                    effect.elapsed = effect.elapsed.saturating_add(secs).min(effect.duration);
                    effect.is_expired()
                }
                None => false,
            };
            if done {
                expired.extend(self.remove_tile(id));
            }
        }
        expired
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Text map of the grid as seen by `looker`.
    ///
    /// Empty cells are `.`, cells under a tile effect are `*`, entities show
    /// `glyph(entity)` and the looker is `@`.
    pub fn render(&self, looker: EntityId, glyph: impl Fn(EntityId) -> char) -> String {
        let mut out = String::with_capacity(((self.width + 1) * self.height) as usize);
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let position = Position::new(x, y);
                let symbol = match self.at(position) {
                    Some(entity) if entity == looker => '@',
                    Some(entity) => glyph(entity),
                    None if !self.effects_at(position).is_empty() => '*',
                    None => '.',
                };
                out.push(symbol);
            }
            out.push('\n');
        }
        out
    }
}


#[cfg(test)]
mod properties {
    use proptest::prelude::*;

    use super::*;

    fn direction() -> impl Strategy<Value = Direction> {
        proptest::sample::select(Direction::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn cells_never_hold_two_entities(
            moves in proptest::collection::vec((1u32..5, direction()), 0..64)
        ) {
            let mut grid = Grid::new(6, 6);
            for (index, id) in (1u32..5).enumerate() {
                grid.place(EntityId(id), Position::new(index as i32, 0)).unwrap();
            }
            for (id, direction) in moves {
                let _ = grid.step(EntityId(id), direction);
            }

            let mut cells: Vec<Position> = grid.occupants().map(|(_, at)| at).collect();
            prop_assert_eq!(cells.len(), 4);
            cells.sort();
            cells.dedup();
            prop_assert_eq!(cells.len(), 4);
            for (id, at) in grid.occupants() {
                prop_assert!(grid.contains(at));
                prop_assert_eq!(grid.at(at), Some(id));
            }
        }
    }
}
