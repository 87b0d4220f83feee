//! Area footprints for tile abilities.

use crate::state::Position;

/// Cells covered by a `length × width` rectangle centred on `center`.
///
/// The long axis follows the dominant component of the caster→center
/// vector (horizontal on ties). When a dimension does not split evenly
/// around the centre, the extra cell lies on the caster's side along the
/// long axis and on the negative side across it. Cells are returned row by
/// row; callers clip them to the grid.
pub fn tiles_for(caster: Position, center: Position, length: u32, width: u32) -> Vec<Position> {
    let length = length.max(1) as i32;
    let width = width.max(1) as i32;
    if length == 1 && width == 1 {
        return vec![center];
    }

    let dx = center.x - caster.x;
    let dy = center.y - caster.y;
    let horizontal = dx.abs() >= dy.abs();

    // Sign pointing from the centre back toward the caster along the long axis.
    let toward_caster = if horizontal { -dx.signum() } else { -dy.signum() };
    let toward_caster = if toward_caster == 0 { -1 } else { toward_caster };

    let along: Vec<i32> = split(length)
        .map(|offset| offset * toward_caster)
        .collect();
    let across: Vec<i32> = split(width).map(|offset| -offset).collect();

    let mut cells: Vec<Position> = along
        .iter()
        .flat_map(|a| {
            across.iter().map(move |c| {
                if horizontal {
                    center.offset(*a, *c)
                } else {
                    center.offset(*c, *a)
                }
            })
        })
        .collect();
    cells.sort_by_key(|p| (p.y, p.x));
    cells
}

/// Offsets around zero for `n` cells. The larger half is positive.
fn split(n: i32) -> std::ops::RangeInclusive<i32> {
    let favoured = n / 2;
    let other = (n - 1) / 2;
    -other..=favoured
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_cell_area_is_the_center() {
        let center = Position::new(4, 4);
        assert_eq!(tiles_for(Position::ORIGIN, center, 1, 1), vec![center]);
    }

    #[test]
    fn long_axis_follows_dominant_direction() {
        let caster = Position::new(0, 5);
        let center = Position::new(6, 5);
        let cells = tiles_for(caster, center, 3, 1);
        assert_eq!(
            cells,
            vec![Position::new(5, 5), Position::new(6, 5), Position::new(7, 5)]
        );

        let vertical = tiles_for(Position::new(5, 0), Position::new(5, 6), 3, 1);
        assert!(vertical.iter().all(|p| p.x == 5));
        assert_eq!(vertical.len(), 3);
    }

    #[test]
    fn even_length_puts_extra_cell_toward_caster() {
        let caster = Position::new(0, 0);
        let center = Position::new(5, 0);
        let cells = tiles_for(caster, center, 4, 1);
        let xs: Vec<i32> = cells.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![3, 4, 5, 6]);

        let from_right = tiles_for(Position::new(10, 0), center, 4, 1);
        let xs: Vec<i32> = from_right.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![4, 5, 6, 7]);
    }

    #[test]
    fn rectangle_covers_length_times_width_cells() {
        let cells = tiles_for(Position::new(0, 0), Position::new(5, 5), 3, 2);
        assert_eq!(cells.len(), 6);
    }
}
