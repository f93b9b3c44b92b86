//! Per-episode record of which floor buckets the agent has stood in.

use bevy::prelude::Vec3;
use thiserror::Error;

pub const GRID_SIZE: usize = 25;
/// Added to the truncated local x coordinate.
pub const GRID_OFFSET_X: i32 = 10;
/// Added to the truncated local z coordinate.
pub const GRID_OFFSET_Z: i32 = 14;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub x: usize,
    pub z: usize,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridError {
    #[error("position bucket ({x}, {z}) is outside the {size}x{size} visitation grid")]
    OutOfBounds { x: i32, z: i32, size: usize },
}

/// Whether a bucket was seen for the first time this episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visit {
    First,
    Repeat,
}

/// Truncated coordinate plus offset. NaN and infinities map to `i32::MIN`.
fn bucket(coordinate: f32, offset: i32) -> i32 {
    if coordinate.is_finite() {
        (coordinate as i32).saturating_add(offset)
    } else {
        i32::MIN
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisitationGrid {
    cells: [[bool; GRID_SIZE]; GRID_SIZE],
}

impl Default for VisitationGrid {
    fn default() -> Self {
        Self {
            cells: [[false; GRID_SIZE]; GRID_SIZE],
        }
    }
}

impl VisitationGrid {
    /// Bucket a local-frame position. Coordinates are truncated toward zero
    /// before the offset is applied. Non-finite coordinates are out of bounds.
    pub fn cell_for(local_position: Vec3) -> Result<GridCell, GridError> {
        let x = bucket(local_position.x, GRID_OFFSET_X);
        let z = bucket(local_position.z, GRID_OFFSET_Z);
        let in_range = |value: i32| (0..GRID_SIZE as i32).contains(&value);
        if in_range(x) && in_range(z) {
            Ok(GridCell {
                x: x as usize,
                z: z as usize,
            })
        } else {
            Err(GridError::OutOfBounds {
                x,
                z,
                size: GRID_SIZE,
            })
        }
    }

    pub fn visit(&mut self, cell: GridCell) -> Visit {
        let slot = &mut self.cells[cell.x][cell.z];
        if *slot {
            Visit::Repeat
        } else {
            *slot = true;
            Visit::First
        }
    }

    pub fn visit_position(&mut self, local_position: Vec3) -> Result<Visit, GridError> {
        Self::cell_for(local_position).map(|cell| self.visit(cell))
    }

    pub fn is_visited(&self, cell: GridCell) -> bool {
        self.cells[cell.x][cell.z]
    }

    pub fn visited_count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&visited| visited).count()
    }

    pub fn clear(&mut self) {
        self.cells = [[false; GRID_SIZE]; GRID_SIZE];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_bucket() {
        let cell = VisitationGrid::cell_for(Vec3::new(-2.0, 1.0, -12.0)).unwrap();
        assert_eq!(cell, GridCell { x: 8, z: 2 });
    }

    #[test]
    fn test_truncates_toward_zero() {
        let cell = VisitationGrid::cell_for(Vec3::new(-2.9, 0.0, -12.7)).unwrap();
        assert_eq!(cell, GridCell { x: 8, z: 2 });

        let cell = VisitationGrid::cell_for(Vec3::new(-10.9, 0.0, 10.9)).unwrap();
        assert_eq!(cell, GridCell { x: 0, z: 24 });
    }

    #[test]
    fn test_out_of_bounds_is_reported() {
        assert_eq!(
            VisitationGrid::cell_for(Vec3::new(-11.0, 0.0, 0.0)),
            Err(GridError::OutOfBounds {
                x: -1,
                z: 14,
                size: GRID_SIZE
            })
        );
        assert!(VisitationGrid::cell_for(Vec3::new(0.0, 0.0, 11.0)).is_err());
        assert!(VisitationGrid::cell_for(Vec3::new(15.0, 0.0, 0.0)).is_err());
    }

    #[test]
    fn test_huge_positions_do_not_overflow() {
        assert!(matches!(
            VisitationGrid::cell_for(Vec3::new(3.0e9, 0.0, 0.0)),
            Err(GridError::OutOfBounds { x: i32::MAX, .. })
        ));
        assert!(VisitationGrid::cell_for(Vec3::new(0.0, 0.0, 3.0e9)).is_err());
        assert!(VisitationGrid::cell_for(Vec3::new(-3.0e9, 0.0, -3.0e9)).is_err());
    }

    #[test]
    fn test_non_finite_positions_are_out_of_bounds() {
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            assert!(VisitationGrid::cell_for(Vec3::new(bad, 0.0, 0.0)).is_err());
            assert!(VisitationGrid::cell_for(Vec3::new(0.0, 0.0, bad)).is_err());
        }

        let mut grid = VisitationGrid::default();
        assert!(grid.visit_position(Vec3::NAN).is_err());
        assert_eq!(grid.visited_count(), 0);
    }

    #[test]
    fn test_first_visit_then_repeat() {
        let mut grid = VisitationGrid::default();
        let position = Vec3::new(3.2, 0.5, 4.8);

        assert_eq!(grid.visit_position(position), Ok(Visit::First));
        assert_eq!(grid.visit_position(position), Ok(Visit::Repeat));
        assert_eq!(grid.visit_position(position), Ok(Visit::Repeat));
        assert_eq!(grid.visited_count(), 1);
    }

    #[test]
    fn test_clear_forgets_everything() {
        let mut grid = VisitationGrid::default();
        for x in -10..15 {
            grid.visit_position(Vec3::new(x as f32, 0.0, 0.0)).unwrap();
        }
        assert_eq!(grid.visited_count(), GRID_SIZE);

        grid.clear();
        assert_eq!(grid, VisitationGrid::default());
        assert_eq!(grid.visited_count(), 0);
    }
}
