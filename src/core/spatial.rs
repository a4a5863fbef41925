//! Uniform spatial hash grid for the collision broad phase.
//!
//! Bodies are bucketed by cell; any two bodies closer than `cell_size` sit in
//! the same or adjacent cells, so pair checks only visit the 3×3 neighbourhood.

use bevy::math::Vec2;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: if cell_size.is_finite() && cell_size > 0.0 { cell_size } else { 1.0 },
            cells: HashMap::new(),
        }
    }

    /// Rebuild from positions; body `i` is `positions[i]`.
    pub fn build(cell_size: f32, positions: impl IntoIterator<Item = Vec2>) -> Self {
        let mut grid = Self::new(cell_size);
        for (i, p) in positions.into_iter().enumerate() {
            grid.insert(i, p);
        }
        grid
    }

    pub fn cell_of(&self, p: Vec2) -> (i32, i32) {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
        )
    }

    pub fn insert(&mut self, index: usize, p: Vec2) {
        let cell = self.cell_of(p);
        self.cells.entry(cell).or_default().push(index);
    }

    /// Bodies in the 3×3 block of cells around `p`, in a fixed visiting order.
    pub fn neighbours(&self, p: Vec2) -> impl Iterator<Item = usize> + '_ {
        let (cx, cy) = self.cell_of(p);
        (-1..=1)
            .flat_map(move |dx| (-1..=1).map(move |dy| (cx + dx, cy + dy)))
            .filter_map(move |cell| self.cells.get(&cell))
            .flat_map(|bodies| bodies.iter().copied())
    }
}
