//! Uniform bucket grid for approximate neighbor queries

use crate::core::types::Vec2;

/// 2D grid of buckets covering a fixed world rectangle anchored at the origin
///
/// Positions outside the rectangle are clamped into the border cells, so an
/// insert or query never indexes out of range.
#[derive(Debug, Clone)]
pub struct Grid<T: Copy> {
    pub cols: usize,
    pub rows: usize,
    pub cell_size: f32,
    cells: Vec<Vec<T>>,
}

impl<T: Copy> Grid<T> {
    pub fn new(width: f32, height: f32, cell_size: f32) -> Self {
        let cols = (width / cell_size).floor().max(0.0) as usize + 1;
        let rows = (height / cell_size).floor().max(0.0) as usize + 1;
        Self {
            cols,
            rows,
            cell_size,
            cells: (0..cols * rows).map(|_| Vec::new()).collect(),
        }
    }

    /// Empty every bucket, keeping their allocations for the next rebuild
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    #[inline]
    fn clamp_axis(value: f32, cell_size: f32, count: usize) -> usize {
        let raw = (value / cell_size).floor();
        if raw.is_nan() || raw < 0.0 {
            0
        } else {
            (raw as usize).min(count - 1)
        }
    }

    /// Convert world position to clamped cell coordinates
    #[inline]
    pub fn world_to_cell(&self, pos: Vec2) -> (usize, usize) {
        (
            Self::clamp_axis(pos.x, self.cell_size, self.cols),
            Self::clamp_axis(pos.y, self.cell_size, self.rows),
        )
    }

    pub fn insert(&mut self, pos: Vec2, item: T) {
        let (x, y) = self.world_to_cell(pos);
        self.cells[y * self.cols + x].push(item);
    }

    /// All items in cells overlapping the square of side `2 * radius`
    /// centered at `pos`
    ///
    /// Conservative: callers re-filter by exact distance.
    pub fn query(&self, pos: Vec2, radius: f32) -> impl Iterator<Item = T> + '_ {
        let radius = radius.max(0.0);
        let (min_x, min_y) = self.world_to_cell(pos - Vec2::splat(radius));
        let (max_x, max_y) = self.world_to_cell(pos + Vec2::splat(radius));

        (min_y..=max_y).flat_map(move |y| {
            (min_x..=max_x).flat_map(move |x| self.cells[y * self.cols + x].iter().copied())
        })
    }

    pub fn len(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Vec::is_empty)
    }
}
