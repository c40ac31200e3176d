//! Per-tick spatial index over snakes and food
//!
//! Rebuilt wholesale; holds slot indices and pool handles that are only
//! meaningful until the next structural change to the world collections.

use crate::core::config::WorldConfig;
use crate::core::types::Vec2;
use crate::entity::food::Food;
use crate::entity::snake::Snake;
use crate::simulation::pool::{ObjectPool, PoolHandle};
use crate::spatial::grid::Grid;

/// Entity reference stored in a grid bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialRef {
    /// Head of the snake in this slot
    Head(usize),
    /// A non-head segment of the snake in this slot
    Body(usize),
    Food(PoolHandle),
}

#[derive(Debug, Clone)]
pub struct SpatialIndex {
    grid: Grid<SpatialRef>,
}

impl SpatialIndex {
    pub fn new(world: &WorldConfig) -> Self {
        Self {
            grid: Grid::new(world.width, world.height, world.grid_cell_size),
        }
    }

    /// Clear and re-bucket every live entity at its current position
    pub fn rebuild(&mut self, snakes: &[Snake], food: &ObjectPool<Food>) {
        self.grid.clear();

        for (slot, snake) in snakes.iter().enumerate() {
            if snake.is_dead() {
                continue;
            }
            let mut segments = snake.segments();
            if let Some(head) = segments.next() {
                self.grid.insert(head, SpatialRef::Head(slot));
            }
            for segment in segments {
                self.grid.insert(segment, SpatialRef::Body(slot));
            }
        }

        for (handle, item) in food.iter_active() {
            self.grid.insert(item.position, SpatialRef::Food(handle));
        }
    }

    /// Snake slots whose head may lie within `radius`, ascending
    pub fn nearby_heads(&self, pos: Vec2, radius: f32) -> Vec<usize> {
        let mut slots: Vec<usize> = self
            .grid
            .query(pos, radius)
            .filter_map(|r| match r {
                SpatialRef::Head(slot) => Some(slot),
                _ => None,
            })
            .collect();
        slots.sort_unstable();
        slots.dedup();
        slots
    }

    /// Snake slots with any segment possibly within `radius`, ascending
    pub fn nearby_snakes(&self, pos: Vec2, radius: f32) -> Vec<usize> {
        let mut slots: Vec<usize> = self
            .grid
            .query(pos, radius)
            .filter_map(|r| match r {
                SpatialRef::Head(slot) | SpatialRef::Body(slot) => Some(slot),
                _ => None,
            })
            .collect();
        slots.sort_unstable();
        slots.dedup();
        slots
    }

    /// Food handles possibly within `radius`, in slot order
    pub fn nearby_food(&self, pos: Vec2, radius: f32) -> Vec<PoolHandle> {
        let mut handles: Vec<PoolHandle> = self
            .grid
            .query(pos, radius)
            .filter_map(|r| match r {
                SpatialRef::Food(handle) => Some(handle),
                _ => None,
            })
            .collect();
        handles.sort_unstable();
        handles
    }

    /// Total references held (segments count individually)
    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SnakeConfig;
    use crate::core::types::AgentId;
    use crate::entity::food::{FoodKind, FoodSpawn};
    use crate::entity::snake::DeathReason;

    fn snake_at(id: u32, x: f32, y: f32) -> Snake {
        Snake::new(AgentId(id), Vec2::new(x, y), 0.0, &SnakeConfig::default())
    }

    #[test]
    fn test_rebuild_skips_dead_snakes() {
        let mut snakes = vec![snake_at(1, 200.0, 200.0), snake_at(2, 210.0, 200.0)];
        snakes[1].die(DeathReason::Starvation, 1.0);
        let mut index = SpatialIndex::new(&WorldConfig::default());
        index.rebuild(&snakes, &ObjectPool::new());

        assert_eq!(index.nearby_heads(Vec2::new(205.0, 200.0), 30.0), vec![0]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_nearby_snakes_dedups_segments() {
        let snakes = vec![snake_at(1, 500.0, 500.0), snake_at(2, 100.0, 100.0)];
        let mut index = SpatialIndex::new(&WorldConfig::default());
        index.rebuild(&snakes, &ObjectPool::new());

        assert_eq!(index.nearby_snakes(Vec2::new(490.0, 500.0), 20.0), vec![0]);
    }

    #[test]
    fn test_rebuild_reflects_new_positions() {
        let mut food: ObjectPool<Food> = ObjectPool::new();
        let handle = food.acquire(FoodSpawn {
            position: Vec2::new(50.0, 50.0),
            kind: FoodKind::Normal,
            radius: 7.0,
        });
        let mut index = SpatialIndex::new(&WorldConfig::default());
        index.rebuild(&[], &food);
        assert_eq!(index.nearby_food(Vec2::new(50.0, 50.0), 10.0), vec![handle]);

        if let Some(item) = food.get_mut(handle) {
            item.position = Vec2::new(900.0, 700.0);
        }
        index.rebuild(&[], &food);
        assert!(index.nearby_food(Vec2::new(50.0, 50.0), 10.0).is_empty());
        assert_eq!(index.nearby_food(Vec2::new(900.0, 700.0), 10.0), vec![handle]);
    }
}
