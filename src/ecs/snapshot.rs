//! Read-only world snapshot for renderers and tooling

use serde::Serialize;

use crate::core::error::Result;
use crate::core::types::{AgentId, CreatureId, SimTime, Tick, Vec2};
use crate::ecs::world::World;
use crate::entity::creature::{CreatureKind, CreatureTarget};
use crate::entity::food::FoodKind;
use crate::entity::snake::SnakeState;
use crate::simulation::environment::EffectTag;
use crate::simulation::pool::PoolStats;

/// Serializable copy of everything a renderer draws
#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub tick: Tick,
    pub elapsed: SimTime,
    pub width: f32,
    pub height: f32,
    pub snakes: Vec<SnakeView>,
    pub food: Vec<FoodView>,
    pub effects: Vec<EffectView>,
    pub creatures: Vec<CreatureView>,
    pub food_pool: PoolStats,
    pub summary: SnapshotSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnakeView {
    pub id: AgentId,
    /// Head first
    pub segments: Vec<Vec2>,
    pub size: u32,
    pub food_eaten: u32,
    pub state: SnakeState,
    pub effects: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FoodView {
    pub position: Vec2,
    pub kind: FoodKind,
    pub radius: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct EffectView {
    pub kind: EffectTag,
    pub position: Vec2,
    pub radius: f32,
    pub influence_radius: f32,
    pub remaining: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatureView {
    pub id: CreatureId,
    pub kind: CreatureKind,
    pub position: Vec2,
    pub target: Option<CreatureTarget>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotSummary {
    pub living_snakes: usize,
    pub hunters: usize,
    pub starving: usize,
    pub dead: usize,
    pub pursuers: usize,
    pub foragers: usize,
}

impl WorldSnapshot {
    pub fn capture(world: &World) -> Self {
        let now = world.elapsed;

        let snakes: Vec<SnakeView> = world
            .snakes
            .iter()
            .map(|snake| SnakeView {
                id: snake.id,
                segments: snake.segments().collect(),
                size: snake.size(),
                food_eaten: snake.food_eaten(),
                state: snake.state(),
                effects: snake.modifiers().labels(),
            })
            .collect();

        let food = world
            .food
            .iter_active()
            .map(|(_, item)| FoodView {
                position: item.position,
                kind: item.kind,
                radius: item.radius,
            })
            .collect();

        let effects = world
            .effects
            .iter()
            .map(|effect| EffectView {
                kind: effect.kind.tag(),
                position: effect.position,
                radius: effect.kind.radius(),
                influence_radius: effect.kind.influence_radius(),
                remaining: effect.remaining(now),
            })
            .collect();

        let creatures = world
            .creatures
            .iter()
            .filter(|c| c.is_alive())
            .map(|c| CreatureView {
                id: c.id,
                kind: c.kind,
                position: c.position,
                target: c.target,
            })
            .collect();

        let mut summary = SnapshotSummary {
            pursuers: world.creature_count(CreatureKind::Pursuer),
            foragers: world.creature_count(CreatureKind::Forager),
            ..Default::default()
        };
        for view in &snakes {
            match view.state {
                SnakeState::Dead => summary.dead += 1,
                SnakeState::Hunter => summary.hunters += 1,
                SnakeState::Starving => summary.starving += 1,
                SnakeState::Normal => {}
            }
        }
        summary.living_snakes = snakes.len() - summary.dead;

        Self {
            tick: world.current_tick,
            elapsed: now,
            width: world.config.world.width,
            height: world.config.world.height,
            snakes,
            food,
            effects,
            creatures,
            food_pool: world.food.stats(),
            summary,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
