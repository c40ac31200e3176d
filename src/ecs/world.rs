//! Simulation world - owns every entity collection for the arena

use ahash::AHashMap;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::{SimulationConfig, WorldConfig};
use crate::core::error::Result;
use crate::core::types::{AgentId, CreatureId, EffectId, SimTime, Tick, Vec2};
use crate::ecs::snapshot::WorldSnapshot;
use crate::entity::creature::{Creature, CreatureKind};
use crate::entity::food::{Food, FoodKind, FoodSpawn};
use crate::entity::snake::Snake;
use crate::simulation::environment::{EffectKind, EnvironmentalEffect};
use crate::simulation::pool::{ObjectPool, PoolHandle};
use crate::simulation::steering::SteeringAdvisor;
use crate::spatial::index::SpatialIndex;

/// Clock readings for every periodic policy
#[derive(Debug, Clone, Default)]
pub struct SpawnTimers {
    pub last_food_spawn: SimTime,
    pub last_snake_spawn: SimTime,
    /// Redrawn from the configured range after every snake spawn
    pub snake_spawn_interval: f64,
    pub last_cleanup: SimTime,
    pub last_pull_field: SimTime,
    pub last_speed_zone: SimTime,
    pub last_attraction_field: SimTime,
    pub last_pursuer: SimTime,
    pub last_forager: SimTime,
}

/// The arena and everything in it
///
/// Every phase of a tick takes `&mut World` exclusively. Snakes are stored
/// by slot; slots shift only when dead snakes are purged, and the id map is
/// rebuilt whenever that happens.
pub struct World {
    pub config: SimulationConfig,
    pub rng: ChaCha8Rng,
    pub current_tick: Tick,
    /// Simulation seconds since creation
    pub elapsed: SimTime,
    pub snakes: Vec<Snake>,
    agent_slots: AHashMap<AgentId, usize>,
    /// Active food is exactly the pool's active set
    pub food: ObjectPool<Food>,
    pub effects: Vec<EnvironmentalEffect>,
    pub creatures: Vec<Creature>,
    pub spatial: SpatialIndex,
    pub timers: SpawnTimers,
    next_agent: u32,
    next_effect: u32,
    next_creature: u32,
    advisor: Option<Box<dyn SteeringAdvisor>>,
}

impl World {
    /// Build a world, seeding initial food and snakes
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let mut world = Self {
            rng: ChaCha8Rng::seed_from_u64(config.world.seed),
            current_tick: 0,
            elapsed: 0.0,
            snakes: Vec::new(),
            agent_slots: AHashMap::new(),
            food: ObjectPool::with_prefill(config.food.pool_prefill),
            effects: Vec::new(),
            creatures: Vec::new(),
            spatial: SpatialIndex::new(&config.world),
            timers: SpawnTimers::default(),
            next_agent: 1,
            next_effect: 1,
            next_creature: 1,
            advisor: None,
            config,
        };
        world.timers.snake_spawn_interval = world.draw_snake_interval();

        for _ in 0..world.config.food.max_on_screen {
            world.spawn_food_random();
        }
        for _ in 0..world.config.snake.initial_snakes {
            world.spawn_snake_random();
        }

        tracing::info!(
            width = world.config.world.width,
            height = world.config.world.height,
            food = world.food.active_count(),
            snakes = world.snakes.len(),
            "World created"
        );
        Ok(world)
    }

    // === SNAKES ===

    /// Spawn a snake with its head at `pos`, at rest
    pub fn spawn_snake_at(&mut self, pos: Vec2) -> AgentId {
        let id = AgentId(self.next_agent);
        self.next_agent += 1;

        let snake = Snake::new(id, pos, self.elapsed, &self.config.snake);
        self.agent_slots.insert(id, self.snakes.len());
        self.snakes.push(snake);

        tracing::info!(agent = id.0, x = pos.x, y = pos.y, "Snake spawned");
        id
    }

    /// Spawn a snake at a random interior point with a random heading
    pub fn spawn_snake_random(&mut self) -> AgentId {
        let margin = self.config.snake.spawn_margin;
        let pos = random_point(&mut self.rng, &self.config.world, margin);
        let heading = Vec2::new(self.rng.gen_range(-1.0..=1.0), self.rng.gen_range(-1.0..=1.0));

        let id = self.spawn_snake_at(pos);
        if heading.length_squared() > 0.0 {
            let accel = self.config.snake.base_acceleration;
            if let Some(snake) = self.snake_mut(id) {
                snake.set_velocity(heading.normalize() * accel);
            }
        }
        id
    }

    pub fn snake(&self, id: AgentId) -> Option<&Snake> {
        self.agent_slots.get(&id).and_then(|&slot| self.snakes.get(slot))
    }

    pub fn snake_mut(&mut self, id: AgentId) -> Option<&mut Snake> {
        let slot = *self.agent_slots.get(&id)?;
        self.snakes.get_mut(slot)
    }

    pub fn snake_slot(&self, id: AgentId) -> Option<usize> {
        self.agent_slots.get(&id).copied()
    }

    pub fn living_snakes(&self) -> impl Iterator<Item = &Snake> + '_ {
        self.snakes.iter().filter(|s| s.is_alive())
    }

    /// Remove snakes dead for at least `delay` seconds; returns their ids
    pub fn purge_dead_snakes(&mut self, delay: f64) -> Vec<AgentId> {
        let now = self.elapsed;
        let mut purged = Vec::new();
        self.snakes.retain(|snake| match snake.death() {
            Some(death) if now - death.time >= delay => {
                purged.push(snake.id);
                false
            }
            _ => true,
        });

        if !purged.is_empty() {
            self.reindex_agents();
        }
        purged
    }

    fn reindex_agents(&mut self) {
        self.agent_slots.clear();
        for (slot, snake) in self.snakes.iter().enumerate() {
            self.agent_slots.insert(snake.id, slot);
        }
    }

    pub(crate) fn draw_snake_interval(&mut self) -> f64 {
        let cfg = &self.config.snake;
        if cfg.spawn_interval_max > cfg.spawn_interval_min {
            self.rng.gen_range(cfg.spawn_interval_min..=cfg.spawn_interval_max)
        } else {
            cfg.spawn_interval_min
        }
    }

    // === FOOD ===

    pub fn spawn_food_at(&mut self, pos: Vec2, kind: FoodKind) -> PoolHandle {
        self.food.acquire(FoodSpawn {
            position: pos,
            kind,
            radius: self.config.food.radius,
        })
    }

    /// Spawn food of a randomly rolled kind anywhere inside the arena
    pub fn spawn_food_random(&mut self) -> PoolHandle {
        let radius = self.config.food.radius;
        let pos = random_point(&mut self.rng, &self.config.world, radius);
        let kind = FoodKind::roll(&mut self.rng, &self.config.food.special);
        self.spawn_food_at(pos, kind)
    }

    // === EFFECTS ===

    pub fn spawn_effect_at(&mut self, pos: Vec2, kind: EffectKind) -> EffectId {
        let id = EffectId(self.next_effect);
        self.next_effect += 1;

        let lifetime = kind.lifetime(&self.config.effects);
        self.effects.push(EnvironmentalEffect {
            id,
            kind,
            position: pos,
            created_at: self.elapsed,
            lifetime,
        });
        tracing::info!(effect = id.0, kind = %kind.tag(), x = pos.x, y = pos.y, "Effect spawned");
        id
    }

    pub fn effect(&self, id: EffectId) -> Option<&EnvironmentalEffect> {
        self.effects.iter().find(|e| e.id == id)
    }

    // === CREATURES ===

    pub fn spawn_creature_at(&mut self, pos: Vec2, kind: CreatureKind) -> CreatureId {
        let id = CreatureId(self.next_creature);
        self.next_creature += 1;

        let motion = match kind {
            CreatureKind::Pursuer => &self.config.creatures.pursuer.motion,
            CreatureKind::Forager => &self.config.creatures.forager.motion,
        };
        let creature = Creature::new(id, kind, pos, self.elapsed, motion, &self.config.snake);
        self.creatures.push(creature);

        tracing::info!(creature = id.0, %kind, x = pos.x, y = pos.y, "Creature spawned");
        id
    }

    pub fn creature(&self, id: CreatureId) -> Option<&Creature> {
        self.creatures.iter().find(|c| c.id == id)
    }

    pub fn creature_mut(&mut self, id: CreatureId) -> Option<&mut Creature> {
        self.creatures.iter_mut().find(|c| c.id == id)
    }

    pub fn creature_count(&self, kind: CreatureKind) -> usize {
        self.creatures
            .iter()
            .filter(|c| c.kind == kind && c.is_alive())
            .count()
    }

    // === STEERING ===

    pub fn set_steering_advisor(&mut self, advisor: Box<dyn SteeringAdvisor>) {
        self.advisor = Some(advisor);
    }

    pub fn clear_steering_advisor(&mut self) -> Option<Box<dyn SteeringAdvisor>> {
        self.advisor.take()
    }

    pub fn has_steering_advisor(&self) -> bool {
        self.advisor.is_some()
    }

    // === CLOCK ===

    /// Advance the clock by one tick
    pub fn tick(&mut self) {
        self.current_tick += 1;
        self.elapsed += self.config.world.tick_seconds;
    }

    pub fn rebuild_spatial(&mut self) {
        self.spatial.rebuild(&self.snakes, &self.food);
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(self)
    }
}

/// Uniform point inside the arena, `margin` away from every edge
///
/// Margins too large for the arena collapse to its center line.
pub fn random_point<R: Rng>(rng: &mut R, world: &WorldConfig, margin: f32) -> Vec2 {
    let axis = |rng: &mut R, extent: f32| {
        let lo = margin.max(0.0);
        let hi = extent - lo;
        if hi > lo {
            rng.gen_range(lo..=hi)
        } else {
            extent / 2.0
        }
    };
    let x = axis(rng, world.width);
    let y = axis(rng, world.height);
    Vec2::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::snake::DeathReason;

    fn quiet_config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.food.max_on_screen = 0;
        config
    }

    #[test]
    fn test_new_world_prefills_food() {
        let world = World::new(SimulationConfig::default()).unwrap();
        assert_eq!(world.food.active_count(), 15);
        assert_eq!(world.food.stats().created, 20);
        assert!(world.snakes.is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = SimulationConfig::default();
        config.world.width = -1.0;
        assert!(World::new(config).is_err());
    }

    #[test]
    fn test_spawn_and_lookup_snake() {
        let mut world = World::new(quiet_config()).unwrap();
        let a = world.spawn_snake_at(Vec2::new(100.0, 100.0));
        let b = world.spawn_snake_at(Vec2::new(200.0, 200.0));
        assert_ne!(a, b);
        assert_eq!(world.snake(b).map(|s| s.head()), Some(Vec2::new(200.0, 200.0)));
        assert_eq!(world.snake_slot(a), Some(0));
    }

    #[test]
    fn test_purge_reindexes_survivors() {
        let mut world = World::new(quiet_config()).unwrap();
        let a = world.spawn_snake_at(Vec2::new(100.0, 100.0));
        let b = world.spawn_snake_at(Vec2::new(200.0, 200.0));
        world.snake_mut(a).unwrap().die(DeathReason::Starvation, 0.0);
        world.elapsed = 3.5;

        assert_eq!(world.purge_dead_snakes(3.0), vec![a]);
        assert!(world.snake(a).is_none());
        assert_eq!(world.snake_slot(b), Some(0));
    }

    #[test]
    fn test_purge_waits_for_delay() {
        let mut world = World::new(quiet_config()).unwrap();
        let a = world.spawn_snake_at(Vec2::new(100.0, 100.0));
        world.snake_mut(a).unwrap().die(DeathReason::HitWall, 0.0);
        world.elapsed = 1.0;
        assert!(world.purge_dead_snakes(3.0).is_empty());
        assert!(world.snake(a).is_some());
    }

    #[test]
    fn test_random_point_respects_margin() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let world = WorldConfig::default();
        for _ in 0..100 {
            let p = random_point(&mut rng, &world, 100.0);
            assert!((100.0..=900.0).contains(&p.x));
            assert!((100.0..=700.0).contains(&p.y));
        }
        let center = random_point(&mut rng, &world, 600.0);
        assert_eq!(center.x, 500.0);
    }

    #[test]
    fn test_clock_advances_by_tick_seconds() {
        let mut world = World::new(quiet_config()).unwrap();
        for _ in 0..60 {
            world.tick();
        }
        assert_eq!(world.current_tick, 60);
        assert!((world.elapsed - 1.0).abs() < 1e-9);
    }
}
