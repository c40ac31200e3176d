//! Property tests for the simulation invariants

use std::collections::HashMap;

use proptest::prelude::*;

use snake_arena::core::config::{SimulationConfig, SnakeConfig, WorldConfig};
use snake_arena::core::types::{AgentId, Vec2};
use snake_arena::ecs::world::World;
use snake_arena::entity::food::{Food, FoodKind, FoodSpawn};
use snake_arena::entity::snake::{GrowthReason, Snake};
use snake_arena::simulation::environment::{apply_effects, expire_effects, EffectKind};
use snake_arena::simulation::pool::{ObjectPool, PoolHandle};
use snake_arena::simulation::tick::run_simulation_tick;

#[derive(Debug, Clone)]
enum BodyOp {
    Move(f32, f32),
    Grow(u32),
    Shrink(u32),
}

fn body_op() -> impl Strategy<Value = BodyOp> {
    prop_oneof![
        4 => (-1.0f32..1.0, -1.0f32..1.0).prop_map(|(x, y)| BodyOp::Move(x, y)),
        1 => (1u32..5).prop_map(BodyOp::Grow),
        1 => (1u32..5).prop_map(BodyOp::Shrink),
    ]
}

#[derive(Debug, Clone, Copy)]
enum ZoneOp {
    Enter(usize),
    Leave(usize),
    Expire(usize),
}

fn zone_op() -> impl Strategy<Value = ZoneOp> {
    prop_oneof![
        3 => (0usize..4).prop_map(ZoneOp::Enter),
        2 => (0usize..4).prop_map(ZoneOp::Leave),
        1 => (0usize..4).prop_map(ZoneOp::Expire),
    ]
}

#[derive(Debug, Clone)]
enum PoolOp {
    Acquire(f32, f32),
    Release(usize),
}

fn pool_op() -> impl Strategy<Value = PoolOp> {
    prop_oneof![
        (0.0f32..1000.0, 0.0f32..800.0).prop_map(|(x, y)| PoolOp::Acquire(x, y)),
        (0usize..16).prop_map(PoolOp::Release),
    ]
}

proptest! {
    #[test]
    fn proptest_segments_never_exceed_size(ops in proptest::collection::vec(body_op(), 1..80)) {
        let cfg = SnakeConfig::default();
        let world = WorldConfig::default();
        let mut snake = Snake::new(AgentId(1), Vec2::new(500.0, 400.0), 0.0, &cfg);

        for (i, op) in ops.into_iter().enumerate() {
            let now = i as f64 / 60.0;
            match op {
                BodyOp::Move(x, y) => {
                    snake.integrate(Vec2::new(x, y), &world, cfg.segment_radius, now);
                }
                BodyOp::Grow(n) => {
                    snake.grow(n, GrowthReason::GrowthFood, now, &cfg);
                }
                BodyOp::Shrink(n) => {
                    snake.shrink(n, 3, &cfg);
                }
            }
            prop_assert!(snake.segment_count() <= snake.size() as usize);
            prop_assert!(snake.size() >= 1);
        }
    }

    #[test]
    fn proptest_speed_zones_restore_exact_baseline(
        fast in proptest::collection::vec(any::<bool>(), 4),
        ops in proptest::collection::vec(zone_op(), 1..40),
    ) {
        let mut config = SimulationConfig::default();
        config.food.max_on_screen = 0;
        let mut world = World::new(config).unwrap();
        let home = Vec2::new(500.0, 400.0);
        let away = Vec2::new(50.0, 50.0);
        let id = world.spawn_snake_at(home);
        let baseline = world.snake(id).unwrap().max_speed();

        for &is_fast in &fast {
            let zone = EffectKind::speed_zone(&world.config.effects.speed_zone, is_fast);
            world.spawn_effect_at(away, zone);
        }
        let ids: Vec<_> = world.effects.iter().map(|e| e.id).collect();

        let mut events = Vec::new();
        for op in ops {
            let (ZoneOp::Enter(i) | ZoneOp::Leave(i) | ZoneOp::Expire(i)) = op;
            if let Some(effect) = world.effects.iter_mut().find(|e| e.id == ids[i]) {
                match op {
                    ZoneOp::Enter(_) => effect.position = home,
                    ZoneOp::Leave(_) => effect.position = away,
                    ZoneOp::Expire(_) => effect.created_at = -1000.0,
                }
            }
            expire_effects(&mut world, &mut events);
            apply_effects(&mut world, &mut events);
        }

        for effect in world.effects.iter_mut() {
            effect.position = away;
        }
        apply_effects(&mut world, &mut events);

        let snake = world.snake(id).unwrap();
        prop_assert!(snake.modifiers().is_empty());
        prop_assert_eq!(snake.max_speed(), baseline);
    }

    #[test]
    fn proptest_pool_reuse_never_leaks_state(ops in proptest::collection::vec(pool_op(), 1..60)) {
        let mut pool: ObjectPool<Food> = ObjectPool::with_prefill(4);
        let mut live: Vec<PoolHandle> = Vec::new();
        let mut released: Vec<PoolHandle> = Vec::new();

        for op in ops {
            match op {
                PoolOp::Acquire(x, y) => {
                    let spawn = FoodSpawn {
                        position: Vec2::new(x, y),
                        kind: FoodKind::Normal,
                        radius: 7.0,
                    };
                    let handle = pool.acquire(spawn);
                    prop_assert_eq!(pool.get(handle), Some(&Food::new(spawn)));
                    live.push(handle);
                }
                PoolOp::Release(i) if !live.is_empty() => {
                    let handle = live.remove(i % live.len());
                    if let Some(item) = pool.get_mut(handle) {
                        item.kind = FoodKind::Shrink;
                    }
                    prop_assert!(pool.release(handle));
                    prop_assert!(!pool.release(handle));
                    released.push(handle);
                }
                PoolOp::Release(_) => {}
            }
            prop_assert_eq!(pool.active_count(), live.len());
            for handle in &released {
                prop_assert!(pool.get(*handle).is_none());
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(6))]

    #[test]
    fn proptest_dead_snakes_stay_frozen(seed in any::<u64>()) {
        let mut config = SimulationConfig::default();
        config.world.seed = seed;
        config.snake.initial_snakes = 10;
        config.starvation.warning_seconds = 1.0;
        config.starvation.death_seconds = 2.0;
        config.food.max_on_screen = 0;
        let mut world = World::new(config).unwrap();

        let mut frozen: HashMap<AgentId, (u32, u32, Vec<Vec2>)> = HashMap::new();
        for _ in 0..300 {
            run_simulation_tick(&mut world);
            for snake in world.snakes.iter().filter(|s| s.is_dead()) {
                let state = (snake.size(), snake.food_eaten(), snake.segments().collect::<Vec<_>>());
                match frozen.get(&snake.id) {
                    Some(before) => prop_assert_eq!(before, &state),
                    None => {
                        frozen.insert(snake.id, state);
                    }
                }
            }
        }
        prop_assert!(!frozen.is_empty());
    }
}
