//! Population upkeep: food refill, snake spawning, dead snake purge

use crate::ecs::world::World;
use crate::simulation::tick::SimulationEvent;

/// Top food back up toward the cap, one batch per spawn interval
pub fn refill_food(world: &mut World) {
    let now = world.elapsed;
    let cfg = &world.config.food;
    let active = world.food.active_count();
    if active >= cfg.max_on_screen || now - world.timers.last_food_spawn <= cfg.spawn_interval {
        return;
    }

    let batch = cfg.spawn_batch.min(cfg.max_on_screen - active);
    for _ in 0..batch {
        world.spawn_food_random();
    }
    world.timers.last_food_spawn = now;
    tracing::debug!(spawned = batch, total = world.food.active_count(), "Food refilled");
}

/// Spawn one snake once the current spawn interval has passed
///
/// Dead snakes still occupy a place until they are purged. The next interval
/// is drawn fresh after each spawn.
pub fn spawn_snakes(world: &mut World, events: &mut Vec<SimulationEvent>) {
    let now = world.elapsed;
    if world.snakes.len() >= world.config.snake.max_snakes
        || now - world.timers.last_snake_spawn <= world.timers.snake_spawn_interval
    {
        return;
    }

    let agent = world.spawn_snake_random();
    world.timers.last_snake_spawn = now;
    world.timers.snake_spawn_interval = world.draw_snake_interval();

    if let Some(snake) = world.snake(agent) {
        events.push(SimulationEvent::SnakeSpawned {
            agent,
            position: snake.head(),
        });
    }
}

/// Drop snakes that have been dead long enough, once per cleanup interval
pub fn purge_dead(world: &mut World) {
    let now = world.elapsed;
    if now - world.timers.last_cleanup <= world.config.snake.cleanup_interval {
        return;
    }
    world.timers.last_cleanup = now;

    let purged = world.purge_dead_snakes(world.config.snake.dead_purge_delay);
    if !purged.is_empty() {
        tracing::debug!(count = purged.len(), remaining = world.snakes.len(), "Purged dead snakes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::core::types::Vec2;
    use crate::entity::snake::DeathReason;

    fn world_with(max_food: usize, max_snakes: usize) -> World {
        let mut config = SimulationConfig::default();
        config.food.max_on_screen = max_food;
        config.snake.max_snakes = max_snakes;
        World::new(config).unwrap()
    }

    #[test]
    fn test_refill_waits_for_interval() {
        let mut world = world_with(15, 0);
        for handle in world.food.handles().into_iter().take(8) {
            world.food.release(handle);
        }
        world.elapsed = 0.4;
        refill_food(&mut world);
        assert_eq!(world.food.active_count(), 7);

        world.elapsed = 0.6;
        refill_food(&mut world);
        assert_eq!(world.food.active_count(), 12);
        assert_eq!(world.timers.last_food_spawn, 0.6);
    }

    #[test]
    fn test_refill_never_exceeds_cap() {
        let mut world = world_with(15, 0);
        let handle = world.food.handles()[0];
        world.food.release(handle);
        world.elapsed = 1.0;
        refill_food(&mut world);
        assert_eq!(world.food.active_count(), 15);
    }

    #[test]
    fn test_snake_spawn_respects_interval_and_cap() {
        let mut world = world_with(0, 2);
        let mut events = Vec::new();

        world.elapsed = 1.0;
        spawn_snakes(&mut world, &mut events);
        assert!(world.snakes.is_empty());

        world.elapsed = 2.5;
        spawn_snakes(&mut world, &mut events);
        assert_eq!(world.snakes.len(), 1);
        assert!(matches!(events[0], SimulationEvent::SnakeSpawned { .. }));

        world.elapsed = 5.0;
        spawn_snakes(&mut world, &mut events);
        world.elapsed = 8.0;
        spawn_snakes(&mut world, &mut events);
        assert_eq!(world.snakes.len(), 2);
    }

    #[test]
    fn test_spawned_snake_keeps_away_from_edges() {
        let mut world = world_with(0, 1);
        world.elapsed = 3.0;
        spawn_snakes(&mut world, &mut Vec::new());
        let head = world.snakes[0].head();
        assert!((100.0..=900.0).contains(&head.x));
        assert!((100.0..=700.0).contains(&head.y));
        assert!(world.snakes[0].velocity().length() > 0.0);
    }

    #[test]
    fn test_purge_after_delay() {
        let mut world = world_with(0, 0);
        let dead = world.spawn_snake_at(Vec2::new(300.0, 300.0));
        let alive = world.spawn_snake_at(Vec2::new(500.0, 300.0));
        world.snake_mut(dead).unwrap().die(DeathReason::Starvation, 4.0);

        // Cleanup runs, but the body has only been dead 1.5 s
        world.elapsed = 5.5;
        purge_dead(&mut world);
        assert!(world.snake(dead).is_some());
        assert_eq!(world.timers.last_cleanup, 5.5);

        // Not due yet
        world.elapsed = 9.0;
        purge_dead(&mut world);
        assert!(world.snake(dead).is_some());

        world.elapsed = 10.6;
        purge_dead(&mut world);
        assert!(world.snake(dead).is_none());
        assert!(world.snake(alive).is_some());
    }
}
