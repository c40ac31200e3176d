//! Eating and predation, resolved after every snake has moved

use crate::ecs::world::World;
use crate::entity::food::{FoodKind, FoodPayload};
use crate::entity::modifiers::{Modifier, ModifierSource};
use crate::entity::snake::{DeathReason, GrowthReason};
use crate::simulation::tick::{Attacker, ModifierTarget, SimulationEvent};

/// Every live snake eats every food item its head touches
///
/// Snakes are visited in slot order, so when two heads reach the same item
/// the lower slot gets it.
pub fn resolve_food_collisions(world: &mut World, events: &mut Vec<SimulationEvent>) {
    let segment_radius = world.config.snake.segment_radius;
    let reach = segment_radius + world.config.food.radius;

    for slot in 0..world.snakes.len() {
        if world.snakes[slot].is_dead() {
            continue;
        }
        let head = world.snakes[slot].head();

        for handle in world.spatial.nearby_food(head, reach) {
            let Some(item) = world.food.get(handle) else {
                continue;
            };
            if head.distance(item.position) >= segment_radius + item.radius {
                continue;
            }
            let (kind, position) = (item.kind, item.position);
            world.food.release(handle);

            events.push(SimulationEvent::FoodConsumed {
                agent: world.snakes[slot].id,
                kind,
                position,
            });
            consume(world, slot, kind, events);
        }
    }
}

/// Basic meal plus the food's payload
fn consume(world: &mut World, slot: usize, kind: FoodKind, events: &mut Vec<SimulationEvent>) {
    let now = world.elapsed;
    let snake_cfg = &world.config.snake;
    let snake = &mut world.snakes[slot];
    let agent = snake.id;

    if let Some(growth) = snake.grow(1, GrowthReason::AteFood, now, snake_cfg) {
        events.push(SimulationEvent::Growth {
            agent,
            from: growth.from,
            to: growth.to,
            reason: GrowthReason::AteFood,
        });
        if growth.became_hunter {
            tracing::info!(agent = agent.0, food_eaten = snake.food_eaten(), "Snake became hunter");
            events.push(SimulationEvent::BecameHunter {
                agent,
                food_eaten: snake.food_eaten(),
            });
        }
    }

    match kind.payload(&world.config.food.special) {
        FoodPayload::None => {}
        FoodPayload::Timed { kind: effect, duration } => {
            let modifier = Modifier {
                source: ModifierSource::Food(kind),
                kind: effect,
                expires_at: Some(now + duration),
            };
            if snake.apply_modifier(modifier) {
                tracing::debug!(agent = agent.0, effect = effect.label(), duration, "Food effect applied");
                events.push(SimulationEvent::ModifierApplied {
                    target: ModifierTarget::Snake(agent),
                    modifier,
                });
            }
        }
        FoodPayload::Grow(amount) => {
            if let Some(growth) = snake.grow(amount, GrowthReason::GrowthFood, now, snake_cfg) {
                events.push(SimulationEvent::Growth {
                    agent,
                    from: growth.from,
                    to: growth.to,
                    reason: GrowthReason::GrowthFood,
                });
            }
        }
        FoodPayload::Shrink { amount, min_size } => {
            if let Some((from, to)) = snake.shrink(amount, min_size, snake_cfg) {
                events.push(SimulationEvent::Shrunk { agent, from, to });
            }
        }
    }
}

/// Hunters eat smaller snakes they touch, at most one each per tick
pub fn resolve_predation(world: &mut World, events: &mut Vec<SimulationEvent>) {
    let now = world.elapsed;
    let strike = world.config.snake.strike_distance;
    let margin = world.config.snake.fear_margin;

    for attacker_slot in 0..world.snakes.len() {
        let attacker = &world.snakes[attacker_slot];
        if attacker.is_dead() || !attacker.is_hunter() {
            continue;
        }
        let head = attacker.head();
        let attacker_size = attacker.size();

        let victim_slot = world
            .spatial
            .nearby_snakes(head, strike)
            .into_iter()
            .filter(|&slot| slot != attacker_slot)
            .find(|&slot| {
                let victim = &world.snakes[slot];
                victim.is_alive()
                    && !victim.is_immune()
                    && victim.size() + margin < attacker_size
                    && victim.segments().any(|segment| segment.distance(head) < strike)
            });
        let Some(victim_slot) = victim_slot else {
            continue;
        };

        let victim = &mut world.snakes[victim_slot];
        let victim_id = victim.id;
        let victim_size = victim.size();
        victim.die(DeathReason::EatenByHunter, now);

        let attacker = &mut world.snakes[attacker_slot];
        let attacker_id = attacker.id;
        events.push(SimulationEvent::Kill {
            attacker: Attacker::Snake(attacker_id),
            victim: victim_id,
        });
        events.push(SimulationEvent::Death {
            agent: victim_id,
            reason: DeathReason::EatenByHunter,
            size: victim_size,
            time: now,
        });

        let gain = (victim_size / 3).max(1);
        if let Some(growth) = attacker.grow(gain, GrowthReason::AteSnake, now, &world.config.snake) {
            events.push(SimulationEvent::Growth {
                agent: attacker_id,
                from: growth.from,
                to: growth.to,
                reason: GrowthReason::AteSnake,
            });
        }
    }
}
