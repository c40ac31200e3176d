//! Creature controllers and population policy
//!
//! Pursuers chase hunter snakes and kill them on contact. Foragers race the
//! snakes to food. Both re-resolve their weak target handle every tick and
//! search again on their retarget interval or as soon as the handle goes
//! stale.

use ordered_float::OrderedFloat;

use crate::core::config::CreatureMotion;
use crate::core::types::{SimTime, Vec2};
use crate::ecs::world::{random_point, World};
use crate::entity::creature::{CreatureExit, CreatureKind, CreatureTarget};
use crate::entity::snake::DeathReason;
use crate::simulation::tick::{Attacker, SimulationEvent};

fn motion_for(world: &World, kind: CreatureKind) -> CreatureMotion {
    match kind {
        CreatureKind::Pursuer => world.config.creatures.pursuer.motion.clone(),
        CreatureKind::Forager => world.config.creatures.forager.motion.clone(),
    }
}

/// Move every live creature and resolve its contacts
pub fn update_creatures(world: &mut World, events: &mut Vec<SimulationEvent>) {
    let now = world.elapsed;

    for slot in 0..world.creatures.len() {
        if !world.creatures[slot].is_alive() {
            continue;
        }
        let kind = world.creatures[slot].kind;
        let motion = motion_for(world, kind);

        let goal = current_goal(world, slot, now, &motion);
        let creature = &mut world.creatures[slot];
        match goal {
            Some(goal) => creature.chase(goal),
            None => creature.patrol(&mut world.rng, &motion),
        }

        if creature.apply_boundary(&world.config.world) {
            tracing::info!(creature = creature.id.0, %kind, "Creature hit wall");
            events.push(SimulationEvent::CreatureDespawned {
                creature: creature.id,
                kind,
                reason: CreatureExit::HitWall,
            });
            continue;
        }

        match kind {
            CreatureKind::Pursuer => pursuer_contacts(world, slot, &motion, events),
            CreatureKind::Forager => forager_contacts(world, slot, &motion, events),
        }
    }
}

/// Where the creature is heading this tick, refreshing its target if needed
fn current_goal(world: &mut World, slot: usize, now: SimTime, motion: &CreatureMotion) -> Option<Vec2> {
    let creature = &world.creatures[slot];
    let resolved = creature.target.and_then(|target| resolve(world, target));
    if resolved.is_some() && !creature.retarget_due(now, motion.retarget_interval) {
        return resolved;
    }

    let position = creature.position;
    let found = match creature.kind {
        CreatureKind::Pursuer => nearest_hunter(world, position, motion.detection_radius),
        CreatureKind::Forager => nearest_food(world, position, motion.detection_radius),
    };

    let creature = &mut world.creatures[slot];
    creature.last_retarget = now;
    creature.target = found.map(|(target, _)| target);
    found.map(|(_, goal)| goal)
}

/// Position of a target that is still a legal one
fn resolve(world: &World, target: CreatureTarget) -> Option<Vec2> {
    match target {
        CreatureTarget::Agent(id) => world
            .snake(id)
            .filter(|s| s.is_alive() && s.is_hunter() && !s.is_immune())
            .map(|s| s.head()),
        CreatureTarget::Food(handle) => world.food.get(handle).map(|f| f.position),
    }
}

fn nearest_hunter(world: &World, pos: Vec2, radius: f32) -> Option<(CreatureTarget, Vec2)> {
    world
        .spatial
        .nearby_heads(pos, radius)
        .into_iter()
        .map(|slot| &world.snakes[slot])
        .filter(|s| s.is_alive() && s.is_hunter() && !s.is_immune())
        .map(|s| (CreatureTarget::Agent(s.id), s.head()))
        .filter(|(_, head)| head.distance(pos) < radius)
        .min_by_key(|(_, head)| OrderedFloat(head.distance(pos)))
}

fn nearest_food(world: &World, pos: Vec2, radius: f32) -> Option<(CreatureTarget, Vec2)> {
    world
        .spatial
        .nearby_food(pos, radius)
        .into_iter()
        .filter_map(|handle| world.food.get(handle).map(|f| (CreatureTarget::Food(handle), f.position)))
        .filter(|(_, food)| food.distance(pos) < radius)
        .min_by_key(|(_, food)| OrderedFloat(food.distance(pos)))
}

/// Kill every eligible hunter whose head is within contact range
fn pursuer_contacts(
    world: &mut World,
    slot: usize,
    motion: &CreatureMotion,
    events: &mut Vec<SimulationEvent>,
) {
    let now = world.elapsed;
    let creature = &world.creatures[slot];
    let (creature_id, position) = (creature.id, creature.position);

    for snake_slot in world.spatial.nearby_heads(position, motion.contact_radius) {
        let snake = &mut world.snakes[snake_slot];
        if !snake.is_hunter() || snake.is_immune() {
            continue;
        }
        if snake.head().distance(position) >= motion.contact_radius {
            continue;
        }
        if !snake.die(DeathReason::KilledByPursuer, now) {
            continue;
        }
        events.push(SimulationEvent::Kill {
            attacker: Attacker::Creature(creature_id),
            victim: snake.id,
        });
        events.push(SimulationEvent::Death {
            agent: snake.id,
            reason: DeathReason::KilledByPursuer,
            size: snake.size(),
            time: now,
        });
    }
}

/// Eat food in range until satiated
fn forager_contacts(
    world: &mut World,
    slot: usize,
    motion: &CreatureMotion,
    events: &mut Vec<SimulationEvent>,
) {
    let limit = world.config.creatures.forager.satiation_limit;
    let position = world.creatures[slot].position;

    for handle in world.spatial.nearby_food(position, motion.contact_radius) {
        let Some(item) = world.food.get(handle) else {
            continue;
        };
        if item.position.distance(position) >= motion.contact_radius {
            continue;
        }
        let (kind, food_position) = (item.kind, item.position);
        world.food.release(handle);

        let creature = &mut world.creatures[slot];
        events.push(SimulationEvent::FoodStolen {
            creature: creature.id,
            kind,
            position: food_position,
        });
        tracing::debug!(creature = creature.id.0, meals = creature.meals() + 1, "Forager stole food");

        if creature.eat() >= limit && creature.leave(CreatureExit::Satiated) {
            tracing::info!(creature = creature.id.0, "Forager satiated and left");
            events.push(SimulationEvent::CreatureDespawned {
                creature: creature.id,
                kind: creature.kind,
                reason: CreatureExit::Satiated,
            });
            break;
        }
    }
}

/// Spawn and retire creatures from the current population signals, then
/// drop every creature that left this tick
pub fn update_population(world: &mut World, events: &mut Vec<SimulationEvent>) {
    let now = world.elapsed;

    if world.config.creatures.pursuer.enabled {
        let living = world.living_snakes().count();
        let hunters = world.living_snakes().filter(|s| s.is_hunter()).count();
        let fraction = if living > 0 {
            hunters as f32 / living as f32
        } else {
            0.0
        };

        let cfg = world.config.creatures.pursuer.clone();
        if fraction >= cfg.hunter_fraction_threshold
            && world.creature_count(CreatureKind::Pursuer) < cfg.max_concurrent
            && now - world.timers.last_pursuer > cfg.spawn_interval
        {
            spawn_creature(world, CreatureKind::Pursuer, events);
            world.timers.last_pursuer = now;
        }

        let declined = fraction < cfg.hunter_fraction_threshold * cfg.despawn_fraction_factor;
        retire(world, CreatureKind::Pursuer, declined, cfg.despawn_delay, events);
    }

    if world.config.creatures.forager.enabled {
        let food = world.food.active_count();
        let cfg = world.config.creatures.forager.clone();
        if food >= cfg.food_abundance_threshold
            && world.creature_count(CreatureKind::Forager) < cfg.max_concurrent
            && now - world.timers.last_forager > cfg.spawn_interval
        {
            spawn_creature(world, CreatureKind::Forager, events);
            world.timers.last_forager = now;
        }

        let scarce = (food as f32) < cfg.food_abundance_threshold as f32 * cfg.despawn_fraction_factor;
        retire(world, CreatureKind::Forager, scarce, cfg.despawn_delay, events);
    }

    let before = world.creatures.len();
    world.creatures.retain(|c| c.is_alive());
    if world.creatures.len() != before {
        tracing::debug!(removed = before - world.creatures.len(), "Creatures removed");
    }
}

fn spawn_creature(world: &mut World, kind: CreatureKind, events: &mut Vec<SimulationEvent>) {
    let margin = world.config.creatures.spawn_margin;
    let position = random_point(&mut world.rng, &world.config.world, margin);
    let creature = world.spawn_creature_at(position, kind);
    events.push(SimulationEvent::CreatureSpawned {
        creature,
        kind,
        position,
    });
}

/// Run the despawn timers of one creature kind
///
/// While the trigger is reversed each creature counts down from the first
/// tick it saw the reversal; a recovery clears every timer.
fn retire(
    world: &mut World,
    kind: CreatureKind,
    reversed: bool,
    delay: f64,
    events: &mut Vec<SimulationEvent>,
) {
    let now = world.elapsed;
    for creature in world.creatures.iter_mut().filter(|c| c.kind == kind && c.is_alive()) {
        if !reversed {
            creature.despawn_since = None;
            continue;
        }
        match creature.despawn_since {
            None => creature.despawn_since = Some(now),
            Some(since) if now - since > delay => {
                if creature.leave(CreatureExit::PopulationDeclined) {
                    tracing::info!(creature = creature.id.0, %kind, "Creature left, population declined");
                    events.push(SimulationEvent::CreatureDespawned {
                        creature: creature.id,
                        kind,
                        reason: CreatureExit::PopulationDeclined,
                    });
                }
            }
            Some(_) => {}
        }
    }
}
