//! Tick system - orchestrates simulation updates
//!
//! One call to [`run_simulation_tick`] runs every phase to completion:
//! clock -> index -> planning -> movement -> collisions -> creatures ->
//! effects -> lifecycle -> population.
//!
//! No phase can fail. Degraded inputs (advisor errors, impossible
//! placements) are logged and the tick carries on.

use serde::Serialize;

use crate::core::types::{AgentId, CreatureId, EffectId, SimTime, Tick, Vec2};
use crate::ecs::world::World;
use crate::entity::creature::{CreatureExit, CreatureKind};
use crate::entity::food::FoodKind;
use crate::entity::modifiers::Modifier;
use crate::entity::snake::{DeathReason, GrowthReason, MoveOutcome, SnakeState};
use crate::simulation::behavior::{plan, Drive, PlannerContext, SteeringPlan};
use crate::simulation::environment::EffectTag;
use crate::simulation::steering::{consult, AxisDirection, SteeringFeatures};
use crate::simulation::{collision, creatures, environment, lifecycle, population};

/// Entity a modifier was installed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierTarget {
    Snake(AgentId),
    Creature(CreatureId),
}

/// Who made a kill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Attacker {
    Snake(AgentId),
    Creature(CreatureId),
}

/// Events generated during a simulation tick
///
/// Returned by `run_simulation_tick` for telemetry consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimulationEvent {
    /// Final steering choice for a live snake
    MoveDecision {
        agent: AgentId,
        state: SnakeState,
        drive: Drive,
        direction: Vec2,
        /// Axis label of the direction, as the advisor would name it
        label: Option<AxisDirection>,
    },
    SnakeSpawned {
        agent: AgentId,
        position: Vec2,
    },
    Growth {
        agent: AgentId,
        from: u32,
        to: u32,
        reason: GrowthReason,
    },
    Shrunk {
        agent: AgentId,
        from: u32,
        to: u32,
    },
    BecameHunter {
        agent: AgentId,
        food_eaten: u32,
    },
    FoodConsumed {
        agent: AgentId,
        kind: FoodKind,
        position: Vec2,
    },
    /// A forager ate food before any snake did
    FoodStolen {
        creature: CreatureId,
        kind: FoodKind,
        position: Vec2,
    },
    Death {
        agent: AgentId,
        reason: DeathReason,
        size: u32,
        time: SimTime,
    },
    Kill {
        attacker: Attacker,
        victim: AgentId,
    },
    ModifierApplied {
        target: ModifierTarget,
        modifier: Modifier,
    },
    ModifierExpired {
        target: ModifierTarget,
        modifier: Modifier,
    },
    EffectSpawned {
        effect: EffectId,
        kind: EffectTag,
        position: Vec2,
    },
    EffectExpired {
        effect: EffectId,
        kind: EffectTag,
    },
    CreatureSpawned {
        creature: CreatureId,
        kind: CreatureKind,
        position: Vec2,
    },
    CreatureDespawned {
        creature: CreatureId,
        kind: CreatureKind,
        reason: CreatureExit,
    },
}

/// Run a single simulation tick
pub fn run_simulation_tick(world: &mut World) -> Vec<SimulationEvent> {
    let mut events = Vec::new();

    world.tick();
    world.rebuild_spatial();

    let plans = plan_snakes(world);
    move_snakes(world, &plans, &mut events);

    world.rebuild_spatial();
    collision::resolve_food_collisions(world, &mut events);
    collision::resolve_predation(world, &mut events);

    creatures::update_creatures(world, &mut events);

    environment::expire_effects(world, &mut events);
    environment::apply_effects(world, &mut events);
    environment::spawn_effects(world, &mut events);

    lifecycle::expire_modifiers(world, &mut events);
    lifecycle::check_starvation(world, &mut events);

    population::refill_food(world);
    population::spawn_snakes(world, &mut events);
    creatures::update_population(world, &mut events);
    population::purge_dead(world);

    tracing::debug!(
        tick = world.current_tick,
        snakes = world.living_snakes().count(),
        food = world.food.active_count(),
        effects = world.effects.len(),
        creatures = world.creatures.len(),
        events = events.len(),
        "Tick complete"
    );

    events
}

/// Plan every live snake against the same pre-movement state
fn plan_snakes(world: &mut World) -> Vec<Option<SteeringPlan>> {
    let mut advisor = world.clear_steering_advisor();

    let ctx = PlannerContext {
        snakes: &world.snakes,
        food: &world.food,
        index: &world.spatial,
        world: &world.config.world,
        snake: &world.config.snake,
        behavior: &world.config.behavior,
    };

    let mut plans = Vec::with_capacity(world.snakes.len());
    for (slot, snake) in world.snakes.iter().enumerate() {
        if snake.is_dead() {
            plans.push(None);
            continue;
        }

        let mut steering = plan(slot, &ctx, &mut world.rng);
        if let Some(advisor) = advisor.as_deref_mut() {
            let features = SteeringFeatures::new(snake, &steering.perception, &world.config.world);
            if let Some(direction) = consult(advisor, &features) {
                steering.direction = direction.to_vec();
                steering.drive = Drive::Advisor;
            }
        }
        plans.push(Some(steering));
    }

    if let Some(advisor) = advisor {
        world.set_steering_advisor(advisor);
    }
    plans
}

fn move_snakes(world: &mut World, plans: &[Option<SteeringPlan>], events: &mut Vec<SimulationEvent>) {
    let now = world.elapsed;
    let segment_radius = world.config.snake.segment_radius;

    for (snake, steering) in world.snakes.iter_mut().zip(plans) {
        let Some(steering) = steering else {
            continue;
        };

        events.push(SimulationEvent::MoveDecision {
            agent: snake.id,
            state: snake.state(),
            drive: steering.drive,
            direction: steering.direction,
            label: AxisDirection::classify(steering.direction),
        });

        let outcome = snake.integrate(steering.direction, &world.config.world, segment_radius, now);
        if outcome == MoveOutcome::HitWall {
            events.push(SimulationEvent::Death {
                agent: snake.id,
                reason: DeathReason::HitWall,
                size: snake.size(),
                time: now,
            });
        }
    }
}

/// Run `ticks` ticks, collecting every event
pub fn run_ticks(world: &mut World, ticks: Tick) -> Vec<SimulationEvent> {
    let mut events = Vec::new();
    for _ in 0..ticks {
        events.extend(run_simulation_tick(world));
    }
    events
}
