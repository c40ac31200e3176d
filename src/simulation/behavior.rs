//! Steering cascade for snakes
//!
//! Contributors are evaluated in priority order every tick. Threat
//! avoidance, prey pursuit and food seeking are exclusive: the first one
//! whose predicate holds claims the slot and the others contribute nothing.
//! Wall avoidance always contributes. When the sum carries no stimulus the
//! snake explores.

use ordered_float::OrderedFloat;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::{BehaviorConfig, SnakeConfig, WorldConfig};
use crate::core::types::{normalize_or_zero, Vec2};
use crate::entity::food::Food;
use crate::entity::snake::Snake;
use crate::simulation::pool::ObjectPool;
use crate::spatial::index::SpatialIndex;

/// Where a snake's final direction came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Drive {
    ThreatAvoidance,
    PreyPursuit,
    FoodSeeking,
    WallAvoidance,
    Exploration,
    /// Overridden by an external steering advisor
    Advisor,
}

/// Cascade members in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contributor {
    ThreatAvoidance,
    PreyPursuit,
    FoodSeeking,
    WallAvoidance,
}

impl Contributor {
    pub const CASCADE: [Contributor; 4] = [
        Contributor::ThreatAvoidance,
        Contributor::PreyPursuit,
        Contributor::FoodSeeking,
        Contributor::WallAvoidance,
    ];

    pub fn weight(&self, cfg: &BehaviorConfig) -> f32 {
        match self {
            Contributor::ThreatAvoidance => cfg.threat_weight,
            Contributor::PreyPursuit => cfg.prey_weight,
            Contributor::FoodSeeking => cfg.food_weight,
            Contributor::WallAvoidance => cfg.wall_weight,
        }
    }

    pub fn is_exclusive(&self) -> bool {
        !matches!(self, Contributor::WallAvoidance)
    }

    fn drive(&self) -> Drive {
        match self {
            Contributor::ThreatAvoidance => Drive::ThreatAvoidance,
            Contributor::PreyPursuit => Drive::PreyPursuit,
            Contributor::FoodSeeking => Drive::FoodSeeking,
            Contributor::WallAvoidance => Drive::WallAvoidance,
        }
    }

    /// Activation predicate and unweighted vector
    fn evaluate(
        &self,
        snake: &Snake,
        perception: &Perception,
        ctx: &PlannerContext<'_>,
    ) -> (bool, Vec2) {
        let head = snake.head();
        match self {
            Contributor::ThreatAvoidance => {
                if perception.threats.is_empty() {
                    return (false, Vec2::ZERO);
                }
                let radius = ctx.behavior.threat_detection_radius;
                let flee = perception
                    .threats
                    .iter()
                    .map(|&threat| head - threat)
                    .filter(|away| away.length_squared() > 0.0)
                    .map(|away| away.normalize() * (radius / away.length().max(1.0)))
                    .sum::<Vec2>();
                (true, flee)
            }
            Contributor::PreyPursuit => match perception.nearest_prey {
                Some(prey) if snake.is_hunter() => (true, normalize_or_zero(prey - head)),
                _ => (false, Vec2::ZERO),
            },
            Contributor::FoodSeeking => match perception.nearest_food {
                Some(food) => (true, normalize_or_zero(food - head)),
                None => (false, Vec2::ZERO),
            },
            Contributor::WallAvoidance => {
                let push = wall_push(head, ctx.world, ctx.behavior);
                (push != Vec2::ZERO, push)
            }
        }
    }
}

/// Proactive push away from walls closer than the avoidance distance
pub fn wall_push(pos: Vec2, world: &WorldConfig, cfg: &BehaviorConfig) -> Vec2 {
    let reach = cfg.wall_avoidance_distance;
    let falloff = |distance: f32| {
        if distance < reach {
            (reach - distance) / reach
        } else {
            0.0
        }
    };

    let push = Vec2::new(
        falloff(pos.x) - falloff(world.width - pos.x),
        falloff(pos.y) - falloff(world.height - pos.y),
    );
    push * cfg.proactive_avoidance_strength
}

/// What one snake noticed this tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Perception {
    /// Globally nearest food item
    pub nearest_food: Option<Vec2>,
    /// Nearest living hunter anywhere in the arena
    pub nearest_hunter: Option<Vec2>,
    /// Heads of threatening hunters in detection range, in slot order
    pub threats: Vec<Vec2>,
    pub nearest_prey: Option<Vec2>,
}

/// Read-only view of the world the planner needs
pub struct PlannerContext<'a> {
    pub snakes: &'a [Snake],
    pub food: &'a ObjectPool<Food>,
    pub index: &'a SpatialIndex,
    pub world: &'a WorldConfig,
    pub snake: &'a SnakeConfig,
    pub behavior: &'a BehaviorConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SteeringPlan {
    /// Unit vector, or zero when there is truly no input
    pub direction: Vec2,
    pub drive: Drive,
    pub perception: Perception,
}

/// Gather threats, prey and targets for the snake in `slot`
pub fn perceive(slot: usize, ctx: &PlannerContext<'_>) -> Perception {
    let Some(me) = ctx.snakes.get(slot) else {
        return Perception::default();
    };
    let head = me.head();
    let margin = ctx.snake.fear_margin;
    let radius = ctx.behavior.threat_detection_radius;

    let mut perception = Perception {
        nearest_food: ctx
            .food
            .iter_active()
            .map(|(_, item)| item.position)
            .min_by_key(|p| OrderedFloat(p.distance_squared(head))),
        nearest_hunter: ctx
            .snakes
            .iter()
            .enumerate()
            .filter(|&(i, other)| i != slot && other.is_alive() && other.is_hunter())
            .map(|(_, other)| other.head())
            .min_by_key(|p| OrderedFloat(p.distance_squared(head))),
        ..Perception::default()
    };

    let mut nearest_prey: Option<(f32, Vec2)> = None;
    for other_slot in ctx.index.nearby_heads(head, radius) {
        if other_slot == slot {
            continue;
        }
        let Some(other) = ctx.snakes.get(other_slot) else {
            continue;
        };
        if other.is_dead() {
            continue;
        }
        let distance = other.head().distance(head);
        if distance >= radius {
            continue;
        }

        if other.is_hunter() && other.size() > me.size() + margin {
            perception.threats.push(other.head());
        }
        if me.is_hunter() && other.size() + margin < me.size() {
            // Strict `<` keeps the first-seen candidate on ties
            if nearest_prey.map_or(true, |(best, _)| distance < best) {
                nearest_prey = Some((distance, other.head()));
            }
        }
    }
    perception.nearest_prey = nearest_prey.map(|(_, pos)| pos);

    perception
}

/// Compute the steering direction for the snake in `slot`
pub fn plan<R: Rng>(slot: usize, ctx: &PlannerContext<'_>, rng: &mut R) -> SteeringPlan {
    let perception = perceive(slot, ctx);
    let Some(snake) = ctx.snakes.get(slot).filter(|s| s.is_alive()) else {
        return SteeringPlan {
            direction: Vec2::ZERO,
            drive: Drive::Exploration,
            perception,
        };
    };

    let mut combined = Vec2::ZERO;
    let mut claimed: Option<Contributor> = None;
    let mut wall_active = false;

    for contributor in Contributor::CASCADE {
        let (active, raw) = contributor.evaluate(snake, &perception, ctx);
        if !active {
            continue;
        }
        if contributor.is_exclusive() {
            if claimed.is_some() {
                continue;
            }
            claimed = Some(contributor);
        } else {
            wall_active = true;
        }
        combined += raw * contributor.weight(ctx.behavior);
    }

    let mut drive = match claimed {
        Some(contributor) => contributor.drive(),
        None if wall_active => Drive::WallAvoidance,
        None => Drive::Exploration,
    };

    if combined.length_squared() < ctx.behavior.exploration_epsilon {
        combined = explore(snake.velocity(), ctx.behavior.exploration_jitter, rng);
        drive = Drive::Exploration;
    }

    SteeringPlan {
        direction: normalize_or_zero(combined),
        drive,
        perception,
    }
}

/// Random heading: jitter around the current one, or fully random at rest
fn explore<R: Rng>(velocity: Vec2, jitter: f32, rng: &mut R) -> Vec2 {
    if velocity.length_squared() > 0.0 {
        let offset = Vec2::new(rng.gen_range(-jitter..=jitter), rng.gen_range(-jitter..=jitter));
        velocity.normalize() + offset
    } else {
        Vec2::new(rng.gen_range(-1.0..=1.0), rng.gen_range(-1.0..=1.0))
    }
}
