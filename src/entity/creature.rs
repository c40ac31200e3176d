//! Auxiliary creatures: pursuers hunt hunters, foragers steal food

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::{CreatureMotion, SnakeConfig, WorldConfig};
use crate::core::types::{cap_length, AgentId, CreatureId, SimTime, Vec2, WallBehavior};
use crate::entity::modifiers::{Modifier, ModifierSource, ModifierStack};
use crate::simulation::pool::PoolHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreatureKind {
    /// Fast predator that targets hunter snakes
    Pursuer,
    /// Competes with snakes for food
    Forager,
}

impl fmt::Display for CreatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreatureKind::Pursuer => f.write_str("pursuer"),
            CreatureKind::Forager => f.write_str("forager"),
        }
    }
}

/// Weak reference to whatever a creature is chasing
///
/// Never dereferenced directly; the owner re-resolves it every tick and drops
/// it once it stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreatureTarget {
    Agent(AgentId),
    Food(PoolHandle),
}

/// Why a creature left the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatureExit {
    HitWall,
    Satiated,
    PopulationDeclined,
}

impl fmt::Display for CreatureExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CreatureExit::HitWall => "hit wall",
            CreatureExit::Satiated => "satiated",
            CreatureExit::PopulationDeclined => "population declined",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone)]
pub struct Creature {
    pub id: CreatureId,
    pub kind: CreatureKind,
    pub position: Vec2,
    velocity: Vec2,
    base_max_speed: f32,
    base_acceleration: f32,
    modifiers: ModifierStack,
    pub target: Option<CreatureTarget>,
    pub last_retarget: SimTime,
    exit: Option<CreatureExit>,
    meals: u32,
    /// Set while the population trigger is reversed
    pub despawn_since: Option<SimTime>,
}

impl Creature {
    pub fn new(
        id: CreatureId,
        kind: CreatureKind,
        position: Vec2,
        now: SimTime,
        motion: &CreatureMotion,
        snake: &SnakeConfig,
    ) -> Self {
        Self {
            id,
            kind,
            position,
            velocity: Vec2::ZERO,
            base_max_speed: snake.base_max_speed * motion.speed_factor,
            base_acceleration: snake.base_acceleration * motion.accel_factor,
            modifiers: ModifierStack::new(),
            target: None,
            // Forces a target search on the first update
            last_retarget: now - motion.retarget_interval,
            exit: None,
            meals: 0,
            despawn_since: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.exit.is_none()
    }

    pub fn exit(&self) -> Option<CreatureExit> {
        self.exit
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn meals(&self) -> u32 {
        self.meals
    }

    pub fn max_speed(&self) -> f32 {
        self.modifiers.apply_speed(self.base_max_speed)
    }

    pub fn baseline_max_speed(&self) -> f32 {
        self.base_max_speed
    }

    pub fn acceleration(&self) -> f32 {
        self.modifiers.apply_accel(self.base_acceleration)
    }

    pub fn modifiers(&self) -> &ModifierStack {
        &self.modifiers
    }

    pub fn retarget_due(&self, now: SimTime, interval: f64) -> bool {
        now - self.last_retarget >= interval
    }

    /// Accelerate toward `goal` and move
    pub fn chase(&mut self, goal: Vec2) {
        if !self.is_alive() {
            return;
        }
        let to_goal = goal - self.position;
        if to_goal.length_squared() > 0.0 {
            self.velocity += to_goal.normalize() * self.acceleration();
            self.velocity = cap_length(self.velocity, self.max_speed());
        }
        self.position += self.velocity;
    }

    /// Damped random wander at a reduced speed cap
    pub fn patrol<R: Rng>(&mut self, rng: &mut R, motion: &CreatureMotion) {
        if !self.is_alive() {
            return;
        }
        let wander = Vec2::new(rng.gen_range(-1.0..=1.0), rng.gen_range(-1.0..=1.0));
        if wander.length_squared() > 0.0 {
            self.velocity += wander.normalize() * (self.acceleration() * motion.patrol_accel_factor);
            self.velocity *= motion.patrol_drag;
            self.velocity = cap_length(self.velocity, self.max_speed() * motion.patrol_speed_factor);
        }
        self.position += self.velocity;
    }

    /// Apply the shared wall policy; returns true if the creature died
    pub fn apply_boundary(&mut self, world: &WorldConfig) -> bool {
        if !self.is_alive() {
            return false;
        }
        let p = &mut self.position;
        match world.wall_behavior {
            WallBehavior::Wraparound => {
                if p.x < 0.0 {
                    p.x = world.width;
                } else if p.x > world.width {
                    p.x = 0.0;
                }
                if p.y < 0.0 {
                    p.y = world.height;
                } else if p.y > world.height {
                    p.y = 0.0;
                }
                false
            }
            WallBehavior::Destructive => {
                let outside =
                    p.x < 0.0 || p.x > world.width || p.y < 0.0 || p.y > world.height;
                outside && self.leave(CreatureExit::HitWall)
            }
        }
    }

    /// Record a meal; returns the running count
    pub fn eat(&mut self) -> u32 {
        if self.is_alive() {
            self.meals += 1;
        }
        self.meals
    }

    pub fn add_impulse(&mut self, impulse: Vec2) {
        if self.is_alive() {
            self.velocity += impulse;
        }
    }

    /// Remove the creature from play; returns false if it already left
    pub fn leave(&mut self, reason: CreatureExit) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.exit = Some(reason);
        self.target = None;
        self.modifiers.clear();
        true
    }

    pub fn apply_modifier(&mut self, modifier: Modifier) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.modifiers.push(modifier);
        true
    }

    pub fn remove_modifier(&mut self, source: ModifierSource) -> Option<Modifier> {
        self.modifiers.remove_source(source)
    }

    pub fn has_modifier(&self, source: ModifierSource) -> bool {
        self.modifiers.has_source(source)
    }
}
