//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

pub use glam::Vec2;

/// Stable identifier for a snake agent
///
/// Ids are never reused within a world, so a stale id simply stops resolving
/// once the snake has been purged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

/// Stable identifier for an environmental effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectId(pub u32);

/// Stable identifier for an auxiliary creature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreatureId(pub u32);

/// Simulation tick counter
pub type Tick = u64;

/// Simulation clock in seconds
pub type SimTime = f64;

/// What happens to an entity that crosses the arena boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WallBehavior {
    /// Leaving one side re-enters from the opposite side
    #[default]
    Wraparound,
    /// Leaving the arena kills the entity
    Destructive,
}

/// Normalize `v`, returning zero for (near) zero-length input
#[inline]
pub fn normalize_or_zero(v: Vec2) -> Vec2 {
    if v.length_squared() > 0.0 {
        v.normalize()
    } else {
        Vec2::ZERO
    }
}

/// Cap `v` to `max` length without changing its direction
#[inline]
pub fn cap_length(v: Vec2, max: f32) -> Vec2 {
    if v.length_squared() > max * max {
        v.normalize() * max
    } else {
        v
    }
}
