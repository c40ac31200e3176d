//! Alternate steering source interface
//!
//! An external advisor (for example a trained classifier) may suggest one of
//! four axis directions per snake per tick. The simulation never trusts it:
//! errors and unknown labels fall back to the built-in cascade.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::WorldConfig;
use crate::core::types::Vec2;
use crate::entity::snake::Snake;
use crate::simulation::behavior::Perception;

/// Reported when no hunter is in view
pub const NO_HUNTER_DISTANCE: f32 = 9999.0;

/// Reported when the snake has no body segment behind its neck
pub const NO_SELF_DISTANCE: f32 = 100.0;

#[derive(Error, Debug)]
pub enum SteeringError {
    #[error("advisor unavailable: {0}")]
    Unavailable(String),

    #[error("unknown direction label {0:?}")]
    UnknownLabel(String),

    #[error("prediction failed: {0}")]
    Prediction(String),
}

/// Four-way direction label in screen coordinates (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AxisDirection {
    Up,
    Right,
    Down,
    Left,
}

impl AxisDirection {
    pub fn to_vec(self) -> Vec2 {
        match self {
            AxisDirection::Up => Vec2::new(0.0, -1.0),
            AxisDirection::Right => Vec2::new(1.0, 0.0),
            AxisDirection::Down => Vec2::new(0.0, 1.0),
            AxisDirection::Left => Vec2::new(-1.0, 0.0),
        }
    }

    /// Label the dominant axis of `v`; `None` for zero or diagonal input
    pub fn classify(v: Vec2) -> Option<AxisDirection> {
        let (ax, ay) = (v.x.abs(), v.y.abs());
        if ax > ay {
            Some(if v.x > 0.0 { AxisDirection::Right } else { AxisDirection::Left })
        } else if ay > ax {
            Some(if v.y > 0.0 { AxisDirection::Down } else { AxisDirection::Up })
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AxisDirection::Up => "UP",
            AxisDirection::Right => "RIGHT",
            AxisDirection::Down => "DOWN",
            AxisDirection::Left => "LEFT",
        }
    }
}

impl fmt::Display for AxisDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AxisDirection {
    type Err = SteeringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UP" => Ok(AxisDirection::Up),
            "RIGHT" => Ok(AxisDirection::Right),
            "DOWN" => Ok(AxisDirection::Down),
            "LEFT" => Ok(AxisDirection::Left),
            other => Err(SteeringError::UnknownLabel(other.to_string())),
        }
    }
}

/// Feature row handed to the advisor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteeringFeatures {
    /// Unit heading, zero when stationary
    pub direction: Vec2,
    /// Nearest food minus head, zero when there is no food
    pub food_delta: Vec2,
    pub wall_up: f32,
    pub wall_right: f32,
    pub wall_down: f32,
    pub wall_left: f32,
    /// Distance from the head to the nearest own segment past the neck
    pub self_distance: f32,
    pub hunter_distance: f32,
    /// Nearest hunter head minus own head
    pub hunter_delta: Vec2,
}

impl SteeringFeatures {
    pub const WIDTH: usize = 12;

    pub fn new(snake: &Snake, perception: &Perception, world: &WorldConfig) -> Self {
        let head = snake.head();
        let velocity = snake.velocity();
        let direction = if velocity.length_squared() > 0.0 {
            velocity.normalize()
        } else {
            Vec2::ZERO
        };

        let self_distance = snake
            .segments()
            .skip(2)
            .map(|segment| segment.distance(head))
            .fold(None, |best: Option<f32>, d| Some(best.map_or(d, |b| b.min(d))))
            .unwrap_or(NO_SELF_DISTANCE);

        let (hunter_distance, hunter_delta) = match perception.nearest_hunter {
            Some(hunter) => {
                let delta = hunter - head;
                (delta.length(), delta)
            }
            None => (NO_HUNTER_DISTANCE, Vec2::ZERO),
        };

        Self {
            direction,
            food_delta: perception.nearest_food.map_or(Vec2::ZERO, |food| food - head),
            wall_up: head.y,
            wall_right: world.width - head.x,
            wall_down: world.height - head.y,
            wall_left: head.x,
            self_distance,
            hunter_distance,
            hunter_delta,
        }
    }

    /// Flat row in the classifier's column order
    pub fn to_row(&self) -> [f32; Self::WIDTH] {
        [
            self.direction.x,
            self.direction.y,
            self.food_delta.x,
            self.food_delta.y,
            self.wall_up,
            self.wall_right,
            self.wall_down,
            self.wall_left,
            self.self_distance,
            self.hunter_distance,
            self.hunter_delta.x,
            self.hunter_delta.y,
        ]
    }
}

/// External per-snake direction suggestions
pub trait SteeringAdvisor {
    /// Suggest a label (`UP`, `DOWN`, `LEFT` or `RIGHT`), or `None` to defer
    fn suggest(&mut self, features: &SteeringFeatures) -> Result<Option<String>, SteeringError>;
}

/// Ask the advisor and validate its answer
///
/// Every failure mode degrades to `None` so the caller keeps its own plan.
pub fn consult(advisor: &mut dyn SteeringAdvisor, features: &SteeringFeatures) -> Option<AxisDirection> {
    match advisor.suggest(features) {
        Ok(Some(label)) => match label.parse::<AxisDirection>() {
            Ok(direction) => Some(direction),
            Err(e) => {
                tracing::warn!(error = %e, "Advisor returned an unusable label");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(error = %e, "Advisor failed, falling back to cascade");
            None
        }
    }
}
