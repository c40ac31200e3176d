//! Snake agents and their lifecycle
//!
//! A snake is `Alive` (normal or hunter, optionally starving) until it dies;
//! death is terminal and every mutator on a dead snake is a no-op. The
//! simulation step is the only caller of the mutators.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::config::{SnakeConfig, StarvationConfig, WorldConfig};
use crate::core::types::{cap_length, AgentId, SimTime, Vec2, WallBehavior};
use crate::entity::modifiers::{Modifier, ModifierSource, ModifierStack};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathReason {
    Starvation,
    HitWall,
    EatenByHunter,
    KilledByPursuer,
}

impl fmt::Display for DeathReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DeathReason::Starvation => "starvation",
            DeathReason::HitWall => "hit wall",
            DeathReason::EatenByHunter => "eaten by hunter",
            DeathReason::KilledByPursuer => "killed by pursuer",
        };
        f.write_str(text)
    }
}

/// Why a snake grew; only `AteFood` counts toward the hunter threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthReason {
    AteFood,
    AteSnake,
    GrowthFood,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Death {
    pub reason: DeathReason,
    pub time: SimTime,
}

/// Render-facing state tag (dead wins over hunter, hunter over starving)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnakeState {
    Normal,
    Starving,
    Hunter,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthOutcome {
    pub from: u32,
    pub to: u32,
    pub became_hunter: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarvationStatus {
    Fed,
    Starving,
    Starved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Dead snakes do not move
    Skipped,
    Moved,
    Wrapped,
    HitWall,
}

#[derive(Debug, Clone)]
pub struct Snake {
    pub id: AgentId,
    /// Head first; never longer than `size`
    segments: VecDeque<Vec2>,
    velocity: Vec2,
    size: u32,
    initial_length: u32,
    food_eaten: u32,
    hunter: bool,
    starving: bool,
    death: Option<Death>,
    last_meal: SimTime,
    base_max_speed: f32,
    base_acceleration: f32,
    modifiers: ModifierStack,
}

impl Snake {
    /// Spawn a snake with its body laid out to the left of `head`
    pub fn new(id: AgentId, head: Vec2, now: SimTime, cfg: &SnakeConfig) -> Self {
        let segments = (0..cfg.initial_length)
            .map(|i| Vec2::new(head.x - i as f32 * cfg.segment_radius, head.y))
            .collect();

        let mut snake = Self {
            id,
            segments,
            velocity: Vec2::ZERO,
            size: cfg.initial_length,
            initial_length: cfg.initial_length,
            food_eaten: 0,
            hunter: false,
            starving: false,
            death: None,
            last_meal: now,
            base_max_speed: cfg.base_max_speed,
            base_acceleration: cfg.base_acceleration,
            modifiers: ModifierStack::new(),
        };
        snake.update_dynamic_properties(cfg);
        snake
    }

    /// Start from an arbitrary size and meal count (scenario setup, restores)
    pub fn with_progress(mut self, size: u32, food_eaten: u32, cfg: &SnakeConfig) -> Self {
        self.size = size.max(1);
        self.food_eaten = food_eaten;
        self.hunter = food_eaten >= cfg.food_to_become_hunter;
        self.segments.truncate(self.size as usize);
        self.update_dynamic_properties(cfg);
        self
    }

    // === READ ACCESS ===

    pub fn head(&self) -> Vec2 {
        self.segments.front().copied().unwrap_or_default()
    }

    pub fn segments(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.segments.iter().copied()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn food_eaten(&self) -> u32 {
        self.food_eaten
    }

    pub fn is_hunter(&self) -> bool {
        self.hunter
    }

    pub fn is_starving(&self) -> bool {
        self.starving
    }

    pub fn is_dead(&self) -> bool {
        self.death.is_some()
    }

    pub fn is_alive(&self) -> bool {
        self.death.is_none()
    }

    pub fn death(&self) -> Option<Death> {
        self.death
    }

    pub fn last_meal(&self) -> SimTime {
        self.last_meal
    }

    pub fn is_immune(&self) -> bool {
        self.modifiers.is_immune()
    }

    pub fn modifiers(&self) -> &ModifierStack {
        &self.modifiers
    }

    /// Size-derived max speed with active modifiers applied
    pub fn max_speed(&self) -> f32 {
        self.modifiers.apply_speed(self.base_max_speed)
    }

    pub fn acceleration(&self) -> f32 {
        self.modifiers.apply_accel(self.base_acceleration)
    }

    /// Max speed ignoring modifiers
    pub fn baseline_max_speed(&self) -> f32 {
        self.base_max_speed
    }

    pub fn state(&self) -> SnakeState {
        if self.is_dead() {
            SnakeState::Dead
        } else if self.hunter {
            SnakeState::Hunter
        } else if self.starving {
            SnakeState::Starving
        } else {
            SnakeState::Normal
        }
    }

    // === MOVEMENT ===

    /// Steer toward `direction`, integrate one tick and apply the wall policy
    pub fn integrate(
        &mut self,
        direction: Vec2,
        world: &WorldConfig,
        segment_radius: f32,
        now: SimTime,
    ) -> MoveOutcome {
        if self.is_dead() {
            return MoveOutcome::Skipped;
        }

        let max_speed = self.max_speed();
        if direction.length_squared() > 0.0 {
            let desired = direction.normalize() * max_speed;
            let steering = desired - self.velocity;
            if steering.length_squared() > 0.0 {
                self.velocity += steering.normalize() * self.acceleration();
            }
        }
        self.velocity = cap_length(self.velocity, max_speed);

        let new_head = self.head() + self.velocity;
        self.segments.push_front(new_head);
        while self.segments.len() > self.size as usize {
            self.segments.pop_back();
        }

        self.apply_boundary(world, segment_radius, now)
    }

    fn apply_boundary(&mut self, world: &WorldConfig, r: f32, now: SimTime) -> MoveOutcome {
        let mut head = self.head();
        match world.wall_behavior {
            WallBehavior::Wraparound => {
                let mut wrapped = false;
                if head.x > world.width + r {
                    head.x = -r;
                    wrapped = true;
                } else if head.x < -r {
                    head.x = world.width + r;
                    wrapped = true;
                }
                if head.y > world.height + r {
                    head.y = -r;
                    wrapped = true;
                } else if head.y < -r {
                    head.y = world.height + r;
                    wrapped = true;
                }
                if wrapped {
                    if let Some(front) = self.segments.front_mut() {
                        *front = head;
                    }
                    tracing::debug!(agent = self.id.0, x = head.x, y = head.y, "Wrapped");
                    MoveOutcome::Wrapped
                } else {
                    MoveOutcome::Moved
                }
            }
            WallBehavior::Destructive => {
                let inside = (0.0..=world.width).contains(&head.x)
                    && (0.0..=world.height).contains(&head.y);
                if inside {
                    MoveOutcome::Moved
                } else {
                    self.die(DeathReason::HitWall, now);
                    MoveOutcome::HitWall
                }
            }
        }
    }

    /// Add a velocity impulse (pull fields)
    pub fn add_impulse(&mut self, impulse: Vec2) {
        if self.is_alive() {
            self.velocity += impulse;
        }
    }

    /// Set the heading directly (spawn nudge)
    pub fn set_velocity(&mut self, velocity: Vec2) {
        if self.is_alive() {
            self.velocity = velocity;
        }
    }

    // === LIFECYCLE ===

    /// Grow by `amount`; meals also advance the hunter counter and meal clock
    pub fn grow(
        &mut self,
        amount: u32,
        reason: GrowthReason,
        now: SimTime,
        cfg: &SnakeConfig,
    ) -> Option<GrowthOutcome> {
        if self.is_dead() {
            return None;
        }

        let from = self.size;
        self.size += amount;

        let mut became_hunter = false;
        if reason == GrowthReason::AteFood {
            self.food_eaten += 1;
            self.record_meal(now);
            if !self.hunter && self.food_eaten >= cfg.food_to_become_hunter {
                self.hunter = true;
                became_hunter = true;
            }
        }
        self.update_dynamic_properties(cfg);

        Some(GrowthOutcome {
            from,
            to: self.size,
            became_hunter,
        })
    }

    /// Shrink by `amount`, never below `min_size`; returns `(from, to)` on change
    pub fn shrink(&mut self, amount: u32, min_size: u32, cfg: &SnakeConfig) -> Option<(u32, u32)> {
        if self.is_dead() {
            return None;
        }
        let from = self.size;
        let to = from.saturating_sub(amount).max(min_size).min(from);
        if to == from {
            return None;
        }
        self.size = to;
        self.segments.truncate(to as usize);
        self.update_dynamic_properties(cfg);
        Some((from, to))
    }

    /// Reset the starvation clock
    pub fn record_meal(&mut self, now: SimTime) {
        if self.is_alive() {
            self.last_meal = now;
            self.starving = false;
        }
    }

    pub fn check_starvation(&mut self, now: SimTime, cfg: &StarvationConfig) -> StarvationStatus {
        if self.is_dead() {
            return StarvationStatus::Starved;
        }
        if !cfg.enabled {
            self.starving = false;
            return StarvationStatus::Fed;
        }

        let hungry_for = now - self.last_meal;
        if hungry_for >= cfg.death_seconds {
            self.die(DeathReason::Starvation, now);
            StarvationStatus::Starved
        } else if hungry_for >= cfg.warning_seconds {
            self.starving = true;
            StarvationStatus::Starving
        } else {
            self.starving = false;
            StarvationStatus::Fed
        }
    }

    /// Kill the snake; returns false if it was already dead
    pub fn die(&mut self, reason: DeathReason, now: SimTime) -> bool {
        if self.is_dead() {
            return false;
        }
        self.death = Some(Death { reason, time: now });
        self.starving = false;
        self.modifiers.clear();
        tracing::info!(
            agent = self.id.0,
            %reason,
            size = self.size,
            x = self.head().x,
            y = self.head().y,
            "Snake died"
        );
        true
    }

    // === MODIFIERS ===

    pub fn apply_modifier(&mut self, modifier: Modifier) -> bool {
        if self.is_dead() {
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

    pub fn expire_modifiers(&mut self, now: SimTime) -> Vec<Modifier> {
        self.modifiers.expire(now)
    }

    fn update_dynamic_properties(&mut self, cfg: &SnakeConfig) {
        let extra = self.size as f32 - self.initial_length as f32;
        let speed = cfg.base_max_speed / (1.0 + extra * cfg.size_speed_penalty);
        let accel = cfg.base_acceleration / (1.0 + extra * cfg.size_accel_penalty);
        self.base_max_speed = speed.max(cfg.min_max_speed);
        self.base_acceleration = accel.max(cfg.min_acceleration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::EffectId;
    use crate::entity::modifiers::ModifierKind;

    fn cfg() -> SnakeConfig {
        SnakeConfig::default()
    }

    fn spawn(x: f32, y: f32) -> Snake {
        Snake::new(AgentId(1), Vec2::new(x, y), 0.0, &cfg())
    }

    #[test]
    fn test_new_snake_layout() {
        let snake = spawn(200.0, 100.0);
        let segments: Vec<Vec2> = snake.segments().collect();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], Vec2::new(200.0, 100.0));
        assert_eq!(segments[2], Vec2::new(184.0, 100.0));
        assert_eq!(snake.state(), SnakeState::Normal);
        assert_eq!(snake.max_speed(), 5.0);
    }

    #[test]
    fn test_segments_never_exceed_size() {
        let world = WorldConfig::default();
        let mut snake = spawn(500.0, 400.0);
        for _ in 0..20 {
            snake.integrate(Vec2::X, &world, 8.0, 0.0);
            assert!(snake.segment_count() <= snake.size() as usize);
        }
        assert_eq!(snake.segment_count(), 3);
    }

    #[test]
    fn test_velocity_capped_at_max_speed() {
        let world = WorldConfig::default();
        let mut snake = spawn(500.0, 400.0);
        for _ in 0..100 {
            snake.integrate(Vec2::Y, &world, 8.0, 0.0);
        }
        assert!(snake.velocity().length() <= snake.max_speed() + 1e-4);
    }

    #[test]
    fn test_wraparound_moves_head_to_far_side() {
        let world = WorldConfig::default();
        let mut snake = spawn(world.width + 7.0, 400.0);
        snake.set_velocity(Vec2::new(5.0, 0.0));
        let outcome = snake.integrate(Vec2::ZERO, &world, 8.0, 0.0);
        assert_eq!(outcome, MoveOutcome::Wrapped);
        assert_eq!(snake.head().x, -8.0);
    }

    #[test]
    fn test_destructive_wall_kills() {
        let world = WorldConfig {
            wall_behavior: WallBehavior::Destructive,
            ..WorldConfig::default()
        };
        let mut snake = spawn(2.0, 400.0);
        snake.set_velocity(Vec2::new(-5.0, 0.0));
        let outcome = snake.integrate(Vec2::ZERO, &world, 8.0, 1.5);
        assert_eq!(outcome, MoveOutcome::HitWall);
        assert_eq!(snake.death().map(|d| d.reason), Some(DeathReason::HitWall));
        assert_eq!(snake.death().map(|d| d.time), Some(1.5));
    }

    #[test]
    fn test_tenth_meal_makes_hunter() {
        let cfg = cfg();
        let mut snake = spawn(100.0, 100.0).with_progress(3, 9, &cfg);
        assert!(!snake.is_hunter());

        let outcome = snake.grow(1, GrowthReason::AteFood, 1.0, &cfg).unwrap();
        assert_eq!(outcome, GrowthOutcome { from: 3, to: 4, became_hunter: true });
        assert_eq!(snake.food_eaten(), 10);
        assert!(snake.is_hunter());
        assert_eq!(snake.state(), SnakeState::Hunter);
    }

    #[test]
    fn test_non_meal_growth_does_not_count() {
        let cfg = cfg();
        let mut snake = spawn(100.0, 100.0);
        snake.grow(3, GrowthReason::GrowthFood, 4.0, &cfg);
        snake.grow(2, GrowthReason::AteSnake, 4.0, &cfg);
        assert_eq!(snake.size(), 8);
        assert_eq!(snake.food_eaten(), 0);
        assert_eq!(snake.last_meal(), 0.0);
    }

    #[test]
    fn test_speed_penalty_has_floor() {
        let cfg = SnakeConfig {
            size_speed_penalty: 1.0,
            size_accel_penalty: 1.0,
            ..SnakeConfig::default()
        };
        let mut snake = Snake::new(AgentId(2), Vec2::ZERO, 0.0, &cfg);
        snake.grow(100, GrowthReason::AteSnake, 0.0, &cfg);
        assert_eq!(snake.baseline_max_speed(), cfg.min_max_speed);
        assert_eq!(snake.acceleration(), cfg.min_acceleration);
    }

    #[test]
    fn test_shrink_clamps_and_truncates() {
        let cfg = cfg();
        let mut snake = spawn(100.0, 100.0).with_progress(4, 0, &cfg);
        assert_eq!(snake.shrink(2, 3, &cfg), Some((4, 3)));
        assert_eq!(snake.shrink(2, 3, &cfg), None);
        assert!(snake.segment_count() <= 3);
    }

    #[test]
    fn test_starvation_timeline() {
        let starvation = StarvationConfig::default();
        let mut snake = spawn(100.0, 100.0);

        assert_eq!(snake.check_starvation(7.9, &starvation), StarvationStatus::Fed);
        assert_eq!(snake.check_starvation(9.0, &starvation), StarvationStatus::Starving);
        assert!(snake.is_starving());
        assert!(!snake.is_dead());

        assert_eq!(snake.check_starvation(10.01, &starvation), StarvationStatus::Starved);
        assert_eq!(snake.death().map(|d| d.reason), Some(DeathReason::Starvation));
    }

    #[test]
    fn test_meal_clears_starving() {
        let starvation = StarvationConfig::default();
        let mut snake = spawn(100.0, 100.0);
        snake.check_starvation(9.0, &starvation);
        snake.record_meal(9.5);
        assert!(!snake.is_starving());
        assert_eq!(snake.check_starvation(17.0, &starvation), StarvationStatus::Fed);
    }

    #[test]
    fn test_disabled_starvation_never_kills() {
        let starvation = StarvationConfig {
            enabled: false,
            ..StarvationConfig::default()
        };
        let mut snake = spawn(100.0, 100.0);
        assert_eq!(snake.check_starvation(1000.0, &starvation), StarvationStatus::Fed);
        assert!(snake.is_alive());
    }

    #[test]
    fn test_dead_snake_ignores_mutators() {
        let cfg = cfg();
        let world = WorldConfig::default();
        let mut snake = spawn(100.0, 100.0);
        assert!(snake.die(DeathReason::EatenByHunter, 2.0));
        assert!(!snake.die(DeathReason::Starvation, 3.0));

        let head = snake.head();
        assert!(snake.grow(5, GrowthReason::AteFood, 3.0, &cfg).is_none());
        assert_eq!(snake.integrate(Vec2::X, &world, 8.0, 3.0), MoveOutcome::Skipped);
        snake.add_impulse(Vec2::new(3.0, 3.0));
        assert!(!snake.apply_modifier(Modifier {
            source: ModifierSource::Zone(EffectId(1)),
            kind: ModifierKind::SpeedZone { multiplier: 2.0 },
            expires_at: None,
        }));

        assert_eq!(snake.size(), 3);
        assert_eq!(snake.food_eaten(), 0);
        assert_eq!(snake.head(), head);
        assert_eq!(snake.death().map(|d| d.reason), Some(DeathReason::EatenByHunter));
        assert_eq!(snake.state(), SnakeState::Dead);
    }

    #[test]
    fn test_death_reason_display() {
        assert_eq!(DeathReason::EatenByHunter.to_string(), "eaten by hunter");
        assert_eq!(DeathReason::HitWall.to_string(), "hit wall");
    }
}
