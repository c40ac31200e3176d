//! Simulation configuration with documented constants
//!
//! All tunable numbers are collected here. Every section deserializes with
//! defaults, so a TOML file only needs to name the values it changes.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::core::error::{Result, SimError};
use crate::core::types::WallBehavior;

/// Top-level configuration for the arena
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub world: WorldConfig,
    pub snake: SnakeConfig,
    pub behavior: BehaviorConfig,
    pub starvation: StarvationConfig,
    pub food: FoodConfig,
    pub effects: EffectsConfig,
    pub creatures: CreatureConfig,
}

// === WORLD ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Arena width in world units
    pub width: f32,
    /// Arena height in world units
    pub height: f32,
    /// Shared boundary policy for snakes and creatures
    pub wall_behavior: WallBehavior,
    /// Simulated seconds per tick (the driving loop runs at a fixed cadence)
    pub tick_seconds: f64,
    /// Side length of a spatial index cell
    ///
    /// Should be at least the largest common query radius so most queries
    /// touch a 3x3 block of cells.
    pub grid_cell_size: f32,
    /// Seed for the world RNG
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 800.0,
            wall_behavior: WallBehavior::Wraparound,
            tick_seconds: 1.0 / 60.0,
            grid_cell_size: 100.0,
            seed: 0x5eed,
        }
    }
}

// === SNAKES ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeConfig {
    /// Segment count of a freshly spawned snake (also the size floor used
    /// for speed penalties)
    pub initial_length: u32,
    pub segment_radius: f32,
    /// Max speed in units per tick before size penalties and modifiers
    pub base_max_speed: f32,
    /// Steering acceleration in units per tick squared
    pub base_acceleration: f32,
    /// max_speed = base / (1 + (size - initial) * penalty)
    pub size_speed_penalty: f32,
    pub size_accel_penalty: f32,
    /// Floors so large snakes never stop moving
    pub min_max_speed: f32,
    pub min_acceleration: f32,
    /// Meals needed before the one-way hunter transition
    pub food_to_become_hunter: u32,
    /// Size advantage needed to be a threat or to treat another snake as prey
    pub fear_margin: u32,
    /// Head-to-segment distance at which predation happens
    pub strike_distance: f32,
    /// Snakes spawned when the world is created
    pub initial_snakes: usize,
    pub max_snakes: usize,
    pub spawn_interval_min: f64,
    pub spawn_interval_max: f64,
    /// Spawn positions keep this far from the arena edge
    pub spawn_margin: f32,
    /// Dead snakes stay visible this long before they are purged
    pub dead_purge_delay: f64,
    /// How often the purge runs
    pub cleanup_interval: f64,
}

impl Default for SnakeConfig {
    fn default() -> Self {
        Self {
            initial_length: 3,
            segment_radius: 8.0,
            base_max_speed: 5.0,
            base_acceleration: 0.2,
            size_speed_penalty: 0.0,
            size_accel_penalty: 0.0,
            min_max_speed: 0.5,
            min_acceleration: 0.05,
            food_to_become_hunter: 10,
            fear_margin: 5,
            strike_distance: 16.0,
            initial_snakes: 0,
            max_snakes: 20,
            spawn_interval_min: 2.0,
            spawn_interval_max: 2.0,
            spawn_margin: 100.0,
            dead_purge_delay: 3.0,
            cleanup_interval: 5.0,
        }
    }
}

// === BEHAVIOR ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// How far a snake "sees" walls
    pub wall_avoidance_distance: f32,
    /// How far a snake sees threats and prey
    pub threat_detection_radius: f32,
    /// Scale applied to the raw wall push
    pub proactive_avoidance_strength: f32,
    pub threat_weight: f32,
    pub prey_weight: f32,
    pub food_weight: f32,
    pub wall_weight: f32,
    /// Below this squared length the cascade counts as "no stimulus"
    pub exploration_epsilon: f32,
    /// Random perturbation applied around the current heading while exploring
    pub exploration_jitter: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            wall_avoidance_distance: 32.0,
            threat_detection_radius: 80.0,
            proactive_avoidance_strength: 0.5,
            threat_weight: 3.0,
            prey_weight: 2.0,
            food_weight: 1.5,
            wall_weight: 1.0,
            exploration_epsilon: 0.1,
            exploration_jitter: 0.3,
        }
    }
}

// === STARVATION ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StarvationConfig {
    pub enabled: bool,
    /// Seconds without a meal before the starving flag turns on
    pub warning_seconds: f64,
    /// Seconds without a meal before the snake dies
    pub death_seconds: f64,
}

impl Default for StarvationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            warning_seconds: 8.0,
            death_seconds: 10.0,
        }
    }
}

// === FOOD ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodConfig {
    pub radius: f32,
    pub max_on_screen: usize,
    pub spawn_interval: f64,
    /// Upper bound on items spawned by one refill
    pub spawn_batch: usize,
    /// Inactive food objects created up front
    pub pool_prefill: usize,
    pub special: SpecialFoodConfig,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            radius: 7.0,
            max_on_screen: 15,
            spawn_interval: 0.5,
            spawn_batch: 5,
            pool_prefill: 20,
            special: SpecialFoodConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialFoodConfig {
    pub enable_speed: bool,
    pub enable_slow: bool,
    pub enable_immunity: bool,
    pub enable_growth: bool,
    pub enable_shrink: bool,
    /// Per-type spawn probabilities; the remainder spawns normal food
    pub speed_chance: f32,
    pub slow_chance: f32,
    pub immunity_chance: f32,
    pub growth_chance: f32,
    pub shrink_chance: f32,
    pub speed_multiplier: f32,
    pub speed_accel_multiplier: f32,
    pub speed_duration: f64,
    pub slow_multiplier: f32,
    pub slow_duration: f64,
    pub immunity_duration: f64,
    pub growth_bonus: u32,
    pub shrink_reduction: u32,
    pub shrink_min_size: u32,
}

impl Default for SpecialFoodConfig {
    fn default() -> Self {
        Self {
            enable_speed: true,
            enable_slow: true,
            enable_immunity: true,
            enable_growth: true,
            enable_shrink: true,
            speed_chance: 0.05,
            slow_chance: 0.05,
            immunity_chance: 0.03,
            growth_chance: 0.05,
            shrink_chance: 0.04,
            speed_multiplier: 2.5,
            speed_accel_multiplier: 1.5,
            speed_duration: 6.0,
            slow_multiplier: 0.4,
            slow_duration: 10.0,
            immunity_duration: 5.0,
            growth_bonus: 3,
            shrink_reduction: 2,
            shrink_min_size: 3,
        }
    }
}

impl SpecialFoodConfig {
    fn chances(&self) -> [f32; 5] {
        [
            self.speed_chance,
            self.slow_chance,
            self.immunity_chance,
            self.growth_chance,
            self.shrink_chance,
        ]
    }
}

// === ENVIRONMENTAL EFFECTS ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    pub enabled: bool,
    /// Placement tries before a constrained spawn is skipped for the tick
    pub placement_attempts: u32,
    pub pull_field: PullFieldConfig,
    pub speed_zone: SpeedZoneConfig,
    pub attraction_field: AttractionFieldConfig,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            placement_attempts: 10,
            pull_field: PullFieldConfig::default(),
            speed_zone: SpeedZoneConfig::default(),
            attraction_field: AttractionFieldConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PullFieldConfig {
    pub enabled: bool,
    /// Visual core radius
    pub radius: f32,
    /// Influence radius
    pub pull_radius: f32,
    pub strength: f32,
    pub lifetime: f64,
    pub max_concurrent: usize,
    pub spawn_interval: f64,
    /// New fields keep at least this far from existing ones
    pub min_separation: f32,
    /// Entities closer than this to the center are left alone
    pub min_distance: f32,
    /// Velocity damping for snakes and creatures
    pub velocity_damping: f32,
    /// Position damping for food
    pub food_damping: f32,
    pub spawn_margin: f32,
}

impl Default for PullFieldConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 30.0,
            pull_radius: 120.0,
            strength: 2.0,
            lifetime: 15.0,
            max_concurrent: 2,
            spawn_interval: 20.0,
            min_separation: 200.0,
            min_distance: 5.0,
            velocity_damping: 0.3,
            food_damping: 0.1,
            spawn_margin: 50.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedZoneConfig {
    pub enabled: bool,
    pub radius: f32,
    pub fast_multiplier: f32,
    pub slow_multiplier: f32,
    pub lifetime: f64,
    pub max_concurrent: usize,
    pub spawn_interval: f64,
    pub spawn_margin: f32,
}

impl Default for SpeedZoneConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 80.0,
            fast_multiplier: 1.5,
            slow_multiplier: 0.5,
            lifetime: 12.0,
            max_concurrent: 3,
            spawn_interval: 15.0,
            spawn_margin: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttractionFieldConfig {
    pub enabled: bool,
    pub radius: f32,
    pub pull_radius: f32,
    pub strength: f32,
    pub lifetime: f64,
    pub max_concurrent: usize,
    pub spawn_interval: f64,
    pub min_distance: f32,
    pub food_damping: f32,
    pub spawn_margin: f32,
}

impl Default for AttractionFieldConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 20.0,
            pull_radius: 150.0,
            strength: 1.5,
            lifetime: 10.0,
            max_concurrent: 2,
            spawn_interval: 18.0,
            min_distance: 10.0,
            food_damping: 0.2,
            spawn_margin: 40.0,
        }
    }
}

// === CREATURES ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureConfig {
    pub pursuer: PursuerConfig,
    pub forager: ForagerConfig,
    /// Spawn positions keep this far from the arena edge
    pub spawn_margin: f32,
}

impl Default for CreatureConfig {
    fn default() -> Self {
        Self {
            pursuer: PursuerConfig::default(),
            forager: ForagerConfig::default(),
            spawn_margin: 50.0,
        }
    }
}

/// Shared movement profile of a creature archetype
///
/// Has no `Default`: a partial `motion` table is filled from the owning
/// archetype's profile (see `pursuer_motion` / `forager_motion`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureMotion {
    /// Multiplier on the snake base max speed
    pub speed_factor: f32,
    /// Multiplier on the snake base acceleration
    pub accel_factor: f32,
    pub detection_radius: f32,
    /// Contact distance for a kill (pursuer) or a bite (forager)
    pub contact_radius: f32,
    pub retarget_interval: f64,
    /// Fraction of acceleration used for random wander
    pub patrol_accel_factor: f32,
    /// Velocity multiplier applied every patrol tick
    pub patrol_drag: f32,
    /// Fraction of max speed allowed while patrolling
    pub patrol_speed_factor: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PursuerConfig {
    pub enabled: bool,
    #[serde(deserialize_with = "pursuer_motion")]
    pub motion: CreatureMotion,
    pub max_concurrent: usize,
    pub spawn_interval: f64,
    /// Hunter fraction of living snakes that triggers spawning
    pub hunter_fraction_threshold: f32,
    /// Below threshold * this factor, despawn timers start
    pub despawn_fraction_factor: f32,
    pub despawn_delay: f64,
}

impl Default for PursuerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            motion: CreatureMotion::pursuer(),
            max_concurrent: 3,
            spawn_interval: 5.0,
            hunter_fraction_threshold: 0.5,
            despawn_fraction_factor: 0.7,
            despawn_delay: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForagerConfig {
    pub enabled: bool,
    #[serde(deserialize_with = "forager_motion")]
    pub motion: CreatureMotion,
    pub max_concurrent: usize,
    pub spawn_interval: f64,
    /// Food count that triggers spawning
    pub food_abundance_threshold: usize,
    /// Below threshold * this factor, despawn timers start
    pub despawn_fraction_factor: f32,
    pub despawn_delay: f64,
    /// Meals after which a forager leaves
    pub satiation_limit: u32,
}

impl Default for ForagerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            motion: CreatureMotion::forager(),
            max_concurrent: 2,
            spawn_interval: 8.0,
            food_abundance_threshold: 10,
            despawn_fraction_factor: 0.5,
            despawn_delay: 10.0,
            satiation_limit: 10,
        }
    }
}

impl CreatureMotion {
    pub fn pursuer() -> Self {
        Self {
            speed_factor: 2.5,
            accel_factor: 3.0,
            detection_radius: 150.0,
            contact_radius: 20.0,
            retarget_interval: 0.5,
            patrol_accel_factor: 0.3,
            patrol_drag: 0.95,
            patrol_speed_factor: 0.4,
        }
    }

    pub fn forager() -> Self {
        Self {
            speed_factor: 1.8,
            accel_factor: 2.0,
            detection_radius: 120.0,
            contact_radius: 8.0,
            retarget_interval: 0.3,
            patrol_accel_factor: 0.2,
            patrol_drag: 0.92,
            patrol_speed_factor: 0.3,
        }
    }
}

/// Keys present in a `motion` table; absent keys keep the archetype value
#[derive(Debug, Deserialize)]
struct MotionOverrides {
    speed_factor: Option<f32>,
    accel_factor: Option<f32>,
    detection_radius: Option<f32>,
    contact_radius: Option<f32>,
    retarget_interval: Option<f64>,
    patrol_accel_factor: Option<f32>,
    patrol_drag: Option<f32>,
    patrol_speed_factor: Option<f32>,
}

impl MotionOverrides {
    fn merge_onto(self, base: CreatureMotion) -> CreatureMotion {
        CreatureMotion {
            speed_factor: self.speed_factor.unwrap_or(base.speed_factor),
            accel_factor: self.accel_factor.unwrap_or(base.accel_factor),
            detection_radius: self.detection_radius.unwrap_or(base.detection_radius),
            contact_radius: self.contact_radius.unwrap_or(base.contact_radius),
            retarget_interval: self.retarget_interval.unwrap_or(base.retarget_interval),
            patrol_accel_factor: self.patrol_accel_factor.unwrap_or(base.patrol_accel_factor),
            patrol_drag: self.patrol_drag.unwrap_or(base.patrol_drag),
            patrol_speed_factor: self.patrol_speed_factor.unwrap_or(base.patrol_speed_factor),
        }
    }
}

fn pursuer_motion<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<CreatureMotion, D::Error> {
    Ok(MotionOverrides::deserialize(de)?.merge_onto(CreatureMotion::pursuer()))
}

fn forager_motion<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<CreatureMotion, D::Error> {
    Ok(MotionOverrides::deserialize(de)?.merge_onto(CreatureMotion::forager()))
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a (possibly partial) TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(SimError::InvalidConfig(msg));

        if self.world.width <= 0.0 || self.world.height <= 0.0 {
            return invalid(format!(
                "world dimensions must be positive ({}x{})",
                self.world.width, self.world.height
            ));
        }
        if self.world.grid_cell_size <= 0.0 {
            return invalid("grid_cell_size must be positive".into());
        }
        if self.world.tick_seconds <= 0.0 {
            return invalid("tick_seconds must be positive".into());
        }
        if self.snake.initial_length == 0 {
            return invalid("initial_length must be at least 1".into());
        }
        if self.snake.min_max_speed <= 0.0 || self.snake.min_acceleration <= 0.0 {
            return invalid("speed and acceleration floors must be positive".into());
        }
        if self.snake.spawn_interval_min > self.snake.spawn_interval_max {
            return invalid(format!(
                "spawn_interval_min ({}) should be <= spawn_interval_max ({})",
                self.snake.spawn_interval_min, self.snake.spawn_interval_max
            ));
        }
        if self.starvation.warning_seconds >= self.starvation.death_seconds {
            return invalid(format!(
                "starvation warning_seconds ({}) should be < death_seconds ({})",
                self.starvation.warning_seconds, self.starvation.death_seconds
            ));
        }

        let chances = self.food.special.chances();
        if chances.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return invalid("special food chances must lie in [0, 1]".into());
        }
        if chances.iter().sum::<f32>() > 1.0 {
            return invalid("special food chances must sum to at most 1".into());
        }
        if self.food.special.shrink_min_size == 0 {
            return invalid("shrink_min_size must be at least 1".into());
        }

        let pull = &self.effects.pull_field;
        if pull.pull_radius <= pull.min_distance {
            return invalid("pull_radius must exceed min_distance".into());
        }
        let attraction = &self.effects.attraction_field;
        if attraction.pull_radius <= attraction.min_distance {
            return invalid("attraction pull_radius must exceed min_distance".into());
        }
        if self.effects.placement_attempts == 0 {
            return invalid("placement_attempts must be at least 1".into());
        }

        let pursuer = &self.creatures.pursuer;
        if !(0.0..=1.0).contains(&pursuer.hunter_fraction_threshold) {
            return invalid("hunter_fraction_threshold must lie in [0, 1]".into());
        }

        let forager = &self.creatures.forager;
        let radii = [
            ("snake.segment_radius", self.snake.segment_radius),
            ("behavior.threat_detection_radius", self.behavior.threat_detection_radius),
            ("food.radius", self.food.radius),
            ("effects.pull_field.radius", pull.radius),
            ("effects.speed_zone.radius", self.effects.speed_zone.radius),
            ("effects.attraction_field.radius", attraction.radius),
            ("creatures.pursuer.motion.detection_radius", pursuer.motion.detection_radius),
            ("creatures.pursuer.motion.contact_radius", pursuer.motion.contact_radius),
            ("creatures.forager.motion.detection_radius", forager.motion.detection_radius),
            ("creatures.forager.motion.contact_radius", forager.motion.contact_radius),
        ];
        if let Some((name, value)) = radii.iter().find(|(_, r)| *r <= 0.0) {
            return invalid(format!("{name} must be positive ({value})"));
        }

        Ok(())
    }
}
