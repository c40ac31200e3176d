//! Food items and their effect payloads

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::SpecialFoodConfig;
use crate::core::types::{SimTime, Vec2};
use crate::entity::modifiers::ModifierKind;
use crate::simulation::pool::Poolable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodKind {
    #[default]
    Normal,
    Speed,
    Slow,
    Immunity,
    Growth,
    Shrink,
}

/// What eating a food item does beyond the basic meal
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FoodPayload {
    None,
    Timed { kind: ModifierKind, duration: SimTime },
    Grow(u32),
    Shrink { amount: u32, min_size: u32 },
}

impl FoodKind {
    pub const SPECIAL: [FoodKind; 5] = [
        FoodKind::Speed,
        FoodKind::Slow,
        FoodKind::Immunity,
        FoodKind::Growth,
        FoodKind::Shrink,
    ];

    pub fn is_enabled(&self, cfg: &SpecialFoodConfig) -> bool {
        match self {
            FoodKind::Normal => true,
            FoodKind::Speed => cfg.enable_speed,
            FoodKind::Slow => cfg.enable_slow,
            FoodKind::Immunity => cfg.enable_immunity,
            FoodKind::Growth => cfg.enable_growth,
            FoodKind::Shrink => cfg.enable_shrink,
        }
    }

    pub fn spawn_chance(&self, cfg: &SpecialFoodConfig) -> f32 {
        match self {
            FoodKind::Normal => 0.0,
            FoodKind::Speed => cfg.speed_chance,
            FoodKind::Slow => cfg.slow_chance,
            FoodKind::Immunity => cfg.immunity_chance,
            FoodKind::Growth => cfg.growth_chance,
            FoodKind::Shrink => cfg.shrink_chance,
        }
    }

    /// Fixed payload of this kind; disabled kinds behave like normal food
    pub fn payload(&self, cfg: &SpecialFoodConfig) -> FoodPayload {
        if !self.is_enabled(cfg) {
            return FoodPayload::None;
        }
        match self {
            FoodKind::Normal => FoodPayload::None,
            FoodKind::Speed => FoodPayload::Timed {
                kind: ModifierKind::SpeedBoost {
                    speed: cfg.speed_multiplier,
                    accel: cfg.speed_accel_multiplier,
                },
                duration: cfg.speed_duration,
            },
            FoodKind::Slow => FoodPayload::Timed {
                kind: ModifierKind::Slow {
                    speed: cfg.slow_multiplier,
                },
                duration: cfg.slow_duration,
            },
            FoodKind::Immunity => FoodPayload::Timed {
                kind: ModifierKind::Immunity,
                duration: cfg.immunity_duration,
            },
            FoodKind::Growth => FoodPayload::Grow(cfg.growth_bonus),
            FoodKind::Shrink => FoodPayload::Shrink {
                amount: cfg.shrink_reduction,
                min_size: cfg.shrink_min_size,
            },
        }
    }

    /// Roll a kind for a new food item: one draw against the cumulative
    /// chances of the enabled special kinds, normal otherwise
    pub fn roll<R: Rng>(rng: &mut R, cfg: &SpecialFoodConfig) -> FoodKind {
        let roll: f32 = rng.gen();
        let mut cumulative = 0.0;
        for kind in FoodKind::SPECIAL {
            if !kind.is_enabled(cfg) {
                continue;
            }
            cumulative += kind.spawn_chance(cfg);
            if roll < cumulative {
                return kind;
            }
        }
        FoodKind::Normal
    }
}

/// Construction arguments for a pooled food item
#[derive(Debug, Clone, Copy)]
pub struct FoodSpawn {
    pub position: Vec2,
    pub kind: FoodKind,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Food {
    pub position: Vec2,
    pub kind: FoodKind,
    pub radius: f32,
}

impl Food {
    pub fn new(spawn: FoodSpawn) -> Self {
        Self {
            position: spawn.position,
            kind: spawn.kind,
            radius: spawn.radius,
        }
    }
}

impl Poolable for Food {
    type Spawn = FoodSpawn;

    fn reset(&mut self, spawn: FoodSpawn) {
        *self = Food::new(spawn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_disabled_kind_has_no_payload() {
        let mut cfg = SpecialFoodConfig::default();
        cfg.enable_growth = false;
        assert_eq!(FoodKind::Growth.payload(&cfg), FoodPayload::None);
        assert!(!FoodKind::Growth.is_enabled(&cfg));
    }

    #[test]
    fn test_payloads_match_config() {
        let cfg = SpecialFoodConfig::default();
        assert_eq!(FoodKind::Growth.payload(&cfg), FoodPayload::Grow(3));
        assert_eq!(
            FoodKind::Shrink.payload(&cfg),
            FoodPayload::Shrink { amount: 2, min_size: 3 }
        );
        match FoodKind::Slow.payload(&cfg) {
            FoodPayload::Timed { kind, duration } => {
                assert_eq!(kind, ModifierKind::Slow { speed: 0.4 });
                assert_eq!(duration, 10.0);
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_roll_respects_disabled_kinds() {
        let mut cfg = SpecialFoodConfig::default();
        cfg.enable_speed = false;
        cfg.enable_slow = false;
        cfg.enable_immunity = false;
        cfg.enable_growth = false;
        cfg.enable_shrink = false;
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..200 {
            assert_eq!(FoodKind::roll(&mut rng, &cfg), FoodKind::Normal);
        }
    }

    #[test]
    fn test_roll_with_certain_chance() {
        let mut cfg = SpecialFoodConfig::default();
        cfg.speed_chance = 1.0;
        cfg.slow_chance = 0.0;
        cfg.immunity_chance = 0.0;
        cfg.growth_chance = 0.0;
        cfg.shrink_chance = 0.0;
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(FoodKind::roll(&mut rng, &cfg), FoodKind::Speed);
        }
    }

    #[test]
    fn test_reset_overwrites_everything() {
        let mut food = Food::new(FoodSpawn {
            position: Vec2::new(1.0, 2.0),
            kind: FoodKind::Growth,
            radius: 9.0,
        });
        food.position += Vec2::new(10.0, 10.0);
        let spawn = FoodSpawn {
            position: Vec2::new(5.0, 5.0),
            kind: FoodKind::Normal,
            radius: 7.0,
        };
        food.reset(spawn);
        assert_eq!(food, Food::new(spawn));
    }
}
