//! Environmental effects: pull fields, speed zones and attraction fields
//!
//! Each tick runs expire, then apply, then spawn. Speed zones install a
//! `Zone(id)` modifier on entities inside them and remove it when the entity
//! leaves or the zone expires, so no stale multiplier survives either way.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::{
    AttractionFieldConfig, EffectsConfig, PullFieldConfig, SpeedZoneConfig,
};
use crate::core::types::{EffectId, SimTime, Vec2};
use crate::ecs::world::{random_point, World};
use crate::entity::modifiers::{Modifier, ModifierKind, ModifierSource};
use crate::simulation::tick::{ModifierTarget, SimulationEvent};

/// Effect discriminant for events, timers and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectTag {
    PullField,
    SpeedZone,
    AttractionField,
}

impl fmt::Display for EffectTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EffectTag::PullField => "pull_field",
            EffectTag::SpeedZone => "speed_zone",
            EffectTag::AttractionField => "attraction_field",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectKind {
    /// Pulls snakes, creatures (velocity) and food (position) inward
    PullField {
        radius: f32,
        pull_radius: f32,
        strength: f32,
        min_distance: f32,
        velocity_damping: f32,
        food_damping: f32,
    },
    /// Scales the max speed of anything inside it
    SpeedZone { radius: f32, multiplier: f32 },
    /// Pulls food only
    AttractionField {
        radius: f32,
        pull_radius: f32,
        strength: f32,
        min_distance: f32,
        food_damping: f32,
    },
}

impl EffectKind {
    pub fn pull_field(cfg: &PullFieldConfig) -> Self {
        EffectKind::PullField {
            radius: cfg.radius,
            pull_radius: cfg.pull_radius,
            strength: cfg.strength,
            min_distance: cfg.min_distance,
            velocity_damping: cfg.velocity_damping,
            food_damping: cfg.food_damping,
        }
    }

    pub fn speed_zone(cfg: &SpeedZoneConfig, fast: bool) -> Self {
        EffectKind::SpeedZone {
            radius: cfg.radius,
            multiplier: if fast { cfg.fast_multiplier } else { cfg.slow_multiplier },
        }
    }

    pub fn attraction_field(cfg: &AttractionFieldConfig) -> Self {
        EffectKind::AttractionField {
            radius: cfg.radius,
            pull_radius: cfg.pull_radius,
            strength: cfg.strength,
            min_distance: cfg.min_distance,
            food_damping: cfg.food_damping,
        }
    }

    pub fn tag(&self) -> EffectTag {
        match self {
            EffectKind::PullField { .. } => EffectTag::PullField,
            EffectKind::SpeedZone { .. } => EffectTag::SpeedZone,
            EffectKind::AttractionField { .. } => EffectTag::AttractionField,
        }
    }

    /// Visual core radius
    pub fn radius(&self) -> f32 {
        match *self {
            EffectKind::PullField { radius, .. }
            | EffectKind::SpeedZone { radius, .. }
            | EffectKind::AttractionField { radius, .. } => radius,
        }
    }

    /// Radius within which the effect acts
    pub fn influence_radius(&self) -> f32 {
        match *self {
            EffectKind::PullField { pull_radius, .. }
            | EffectKind::AttractionField { pull_radius, .. } => pull_radius,
            EffectKind::SpeedZone { radius, .. } => radius,
        }
    }

    pub fn lifetime(&self, cfg: &EffectsConfig) -> f64 {
        match self.tag() {
            EffectTag::PullField => cfg.pull_field.lifetime,
            EffectTag::SpeedZone => cfg.speed_zone.lifetime,
            EffectTag::AttractionField => cfg.attraction_field.lifetime,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalEffect {
    pub id: EffectId,
    pub kind: EffectKind,
    pub position: Vec2,
    pub created_at: SimTime,
    pub lifetime: f64,
}

impl EnvironmentalEffect {
    /// Influence ends once the age strictly exceeds the lifetime
    pub fn is_expired(&self, now: SimTime) -> bool {
        now - self.created_at > self.lifetime
    }

    pub fn remaining(&self, now: SimTime) -> f64 {
        (self.lifetime - (now - self.created_at)).max(0.0)
    }
}

/// Inward pull for something at `pos`, before damping
///
/// Zero outside `pull_radius` and inside the `min_distance` guard.
pub fn pull_toward(
    center: Vec2,
    pos: Vec2,
    pull_radius: f32,
    strength: f32,
    min_distance: f32,
) -> Option<Vec2> {
    let offset = center - pos;
    let distance = offset.length();
    if distance < pull_radius && distance > min_distance {
        let force = strength * (pull_radius - distance) / pull_radius;
        Some(offset / distance * force)
    } else {
        None
    }
}

/// Remove expired effects; speed zones release every entity they hold
pub fn expire_effects(world: &mut World, events: &mut Vec<SimulationEvent>) {
    let now = world.elapsed;
    let (expired, active): (Vec<_>, Vec<_>) = world
        .effects
        .drain(..)
        .partition(|effect| effect.is_expired(now));
    world.effects = active;

    for effect in expired {
        if let EffectKind::SpeedZone { .. } = effect.kind {
            release_zone(world, effect.id, events);
        }
        tracing::info!(effect = effect.id.0, kind = %effect.kind.tag(), "Effect expired");
        events.push(SimulationEvent::EffectExpired {
            effect: effect.id,
            kind: effect.kind.tag(),
        });
    }
}

fn release_zone(world: &mut World, id: EffectId, events: &mut Vec<SimulationEvent>) {
    let source = ModifierSource::Zone(id);
    for snake in &mut world.snakes {
        if let Some(modifier) = snake.remove_modifier(source) {
            events.push(SimulationEvent::ModifierExpired {
                target: ModifierTarget::Snake(snake.id),
                modifier,
            });
        }
    }
    for creature in &mut world.creatures {
        if let Some(modifier) = creature.remove_modifier(source) {
            events.push(SimulationEvent::ModifierExpired {
                target: ModifierTarget::Creature(creature.id),
                modifier,
            });
        }
    }
}

/// Apply every active effect once
pub fn apply_effects(world: &mut World, events: &mut Vec<SimulationEvent>) {
    for i in 0..world.effects.len() {
        let effect = world.effects[i];
        match effect.kind {
            EffectKind::PullField {
                pull_radius,
                strength,
                min_distance,
                velocity_damping,
                food_damping,
                ..
            } => {
                let pull = |pos: Vec2| pull_toward(effect.position, pos, pull_radius, strength, min_distance);
                for snake in world.snakes.iter_mut().filter(|s| s.is_alive()) {
                    if let Some(force) = pull(snake.head()) {
                        snake.add_impulse(force * velocity_damping);
                    }
                }
                for creature in world.creatures.iter_mut().filter(|c| c.is_alive()) {
                    if let Some(force) = pull(creature.position) {
                        creature.add_impulse(force * velocity_damping);
                    }
                }
                for (_, item) in world.food.iter_active_mut() {
                    if let Some(force) = pull(item.position) {
                        item.position += force * food_damping;
                    }
                }
            }
            EffectKind::SpeedZone { radius, multiplier } => {
                apply_speed_zone(world, &effect, radius, multiplier, events);
            }
            EffectKind::AttractionField {
                pull_radius,
                strength,
                min_distance,
                food_damping,
                ..
            } => {
                for (_, item) in world.food.iter_active_mut() {
                    if let Some(force) =
                        pull_toward(effect.position, item.position, pull_radius, strength, min_distance)
                    {
                        item.position += force * food_damping;
                    }
                }
            }
        }
    }
}

fn apply_speed_zone(
    world: &mut World,
    effect: &EnvironmentalEffect,
    radius: f32,
    multiplier: f32,
    events: &mut Vec<SimulationEvent>,
) {
    let source = ModifierSource::Zone(effect.id);
    let modifier = Modifier {
        source,
        kind: ModifierKind::SpeedZone { multiplier },
        expires_at: None,
    };

    for snake in world.snakes.iter_mut().filter(|s| s.is_alive()) {
        let inside = snake.head().distance(effect.position) < radius;
        let target = ModifierTarget::Snake(snake.id);
        match (inside, snake.has_modifier(source)) {
            (true, false) => {
                snake.apply_modifier(modifier);
                events.push(SimulationEvent::ModifierApplied { target, modifier });
            }
            (false, true) => {
                if let Some(removed) = snake.remove_modifier(source) {
                    events.push(SimulationEvent::ModifierExpired {
                        target,
                        modifier: removed,
                    });
                }
            }
            _ => {}
        }
    }

    for creature in world.creatures.iter_mut().filter(|c| c.is_alive()) {
        let inside = creature.position.distance(effect.position) < radius;
        let target = ModifierTarget::Creature(creature.id);
        match (inside, creature.has_modifier(source)) {
            (true, false) => {
                creature.apply_modifier(modifier);
                events.push(SimulationEvent::ModifierApplied { target, modifier });
            }
            (false, true) => {
                if let Some(removed) = creature.remove_modifier(source) {
                    events.push(SimulationEvent::ModifierExpired {
                        target,
                        modifier: removed,
                    });
                }
            }
            _ => {}
        }
    }
}

/// Run each kind's spawn policy
pub fn spawn_effects(world: &mut World, events: &mut Vec<SimulationEvent>) {
    if !world.config.effects.enabled {
        return;
    }
    let now = world.elapsed;
    let cfg = world.config.effects.clone();

    let pull = &cfg.pull_field;
    if pull.enabled
        && count(world, EffectTag::PullField) < pull.max_concurrent
        && now - world.timers.last_pull_field > pull.spawn_interval
    {
        world.timers.last_pull_field = now;
        let margin = pull.radius + pull.spawn_margin;
        match place_separated(world, margin, pull.min_separation, cfg.placement_attempts) {
            Some(pos) => spawn(world, pos, EffectKind::pull_field(pull), events),
            None => tracing::info!(
                attempts = cfg.placement_attempts,
                "No valid pull field placement, skipping spawn"
            ),
        }
    }

    let zone = &cfg.speed_zone;
    if zone.enabled
        && count(world, EffectTag::SpeedZone) < zone.max_concurrent
        && now - world.timers.last_speed_zone > zone.spawn_interval
    {
        world.timers.last_speed_zone = now;
        let pos = random_point(&mut world.rng, &world.config.world, zone.radius + zone.spawn_margin);
        let fast = world.rng.gen_bool(0.5);
        spawn(world, pos, EffectKind::speed_zone(zone, fast), events);
    }

    let attraction = &cfg.attraction_field;
    if attraction.enabled
        && count(world, EffectTag::AttractionField) < attraction.max_concurrent
        && now - world.timers.last_attraction_field > attraction.spawn_interval
    {
        world.timers.last_attraction_field = now;
        let margin = attraction.radius + attraction.spawn_margin;
        let pos = random_point(&mut world.rng, &world.config.world, margin);
        spawn(world, pos, EffectKind::attraction_field(attraction), events);
    }
}

fn count(world: &World, tag: EffectTag) -> usize {
    world.effects.iter().filter(|e| e.kind.tag() == tag).count()
}

fn spawn(world: &mut World, pos: Vec2, kind: EffectKind, events: &mut Vec<SimulationEvent>) {
    let effect = world.spawn_effect_at(pos, kind);
    events.push(SimulationEvent::EffectSpawned {
        effect,
        kind: kind.tag(),
        position: pos,
    });
}

/// Random placement at least `separation` from every existing pull field
fn place_separated(world: &mut World, margin: f32, separation: f32, attempts: u32) -> Option<Vec2> {
    for _ in 0..attempts {
        let candidate = random_point(&mut world.rng, &world.config.world, margin);
        let clear = world
            .effects
            .iter()
            .filter(|e| e.kind.tag() == EffectTag::PullField)
            .all(|e| e.position.distance(candidate) >= separation);
        if clear {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;

    fn world() -> World {
        let mut config = SimulationConfig::default();
        config.food.max_on_screen = 0;
        World::new(config).unwrap()
    }

    #[test]
    fn test_pull_toward_radius_and_guard() {
        let inside = pull_toward(Vec2::ZERO, Vec2::new(60.0, 0.0), 120.0, 2.0, 5.0).unwrap();
        assert!(inside.x < 0.0);
        assert!((inside.length() - 1.0).abs() < 1e-6);

        assert!(pull_toward(Vec2::ZERO, Vec2::new(200.0, 0.0), 120.0, 2.0, 5.0).is_none());
        assert!(pull_toward(Vec2::ZERO, Vec2::new(3.0, 0.0), 120.0, 2.0, 5.0).is_none());
    }

    #[test]
    fn test_expiry_is_strict() {
        let effect = EnvironmentalEffect {
            id: EffectId(1),
            kind: EffectKind::speed_zone(&SpeedZoneConfig::default(), true),
            position: Vec2::ZERO,
            created_at: 1.0,
            lifetime: 12.0,
        };
        assert!(!effect.is_expired(13.0));
        assert!(effect.is_expired(13.01));
        assert_eq!(effect.remaining(20.0), 0.0);
    }

    #[test]
    fn test_speed_zone_enter_leave_restores() {
        let mut world = world();
        let id = world.spawn_snake_at(Vec2::new(500.0, 400.0));
        let before = world.snake(id).unwrap().max_speed();
        let zone = EffectKind::speed_zone(&world.config.effects.speed_zone, true);
        world.spawn_effect_at(Vec2::new(520.0, 400.0), zone);

        let mut events = Vec::new();
        apply_effects(&mut world, &mut events);
        assert_eq!(world.snake(id).unwrap().max_speed(), before * 1.5);
        assert!(matches!(events[0], SimulationEvent::ModifierApplied { .. }));

        // Re-applying while inside does not stack
        apply_effects(&mut world, &mut events);
        assert_eq!(world.snake(id).unwrap().max_speed(), before * 1.5);

        world.effects[0].position = Vec2::new(900.0, 100.0);
        apply_effects(&mut world, &mut events);
        assert_eq!(world.snake(id).unwrap().max_speed(), before);
        assert!(matches!(events.last(), Some(SimulationEvent::ModifierExpired { .. })));
    }

    #[test]
    fn test_zone_expiry_releases_entities() {
        let mut world = world();
        let id = world.spawn_snake_at(Vec2::new(500.0, 400.0));
        let before = world.snake(id).unwrap().max_speed();
        let zone = EffectKind::speed_zone(&world.config.effects.speed_zone, false);
        world.spawn_effect_at(Vec2::new(500.0, 400.0), zone);

        let mut events = Vec::new();
        apply_effects(&mut world, &mut events);
        assert_eq!(world.snake(id).unwrap().max_speed(), before * 0.5);

        world.elapsed = 12.5;
        expire_effects(&mut world, &mut events);
        assert!(world.effects.is_empty());
        assert_eq!(world.snake(id).unwrap().max_speed(), before);
        assert!(events
            .iter()
            .any(|e| matches!(e, SimulationEvent::EffectExpired { kind: EffectTag::SpeedZone, .. })));
    }

    #[test]
    fn test_attraction_moves_only_food() {
        let mut world = world();
        let id = world.spawn_snake_at(Vec2::new(550.0, 400.0));
        let food = world.spawn_food_at(Vec2::new(550.0, 420.0), crate::entity::food::FoodKind::Normal);
        let kind = EffectKind::attraction_field(&world.config.effects.attraction_field);
        world.spawn_effect_at(Vec2::new(500.0, 400.0), kind);

        let mut events = Vec::new();
        apply_effects(&mut world, &mut events);
        assert_eq!(world.snake(id).unwrap().velocity(), Vec2::ZERO);
        assert!(world.food.get(food).unwrap().position.x < 550.0);
    }

    #[test]
    fn test_pull_field_placement_gives_up() {
        let mut world = world();
        world.config.effects.speed_zone.enabled = false;
        world.config.effects.attraction_field.enabled = false;
        world.config.effects.pull_field.min_separation = 5000.0;
        world.config.effects.pull_field.max_concurrent = 5;
        let kind = EffectKind::pull_field(&world.config.effects.pull_field);
        world.spawn_effect_at(Vec2::new(500.0, 400.0), kind);

        world.elapsed = 100.0;
        let mut events = Vec::new();
        spawn_effects(&mut world, &mut events);
        assert_eq!(world.effects.len(), 1);
        assert!(events.is_empty());
        assert_eq!(world.timers.last_pull_field, 100.0);
    }

    #[test]
    fn test_spawn_policy_respects_interval_and_cap() {
        let mut world = world();
        let mut events = Vec::new();

        world.elapsed = 10.0;
        spawn_effects(&mut world, &mut events);
        assert!(world.effects.is_empty());

        world.elapsed = 21.0;
        spawn_effects(&mut world, &mut events);
        let tags: Vec<EffectTag> = world.effects.iter().map(|e| e.kind.tag()).collect();
        assert!(tags.contains(&EffectTag::PullField));
        assert!(tags.contains(&EffectTag::SpeedZone));
        assert!(tags.contains(&EffectTag::AttractionField));
    }
}
