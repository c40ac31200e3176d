//! Per-tick lifecycle checks: timed modifier expiry and starvation

use crate::ecs::world::World;
use crate::entity::snake::{DeathReason, StarvationStatus};
use crate::simulation::tick::{ModifierTarget, SimulationEvent};

/// Unwind every food modifier whose time is up
pub fn expire_modifiers(world: &mut World, events: &mut Vec<SimulationEvent>) {
    let now = world.elapsed;
    for snake in world.snakes.iter_mut().filter(|s| s.is_alive()) {
        for modifier in snake.expire_modifiers(now) {
            tracing::debug!(agent = snake.id.0, effect = modifier.kind.label(), "Food effect expired");
            events.push(SimulationEvent::ModifierExpired {
                target: ModifierTarget::Snake(snake.id),
                modifier,
            });
        }
    }
}

/// Flag hungry snakes and kill starved ones
pub fn check_starvation(world: &mut World, events: &mut Vec<SimulationEvent>) {
    let now = world.elapsed;
    let cfg = &world.config.starvation;
    for snake in world.snakes.iter_mut().filter(|s| s.is_alive()) {
        let was_starving = snake.is_starving();
        match snake.check_starvation(now, cfg) {
            StarvationStatus::Starved => events.push(SimulationEvent::Death {
                agent: snake.id,
                reason: DeathReason::Starvation,
                size: snake.size(),
                time: now,
            }),
            StarvationStatus::Starving if !was_starving => {
                tracing::debug!(agent = snake.id.0, hungry_for = now - snake.last_meal(), "Snake starving");
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::core::types::Vec2;
    use crate::entity::food::FoodKind;
    use crate::entity::modifiers::{Modifier, ModifierKind, ModifierSource};

    fn world() -> World {
        let mut config = SimulationConfig::default();
        config.food.max_on_screen = 0;
        World::new(config).unwrap()
    }

    #[test]
    fn test_timed_modifier_expires() {
        let mut w = world();
        let id = w.spawn_snake_at(Vec2::new(300.0, 300.0));
        let modifier = Modifier {
            source: ModifierSource::Food(FoodKind::Slow),
            kind: ModifierKind::Slow { speed: 0.4 },
            expires_at: Some(10.0),
        };
        w.snake_mut(id).unwrap().apply_modifier(modifier);

        let mut events = Vec::new();
        w.elapsed = 9.9;
        expire_modifiers(&mut w, &mut events);
        assert!(events.is_empty());

        w.elapsed = 10.0;
        expire_modifiers(&mut w, &mut events);
        assert_eq!(
            events,
            vec![SimulationEvent::ModifierExpired {
                target: ModifierTarget::Snake(id),
                modifier,
            }]
        );
        assert_eq!(w.snake(id).unwrap().max_speed(), 5.0);
    }

    #[test]
    fn test_starvation_thresholds() {
        let mut w = world();
        let id = w.spawn_snake_at(Vec2::new(300.0, 300.0));

        w.elapsed = 9.0;
        let mut events = Vec::new();
        check_starvation(&mut w, &mut events);
        assert!(w.snake(id).unwrap().is_starving());
        assert!(events.is_empty());

        w.elapsed = 10.01;
        check_starvation(&mut w, &mut events);
        let death = w.snake(id).unwrap().death().unwrap();
        assert_eq!(death.reason, DeathReason::Starvation);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_starvation_disabled() {
        let mut w = world();
        w.config.starvation.enabled = false;
        let id = w.spawn_snake_at(Vec2::new(300.0, 300.0));
        w.elapsed = 60.0;
        check_starvation(&mut w, &mut Vec::new());
        assert!(w.snake(id).unwrap().is_alive());
    }
}
