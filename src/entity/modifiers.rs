//! Reversible timed modifiers on movement stats
//!
//! Entities never overwrite their speed with a multiplied value. Effective
//! stats are always `baseline * product(active factors)`, so removing the
//! last modifier gives back the baseline bit for bit, whatever order the
//! modifiers were pushed and popped in.

use serde::{Deserialize, Serialize};

use crate::core::types::{EffectId, SimTime};
use crate::entity::food::FoodKind;

/// What a modifier does while active
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ModifierKind {
    SpeedBoost { speed: f32, accel: f32 },
    Slow { speed: f32 },
    Immunity,
    SpeedZone { multiplier: f32 },
}

impl ModifierKind {
    pub fn label(&self) -> &'static str {
        match self {
            ModifierKind::SpeedBoost { .. } => "speed_boost",
            ModifierKind::Slow { .. } => "slow",
            ModifierKind::Immunity => "immunity",
            ModifierKind::SpeedZone { .. } => "speed_zone",
        }
    }

    fn speed_factor(&self) -> f32 {
        match *self {
            ModifierKind::SpeedBoost { speed, .. } => speed,
            ModifierKind::Slow { speed } => speed,
            ModifierKind::SpeedZone { multiplier } => multiplier,
            ModifierKind::Immunity => 1.0,
        }
    }

    fn accel_factor(&self) -> f32 {
        match *self {
            ModifierKind::SpeedBoost { accel, .. } => accel,
            _ => 1.0,
        }
    }
}

/// Who installed a modifier, and therefore who may remove it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierSource {
    /// Eaten special food; one entry per food kind, refreshed on re-eat
    Food(FoodKind),
    /// A speed zone the entity is standing in
    Zone(EffectId),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub source: ModifierSource,
    pub kind: ModifierKind,
    /// `None` for modifiers removed by their source rather than by time
    pub expires_at: Option<SimTime>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModifierStack {
    entries: Vec<Modifier>,
}

impl ModifierStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a modifier, replacing any entry from the same source
    ///
    /// Returns the replaced entry, if any.
    pub fn push(&mut self, modifier: Modifier) -> Option<Modifier> {
        let replaced = self.remove_source(modifier.source);
        self.entries.push(modifier);
        replaced
    }

    pub fn remove_source(&mut self, source: ModifierSource) -> Option<Modifier> {
        let pos = self.entries.iter().position(|m| m.source == source)?;
        Some(self.entries.remove(pos))
    }

    pub fn has_source(&self, source: ModifierSource) -> bool {
        self.entries.iter().any(|m| m.source == source)
    }

    /// Unwind every timed entry whose expiry is at or before `now`
    pub fn expire(&mut self, now: SimTime) -> Vec<Modifier> {
        let mut expired = Vec::new();
        self.entries.retain(|m| match m.expires_at {
            Some(at) if now >= at => {
                expired.push(*m);
                false
            }
            _ => true,
        });
        expired
    }

    pub fn clear(&mut self) -> Vec<Modifier> {
        std::mem::take(&mut self.entries)
    }

    pub fn speed_factor(&self) -> f32 {
        self.entries.iter().map(|m| m.kind.speed_factor()).product()
    }

    pub fn accel_factor(&self) -> f32 {
        self.entries.iter().map(|m| m.kind.accel_factor()).product()
    }

    /// Apply the stack to a baseline max speed
    pub fn apply_speed(&self, baseline: f32) -> f32 {
        if self.entries.is_empty() {
            baseline
        } else {
            baseline * self.speed_factor()
        }
    }

    pub fn apply_accel(&self, baseline: f32) -> f32 {
        if self.entries.is_empty() {
            baseline
        } else {
            baseline * self.accel_factor()
        }
    }

    pub fn is_immune(&self) -> bool {
        self.entries.iter().any(|m| m.kind == ModifierKind::Immunity)
    }

    pub fn entries(&self) -> &[Modifier] {
        &self.entries
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.entries.iter().map(|m| m.kind.label()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
