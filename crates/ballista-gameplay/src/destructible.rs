//! Damageable entities.
//!
//! A [`Destructible`] is a health pool that a projectile hit drains. On death
//! it is either removed from the scene or left in place with collision and
//! rendering disabled; the host applies that removal.

use std::collections::HashMap;

use ballista_common::EntityId;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Tuning for a destructible entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DestructibleConfig {
    /// Starting and maximum health.
    pub max_health: f32,
    /// Remove the entity on death instead of disabling it.
    pub destroy_on_death: bool,
    /// Effect spawned at the killing hit, if any.
    pub death_effect: Option<String>,
}

impl Default for DestructibleConfig {
    fn default() -> Self {
        Self {
            max_health: 50.0,
            destroy_on_death: true,
            death_effect: None,
        }
    }
}

/// What the host must do with a dead entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathRemoval {
    /// Despawn it.
    Destroy,
    /// Keep it but turn off its collider and renderer.
    Disable,
}

/// A one-off effect the host should spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectRequest {
    /// Effect asset name.
    pub effect: String,
    /// World position.
    pub position: Vec3,
    /// Direction the effect faces.
    pub facing: Vec3,
}

/// Result of applying damage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DamageOutcome {
    /// Health reduced, entity still alive.
    Damaged {
        /// Health after the hit.
        remaining: f32,
    },
    /// This hit killed the entity.
    Killed {
        /// How the host removes it.
        removal: DeathRemoval,
        /// Death effect to spawn.
        effect: Option<EffectRequest>,
    },
    /// Entity was already dead; nothing happened.
    AlreadyDead,
}

/// Health pool attached to an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destructible {
    config: DestructibleConfig,
    health: f32,
    dead: bool,
}

impl Destructible {
    /// Create at full health.
    #[must_use]
    pub fn new(config: DestructibleConfig) -> Self {
        Self {
            health: config.max_health,
            config,
            dead: false,
        }
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Check if dead.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.dead
    }

    /// Apply `amount` damage from a hit at `point` with surface `normal`.
    pub fn apply_damage(&mut self, amount: f32, point: Vec3, normal: Vec3) -> DamageOutcome {
        if self.dead {
            return DamageOutcome::AlreadyDead;
        }

        self.health -= amount;
        if self.health > 0.0 {
            return DamageOutcome::Damaged {
                remaining: self.health,
            };
        }

        self.dead = true;
        let removal = if self.config.destroy_on_death {
            DeathRemoval::Destroy
        } else {
            DeathRemoval::Disable
        };
        let effect = self.config.death_effect.as_ref().map(|effect| EffectRequest {
            effect: effect.clone(),
            position: point,
            facing: normal,
        });
        DamageOutcome::Killed { removal, effect }
    }
}

/// Destructibles in a scene, keyed by entity.
#[derive(Debug, Default)]
pub struct DestructibleRegistry {
    entries: HashMap<EntityId, Destructible>,
}

impl DestructibleRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a destructible for `entity`.
    pub fn insert(&mut self, entity: EntityId, destructible: Destructible) {
        self.entries.insert(entity, destructible);
    }

    /// Look up an entity.
    #[must_use]
    pub fn get(&self, entity: EntityId) -> Option<&Destructible> {
        self.entries.get(&entity)
    }

    /// Remove an entity.
    pub fn remove(&mut self, entity: EntityId) -> Option<Destructible> {
        self.entries.remove(&entity)
    }

    /// Apply damage to `entity`. Returns `None` if it isn't damageable.
    pub fn damage(
        &mut self,
        entity: EntityId,
        amount: f32,
        point: Vec3,
        normal: Vec3,
    ) -> Option<DamageOutcome> {
        let destructible = self.entries.get_mut(&entity)?;
        let outcome = destructible.apply_damage(amount, point, normal);
        match &outcome {
            DamageOutcome::Damaged { remaining } => {
                debug!(entity = entity.raw(), amount, remaining, "entity damaged");
            },
            DamageOutcome::Killed { removal, .. } => {
                info!(entity = entity.raw(), ?removal, "entity destroyed");
            },
            DamageOutcome::AlreadyDead => {},
        }
        Some(outcome)
    }

    /// Number of registered entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
