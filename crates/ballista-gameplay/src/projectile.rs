//! Projectile state and lifecycle policy.
//!
//! The host physics world integrates gravity and detects collisions. This
//! module owns the policy layered on top: what a projectile carries, how
//! long it may live, when its delayed fragmentation fires, and the one-shot
//! guard that lets exactly one terminal event through.

use ballista_common::{BodyHandle, ConfigError, EntityId, LayerMask, ProjectileId};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Default lifetime cap for a root projectile (seconds).
pub const DEFAULT_LIFETIME: f32 = 30.0;

/// Default lifetime cap for a fragment (seconds).
pub const DEFAULT_FRAGMENT_LIFETIME: f32 = 10.0;

/// Speed assumed for fragmentation when the parent's velocity can't be read.
pub const DEFAULT_FALLBACK_SPEED: f32 = 30.0;

/// Distance fragments spawn off the struck surface (metres).
pub const DEFAULT_FRAGMENT_CLEARANCE: f32 = 0.25;

/// Below this speed the stored forward direction is kept.
const MIN_HEADING_SPEED: f32 = 1e-3;

/// Instantaneous radial impulse applied at the impact point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplosionSpec {
    /// Radius of the affected sphere.
    pub radius: f32,
    /// Impulse magnitude at the centre.
    pub force: f32,
}

impl ExplosionSpec {
    /// Creates an explosion spec.
    #[must_use]
    pub const fn new(radius: f32, force: f32) -> Self {
        Self { radius, force }
    }

    /// Both radius and force must be positive for the explosion to do anything.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.radius > 0.0 && self.force > 0.0
    }
}

/// How a projectile splits into child projectiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FragmentSpec {
    /// Number of children spawned.
    pub count: u32,
    /// Maximum yaw and pitch deviation from the parent heading (degrees).
    pub spread_angle_degrees: f32,
    /// Child speed relative to the parent's speed.
    pub speed_multiplier: f32,
    /// Seconds after launch to fragment in flight; zero or negative disables the timer.
    pub delay_seconds: f32,
    /// Fragment when the projectile collides.
    pub on_impact: bool,
}

impl Default for FragmentSpec {
    fn default() -> Self {
        Self {
            count: 6,
            spread_angle_degrees: 20.0,
            speed_multiplier: 0.75,
            delay_seconds: -1.0,
            on_impact: false,
        }
    }
}

impl FragmentSpec {
    /// Pending timer duration, if the delayed trigger is enabled.
    #[must_use]
    pub fn timer(&self) -> Option<f32> {
        (self.delay_seconds > 0.0).then_some(self.delay_seconds)
    }

    /// Whether spawning would produce any children.
    #[must_use]
    pub fn produces_children(&self) -> bool {
        self.count > 0 && self.speed_multiplier > 0.0
    }
}

/// Configurable projectile blueprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTemplate {
    /// Damage applied to a damageable entity on hit.
    pub damage: f32,
    /// Explosion on impact.
    pub explosion: Option<ExplosionSpec>,
    /// Fragmentation behaviour.
    pub fragmentation: Option<FragmentSpec>,
    /// Lifetime cap of the root projectile.
    pub lifetime: f32,
    /// Lifetime cap of each fragment.
    pub fragment_lifetime: f32,
    /// Layers affected by the explosion.
    pub hit_mask: LayerMask,
    /// Base speed for fragments when the body velocity is unavailable.
    pub fallback_speed: f32,
    /// Offset of impact fragments from the contact point along its normal.
    pub fragment_clearance: f32,
}

impl Default for ProjectileTemplate {
    fn default() -> Self {
        Self {
            damage: 25.0,
            explosion: None,
            fragmentation: None,
            lifetime: DEFAULT_LIFETIME,
            fragment_lifetime: DEFAULT_FRAGMENT_LIFETIME,
            hit_mask: LayerMask::ALL,
            fallback_speed: DEFAULT_FALLBACK_SPEED,
            fragment_clearance: DEFAULT_FRAGMENT_CLEARANCE,
        }
    }
}

impl ProjectileTemplate {
    /// Set damage.
    #[must_use]
    pub fn with_damage(mut self, damage: f32) -> Self {
        self.damage = damage;
        self
    }

    /// Set explosion.
    #[must_use]
    pub fn with_explosion(mut self, radius: f32, force: f32) -> Self {
        self.explosion = Some(ExplosionSpec::new(radius, force));
        self
    }

    /// Set fragmentation.
    #[must_use]
    pub fn with_fragmentation(mut self, spec: FragmentSpec) -> Self {
        self.fragmentation = Some(spec);
        self
    }

    /// Set lifetime.
    #[must_use]
    pub fn with_lifetime(mut self, lifetime: f32) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.damage < 0.0 {
            return Err(ConfigError::InvalidTemplate(format!(
                "damage must be >= 0, got {}",
                self.damage
            )));
        }
        if self.lifetime <= 0.0 || self.fragment_lifetime <= 0.0 {
            return Err(ConfigError::InvalidTemplate(
                "lifetimes must be > 0".to_string(),
            ));
        }
        if self.fragment_clearance < 0.0 {
            return Err(ConfigError::InvalidTemplate(format!(
                "fragment clearance must be >= 0, got {}",
                self.fragment_clearance
            )));
        }
        if let Some(frag) = &self.fragmentation {
            if frag.spread_angle_degrees < 0.0 {
                return Err(ConfigError::InvalidTemplate(format!(
                    "fragment spread must be >= 0, got {}",
                    frag.spread_angle_degrees
                )));
            }
        }
        Ok(())
    }
}

/// What ended a projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminalCause {
    /// Collided with something.
    Impact,
    /// Delayed fragmentation timer elapsed.
    FragmentTimer,
    /// Lifetime cap reached.
    LifetimeExpired,
}

/// Projectile lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectileState {
    /// In flight.
    #[default]
    Flying,
    /// Terminal cascade has run.
    Finished,
}

/// A live projectile.
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    /// Unique identifier.
    pub id: ProjectileId,
    /// Host physics body.
    pub body: BodyHandle,
    /// Last known position.
    pub position: Vec3,
    /// Last known velocity.
    pub velocity: Vec3,
    /// Damage on hit.
    pub damage: f32,
    /// Explosion on impact.
    pub explosion: Option<ExplosionSpec>,
    /// Fragmentation, always `None` for fragments.
    pub fragmentation: Option<FragmentSpec>,
    /// 0 for a launched projectile, 1 for its fragments.
    pub generation: u8,
    /// Seconds left before the lifetime cap.
    pub remaining_lifetime: f32,
    /// Explosion layer filter.
    pub hit_mask: LayerMask,
    /// Fallback fragmentation speed.
    pub fallback_speed: f32,
    /// Lifetime given to this projectile's fragments.
    pub fragment_lifetime: f32,
    /// Impact fragment offset along the contact normal.
    pub fragment_clearance: f32,
    /// Entity the parent struck; fragments pass through it.
    pub ignored_entity: Option<EntityId>,
    forward: Vec3,
    fragment_timer: Option<f32>,
    state: ProjectileState,
}

impl Projectile {
    /// Create a root projectile from a template.
    #[must_use]
    pub fn from_template(
        id: ProjectileId,
        body: BodyHandle,
        template: &ProjectileTemplate,
        position: Vec3,
        velocity: Vec3,
    ) -> Self {
        Self {
            id,
            body,
            position,
            velocity,
            damage: template.damage,
            explosion: template.explosion,
            fragmentation: template.fragmentation,
            generation: 0,
            remaining_lifetime: template.lifetime,
            hit_mask: template.hit_mask,
            fallback_speed: template.fallback_speed,
            fragment_lifetime: template.fragment_lifetime,
            fragment_clearance: template.fragment_clearance,
            ignored_entity: None,
            forward: velocity.try_normalize().unwrap_or(Vec3::Z),
            fragment_timer: template.fragmentation.as_ref().and_then(FragmentSpec::timer),
            state: ProjectileState::Flying,
        }
    }

    /// Create a child of this projectile.
    ///
    /// Children keep damage and explosion but never fragment again.
    #[must_use]
    pub fn fragment(
        &self,
        id: ProjectileId,
        body: BodyHandle,
        position: Vec3,
        velocity: Vec3,
    ) -> Self {
        Self {
            id,
            body,
            position,
            velocity,
            damage: self.damage,
            explosion: self.explosion,
            fragmentation: None,
            generation: self.generation.saturating_add(1),
            remaining_lifetime: self.fragment_lifetime,
            hit_mask: self.hit_mask,
            fallback_speed: self.fallback_speed,
            fragment_lifetime: self.fragment_lifetime,
            fragment_clearance: self.fragment_clearance,
            ignored_entity: None,
            forward: velocity.try_normalize().unwrap_or(self.forward),
            fragment_timer: None,
            state: ProjectileState::Flying,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ProjectileState {
        self.state
    }

    /// Check if the terminal cascade has already run.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self.state, ProjectileState::Finished)
    }

    /// Check if this is a fragment.
    #[must_use]
    pub const fn is_fragment(&self) -> bool {
        self.generation > 0
    }

    /// Heading used for fragmentation.
    #[must_use]
    pub const fn forward(&self) -> Vec3 {
        self.forward
    }

    /// Seconds until delayed fragmentation, if pending.
    #[must_use]
    pub const fn pending_fragment_timer(&self) -> Option<f32> {
        self.fragment_timer
    }

    /// Update position and velocity from the physics body.
    pub fn sync(&mut self, position: Vec3, velocity: Vec3) {
        self.position = position;
        self.velocity = velocity;
        if velocity.length_squared() > MIN_HEADING_SPEED * MIN_HEADING_SPEED {
            self.forward = velocity.normalize();
        }
    }

    /// Advance timers. Returns the terminal cause that became due, if any.
    ///
    /// The fragment timer wins when both expire in the same tick.
    pub fn tick(&mut self, dt: f32) -> Option<TerminalCause> {
        if self.is_finished() {
            return None;
        }

        self.remaining_lifetime -= dt;

        if let Some(timer) = self.fragment_timer.as_mut() {
            *timer -= dt;
            if *timer <= 0.0 {
                return Some(TerminalCause::FragmentTimer);
            }
        }

        (self.remaining_lifetime <= 0.0).then_some(TerminalCause::LifetimeExpired)
    }

    /// One-shot transition to [`ProjectileState::Finished`].
    ///
    /// Returns `true` only for the first call. Any pending fragment timer is
    /// cancelled.
    pub fn mark_finished(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.state = ProjectileState::Finished;
        self.fragment_timer = None;
        true
    }
}
