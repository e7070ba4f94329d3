//! Collaborator interfaces provided by the host simulation.
//!
//! The gameplay layer never integrates physics itself. A host world (a game
//! engine, a physics crate, or the sandbox in `ballista-engine`) implements
//! these traits and the turret, cascade and simulation drive it through them.

use std::collections::HashMap;

use ballista_common::{BodyHandle, EntityId, LayerMask};
use glam::{Quat, Vec3};

use crate::destructible::{DamageOutcome, DestructibleRegistry};

/// Rigid-body state access.
pub trait RigidBodies {
    /// Current world position of `body`.
    fn position(&self, body: BodyHandle) -> Option<Vec3>;

    /// Current linear velocity of `body`.
    fn velocity(&self, body: BodyHandle) -> Option<Vec3>;

    /// Overwrite the linear velocity. Returns `false` if the body is gone.
    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec3) -> bool;

    /// Add an instantaneous impulse. Returns `false` if the body is gone.
    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec3) -> bool;
}

/// A body found by a spatial query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapHit {
    /// The body.
    pub body: BodyHandle,
    /// Its world position.
    pub position: Vec3,
}

/// Spatial overlap query.
pub trait OverlapQuery {
    /// Rigid bodies within `radius` of `center` whose layer passes `mask`.
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> Vec<OverlapHit>;
}

/// Factory for projectile bodies.
pub trait ProjectileSpawner {
    /// Spawn a projectile body at `position` facing `orientation`.
    fn spawn_projectile(&mut self, position: Vec3, orientation: Quat) -> Option<BodyHandle>;

    /// Remove a projectile body.
    fn despawn_projectile(&mut self, body: BodyHandle);
}

/// Receiver of projectile damage.
pub trait DamageSink {
    /// Apply damage to `entity`. `None` if the entity isn't damageable.
    fn apply_damage(
        &mut self,
        entity: EntityId,
        amount: f32,
        point: Vec3,
        normal: Vec3,
    ) -> Option<DamageOutcome>;
}

/// Everything the projectile simulation needs from its host.
pub trait PhysicsHost: RigidBodies + OverlapQuery + ProjectileSpawner + DamageSink {}

impl<T> PhysicsHost for T where T: RigidBodies + OverlapQuery + ProjectileSpawner + DamageSink {}

/// A body in the [`MockHost`].
#[derive(Debug, Clone, PartialEq)]
pub struct MockBody {
    /// Position.
    pub position: Vec3,
    /// Velocity.
    pub velocity: Vec3,
    /// Collision layer.
    pub layer: u8,
    /// Sum of impulses received.
    pub impulse: Vec3,
    /// Orientation given at spawn.
    pub orientation: Quat,
}

/// In-memory host for tests. Bodies never move on their own.
#[derive(Debug, Default)]
pub struct MockHost {
    bodies: HashMap<BodyHandle, MockBody>,
    next_handle: u64,
    /// Projectile bodies spawned, in order.
    pub spawned: Vec<BodyHandle>,
    /// Projectile bodies despawned, in order.
    pub despawned: Vec<BodyHandle>,
    /// Damage targets.
    pub destructibles: DestructibleRegistry,
    /// Refuse to spawn projectiles.
    pub fail_spawns: bool,
    /// Report no velocity for any body.
    pub hide_velocity: bool,
}

impl MockHost {
    /// Create an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a static body on `layer`.
    pub fn add_body(&mut self, position: Vec3, layer: u8) -> BodyHandle {
        let handle = self.allocate();
        self.bodies.insert(
            handle,
            MockBody {
                position,
                velocity: Vec3::ZERO,
                layer,
                impulse: Vec3::ZERO,
                orientation: Quat::IDENTITY,
            },
        );
        handle
    }

    /// Look up a body.
    #[must_use]
    pub fn body(&self, handle: BodyHandle) -> Option<&MockBody> {
        self.bodies.get(&handle)
    }

    fn allocate(&mut self) -> BodyHandle {
        self.next_handle += 1;
        BodyHandle::from_raw(self.next_handle)
    }
}

impl RigidBodies for MockHost {
    fn position(&self, body: BodyHandle) -> Option<Vec3> {
        self.bodies.get(&body).map(|b| b.position)
    }

    fn velocity(&self, body: BodyHandle) -> Option<Vec3> {
        if self.hide_velocity {
            return None;
        }
        self.bodies.get(&body).map(|b| b.velocity)
    }

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec3) -> bool {
        let Some(b) = self.bodies.get_mut(&body) else {
            return false;
        };
        b.velocity = velocity;
        true
    }

    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec3) -> bool {
        let Some(b) = self.bodies.get_mut(&body) else {
            return false;
        };
        b.impulse += impulse;
        true
    }
}

impl OverlapQuery for MockHost {
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> Vec<OverlapHit> {
        let mut hits: Vec<OverlapHit> = self
            .bodies
            .iter()
            .filter(|(_, b)| mask.contains(b.layer) && b.position.distance(center) <= radius)
            .map(|(&body, b)| OverlapHit {
                body,
                position: b.position,
            })
            .collect();
        hits.sort_by_key(|hit| hit.body);
        hits
    }
}

impl ProjectileSpawner for MockHost {
    fn spawn_projectile(&mut self, position: Vec3, orientation: Quat) -> Option<BodyHandle> {
        if self.fail_spawns {
            return None;
        }
        let handle = self.allocate();
        self.bodies.insert(
            handle,
            MockBody {
                position,
                velocity: Vec3::ZERO,
                layer: LayerMask::PROJECTILES,
                impulse: Vec3::ZERO,
                orientation,
            },
        );
        self.spawned.push(handle);
        Some(handle)
    }

    fn despawn_projectile(&mut self, body: BodyHandle) {
        self.bodies.remove(&body);
        self.despawned.push(body);
    }
}

impl DamageSink for MockHost {
    fn apply_damage(
        &mut self,
        entity: EntityId,
        amount: f32,
        point: Vec3,
        normal: Vec3,
    ) -> Option<DamageOutcome> {
        self.destructibles.damage(entity, amount, point, normal)
    }
}
