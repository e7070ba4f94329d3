//! Headless host world.
//!
//! A small rigid-body sandbox implementing the gameplay collaborator traits:
//! sphere bodies integrated with semi-implicit Euler, a ground plane, sphere
//! overlap queries and projectile contacts. Targets are static spheres backed
//! by a [`DestructibleRegistry`].

use std::collections::{BTreeMap, HashMap};

use ballista_common::{BodyHandle, EntityId, LayerMask};
use ballista_gameplay::destructible::{
    DamageOutcome, DeathRemoval, Destructible, DestructibleConfig, DestructibleRegistry,
};
use ballista_gameplay::host::{DamageSink, OverlapHit, OverlapQuery, ProjectileSpawner, RigidBodies};
use ballista_gameplay::impact::ImpactEvent;
use ballista_gameplay::turret::TargetLocator;
use glam::{Quat, Vec3};
use tracing::{debug, trace};

/// Fraction of horizontal velocity a grounded prop keeps per second.
const GROUND_FRICTION: f32 = 0.2;

/// What a body is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// A projectile or fragment.
    Projectile,
    /// A loose prop.
    Prop,
    /// A damageable target.
    Target(EntityId),
}

/// A sphere body.
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxBody {
    /// What it is.
    pub kind: BodyKind,
    /// Centre position.
    pub position: Vec3,
    /// Linear velocity.
    pub velocity: Vec3,
    /// Orientation.
    pub orientation: Quat,
    /// Collision radius.
    pub radius: f32,
    /// Mass; static bodies ignore impulses.
    pub mass: f32,
    /// Moves under gravity and impulses.
    pub dynamic: bool,
    /// Takes part in contacts and queries.
    pub enabled: bool,
    /// Collision layer.
    pub layer: u8,
}

/// A projectile touching something during a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// The projectile body.
    pub body: BodyHandle,
    /// Contact data.
    pub impact: ImpactEvent,
}

/// The sandbox world.
#[derive(Debug)]
pub struct SandboxWorld {
    gravity: Vec3,
    ground_height: f32,
    projectile_radius: f32,
    bodies: BTreeMap<BodyHandle, SandboxBody>,
    targets: HashMap<EntityId, BodyHandle>,
    destructibles: DestructibleRegistry,
    next_handle: u64,
}

impl SandboxWorld {
    /// Create an empty world.
    #[must_use]
    pub fn new(gravity: Vec3, ground_height: f32, projectile_radius: f32) -> Self {
        Self {
            gravity,
            ground_height,
            projectile_radius,
            bodies: BTreeMap::new(),
            targets: HashMap::new(),
            destructibles: DestructibleRegistry::new(),
            next_handle: 0,
        }
    }

    /// World gravity.
    #[must_use]
    pub const fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Add a static damageable target.
    pub fn add_target(
        &mut self,
        position: Vec3,
        radius: f32,
        config: DestructibleConfig,
    ) -> EntityId {
        let entity = EntityId::new();
        let handle = self.insert_body(SandboxBody {
            kind: BodyKind::Target(entity),
            position,
            velocity: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            radius,
            mass: 0.0,
            dynamic: false,
            enabled: true,
            layer: LayerMask::TARGETS,
        });
        self.targets.insert(entity, handle);
        self.destructibles.insert(entity, Destructible::new(config));
        entity
    }

    /// Add a dynamic prop.
    pub fn add_prop(&mut self, position: Vec3, radius: f32, mass: f32) -> BodyHandle {
        self.insert_body(SandboxBody {
            kind: BodyKind::Prop,
            position,
            velocity: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            radius,
            mass,
            dynamic: true,
            enabled: true,
            layer: LayerMask::PROPS,
        })
    }

    /// Look up a body.
    #[must_use]
    pub fn body(&self, handle: BodyHandle) -> Option<&SandboxBody> {
        self.bodies.get(&handle)
    }

    /// Body backing a target entity.
    #[must_use]
    pub fn target_body(&self, entity: EntityId) -> Option<BodyHandle> {
        self.targets.get(&entity).copied()
    }

    /// Target health, if it is damageable.
    #[must_use]
    pub fn target_health(&self, entity: EntityId) -> Option<f32> {
        self.destructibles.get(entity).map(Destructible::health)
    }

    /// Whether a target can still be engaged.
    #[must_use]
    pub fn is_target_alive(&self, entity: EntityId) -> bool {
        self.target_body(entity)
            .and_then(|handle| self.bodies.get(&handle))
            .is_some_and(|body| body.enabled)
    }

    /// Number of live projectile bodies.
    #[must_use]
    pub fn projectile_count(&self) -> usize {
        self.bodies
            .values()
            .filter(|body| body.kind == BodyKind::Projectile)
            .count()
    }

    /// Advance every dynamic body by `dt` and report projectile contacts.
    pub fn step(&mut self, dt: f32) -> Vec<Contact> {
        for body in self.bodies.values_mut().filter(|b| b.dynamic && b.enabled) {
            body.velocity += self.gravity * dt;
            body.position += body.velocity * dt;

            if body.kind != BodyKind::Projectile {
                let floor = self.ground_height + body.radius;
                if body.position.y <= floor {
                    body.position.y = floor;
                    body.velocity.y = body.velocity.y.max(0.0);
                    let keep = GROUND_FRICTION.powf(dt);
                    body.velocity.x *= keep;
                    body.velocity.z *= keep;
                }
            }
        }

        let mut contacts = Vec::new();
        for (&handle, body) in &self.bodies {
            if body.kind != BodyKind::Projectile || !body.enabled {
                continue;
            }
            if let Some(impact) = self.contact_for(handle, body) {
                trace!(body = handle.raw(), point = ?impact.point, "projectile contact");
                contacts.push(Contact { body: handle, impact });
            }
        }
        contacts
    }

    /// Nearest solid the projectile touches: a body, or failing that the ground.
    fn contact_for(&self, handle: BodyHandle, projectile: &SandboxBody) -> Option<ImpactEvent> {
        let nearest = self
            .bodies
            .iter()
            .filter(|(&other, b)| other != handle && b.enabled && b.kind != BodyKind::Projectile)
            .filter_map(|(_, b)| {
                let offset = projectile.position - b.position;
                let distance = offset.length();
                (distance <= b.radius + projectile.radius).then_some((distance, b, offset))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0));

        if let Some((_, other, offset)) = nearest {
            let normal = offset.try_normalize().unwrap_or(Vec3::Y);
            let impact = ImpactEvent::new(other.position + normal * other.radius, normal);
            return Some(match other.kind {
                BodyKind::Target(entity) => impact.with_entity(entity),
                BodyKind::Prop | BodyKind::Projectile => impact,
            });
        }

        if projectile.position.y - projectile.radius <= self.ground_height {
            let point = Vec3::new(projectile.position.x, self.ground_height, projectile.position.z);
            return Some(ImpactEvent::new(point, Vec3::Y));
        }
        None
    }

    fn insert_body(&mut self, body: SandboxBody) -> BodyHandle {
        self.next_handle += 1;
        let handle = BodyHandle::from_raw(self.next_handle);
        self.bodies.insert(handle, body);
        handle
    }

    fn remove_target(&mut self, entity: EntityId, removal: DeathRemoval) {
        let Some(handle) = self.targets.get(&entity).copied() else {
            return;
        };
        match removal {
            DeathRemoval::Destroy => {
                self.bodies.remove(&handle);
                self.targets.remove(&entity);
                debug!(entity = entity.raw(), "target destroyed");
            },
            DeathRemoval::Disable => {
                if let Some(body) = self.bodies.get_mut(&handle) {
                    body.enabled = false;
                }
                debug!(entity = entity.raw(), "target disabled");
            },
        }
    }
}

impl RigidBodies for SandboxWorld {
    fn position(&self, body: BodyHandle) -> Option<Vec3> {
        self.bodies.get(&body).map(|b| b.position)
    }

    fn velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.bodies.get(&body).map(|b| b.velocity)
    }

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec3) -> bool {
        match self.bodies.get_mut(&body) {
            Some(b) if b.dynamic => {
                b.velocity = velocity;
                true
            },
            _ => false,
        }
    }

    /// Static bodies refuse impulses.
    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec3) -> bool {
        match self.bodies.get_mut(&body) {
            Some(b) if b.dynamic && b.mass > 0.0 => {
                b.velocity += impulse / b.mass;
                true
            },
            _ => false,
        }
    }
}

impl OverlapQuery for SandboxWorld {
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> Vec<OverlapHit> {
        self.bodies
            .iter()
            .filter(|(_, b)| b.enabled && mask.contains(b.layer))
            .filter(|(_, b)| b.position.distance(center) <= radius)
            .map(|(&body, b)| OverlapHit {
                body,
                position: b.position,
            })
            .collect()
    }
}

impl ProjectileSpawner for SandboxWorld {
    fn spawn_projectile(&mut self, position: Vec3, orientation: Quat) -> Option<BodyHandle> {
        Some(self.insert_body(SandboxBody {
            kind: BodyKind::Projectile,
            position,
            velocity: Vec3::ZERO,
            orientation,
            radius: self.projectile_radius,
            mass: 1.0,
            dynamic: true,
            enabled: true,
            layer: LayerMask::PROJECTILES,
        }))
    }

    fn despawn_projectile(&mut self, body: BodyHandle) {
        if self
            .bodies
            .get(&body)
            .is_some_and(|b| b.kind == BodyKind::Projectile)
        {
            self.bodies.remove(&body);
        }
    }
}

impl DamageSink for SandboxWorld {
    fn apply_damage(
        &mut self,
        entity: EntityId,
        amount: f32,
        point: Vec3,
        normal: Vec3,
    ) -> Option<DamageOutcome> {
        let outcome = self.destructibles.damage(entity, amount, point, normal)?;
        if let DamageOutcome::Killed { removal, .. } = &outcome {
            self.remove_target(entity, *removal);
        }
        Some(outcome)
    }
}

impl TargetLocator for SandboxWorld {
    fn locate(&self, entity: EntityId) -> Option<Vec3> {
        if !self.is_target_alive(entity) {
            return None;
        }
        self.target_body(entity)
            .and_then(|handle| self.bodies.get(&handle))
            .map(|body| body.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

    #[test]
    fn test_projectile_falls_and_hits_ground() {
        let mut world = SandboxWorld::new(GRAVITY, 0.0, 0.1);
        let body = world
            .spawn_projectile(Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY)
            .expect("spawn");
        assert!(world.set_velocity(body, Vec3::new(5.0, 0.0, 0.0)));

        let mut contact = None;
        for _ in 0..120 {
            if let Some(c) = world.step(1.0 / 60.0).into_iter().next() {
                contact = Some(c);
                break;
            }
        }
        let contact = contact.expect("ground contact");
        assert_eq!(contact.body, body);
        assert_eq!(contact.impact.normal, Vec3::Y);
        assert_eq!(contact.impact.point.y, 0.0);
        assert!(contact.impact.hit_entity.is_none());
    }

    #[test]
    fn test_target_contact_reports_entity() {
        let mut world = SandboxWorld::new(Vec3::ZERO, -10.0, 0.1);
        let target = world.add_target(Vec3::new(2.0, 0.0, 0.0), 0.5, DestructibleConfig::default());
        let body = world.spawn_projectile(Vec3::ZERO, Quat::IDENTITY).expect("spawn");
        world.set_velocity(body, Vec3::new(10.0, 0.0, 0.0));

        let contacts: Vec<Contact> = (0..30).flat_map(|_| world.step(1.0 / 60.0)).collect();
        let first = contacts.first().expect("contact");
        assert_eq!(first.impact.hit_entity, Some(target));
        assert!(first.impact.normal.abs_diff_eq(Vec3::NEG_X, 1e-4));
        assert!(first.impact.point.abs_diff_eq(Vec3::new(1.5, 0.0, 0.0), 1e-4));
    }

    #[test]
    fn test_props_rest_on_ground() {
        let mut world = SandboxWorld::new(GRAVITY, 0.0, 0.1);
        let prop = world.add_prop(Vec3::new(0.0, 3.0, 0.0), 0.5, 1.0);
        for _ in 0..240 {
            world.step(1.0 / 60.0);
        }
        let body = world.body(prop).expect("prop");
        assert!((body.position.y - 0.5).abs() < 1e-5);
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn test_impulse_scales_with_mass() {
        let mut world = SandboxWorld::new(GRAVITY, 0.0, 0.1);
        let light = world.add_prop(Vec3::ZERO, 0.5, 1.0);
        let heavy = world.add_prop(Vec3::X, 0.5, 4.0);
        assert!(world.apply_impulse(light, Vec3::X * 8.0));
        assert!(world.apply_impulse(heavy, Vec3::X * 8.0));
        assert_eq!(world.velocity(light), Some(Vec3::X * 8.0));
        assert_eq!(world.velocity(heavy), Some(Vec3::X * 2.0));
    }

    #[test]
    fn test_static_target_refuses_impulse() {
        let mut world = SandboxWorld::new(GRAVITY, 0.0, 0.1);
        let target = world.add_target(Vec3::ZERO, 0.5, DestructibleConfig::default());
        let handle = world.target_body(target).expect("body");
        assert!(!world.apply_impulse(handle, Vec3::Y));
    }

    #[test]
    fn test_overlap_filters_by_layer_and_radius() {
        let mut world = SandboxWorld::new(GRAVITY, 0.0, 0.1);
        let near = world.add_prop(Vec3::new(1.0, 0.0, 0.0), 0.5, 1.0);
        world.add_prop(Vec3::new(9.0, 0.0, 0.0), 0.5, 1.0);
        world.add_target(Vec3::new(0.0, 1.0, 0.0), 0.5, DestructibleConfig::default());

        let hits = world.overlap_sphere(Vec3::ZERO, 2.0, LayerMask::layer(LayerMask::PROPS));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].body, near);
        assert_eq!(world.overlap_sphere(Vec3::ZERO, 2.0, LayerMask::ALL).len(), 2);
    }

    #[test]
    fn test_killed_target_is_removed() {
        let mut world = SandboxWorld::new(GRAVITY, 0.0, 0.1);
        let target = world.add_target(Vec3::new(0.0, 0.5, 5.0), 0.5, DestructibleConfig::default());
        assert!(world.locate(target).is_some());

        world.apply_damage(target, 25.0, Vec3::ZERO, Vec3::Y);
        assert_eq!(world.target_health(target), Some(25.0));
        let outcome = world.apply_damage(target, 25.0, Vec3::ZERO, Vec3::Y);
        assert!(matches!(outcome, Some(DamageOutcome::Killed { .. })));
        assert!(world.locate(target).is_none());
        assert!(world.target_body(target).is_none());

        let after = world.apply_damage(target, 25.0, Vec3::ZERO, Vec3::Y);
        assert_eq!(after, Some(DamageOutcome::AlreadyDead));
    }

    #[test]
    fn test_disabled_target_leaves_queries() {
        let mut world = SandboxWorld::new(GRAVITY, 0.0, 0.1);
        let config = DestructibleConfig {
            max_health: 10.0,
            destroy_on_death: false,
            death_effect: None,
        };
        let target = world.add_target(Vec3::ZERO, 0.5, config);
        world.apply_damage(target, 10.0, Vec3::ZERO, Vec3::Y);
        assert!(world.target_body(target).is_some());
        assert!(!world.is_target_alive(target));
        assert!(world.overlap_sphere(Vec3::ZERO, 1.0, LayerMask::ALL).is_empty());
    }

    #[test]
    fn test_despawn_only_removes_projectiles() {
        let mut world = SandboxWorld::new(GRAVITY, 0.0, 0.1);
        let prop = world.add_prop(Vec3::ZERO, 0.5, 1.0);
        let shot = world.spawn_projectile(Vec3::Y, Quat::IDENTITY).expect("spawn");
        world.despawn_projectile(prop);
        world.despawn_projectile(shot);
        assert!(world.body(prop).is_some());
        assert!(world.body(shot).is_none());
        assert_eq!(world.projectile_count(), 0);
    }
}
