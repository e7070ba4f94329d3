//! Impact and fragmentation cascade.
//!
//! When a projectile reaches its terminal event the cascade runs, in order:
//! 1. damage to the entity hit (impact only),
//! 2. a radial explosion impulse (impact only),
//! 3. fragmentation (on impact if enabled, or when the delay timer fires),
//! 4. a single [`FinishedNotice`] and removal of the body.
//!
//! Steps 1-3 are resolved here; the projectile simulation spawns the
//! fragment bodies and performs step 4.

use ballista_common::{EntityId, ProjectileId};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::destructible::DamageOutcome;
use crate::explosion::{apply_explosion, ExplosionHit};
use crate::fragmentation::{fragment_shots, FragmentShot};
use crate::host::PhysicsHost;
use crate::projectile::{Projectile, TerminalCause};

/// Contact reported by the host's collision system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactEvent {
    /// Contact point.
    pub point: Vec3,
    /// Surface normal at the contact.
    pub normal: Vec3,
    /// Damageable entity that was hit, if any.
    pub hit_entity: Option<EntityId>,
}

impl ImpactEvent {
    /// Contact without a damageable entity.
    #[must_use]
    pub const fn new(point: Vec3, normal: Vec3) -> Self {
        Self {
            point,
            normal,
            hit_entity: None,
        }
    }

    /// Set the entity hit.
    #[must_use]
    pub const fn with_entity(mut self, entity: EntityId) -> Self {
        self.hit_entity = Some(entity);
        self
    }

    /// Contact used when the host reports a collision without contact points:
    /// the projectile's own position, facing back along its heading.
    #[must_use]
    pub fn fallback_for(projectile: &Projectile) -> Self {
        Self::new(projectile.position, -projectile.forward())
    }
}

/// One-shot notification that a projectile is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishedNotice {
    /// The finished projectile.
    pub projectile: ProjectileId,
    /// What ended it.
    pub cause: TerminalCause,
    /// 0 for turret shots, 1 for fragments.
    pub generation: u8,
}

/// Everything a terminal event did.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminationReport {
    /// The finished notification.
    pub notice: FinishedNotice,
    /// Resolved contact, for impact terminations.
    pub impact: Option<ImpactEvent>,
    /// Damage applied to the entity hit.
    pub damage: Option<(EntityId, DamageOutcome)>,
    /// Explosion impulses delivered.
    pub explosion_hits: Vec<ExplosionHit>,
    /// Fragments spawned.
    pub fragments: Vec<ProjectileId>,
}

/// Side effects of steps 1-3, before fragment bodies exist.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CascadeEffects {
    pub damage: Option<(EntityId, DamageOutcome)>,
    pub explosion_hits: Vec<ExplosionHit>,
    pub fragment_origin: Vec3,
    pub fragment_shots: Vec<FragmentShot>,
}

/// Run damage, explosion and fragment sampling for a finished projectile.
///
/// The caller must have already passed the projectile's one-shot guard.
pub(crate) fn resolve_effects<H>(
    projectile: &Projectile,
    cause: TerminalCause,
    impact: Option<&ImpactEvent>,
    host: &mut H,
    rng: &mut fastrand::Rng,
) -> CascadeEffects
where
    H: PhysicsHost + ?Sized,
{
    let mut effects = CascadeEffects {
        damage: None,
        explosion_hits: Vec::new(),
        fragment_origin: projectile.position,
        fragment_shots: Vec::new(),
    };

    let fragment_now = match (cause, impact) {
        (TerminalCause::Impact, Some(contact)) => {
            if let Some(entity) = contact.hit_entity {
                effects.damage = host
                    .apply_damage(entity, projectile.damage, contact.point, contact.normal)
                    .map(|outcome| (entity, outcome));
            }

            if let Some(spec) = projectile.explosion.as_ref().filter(|s| s.is_active()) {
                effects.explosion_hits = apply_explosion(
                    host,
                    contact.point,
                    spec,
                    projectile.hit_mask,
                    Some(projectile.body),
                );
            }

            effects.fragment_origin =
                contact.point + contact.normal.normalize_or_zero() * projectile.fragment_clearance;
            projectile.fragmentation.is_some_and(|f| f.on_impact)
        },
        (TerminalCause::FragmentTimer, _) => projectile.fragmentation.is_some(),
        _ => false,
    };

    if fragment_now {
        if let Some(spec) = projectile.fragmentation.as_ref() {
            let base_velocity = host
                .velocity(projectile.body)
                .unwrap_or(projectile.forward() * projectile.fallback_speed);
            effects.fragment_shots =
                fragment_shots(spec, projectile.forward(), base_velocity, rng);
        }
    }

    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destructible::{Destructible, DestructibleConfig};
    use crate::host::{MockHost, ProjectileSpawner, RigidBodies};
    use crate::projectile::{FragmentSpec, ProjectileTemplate};
    use ballista_common::LayerMask;
    use glam::Quat;

    fn launch(host: &mut MockHost, template: &ProjectileTemplate) -> Projectile {
        let body = host
            .spawn_projectile(Vec3::ZERO, Quat::IDENTITY)
            .expect("spawn");
        let velocity = Vec3::new(0.0, 0.0, 20.0);
        host.set_velocity(body, velocity);
        Projectile::from_template(ProjectileId::from_raw(1), body, template, Vec3::ZERO, velocity)
    }

    #[test]
    fn test_impact_damages_and_explodes() {
        let mut host = MockHost::new();
        let target = EntityId::new();
        host.destructibles
            .insert(target, Destructible::new(DestructibleConfig::default()));
        let prop = host.add_body(Vec3::new(2.0, 0.0, 0.0), LayerMask::PROPS);

        let template = ProjectileTemplate::default().with_explosion(5.0, 100.0);
        let projectile = launch(&mut host, &template);
        let contact = ImpactEvent::new(Vec3::ZERO, Vec3::Y).with_entity(target);

        let mut rng = fastrand::Rng::with_seed(1);
        let effects = resolve_effects(
            &projectile,
            TerminalCause::Impact,
            Some(&contact),
            &mut host,
            &mut rng,
        );

        assert_eq!(
            effects.damage,
            Some((target, DamageOutcome::Damaged { remaining: 25.0 }))
        );
        assert_eq!(effects.explosion_hits.len(), 1);
        assert_eq!(effects.explosion_hits[0].body, prop);
        assert!(effects.fragment_shots.is_empty());
    }

    #[test]
    fn test_impact_fragments_start_off_the_surface() {
        let mut host = MockHost::new();
        let spec = FragmentSpec {
            count: 3,
            on_impact: true,
            ..FragmentSpec::default()
        };
        let template = ProjectileTemplate {
            fragment_clearance: 0.5,
            ..ProjectileTemplate::default().with_fragmentation(spec)
        };
        let projectile = launch(&mut host, &template);
        let contact = ImpactEvent::new(Vec3::new(0.0, 0.0, 4.0), Vec3::NEG_Z * 2.0);

        let mut rng = fastrand::Rng::with_seed(6);
        let effects = resolve_effects(
            &projectile,
            TerminalCause::Impact,
            Some(&contact),
            &mut host,
            &mut rng,
        );
        assert_eq!(effects.fragment_shots.len(), 3);
        assert!(effects
            .fragment_origin
            .abs_diff_eq(Vec3::new(0.0, 0.0, 3.5), 1e-6));
    }

    #[test]
    fn test_timer_only_fragments() {
        let mut host = MockHost::new();
        let spec = FragmentSpec {
            count: 4,
            delay_seconds: 1.0,
            ..FragmentSpec::default()
        };
        let template = ProjectileTemplate::default()
            .with_explosion(5.0, 100.0)
            .with_fragmentation(spec);
        let projectile = launch(&mut host, &template);
        host.add_body(Vec3::new(1.0, 0.0, 0.0), LayerMask::PROPS);

        let mut rng = fastrand::Rng::with_seed(2);
        let effects = resolve_effects(
            &projectile,
            TerminalCause::FragmentTimer,
            None,
            &mut host,
            &mut rng,
        );
        assert!(effects.damage.is_none());
        assert!(effects.explosion_hits.is_empty());
        assert_eq!(effects.fragment_shots.len(), 4);
        for shot in &effects.fragment_shots {
            assert!((shot.velocity.length() - 15.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_impact_without_on_impact_flag_does_not_fragment() {
        let mut host = MockHost::new();
        let template = ProjectileTemplate::default().with_fragmentation(FragmentSpec::default());
        let projectile = launch(&mut host, &template);
        let contact = ImpactEvent::fallback_for(&projectile);

        let mut rng = fastrand::Rng::with_seed(3);
        let effects = resolve_effects(
            &projectile,
            TerminalCause::Impact,
            Some(&contact),
            &mut host,
            &mut rng,
        );
        assert!(effects.fragment_shots.is_empty());
        assert!(contact.normal.abs_diff_eq(Vec3::NEG_Z, 1e-6));
    }

    #[test]
    fn test_fallback_speed_without_velocity() {
        let mut host = MockHost::new();
        let spec = FragmentSpec {
            count: 2,
            speed_multiplier: 1.0,
            on_impact: true,
            ..FragmentSpec::default()
        };
        let template = ProjectileTemplate::default().with_fragmentation(spec);
        let projectile = launch(&mut host, &template);
        host.hide_velocity = true;

        let contact = ImpactEvent::new(Vec3::ZERO, Vec3::Y);
        let mut rng = fastrand::Rng::with_seed(4);
        let effects = resolve_effects(
            &projectile,
            TerminalCause::Impact,
            Some(&contact),
            &mut host,
            &mut rng,
        );
        for shot in &effects.fragment_shots {
            assert!((shot.velocity.length() - 30.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_lifetime_expiry_has_no_effects() {
        let mut host = MockHost::new();
        let spec = FragmentSpec {
            on_impact: true,
            delay_seconds: 3.0,
            ..FragmentSpec::default()
        };
        let template = ProjectileTemplate::default()
            .with_explosion(5.0, 100.0)
            .with_fragmentation(spec);
        let projectile = launch(&mut host, &template);

        let mut rng = fastrand::Rng::with_seed(5);
        let effects = resolve_effects(
            &projectile,
            TerminalCause::LifetimeExpired,
            None,
            &mut host,
            &mut rng,
        );
        assert!(effects.damage.is_none());
        assert!(effects.explosion_hits.is_empty());
        assert!(effects.fragment_shots.is_empty());
    }
}
