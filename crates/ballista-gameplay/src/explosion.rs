//! Radial explosion impulses.
//!
//! Impulse magnitude decays linearly from `force` at the centre to zero at
//! `radius`, directed from the centre towards each body.

use ballista_common::{BodyHandle, LayerMask};
use glam::Vec3;
use tracing::trace;

use crate::host::{OverlapQuery, RigidBodies};
use crate::projectile::ExplosionSpec;

/// An impulse delivered to one body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplosionHit {
    /// Body pushed.
    pub body: BodyHandle,
    /// Impulse applied.
    pub impulse: Vec3,
}

/// Impulse on a body at `position` from an explosion at `center`.
///
/// `None` outside the radius. A body exactly at the centre is pushed
/// straight up.
#[must_use]
pub fn explosion_impulse(center: Vec3, spec: &ExplosionSpec, position: Vec3) -> Option<Vec3> {
    if !spec.is_active() {
        return None;
    }
    let offset = position - center;
    let distance = offset.length();
    if distance > spec.radius {
        return None;
    }
    let falloff = 1.0 - distance / spec.radius;
    let direction = offset.try_normalize().unwrap_or(Vec3::Y);
    Some(direction * spec.force * falloff)
}

/// Push every body in range, skipping `exclude`.
pub fn apply_explosion<H>(
    host: &mut H,
    center: Vec3,
    spec: &ExplosionSpec,
    mask: LayerMask,
    exclude: Option<BodyHandle>,
) -> Vec<ExplosionHit>
where
    H: OverlapQuery + RigidBodies + ?Sized,
{
    if !spec.is_active() {
        return Vec::new();
    }

    let mut hits = Vec::new();
    for overlap in host.overlap_sphere(center, spec.radius, mask) {
        if Some(overlap.body) == exclude {
            continue;
        }
        let Some(impulse) = explosion_impulse(center, spec, overlap.position) else {
            continue;
        };
        if host.apply_impulse(overlap.body, impulse) {
            trace!(body = overlap.body.raw(), magnitude = impulse.length(), "explosion impulse");
            hits.push(ExplosionHit {
                body: overlap.body,
                impulse,
            });
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MockHost;

    #[test]
    fn test_linear_falloff() {
        let spec = ExplosionSpec::new(5.0, 100.0);
        let near =
            explosion_impulse(Vec3::ZERO, &spec, Vec3::new(1.0, 0.0, 0.0)).expect("in range");
        let far = explosion_impulse(Vec3::ZERO, &spec, Vec3::new(0.0, 0.0, 4.0)).expect("in range");
        assert!((near.length() - 80.0).abs() < 1e-3);
        assert!((far.length() - 20.0).abs() < 1e-3);
        assert!(near.x > 0.0 && far.z > 0.0);
        assert!(explosion_impulse(Vec3::ZERO, &spec, Vec3::new(6.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_centre_pushes_up() {
        let spec = ExplosionSpec::new(2.0, 10.0);
        let impulse = explosion_impulse(Vec3::ONE, &spec, Vec3::ONE).expect("in range");
        assert!((impulse - Vec3::new(0.0, 10.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_two_bodies_nearer_gets_more() {
        let mut host = MockHost::new();
        let near = host.add_body(Vec3::new(1.0, 0.0, 0.0), LayerMask::PROPS);
        let far = host.add_body(Vec3::new(-4.0, 0.0, 0.0), LayerMask::PROPS);

        let spec = ExplosionSpec::new(5.0, 100.0);
        let hits = apply_explosion(&mut host, Vec3::ZERO, &spec, LayerMask::ALL, None);
        assert_eq!(hits.len(), 2);

        let near_impulse = host.body(near).expect("near").impulse.length();
        let far_impulse = host.body(far).expect("far").impulse.length();
        assert!(near_impulse > far_impulse);
        assert!((near_impulse / far_impulse - 4.0).abs() < 1e-3);
    }

    #[test]
    fn test_inactive_spec_and_exclusion() {
        let mut host = MockHost::new();
        let own = host.add_body(Vec3::ZERO, LayerMask::PROJECTILES);
        let spec = ExplosionSpec::new(5.0, 0.0);
        assert!(apply_explosion(&mut host, Vec3::ZERO, &spec, LayerMask::ALL, None).is_empty());

        let spec = ExplosionSpec::new(5.0, 50.0);
        let hits = apply_explosion(&mut host, Vec3::ZERO, &spec, LayerMask::ALL, Some(own));
        assert!(hits.is_empty());
    }
}
