//! Fragment velocity distribution.
//!
//! Each child heads along the parent's forward direction turned by an
//! independent yaw and pitch offset, both uniform in `[-spread, +spread]`
//! degrees and measured in the parent's heading frame. Every child moves at
//! the parent's speed times the speed multiplier.

use glam::{Quat, Vec3};

use crate::orientation::{look_rotation, spread_rotation};
use crate::projectile::FragmentSpec;

/// Launch parameters for one fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentShot {
    /// Unit travel direction.
    pub direction: Vec3,
    /// Launch velocity.
    pub velocity: Vec3,
    /// Body orientation facing `direction`.
    pub orientation: Quat,
}

/// Uniform sample in `[-spread, +spread]`.
fn sample_offset(rng: &mut fastrand::Rng, spread: f32) -> f32 {
    if spread <= 0.0 {
        return 0.0;
    }
    -spread + 2.0 * spread * rng.f32()
}

/// Compute `spec.count` fragment shots.
///
/// `base_velocity` is the parent's velocity at the moment of fragmentation;
/// `forward` is its heading. Returns nothing when the spec spawns no
/// children.
#[must_use]
pub fn fragment_shots(
    spec: &FragmentSpec,
    forward: Vec3,
    base_velocity: Vec3,
    rng: &mut fastrand::Rng,
) -> Vec<FragmentShot> {
    if !spec.produces_children() {
        return Vec::new();
    }

    let speed = base_velocity.length() * spec.speed_multiplier;
    let heading = look_rotation(forward);

    (0..spec.count)
        .map(|_| {
            let yaw = sample_offset(rng, spec.spread_angle_degrees);
            let pitch = sample_offset(rng, spec.spread_angle_degrees);
            let orientation = heading * spread_rotation(yaw, pitch);
            let direction = (orientation * Vec3::Z).normalize();
            FragmentShot {
                direction,
                velocity: direction * speed,
                orientation,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(count: u32, spread: f32, mult: f32) -> FragmentSpec {
        FragmentSpec {
            count,
            spread_angle_degrees: spread,
            speed_multiplier: mult,
            ..FragmentSpec::default()
        }
    }

    #[test]
    fn test_count_and_speed() {
        let mut rng = fastrand::Rng::with_seed(7);
        let base = Vec3::new(3.0, 4.0, 0.0);
        let shots = fragment_shots(&spec(6, 20.0, 0.75), base.normalize(), base, &mut rng);
        assert_eq!(shots.len(), 6);
        for shot in &shots {
            assert!((shot.velocity.length() - 3.75).abs() < 1e-4);
        }
    }

    #[test]
    fn test_directions_stay_in_cone() {
        let mut rng = fastrand::Rng::with_seed(11);
        let forward = Vec3::new(1.0, -0.5, 0.2).normalize();
        let spread = 20.0f32;
        let shots = fragment_shots(&spec(64, spread, 1.0), forward, forward * 40.0, &mut rng);
        let max_angle = (spread * std::f32::consts::SQRT_2).to_radians() + 1e-4;
        for shot in shots {
            assert!(shot.direction.angle_between(forward) <= max_angle);
        }
    }

    #[test]
    fn test_zero_spread_follows_heading() {
        let mut rng = fastrand::Rng::with_seed(1);
        let forward = Vec3::new(0.0, 0.0, -1.0);
        let shots = fragment_shots(&spec(3, 0.0, 0.5), forward, forward * 10.0, &mut rng);
        for shot in shots {
            assert!(shot.direction.abs_diff_eq(forward, 1e-5));
        }
    }

    #[test]
    fn test_no_children_when_disabled() {
        let mut rng = fastrand::Rng::with_seed(3);
        assert!(fragment_shots(&spec(0, 20.0, 1.0), Vec3::Z, Vec3::Z, &mut rng).is_empty());
        assert!(fragment_shots(&spec(5, 20.0, 0.0), Vec3::Z, Vec3::Z, &mut rng).is_empty());
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let forward = Vec3::X;
        let frag = spec(4, 15.0, 1.0);
        let a = fragment_shots(&frag, forward, forward, &mut fastrand::Rng::with_seed(9));
        let b = fragment_shots(&frag, forward, forward, &mut fastrand::Rng::with_seed(9));
        assert_eq!(a, b);
    }
}
