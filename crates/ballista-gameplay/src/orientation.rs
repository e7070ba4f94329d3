//! Orientation helpers shared by the turret and fragmentation.
//!
//! Convention: +Y is up and an unrotated object faces +Z. Yaw turns about +Y,
//! positive pitch raises the nose above the horizontal plane.

use glam::{EulerRot, Quat, Vec3};

/// Horizontal vectors shorter than this (squared) have no defined heading.
pub const MIN_FLAT_LENGTH_SQUARED: f32 = 1e-4;

/// Yaw rotation facing the horizontal part of `direction`.
///
/// `None` when `direction` is (nearly) vertical.
#[must_use]
pub fn yaw_towards(direction: Vec3) -> Option<Quat> {
    let flat = Vec3::new(direction.x, 0.0, direction.z);
    if flat.length_squared() <= MIN_FLAT_LENGTH_SQUARED {
        return None;
    }
    Some(Quat::from_rotation_y(flat.x.atan2(flat.z)))
}

/// Local pitch rotation raising the nose by `degrees`.
#[must_use]
pub fn pitch_up(degrees: f32) -> Quat {
    Quat::from_rotation_x(-degrees.to_radians())
}

/// Rotation whose forward (+Z) axis points along `direction`.
///
/// Vertical directions keep a zero yaw.
#[must_use]
pub fn look_rotation(direction: Vec3) -> Quat {
    let Some(dir) = direction.try_normalize() else {
        return Quat::IDENTITY;
    };
    let yaw = yaw_towards(dir).unwrap_or(Quat::IDENTITY);
    let horizontal = Vec3::new(dir.x, 0.0, dir.z).length();
    let pitch = dir.y.atan2(horizontal).to_degrees();
    yaw * pitch_up(pitch)
}

/// Yaw/pitch offset applied to a heading, both in degrees.
///
/// Yaw is applied after pitch, matching a turret whose pitch axis rides on
/// its yaw axis.
#[must_use]
pub fn spread_rotation(yaw_degrees: f32, pitch_degrees: f32) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        yaw_degrees.to_radians(),
        pitch_degrees.to_radians(),
        0.0,
    )
}

/// Frame-rate scaled slerp factor, clamped to `[0, 1]`.
#[must_use]
pub fn smoothing_factor(rate: f32, dt: f32) -> f32 {
    (rate * dt).clamp(0.0, 1.0)
}
