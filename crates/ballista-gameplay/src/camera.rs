//! Projectile-follow camera.
//!
//! One projectile at most is followed at a time. A new follow request
//! replaces the current one, and a finished notice only restores the
//! default view when it names the followed projectile.

use ballista_common::ProjectileId;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::impact::FinishedNotice;

/// Camera follow tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Offset from the followed projectile, in its local frame.
    pub local_offset: Vec3,
    /// Field of view while following (degrees).
    pub fov_while_following: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            local_offset: Vec3::ZERO,
            fov_while_following: 60.0,
        }
    }
}

/// World-space camera placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    /// Position.
    pub position: Vec3,
    /// Rotation.
    pub rotation: Quat,
    /// Vertical field of view (degrees).
    pub fov: f32,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov: 60.0,
        }
    }
}

/// What the camera is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraAttachment {
    /// Resting at the cached default pose.
    #[default]
    Default,
    /// Riding a projectile.
    Following(ProjectileId),
}

/// Moves the camera onto fired projectiles and back.
#[derive(Debug, Clone)]
pub struct CameraDirector {
    config: CameraConfig,
    default_pose: CameraPose,
    attachment: CameraAttachment,
}

impl CameraDirector {
    /// Create a director, caching `default_pose` as the restore target.
    #[must_use]
    pub fn new(config: CameraConfig, default_pose: CameraPose) -> Self {
        Self {
            config,
            default_pose,
            attachment: CameraAttachment::Default,
        }
    }

    /// Current attachment.
    #[must_use]
    pub const fn attachment(&self) -> CameraAttachment {
        self.attachment
    }

    /// Projectile being followed, if any.
    #[must_use]
    pub const fn following(&self) -> Option<ProjectileId> {
        match self.attachment {
            CameraAttachment::Following(id) => Some(id),
            CameraAttachment::Default => None,
        }
    }

    /// The cached default pose.
    #[must_use]
    pub const fn default_pose(&self) -> CameraPose {
        self.default_pose
    }

    /// Follow `projectile`. Returns the projectile that was replaced.
    pub fn follow(&mut self, projectile: ProjectileId) -> Option<ProjectileId> {
        let replaced = self.following();
        self.attachment = CameraAttachment::Following(projectile);
        match replaced {
            Some(previous) => debug!(%previous, %projectile, "camera switched projectile"),
            None => info!(%projectile, "camera following projectile"),
        }
        replaced
    }

    /// React to a finished projectile. Returns `true` if the camera was restored.
    pub fn on_finished(&mut self, notice: &FinishedNotice) -> bool {
        if self.following() != Some(notice.projectile) {
            return false;
        }
        self.return_to_default();
        true
    }

    /// Detach and go back to the default pose.
    pub fn return_to_default(&mut self) {
        if self.attachment != CameraAttachment::Default {
            info!("camera restored to default view");
        }
        self.attachment = CameraAttachment::Default;
    }

    /// World pose given the followed projectile's transform.
    ///
    /// Falls back to the default pose when not following or when the
    /// transform is unavailable.
    #[must_use]
    pub fn pose(&self, followed: Option<(Vec3, Quat)>) -> CameraPose {
        match (self.attachment, followed) {
            (CameraAttachment::Following(_), Some((position, rotation))) => CameraPose {
                position: position + rotation * self.config.local_offset,
                rotation,
                fov: self.config.fov_while_following,
            },
            _ => self.default_pose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projectile::TerminalCause;

    fn notice(raw: u64) -> FinishedNotice {
        FinishedNotice {
            projectile: ProjectileId::from_raw(raw),
            cause: TerminalCause::Impact,
            generation: 0,
        }
    }

    fn director() -> CameraDirector {
        let home = CameraPose {
            position: Vec3::new(0.0, 5.0, -10.0),
            rotation: Quat::IDENTITY,
            fov: 75.0,
        };
        let config = CameraConfig {
            local_offset: Vec3::new(0.0, 0.5, -2.0),
            ..CameraConfig::default()
        };
        CameraDirector::new(config, home)
    }

    #[test]
    fn test_follow_and_restore() {
        let mut camera = director();
        assert_eq!(camera.follow(ProjectileId::from_raw(1)), None);
        assert!(camera.on_finished(&notice(1)));
        assert_eq!(camera.attachment(), CameraAttachment::Default);
        assert_eq!(camera.pose(None), camera.default_pose());
    }

    #[test]
    fn test_latest_follow_wins() {
        let mut camera = director();
        camera.follow(ProjectileId::from_raw(1));
        assert_eq!(
            camera.follow(ProjectileId::from_raw(2)),
            Some(ProjectileId::from_raw(1))
        );

        // The replaced projectile finishing must not pull the camera off #2.
        assert!(!camera.on_finished(&notice(1)));
        assert_eq!(camera.following(), Some(ProjectileId::from_raw(2)));

        assert!(camera.on_finished(&notice(2)));
        assert_eq!(camera.following(), None);
    }

    #[test]
    fn test_unrelated_finish_ignored_when_idle() {
        let mut camera = director();
        assert!(!camera.on_finished(&notice(7)));
    }

    #[test]
    fn test_follow_pose_applies_offset_and_fov() {
        let mut camera = director();
        camera.follow(ProjectileId::from_raw(3));
        let rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let pose = camera.pose(Some((Vec3::new(1.0, 2.0, 3.0), rotation)));

        assert!(pose.position.abs_diff_eq(Vec3::new(-1.0, 2.5, 3.0), 1e-5));
        assert_eq!(pose.rotation, rotation);
        assert_eq!(pose.fov, 60.0);
    }

    #[test]
    fn test_restore_uses_cached_default() {
        let mut camera = director();
        camera.follow(ProjectileId::from_raw(4));
        camera.return_to_default();
        let pose = camera.pose(Some((Vec3::splat(9.0), Quat::IDENTITY)));
        assert_eq!(pose.fov, 75.0);
        assert_eq!(pose.position, Vec3::new(0.0, 5.0, -10.0));
    }
}
