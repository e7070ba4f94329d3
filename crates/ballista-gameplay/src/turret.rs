//! Automatic turret controller.
//!
//! Each tick the turret solves a shot at its target (raised by an aim-height
//! bias so trajectories clear low obstacles) and eases its yaw and pitch
//! axes towards the solution. Firing re-solves from scratch; the eased
//! visual orientation is never used as the launch velocity.

use ballista_common::EntityId;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::orientation::{look_rotation, pitch_up, smoothing_factor, yaw_towards};
use crate::projectile::ProjectileTemplate;
use crate::solver::{solve, SolveResult, SolverConfig};

/// Resolves a target entity to its current world position.
pub trait TargetLocator {
    /// Position of `entity`, or `None` if it no longer exists.
    fn locate(&self, entity: EntityId) -> Option<Vec3>;
}

/// Turret tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurretConfig {
    /// Height added above the target position when aiming.
    pub aim_above_height: f32,
    /// Angular smoothing rate of the yaw and pitch axes (per second).
    pub rotation_speed: f32,
    /// Ballistic solver tuning.
    pub solver: SolverConfig,
}

impl Default for TurretConfig {
    fn default() -> Self {
        Self {
            aim_above_height: 0.5,
            rotation_speed: 8.0,
            solver: SolverConfig::default(),
        }
    }
}

/// Result of one aiming tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AimUpdate {
    /// Axes moved towards this solved velocity.
    Aimed {
        /// Solved launch velocity.
        velocity: Vec3,
    },
    /// No solution this tick; orientation unchanged.
    Unsolved,
    /// No target, or the target vanished.
    NoTarget,
}

/// A shot ready to launch.
#[derive(Debug, Clone, PartialEq)]
pub struct FireOrder {
    /// Muzzle position.
    pub position: Vec3,
    /// Launch velocity from a fresh solve.
    pub velocity: Vec3,
    /// Solved flight time.
    pub flight_time: f32,
    /// Muzzle orientation facing the velocity.
    pub orientation: Quat,
    /// Target shot at.
    pub target: EntityId,
    /// Projectile to launch.
    pub template: ProjectileTemplate,
}

/// Result of a fire request.
#[derive(Debug, Clone, PartialEq)]
pub enum FireOutcome {
    /// Launch this.
    Fired(FireOrder),
    /// No target selected, or it no longer exists.
    NoTarget,
    /// No muzzle point.
    NoShootPoint,
    /// No projectile template loaded.
    NoTemplate,
    /// No trajectory satisfies the pitch constraint.
    Unsolved,
}

impl FireOutcome {
    /// The order, if fired.
    #[must_use]
    pub fn order(&self) -> Option<&FireOrder> {
        match self {
            Self::Fired(order) => Some(order),
            _ => None,
        }
    }

    /// Short reason for a non-fire, for logs and events.
    #[must_use]
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Self::Fired(_) => None,
            Self::NoTarget => Some("no target"),
            Self::NoShootPoint => Some("no shoot point"),
            Self::NoTemplate => Some("no projectile template"),
            Self::Unsolved => Some("no trajectory"),
        }
    }
}

/// Turret state: target, axes and last solution.
#[derive(Debug, Clone, PartialEq)]
pub struct Turret {
    config: TurretConfig,
    template: Option<ProjectileTemplate>,
    target: Option<EntityId>,
    yaw: Quat,
    pitch: Quat,
    last_solved_velocity: Vec3,
}

impl Turret {
    /// Create a turret facing +Z.
    #[must_use]
    pub fn new(config: TurretConfig) -> Self {
        Self {
            config,
            template: None,
            target: None,
            yaw: Quat::IDENTITY,
            pitch: Quat::IDENTITY,
            last_solved_velocity: Vec3::Z,
        }
    }

    /// Set the projectile to fire.
    #[must_use]
    pub fn with_template(mut self, template: ProjectileTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Tuning.
    #[must_use]
    pub const fn config(&self) -> &TurretConfig {
        &self.config
    }

    /// Replace the projectile template.
    pub fn set_template(&mut self, template: Option<ProjectileTemplate>) {
        self.template = template;
    }

    /// Select a target, or clear it.
    pub fn set_target(&mut self, target: Option<EntityId>) {
        self.target = target;
    }

    /// Current target.
    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// World rotation of the yaw axis.
    #[must_use]
    pub const fn yaw(&self) -> Quat {
        self.yaw
    }

    /// Pitch axis rotation, local to the yaw axis.
    #[must_use]
    pub const fn pitch(&self) -> Quat {
        self.pitch
    }

    /// Direction the barrel currently points.
    #[must_use]
    pub fn barrel_direction(&self) -> Vec3 {
        (self.yaw * self.pitch) * Vec3::Z
    }

    /// Last velocity the aiming pass solved.
    #[must_use]
    pub const fn last_solved_velocity(&self) -> Vec3 {
        self.last_solved_velocity
    }

    /// Point the solver aims at for a target at `position`.
    #[must_use]
    pub fn aim_point(&self, position: Vec3) -> Vec3 {
        position + Vec3::Y * self.config.aim_above_height
    }

    fn solve_for(
        &self,
        shoot_point: Vec3,
        locator: &dyn TargetLocator,
        gravity: Vec3,
    ) -> Option<(EntityId, SolveResult)> {
        let target = self.target?;
        let position = locator.locate(target)?;
        let result = solve(shoot_point, self.aim_point(position), gravity, &self.config.solver);
        Some((target, result))
    }

    /// Ease the axes towards a fresh solution.
    pub fn tick(
        &mut self,
        dt: f32,
        shoot_point: Vec3,
        locator: &dyn TargetLocator,
        gravity: Vec3,
    ) -> AimUpdate {
        let Some((target, result)) = self.solve_for(shoot_point, locator, gravity) else {
            return AimUpdate::NoTarget;
        };
        let SolveResult::Solved { velocity, .. } = result else {
            debug!(target = target.raw(), "no trajectory to target, holding aim");
            return AimUpdate::Unsolved;
        };

        self.last_solved_velocity = velocity;
        let t = smoothing_factor(self.config.rotation_speed, dt);

        if let Some(yaw_target) = yaw_towards(velocity) {
            self.yaw = self.yaw.slerp(yaw_target, t);
        }

        let local = self.yaw.inverse() * velocity;
        let horizontal = Vec3::new(local.x, 0.0, local.z).length();
        let pitch_degrees = local
            .y
            .atan2(horizontal)
            .to_degrees()
            .max(self.config.solver.min_upward_pitch_degrees);
        self.pitch = self.pitch.slerp(pitch_up(pitch_degrees), t);

        AimUpdate::Aimed { velocity }
    }

    /// Solve at the moment of fire and produce a launch order.
    ///
    /// Missing preconditions and unsolvable shots take no action.
    pub fn fire(
        &self,
        shoot_point: Option<Vec3>,
        locator: &dyn TargetLocator,
        gravity: Vec3,
    ) -> FireOutcome {
        let Some(template) = self.template.as_ref() else {
            return FireOutcome::NoTemplate;
        };
        let Some(shoot_point) = shoot_point else {
            return FireOutcome::NoShootPoint;
        };
        let Some((target, result)) = self.solve_for(shoot_point, locator, gravity) else {
            return FireOutcome::NoTarget;
        };
        let SolveResult::Solved {
            velocity,
            flight_time,
        } = result
        else {
            warn!(target = target.raw(), "no trajectory to target, shot cancelled");
            return FireOutcome::Unsolved;
        };

        debug!(target = target.raw(), ?velocity, flight_time, "firing");
        FireOutcome::Fired(FireOrder {
            position: shoot_point,
            velocity,
            flight_time,
            orientation: look_rotation(velocity),
            target,
            template: template.clone(),
        })
    }
}
