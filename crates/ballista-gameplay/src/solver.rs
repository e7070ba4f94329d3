//! Ballistic launch solver.
//!
//! Finds a launch velocity that carries a projectile from a shooter to a
//! target point under constant gravity while leaving the muzzle at or above a
//! minimum upward pitch.
//!
//! The search is a bounded linear scan over flight time. For a fixed
//! displacement and gravity the solved pitch grows with flight time, so the
//! first trial time that clears the pitch threshold is the fastest shot the
//! tuning admits:
//!
//! ```
//! use ballista_gameplay::solver::{solve, SolverConfig, SolveResult};
//! use glam::Vec3;
//!
//! let result = solve(
//!     Vec3::ZERO,
//!     Vec3::new(10.0, 0.0, 0.0),
//!     Vec3::new(0.0, -9.81, 0.0),
//!     &SolverConfig::default(),
//! );
//! assert!(matches!(result, SolveResult::Solved { .. }));
//! ```

use ballista_common::ConfigError;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Flight times at or below this are rejected to avoid dividing by zero.
const MIN_TRIAL_TIME: f32 = 1e-6;

/// Tuning for the flight-time search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Seed flight time per unit of distance to the target.
    pub time_per_distance_unit: f32,
    /// Shortest flight time considered.
    pub min_flight_time: f32,
    /// Longest flight time considered.
    pub max_flight_time: f32,
    /// Flight time added after each rejected trial.
    pub time_adjust_step: f32,
    /// Minimum launch pitch above the horizontal plane (degrees).
    pub min_upward_pitch_degrees: f32,
    /// Maximum number of trials.
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_per_distance_unit: 0.055,
            min_flight_time: 0.25,
            max_flight_time: 3.5,
            time_adjust_step: 0.08,
            min_upward_pitch_degrees: 3.0,
            max_iterations: 16,
        }
    }
}

impl SolverConfig {
    /// Checks the invariants the search relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_flight_time <= 0.0 {
            return Err(ConfigError::NonPositiveMinFlightTime(self.min_flight_time));
        }
        if self.min_flight_time > self.max_flight_time {
            return Err(ConfigError::InvertedFlightTimeRange {
                min: self.min_flight_time,
                max: self.max_flight_time,
            });
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        if self.time_adjust_step <= 0.0 {
            return Err(ConfigError::NonPositiveTimeStep(self.time_adjust_step));
        }
        if self.time_per_distance_unit < 0.0 {
            return Err(ConfigError::NegativeTimePerDistance(
                self.time_per_distance_unit,
            ));
        }
        Ok(())
    }

    /// Set the flight time bounds.
    #[must_use]
    pub fn with_flight_time_range(mut self, min: f32, max: f32) -> Self {
        self.min_flight_time = min;
        self.max_flight_time = max;
        self
    }

    /// Set the minimum upward pitch.
    #[must_use]
    pub fn with_min_pitch(mut self, degrees: f32) -> Self {
        self.min_upward_pitch_degrees = degrees;
        self
    }

    /// Set the seed factor.
    #[must_use]
    pub fn with_time_per_distance(mut self, time_per_unit: f32) -> Self {
        self.time_per_distance_unit = time_per_unit;
        self
    }

    /// Set the step and iteration cap.
    #[must_use]
    pub fn with_search(mut self, step: f32, max_iterations: u32) -> Self {
        self.time_adjust_step = step;
        self.max_iterations = max_iterations;
        self
    }

    /// Initial flight time for a target `distance` away.
    #[must_use]
    pub fn seed_flight_time(&self, distance: f32) -> f32 {
        (distance * self.time_per_distance_unit)
            .max(self.min_flight_time)
            .min(self.max_flight_time)
    }
}

/// Inputs to a single solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaunchRequest {
    /// Muzzle position.
    pub origin: Vec3,
    /// Point the projectile must pass through.
    pub target_point: Vec3,
    /// Constant acceleration acting on the projectile.
    pub gravity: Vec3,
}

impl LaunchRequest {
    /// Creates a launch request.
    #[must_use]
    pub const fn new(origin: Vec3, target_point: Vec3, gravity: Vec3) -> Self {
        Self {
            origin,
            target_point,
            gravity,
        }
    }

    /// Vector from origin to target.
    #[must_use]
    pub fn displacement(&self) -> Vec3 {
        self.target_point - self.origin
    }

    /// Solve this request.
    #[must_use]
    pub fn solve(&self, config: &SolverConfig) -> SolveResult {
        solve(self.origin, self.target_point, self.gravity, config)
    }
}

/// Outcome of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SolveResult {
    /// A launch velocity meeting the pitch constraint within the time bounds.
    Solved {
        /// World-space launch velocity.
        velocity: Vec3,
        /// Time for the projectile to reach the target point.
        flight_time: f32,
    },
    /// No trial flight time satisfied the pitch constraint.
    Unsolved,
}

impl SolveResult {
    /// Check if a launch velocity was found.
    #[must_use]
    pub const fn is_solved(&self) -> bool {
        matches!(self, Self::Solved { .. })
    }

    /// Launch velocity, if solved.
    #[must_use]
    pub const fn velocity(&self) -> Option<Vec3> {
        match self {
            Self::Solved { velocity, .. } => Some(*velocity),
            Self::Unsolved => None,
        }
    }

    /// Flight time, if solved.
    #[must_use]
    pub const fn flight_time(&self) -> Option<f32> {
        match self {
            Self::Solved { flight_time, .. } => Some(*flight_time),
            Self::Unsolved => None,
        }
    }
}

/// One evaluated flight time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveTrial {
    /// Trial flight time.
    pub flight_time: f32,
    /// Velocity that reaches the target in `flight_time`.
    pub velocity: Vec3,
    /// Launch pitch of `velocity` (degrees).
    pub pitch_degrees: f32,
}

/// A solve result together with every trial that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveTrace {
    /// Trials in evaluation order.
    pub trials: Vec<SolveTrial>,
    /// Final outcome.
    pub result: SolveResult,
}

/// Velocity that moves a body by `displacement` in `time` under `gravity`.
///
/// Solves `d = v·t + ½·g·t²` for `v`. `time` must be positive.
#[must_use]
pub fn velocity_for_time(displacement: Vec3, gravity: Vec3, time: f32) -> Vec3 {
    (displacement - 0.5 * gravity * (time * time)) / time
}

/// Angle between `velocity` and the horizontal plane, in degrees.
///
/// Straight up is 90, straight down is -90.
#[must_use]
pub fn launch_pitch_degrees(velocity: Vec3) -> f32 {
    let horizontal = Vec3::new(velocity.x, 0.0, velocity.z).length();
    velocity.y.atan2(horizontal).to_degrees()
}

/// Position reached after `time` from a launch with `velocity`.
#[must_use]
pub fn displacement_after(velocity: Vec3, gravity: Vec3, time: f32) -> Vec3 {
    velocity * time + 0.5 * gravity * (time * time)
}

/// Solve for a launch velocity from `origin` to `target_point`.
///
/// Returns [`SolveResult::Unsolved`] when no trial time in
/// `[min_flight_time, max_flight_time]` clears the pitch threshold. Callers
/// must not fire on `Unsolved`.
#[must_use]
pub fn solve(
    origin: Vec3,
    target_point: Vec3,
    gravity: Vec3,
    config: &SolverConfig,
) -> SolveResult {
    search(origin, target_point, gravity, config, |_| {})
}

/// Like [`solve`], also recording each trial.
#[must_use]
pub fn solve_traced(
    origin: Vec3,
    target_point: Vec3,
    gravity: Vec3,
    config: &SolverConfig,
) -> SolveTrace {
    let mut trials = Vec::with_capacity(config.max_iterations as usize);
    let result = search(origin, target_point, gravity, config, |trial| {
        trials.push(trial);
    });
    SolveTrace { trials, result }
}

fn search<F>(
    origin: Vec3,
    target_point: Vec3,
    gravity: Vec3,
    config: &SolverConfig,
    mut on_trial: F,
) -> SolveResult
where
    F: FnMut(SolveTrial),
{
    let displacement = target_point - origin;
    let mut time = config.seed_flight_time(displacement.length());

    for _ in 0..config.max_iterations {
        if time <= MIN_TRIAL_TIME {
            return SolveResult::Unsolved;
        }

        let velocity = velocity_for_time(displacement, gravity, time);
        let pitch_degrees = launch_pitch_degrees(velocity);
        on_trial(SolveTrial {
            flight_time: time,
            velocity,
            pitch_degrees,
        });

        if pitch_degrees >= config.min_upward_pitch_degrees {
            trace!(time, pitch_degrees, "ballistic solve converged");
            return SolveResult::Solved {
                velocity,
                flight_time: time,
            };
        }

        time += config.time_adjust_step;
        if time > config.max_flight_time {
            break;
        }
    }

    SolveResult::Unsolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

    #[test]
    fn test_default_config_is_valid() {
        assert!(SolverConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_rejects_bad_values() {
        let base = SolverConfig::default();
        assert_eq!(
            base.with_flight_time_range(0.0, 1.0).validate(),
            Err(ConfigError::NonPositiveMinFlightTime(0.0))
        );
        assert!(matches!(
            base.with_flight_time_range(2.0, 1.0).validate(),
            Err(ConfigError::InvertedFlightTimeRange { .. })
        ));
        assert_eq!(
            base.with_search(0.1, 0).validate(),
            Err(ConfigError::ZeroIterations)
        );
        assert_eq!(
            base.with_search(0.0, 4).validate(),
            Err(ConfigError::NonPositiveTimeStep(0.0))
        );
    }

    #[test]
    fn test_seed_is_clamped() {
        let config = SolverConfig::default();
        assert!((config.seed_flight_time(10.0) - 0.55).abs() < 1e-6);
        assert!((config.seed_flight_time(0.0) - 0.25).abs() < 1e-6);
        assert!((config.seed_flight_time(1000.0) - 3.5).abs() < 1e-6);
    }

    #[test]
    fn test_pitch_of_axes() {
        assert!((launch_pitch_degrees(Vec3::X) - 0.0).abs() < 1e-5);
        assert!((launch_pitch_degrees(Vec3::Y) - 90.0).abs() < 1e-5);
        assert!((launch_pitch_degrees(Vec3::new(1.0, 1.0, 0.0)) - 45.0).abs() < 1e-4);
    }

    #[test]
    fn test_level_target_with_default_tuning() {
        let config = SolverConfig::default();
        let result = solve(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), GRAVITY, &config);
        let SolveResult::Solved { velocity, flight_time } = result else {
            panic!("expected a solution, got {result:?}");
        };
        // The seed time already clears 3 degrees, so it is the returned time.
        assert!((flight_time - 0.55).abs() < 1e-5);
        assert!(flight_time >= config.min_flight_time && flight_time <= config.max_flight_time);
        assert!(launch_pitch_degrees(velocity) >= config.min_upward_pitch_degrees);
    }

    #[test]
    fn test_minimal_time_solution_sits_near_threshold() {
        // Seeding at the minimum time forces the scan to walk up to the threshold.
        let config = SolverConfig::default().with_time_per_distance(0.0);
        let trace = solve_traced(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), GRAVITY, &config);

        assert_eq!(trace.trials.len(), 2);
        assert!(trace.trials[0].pitch_degrees < 3.0);
        let SolveResult::Solved { velocity, flight_time } = trace.result else {
            panic!("expected a solution");
        };
        assert!((flight_time - 0.33).abs() < 1e-5);
        let pitch = launch_pitch_degrees(velocity);
        assert!(pitch >= 3.0 && pitch < 3.5, "pitch {pitch}");
    }

    #[test]
    fn test_deep_far_target_is_unsolved() {
        let config = SolverConfig::default();
        let trace = solve_traced(
            Vec3::ZERO,
            Vec3::new(100.0, -200.0, 0.0),
            GRAVITY,
            &config,
        );
        assert_eq!(trace.result, SolveResult::Unsolved);
        assert!(trace.trials.iter().all(|t| t.flight_time <= config.max_flight_time));
    }

    #[test]
    fn test_aggressive_pitch_is_unsolved() {
        let config = SolverConfig::default().with_min_pitch(89.0);
        let result = solve(Vec3::ZERO, Vec3::new(30.0, 0.0, 0.0), GRAVITY, &config);
        assert_eq!(result, SolveResult::Unsolved);
    }

    #[test]
    fn test_overhead_target_solves_vertically() {
        let config = SolverConfig::default();
        let result = solve(Vec3::ZERO, Vec3::new(0.0, 40.0, 0.0), GRAVITY, &config);
        let velocity = result.velocity().expect("vertical shot");
        assert!(velocity.x.abs() < 1e-6 && velocity.z.abs() < 1e-6);
        assert!((launch_pitch_degrees(velocity) - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_zero_displacement_is_degenerate_not_a_panic() {
        let config = SolverConfig::default();
        let result = solve(Vec3::ONE, Vec3::ONE, GRAVITY, &config);
        let velocity = result.velocity().expect("pure vertical lob");
        assert!(velocity.y > 0.0);
    }

    #[test]
    fn test_zero_time_is_rejected() {
        // Bypasses validation on purpose.
        let config = SolverConfig {
            min_flight_time: 0.0,
            max_flight_time: 0.0,
            ..SolverConfig::default()
        };
        let result = solve(Vec3::ZERO, Vec3::ZERO, GRAVITY, &config);
        assert_eq!(result, SolveResult::Unsolved);
    }

    #[test]
    fn test_iteration_cap_limits_trials() {
        let config = SolverConfig::default().with_search(0.01, 3).with_min_pitch(80.0);
        let trace = solve_traced(Vec3::ZERO, Vec3::new(20.0, 0.0, 0.0), GRAVITY, &config);
        assert_eq!(trace.trials.len(), 3);
        assert_eq!(trace.result, SolveResult::Unsolved);
    }

    fn displacement() -> impl Strategy<Value = Vec3> {
        (-60.0f32..60.0, -30.0f32..30.0, -60.0f32..60.0)
            .prop_map(|(x, y, z)| Vec3::new(x, y, z))
            .prop_filter("needs horizontal separation", |d| {
                Vec3::new(d.x, 0.0, d.z).length() > 0.5
            })
    }

    proptest! {
        #[test]
        fn prop_solution_reaches_target(d in displacement(), min_pitch in -10.0f32..30.0) {
            let config = SolverConfig::default().with_min_pitch(min_pitch);
            let result = solve(Vec3::ZERO, d, GRAVITY, &config);
            if let SolveResult::Solved { velocity, flight_time } = result {
                let reached = displacement_after(velocity, GRAVITY, flight_time);
                let tolerance = 1e-3 * d.length().max(1.0);
                prop_assert!((reached - d).length() < tolerance, "{reached} vs {d}");
            }
        }

        #[test]
        fn prop_trial_pitch_is_monotone(d in displacement(), min_pitch in 0.0f32..85.0) {
            let config = SolverConfig::default().with_min_pitch(min_pitch);
            let trace = solve_traced(Vec3::ZERO, d, GRAVITY, &config);
            for pair in trace.trials.windows(2) {
                prop_assert!(pair[1].flight_time > pair[0].flight_time);
                prop_assert!(pair[1].pitch_degrees >= pair[0].pitch_degrees - 1e-3);
            }
        }

        #[test]
        fn prop_solved_respects_bounds(d in displacement(), min_pitch in -10.0f32..85.0) {
            let config = SolverConfig::default().with_min_pitch(min_pitch);
            match solve(Vec3::ZERO, d, GRAVITY, &config) {
                SolveResult::Solved { velocity, flight_time } => {
                    prop_assert!(launch_pitch_degrees(velocity) >= min_pitch);
                    prop_assert!(flight_time >= config.min_flight_time);
                    prop_assert!(flight_time <= config.max_flight_time);
                }
                SolveResult::Unsolved => {
                    let trace = solve_traced(Vec3::ZERO, d, GRAVITY, &config);
                    prop_assert!(trace.trials.iter().all(|t| t.pitch_degrees < min_pitch));
                }
            }
        }
    }
}
