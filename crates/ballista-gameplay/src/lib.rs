//! # Ballista Gameplay
//!
//! Turret targeting and projectile systems for Ballista.
//!
//! This crate provides the simulation side of an artillery turret:
//! - Ballistic solver (flight-time search under a minimum launch pitch)
//! - Turret controller with smoothed yaw/pitch axes
//! - Target selection
//! - Projectile lifecycle with lifetime caps and fragment timers
//! - Impact cascade: damage, radial explosion, fragmentation
//! - Destructible health pools
//! - Projectile-follow camera director
//! - Event bus for inter-system communication
//!
//! Physics, spawning and damage are reached through the collaborator
//! traits in [`host`], so any rigid-body engine can drive the simulation.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod camera;
pub mod destructible;
pub mod events;
pub mod explosion;
pub mod fragmentation;
pub mod host;
pub mod impact;
pub mod orientation;
pub mod projectile;
pub mod simulation;
pub mod solver;
pub mod targeting;
pub mod turret;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::camera::*;
    pub use crate::destructible::*;
    pub use crate::events::*;
    pub use crate::explosion::*;
    pub use crate::fragmentation::*;
    pub use crate::host::*;
    pub use crate::impact::*;
    pub use crate::orientation::*;
    pub use crate::projectile::*;
    pub use crate::simulation::*;
    pub use crate::solver::*;
    pub use crate::targeting::*;
    pub use crate::turret::*;
}

pub use prelude::*;
