//! # Ballista Common
//!
//! Common types, utilities, and shared abstractions for Ballista.
//!
//! This crate provides foundational types used across all Ballista subsystems:
//! - ID types (EntityId, ProjectileId, BodyHandle)
//! - Collision layer masks for spatial queries
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod layers;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::layers::*;
}

pub use prelude::*;
