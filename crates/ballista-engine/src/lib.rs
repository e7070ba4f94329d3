//! # Ballista Engine
//!
//! Headless runner for Ballista turret engagements.
//!
//! This crate ties the gameplay systems to a host world:
//! - Config: TOML-backed engine, turret, projectile and scene settings
//! - Sandbox: rigid-body host implementing the gameplay collaborator traits
//! - App: fixed-step engagement loop

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod app;
pub mod config;
pub mod sandbox;
