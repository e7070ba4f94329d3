//! # Ballista
//!
//! Runs a turret engagement described by `ballista.toml` (or the built-in
//! defaults) and logs every projectile event.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::Result;
use ballista_engine::app;
use ballista_engine::config::EngineConfig;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("ballista=info".parse()?))
        .init();

    info!("Ballista starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::load(),
    };
    let summary = app::run(config)?;

    info!(
        "Engagement finished after {} ticks: {} shots, {}/{} targets destroyed",
        summary.ticks,
        summary.shots_fired,
        summary.targets_destroyed,
        summary.targets_destroyed + summary.targets_remaining
    );
    Ok(())
}
