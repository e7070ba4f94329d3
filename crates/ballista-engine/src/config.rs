//! Engine configuration.
//!
//! Provides the simulation step, world gravity, turret and projectile tuning
//! and the scene layout. Configuration can be loaded from and saved to a
//! TOML file.

use ballista_common::{BallistaError, BallistaResult, ConfigError};
use ballista_gameplay::camera::CameraConfig;
use ballista_gameplay::destructible::DestructibleConfig;
use ballista_gameplay::projectile::ProjectileTemplate;
use ballista_gameplay::targeting::TargetSelector;
use ballista_gameplay::turret::TurretConfig;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "ballista.toml";

/// A damageable target placed in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetSpawn {
    /// Centre position.
    pub position: Vec3,
    /// Collision radius.
    pub radius: f32,
    /// Health pool.
    pub destructible: DestructibleConfig,
}

impl Default for TargetSpawn {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.5, 20.0),
            radius: 0.5,
            destructible: DestructibleConfig::default(),
        }
    }
}

/// A loose rigid body that explosions push around.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropSpawn {
    /// Centre position.
    pub position: Vec3,
    /// Collision radius.
    pub radius: f32,
    /// Mass in kilograms.
    pub mass: f32,
}

impl Default for PropSpawn {
    fn default() -> Self {
        Self {
            position: Vec3::new(1.0, 0.5, 20.0),
            radius: 0.5,
            mass: 1.0,
        }
    }
}

/// Scene layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Muzzle position of the turret.
    pub muzzle: Vec3,
    /// Height of the ground plane.
    pub ground_height: f32,
    /// Collision radius of projectile bodies.
    pub projectile_radius: f32,
    /// Seconds between shots at the current target.
    pub fire_interval: f32,
    /// Targets, engaged in order.
    pub targets: Vec<TargetSpawn>,
    /// Props.
    pub props: Vec<PropSpawn>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            muzzle: Vec3::new(0.0, 1.5, 0.0),
            ground_height: 0.0,
            projectile_radius: 0.1,
            fire_interval: 1.5,
            targets: vec![
                TargetSpawn::default(),
                TargetSpawn {
                    position: Vec3::new(-12.0, 0.5, 30.0),
                    ..TargetSpawn::default()
                },
            ],
            props: vec![PropSpawn::default()],
        }
    }
}

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Simulation ===
    /// Fixed simulation step in seconds
    pub fixed_dt: f32,
    /// Upper bound on simulated ticks
    pub max_ticks: u32,
    /// World gravity
    pub gravity: Vec3,
    /// Seed for fragment spread
    pub seed: u64,

    // === Gameplay ===
    /// Turret tuning
    pub turret: TurretConfig,
    /// Projectile fired by the turret
    pub projectile: ProjectileTemplate,
    /// Target selection
    pub selector: TargetSelector,
    /// Follow camera
    pub camera: CameraConfig,

    // === Scene ===
    /// Scene layout
    pub scene: SceneConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_ticks: 3600,
            gravity: Vec3::new(0.0, -9.81, 0.0),
            seed: 42,

            turret: TurretConfig::default(),
            projectile: ProjectileTemplate::default(),
            selector: TargetSelector::default(),
            camera: CameraConfig::default(),

            scene: SceneConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from `ballista.toml` in the working directory.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match fs::File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read config file: {e}");
                    return Self::default();
                }

                match toml::from_str(&contents) {
                    Ok(config) => {
                        info!("Loaded config from {}", path.display());
                        config
                    },
                    Err(e) => {
                        warn!("Failed to parse config file: {e}");
                        Self::default()
                    },
                }
            },
            Err(e) => {
                warn!("Failed to open config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> BallistaResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| BallistaError::Serialization(e.to_string()))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Clamp values to sensible ranges.
    pub fn validate(&mut self) {
        self.fixed_dt = self.fixed_dt.clamp(1e-4, 0.1);
        self.max_ticks = self.max_ticks.max(1);
        self.turret.aim_above_height = self.turret.aim_above_height.max(0.0);
        self.turret.rotation_speed = self.turret.rotation_speed.max(0.0);
        self.scene.projectile_radius = self.scene.projectile_radius.clamp(0.01, 5.0);
        self.scene.fire_interval = self.scene.fire_interval.max(self.fixed_dt);
        for prop in &mut self.scene.props {
            prop.mass = prop.mass.max(0.01);
        }
    }

    /// Check invariants clamping cannot repair.
    pub fn check(&self) -> Result<(), ConfigError> {
        self.turret.solver.validate()?;
        self.projectile.validate()
    }
}
