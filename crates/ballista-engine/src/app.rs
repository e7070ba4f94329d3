//! Turret engagement runner.
//!
//! Builds the sandbox from an [`EngineConfig`] and drives one frame per
//! fixed step: select, fire, aim, integrate, route contacts into the
//! projectile simulation, advance timers, restore the camera, drain events.

use ballista_common::{EntityId, ProjectileId};
use ballista_gameplay::camera::{CameraDirector, CameraPose};
use ballista_gameplay::events::BallisticsEvent;
use ballista_gameplay::impact::TerminationReport;
use ballista_gameplay::projectile::TerminalCause;
use ballista_gameplay::simulation::ProjectileSimulation;
use ballista_gameplay::targeting::TargetSelector;
use ballista_gameplay::turret::{FireOutcome, Turret};
use glam::{Quat, Vec3};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::sandbox::SandboxWorld;

/// Totals of one engagement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngagementSummary {
    /// Ticks simulated.
    pub ticks: u32,
    /// Shots launched by the turret.
    pub shots_fired: u32,
    /// Fire requests that produced no shot.
    pub fire_aborts: u32,
    /// Fragments spawned.
    pub fragments_spawned: u32,
    /// Projectiles that hit something.
    pub impacts: u32,
    /// Projectiles that reached their lifetime cap.
    pub expired: u32,
    /// Targets killed.
    pub targets_destroyed: u32,
    /// Targets still standing.
    pub targets_remaining: u32,
}

/// A turret engaging the scene's targets in order.
#[derive(Debug)]
pub struct Engagement {
    config: EngineConfig,
    world: SandboxWorld,
    turret: Turret,
    selector: TargetSelector,
    simulation: ProjectileSimulation,
    camera: CameraDirector,
    targets: Vec<EntityId>,
    cooldown: f32,
    summary: EngagementSummary,
}

impl Engagement {
    /// Build the scene described by `config`.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let scene = &config.scene;
        let mut world =
            SandboxWorld::new(config.gravity, scene.ground_height, scene.projectile_radius);
        let targets = scene
            .targets
            .iter()
            .map(|t| world.add_target(t.position, t.radius, t.destructible.clone()))
            .collect();
        for prop in &scene.props {
            world.add_prop(prop.position, prop.radius, prop.mass);
        }

        let turret = Turret::new(config.turret.clone()).with_template(config.projectile.clone());
        let home = CameraPose {
            position: scene.muzzle + Vec3::new(0.0, 2.0, -6.0),
            rotation: Quat::IDENTITY,
            fov: 70.0,
        };

        Self {
            selector: config.selector,
            simulation: ProjectileSimulation::new(config.seed),
            camera: CameraDirector::new(config.camera, home),
            world,
            turret,
            targets,
            cooldown: 0.0,
            summary: EngagementSummary::default(),
            config,
        }
    }

    /// The host world.
    #[must_use]
    pub const fn world(&self) -> &SandboxWorld {
        &self.world
    }

    /// The turret.
    #[must_use]
    pub const fn turret(&self) -> &Turret {
        &self.turret
    }

    /// The projectile simulation.
    #[must_use]
    pub const fn simulation(&self) -> &ProjectileSimulation {
        &self.simulation
    }

    /// The follow camera.
    #[must_use]
    pub const fn camera(&self) -> &CameraDirector {
        &self.camera
    }

    /// Target entities in engagement order.
    #[must_use]
    pub fn targets(&self) -> &[EntityId] {
        &self.targets
    }

    /// Totals so far.
    #[must_use]
    pub const fn summary(&self) -> &EngagementSummary {
        &self.summary
    }

    /// Whether every target is down and nothing is in flight.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.simulation.is_empty() && self.next_target().is_none()
    }

    fn next_target(&self) -> Option<EntityId> {
        self.targets
            .iter()
            .copied()
            .find(|&t| self.world.is_target_alive(t))
    }

    /// Simulate one fixed step. Returns the cascades that ran.
    pub fn step(&mut self) -> Vec<TerminationReport> {
        let dt = self.config.fixed_dt;
        let gravity = self.world.gravity();
        let muzzle = self.config.scene.muzzle;
        self.summary.ticks += 1;
        self.cooldown -= dt;

        let current_alive = self
            .turret
            .target()
            .is_some_and(|t| self.world.is_target_alive(t));
        if !current_alive {
            match self.next_target() {
                Some(target) => {
                    let outcome =
                        self.selector
                            .select(&mut self.turret, target, Some(muzzle), &self.world, gravity);
                    if let Some(outcome) = outcome {
                        self.handle_fire(outcome);
                    }
                },
                None => self.turret.set_target(None),
            }
        } else if self.cooldown <= 0.0 {
            let outcome = self.turret.fire(Some(muzzle), &self.world, gravity);
            self.handle_fire(outcome);
        }

        self.turret.tick(dt, muzzle, &self.world, gravity);

        let mut reports = Vec::new();
        for contact in self.world.step(dt) {
            if let Some(report) = self
                .simulation
                .on_body_contact(contact.body, contact.impact, &mut self.world)
            {
                reports.push(report);
            }
        }
        reports.extend(self.simulation.tick(dt, &mut self.world));

        for report in &reports {
            self.record(report);
        }
        self.drain_events();
        reports
    }

    /// Run until every target is down or the tick budget is spent.
    pub fn run(&mut self) -> EngagementSummary {
        while self.summary.ticks < self.config.max_ticks && !self.is_finished() {
            self.step();
        }
        self.simulation.teardown(&mut self.world);
        self.camera.return_to_default();
        self.summary.targets_remaining = self
            .targets
            .iter()
            .filter(|&&t| self.world.is_target_alive(t))
            .count() as u32;
        self.summary.clone()
    }

    fn handle_fire(&mut self, outcome: FireOutcome) {
        self.cooldown = self.config.scene.fire_interval;
        let order = match outcome {
            FireOutcome::Fired(order) => order,
            other => {
                self.summary.fire_aborts += 1;
                let reason = other.reason().unwrap_or("unknown").to_string();
                self.simulation
                    .events()
                    .publish(BallisticsEvent::FireAborted { reason });
                return;
            },
        };

        let Some(id) = self
            .simulation
            .launch(&order.template, order.position, order.velocity, &mut self.world)
        else {
            self.summary.fire_aborts += 1;
            warn!("host refused to spawn projectile");
            return;
        };
        self.summary.shots_fired += 1;
        self.follow(id);
    }

    fn follow(&mut self, id: ProjectileId) {
        if let Some(previous) = self.camera.follow(id) {
            debug!(%previous, "camera follow replaced");
        }
    }

    fn record(&mut self, report: &TerminationReport) {
        match report.notice.cause {
            TerminalCause::Impact => self.summary.impacts += 1,
            TerminalCause::LifetimeExpired => self.summary.expired += 1,
            TerminalCause::FragmentTimer => {},
        }
        self.summary.fragments_spawned += report.fragments.len() as u32;
        self.camera.on_finished(&report.notice);
    }

    fn drain_events(&mut self) {
        for event in self.simulation.events().drain() {
            match event {
                BallisticsEvent::ProjectileLaunched {
                    projectile,
                    generation,
                    ..
                } => debug!(%projectile, generation, "launched"),
                BallisticsEvent::ProjectileFinished { projectile, cause } => {
                    debug!(%projectile, ?cause, "finished");
                },
                BallisticsEvent::EntityDamaged {
                    entity,
                    damage,
                    source,
                } => debug!(entity = entity.raw(), damage, %source, "damaged"),
                BallisticsEvent::EntityKilled { entity, source } => {
                    self.summary.targets_destroyed += 1;
                    info!(entity = entity.raw(), %source, "target killed");
                },
                BallisticsEvent::FireAborted { reason } => warn!(%reason, "fire aborted"),
            }
        }
    }
}

/// Load the config, run one engagement and log the totals.
pub fn run(mut config: EngineConfig) -> anyhow::Result<EngagementSummary> {
    config.validate();
    config.check()?;

    info!(
        targets = config.scene.targets.len(),
        props = config.scene.props.len(),
        dt = config.fixed_dt,
        "starting engagement"
    );
    let summary = Engagement::new(config).run();
    info!(
        ticks = summary.ticks,
        shots = summary.shots_fired,
        fragments = summary.fragments_spawned,
        destroyed = summary.targets_destroyed,
        remaining = summary.targets_remaining,
        "engagement complete"
    );
    Ok(summary)
}
