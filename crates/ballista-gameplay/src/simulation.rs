//! Projectile lifecycle management.
//!
//! [`ProjectileSimulation`] owns every live projectile. The host reports
//! collisions through [`ProjectileSimulation::on_terminal`] and advances
//! timers with [`ProjectileSimulation::tick`]; both funnel into one
//! terminate path guarded by the projectile's one-shot finished flag, so a
//! projectile yields at most one [`TerminationReport`] however many
//! triggers race for it.
//!
//! # Example
//!
//! ```
//! use ballista_gameplay::host::MockHost;
//! use ballista_gameplay::impact::ImpactEvent;
//! use ballista_gameplay::projectile::ProjectileTemplate;
//! use ballista_gameplay::simulation::ProjectileSimulation;
//! use glam::Vec3;
//!
//! let mut host = MockHost::new();
//! let mut sim = ProjectileSimulation::new(42);
//! let id = sim
//!     .launch(&ProjectileTemplate::default(), Vec3::ZERO, Vec3::new(10.0, 2.0, 0.0), &mut host)
//!     .expect("spawned");
//!
//! let report = sim.on_terminal(id, Some(ImpactEvent::new(Vec3::X, Vec3::Y)), &mut host);
//! assert!(report.is_some());
//! assert!(sim.on_terminal(id, None, &mut host).is_none());
//! ```

use std::collections::HashMap;

use ballista_common::{BodyHandle, EntityId, ProjectileId};
use glam::Vec3;
use tracing::{debug, info, trace, warn};

use crate::destructible::DamageOutcome;
use crate::events::{BallisticsEvent, EventBus};
use crate::fragmentation::FragmentShot;
use crate::host::PhysicsHost;
use crate::impact::{resolve_effects, FinishedNotice, ImpactEvent, TerminationReport};
use crate::orientation::look_rotation;
use crate::projectile::{Projectile, ProjectileTemplate, TerminalCause};

/// Owner of all live projectiles.
#[derive(Debug)]
pub struct ProjectileSimulation {
    projectiles: HashMap<ProjectileId, Projectile>,
    bodies: HashMap<BodyHandle, ProjectileId>,
    next_id: u64,
    rng: fastrand::Rng,
    events: EventBus,
}

impl ProjectileSimulation {
    /// Create an empty simulation with a seeded fragmentation RNG.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_event_bus(seed, EventBus::default())
    }

    /// Create with a specific event bus.
    #[must_use]
    pub fn with_event_bus(seed: u64, events: EventBus) -> Self {
        Self {
            projectiles: HashMap::new(),
            bodies: HashMap::new(),
            next_id: 1,
            rng: fastrand::Rng::with_seed(seed),
            events,
        }
    }

    /// Events published so far.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Get a live projectile.
    #[must_use]
    pub fn get(&self, id: ProjectileId) -> Option<&Projectile> {
        self.projectiles.get(&id)
    }

    /// Which projectile owns `body`.
    #[must_use]
    pub fn projectile_for_body(&self, body: BodyHandle) -> Option<ProjectileId> {
        self.bodies.get(&body).copied()
    }

    /// Number of live projectiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    /// Check if no projectile is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    /// Live projectile IDs in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<ProjectileId> {
        let mut ids: Vec<_> = self.projectiles.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Spawn a root projectile from `template` with launch `velocity`.
    ///
    /// Returns `None` if the host refused to spawn the body.
    pub fn launch<H>(
        &mut self,
        template: &ProjectileTemplate,
        position: Vec3,
        velocity: Vec3,
        host: &mut H,
    ) -> Option<ProjectileId>
    where
        H: PhysicsHost + ?Sized,
    {
        let body = self.spawn_body(position, velocity, host)?;
        let id = self.allocate_id();
        let projectile = Projectile::from_template(id, body, template, position, velocity);
        info!(%id, ?position, ?velocity, "projectile launched");
        self.insert(projectile);
        Some(id)
    }

    /// Handle a collision (or an externally triggered terminal event).
    ///
    /// `impact` defaults to the projectile's own position when the host has
    /// no contact data. Returns `None` if the projectile already finished, or
    /// if a fragment touched the entity its parent struck; that contact is
    /// ignored and the fragment keeps flying.
    pub fn on_terminal<H>(
        &mut self,
        id: ProjectileId,
        impact: Option<ImpactEvent>,
        host: &mut H,
    ) -> Option<TerminationReport>
    where
        H: PhysicsHost + ?Sized,
    {
        self.terminate(id, TerminalCause::Impact, impact, host)
    }

    /// Handle a collision reported by body handle.
    pub fn on_body_contact<H>(
        &mut self,
        body: BodyHandle,
        impact: ImpactEvent,
        host: &mut H,
    ) -> Option<TerminationReport>
    where
        H: PhysicsHost + ?Sized,
    {
        let id = self.projectile_for_body(body)?;
        self.on_terminal(id, Some(impact), host)
    }

    /// Sync projectiles from their bodies and advance timers by `dt`.
    ///
    /// Fragments spawned during this tick are not advanced until the next.
    pub fn tick<H>(&mut self, dt: f32, host: &mut H) -> Vec<TerminationReport>
    where
        H: PhysicsHost + ?Sized,
    {
        let mut due = Vec::new();
        for id in self.ids() {
            let Some(projectile) = self.projectiles.get_mut(&id) else {
                continue;
            };
            let position = host.position(projectile.body).unwrap_or(projectile.position);
            let velocity = host.velocity(projectile.body).unwrap_or(projectile.velocity);
            projectile.sync(position, velocity);
            if let Some(cause) = projectile.tick(dt) {
                due.push((id, cause));
            }
        }

        due.into_iter()
            .filter_map(|(id, cause)| self.terminate(id, cause, None, host))
            .collect()
    }

    /// Remove every projectile without running any cascade.
    pub fn teardown<H>(&mut self, host: &mut H)
    where
        H: PhysicsHost + ?Sized,
    {
        for (_, projectile) in self.projectiles.drain() {
            host.despawn_projectile(projectile.body);
        }
        self.bodies.clear();
    }

    fn terminate<H>(
        &mut self,
        id: ProjectileId,
        cause: TerminalCause,
        impact: Option<ImpactEvent>,
        host: &mut H,
    ) -> Option<TerminationReport>
    where
        H: PhysicsHost + ?Sized,
    {
        let projectile = self.projectiles.get_mut(&id)?;
        let struck = impact.and_then(|contact| contact.hit_entity);
        if cause == TerminalCause::Impact
            && struck.is_some()
            && struck == projectile.ignored_entity
        {
            trace!(%id, "fragment passing through parent's target");
            return None;
        }
        if !projectile.mark_finished() {
            return None;
        }

        let impact = match cause {
            TerminalCause::Impact => {
                Some(impact.unwrap_or_else(|| ImpactEvent::fallback_for(projectile)))
            },
            TerminalCause::FragmentTimer | TerminalCause::LifetimeExpired => None,
        };

        let effects = resolve_effects(projectile, cause, impact.as_ref(), host, &mut self.rng);
        let parent = projectile.clone();

        if let Some((entity, outcome)) = &effects.damage {
            match outcome {
                DamageOutcome::AlreadyDead => {},
                DamageOutcome::Damaged { .. } => self.publish_damaged(*entity, &parent),
                DamageOutcome::Killed { .. } => {
                    self.publish_damaged(*entity, &parent);
                    self.events.publish(BallisticsEvent::EntityKilled {
                        entity: *entity,
                        source: id,
                    });
                },
            }
        }

        let fragments: Vec<ProjectileId> = effects
            .fragment_shots
            .iter()
            .filter_map(|shot| {
                self.spawn_fragment(&parent, effects.fragment_origin, shot, struck, host)
            })
            .collect();

        self.projectiles.remove(&id);
        self.bodies.remove(&parent.body);
        host.despawn_projectile(parent.body);

        let notice = FinishedNotice {
            projectile: id,
            cause,
            generation: parent.generation,
        };
        self.events.publish(BallisticsEvent::ProjectileFinished {
            projectile: id,
            cause,
        });
        debug!(
            %id,
            ?cause,
            explosion_hits = effects.explosion_hits.len(),
            fragments = fragments.len(),
            "projectile finished"
        );

        Some(TerminationReport {
            notice,
            impact,
            damage: effects.damage,
            explosion_hits: effects.explosion_hits,
            fragments,
        })
    }

    fn publish_damaged(&self, entity: EntityId, source: &Projectile) {
        self.events.publish(BallisticsEvent::EntityDamaged {
            entity,
            damage: source.damage,
            source: source.id,
        });
    }

    fn spawn_fragment<H>(
        &mut self,
        parent: &Projectile,
        origin: Vec3,
        shot: &FragmentShot,
        struck: Option<EntityId>,
        host: &mut H,
    ) -> Option<ProjectileId>
    where
        H: PhysicsHost + ?Sized,
    {
        let body = self.spawn_body(origin, shot.velocity, host)?;
        let id = self.allocate_id();
        let mut fragment = parent.fragment(id, body, origin, shot.velocity);
        fragment.ignored_entity = struck;
        debug!(%id, parent = %parent.id, "fragment spawned");
        self.insert(fragment);
        Some(id)
    }

    fn spawn_body<H>(&mut self, position: Vec3, velocity: Vec3, host: &mut H) -> Option<BodyHandle>
    where
        H: PhysicsHost + ?Sized,
    {
        let Some(body) = host.spawn_projectile(position, look_rotation(velocity)) else {
            warn!(?position, "host refused to spawn projectile body");
            return None;
        };
        if !host.set_velocity(body, velocity) {
            warn!(body = body.raw(), "projectile body has no velocity; launching without it");
        }
        Some(body)
    }

    fn insert(&mut self, projectile: Projectile) {
        self.events.publish(BallisticsEvent::ProjectileLaunched {
            projectile: projectile.id,
            position: projectile.position,
            velocity: projectile.velocity,
            generation: projectile.generation,
        });
        self.bodies.insert(projectile.body, projectile.id);
        self.projectiles.insert(projectile.id, projectile);
    }

    fn allocate_id(&mut self) -> ProjectileId {
        let id = ProjectileId::from_raw(self.next_id);
        self.next_id += 1;
        id
    }
}
