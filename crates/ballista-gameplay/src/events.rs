//! Event bus for inter-system communication.
//!
//! Systems publish [`BallisticsEvent`]s as they happen; the host drains the
//! bus once per frame for logging, telemetry or presentation.

use crossbeam_channel::{bounded, Receiver, Sender};
use glam::Vec3;

use ballista_common::{EntityId, ProjectileId};

use crate::projectile::TerminalCause;

/// Event types that can be sent through the event bus.
#[derive(Debug, Clone, PartialEq)]
pub enum BallisticsEvent {
    /// A projectile body was launched.
    ProjectileLaunched {
        /// Projectile ID
        projectile: ProjectileId,
        /// Launch position
        position: Vec3,
        /// Launch velocity
        velocity: Vec3,
        /// 0 for turret shots, 1 for fragments
        generation: u8,
    },
    /// A projectile's terminal cascade ran.
    ProjectileFinished {
        /// Projectile ID
        projectile: ProjectileId,
        /// What ended it
        cause: TerminalCause,
    },
    /// A damageable entity was hit.
    EntityDamaged {
        /// Entity hit
        entity: EntityId,
        /// Damage dealt
        damage: f32,
        /// Source projectile
        source: ProjectileId,
    },
    /// A damageable entity died.
    EntityKilled {
        /// Entity killed
        entity: EntityId,
        /// Source projectile
        source: ProjectileId,
    },
    /// A fire request produced no shot.
    FireAborted {
        /// Why
        reason: String,
    },
}

/// Event bus for broadcasting events to subscribers.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<BallisticsEvent>,
    /// Receiver for collecting events
    receiver: Receiver<BallisticsEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Publishes an event to the bus.
    pub fn publish(&self, event: BallisticsEvent) {
        // Non-blocking send - if full, event is dropped
        let _ = self.sender.try_send(event);
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<BallisticsEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_drain() {
        let bus = EventBus::new(4);
        bus.publish(BallisticsEvent::FireAborted {
            reason: "no target".to_string(),
        });
        assert_eq!(bus.pending_count(), 1);
        assert_eq!(bus.drain().len(), 1);
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops_events() {
        let bus = EventBus::new(1);
        for _ in 0..3 {
            bus.publish(BallisticsEvent::FireAborted {
                reason: "unsolved".to_string(),
            });
        }
        assert_eq!(bus.drain().len(), 1);
    }
}
