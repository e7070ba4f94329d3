//! Target selection.
//!
//! Picking itself (ray casts from the pointer) belongs to the host; the
//! selector receives the picked entity and hands it to the turret.

use ballista_common::EntityId;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::turret::{FireOutcome, TargetLocator, Turret};

/// Target selection behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetSelector {
    /// Fire immediately after a new target is selected.
    pub fire_on_select: bool,
}

impl Default for TargetSelector {
    fn default() -> Self {
        Self {
            fire_on_select: true,
        }
    }
}

impl TargetSelector {
    /// Make `entity` the turret's target.
    ///
    /// Returns the fire outcome when `fire_on_select` is set, otherwise `None`.
    pub fn select(
        &self,
        turret: &mut Turret,
        entity: EntityId,
        shoot_point: Option<Vec3>,
        locator: &dyn TargetLocator,
        gravity: Vec3,
    ) -> Option<FireOutcome> {
        debug!(target = entity.raw(), "target selected");
        turret.set_target(Some(entity));
        self.fire_on_select
            .then(|| turret.fire(shoot_point, locator, gravity))
    }
}
