//! Collision layer masks.
//!
//! A [`LayerMask`] filters spatial queries (explosion overlap, contacts) by
//! the layers a body lives on. Bits are layer indices `0..32`.

use serde::{Deserialize, Serialize};

/// Bit mask of collision layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(u32);

impl LayerMask {
    /// Matches every layer.
    pub const ALL: Self = Self(u32::MAX);

    /// Matches nothing.
    pub const NONE: Self = Self(0);

    /// Static scenery (ground, walls).
    pub const ENVIRONMENT: u8 = 0;

    /// Loose rigid bodies pushed around by explosions.
    pub const PROPS: u8 = 1;

    /// Targetable, damageable actors.
    pub const TARGETS: u8 = 2;

    /// Projectiles and fragments.
    pub const PROJECTILES: u8 = 3;

    /// Creates a mask from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns a mask with a single layer set.
    #[must_use]
    pub const fn layer(layer: u8) -> Self {
        Self(1 << (layer as u32 & 31))
    }

    /// Returns this mask with `layer` added.
    #[must_use]
    pub const fn with_layer(self, layer: u8) -> Self {
        Self(self.0 | Self::layer(layer).0)
    }

    /// Returns this mask with `layer` removed.
    #[must_use]
    pub const fn without_layer(self, layer: u8) -> Self {
        Self(self.0 & !Self::layer(layer).0)
    }

    /// Checks whether `layer` passes the mask.
    #[must_use]
    pub const fn contains(self, layer: u8) -> bool {
        self.0 & Self::layer(layer).0 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}
