//! Firmware slot identifiers.

use serde::{Deserialize, Serialize};

/// One of the two fixed firmware storage regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    /// Slot A, checked first by the boot selector
    A,
    /// Slot B
    B,
}

impl Slot {
    /// Both slots in boot-selector check order.
    pub const ALL: [Slot; 2] = [Slot::A, Slot::B];

    /// Get the other slot
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Slot::A => "A",
            Slot::B => "B",
        }
    }
}

impl core::fmt::Display for Slot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
