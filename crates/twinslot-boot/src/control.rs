//! Hardware hand-over contract.

use serde::{Deserialize, Serialize};
use twinslot_partition::Slot;

use crate::vector::VectorTable;

/// Why the selector refused to boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum HaltReason {
    /// Neither slot is eligible.
    #[error("no bootable slot")]
    NoBootableSlot,
}

/// Primitives the boot selector needs from the platform.
///
/// On hardware, `halt` and `jump` never return; test doubles record the call
/// and return so the outcome can be inspected.
pub trait BootControl {
    /// Whether a maintenance action has been requested.
    ///
    /// A request ends the maintenance window early. The selector still boots
    /// and reports the request through [`BootSelector::maintenance_requested`].
    ///
    /// [`BootSelector::maintenance_requested`]: crate::BootSelector::maintenance_requested
    fn poll_maintenance(&mut self) -> bool;

    /// Busy-wait for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);

    /// Enter the operator-visible fault state.
    fn halt(&mut self, reason: HaltReason);

    /// Disable interrupts, load the stack pointer and branch to the reset
    /// handler of `slot`.
    fn jump(&mut self, slot: Slot, vectors: VectorTable);
}

impl<C: BootControl + ?Sized> BootControl for &mut C {
    fn poll_maintenance(&mut self) -> bool {
        (**self).poll_maintenance()
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms);
    }

    fn halt(&mut self, reason: HaltReason) {
        (**self).halt(reason);
    }

    fn jump(&mut self, slot: Slot, vectors: VectorTable) {
        (**self).jump(slot, vectors);
    }
}
