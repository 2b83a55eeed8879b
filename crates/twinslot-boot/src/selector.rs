//! Slot inspection, selection and the boot sequence.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use twinslot_partition::{PartitionError, Slot, SlotReader, SlotStatus, Trailer};

use crate::config::BootConfig;
use crate::control::{BootControl, HaltReason};
use crate::error::BootResult;
use crate::vector::VectorTable;

/// Why a slot cannot be booted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ineligible {
    /// No trailer (erased or garbage magic)
    BadMagic,
    /// The trailer could not be read
    ReadFailed,
    /// Trailer status is not Valid
    NotValid,
    /// Body checksum does not match the trailer
    IntegrityMismatch,
}

/// Result of inspecting one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotReport {
    /// Slot inspected
    pub slot: Slot,
    /// Decoded trailer, when the magic matched
    pub trailer: Option<Trailer>,
    /// Reason the slot is not bootable, `None` if eligible
    pub ineligible: Option<Ineligible>,
}

impl SlotReport {
    /// Whether the slot can be booted.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.ineligible.is_none()
    }

    /// Packed trailer version, for eligible slots only.
    #[must_use]
    pub fn eligible_version(&self) -> Option<u32> {
        if self.is_eligible() {
            self.trailer.map(|t| t.version)
        } else {
            None
        }
    }
}

/// The slot chosen for boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    /// Chosen slot
    pub slot: Slot,
    /// Its packed trailer version
    pub version: u32,
}

/// Inspect `slot`: magic, status, then checksum.
pub fn inspect<R: SlotReader + ?Sized>(reader: &mut R, slot: Slot) -> SlotReport {
    let mut report = SlotReport {
        slot,
        trailer: None,
        ineligible: None,
    };

    let trailer = match reader.read_trailer(slot) {
        Ok(trailer) => trailer,
        Err(PartitionError::BadMagic { found, .. }) => {
            debug!("slot {}: no trailer (magic {:#010x})", slot, found);
            report.ineligible = Some(Ineligible::BadMagic);
            return report;
        }
        Err(err) => {
            warn!("slot {}: {}", slot, err);
            report.ineligible = Some(Ineligible::ReadFailed);
            return report;
        }
    };
    report.trailer = Some(trailer);

    if trailer.status != SlotStatus::Valid {
        debug!("slot {}: marked invalid", slot);
        report.ineligible = Some(Ineligible::NotValid);
    } else if !reader.verify(slot) {
        warn!("slot {}: checksum mismatch", slot);
        report.ineligible = Some(Ineligible::IntegrityMismatch);
    }
    report
}

/// Eligible slots in boot preference order.
///
/// Slots are checked A then B. The greater packed trailer version comes
/// first; on a tie the first checked (A) is kept in front.
pub fn rank<R: SlotReader + ?Sized>(reader: &mut R) -> [Option<Selection>; 2] {
    let [a, b] = Slot::ALL.map(|slot| {
        inspect(&mut *reader, slot)
            .eligible_version()
            .map(|version| Selection { slot, version })
    });
    match (a, b) {
        (Some(a), Some(b)) if b.version > a.version => [Some(b), Some(a)],
        (None, b) => [b, None],
        (a, b) => [a, b],
    }
}

/// Pick the boot slot: the first of [`rank`].
pub fn select<R: SlotReader + ?Sized>(reader: &mut R) -> Option<Selection> {
    let [best, _] = rank(reader);
    best
}

/// What the boot sequence did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootOutcome {
    /// Control was handed to a slot.
    Jumped {
        /// Chosen slot and version
        selection: Selection,
        /// Vector table used for the hand-over
        vectors: VectorTable,
    },
    /// The selector halted.
    Halted(HaltReason),
}

/// One-shot boot sequence over a slot reader and the platform hand-over.
#[derive(Debug)]
pub struct BootSelector<R, C> {
    reader: R,
    control: C,
    config: BootConfig,
    maintenance_requested: bool,
}

impl<R: SlotReader, C: BootControl> BootSelector<R, C> {
    /// Create a selector.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(reader: R, control: C, config: BootConfig) -> BootResult<Self> {
        config.validate()?;
        Ok(Self {
            reader,
            control,
            config,
            maintenance_requested: false,
        })
    }

    /// Run the boot sequence.
    ///
    /// Calls exactly one of [`BootControl::jump`] or [`BootControl::halt`].
    /// Halts only when no eligible slot can be handed over. If the preferred slot's vector
    /// table cannot be read, the other eligible slot is tried.
    pub fn run(&mut self) -> BootOutcome {
        self.maintenance_requested = self.maintenance_window();

        let layout = *self.reader.layout();
        for selection in rank(&mut self.reader).into_iter().flatten() {
            let vectors = match VectorTable::read(&mut self.reader, selection.slot) {
                Ok(vectors) => vectors,
                Err(err) => {
                    error!("slot {}: vector table unreadable: {}", selection.slot, err);
                    continue;
                }
            };
            info!(
                "selected slot {} (version {:#010x})",
                selection.slot, selection.version
            );
            if !vectors.is_plausible_for(&layout, selection.slot) {
                warn!(
                    "slot {}: implausible vector table sp={:#010x} reset={:#010x}",
                    selection.slot, vectors.initial_sp, vectors.reset_vector
                );
            }

            info!(
                "jumping to slot {}: sp={:#010x} reset={:#010x}",
                selection.slot, vectors.initial_sp, vectors.reset_vector
            );
            self.control.jump(selection.slot, vectors);
            return BootOutcome::Jumped { selection, vectors };
        }
        self.halt(HaltReason::NoBootableSlot)
    }

    /// Whether a maintenance request ended the window of the last
    /// [`run`](Self::run).
    #[must_use]
    pub fn maintenance_requested(&self) -> bool {
        self.maintenance_requested
    }

    /// Slot reader.
    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Platform control.
    pub fn control(&self) -> &C {
        &self.control
    }

    /// Release the reader and control.
    pub fn into_parts(self) -> (R, C) {
        (self.reader, self.control)
    }

    fn maintenance_window(&mut self) -> bool {
        if self.config.skips_maintenance() {
            debug!("maintenance window skipped");
            return false;
        }

        let step = self.config.poll_interval_ms;
        let mut waited = 0u32;
        while waited < self.config.maintenance_window_ms {
            if self.control.poll_maintenance() {
                info!("maintenance requested after {} ms", waited);
                return true;
            }
            self.control.delay_ms(step);
            waited = waited.saturating_add(step);
        }
        debug!("maintenance window elapsed");
        false
    }

    fn halt(&mut self, reason: HaltReason) -> BootOutcome {
        error!("boot halted: {}", reason);
        self.control.halt(reason);
        BootOutcome::Halted(reason)
    }
}
